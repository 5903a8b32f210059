// Library exports for lava_rpc_harvester

pub mod auth;
pub mod chain;
pub mod config;
pub mod http;
pub mod orchestrator;
pub mod rpc;
pub mod store;
pub mod vault;

// Re-export main types for convenience
pub use chain::{EvmWallet, MessageSigner};
pub use config::Config;
pub use orchestrator::{HarvestOrchestrator, OrchestratorConfig, RunStatistics};
pub use store::ResultTable;
pub use vault::SymmetricKey;
