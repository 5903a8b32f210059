pub mod wallet;

pub use wallet::{EvmWallet, MessageSigner, WalletError};
