/// Harvest Orchestrator - drives the per-wallet pipeline
///
/// For each wallet, strictly one after another:
/// 1. Log in (challenge, sign, verify)
/// 2. Fetch the account's chain catalog
/// 3. Merge the mainnet endpoints into the result table
/// 4. Rewrite the output file
///
/// The session is shared by all wallets unless `fresh_session_per_wallet` is set.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::auth::AuthProtocol;
use crate::chain::{EvmWallet, MessageSigner};
use crate::config::Config;
use crate::http::{RetryPolicy, Session, SessionClient, Transport};
use crate::rpc::{mainnet_endpoints, RpcFetcher};
use crate::store::{self, ResultTable};
use crate::vault::{self, SymmetricKey};

mod source;
mod stats;
pub use self::source::{parse_wallet_records, read_wallet_records, EncryptedWalletRecord};
pub use self::stats::RunStatistics;

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub base_url: String,
    pub invite_code: String,
    /// Result table destination, rewritten after every wallet
    pub output_path: PathBuf,
    /// Log and skip failing wallets instead of aborting
    pub continue_on_error: bool,
    pub fresh_session_per_wallet: bool,
    /// Signed login submission
    pub verify_policy: RetryPolicy,
    /// Profile / chain catalog fetch
    pub profile_policy: RetryPolicy,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            invite_code: config.api.invite_code.clone(),
            output_path: config.run.output_path.clone(),
            continue_on_error: config.run.continue_on_error,
            fresh_session_per_wallet: config.run.fresh_session_per_wallet,
            verify_policy: config.retry.verify_policy(),
            profile_policy: config.retry.profile_policy(),
        }
    }
}

/// Main orchestrator coordinating the harvest
pub struct HarvestOrchestrator<T> {
    config: OrchestratorConfig,
    client: SessionClient<T>,
    session: Session,
    table: ResultTable,
    stats: RunStatistics,
}

impl<T: Transport> HarvestOrchestrator<T> {
    pub fn new(config: OrchestratorConfig, client: SessionClient<T>, session: Session) -> Self {
        Self {
            config,
            client,
            session,
            table: ResultTable::new(),
            stats: RunStatistics::default(),
        }
    }

    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn client(&self) -> &SessionClient<T> {
        &self.client
    }

    /// Decrypt every record up front.
    ///
    /// A record that fails to decrypt or holds an invalid key aborts the run,
    /// unless `continue_on_error` is set, in which case it is counted as a
    /// failed wallet and skipped.
    pub fn unlock_wallets(
        &mut self,
        records: &[EncryptedWalletRecord],
        key: &SymmetricKey,
    ) -> Result<Vec<EvmWallet>> {
        self.stats = RunStatistics::new(records.len());

        let mut wallets = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let unlocked = vault::decrypt(&record.private_key, key)
                .map_err(anyhow::Error::from)
                .and_then(|private_key| {
                    EvmWallet::from_private_key_hex(&private_key).map_err(anyhow::Error::from)
                })
                .with_context(|| format!("Failed to unlock wallet #{}", idx + 1));

            match unlocked {
                Ok(wallet) => wallets.push(wallet),
                Err(e) if self.config.continue_on_error => {
                    error!("{:#}; skipping", e);
                    self.stats.record_failure(format!("{:#}", e));
                }
                Err(e) => return Err(e),
            }
        }

        info!("All {} wallets loaded, starting RPC collection", wallets.len());
        Ok(wallets)
    }

    /// Process every wallet in order and return the run statistics.
    pub async fn run(&mut self, wallets: &[EvmWallet]) -> Result<RunStatistics> {
        let started = Instant::now();
        if self.stats.wallets_total == 0 {
            self.stats = RunStatistics::new(wallets.len());
        }

        for (idx, wallet) in wallets.iter().enumerate() {
            info!(
                "[{}/{}] Collecting RPC endpoints for {}",
                idx + 1,
                wallets.len(),
                wallet.address()
            );

            match self.process_wallet(wallet).await {
                Ok(count) => self.stats.record_success(count),
                Err(e) if self.config.continue_on_error => {
                    error!("Wallet {} failed: {:#}; continuing", wallet.address(), e);
                    self.stats.record_failure(format!("{}: {:#}", wallet.address(), e));
                }
                Err(e) => {
                    return Err(e.context(format!("Wallet {} failed", wallet.address())));
                }
            }
        }

        self.stats.elapsed = started.elapsed();
        info!(
            "Finished {}/{} wallets: {} succeeded, {} failed, {} mainnet endpoints in {:.1}s",
            self.stats.processed(),
            self.stats.wallets_total,
            self.stats.wallets_succeeded,
            self.stats.wallets_failed,
            self.stats.endpoints_recorded,
            self.stats.elapsed.as_secs_f64()
        );
        if self.table.is_empty() {
            warn!("No mainnet endpoints were recorded for any wallet");
        }
        Ok(self.stats.clone())
    }

    /// Full pipeline for one wallet. Returns the number of mainnet endpoints recorded.
    pub async fn process_wallet<S: MessageSigner>(&mut self, wallet: &S) -> Result<usize> {
        if self.config.fresh_session_per_wallet {
            self.session.clear_cookie();
        }

        let auth = AuthProtocol::new(
            &self.client,
            &self.config.base_url,
            &self.config.invite_code,
            &self.config.verify_policy,
        );
        auth.login(&mut self.session, wallet).await?;

        let fetcher = RpcFetcher::new(
            &self.client,
            &self.config.base_url,
            &self.config.profile_policy,
        );
        let chains = fetcher.fetch(&mut self.session).await?;

        let endpoints = mainnet_endpoints(&chains);
        for (chain, url) in &endpoints {
            self.table.merge(wallet.address(), chain, url);
        }
        info!(
            "{}: {} chains, {} mainnet endpoints",
            wallet.address(),
            chains.len(),
            endpoints.len()
        );

        store::persist(&self.table, &self.config.output_path)?;
        Ok(endpoints.len())
    }
}
