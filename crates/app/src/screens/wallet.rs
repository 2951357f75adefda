//! Wallet panel: create, connect and disconnect the linked ledger account.
//!
//! The profile write happens first; local state only changes once it has
//! succeeded, so a failed write leaves the panel exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use common::{AppError, AppResult, WalletConfig};
use domain::{ledger_id, MAX_SIMULATED_ACCOUNT, MIN_SIMULATED_ACCOUNT};
use profile_service_lib::ProfileSynchronizer;

use super::cancellable;
use crate::notify::{Notification, Notifier};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Source of ledger accounts.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Provision a new account and return its identifier
    async fn create_account(&self) -> AppResult<String>;

    /// Connect an existing account and return its identifier
    async fn connect_account(&self) -> AppResult<String>;
}

/// Stand-in wallet: waits, then hands out a random `0.0.N` identifier.
#[derive(Debug, Clone)]
pub struct SimulatedWallet {
    create_delay: Duration,
    connect_delay: Duration,
}

impl SimulatedWallet {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            create_delay: Duration::from_millis(config.create_delay_ms),
            connect_delay: Duration::from_millis(config.connect_delay_ms),
        }
    }

    fn random_account() -> String {
        ledger_id(rand::rng().random_range(MIN_SIMULATED_ACCOUNT..MAX_SIMULATED_ACCOUNT))
    }
}

#[async_trait]
impl WalletProvider for SimulatedWallet {
    async fn create_account(&self) -> AppResult<String> {
        tokio::time::sleep(self.create_delay).await;
        Ok(Self::random_account())
    }

    async fn connect_account(&self) -> AppResult<String> {
        tokio::time::sleep(self.connect_delay).await;
        Ok(Self::random_account())
    }
}

/// Linked-account state for one signed-in user.
pub struct WalletPanel {
    user_id: Uuid,
    account_id: Option<String>,
    wallet: Arc<dyn WalletProvider>,
    profiles: Arc<dyn ProfileSynchronizer>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl WalletPanel {
    pub fn new(
        user_id: Uuid,
        wallet: Arc<dyn WalletProvider>,
        profiles: Arc<dyn ProfileSynchronizer>,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            user_id,
            account_id: None,
            wallet,
            profiles,
            notifier,
            cancel,
        }
    }

    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.account_id.is_some()
    }

    /// Adopt the identifier read from the profile store
    pub(crate) fn restore(&mut self, account_id: Option<String>) {
        self.account_id = account_id;
    }

    pub async fn create_wallet(&mut self) -> AppResult<String> {
        self.notifier
            .notify(Notification::info("Creating Hedera wallet..."));

        let failure = "Failed to save wallet information";
        let account = self.run(self.wallet.create_account(), failure).await?;
        self.link(Some(account.clone()), failure).await?;

        info!("Created wallet {} for {}", account, self.user_id);
        self.notifier
            .notify(Notification::success("Hedera wallet created successfully!"));
        Ok(account)
    }

    pub async fn connect_wallet(&mut self) -> AppResult<String> {
        self.notifier
            .notify(Notification::info("Connecting to Hedera wallet..."));

        let failure = "Failed to connect wallet";
        let account = self.run(self.wallet.connect_account(), failure).await?;
        self.link(Some(account.clone()), failure).await?;

        info!("Connected wallet {} for {}", account, self.user_id);
        self.notifier
            .notify(Notification::success("Wallet connected successfully!"));
        Ok(account)
    }

    pub async fn disconnect_wallet(&mut self) -> AppResult<()> {
        self.link(None, "Failed to disconnect wallet").await?;

        info!("Disconnected wallet for {}", self.user_id);
        self.notifier.notify(Notification::success("Wallet disconnected"));
        Ok(())
    }

    /// Wallet round trip, abandoned if the screen is torn down
    async fn run(
        &self,
        work: impl std::future::Future<Output = AppResult<String>>,
        failure: &str,
    ) -> AppResult<String> {
        cancellable(&self.cancel, work)
            .await
            .map_err(|e| self.report(e, failure))
    }

    /// Persist, then apply locally
    async fn link(&mut self, account_id: Option<String>, failure: &str) -> AppResult<()> {
        let write = self
            .profiles
            .set_account_identifier(self.user_id, account_id.clone());
        cancellable(&self.cancel, write)
            .await
            .map_err(|e| self.report(e, failure))?;

        self.account_id = account_id;
        Ok(())
    }

    fn report(&self, err: AppError, failure: &str) -> AppError {
        match &err {
            AppError::Cancelled => debug!("Wallet operation for {} cancelled", self.user_id),
            _ => self.notifier.notify(Notification::error(failure)),
        }
        err
    }
}
