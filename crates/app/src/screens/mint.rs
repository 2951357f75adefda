//! Mint panel: tokenize an amount of water as a ledger NFT.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use common::{AppError, AppResult, WalletConfig};
use domain::{ledger_id, Gallons, MintReceipt, MAX_SIMULATED_SERIAL, MAX_SIMULATED_TOKEN};

use super::cancellable;
use crate::notify::{Notification, Notifier};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const MINT_SUCCESS: &str = "Successfully minted Water Rights NFT!";

/// Ledger that mints water-rights NFTs.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn mint(&self, account_id: &str, gallons: Gallons) -> AppResult<MintReceipt>;
}

/// Stand-in ledger with a fixed confirmation delay.
#[derive(Debug, Clone)]
pub struct SimulatedLedger {
    delay: Duration,
}

impl SimulatedLedger {
    pub fn new(config: &WalletConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.mint_delay_ms),
        }
    }
}

#[async_trait]
impl Ledger for SimulatedLedger {
    async fn mint(&self, account_id: &str, gallons: Gallons) -> AppResult<MintReceipt> {
        debug!("Minting {} gallons to {}", gallons, account_id);
        tokio::time::sleep(self.delay).await;

        let mut rng = rand::rng();
        Ok(MintReceipt {
            token_id: ledger_id(rng.random_range(0..MAX_SIMULATED_TOKEN)),
            serial: rng.random_range(0..MAX_SIMULATED_SERIAL),
            gallons,
        })
    }
}

pub struct MintPanel {
    ledger: Arc<dyn Ledger>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl MintPanel {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            notifier,
            cancel,
        }
    }

    /// Mint `gallons` (as typed by the user) to the linked account.
    pub async fn mint(&self, account_id: Option<&str>, gallons: &str) -> AppResult<MintReceipt> {
        let account_id = account_id.ok_or(AppError::WalletRequired).map_err(|e| self.reject(e))?;
        let gallons = Gallons::parse(gallons).map_err(|e| self.reject(AppError::Validation(e)))?;

        let receipt = cancellable(&self.cancel, self.ledger.mint(account_id, gallons))
            .await
            .map_err(|e| match e {
                AppError::Cancelled => {
                    debug!("Mint cancelled");
                    e
                }
                _ => self.reject(e),
            })?;

        info!("Minted {} for {}", receipt.token_id, account_id);
        self.notifier
            .notify(Notification::success(MINT_SUCCESS).with_description(receipt.summary()));
        Ok(receipt)
    }

    fn reject(&self, err: AppError) -> AppError {
        self.notifier.notify(Notification::from_error(&err));
        err
    }
}
