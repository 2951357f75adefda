//! Main screen for a signed-in user.

use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use common::AppResult;
use domain::{AuthUser, MintReceipt};

use super::{cancellable, MintPanel, WalletPanel};
use crate::state::AppState;

/// Everything shown to one user. Dropping the screen cancels its work.
pub struct MainScreen {
    user: AuthUser,
    wallet: WalletPanel,
    mint: MintPanel,
    state: AppState,
    cancel: CancellationToken,
}

impl MainScreen {
    pub fn new(user: AuthUser, state: &AppState) -> Self {
        let cancel = CancellationToken::new();
        let wallet = WalletPanel::new(
            user.id,
            state.wallet.clone(),
            state.profiles.clone(),
            state.notifier.clone(),
            cancel.clone(),
        );
        let mint = MintPanel::new(state.ledger.clone(), state.notifier.clone(), cancel.clone());

        Self {
            user,
            wallet,
            mint,
            state: state.clone(),
            cancel,
        }
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn wallet(&self) -> &WalletPanel {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut WalletPanel {
        &mut self.wallet
    }

    /// Linked account identifier, if any
    pub fn account_id(&self) -> Option<&str> {
        self.wallet.account_id()
    }

    /// Read the linked account without applying it.
    pub async fn fetch_profile(&self) -> AppResult<Option<String>> {
        cancellable(&self.cancel, self.state.profiles.load(self.user.id))
            .await
            .inspect_err(|e| warn!("Failed to load profile for {}: {}", self.user.id, e))
    }

    pub(crate) fn apply_profile(&mut self, account_id: Option<String>) {
        self.wallet.restore(account_id);
    }

    pub async fn mint(&self, gallons: &str) -> AppResult<MintReceipt> {
        self.mint.mint(self.wallet.account_id(), gallons).await
    }
}

impl Drop for MainScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
