//! Screens and panels rendered by the view router.

mod auth_screen;
mod main_screen;
mod mint;
mod wallet;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use common::{AppError, AppResult};

pub use auth_screen::{AuthMode, AuthScreen};
pub use main_screen::MainScreen;
pub use mint::{Ledger, MintPanel, SimulatedLedger};
pub use wallet::{SimulatedWallet, WalletPanel, WalletProvider};

#[cfg(any(test, feature = "test-utils"))]
pub use mint::MockLedger;
#[cfg(any(test, feature = "test-utils"))]
pub use wallet::MockWalletProvider;

/// Run `work` unless the owning screen goes away first.
pub(crate) async fn cancellable<T>(
    token: &CancellationToken,
    work: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(AppError::Cancelled),
        result = work => result,
    }
}
