//! Application state for dependency injection.

use std::sync::Arc;

use auth_service_lib::AuthGateway;
use profile_service_lib::ProfileSynchronizer;

use crate::notify::Notifier;
use crate::screens::{Ledger, WalletProvider};

/// Collaborators shared by every screen.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn AuthGateway>,
    pub profiles: Arc<dyn ProfileSynchronizer>,
    pub wallet: Arc<dyn WalletProvider>,
    pub ledger: Arc<dyn Ledger>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        profiles: Arc<dyn ProfileSynchronizer>,
        wallet: Arc<dyn WalletProvider>,
        ledger: Arc<dyn Ledger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            profiles,
            wallet,
            ledger,
            notifier,
        }
    }
}
