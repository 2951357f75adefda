//! Application Library
//!
//! Wires the auth and profile services to the screens and the view router.
//! Front ends (the CLI) drive the router; they never touch the services.

pub mod config;
pub mod navigation;
pub mod notify;
pub mod router;
pub mod screens;
pub mod state;

use std::sync::Arc;

use tracing::info;

use auth_service_lib::SessionMonitor;
use common::AppResult;

use crate::config::AppConfig;
use crate::navigation::Navigator;
use crate::notify::Notifier;
use crate::router::ViewRouter;
use crate::screens::{SimulatedLedger, SimulatedWallet};
use crate::state::AppState;

pub use crate::router::View;

/// Build every component and start watching the session.
///
/// Must be called from within a tokio runtime.
pub async fn launch(
    config: &AppConfig,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
) -> AppResult<ViewRouter> {
    let (client, gateway) = auth_service_lib::build(&config.auth)?;
    let profiles = profile_service_lib::build(&config.profile).await?;

    let state = AppState::new(
        gateway,
        profiles,
        Arc::new(SimulatedWallet::new(&config.wallet)),
        Arc::new(SimulatedLedger::new(&config.wallet)),
        notifier,
    );

    let monitor = SessionMonitor::start(client);
    info!("Application started");

    Ok(ViewRouter::new(monitor, state, navigator))
}
