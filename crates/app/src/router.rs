//! View router - decides what to show from the session state alone.
//!
//! Nothing is cached across reloads: every `sync` recomputes the view from
//! the monitor's current state.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use auth_service_lib::{SessionMonitor, SessionState};
use common::{AppError, AppResult};
use domain::AuthUser;

use crate::navigation::{Navigator, Route};
use crate::notify::Notification;
use crate::screens::{AuthScreen, MainScreen};
use crate::state::AppState;

const PROFILE_LOAD_FAILED: &str = "Failed to load profile information";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Initial session fetch still outstanding
    Loading,
    Auth,
    Main,
}

pub struct ViewRouter {
    monitor: SessionMonitor,
    state: AppState,
    navigator: Arc<dyn Navigator>,
    auth: AuthScreen,
    main: Option<MainScreen>,
    view: View,
}

impl ViewRouter {
    pub fn new(monitor: SessionMonitor, state: AppState, navigator: Arc<dyn Navigator>) -> Self {
        let auth = AuthScreen::new(state.gateway.clone(), state.notifier.clone());
        Self {
            monitor,
            state,
            navigator,
            auth,
            main: None,
            view: View::Loading,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn session_state(&self) -> SessionState {
        self.monitor.state()
    }

    /// Receiver for session changes
    pub fn session_watch(&self) -> watch::Receiver<SessionState> {
        self.monitor.watch()
    }

    pub fn auth_screen(&mut self) -> &mut AuthScreen {
        &mut self.auth
    }

    pub fn main_screen(&self) -> Option<&MainScreen> {
        self.main.as_ref()
    }

    pub fn main_screen_mut(&mut self) -> Option<&mut MainScreen> {
        self.main.as_mut()
    }

    /// Wait for the initial session fetch, then render.
    pub async fn resolve(&mut self) -> View {
        self.monitor.resolved().await;
        self.sync().await
    }

    /// Recompute the view from the current session state.
    pub async fn sync(&mut self) -> View {
        let view = loop {
            match self.monitor.state() {
                SessionState::Unknown => {
                    self.main = None;
                    break View::Loading;
                }
                SessionState::Anonymous => {
                    // Prior user's screen and profile state go with it
                    self.main = None;
                    self.redirect(Route::Auth);
                    break View::Auth;
                }
                SessionState::Authenticated(session) => {
                    self.redirect(Route::Main);
                    let shown = self.main.as_ref().map(MainScreen::user_id);
                    if shown != Some(session.user_id()) && !self.open_main(session.user).await {
                        // Render whatever state superseded the load
                        continue;
                    }
                    break View::Main;
                }
            }
        };

        if view != self.view {
            info!("View: {:?} -> {:?}", self.view, view);
            self.view = view;
        }
        view
    }

    /// React to session changes until cancelled.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut changes = self.monitor.watch();
        self.sync().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.sync().await;
                }
            }
        }
    }

    /// Sign in from the auth screen and render once the monitor reports
    /// the signed-in user.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> AppResult<View> {
        let session = self.auth.submit_sign_in(email, password).await?;
        let user_id = session.user_id();

        let mut changes = self.monitor.watch();
        let _ = changes.wait_for(|s| s.user_id() == Some(user_id)).await;
        Ok(self.sync().await)
    }

    /// End the session from the main screen.
    pub async fn sign_out(&mut self) -> AppResult<()> {
        if let Err(e) = self.state.gateway.end_session().await {
            self.state
                .notifier
                .notify(Notification::error("Failed to sign out"));
            return Err(e);
        }

        self.state
            .notifier
            .notify(Notification::success("Signed out successfully"));

        let mut changes = self.monitor.watch();
        let _ = changes
            .wait_for(|s| !matches!(s, SessionState::Authenticated(_)))
            .await;
        self.sync().await;
        Ok(())
    }

    /// Stop the session monitor
    pub async fn shutdown(self) {
        self.monitor.shutdown().await;
    }

    fn redirect(&self, route: Route) {
        if self.navigator.current() != route {
            self.navigator.navigate(route);
        }
    }

    /// Install the main screen for `user`. Returns false when the session
    /// moved on while the profile was loading.
    async fn open_main(&mut self, user: AuthUser) -> bool {
        let user_id = user.id;
        let mut screen = MainScreen::new(user, &self.state);

        let loaded = screen.fetch_profile().await;

        if self.monitor.state().user_id() != Some(user_id) {
            debug!("Discarding profile load for {}", user_id);
            self.main = None;
            return false;
        }

        match loaded {
            Ok(account_id) => screen.apply_profile(account_id),
            Err(AppError::Cancelled) => {}
            Err(_) => self
                .state
                .notifier
                .notify(Notification::error(PROFILE_LOAD_FAILED)),
        }
        self.main = Some(screen);
        true
    }
}
