//! Client-side routes and navigation history.

use std::sync::Mutex;

use domain::{AUTH_ROUTE, MAIN_ROUTE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated entry
    Auth,
    /// Authenticated main screen
    Main,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Auth => AUTH_ROUTE,
            Route::Main => MAIN_ROUTE,
        }
    }
}

pub trait Navigator: Send + Sync {
    fn current(&self) -> Route;
    fn navigate(&self, route: Route);
}

/// In-memory history stack.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new(initial: Route) -> Self {
        Self {
            history: Mutex::new(vec![initial]),
        }
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Navigator for HistoryNavigator {
    fn current(&self) -> Route {
        let history = self.history.lock().unwrap_or_else(|p| p.into_inner());
        history.last().copied().unwrap_or(Route::Main)
    }

    fn navigate(&self, route: Route) {
        tracing::debug!("Navigating to {}", route.path());
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(route);
    }
}
