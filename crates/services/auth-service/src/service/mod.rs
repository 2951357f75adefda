//! Authentication state and use cases.

mod auth_client;
mod auth_gateway;
mod session_monitor;

pub use auth_client::{AuthClient, AuthEvent, AuthEventKind, AuthNotice, AuthSubscription, SessionSnapshot};
pub use auth_gateway::{AuthGateway, Authenticator};
pub use session_monitor::{SessionMonitor, SessionState};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_gateway::MockAuthGateway;
