//! Identity service client.

mod identity_client;

pub use identity_client::{GoTrueClient, IdentityProvider, SignUpOutcome, SignUpRequest};

#[cfg(any(test, feature = "test-utils"))]
pub use identity_client::MockIdentityProvider;
