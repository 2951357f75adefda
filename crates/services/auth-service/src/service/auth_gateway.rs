//! Auth gateway - the three round trips the forms need.
//!
//! Takes validated credentials only; validation failures never get here.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use common::{AppError, AppResult};
use domain::{Email, FullName, Password, Session, MAIN_ROUTE};

use crate::client::{SignUpOutcome, SignUpRequest};
use crate::service::AuthClient;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Authentication gateway trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Register a new account
    async fn register(
        &self,
        email: &Email,
        password: &Password,
        display_name: &FullName,
    ) -> AppResult<SignUpOutcome>;

    /// Sign in with email and password
    async fn authenticate(&self, email: &Email, password: &Password) -> AppResult<Session>;

    /// Sign out of the current session
    async fn end_session(&self) -> AppResult<()>;
}

/// Gateway backed by the auth hub.
pub struct Authenticator {
    client: Arc<AuthClient>,
    redirect_url: Url,
}

impl Authenticator {
    /// Create a gateway; confirmation links return to `<site_origin>/`.
    pub fn new(client: Arc<AuthClient>, site_origin: &str) -> AppResult<Self> {
        let redirect_url = Url::parse(site_origin)
            .and_then(|origin| origin.join(MAIN_ROUTE))
            .map_err(|e| AppError::service(format!("Invalid site origin {}: {}", site_origin, e)))?;

        Ok(Self {
            client,
            redirect_url,
        })
    }

    /// URL the identity service sends confirmed users back to
    pub fn redirect_url(&self) -> &Url {
        &self.redirect_url
    }
}

#[async_trait]
impl AuthGateway for Authenticator {
    async fn register(
        &self,
        email: &Email,
        password: &Password,
        display_name: &FullName,
    ) -> AppResult<SignUpOutcome> {
        debug!("Register {} (redirect {})", email, self.redirect_url);
        self.client
            .sign_up(SignUpRequest {
                email: email.clone(),
                password: password.clone(),
                full_name: display_name.clone(),
                redirect_to: self.redirect_url.clone(),
            })
            .await
    }

    async fn authenticate(&self, email: &Email, password: &Password) -> AppResult<Session> {
        self.client.sign_in_with_password(email, password).await
    }

    async fn end_session(&self) -> AppResult<()> {
        self.client.sign_out().await
    }
}
