//! HTTP client for the external identity service.
//!
//! Speaks the GoTrue REST dialect (`/auth/v1/...`). Every call is a single
//! round trip with no retry; failures are classified into duplicate
//! registration, invalid credentials and generic service errors.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use common::{AppError, AppResult, IdentityConfig};
use domain::{AuthUser, Email, FullName, Password, Session, FULL_NAME_METADATA_KEY};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

const SIGNUP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const LOGOUT_PATH: &str = "auth/v1/logout";

/// Registration request forwarded to the identity service
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: Email,
    pub password: Password,
    pub full_name: FullName,
    /// Where the confirmation email sends the user back to
    pub redirect_to: Url,
}

/// Result of a successful registration
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    /// Present only when the service signs the user in immediately
    /// (email confirmation disabled)
    pub session: Option<Session>,
}

/// Round trips consumed from the identity service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Register a new account
    async fn sign_up(&self, request: SignUpRequest) -> AppResult<SignUpOutcome>;

    /// Exchange email and password for a session
    async fn sign_in_with_password(&self, email: &Email, password: &Password) -> AppResult<Session>;

    /// Exchange a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> AppResult<Session>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}

/// Which round trip produced a failure; drives error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    SignUp,
    PasswordGrant,
    RefreshGrant,
    SignOut,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct SignUpBody<'a> {
    email: &'a str,
    password: &'a str,
    data: Map<String, Value>,
}

#[derive(Serialize)]
struct PasswordGrantBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrantBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    identities: Option<Vec<Value>>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

/// Sign-up answers with a session when confirmation is disabled, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(TokenPayload),
    User(UserPayload),
}

/// Error body; the service has used several shapes over time.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorPayload {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorPayload {
    fn text(&self) -> Option<&str> {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .or(self.message.as_deref())
            .or(self.error.as_deref())
    }
}

impl UserPayload {
    fn into_user(self) -> AuthUser {
        let full_name = self
            .user_metadata
            .get(FULL_NAME_METADATA_KEY)
            .and_then(Value::as_str)
            .map(str::to_string);

        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
            full_name,
        }
    }

    /// An obfuscated user with no identities is how the service answers a
    /// sign-up for an email that already exists.
    fn is_obfuscated_duplicate(&self) -> bool {
        matches!(&self.identities, Some(identities) if identities.is_empty())
    }
}

impl TokenPayload {
    fn into_session(self, now: DateTime<Utc>) -> AppResult<Session> {
        let expires_at = match self
            .expires_at
            .and_then(|at| DateTime::<Utc>::from_timestamp(at, 0))
        {
            Some(at) => at,
            None => Duration::try_seconds(self.expires_in)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .ok_or_else(|| {
                    AppError::unavailable(format!("Session lifetime out of range: {}s", self.expires_in))
                })?,
        };

        Ok(Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into_user(),
        })
    }
}

/// Classify a non-success response.
pub(crate) fn classify(flow: Flow, status: u16, payload: &ErrorPayload) -> AppError {
    let code = payload.error_code.as_deref().unwrap_or_default();
    let text = payload.text().unwrap_or_default();
    let lowered = text.to_lowercase();

    match flow {
        Flow::SignUp
            if code == "user_already_exists"
                || code == "email_exists"
                || lowered.contains("already registered") =>
        {
            AppError::DuplicateAccount
        }
        Flow::PasswordGrant
            if code == "invalid_credentials"
                || payload.error.as_deref() == Some("invalid_grant")
                || lowered.contains("invalid login credentials") =>
        {
            AppError::InvalidCredentials
        }
        Flow::RefreshGrant if status == 400 || status == 401 => AppError::Unauthenticated,
        _ if text.is_empty() => {
            AppError::service(format!("Identity service returned status {}", status))
        }
        _ => AppError::service(text),
    }
}

// =============================================================================
// HTTP Client
// =============================================================================

/// reqwest-backed identity service client.
pub struct GoTrueClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl GoTrueClient {
    /// Create a client for the configured service.
    pub fn new(config: &IdentityConfig) -> AppResult<Self> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| AppError::unavailable(format!("Invalid identity service URL: {}", e)))?;

        // Relative joins must extend the path, not replace its last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::unavailable(format!("Invalid identity endpoint: {}", e)))
    }

    fn post(&self, url: Url, bearer: &str) -> RequestBuilder {
        self.http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(bearer)
    }

    /// Send a request and decode a success body, classifying failures.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, flow: Flow) -> AppResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let payload = response.json::<ErrorPayload>().await.unwrap_or_default();
            debug!("Identity service {:?} failed with {}: {:?}", flow, status, payload);
            return Err(classify(flow, status.as_u16(), &payload));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::unavailable(format!("Unexpected identity service response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_up(&self, request: SignUpRequest) -> AppResult<SignUpOutcome> {
        let mut url = self.endpoint(SIGNUP_PATH)?;
        url.query_pairs_mut()
            .append_pair("redirect_to", request.redirect_to.as_str());

        let mut data = Map::new();
        data.insert(
            FULL_NAME_METADATA_KEY.to_string(),
            Value::String(request.full_name.as_str().to_string()),
        );

        debug!("Registering {}", request.email);
        let payload: SignUpPayload = self
            .send(
                self.post(url, &self.api_key).json(&SignUpBody {
                    email: request.email.as_str(),
                    password: request.password.expose(),
                    data,
                }),
                Flow::SignUp,
            )
            .await?;

        match payload {
            SignUpPayload::Session(token) => {
                let session = token.into_session(Utc::now())?;
                Ok(SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                })
            }
            SignUpPayload::User(user) if user.is_obfuscated_duplicate() => {
                Err(AppError::DuplicateAccount)
            }
            SignUpPayload::User(user) => Ok(SignUpOutcome {
                user: user.into_user(),
                session: None,
            }),
        }
    }

    async fn sign_in_with_password(&self, email: &Email, password: &Password) -> AppResult<Session> {
        let mut url = self.endpoint(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        debug!("Signing in {}", email);
        let token: TokenPayload = self
            .send(
                self.post(url, &self.api_key).json(&PasswordGrantBody {
                    email: email.as_str(),
                    password: password.expose(),
                }),
                Flow::PasswordGrant,
            )
            .await?;

        token.into_session(Utc::now())
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        let mut url = self.endpoint(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", "refresh_token");

        debug!("Refreshing session");
        let token: TokenPayload = self
            .send(
                self.post(url, &self.api_key)
                    .json(&RefreshGrantBody { refresh_token }),
                Flow::RefreshGrant,
            )
            .await?;

        token.into_session(Utc::now())
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let url = self.endpoint(LOGOUT_PATH)?;

        debug!("Revoking session");
        let response = self.post(url, access_token).send().await?;
        let status = response.status();

        // A token the service no longer knows is already signed out
        if status.is_success() || status.as_u16() == 401 || status.as_u16() == 404 {
            return Ok(());
        }

        let payload = response.json::<ErrorPayload>().await.unwrap_or_default();
        Err(classify(Flow::SignOut, status.as_u16(), &payload))
    }
}
