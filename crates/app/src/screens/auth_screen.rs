//! Sign-in / sign-up form.

use std::sync::Arc;

use tracing::debug;

use auth_service_lib::AuthGateway;
use common::{AppError, AppResult};
use domain::{Session, SignInCredentials, SignUpCredentials};

use crate::notify::{Notification, Notifier};

const SIGN_UP_SUCCESS: &str = "Account created successfully! You can now sign in.";
const SIGN_IN_SUCCESS: &str = "Welcome back!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

/// Auth form state and submit flows.
///
/// Validation failures are reported and returned without touching the
/// gateway.
pub struct AuthScreen {
    mode: AuthMode,
    gateway: Arc<dyn AuthGateway>,
    notifier: Arc<dyn Notifier>,
}

impl AuthScreen {
    pub fn new(gateway: Arc<dyn AuthGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            mode: AuthMode::SignIn,
            gateway,
            notifier,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
    }

    /// Switch between sign-in and sign-up
    pub fn toggle_mode(&mut self) -> AuthMode {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.mode
    }

    pub async fn submit_sign_in(&mut self, email: &str, password: &str) -> AppResult<Session> {
        let credentials = SignInCredentials::validate(email, password)
            .map_err(|e| self.reject(AppError::Validation(e)))?;

        let session = self
            .gateway
            .authenticate(&credentials.email, &credentials.password)
            .await
            .map_err(|e| self.reject(e))?;

        self.notifier.notify(Notification::success(SIGN_IN_SUCCESS));
        Ok(session)
    }

    /// Register, then flip to sign-in. The session monitor picks up any
    /// session the service hands out straight away.
    pub async fn submit_sign_up(
        &mut self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> AppResult<()> {
        let credentials = SignUpCredentials::validate(email, password, full_name)
            .map_err(|e| self.reject(AppError::Validation(e)))?;

        let outcome = self
            .gateway
            .register(&credentials.email, &credentials.password, &credentials.full_name)
            .await
            .map_err(|e| self.reject(e))?;
        debug!(
            "Registered {} (session issued: {})",
            outcome.user.email,
            outcome.session.is_some()
        );

        self.notifier.notify(Notification::success(SIGN_UP_SUCCESS));
        self.mode = AuthMode::SignIn;
        Ok(())
    }

    fn reject(&self, err: AppError) -> AppError {
        self.notifier.notify(Notification::from_error(&err));
        err
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use auth_service_lib::client::SignUpOutcome;
    use auth_service_lib::service::MockAuthGateway;
    use domain::{AuthUser, Field, ValidationError};

    use super::*;
    use crate::notify::NotificationLevel;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Notification>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    impl Recorder {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().iter().map(|n| n.message.clone()).collect()
        }
    }

    fn user(email: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: Some("Jane".to_string()),
        }
    }

    fn screen(gateway: MockAuthGateway) -> (AuthScreen, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (AuthScreen::new(Arc::new(gateway), recorder.clone()), recorder)
    }

    #[test]
    fn test_toggle_mode() {
        let (mut screen, _) = screen(MockAuthGateway::new());
        assert_eq!(screen.mode(), AuthMode::SignIn);
        assert_eq!(screen.toggle_mode(), AuthMode::SignUp);
        assert_eq!(screen.toggle_mode(), AuthMode::SignIn);
    }

    #[tokio::test]
    async fn test_short_password_never_reaches_gateway() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_authenticate().never();
        let (mut screen, recorder) = screen(gateway);

        let result = screen.submit_sign_in("a@b.com", "abc").await;

        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::TooShort {
                field: Field::Password,
                min: 6
            }))
        ));
        assert_eq!(recorder.messages(), vec!["Password must be at least 6 characters"]);
    }

    #[tokio::test]
    async fn test_sign_up_success_flips_to_sign_in() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_register()
            .withf(|email, password, name| {
                email.as_str() == "a@b.com" && password.expose() == "secret1" && name.as_str() == "Jane"
            })
            .times(1)
            .returning(|email, _, _| {
                Ok(SignUpOutcome {
                    user: user(email.as_str()),
                    session: None,
                })
            });
        let (mut screen, recorder) = screen(gateway);
        screen.set_mode(AuthMode::SignUp);

        let result = screen.submit_sign_up(" a@b.com ", "secret1", " Jane ").await;

        tokio_test::assert_ok!(result);
        assert_eq!(screen.mode(), AuthMode::SignIn);
        assert_eq!(
            recorder.messages(),
            vec!["Account created successfully! You can now sign in."]
        );
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_keeps_mode() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_register()
            .returning(|_, _, _| Err(AppError::DuplicateAccount));
        let (mut screen, recorder) = screen(gateway);
        screen.set_mode(AuthMode::SignUp);

        let result = screen.submit_sign_up("a@b.com", "secret1", "Jane").await;

        assert!(matches!(result, Err(AppError::DuplicateAccount)));
        assert_eq!(screen.mode(), AuthMode::SignUp);
        assert_eq!(
            recorder.messages(),
            vec!["This email is already registered. Please sign in instead."]
        );
    }

    #[tokio::test]
    async fn test_sign_in_success_notifies() {
        let mut gateway = MockAuthGateway::new();
        gateway.expect_authenticate().returning(|email, _| {
            Ok(Session {
                access_token: "at".to_string(),
                refresh_token: "rt".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
                user: user(email.as_str()),
            })
        });
        let (mut screen, recorder) = screen(gateway);

        let session = screen.submit_sign_in("a@b.com", "secret1").await.unwrap();

        assert_eq!(session.email(), "a@b.com");
        let notes = recorder.0.lock().unwrap();
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(notes[0].message, "Welcome back!");
    }

    #[tokio::test]
    async fn test_invalid_credentials_notifies_once() {
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_authenticate()
            .times(1)
            .returning(|_, _| Err(AppError::InvalidCredentials));
        let (mut screen, recorder) = screen(gateway);

        let result = screen.submit_sign_in("a@b.com", "wrong-password").await;

        assert!(matches!(result, Err(AppError::InvalidCredentials)));
        assert_eq!(
            recorder.messages(),
            vec!["Invalid email or password. Please try again."]
        );
    }
}
