//! End-to-end flows through the view router with in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Notify;
use uuid::Uuid;

use app_lib::navigation::{HistoryNavigator, Navigator, Route};
use app_lib::notify::{Notification, NotificationLevel, Notifier};
use app_lib::router::{View, ViewRouter};
use app_lib::screens::{AuthMode, Ledger, WalletProvider};
use app_lib::state::AppState;
use auth_service_lib::client::{IdentityProvider, SignUpOutcome, SignUpRequest};
use auth_service_lib::service::{AuthClient, Authenticator, SessionMonitor};
use auth_service_lib::storage::MemorySessionStorage;
use auth_service_lib::SessionState;
use common::{AppError, AppResult};
use domain::{AuthUser, Email, Gallons, MintReceipt, Password, Session};
use profile_service_lib::ProfileSynchronizer;

// =============================================================================
// In-memory collaborators
// =============================================================================

/// Identity service keeping accounts in memory.
#[derive(Default)]
struct FakeIdentity {
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    calls: AtomicUsize,
}

impl FakeIdentity {
    fn with_account(email: &str, password: &str) -> Self {
        Self::default().and_account(email, password)
    }

    fn and_account(self, email: &str, password: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (
                password.to_string(),
                AuthUser {
                    id: Uuid::new_v4(),
                    email: email.to_string(),
                    full_name: Some("Jane".to_string()),
                },
            ),
        );
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn session_for(user: AuthUser) -> Session {
        Session {
            access_token: format!("at-{}", user.id),
            refresh_token: format!("rt-{}", user.id),
            expires_at: Utc::now() + Duration::hours(1),
            user,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn sign_up(&self, request: SignUpRequest) -> AppResult<SignUpOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(request.email.as_str()) {
            return Err(AppError::DuplicateAccount);
        }
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: request.email.as_str().to_string(),
            full_name: Some(request.full_name.as_str().to_string()),
        };
        accounts.insert(
            request.email.as_str().to_string(),
            (request.password.expose().to_string(), user.clone()),
        );
        // Email confirmation pending: no session yet
        Ok(SignUpOutcome { user, session: None })
    }

    async fn sign_in_with_password(&self, email: &Email, password: &Password) -> AppResult<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let accounts = self.accounts.lock().unwrap();
        // Addresses are matched case-insensitively, as the service does
        match accounts.get(&email.as_str().to_lowercase()) {
            Some((stored, user)) if stored == password.expose() => {
                Ok(Self::session_for(user.clone()))
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> AppResult<Session> {
        Err(AppError::Unauthenticated)
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryProfiles {
    rows: Mutex<HashMap<Uuid, Option<String>>>,
    reject_writes: bool,
    fail_reads: bool,
}

#[async_trait]
impl ProfileSynchronizer for MemoryProfiles {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<String>> {
        if self.fail_reads {
            return Err(AppError::persistence("connection reset by peer"));
        }
        Ok(self.rows.lock().unwrap().get(&user_id).cloned().flatten())
    }

    async fn set_account_identifier(&self, user_id: Uuid, value: Option<String>) -> AppResult<()> {
        if self.reject_writes {
            return Err(AppError::persistence("row level security"));
        }
        self.rows.lock().unwrap().insert(user_id, value);
        Ok(())
    }
}

/// Profile store whose first read completes only once released.
#[derive(Default)]
struct HeldProfiles {
    entered: Notify,
    release: Notify,
    held: AtomicBool,
}

#[async_trait]
impl ProfileSynchronizer for HeldProfiles {
    async fn load(&self, _user_id: Uuid) -> AppResult<Option<String>> {
        if !self.held.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(None)
    }

    async fn set_account_identifier(&self, _user_id: Uuid, _value: Option<String>) -> AppResult<()> {
        Ok(())
    }
}

struct InstantWallet;

#[async_trait]
impl WalletProvider for InstantWallet {
    async fn create_account(&self) -> AppResult<String> {
        Ok("0.0.123456".to_string())
    }

    async fn connect_account(&self) -> AppResult<String> {
        Ok("0.0.654321".to_string())
    }
}

struct InstantLedger;

#[async_trait]
impl Ledger for InstantLedger {
    async fn mint(&self, _account_id: &str, gallons: Gallons) -> AppResult<MintReceipt> {
        Ok(MintReceipt {
            token_id: "0.0.900".to_string(),
            serial: 7,
            gallons,
        })
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<Notification>>);

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

impl RecordingNotifier {
    fn last(&self) -> Notification {
        self.0.lock().unwrap().last().cloned().expect("no notification")
    }

    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }
}

struct Harness {
    router: ViewRouter,
    client: Arc<AuthClient>,
    identity: Arc<FakeIdentity>,
    profiles: Arc<dyn ProfileSynchronizer>,
    notifier: Arc<RecordingNotifier>,
    navigator: Arc<HistoryNavigator>,
}

fn harness(identity: FakeIdentity, profiles: MemoryProfiles) -> Harness {
    harness_with(identity, Arc::new(profiles))
}

fn harness_with(identity: FakeIdentity, profiles: Arc<dyn ProfileSynchronizer>) -> Harness {
    let identity = Arc::new(identity);
    let notifier = Arc::new(RecordingNotifier::default());
    let navigator = Arc::new(HistoryNavigator::new(Route::Main));

    let client = Arc::new(AuthClient::new(
        identity.clone(),
        Arc::new(MemorySessionStorage::new()),
    ));
    let gateway = Arc::new(Authenticator::new(client.clone(), "http://localhost:8080").unwrap());
    let state = AppState::new(
        gateway,
        profiles.clone(),
        Arc::new(InstantWallet),
        Arc::new(InstantLedger),
        notifier.clone(),
    );
    let router = ViewRouter::new(
        SessionMonitor::start(client.clone()),
        state,
        navigator.clone(),
    );

    Harness {
        router,
        client,
        identity,
        profiles,
        notifier,
        navigator,
    }
}

async fn sign_in(h: &mut Harness, email: &str, password: &str) {
    assert_eq!(h.router.sign_in(email, password).await.unwrap(), View::Main);
}

/// Sign in without rendering, then wait for the monitor to catch up.
async fn sign_in_unrendered(h: &mut Harness, email: &str, password: &str) {
    h.router
        .auth_screen()
        .submit_sign_in(email, password)
        .await
        .unwrap();
    let mut rx = h.router.session_watch();
    rx.wait_for(|s| s.session().is_some()).await.unwrap();
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_anonymous_start_redirects_to_auth() {
    let mut h = harness(FakeIdentity::default(), MemoryProfiles::default());

    assert_eq!(h.router.view(), View::Loading);
    assert_eq!(h.router.resolve().await, View::Auth);
    assert_eq!(h.navigator.current(), Route::Auth);
}

#[tokio::test]
async fn test_sign_up_notifies_and_flips_to_sign_in() {
    let mut h = harness(FakeIdentity::default(), MemoryProfiles::default());
    h.router.resolve().await;
    h.router.auth_screen().toggle_mode();

    let result = h
        .router
        .auth_screen()
        .submit_sign_up("a@b.com", "secret1", "Jane")
        .await;

    tokio_test::assert_ok!(result);
    assert_eq!(h.router.auth_screen().mode(), AuthMode::SignIn);
    let note = h.notifier.last();
    assert_eq!(note.level, NotificationLevel::Success);
    assert_eq!(note.message, "Account created successfully! You can now sign in.");
}

#[tokio::test]
async fn test_duplicate_sign_up_is_not_a_service_error() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles::default(),
    );
    h.router.resolve().await;

    let result = h
        .router
        .auth_screen()
        .submit_sign_up("a@b.com", "another1", "Jane")
        .await;

    assert!(matches!(result, Err(AppError::DuplicateAccount)));
}

#[tokio::test]
async fn test_short_password_issues_no_network_call() {
    let mut h = harness(FakeIdentity::default(), MemoryProfiles::default());
    h.router.resolve().await;

    let result = h.router.auth_screen().submit_sign_in("a@b.com", "abc").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(h.identity.calls(), 0);
    assert_eq!(h.notifier.messages(), vec!["Password must be at least 6 characters"]);
}

#[tokio::test]
async fn test_sign_in_shows_main_with_linked_account() {
    let identity = FakeIdentity::with_account("a@b.com", "secret1");
    let user_id = identity.accounts.lock().unwrap()["a@b.com"].1.id;
    let profiles = MemoryProfiles::default();
    profiles
        .rows
        .lock()
        .unwrap()
        .insert(user_id, Some("0.0.111111".to_string()));
    let mut h = harness(identity, profiles);
    h.router.resolve().await;

    sign_in(&mut h, "a@b.com", "secret1").await;

    assert_eq!(h.navigator.current(), Route::Main);
    let main = h.router.main_screen().unwrap();
    assert_eq!(main.user().email, "a@b.com");
    assert_eq!(main.account_id(), Some("0.0.111111"));
}

#[tokio::test]
async fn test_wallet_and_mint_flow() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles::default(),
    );
    h.router.resolve().await;
    sign_in(&mut h, "a@b.com", "secret1").await;

    let main = h.router.main_screen_mut().unwrap();
    let early = main.mint("100").await;
    assert!(matches!(early, Err(AppError::WalletRequired)));

    let account = main.wallet_mut().create_wallet().await.unwrap();
    let user_id = main.user_id();
    assert_eq!(
        h.profiles.load(user_id).await.unwrap().as_deref(),
        Some(account.as_str())
    );

    let main = h.router.main_screen().unwrap();
    let receipt = main.mint("100").await.unwrap();
    assert_eq!(receipt.serial, 7);
    let note = h.notifier.last();
    assert_eq!(note.message, "Successfully minted Water Rights NFT!");
    assert_eq!(
        note.description.as_deref(),
        Some("NFT ID: 0.0.900 | Serial: 7 | 100 gallons")
    );
}

#[tokio::test]
async fn test_rejected_profile_write_keeps_wallet_disconnected() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles {
            reject_writes: true,
            ..Default::default()
        },
    );
    h.router.resolve().await;
    sign_in(&mut h, "a@b.com", "secret1").await;

    let main = h.router.main_screen_mut().unwrap();
    let result = main.wallet_mut().connect_wallet().await;

    assert!(matches!(result, Err(AppError::Persistence(_))));
    assert!(!main.wallet().is_connected());
    assert_eq!(h.notifier.last().message, "Failed to connect wallet");
}

#[tokio::test]
async fn test_sign_out_returns_to_auth_and_drops_user_state() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles::default(),
    );
    h.router.resolve().await;
    sign_in(&mut h, "a@b.com", "secret1").await;

    tokio_test::assert_ok!(h.router.sign_out().await);

    assert_eq!(h.router.view(), View::Auth);
    assert!(h.router.main_screen().is_none());
    assert_eq!(h.navigator.current(), Route::Auth);
    assert_eq!(h.notifier.last().message, "Signed out successfully");
}

#[tokio::test]
async fn test_run_follows_session_changes() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles::default(),
    );
    h.router.resolve().await;

    h.router
        .auth_screen()
        .submit_sign_in("a@b.com", "secret1")
        .await
        .unwrap();

    // Stop as soon as the change has been rendered
    let cancel = tokio_util::sync::CancellationToken::new();
    let stopper = cancel.clone();
    let navigator = h.navigator.clone();
    tokio::spawn(async move {
        while navigator.current() != Route::Main {
            tokio::task::yield_now().await;
        }
        stopper.cancel();
    });
    h.router.run(cancel).await;

    assert_eq!(h.router.view(), View::Main);
    assert_eq!(h.navigator.current(), Route::Main);
}

#[tokio::test]
async fn test_sign_in_with_unnormalized_email_renders_main() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles::default(),
    );
    h.router.resolve().await;

    let view = tokio::time::timeout(
        StdDuration::from_secs(5),
        h.router.sign_in("  A@B.com ", "secret1"),
    )
    .await
    .expect("sign-in should finish once the session is reported")
    .unwrap();

    assert_eq!(view, View::Main);
    assert_eq!(h.router.main_screen().unwrap().user().email, "a@b.com");
}

#[tokio::test]
async fn test_failed_profile_load_is_reported() {
    let mut h = harness(
        FakeIdentity::with_account("a@b.com", "secret1"),
        MemoryProfiles {
            fail_reads: true,
            ..Default::default()
        },
    );
    h.router.resolve().await;

    sign_in(&mut h, "a@b.com", "secret1").await;

    let note = h.notifier.last();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.message, "Failed to load profile information");
    assert_eq!(h.router.main_screen().unwrap().account_id(), None);
}

#[tokio::test]
async fn test_sign_out_during_profile_load_renders_auth() {
    let profiles = Arc::new(HeldProfiles::default());
    let mut h = harness_with(
        FakeIdentity::with_account("a@b.com", "secret1"),
        profiles.clone(),
    );
    h.router.resolve().await;
    sign_in_unrendered(&mut h, "a@b.com", "secret1").await;

    let client = h.client.clone();
    let mut changes = h.router.session_watch();
    let sign_out = async move {
        profiles.entered.notified().await;
        client.sign_out().await.unwrap();
        changes
            .wait_for(|s| *s == SessionState::Anonymous)
            .await
            .unwrap();
        profiles.release.notify_one();
    };
    let (view, ()) = tokio::join!(h.router.sync(), sign_out);

    assert_eq!(view, View::Auth);
    assert_eq!(h.router.view(), View::Auth);
    assert!(h.router.main_screen().is_none());
    assert_eq!(h.navigator.current(), Route::Auth);
}

#[tokio::test]
async fn test_account_switch_during_profile_load_renders_new_user() {
    let profiles = Arc::new(HeldProfiles::default());
    let mut h = harness_with(
        FakeIdentity::with_account("a@b.com", "secret1").and_account("c@d.com", "secret2"),
        profiles.clone(),
    );
    h.router.resolve().await;
    sign_in_unrendered(&mut h, "a@b.com", "secret1").await;

    let client = h.client.clone();
    let mut changes = h.router.session_watch();
    let switch = async move {
        profiles.entered.notified().await;
        client
            .sign_in_with_password(
                &Email::parse("c@d.com").unwrap(),
                &Password::parse("secret2").unwrap(),
            )
            .await
            .unwrap();
        changes
            .wait_for(|s| s.session().map(Session::email) == Some("c@d.com"))
            .await
            .unwrap();
        profiles.release.notify_one();
    };
    let (view, ()) = tokio::join!(h.router.sync(), switch);

    assert_eq!(view, View::Main);
    assert_eq!(h.router.main_screen().unwrap().user().email, "c@d.com");
}
