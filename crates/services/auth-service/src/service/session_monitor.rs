//! Session monitor - single source of truth for "who is signed in".
//!
//! Combines the one-shot initial fetch with the pushed event stream. Both
//! feed one transition function keyed by the hub's sequence numbers, so
//! the published state is the same whatever order they arrive in.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use common::AppError;
use domain::{Session, SESSION_REFRESH_MARGIN_SECONDS};

use crate::service::auth_client::{AuthClient, AuthNotice, AuthSubscription};

/// Observable authentication state.
///
/// `Unknown` only until the first resolution; never re-entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Authenticated(Session),
    Anonymous,
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unknown)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session().map(Session::user_id)
    }
}

/// Ordering guard: drops anything older than what was already applied.
#[derive(Debug, Default)]
struct Transitions {
    applied_seq: Option<u64>,
}

impl Transitions {
    fn next(
        &mut self,
        seq: u64,
        session: Option<Session>,
        now: DateTime<Utc>,
    ) -> Option<SessionState> {
        if matches!(self.applied_seq, Some(applied) if seq < applied) {
            debug!("Ignoring stale session update (seq {})", seq);
            return None;
        }
        self.applied_seq = Some(seq);

        Some(match session {
            Some(session) if !session.is_expired(now) => SessionState::Authenticated(session),
            _ => SessionState::Anonymous,
        })
    }
}

/// Running monitor. Dropping it releases the hub subscription.
pub struct SessionMonitor {
    state: watch::Receiver<SessionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SessionMonitor {
    /// Subscribe to the hub, then resolve the initial session.
    pub fn start(client: Arc<AuthClient>) -> Self {
        // Subscribe before fetching so no change can slip between the two
        let subscription = client.subscribe();
        let (tx, state) = watch::channel(SessionState::Unknown);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run(client, subscription, tx, cancel.clone()));

        Self {
            state,
            cancel,
            task: Some(task),
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait until the initial fetch (or an earlier event) has resolved.
    pub async fn resolved(&self) -> SessionState {
        let mut state = self.state.clone();
        if let Ok(resolved) = state.wait_for(SessionState::is_resolved).await {
            return resolved.clone();
        }
        let current = state.borrow().clone();
        current
    }

    /// Stop listening and wait for the listener to be released.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session monitor task failed: {}", e);
            }
        }
    }
}

impl Drop for SessionMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    client: Arc<AuthClient>,
    mut subscription: AuthSubscription,
    tx: watch::Sender<SessionState>,
    cancel: CancellationToken,
) {
    let mut transitions = Transitions::default();
    let initial = client.get_session();
    tokio::pin!(initial);
    let mut initial_pending = true;
    // The early refresh for the current session has been tried
    let mut early_refresh_tried = false;

    loop {
        let deadline = refresh_deadline(&tx.borrow(), early_refresh_tried);

        tokio::select! {
            _ = cancel.cancelled() => break,

            result = &mut initial, if initial_pending => {
                initial_pending = false;
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("Initial session fetch failed: {}", e);
                        client.current()
                    }
                };
                if publish(&tx, &mut transitions, snapshot.seq, snapshot.session) {
                    early_refresh_tried = false;
                }
            }

            notice = subscription.recv() => match notice {
                Some(AuthNotice::Event(event)) => {
                    if publish(&tx, &mut transitions, event.seq, event.session) {
                        early_refresh_tried = false;
                    }
                }
                Some(AuthNotice::Lagged(missed)) => {
                    warn!("Session monitor missed {} events, resynchronizing", missed);
                    let snapshot = client.current();
                    if publish(&tx, &mut transitions, snapshot.seq, snapshot.session) {
                        early_refresh_tried = false;
                    }
                }
                None => break,
            },

            _ = sleep_until(deadline) => {
                if !early_refresh_tried {
                    early_refresh_tried = true;
                    if let Err(e) = client.refresh_session().await {
                        warn!("Early session refresh failed: {}", e);
                    }
                } else {
                    let seq = client.current().seq;
                    match client.refresh_session().await {
                        Ok(_) | Err(AppError::Cancelled) => {}
                        Err(e) => {
                            warn!("Session expired and could not be refreshed: {}", e);
                            client.expire_session(seq).await;
                        }
                    }
                }
            }
        }
    }

    debug!("Session monitor stopped");
}

/// Apply an update; returns true when the published state changed.
fn publish(
    tx: &watch::Sender<SessionState>,
    transitions: &mut Transitions,
    seq: u64,
    session: Option<Session>,
) -> bool {
    let Some(next) = transitions.next(seq, session, Utc::now()) else {
        return false;
    };

    tx.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        match &next {
            SessionState::Authenticated(session) => info!("Session: authenticated as {}", session.email()),
            SessionState::Anonymous => info!("Session: anonymous"),
            SessionState::Unknown => {}
        }
        *current = next;
        true
    })
}

fn refresh_deadline(state: &SessionState, early_refresh_tried: bool) -> Option<DateTime<Utc>> {
    state.session().map(|session| {
        if early_refresh_tried {
            session.expires_at
        } else {
            session.refresh_due_at(SESSION_REFRESH_MARGIN_SECONDS)
        }
    })
}

async fn sleep_until(deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(at) => {
            let wait = (at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending::<()>().await,
    }
}
