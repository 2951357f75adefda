//! Client-side auth hub.
//!
//! Owns the one mutable session slot of this client and broadcasts every
//! change to subscribers. Each committed change carries a sequence number
//! that only ever increases, so listeners can order updates that reach
//! them through different paths.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use common::{AppError, AppResult, OptionExt};
use domain::{Email, Password, Session};

use crate::client::{IdentityProvider, SignUpOutcome, SignUpRequest};
use crate::storage::SessionStorage;

/// Buffered events per subscriber before it is reported as lagging
const EVENT_CAPACITY: usize = 16;

/// Kind of session change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Session change pushed to subscribers.
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub seq: u64,
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

/// Point-in-time view of the session slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub seq: u64,
    pub session: Option<Session>,
}

/// What a subscriber receives.
#[derive(Debug, Clone)]
pub enum AuthNotice {
    Event(AuthEvent),
    /// The subscriber fell behind and this many events were dropped
    Lagged(u64),
}

/// Listener registration. Dropping it releases the listener.
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Wait for the next notice; `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<AuthNotice> {
        match self.receiver.recv().await {
            Ok(event) => Some(AuthNotice::Event(event)),
            Err(RecvError::Lagged(missed)) => Some(AuthNotice::Lagged(missed)),
            Err(RecvError::Closed) => None,
        }
    }

    /// Release the listener explicitly
    pub fn unsubscribe(self) {}
}

#[derive(Debug, Default)]
struct Slot {
    seq: u64,
    session: Option<Session>,
    /// Storage has been read, or a newer state was committed
    loaded: bool,
}

/// Auth hub over an identity provider and a session store.
pub struct AuthClient {
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn SessionStorage>,
    slot: Mutex<Slot>,
    /// Serializes persist-then-publish so storage matches the latest seq
    commit_lock: tokio::sync::Mutex<()>,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthClient {
    pub fn new(provider: Arc<dyn IdentityProvider>, storage: Arc<dyn SessionStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            provider,
            storage,
            slot: Mutex::new(Slot::default()),
            commit_lock: tokio::sync::Mutex::new(()),
            events,
        }
    }

    /// Register a listener for session changes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.events.subscribe(),
        }
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Current slot contents without any IO.
    pub fn current(&self) -> SessionSnapshot {
        let slot = self.slot();
        SessionSnapshot {
            seq: slot.seq,
            session: slot.session.clone(),
        }
    }

    /// One-shot fetch of the existing session.
    ///
    /// Reads storage on first use. An expired session is refreshed, or
    /// signed out when the refresh fails.
    pub async fn get_session(&self) -> AppResult<SessionSnapshot> {
        self.ensure_loaded().await;

        let snapshot = self.current();
        let expired = matches!(&snapshot.session, Some(s) if s.is_expired(Utc::now()));
        if expired {
            debug!("Stored session expired, refreshing");
            if let Err(e) = self.refresh_session().await {
                warn!("Could not refresh stored session: {}", e);
                self.expire_session(snapshot.seq).await;
            }
        }

        Ok(self.current())
    }

    /// Register an account. Signs in when the service returns a session.
    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<SignUpOutcome> {
        let outcome = self.provider.sign_up(request).await?;

        if let Some(session) = &outcome.session {
            self.commit(AuthEventKind::SignedIn, Some(session.clone())).await;
        }

        Ok(outcome)
    }

    /// Exchange credentials for a session and make it current.
    pub async fn sign_in_with_password(&self, email: &Email, password: &Password) -> AppResult<Session> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        info!("Signed in as {}", session.email());
        self.commit(AuthEventKind::SignedIn, Some(session.clone())).await;
        Ok(session)
    }

    /// Revoke the current session. On failure the session stays current.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.ensure_loaded().await;

        if let Some(session) = self.current().session {
            self.provider.sign_out(&session.access_token).await?;
            info!("Signed out {}", session.email());
        }

        self.commit(AuthEventKind::SignedOut, None).await;
        Ok(())
    }

    /// Replace the current session with a freshly issued one.
    ///
    /// A rejected refresh token, or a failure once the access token has
    /// expired, signs the session out. If the session changes while the
    /// round trip is in flight, the result is dropped with `Cancelled`.
    pub async fn refresh_session(&self) -> AppResult<Session> {
        let SessionSnapshot { seq, session } = self.current();
        let current = session.ok_or_unauthenticated()?;

        match self.provider.refresh(&current.refresh_token).await {
            Ok(session) => {
                let committed = self
                    .commit_from(seq, AuthEventKind::TokenRefreshed, Some(session.clone()))
                    .await;
                if committed.is_none() {
                    return Err(AppError::Cancelled);
                }
                debug!("Session refreshed for {}", session.email());
                Ok(session)
            }
            Err(e) => {
                if matches!(e, AppError::Unauthenticated) || current.is_expired(Utc::now()) {
                    self.expire_session(seq).await;
                }
                Err(e)
            }
        }
    }

    /// Drop the session locally, without a round trip, unless it changed
    /// after `seq`. Returns whether it was dropped.
    pub async fn expire_session(&self, seq: u64) -> bool {
        let ended = self
            .commit_from(seq, AuthEventKind::SignedOut, None)
            .await
            .is_some();
        if ended {
            info!("Session ended locally");
        }
        ended
    }

    async fn ensure_loaded(&self) {
        if self.slot().loaded {
            return;
        }

        let stored = match self.storage.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Session storage unavailable: {}", e);
                None
            }
        };

        let mut slot = self.slot();
        // A state committed while storage was being read wins
        if !slot.loaded {
            slot.session = stored;
            slot.loaded = true;
        }
    }

    /// Persist, then publish a new state under the next sequence number.
    async fn commit(&self, kind: AuthEventKind, session: Option<Session>) -> AuthEvent {
        let _guard = self.commit_lock.lock().await;
        self.persist_and_publish(kind, session).await
    }

    /// Commit only if nothing was committed after `seq`.
    async fn commit_from(
        &self,
        seq: u64,
        kind: AuthEventKind,
        session: Option<Session>,
    ) -> Option<AuthEvent> {
        let _guard = self.commit_lock.lock().await;

        let latest = self.slot().seq;
        if latest != seq {
            debug!("Dropped {:?} from seq {}; session is at seq {}", kind, seq, latest);
            return None;
        }

        Some(self.persist_and_publish(kind, session).await)
    }

    /// Caller holds `commit_lock`.
    async fn persist_and_publish(&self, kind: AuthEventKind, session: Option<Session>) -> AuthEvent {
        let persisted = match &session {
            Some(s) => self.storage.save(s).await,
            None => self.storage.clear().await,
        };
        if let Err(e) = persisted {
            warn!("Session storage update failed: {}", e);
        }

        let event = {
            let mut slot = self.slot();
            slot.seq += 1;
            slot.session = session.clone();
            slot.loaded = true;
            AuthEvent {
                seq: slot.seq,
                kind,
                session,
            }
        };

        // No listeners is not an error
        let _ = self.events.send(event.clone());
        debug!("Published {:?} (seq {})", event.kind, event.seq);
        event
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
