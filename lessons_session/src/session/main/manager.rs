use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::identity::{IdentityClient, IdentityError, UserRecord};
use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::{Session, SessionKeys, SessionStatus};
use crate::storage::PersistentStore;

use super::guard::{Access, AccessRequirement, check_access};
use super::persistence;
use super::subscribers::{Listeners, Subscription};

/// Result slot of the in-flight re-validation; `None` until it settles.
type Settled = watch::Receiver<Option<Session>>;

/// Owns the client-side session and keeps it in sync with the persistent
/// store and the identity service.
///
/// ```text
///   new() ──→ [Restoring] ──restore()──→ [Authenticated] ──refresh()──→ [Syncing]
///                  │                       ▲        │                     │
///                  │ nothing stored        │ login  │ logout              ├─ ok / transient ──→ [Authenticated]
///                  ▼                       │        ▼                     │
///            [Unauthenticated] ◀───────────┴────────┴─────────────────────┴─ unauthorized
/// ```
///
/// The handle is cheap to clone; clones share one session. Create it in the
/// composition root and hand clones to whatever needs the session.
#[derive(Clone)]
pub struct SessionManager {
    pub(super) shared: Arc<Shared>,
}

pub(super) struct Shared {
    store: Arc<dyn PersistentStore>,
    client: Arc<dyn IdentityClient>,
    pub(super) config: SessionConfig,
    keys: SessionKeys,
    state: Mutex<State>,
    listeners: Arc<Listeners>,
}

struct State {
    session: Session,
    in_flight: Option<Settled>,
}

impl SessionManager {
    /// Create a manager that has not read the store yet (`Restoring`).
    ///
    /// Call [`restore`](Self::restore) to load persisted state, or use
    /// [`start`](Self::start) to do both.
    pub fn new(
        store: Arc<dyn PersistentStore>,
        client: Arc<dyn IdentityClient>,
        config: SessionConfig,
    ) -> Self {
        let keys = SessionKeys::with_prefix(&config.store_key_prefix);
        Self {
            shared: Arc::new(Shared {
                store,
                client,
                config,
                keys,
                state: Mutex::new(State {
                    session: Session::restoring(),
                    in_flight: None,
                }),
                listeners: Arc::new(Listeners::default()),
            }),
        }
    }

    /// Create a manager and restore the persisted session.
    pub fn start(
        store: Arc<dyn PersistentStore>,
        client: Arc<dyn IdentityClient>,
        config: SessionConfig,
    ) -> Self {
        let manager = Self::new(store, client, config);
        manager.restore();
        manager
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, session: &Session) {
        tracing::debug!("Session transition: {:?}", session.status);
        self.shared.listeners.notify(session);
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.lock_state().session.clone()
    }

    /// Load the persisted session and adopt it optimistically.
    ///
    /// A restored session is re-validated in the background when
    /// `revalidate_on_start` is set; the UI is never blocked on the network.
    /// Calling this again re-reads the store, which picks up changes made by
    /// other managers sharing it.
    pub fn restore(&self) {
        let restored = persistence::load(self.shared.store.as_ref(), &self.shared.keys);

        let (snapshot, changed) = {
            let mut state = self.lock_state();
            let next = match restored {
                Some((token, user)) => {
                    tracing::info!("Restored persisted session for user {}", user.id);
                    Session::authenticated(token, user, None)
                }
                None => Session::unauthenticated(),
            };
            let changed = state.session != next;
            state.session = next;
            (state.session.clone(), changed)
        };

        if changed {
            self.notify(&snapshot);
        }

        if snapshot.is_authenticated() && self.shared.config.revalidate_on_start {
            self.begin_refresh();
        }
    }

    /// Adopt a freshly issued credential.
    ///
    /// The pair is persisted before the in-memory session changes, so a
    /// reload right after this call restores it. On a storage failure the
    /// session is left as it was.
    pub fn login(&self, token: impl Into<String>, user: UserRecord) -> Result<(), SessionError> {
        let token = token.into();

        let snapshot = {
            let mut state = self.lock_state();
            persistence::save(self.shared.store.as_ref(), &self.shared.keys, &token, &user)
                .inspect_err(|e| tracing::error!("Failed to persist session: {}", e))?;

            let unchanged = state.session.is_authenticated()
                && state.session.token.as_deref() == Some(token.as_str())
                && state.session.user.as_ref() == Some(&user);
            if unchanged {
                return Ok(());
            }

            tracing::info!("User {} signed in", user.id);
            state.session = Session::authenticated(token, user, Some(Utc::now()));
            state.session.clone()
        };

        self.notify(&snapshot);
        Ok(())
    }

    /// Fetch the identity behind `token` and sign in with it.
    pub async fn sign_in_with_token(&self, token: &str) -> Result<Session, SessionError> {
        let user = self.shared.client.fetch_current_identity(token).await?;
        self.login(token, user)?;
        Ok(self.session())
    }

    /// Drop the credential from memory and from the store.
    ///
    /// Memory is cleared even if the store cannot be written; the storage
    /// error is returned afterwards. Safe to call when signed out.
    pub fn logout(&self) -> Result<(), SessionError> {
        let (snapshot, changed, result) = {
            let mut state = self.lock_state();
            self.clear_locked(&mut state)
        };

        if changed {
            tracing::info!("User signed out");
            self.notify(&snapshot);
        }
        result.map_err(SessionError::from)
    }

    fn clear_locked(
        &self,
        state: &mut State,
    ) -> (Session, bool, Result<(), crate::storage::StorageError>) {
        let changed = state.session.status != SessionStatus::Unauthenticated;
        state.session = Session::unauthenticated();

        let result = persistence::clear(self.shared.store.as_ref(), &self.shared.keys);
        if let Err(e) = &result {
            tracing::error!("Failed to clear persisted session: {}", e);
        }
        (state.session.clone(), changed, result)
    }

    /// Swap in a new record for the signed-in user (after a profile edit).
    ///
    /// The record replaces the current one entirely; the credential is untouched.
    pub fn replace_user(&self, user: UserRecord) -> Result<(), SessionError> {
        let snapshot = {
            let mut state = self.lock_state();
            if !state.session.is_authenticated() {
                return Err(SessionError::NotAuthenticated);
            }

            persistence::save_user(self.shared.store.as_ref(), &self.shared.keys, &user)?;
            if state.session.user.as_ref() == Some(&user) {
                return Ok(());
            }
            state.session.user = Some(user);
            state.session.clone()
        };

        self.notify(&snapshot);
        Ok(())
    }

    /// Re-validate the session against the identity service.
    ///
    /// Concurrent callers share one round-trip and receive the same settled
    /// session. Never fails: a transient failure keeps the last known state,
    /// a rejected credential signs the user out before this resolves.
    pub async fn refresh(&self) -> Session {
        let Some(mut settled) = self.begin_refresh() else {
            return self.session();
        };

        let result = match settled.wait_for(Option::is_some).await {
            Ok(session) => (*session).clone(),
            Err(_) => None,
        };
        result.unwrap_or_else(|| self.session())
    }

    /// Join the in-flight round-trip or start one. `None` when there is
    /// nothing to re-validate.
    fn begin_refresh(&self) -> Option<Settled> {
        let (token, tx, rx, runtime, snapshot) = {
            let mut state = self.lock_state();

            // Signed out: nothing to re-validate, even if a stale round-trip is pending
            let token = state.session.token.clone()?;

            // A closed channel means the previous round-trip task died without settling
            if let Some(in_flight) = state.in_flight.clone() {
                if in_flight.has_changed().is_ok() {
                    tracing::debug!("Joining in-flight session refresh");
                    return Some(in_flight);
                }
                tracing::warn!("Previous session refresh ended without settling");
                state.in_flight = None;
            }

            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                tracing::warn!("No async runtime available, skipping session refresh");
                return None;
            };

            let (tx, rx) = watch::channel(None);
            state.in_flight = Some(rx.clone());
            state.session.status = SessionStatus::Syncing;
            (token, tx, rx, runtime, state.session.clone())
        };

        // Published before the round-trip starts so Syncing never trails its outcome
        self.notify(&snapshot);

        let manager = self.clone();
        let own = rx.clone();
        runtime.spawn(async move {
            let result = manager.shared.client.fetch_current_identity(&token).await;

            // Settling writes the store, which may block on disk or network I/O
            let settled =
                tokio::task::spawn_blocking(move || manager.settle_refresh(&own, &token, result))
                    .await;
            match settled {
                Ok(session) => {
                    let _ = tx.send(Some(session));
                }
                Err(e) => tracing::error!("Settling session refresh failed: {}", e),
            }
        });

        Some(rx)
    }

    fn settle_refresh(
        &self,
        own: &Settled,
        token: &str,
        result: Result<UserRecord, IdentityError>,
    ) -> Session {
        let (snapshot, changed) = {
            let mut state = self.lock_state();
            if state
                .in_flight
                .as_ref()
                .is_some_and(|in_flight| in_flight.same_channel(own))
            {
                state.in_flight = None;
            }

            if state.session.token.as_deref() != Some(token) {
                tracing::debug!("Discarding refresh result for a credential that is no longer current");
                return state.session.clone();
            }

            match result {
                Ok(user) => {
                    if let Err(e) =
                        persistence::save(self.shared.store.as_ref(), &self.shared.keys, token, &user)
                    {
                        tracing::error!("Failed to persist refreshed session: {}", e);
                    }
                    tracing::debug!("Session confirmed for user {}", user.id);
                    state.session =
                        Session::authenticated(token.to_string(), user, Some(Utc::now()));
                    (state.session.clone(), true)
                }
                Err(IdentityError::Unauthorized) => {
                    tracing::info!("Credential rejected by identity service, signing out");
                    let (snapshot, changed, _) = self.clear_locked(&mut state);
                    (snapshot, changed)
                }
                Err(e) => {
                    tracing::warn!("Session refresh failed, keeping last known state: {}", e);
                    let changed = state.session.status != SessionStatus::Authenticated;
                    state.session.status = SessionStatus::Authenticated;
                    (state.session.clone(), changed)
                }
            }
        };

        if changed {
            self.notify(&snapshot);
        }
        snapshot
    }

    /// Register a listener called after every state transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        self.shared.listeners.subscribe(listener)
    }

    /// Guard decision for `requirement` against the current session.
    pub fn check_access(&self, requirement: AccessRequirement) -> Access {
        check_access(&self.session(), requirement)
    }
}
