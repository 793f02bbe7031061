//! Test utilities for session module tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use crate::identity::{IdentityClient, IdentityError, UserRecord};
use crate::session::config::SessionConfig;
use crate::session::main::SessionManager;
use crate::storage::InMemoryPersistentStore;

/// Scripted identity client.
///
/// Responses are served in order; once the script runs out the last
/// response repeats. A gated client holds every call until
/// [`release`](MockIdentityClient::release) hands out a permit.
pub(crate) struct MockIdentityClient {
    responses: Mutex<VecDeque<Result<UserRecord, IdentityError>>>,
    last: Mutex<Result<UserRecord, IdentityError>>,
    calls: AtomicUsize,
    tokens: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl MockIdentityClient {
    pub(crate) fn new(responses: Vec<Result<UserRecord, IdentityError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(Err(IdentityError::Transient("no scripted response".to_string()))),
            calls: AtomicUsize::new(0),
            tokens: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn gated(responses: Vec<Result<UserRecord, IdentityError>>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(responses)
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityClient for MockIdentityClient {
    async fn fetch_current_identity(&self, token: &str) -> Result<UserRecord, IdentityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().unwrap().push(token.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                *self.last.lock().unwrap() = response.clone();
                response
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

pub(crate) fn test_user(id: &str) -> UserRecord {
    UserRecord::new(id, format!("User {id}"), format!("{id}@example.com"))
}

pub(crate) fn premium_user(id: &str) -> UserRecord {
    let mut user = test_user(id);
    user.is_premium = true;
    user
}

/// Config with restore re-validation switched off, so tests drive refreshes explicitly.
pub(crate) fn quiet_config() -> SessionConfig {
    SessionConfig {
        revalidate_on_start: false,
        ..SessionConfig::default()
    }
}

pub(crate) fn manager_with(
    store: &InMemoryPersistentStore,
    client: &Arc<MockIdentityClient>,
    config: SessionConfig,
) -> SessionManager {
    SessionManager::start(Arc::new(store.clone()), client.clone(), config)
}
