use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::session::config::{ExhaustedBehavior, RetryPolicy};
use crate::session::types::Session;

use super::manager::SessionManager;

/// How a retry-refresh loop ended. Every variant carries the session as it
/// was when the loop stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// The predicate held after a refresh.
    Satisfied(Session),
    /// Attempts ran out; configured to read as "still waiting".
    Pending(Session),
    /// Attempts ran out; configured to read as a failure.
    Failed(Session),
    /// A refresh signed the user out; there is nothing left to wait for.
    SignedOut(Session),
    Cancelled(Session),
}

impl RetryOutcome {
    pub fn session(&self) -> &Session {
        match self {
            Self::Satisfied(session)
            | Self::Pending(session)
            | Self::Failed(session)
            | Self::SignedOut(session)
            | Self::Cancelled(session) => session,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied(_))
    }
}

/// Handle to a retry-refresh loop running on its own task.
///
/// Dropping the handle cancels the loop.
pub struct RetryHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<RetryOutcome>,
    manager: SessionManager,
}

impl RetryHandle {
    /// Stop the loop: no further refreshes, timers or state writes from it.
    pub fn cancel(&self) {
        let _ = self.shutdown_tx.try_send(());
    }

    /// Wait for the loop to end.
    pub async fn outcome(self) -> RetryOutcome {
        let RetryHandle {
            shutdown_tx,
            task,
            manager,
        } = self;

        let outcome = task.await;
        drop(shutdown_tx);

        outcome.unwrap_or_else(|e| {
            tracing::warn!("Retry-refresh task ended abnormally: {}", e);
            RetryOutcome::Cancelled(manager.session())
        })
    }
}

impl SessionManager {
    /// Refresh repeatedly until `predicate` holds or `policy.attempts` refreshes ran.
    ///
    /// The first refresh starts immediately; later ones wait `policy.delay`.
    /// Dropping the returned future stops the loop.
    pub async fn refresh_until<P>(&self, policy: &RetryPolicy, predicate: P) -> RetryOutcome
    where
        P: Fn(&Session) -> bool,
    {
        let attempts = policy.attempts.max(1);
        let mut session = self.session();

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(policy.delay).await;
            }

            session = self.refresh().await;

            if session.token.is_none() {
                tracing::debug!("Retry-refresh stopped: session signed out");
                return RetryOutcome::SignedOut(session);
            }
            if predicate(&session) {
                tracing::debug!("Retry-refresh satisfied after {} attempt(s)", attempt);
                return RetryOutcome::Satisfied(session);
            }
            tracing::debug!("Retry-refresh attempt {}/{} not satisfied", attempt, attempts);
        }

        tracing::info!("Retry-refresh gave up after {} attempts", attempts);
        match policy.on_exhausted {
            ExhaustedBehavior::KeepPending => RetryOutcome::Pending(session),
            ExhaustedBehavior::ReportFailure => RetryOutcome::Failed(session),
        }
    }

    /// Run [`refresh_until`](Self::refresh_until) on a tokio task with an
    /// explicit cancellation handle. Must be called inside a tokio runtime.
    pub fn spawn_refresh_until<P>(&self, policy: RetryPolicy, predicate: P) -> RetryHandle
    where
        P: Fn(&Session) -> bool + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let manager = self.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::debug!("Retry-refresh cancelled");
                    RetryOutcome::Cancelled(manager.session())
                }
                outcome = manager.refresh_until(&policy, predicate) => outcome,
            }
        });

        RetryHandle {
            shutdown_tx,
            task,
            manager: self.clone(),
        }
    }

    /// Wait for the premium flag after returning from the payment provider.
    ///
    /// The provider marks the account premium through a server-to-server
    /// callback that may land after the browser comes back, so the user
    /// record is polled with the configured premium sync policy.
    pub fn spawn_premium_sync(&self) -> RetryHandle {
        self.spawn_refresh_until(self.shared.config.premium_sync.clone(), Session::is_premium)
    }
}
