//! Per-call-site request lifecycle state.
//!
//! Screens drive their HTTP calls through a [`Fetch`] instance: `send`
//! flips the observable state to loading, delegates to the shared
//! [`Session`], and lands in a success or failed state that the screen
//! renders from. Failures additionally surface a user-visible notification
//! through the injected [`Notifier`].
//!
//! Each call site owns one `Fetch` and therefore one state instance; state
//! is never shared between unrelated calls.

mod notify;
mod state;

pub use notify::{Notifier, TracingNotifier};
pub use state::{ErrorBody, FieldError, ResponseState};

use std::{
    sync::{Arc, RwLock},
    time::Duration,
};

use console_session::{RequestDescriptor, Session, SessionError};
use serde::de::DeserializeOwned;

/// Fallback message when a failure body carries none.
const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong";

/// A per-call-site request state container.
///
/// Holds the lifecycle state of the most recent [`send`](Fetch::send) and
/// performs calls through the shared session. The state transitions
/// `idle → loading → (success | failed)` and is observable at any point via
/// [`snapshot`](Fetch::snapshot).
///
/// Overlapping `send`s from the same instance are last-write-wins: whichever
/// call resolves last owns the final state, regardless of issue order. There
/// is no cancellation, so a response for a superseded call still overwrites
/// state — callers that care about ordering should not overlap sends.
pub struct Fetch<T> {
    session: Arc<Session>,
    notifier: Arc<dyn Notifier>,
    warmup: Duration,
    state: Arc<RwLock<ResponseState<T>>>,
}

impl<T> Fetch<T>
where
    T: DeserializeOwned + Clone,
{
    /// Create a fetch container over the shared session.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            notifier: Arc::new(TracingNotifier),
            warmup: Duration::ZERO,
            state: Arc::new(RwLock::new(ResponseState::idle())),
        }
    }

    /// Install a notifier for failure messages.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Delay each `send` by the given duration before hitting the network.
    /// Defaults to zero.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// The current state snapshot.
    pub fn snapshot(&self) -> ResponseState<T> {
        self.state.read().expect("fetch state lock poisoned").clone()
    }

    /// Perform a request and drive the state through its lifecycle.
    ///
    /// The loading state is observable as soon as `send` is polled, before
    /// the transport resolves. The returned state equals the stored snapshot
    /// at resolution time, so callers can branch on it immediately instead
    /// of waiting for a re-render.
    pub async fn send(&self, descriptor: RequestDescriptor) -> ResponseState<T> {
        self.update(|state| {
            state.is_loading = true;
            state.is_success = false;
            state.is_failed = false;
        });

        if !self.warmup.is_zero() {
            tokio::time::sleep(self.warmup).await;
        }

        let state = match self.session.request(descriptor).await {
            Ok(response) => {
                let status_code = Some(response.status().as_u16());
                match response.json::<T>() {
                    Ok(data) => ResponseState {
                        data: Some(data),
                        error: None,
                        message: None,
                        status_code,
                        is_loading: false,
                        is_success: true,
                        is_failed: false,
                    },
                    Err(error) => {
                        // The call succeeded but the payload does not match
                        // what this call site expects.
                        tracing::warn!(%error, "response body did not match the expected shape");
                        self.notifier.error(GENERIC_FAILURE_MESSAGE);
                        ResponseState {
                            data: None,
                            error: None,
                            message: Some(GENERIC_FAILURE_MESSAGE.to_owned()),
                            status_code,
                            is_loading: false,
                            is_success: false,
                            is_failed: true,
                        }
                    }
                }
            }
            Err(error) => self.failure_state(&error),
        };

        *self.state.write().expect("fetch state lock poisoned") = state.clone();
        state
    }

    fn failure_state(&self, error: &SessionError) -> ResponseState<T> {
        let body = error.body().and_then(|body| {
            serde_json::from_value::<ErrorBody>(body.clone()).ok()
        });
        let message = body
            .as_ref()
            .and_then(|b| b.message.clone())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_owned());

        self.notifier.error(&message);

        ResponseState {
            data: None,
            error: body,
            message: Some(message),
            status_code: error.status(),
            is_loading: false,
            is_success: false,
            is_failed: true,
        }
    }

    fn update(&self, apply: impl FnOnce(&mut ResponseState<T>)) {
        let mut state = self.state.write().expect("fetch state lock poisoned");
        apply(&mut state);
    }
}

impl<T> std::fmt::Debug for Fetch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetch")
            .field("warmup", &self.warmup)
            .finish_non_exhaustive()
    }
}
