//! User-visible notification capability.

/// Capability for surfacing failure messages to the user.
///
/// The embedding shell supplies an implementation wired to its message/toast
/// surface; headless embeddings can keep the default, which logs.
pub trait Notifier: Send + Sync {
    /// Surface a failure message.
    fn error(&self, message: &str);
}

/// Default notifier: logs failure messages through `tracing`.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(message, "request failed");
    }
}
