//! Navigation capability injected into the session.

/// Capability for requesting navigation from the session.
///
/// The session never reaches into ambient globals to redirect the user;
/// instead the embedding shell (a UI router, a test harness) supplies an
/// implementation at construction time. The session uses it in exactly two
/// places: forced navigation to the login screen after an irrecoverable
/// refresh failure, and on [`Session::logout`](crate::Session::logout).
pub trait Navigator: Send + Sync {
    /// The current navigation location (path component).
    fn current_path(&self) -> String;

    /// Request navigation to the given path.
    fn navigate(&self, path: &str);
}

/// A navigator for headless embeddings with no navigable surface.
///
/// Navigation requests are logged and dropped.
#[derive(Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        String::new()
    }

    fn navigate(&self, path: &str) {
        tracing::warn!(path, "navigation requested but no navigator is installed");
    }
}
