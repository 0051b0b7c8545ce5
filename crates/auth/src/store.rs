//! Durable key-value storage for session credentials.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    sync::RwLock,
};

/// Storage key under which the access token is kept.
pub const TOKEN_KEY: &str = "token";

/// Storage key under which the refresh token is kept.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Default storage path relative to the home directory.
const STORE_PATH: &str = ".console/credentials";

/// Durable key-value store for the access and refresh tokens.
///
/// The store is constructed explicitly and shared by reference with the
/// session gateway and anything that needs to read credentials. Values
/// survive process restarts when the store is file-backed; [`clear`] wipes
/// everything (used on logout and on irrecoverable refresh failure).
///
/// The contract has no error conditions: a missing value is `None`, and
/// persistence failures are logged rather than surfaced, so callers never
/// have to handle storage errors on the hot request path.
///
/// Ownership convention: any component may read, but only the session
/// gateway writes.
///
/// [`clear`]: CredentialStore::clear
pub struct CredentialStore {
    entries: RwLock<BTreeMap<String, String>>,
    path: Option<PathBuf>,
}

impl CredentialStore {
    /// Open a file-backed store at the given path.
    ///
    /// A missing or unreadable file starts the store empty; it will be
    /// created on the first write. Parsing failures are treated the same
    /// way so a corrupt file never blocks login.
    pub fn open(path: PathBuf) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "discarding unreadable credential file");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };

        Self {
            entries: RwLock::new(entries),
            path: Some(path),
        }
    }

    /// Open the file-backed store at the conventional per-user path
    /// (`~/.console/credentials`).
    ///
    /// Falls back to an in-memory store when no home directory can be
    /// determined.
    pub fn open_default() -> Self {
        match dirs::home_dir() {
            Some(home) => Self::open(home.join(STORE_PATH)),
            None => {
                tracing::warn!("no home directory; credentials will not persist");
                Self::in_memory()
            }
        }
    }

    /// Create a store with no backing file. Values last for the lifetime of
    /// the process.
    pub fn in_memory() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Read a value. `None` when the key has never been set or the store
    /// was cleared.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .expect("credential store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Write a value and persist the store.
    pub fn set(&self, key: &str, value: &str) {
        let snapshot = {
            let mut entries = self.entries.write().expect("credential store lock poisoned");
            entries.insert(key.to_owned(), value.to_owned());
            entries.clone()
        };
        self.persist(&snapshot);
    }

    /// Wipe all stored credentials.
    pub fn clear(&self) {
        let snapshot = {
            let mut entries = self.entries.write().expect("credential store lock poisoned");
            entries.clear();
            entries.clone()
        };
        self.persist(&snapshot);
    }

    /// The stored access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    /// The stored refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) {
        let Some(path) = &self.path else {
            return;
        };

        if let Err(error) = write_store_file(path, entries) {
            tracing::warn!(path = %path.display(), %error, "failed to persist credentials");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Token values are redacted; only the key names are shown.
        let entries = self.entries.read().expect("credential store lock poisoned");
        f.debug_struct("CredentialStore")
            .field("keys", &entries.keys().collect::<Vec<_>>())
            .field("path", &self.path)
            .finish()
    }
}

/// Write the store contents as pretty JSON with owner-only permissions on
/// Unix.
fn write_store_file(path: &std::path::Path, entries: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents =
        serde_json::to_string_pretty(entries).map_err(|e| std::io::Error::other(e.to_string()))?;

    std::fs::write(path, &contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)?;
    }

    Ok(())
}
