//! Session token lifecycle.
//!
//! The [`SessionStore`] is the single owner of the authentication
//! token. It is constructed once at process start, hydrated from
//! persistent storage, and mutated only through its own methods;
//! every other component receives the token as read-only input per
//! operation and subscribes to changes via a watch channel.
//!
//! Each login/logout bumps a monotonically increasing **epoch**.
//! In-flight work captures the epoch before its first await and
//! compares it afterwards, so a response that arrives after logout is
//! discarded instead of repopulating post-logout state.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::SensorApi;

/// Persistent storage for the session token.
///
/// Implementations must treat absence as a normal state: a missing or
/// unreadable token is `None`, never an error.
pub trait TokenStore: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> Option<String>;

    /// Persist the token for future hydration.
    fn save(&self, token: &str) -> io::Result<()>;

    /// Remove the persisted token. Removing an absent token is Ok.
    fn clear(&self) -> io::Result<()>;
}

/// Token storage backed by a file under the user config directory.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the token at the default location
    /// (`<config_dir>/greenhouse/token`).
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("greenhouse").join("token"),
        }
    }

    /// Store the token at a custom path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the token is persisted to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Default for FileTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        let token = fs::read_to_string(&self.path).ok()?;
        let token = token.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-memory token storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().expect("token lock poisoned").clone()
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().expect("token lock poisoned") = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        *self.token.lock().expect("token lock poisoned") = None;
        Ok(())
    }
}

struct SessionState {
    token: Option<String>,
    is_loading: bool,
}

/// Owner of the session token and its lifecycle.
pub struct SessionStore {
    storage: Box<dyn TokenStore>,
    state: Mutex<SessionState>,
    epoch: AtomicU64,
    changes: watch::Sender<Option<String>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().expect("session lock poisoned");
        f.debug_struct("SessionStore")
            .field("authenticated", &state.token.is_some())
            .field("is_loading", &state.is_loading)
            .field("epoch", &self.epoch.load(Ordering::Relaxed))
            .finish()
    }
}

impl SessionStore {
    /// Create a session store over the given token storage.
    ///
    /// The store starts in the loading state; call
    /// [`SessionStore::hydrate`] once at startup.
    pub fn new(storage: impl TokenStore + 'static) -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            storage: Box::new(storage),
            state: Mutex::new(SessionState {
                token: None,
                is_loading: true,
            }),
            epoch: AtomicU64::new(0),
            changes,
        }
    }

    /// Restore any persisted token.
    ///
    /// Never fails: absent or unreadable storage means an absent
    /// token. The loading flag is cleared unconditionally.
    pub fn hydrate(&self) {
        let token = self.storage.load();
        {
            let mut state = self.state.lock().expect("session lock poisoned");
            state.token = token.clone();
            state.is_loading = false;
        }
        if token.is_some() {
            debug!("Session hydrated from persisted token");
        }
        let _ = self.changes.send(token);
    }

    /// Begin a session with a freshly issued token.
    ///
    /// The credential exchange itself happens elsewhere
    /// ([`crate::api::SensorApi::login`]); this only records and
    /// persists the result.
    pub fn login(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(e) = self.storage.save(&token) {
            warn!("Failed to persist session token: {}", e);
        }
        {
            let mut state = self.state.lock().expect("session lock poisoned");
            state.token = Some(token.clone());
            state.is_loading = false;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.changes.send(Some(token));
    }

    /// End the session, clearing the token and persisted storage
    /// unconditionally.
    pub fn logout(&self) {
        if let Err(e) = self.storage.clear() {
            warn!("Failed to clear persisted session token: {}", e);
        }
        {
            let mut state = self.state.lock().expect("session lock poisoned");
            state.token = None;
            state.is_loading = false;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let _ = self.changes.send(None);
    }

    /// The current token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.state
            .lock()
            .expect("session lock poisoned")
            .token
            .clone()
    }

    /// Whether initial hydration is still pending.
    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("session lock poisoned").is_loading
    }

    /// The current session epoch. Bumped on every login and logout.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Subscribe to token changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.changes.subscribe()
    }
}

/// End the session, notifying the backend best-effort first.
///
/// The local token is cleared even when the backend call fails: a
/// dead server must never trap the user in an authenticated state.
pub async fn sign_out(api: &dyn SensorApi, session: &SessionStore) {
    if let Some(token) = session.token() {
        if let Err(e) = api.logout(&token).await {
            warn!("Backend logout failed (clearing local session anyway): {}", e);
        }
    }
    session.logout();
}
