//! Durable storage for the [`Session`].
//!
//! The store keeps an in-memory copy seeded from the backing store at
//! startup. Every write goes to the backing store first and only then
//! becomes visible in memory, so the two never disagree once a write
//! returns.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use keyring::Entry;
use thiserror::Error;
use tracing::{debug, warn};

use super::Session;

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

/// Keychain service name shared by both session entries
const KEYRING_SERVICE: &str = "bedrock-panel";
const KEYRING_TOKEN_ENTRY: &str = "token";
const KEYRING_ROTATION_ENTRY: &str = "password_rotation_required";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Where a session is persisted between runs.
pub trait SessionBackend: Send {
    fn load(&self) -> Result<Session, StoreError>;
    fn persist(&mut self, session: &Session) -> Result<(), StoreError>;
}

/// JSON file in the per-user cache directory.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionBackend for FileBackend {
    fn load(&self) -> Result<Session, StoreError> {
        if !self.path.exists() {
            return Ok(Session::default());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&contents)?;
        Ok(session.normalized())
    }

    fn persist(&mut self, session: &Session) -> Result<(), StoreError> {
        if !session.is_authenticated() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write to a sibling file and rename so a reader never sees half a session.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(session)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Two entries in the OS keychain: the token and the rotation flag.
pub struct KeyringBackend {
    token: Entry,
    rotation: Entry,
}

impl KeyringBackend {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self {
            token: Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_ENTRY)?,
            rotation: Entry::new(KEYRING_SERVICE, KEYRING_ROTATION_ENTRY)?,
        })
    }

    fn read_entry(entry: &Entry) -> Result<Option<String>, StoreError> {
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_entry(entry: &Entry) -> Result<(), StoreError> {
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Put `entry` back to `previous`. Best effort: the caller is already
    /// returning the original failure.
    fn restore_entry(entry: &Entry, previous: Option<&str>) {
        let restored = match previous {
            Some(value) => entry.set_password(value).map_err(StoreError::from),
            None => Self::delete_entry(entry),
        };
        if let Err(e) = restored {
            warn!(error = %e, "Failed to roll back keychain entry");
        }
    }
}

impl SessionBackend for KeyringBackend {
    fn load(&self) -> Result<Session, StoreError> {
        let token = Self::read_entry(&self.token)?;
        let rotation = Self::read_entry(&self.rotation)?;
        Ok(Session {
            token,
            password_rotation_required: rotation.as_deref() == Some("true"),
        }
        .normalized())
    }

    // Each arm snapshots the entry it touches second; if that second step
    // fails, the first step is rolled back so a failed persist leaves the
    // keychain as it was.
    fn persist(&mut self, session: &Session) -> Result<(), StoreError> {
        match session.token() {
            Some(token) => {
                let previous_flag = Self::read_entry(&self.rotation)?;
                let flag = if session.password_rotation_required {
                    "true"
                } else {
                    "false"
                };
                self.rotation.set_password(flag)?;
                if let Err(e) = self.token.set_password(token) {
                    Self::restore_entry(&self.rotation, previous_flag.as_deref());
                    return Err(e.into());
                }
            }
            None => {
                let previous_token = Self::read_entry(&self.token)?;
                Self::delete_entry(&self.token)?;
                if let Err(e) = Self::delete_entry(&self.rotation) {
                    Self::restore_entry(&self.token, previous_token.as_deref());
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}

/// Process-local backend. Clones share the same slot, which lets a test
/// open a second store over it to simulate a restart.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Session>>,
}

impl SessionBackend for MemoryBackend {
    fn load(&self) -> Result<Session, StoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn persist(&mut self, session: &Session) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = session.clone();
        Ok(())
    }
}

/// Holder of the current [`Session`].
///
/// Anyone may read. Writes are crate-private and go through
/// [`SessionCoordinator`](super::SessionCoordinator).
pub struct CredentialStore {
    backend: Mutex<Box<dyn SessionBackend>>,
    current: RwLock<Session>,
}

impl CredentialStore {
    /// Open a store over `backend`, seeding memory from what it holds.
    /// An unreadable backing store starts the process unauthenticated.
    pub fn open(backend: impl SessionBackend + 'static) -> Self {
        let session = match backend.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to load persisted session, starting logged out");
                Session::default()
            }
        };
        debug!(state = ?session.state(), "Session loaded");

        Self {
            backend: Mutex::new(Box::new(backend)),
            current: RwLock::new(session),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryBackend::default())
    }

    pub fn read(&self) -> Session {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    /// Persist `session`, then publish it. Returns whether anything changed.
    /// On error the in-memory session is left as it was.
    pub(crate) fn write(&self, session: Session) -> Result<bool, StoreError> {
        let session = session.normalized();
        let mut backend = self.backend.lock().unwrap_or_else(PoisonError::into_inner);

        if *self.current.read().unwrap_or_else(PoisonError::into_inner) == session {
            return Ok(false);
        }

        backend.persist(&session)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
        Ok(true)
    }
}
