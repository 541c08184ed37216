//! Per-conversation session state: the chosen display language and the last generation request.
//!
//! Sessions expire after a TTL. The file store gives up with [`SessionError::Timeout`] if a
//! session stays locked by someone else for longer than the configured timeout.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fd_lock::RwLock as FileRwLock;
use serde::{Deserialize, Serialize};

use crate::CategoryFlags;

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    pub id: i64,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<CategoryFlags>,
    /// Unix time, in seconds, of the last write.
    #[serde(default)]
    pub last_active: u64,
}

impl Session {
    pub fn new(id: i64) -> Session {
        Session {
            id,
            ..Session::default()
        }
    }
}

pub trait SessionStore {
    /// Load a session. Missing and expired sessions are both [`SessionError::NotFound`].
    fn get(&self, id: i64) -> Result<Session, SessionError>;
    /// Store `session`, refreshing its `last_active` time and its TTL.
    fn set(&self, id: i64, session: &mut Session) -> Result<(), SessionError>;
    /// Remove a session. Removing a session that doesn't exist is not an error.
    fn delete(&self, id: i64) -> Result<(), SessionError>;
    /// Apply `change` to the stored session (or a fresh one, if there is none) and store the
    /// result, without letting any other writer in between the read and the write.
    fn update(
        &self,
        id: i64,
        change: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no session stored for {0}")]
    NotFound(i64),
    #[error("gave up on the session store after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),
    #[error("failed to encode or decode a session: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    pub ttl: Duration,
    pub timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> StoreOptions {
        StoreOptions {
            ttl: DEFAULT_TTL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Record the display language for a conversation, creating its session if needed.
pub fn set_language<S>(store: &S, id: i64, language: &str) -> Result<(), SessionError>
where
    S: SessionStore + ?Sized,
{
    store.update(id, &mut |session| session.language = language.to_owned())?;
    Ok(())
}

/// The display language chosen for a conversation, if any.
pub fn language<S>(store: &S, id: i64) -> Result<Option<String>, SessionError>
where
    S: SessionStore + ?Sized,
{
    match store.get(id) {
        Ok(session) if !session.language.is_empty() => Ok(Some(session.language)),
        Ok(_) => Ok(None),
        Err(SessionError::NotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Remember the parameters of a successful generation, so they can be reused.
pub fn remember_request<S>(
    store: &S,
    id: i64,
    length: usize,
    flags: CategoryFlags,
) -> Result<(), SessionError>
where
    S: SessionStore + ?Sized,
{
    store.update(id, &mut |session| {
        session.password_length = Some(length);
        session.flags = Some(flags);
        session.state = "generated".to_owned();
    })?;
    Ok(())
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A store that lives as long as the process. It never blocks, so it never times out.
pub struct MemoryStore {
    cache: moka::sync::Cache<i64, Session>,
}

impl MemoryStore {
    pub fn new(options: StoreOptions) -> MemoryStore {
        MemoryStore {
            cache: moka::sync::Cache::builder()
                .time_to_live(options.ttl)
                .build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> MemoryStore {
        MemoryStore::new(StoreOptions::default())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, id: i64) -> Result<Session, SessionError> {
        self.cache.get(&id).ok_or(SessionError::NotFound(id))
    }

    fn set(&self, id: i64, session: &mut Session) -> Result<(), SessionError> {
        session.last_active = now_unix();
        self.cache.insert(id, session.clone());
        Ok(())
    }

    fn delete(&self, id: i64) -> Result<(), SessionError> {
        self.cache.invalidate(&id);
        Ok(())
    }

    fn update(
        &self,
        id: i64,
        change: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, SessionError> {
        // Upserts on one key are serialized by the cache.
        let entry = self.cache.entry(id).and_upsert_with(|existing| {
            let mut session = match existing {
                Some(entry) => entry.into_value(),
                None => Session::new(id),
            };
            change(&mut session);
            session.last_active = now_unix();
            session
        });
        Ok(entry.into_value())
    }
}

#[derive(Deserialize, Serialize)]
struct StoredSession {
    /// Unix time, in seconds.
    expires_at: u64,
    session: Session,
}

/// A store keeping one JSON file per session in a directory.
///
/// Writers replace a session's file atomically (write to a temporary file, then rename). Access to
/// one session is serialized with an OS file lock on a `.lock` file next to it, which the OS
/// releases if the holder dies.
pub struct FileStore {
    dir: PathBuf,
    options: StoreOptions,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if it doesn't exist.
    pub fn open(dir: PathBuf, options: StoreOptions) -> Result<FileStore, SessionError> {
        fs::create_dir_all(&dir).map_err(SessionError::Io)?;
        Ok(FileStore { dir, options })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("session-{}.json", id))
    }

    fn lock_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("session-{}.lock", id))
    }

    /// Run `f` while holding the session's lock.
    fn with_lock<T, F>(&self, id: i64, f: F) -> Result<T, SessionError>
    where
        F: FnOnce() -> Result<T, SessionError>,
    {
        let file = File::options()
            .create(true)
            .write(true)
            .open(self.lock_path(id))
            .map_err(SessionError::Io)?;
        let mut lock = FileRwLock::new(file);
        let deadline = Instant::now() + self.options.timeout;
        let _guard = loop {
            match lock.try_write() {
                Ok(guard) => break guard,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(SessionError::Timeout(self.options.timeout));
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(err) => return Err(SessionError::Io(err)),
            }
        };
        f()
    }

    fn read(&self, id: i64) -> Result<Session, SessionError> {
        let path = self.session_path(id);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(id))
            }
            Err(err) => return Err(SessionError::Io(err)),
        };
        let stored: StoredSession =
            serde_json::from_slice(&data).map_err(SessionError::Serialization)?;
        if stored.expires_at <= now_unix() {
            remove_if_exists(&path)?;
            return Err(SessionError::NotFound(id));
        }
        Ok(stored.session)
    }

    fn write(&self, id: i64, session: &mut Session) -> Result<(), SessionError> {
        session.last_active = now_unix();
        let stored = StoredSession {
            expires_at: session.last_active + self.options.ttl.as_secs(),
            session: session.clone(),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir).map_err(SessionError::Io)?;
        serde_json::to_writer(&mut temp_file, &stored).map_err(SessionError::Serialization)?;
        temp_file.flush().map_err(SessionError::Io)?;
        temp_file
            .persist(self.session_path(id))
            .map_err(|err| SessionError::Io(err.error))?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, id: i64) -> Result<Session, SessionError> {
        self.with_lock(id, || self.read(id))
    }

    fn set(&self, id: i64, session: &mut Session) -> Result<(), SessionError> {
        self.with_lock(id, || self.write(id, session))
    }

    fn delete(&self, id: i64) -> Result<(), SessionError> {
        self.with_lock(id, || remove_if_exists(&self.session_path(id)))
    }

    fn update(
        &self,
        id: i64,
        change: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, SessionError> {
        self.with_lock(id, || {
            let mut session = match self.read(id) {
                Ok(session) => session,
                Err(SessionError::NotFound(_)) => Session::new(id),
                Err(err) => return Err(err),
            };
            change(&mut session);
            self.write(id, &mut session)?;
            Ok(session)
        })
    }
}

fn remove_if_exists(path: &Path) -> Result<(), SessionError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SessionError::Io(err)),
    }
}
