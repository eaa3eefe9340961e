//! Explicit session context shared by every view: the bearer token and the
//! signed-in user, fetched once per session instead of once per page.

use std::{
    fs, io,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::protocol::CurrentUser;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{ClientError, ClientResult};

pub trait TokenStore: Send + Sync {
    fn load(&self) -> io::Result<Option<String>>;
    fn save(&self, token: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim().to_string();
                Ok((!token.is_empty()).then_some(token))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn save(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: std::sync::Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: std::sync::Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> io::Result<Option<String>> {
        Ok(self.token.lock().map_err(poisoned)?.clone())
    }

    fn save(&self, token: &str) -> io::Result<()> {
        *self.token.lock().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        if let Some(mut token) = self.token.lock().map_err(poisoned)?.take() {
            token.zeroize();
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, "token store lock poisoned")
}

pub struct Session {
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<String>>,
    current_user: Mutex<Option<CurrentUser>>,
}

impl Session {
    /// Builds a session, picking up a previously saved token.
    pub fn restore(store: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let token = store.load()?;
        debug!(has_token = token.is_some(), "restored session");
        Ok(Self {
            store,
            token: RwLock::new(token),
            current_user: Mutex::new(None),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryTokenStore::default()),
            token: RwLock::new(None),
            current_user: Mutex::new(None),
        }
    }

    pub async fn token(&self) -> ClientResult<String> {
        self.token.read().await.clone().ok_or(ClientError::NotLoggedIn)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub async fn set_token(&self, token: String) -> ClientResult<()> {
        self.store.save(&token)?;
        let mut guard = self.token.write().await;
        if let Some(mut old) = guard.replace(token) {
            old.zeroize();
        }
        drop(guard);
        *self.current_user.lock().await = None;
        Ok(())
    }

    pub async fn clear(&self) -> ClientResult<()> {
        if let Some(mut token) = self.token.write().await.take() {
            token.zeroize();
        }
        *self.current_user.lock().await = None;
        self.store.clear()?;
        Ok(())
    }

    /// Drops the token after the backend rejected it. Does not wait on the
    /// user cache, which may be held by the request that got the 401.
    pub async fn expire(&self) -> ClientResult<()> {
        if let Some(mut token) = self.token.write().await.take() {
            token.zeroize();
        }
        if let Ok(mut user) = self.current_user.try_lock() {
            *user = None;
        }
        self.store.clear()?;
        Ok(())
    }

    pub async fn cached_user(&self) -> Option<CurrentUser> {
        self.current_user.lock().await.clone()
    }

    /// Returns the cached user or runs `fetch` once to fill the cache.
    /// Concurrent callers wait on the same lock, so the who-am-I request is
    /// issued at most once.
    pub async fn current_user_or_fetch<F, Fut>(&self, fetch: F) -> ClientResult<CurrentUser>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ClientResult<CurrentUser>>,
    {
        let mut guard = self.current_user.lock().await;
        if let Some(user) = guard.as_ref() {
            return Ok(user.clone());
        }
        let user = fetch().await?;
        *guard = Some(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
