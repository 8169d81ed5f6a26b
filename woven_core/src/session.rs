use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tokio::{fs, io};

/// The key the session token is stored under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Where the token lives in a successful login payload.
pub const TOKEN_POINTER: &str = "/data/data/attributes/token";

/// Proof of an authenticated session. Opaque to us; we only store it.
#[derive(Debug, Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }
}

impl ExposeSecret<str> for SessionToken {
    fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose_secret() == other.expose_secret()
    }
}

impl Eq for SessionToken {}

/// Get the session token out of a successful login payload, if there is one.
/// Anything other than a string at the token path counts as absent.
pub fn extract_token(payload: &Value) -> Option<SessionToken> {
    payload
        .pointer(TOKEN_POINTER)
        .and_then(Value::as_str)
        .map(SessionToken::new)
}

/// Problems that can happen while reading or writing the session store.
#[derive(Debug, Error)]
pub enum Error {
    /// We had a problem with the disk, for example with permissions.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// The store on disk was not the JSON we expected.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere to keep the session token between runs. Last write wins.
pub trait SessionStore {
    /// Store a token, replacing any previous one.
    fn set(&self, token: &SessionToken) -> impl Future<Output = Result<(), Error>> + Send;

    /// Get the stored token, if any.
    fn get(&self) -> impl Future<Output = Result<Option<SessionToken>, Error>> + Send;
}

/// A session store that only lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    token: Mutex<Option<SessionToken>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    /// Construct an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `set` has been called.
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

impl SessionStore for MemoryStore {
    async fn set(&self, token: &SessionToken) -> Result<(), Error> {
        *self.token.lock().unwrap_or_else(|poison| poison.into_inner()) = Some(token.clone());
        *self.writes.lock().unwrap_or_else(|poison| poison.into_inner()) += 1;

        Ok(())
    }

    async fn get(&self) -> Result<Option<SessionToken>, Error> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone())
    }
}

/// A session store backed by a small JSON key-value file, in the spirit of a
/// cookie jar. Other keys in the file are left alone.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Name of the file inside the data directory.
    pub const FILE_NAME: &'static str = "session.json";

    /// Store sessions in `FILE_NAME` under `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    /// Where the store lives on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, Value>, Error> {
        if fs::try_exists(&self.path).await? {
            let data = fs::read(&self.path).await?;
            Ok(serde_json::from_slice(&data)?)
        } else {
            Ok(BTreeMap::new())
        }
    }
}

impl SessionStore for FileStore {
    async fn set(&self, token: &SessionToken) -> Result<(), Error> {
        tracing::debug!(path = ?self.path, "saving session token");

        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(Error::Json(err)) => {
                tracing::warn!(path = ?self.path, ?err, "replacing unreadable session file");
                BTreeMap::new()
            }
            Err(err) => return Err(err),
        };
        entries.insert(
            AUTH_TOKEN_KEY.to_string(),
            Value::String(token.expose_secret().to_string()),
        );

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write the whole file next to the old one, then swap it in, so a
        // crash never leaves a partial file behind.
        let data = serde_json::to_vec(&entries)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, &data).await?;
        fs::rename(&staging, &self.path).await?;

        Ok(())
    }

    async fn get(&self) -> Result<Option<SessionToken>, Error> {
        Ok(match self.read_entries().await?.remove(AUTH_TOKEN_KEY) {
            Some(Value::String(token)) => Some(SessionToken::new(token)),
            _ => None,
        })
    }
}
