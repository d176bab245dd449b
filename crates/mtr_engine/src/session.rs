use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use mtr_logging::mtr_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{write_atomic, PersistError};
use crate::SessionUser;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file: {0}")]
    Io(#[from] io::Error),
    #[error("session file is corrupt: {0}")]
    Corrupt(String),
    #[error("failed to serialize session: {0}")]
    Serialize(String),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    login: String,
    nome: String,
    cnp: Option<String>,
    adm: bool,
    token: Option<String>,
    logged_in_at: DateTime<Utc>,
}

/// Saved operator session, one RON file on disk.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nobody is logged in.
    pub fn load(&self) -> Result<Option<SessionUser>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let stored: StoredSession =
            ron::from_str(&content).map_err(|err| SessionError::Corrupt(err.to_string()))?;
        if stored.login.trim().is_empty() {
            return Err(SessionError::Corrupt("empty login".to_string()));
        }
        Ok(Some(SessionUser {
            login: stored.login,
            nome: stored.nome,
            cnp: stored.cnp,
            adm: stored.adm,
            token: stored.token,
        }))
    }

    pub fn save(&self, user: &SessionUser, logged_in_at: DateTime<Utc>) -> Result<(), SessionError> {
        let stored = StoredSession {
            login: user.login.clone(),
            nome: user.nome.clone(),
            cnp: user.cnp.clone(),
            adm: user.adm,
            token: user.token.clone(),
            logged_in_at,
        };
        let content = ron::ser::to_string_pretty(&stored, ron::ser::PrettyConfig::new())
            .map_err(|err| SessionError::Serialize(err.to_string()))?;
        write_atomic(&self.path, &content)?;
        mtr_info!("Saved session for {} to {:?}", user.login, self.path);
        Ok(())
    }

    /// Returns whether a session file was removed.
    pub fn clear(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
