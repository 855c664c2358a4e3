//! Persistent login session.
//!
//! The session lives in a small key-value store so it survives restarts of the
//! client. Token presence is the only authentication signal: role, name and
//! user id are reported only while a token is stored.

use crate::error::Result;
use crate::models::{LoginResponse, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const TOKEN_KEY: &str = "access_token";
pub const ROLE_KEY: &str = "role";
pub const NAME_KEY: &str = "name";
pub const USER_ID_KEY: &str = "user_id";

const ALL_KEYS: [&str; 4] = [TOKEN_KEY, ROLE_KEY, NAME_KEY, USER_ID_KEY];

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten after every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(serialized) => serde_json::from_str(&serialized).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable session file, starting signed out");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no session file yet");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(FileStore { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a sibling temp file and renames it over the session file, so
    /// an interrupted write never leaves a truncated file behind.
    fn save_to_file(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let serialized = serde_json::to_string_pretty(&self.values)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(serialized.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save_to_file()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save_to_file()?;
        }
        Ok(())
    }
}

/// Point-in-time view of the stored session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub role: Role,
    pub display_name: Option<String>,
    pub user_id: Option<i64>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.token.as_ref().map(|_| self.role)
    }
}

pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        SessionStore { store }
    }

    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&mut self, token: &str, role: Role) -> Result<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.store.set(ROLE_KEY, role.as_str())
    }

    /// Stored role, only while authenticated.
    pub fn role(&self) -> Option<Role> {
        self.token()?;
        Some(
            self.store
                .get(ROLE_KEY)
                .map(|r| Role::parse_lenient(&r))
                .unwrap_or_default(),
        )
    }

    pub fn name(&self) -> Option<String> {
        self.token()?;
        self.store.get(NAME_KEY)
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        self.store.set(NAME_KEY, name)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.token()?;
        self.store.get(USER_ID_KEY)?.parse().ok()
    }

    pub fn set_user_id(&mut self, id: i64) -> Result<()> {
        self.store.set(USER_ID_KEY, &id.to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Persists everything a successful login returns. Returns the role the
    /// session was stored with, or `None` when the response carried no token.
    pub fn record_login(&mut self, response: &LoginResponse) -> Result<Option<Role>> {
        let Some(token) = response.access_token.as_deref() else {
            return Ok(None);
        };
        let role = response.user.as_ref().map(|u| u.role).unwrap_or_default();
        self.set_token(token, role)?;

        if let Some(user) = &response.user {
            self.set_user_id(user.id)?;
            if !user.name.is_empty() {
                self.set_name(&user.name)?;
            }
        }
        tracing::info!(%role, "session stored");
        Ok(Some(role))
    }

    /// Clears every session key together.
    pub fn logout(&mut self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.remove(key)?;
        }
        tracing::info!("session cleared");
        Ok(())
    }

    pub fn snapshot(&self) -> Session {
        Session {
            token: self.token(),
            role: self.role().unwrap_or_default(),
            display_name: self.name(),
            user_id: self.user_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    fn login_response(role: Role) -> LoginResponse {
        LoginResponse {
            access_token: Some("tok-123".into()),
            refresh_token: None,
            user: Some(User {
                id: 42,
                name: "Mira".into(),
                email: "mira@example.com".into(),
                age: Some(29),
                role,
            }),
            detail: None,
        }
    }

    #[test]
    fn record_login_stores_all_fields() {
        let mut session = SessionStore::new(MemoryStore::new());
        let role = session.record_login(&login_response(Role::Admin)).unwrap();

        assert_eq!(role, Some(Role::Admin));
        assert_eq!(
            session.snapshot(),
            Session {
                token: Some("tok-123".into()),
                role: Role::Admin,
                display_name: Some("Mira".into()),
                user_id: Some(42),
            }
        );
    }

    #[test]
    fn login_without_token_stores_nothing() {
        let mut session = SessionStore::new(MemoryStore::new());
        let mut response = login_response(Role::User);
        response.access_token = None;

        assert_eq!(session.record_login(&response).unwrap(), None);
        assert!(!session.is_authenticated());
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn logout_clears_everything() {
        let mut session = SessionStore::new(MemoryStore::new());
        session.record_login(&login_response(Role::User)).unwrap();
        assert!(session.is_authenticated());

        session.logout().unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(session.role(), None);
        assert_eq!(session.name(), None);
        assert_eq!(session.user_id(), None);
        for key in ALL_KEYS {
            assert_eq!(session.store.get(key), None, "{key} survived logout");
        }
    }

    #[test]
    fn identity_is_ignored_without_token() {
        let mut store = MemoryStore::new();
        store.set(ROLE_KEY, "admin").unwrap();
        store.set(NAME_KEY, "Ghost").unwrap();
        store.set(USER_ID_KEY, "9").unwrap();
        let session = SessionStore::new(store);

        assert_eq!(session.role(), None);
        assert_eq!(session.snapshot().role(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = SessionStore::new(FileStore::open(&path).unwrap());
        session.record_login(&login_response(Role::User)).unwrap();

        let reopened = SessionStore::new(FileStore::open(&path).unwrap());
        assert_eq!(reopened.token().as_deref(), Some("tok-123"));
        assert_eq!(reopened.role(), Some(Role::User));
        assert_eq!(reopened.user_id(), Some(42));

        let mut reopened = reopened;
        reopened.logout().unwrap();
        let after_logout = SessionStore::new(FileStore::open(&path).unwrap());
        assert!(!after_logout.is_authenticated());
    }

    #[test]
    fn damaged_file_opens_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in [("empty.json", ""), ("truncated.json", r#"{"access_token": "to"#)] {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();

            let mut session = SessionStore::new(FileStore::open(&path).unwrap());
            assert!(!session.is_authenticated(), "{name}");

            session.record_login(&login_response(Role::User)).unwrap();
            let reopened = SessionStore::new(FileStore::open(&path).unwrap());
            assert_eq!(reopened.token().as_deref(), Some("tok-123"), "{name}");
        }
    }

    #[test]
    fn saving_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut session = SessionStore::new(FileStore::open(&path).unwrap());
        session.record_login(&login_response(Role::Admin)).unwrap();
        session.logout().unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("session.json")]);
    }
}
