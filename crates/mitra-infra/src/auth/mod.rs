//! File-backed user accounts.
//!
//! `LocalAuthService` keeps registered users in `{data_dir}/users.json`
//! (argon2id password hashes, never plaintext) and remembers the signed-in
//! user in `{data_dir}/session.json` so the next run starts signed in.
//! It implements the core `AuthProvider` query port.

pub mod password;

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use mitra_core::auth::AuthProvider;
use mitra_types::auth::{MAX_USERNAME_LEN, MIN_PASSWORD_LEN, Registration, User, UserId};
use mitra_types::error::AuthError;

use crate::filesystem::{session_path, users_path, write_atomic};

use self::password::{hash_password, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    #[serde(flatten)]
    user: User,
    password_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user_id: UserId,
    signed_in_at: DateTime<Utc>,
}

pub struct LocalAuthService {
    users_path: PathBuf,
    session_path: PathBuf,
    /// Keyed by username.
    users: DashMap<String, StoredUser>,
    current: RwLock<Option<UserId>>,
    /// Serializes writes of `users.json`.
    write_lock: tokio::sync::Mutex<()>,
}

impl LocalAuthService {
    /// Load users and the remembered session from `data_dir`.
    ///
    /// Missing files mean "no users yet" / "signed out". A remembered session
    /// whose user no longer exists is ignored.
    pub async fn open(data_dir: &Path) -> Result<Self, AuthError> {
        let users_path = users_path(data_dir);
        let session_path = session_path(data_dir);

        let users = DashMap::new();
        if let Some(content) = read_optional(&users_path).await? {
            let stored: Vec<StoredUser> = serde_json::from_str(&content).map_err(|e| {
                AuthError::StorageError(format!("{}: {e}", users_path.display()))
            })?;
            for entry in stored {
                users.insert(entry.user.username.clone(), entry);
            }
        }

        let mut current = None;
        if let Some(content) = read_optional(&session_path).await? {
            match serde_json::from_str::<SessionFile>(&content) {
                Ok(session) if users.iter().any(|u| u.user.id == session.user_id) => {
                    current = Some(session.user_id);
                }
                Ok(session) => {
                    debug!(user_id = %session.user_id, "Remembered user no longer exists");
                }
                Err(err) => warn!("Ignoring unreadable {}: {err}", session_path.display()),
            }
        }

        debug!(users = users.len(), signed_in = current.is_some(), "User store loaded");

        Ok(Self {
            users_path,
            session_path,
            users,
            current: RwLock::new(current),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Create an account and sign it in.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let username = registration.username.trim().to_string();
        if username.is_empty() || registration.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AuthError::UsernameTooLong {
                max: MAX_USERNAME_LEN,
            });
        }
        if registration.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        let password_hash = hash_password(&registration.password)?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: username.clone(),
            email: clean(registration.email),
            first_name: clean(registration.first_name),
            last_name: clean(registration.last_name),
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        };

        match self.users.entry(username.clone()) {
            Entry::Occupied(_) => return Err(AuthError::UsernameTaken(username)),
            Entry::Vacant(slot) => {
                slot.insert(StoredUser {
                    user: user.clone(),
                    password_hash,
                });
            }
        }

        if let Err(err) = self.persist_users().await {
            self.users.remove(&username);
            return Err(err);
        }
        info!(user_id = %user.id, username = %user.username, "User registered");

        self.sign_in(user.id).await?;
        Ok(user)
    }

    /// Verify credentials and sign the user in.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let user = match self.users.get(username) {
            Some(stored) if verify_password(password, &stored.password_hash) => {
                stored.user.clone()
            }
            _ => {
                debug!(username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        self.sign_in(user.id).await?;
        info!(user_id = %user.id, "User signed in");
        Ok(user)
    }

    /// Forget the signed-in user. Signing out twice is fine.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.set_current(None);
        match tokio::fs::remove_file(&self.session_path).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(AuthError::StorageError(err.to_string())),
        }
        info!("User signed out");
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        let id = self.current_user_id()?;
        self.users
            .iter()
            .find(|entry| entry.user.id == id)
            .map(|entry| entry.user.clone())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    async fn sign_in(&self, user_id: UserId) -> Result<(), AuthError> {
        let session = SessionFile {
            user_id,
            signed_in_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&session)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        write_atomic(&self.session_path, &json)
            .await
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        self.set_current(Some(user_id));
        Ok(())
    }

    async fn persist_users(&self) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().await;

        let mut stored: Vec<StoredUser> =
            self.users.iter().map(|entry| entry.value().clone()).collect();
        stored.sort_by_key(|entry| entry.user.created_at);

        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| AuthError::StorageError(e.to_string()))?;
        write_atomic(&self.users_path, &json)
            .await
            .map_err(|e| AuthError::StorageError(e.to_string()))
    }

    fn set_current(&self, user_id: Option<UserId>) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = user_id;
    }
}

impl AuthProvider for LocalAuthService {
    fn current_user_id(&self) -> Option<UserId> {
        *self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, AuthError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AuthError::StorageError(format!("{}: {err}", path.display()))),
    }
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn register_signs_in_and_persists() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        assert!(!auth.is_authenticated());

        let user = auth
            .register(Registration {
                username: "asha".to_string(),
                password: "s3cret".to_string(),
                email: Some("asha@kiit.ac.in".to_string()),
                first_name: Some("Asha".to_string()),
                last_name: Some("Rao".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(auth.current_user_id(), Some(user.id));
        assert_eq!(auth.current_user().unwrap().display_name(), "Asha Rao");

        let raw = tokio::fs::read_to_string(users_path(tmp.path())).await.unwrap();
        assert!(raw.contains("$argon2id$"));
        assert!(!raw.contains("s3cret"));

        let reopened = LocalAuthService::open(tmp.path()).await.unwrap();
        assert_eq!(reopened.user_count(), 1);
        assert_eq!(reopened.current_user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        auth.register(registration("ravi", "ravi-pass")).await.unwrap();

        let err = auth.register(registration(" ravi ", "other-pass")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken(name) if name == "ravi"));
        assert_eq!(auth.user_count(), 1);
    }

    #[tokio::test]
    async fn registration_validation() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();

        let err = auth.register(registration("  ", "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));

        let err = auth.register(registration("meera", "")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));

        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        let err = auth.register(registration(&long, "hunter22")).await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTooLong { max: 50 }));

        let err = auth.register(registration("meera", "12345")).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort { min: 6 }));
        assert_eq!(auth.user_count(), 0);

        let exact = "y".repeat(MAX_USERNAME_LEN);
        assert!(auth.register(registration(&exact, "123456")).await.is_ok());
    }

    #[tokio::test]
    async fn login_checks_password() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        let user = auth.register(registration("kabir", "right-pass")).await.unwrap();
        auth.logout().await.unwrap();

        let err = auth.login("kabir", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let err = auth.login("nobody", "right-pass").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!auth.is_authenticated());

        let signed_in = auth.login("kabir", "right-pass").await.unwrap();
        assert_eq!(signed_in.id, user.id);
        assert!(auth.is_authenticated());
    }

    #[tokio::test]
    async fn logout_forgets_session() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        auth.register(registration("tara", "tara-pass")).await.unwrap();

        auth.logout().await.unwrap();
        auth.logout().await.unwrap();
        assert!(auth.current_user().is_none());
        assert!(!session_path(tmp.path()).exists());

        let reopened = LocalAuthService::open(tmp.path()).await.unwrap();
        assert!(!reopened.is_authenticated());
        assert_eq!(reopened.user_count(), 1);
    }

    #[tokio::test]
    async fn stale_session_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let session = SessionFile {
            user_id: UserId::new(),
            signed_in_at: Utc::now(),
        };
        tokio::fs::write(
            session_path(tmp.path()),
            serde_json::to_string(&session).unwrap(),
        )
        .await
        .unwrap();

        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn blank_profile_fields_are_dropped() {
        let tmp = TempDir::new().unwrap();
        let auth = LocalAuthService::open(tmp.path()).await.unwrap();
        let user = auth
            .register(Registration {
                username: "dev".to_string(),
                password: "dev-pass".to_string(),
                email: Some("   ".to_string()),
                first_name: Some("Dev".to_string()),
                last_name: None,
            })
            .await
            .unwrap();

        assert!(user.email.is_none());
        assert_eq!(user.display_name(), "dev");
    }
}
