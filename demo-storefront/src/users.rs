//! In-memory user directory with argon2 password hashes

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use password_hash::{PasswordHash, SaltString};
use ring::rand::SecureRandom;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use storefront_session_axum::{AuthError, Authenticator, Credentials, Identity, Registration};

const MIN_PASSWORD_LEN: usize = 8;

struct UserRecord {
    id: String,
    username: String,
    email: Option<String>,
    password_hash: String,
    roles: Vec<String>,
}

impl UserRecord {
    fn identity(&self) -> Identity {
        Identity {
            profile: json!({ "username": self.username, "email": self.email }),
            ..Identity::new(self.id.clone(), self.roles.clone())
        }
    }
}

pub(crate) struct UserDirectory {
    users: RwLock<HashMap<String, UserRecord>>,
    /// Verified against when the username is unknown, so both paths cost the same.
    dummy_hash: String,
}

impl UserDirectory {
    pub(crate) async fn new() -> Result<Self, AuthError> {
        let dummy_hash = hash_password("dummy-password-for-timing".to_string()).await?;
        Ok(Self {
            users: RwLock::new(HashMap::new()),
            dummy_hash,
        })
    }

    /// Directory with one account from `DEMO_USERNAME` / `DEMO_PASSWORD`.
    pub(crate) async fn with_demo_user() -> Result<Self, AuthError> {
        let directory = Self::new().await?;
        let username = std::env::var("DEMO_USERNAME").unwrap_or_else(|_| "demo".to_string());
        let password =
            std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "demo-password".to_string());

        directory
            .insert(&username, None, password, vec!["customer".to_string()])
            .await?;
        tracing::info!("Demo user '{}' created", username);
        Ok(directory)
    }

    async fn insert(
        &self,
        username: &str,
        email: Option<String>,
        password: String,
        roles: Vec<String>,
    ) -> Result<Identity, AuthError> {
        let password_hash = hash_password(password).await?;

        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AuthError::Conflict("Username already taken".to_string()));
        }

        let record = UserRecord {
            id: format!("user-{}", users.len() + 1),
            username: username.to_string(),
            email,
            password_hash,
            roles,
        };
        let identity = record.identity();
        users.insert(username.to_string(), record);
        Ok(identity)
    }
}

#[async_trait]
impl Authenticator for UserDirectory {
    async fn login(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        let (hash, identity) = {
            let users = self.users.read().await;
            match users.get(&credentials.username) {
                Some(user) => (user.password_hash.clone(), Some(user.identity())),
                None => (self.dummy_hash.clone(), None),
            }
        };

        let valid = verify_password(credentials.password.clone(), hash).await?;
        match identity {
            Some(identity) if valid => Ok(identity),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn register(&self, registration: &Registration) -> Result<Identity, AuthError> {
        let username = registration.username.trim();
        if username.is_empty() {
            return Err(AuthError::Invalid("Username is required".to_string()));
        }
        if registration.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        self.insert(
            username,
            registration.email.clone(),
            registration.password.clone(),
            vec!["customer".to_string()],
        )
        .await
    }

    async fn profile(&self, user_id: &str) -> Result<serde_json::Value, AuthError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.id == user_id)
            .map(|user| user.identity().profile)
            .unwrap_or(serde_json::Value::Null))
    }
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || {
        let mut salt_bytes = [0u8; 16];
        ring::rand::SystemRandom::new()
            .fill(&mut salt_bytes)
            .map_err(|_| AuthError::Internal("Failed to generate salt".to_string()))?;
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Internal(e.to_string()))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Internal(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: password.to_string(),
            email: Some(format!("{username}@example.com")),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let directory = UserDirectory::new().await.unwrap();

        let registered = directory
            .register(&registration("carol", "correct horse"))
            .await
            .unwrap();
        let logged_in = directory
            .login(&credentials("carol", "correct horse"))
            .await
            .unwrap();

        assert_eq!(registered, logged_in);
        assert_eq!(logged_in.roles, vec!["customer".to_string()]);
        assert_eq!(logged_in.profile["email"], "carol@example.com");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let directory = UserDirectory::new().await.unwrap();
        directory
            .register(&registration("carol", "correct horse"))
            .await
            .unwrap();

        let wrong = directory.login(&credentials("carol", "battery staple")).await;
        let unknown = directory.login(&credentials("mallory", "correct horse")).await;

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let directory = UserDirectory::new().await.unwrap();

        assert!(matches!(
            directory.register(&registration("  ", "long enough")).await,
            Err(AuthError::Invalid(_))
        ));
        assert!(matches!(
            directory.register(&registration("dave", "short")).await,
            Err(AuthError::Invalid(_))
        ));

        directory
            .register(&registration("dave", "long enough"))
            .await
            .unwrap();
        assert!(matches!(
            directory.register(&registration("dave", "another one")).await,
            Err(AuthError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let directory = UserDirectory::new().await.unwrap();
        let identity = directory
            .register(&registration("erin", "long enough"))
            .await
            .unwrap();

        let profile = directory.profile(&identity.user_id).await.unwrap();
        assert_eq!(profile["username"], "erin");
        assert!(directory.profile("nobody").await.unwrap().is_null());
    }
}
