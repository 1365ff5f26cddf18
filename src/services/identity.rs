use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::database::store::{Datastore, ListQuery, Row, StoreError};

const STAFF_TABLE: &str = "staff_users";
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Invalid(String),

    #[error("An account with this email already exists")]
    Duplicate,

    #[error("Invalid email or password")]
    BadCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffUser {
    pub id: Uuid,
    pub email: String,
}

/// Identity-service boundary: credential checks and administrative
/// account provisioning, both backed by the staff_users table through
/// the shared data-access handle.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Datastore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { store }
    }

    /// Salted SHA-256 digest in `salt$hex` form
    fn hash_password(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        format!("{}${}", salt, hex::encode(hasher.finalize()))
    }

    fn verify_password(password: &str, stored: &str) -> bool {
        match stored.split_once('$') {
            Some((salt, _)) => Self::hash_password(password, salt) == stored,
            None => false,
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Row>, StoreError> {
        let query = ListQuery::default().eq("email", email);
        let mut rows = self.store.select(STAFF_TABLE, &query).await?;
        Ok(rows.pop())
    }

    /// Provision a staff account (administrative call, no session
    /// required). Input checks are deliberately minimal; the email is
    /// the login identifier and must be unique.
    pub async fn provision(&self, email: &str, password: &str) -> Result<StaffUser, IdentityError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(IdentityError::Invalid("A valid email is required".to_string()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::Duplicate);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let mut row = Row::new();
        row.insert("email".to_string(), Value::String(email.clone()));
        row.insert(
            "password_hash".to_string(),
            Value::String(Self::hash_password(password, &salt)),
        );
        let id = self.store.insert(STAFF_TABLE, &row).await?;
        tracing::info!(%id, email, "staff account provisioned");

        Ok(StaffUser { id, email })
    }

    /// Check credentials and return the staff identity. Failures are
    /// deliberately indistinguishable between unknown email and wrong
    /// password.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<StaffUser, IdentityError> {
        let email = email.trim().to_lowercase();
        let row = self.find_by_email(&email).await?.ok_or(IdentityError::BadCredentials)?;

        let stored = row
            .get("password_hash")
            .and_then(|v| v.as_str())
            .ok_or(IdentityError::BadCredentials)?;
        if !Self::verify_password(password, stored) {
            return Err(IdentityError::BadCredentials);
        }

        let id = row
            .get("id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(IdentityError::BadCredentials)?;

        Ok(StaffUser { id, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_env;

    #[test]
    fn password_hashing_round_trips_and_rejects_wrong_password() {
        let stored = IdentityService::hash_password("correct horse", "salt123");
        assert!(IdentityService::verify_password("correct horse", &stored));
        assert!(!IdentityService::verify_password("wrong horse", &stored));
        assert!(!IdentityService::verify_password("correct horse", "malformed"));
    }

    #[tokio::test]
    async fn provision_then_authenticate() {
        let env = test_env();
        let identity = IdentityService::new(env.store.clone());

        let user = identity.provision("Staff@Party.example", "s3cret-pass").await.unwrap();
        assert_eq!(user.email, "staff@party.example");

        let back = identity.authenticate("staff@party.example", "s3cret-pass").await.unwrap();
        assert_eq!(back.id, user.id);

        let err = identity.authenticate("staff@party.example", "bad-pass").await.unwrap_err();
        assert!(matches!(err, IdentityError::BadCredentials));
    }

    #[tokio::test]
    async fn provision_rejects_bad_input_and_duplicates() {
        let env = test_env();
        let identity = IdentityService::new(env.store.clone());

        assert!(matches!(
            identity.provision("not-an-email", "s3cret-pass").await.unwrap_err(),
            IdentityError::Invalid(_)
        ));
        assert!(matches!(
            identity.provision("a@b.example", "short").await.unwrap_err(),
            IdentityError::Invalid(_)
        ));

        identity.provision("a@b.example", "s3cret-pass").await.unwrap();
        assert!(matches!(
            identity.provision("a@b.example", "s3cret-pass").await.unwrap_err(),
            IdentityError::Duplicate
        ));
    }
}
