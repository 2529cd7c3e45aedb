use std::sync::Arc;

use anyhow::anyhow;
use rand::{Rng, distr::Alphanumeric};
use tracing::info;

use feedback_db::Database;
use feedback_db::models::NewUserRow;
use feedback_types::api::RegisterRequest;
use feedback_types::models::User;

use crate::error::{Error, Result};
use crate::gate::require_self;
use crate::hasher::CredentialHasher;
use crate::validate::Validate;

/// Owns user records: registration, password checks, account removal.
pub struct CredentialStore {
    db: Arc<Database>,
    hasher: Arc<dyn CredentialHasher>,
    /// Hash of a random secret, verified against when the username is unknown
    /// so both failure paths cost one hash verification.
    decoy_hash: String,
}

impl CredentialStore {
    pub fn new(db: Arc<Database>, hasher: Arc<dyn CredentialHasher>) -> Result<Self> {
        let decoy: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let decoy_hash = hasher.hash(&decoy)?;

        Ok(Self {
            db,
            hasher,
            decoy_hash,
        })
    }

    pub fn register(&self, req: &RegisterRequest) -> Result<User> {
        req.validate()?;

        // Cheap early exit before paying for the hash. The insert below is
        // still the authority when two registrations race.
        if self.db.get_user(&req.username)?.is_some() {
            info!("Registration rejected: username {} taken", req.username);
            return Err(Error::Conflict);
        }

        self.insert(req)
    }

    /// Hash and store. A concurrent registration that got there first
    /// surfaces here as a key conflict.
    fn insert(&self, req: &RegisterRequest) -> Result<User> {
        let password_hash = self.hasher.hash(&req.password)?;

        let created = self.db.create_user(&NewUserRow {
            username: &req.username,
            password: &password_hash,
            email: &req.email,
            first_name: &req.first_name,
            last_name: &req.last_name,
        })?;
        if !created {
            info!("Registration lost a race: username {} taken", req.username);
            return Err(Error::Conflict);
        }

        let row = self
            .db
            .get_user(&req.username)?
            .ok_or_else(|| anyhow!("User {} missing right after insert", req.username))?;

        info!("Registered user {}", row.username);
        Ok(row.into_user())
    }

    /// `None` on any mismatch. Callers cannot tell an unknown username from a
    /// wrong password.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(row) = self.db.get_user(username)? else {
            let _ = self.hasher.verify(password, &self.decoy_hash);
            return Ok(None);
        };

        if self.hasher.verify(password, &row.password) {
            Ok(Some(row.into_user()))
        } else {
            Ok(None)
        }
    }

    /// Remove the caller's own account. Feedback and sessions go with it.
    pub fn delete_account(&self, identity: Option<&str>, username: &str) -> Result<()> {
        require_self(identity, username)?;

        if !self.db.delete_user(username)? {
            return Err(Error::Unauthorized);
        }

        info!("Deleted user {}", username);
        Ok(())
    }
}
