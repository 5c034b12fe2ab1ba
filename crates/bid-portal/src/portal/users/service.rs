use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{NewUser, User, UserId, UserUpdate};
use crate::portal::repository::{Repository, RepositoryError};

const MIN_NAME_LENGTH: usize = 2;

/// Account administration backed by an injected user store.
pub struct UserDirectory<R> {
    repository: Arc<R>,
    sequence: AtomicU64,
}

impl<R> UserDirectory<R>
where
    R: Repository<User> + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: &UserId) -> Result<User, UserServiceError> {
        self.repository
            .get_by_id(id)?
            .ok_or(UserServiceError::Repository(RepositoryError::NotFound))
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        let needle = email.trim();
        Ok(self
            .repository
            .list()?
            .into_iter()
            .find(|user| user.email.eq_ignore_ascii_case(needle)))
    }

    /// Register a new, unverified account.
    pub fn create(&self, payload: NewUser) -> Result<User, UserServiceError> {
        let name = validate_name(&payload.name)?;
        let email = validate_email(&payload.email)?;
        if self.find_by_email(&email)?.is_some() {
            return Err(UserServiceError::EmailInUse(email));
        }

        let user = User {
            id: self.next_id(),
            role: payload.role,
            email,
            name,
            organization: payload
                .organization
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            verified: false,
            created_at: Utc::now(),
        };

        let stored = self.repository.create(user)?;
        info!(user_id = %stored.id, role = %stored.role, "user created");
        Ok(stored)
    }

    pub fn update(&self, id: &UserId, changes: UserUpdate) -> Result<User, UserServiceError> {
        let mut user = self.get(id)?;

        if let Some(name) = changes.name {
            user.name = validate_name(&name)?;
        }
        if let Some(email) = changes.email {
            let email = validate_email(&email)?;
            if !email.eq_ignore_ascii_case(&user.email) {
                if let Some(existing) = self.find_by_email(&email)? {
                    if existing.id != user.id {
                        return Err(UserServiceError::EmailInUse(email));
                    }
                }
            }
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(organization) = changes.organization {
            let trimmed = organization.trim();
            user.organization = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(verified) = changes.verified {
            user.verified = verified;
        }

        Ok(self.repository.update(user)?)
    }

    pub fn delete(&self, id: &UserId) -> Result<(), UserServiceError> {
        self.repository.delete(id)?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub fn verify(&self, id: &UserId) -> Result<User, UserServiceError> {
        let mut user = self.get(id)?;
        user.verified = true;
        Ok(self.repository.update(user)?)
    }

    fn next_id(&self) -> UserId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        UserId(format!("usr-{id:06}"))
    }
}

fn validate_name(raw: &str) -> Result<String, UserServiceError> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(UserServiceError::InvalidName);
    }
    Ok(name.to_string())
}

fn validate_email(raw: &str) -> Result<String, UserServiceError> {
    let email = raw.trim();
    let plausible = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !plausible || email.chars().any(char::is_whitespace) {
        return Err(UserServiceError::InvalidEmail(email.to_string()));
    }
    Ok(email.to_string())
}

/// Error raised by the user directory.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("name must be at least 2 characters")]
    InvalidName,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("email already in use: {0}")]
    EmailInUse(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
