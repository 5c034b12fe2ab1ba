use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::role::Role;
use super::session::{Session, SessionError, SessionResolver, SessionToken};
use crate::portal::repository::Repository;
use crate::portal::users::{User, UserId};

/// Login secret for a directory account. Demo fixtures only: compared verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
    pub user_id: UserId,
}

/// Open session: the account it belongs to plus any demo role override.
#[derive(Debug, Clone)]
struct OpenSession {
    user_id: UserId,
    switched_role: Option<Role>,
}

/// Issues, resolves and destroys sessions for directory accounts.
///
/// Sessions are re-read from the user directory on every resolve, so deleting
/// or re-roling an account takes effect on its open sessions immediately.
pub struct SessionService<R> {
    users: Arc<R>,
    credentials: Vec<Credential>,
    sessions: Mutex<HashMap<SessionToken, OpenSession>>,
    allow_role_switching: bool,
}

impl<R> SessionService<R>
where
    R: Repository<User> + 'static,
{
    pub fn new(users: Arc<R>, credentials: Vec<Credential>) -> Self {
        Self {
            users,
            credentials,
            sessions: Mutex::new(HashMap::new()),
            allow_role_switching: false,
        }
    }

    /// Enable the demo-only role switcher.
    pub fn with_role_switching(mut self, enabled: bool) -> Self {
        self.allow_role_switching = enabled;
        self
    }

    pub fn role_switching_enabled(&self) -> bool {
        self.allow_role_switching
    }

    pub fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(SessionToken, Session), SessionError> {
        let credential = self
            .credentials
            .iter()
            .find(|credential| {
                credential.email.eq_ignore_ascii_case(email.trim())
                    && credential.password == password
            })
            .ok_or(SessionError::InvalidCredentials)?;

        let user = self
            .users
            .get_by_id(&credential.user_id)
            .map_err(|err| SessionError::Unavailable(err.to_string()))?
            .ok_or(SessionError::InvalidCredentials)?;

        let session = Session::from(&user);
        let token = SessionToken::generate();
        self.lock()?.insert(
            token.clone(),
            OpenSession {
                user_id: user.id.clone(),
                switched_role: None,
            },
        );
        info!(user_id = %session.id, role = %session.role, "session opened");

        Ok((token, session))
    }

    pub fn logout(&self, token: &SessionToken) -> Result<(), SessionError> {
        match self.lock()?.remove(token) {
            Some(open) => {
                info!(user_id = %open.user_id, "session closed");
                Ok(())
            }
            None => Err(SessionError::UnknownSession),
        }
    }

    /// Swap the active role of a session. Only reachable when the capability flag is set.
    pub fn switch_role(&self, token: &SessionToken, role: Role) -> Result<Session, SessionError> {
        if !self.allow_role_switching {
            warn!("role switch attempted while disabled");
            return Err(SessionError::RoleSwitchingDisabled);
        }

        self.lock()?
            .get_mut(token)
            .ok_or(SessionError::UnknownSession)?
            .switched_role = Some(role);
        self.resolve(token)?.ok_or(SessionError::UnknownSession)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionToken, OpenSession>>, SessionError> {
        self.sessions
            .lock()
            .map_err(|_| SessionError::Unavailable("session mutex poisoned".to_string()))
    }
}

impl<R> SessionResolver for SessionService<R>
where
    R: Repository<User> + 'static,
{
    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>, SessionError> {
        let Some(open) = self.lock()?.get(token).cloned() else {
            return Ok(None);
        };

        let user = self
            .users
            .get_by_id(&open.user_id)
            .map_err(|err| SessionError::Unavailable(err.to_string()))?;
        let Some(user) = user else {
            self.lock()?.remove(token);
            info!(user_id = %open.user_id, "session dropped for removed account");
            return Ok(None);
        };

        let mut session = Session::from(&user);
        if let Some(role) = open.switched_role {
            session.role = role;
        }
        Ok(Some(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::repository::InMemoryRepository;
    use chrono::Utc;

    fn service() -> SessionService<InMemoryRepository<User>> {
        let users = InMemoryRepository::seeded([User {
            id: UserId("officer-001".to_string()),
            role: Role::Officer,
            email: "officer@example.com".to_string(),
            name: "Jane Officer".to_string(),
            organization: None,
            verified: true,
            created_at: Utc::now(),
        }]);
        SessionService::new(
            Arc::new(users),
            vec![Credential {
                email: "officer@example.com".to_string(),
                password: "password123".to_string(),
                user_id: UserId("officer-001".to_string()),
            }],
        )
    }

    #[test]
    fn login_issues_resolvable_session() {
        let service = service();
        let (token, session) = service
            .login("Officer@Example.com", "password123")
            .expect("valid credentials");

        assert_eq!(session.role, Role::Officer);
        assert_eq!(service.resolve(&token), Ok(Some(session)));
    }

    #[test]
    fn login_rejects_wrong_password() {
        assert_eq!(
            service().login("officer@example.com", "nope").map(|_| ()),
            Err(SessionError::InvalidCredentials)
        );
    }

    #[test]
    fn logout_destroys_the_session() {
        let service = service();
        let (token, _) = service
            .login("officer@example.com", "password123")
            .expect("login");

        service.logout(&token).expect("logout");
        assert_eq!(service.resolve(&token), Ok(None));
        assert_eq!(service.logout(&token), Err(SessionError::UnknownSession));
    }

    #[test]
    fn role_switching_requires_capability_flag() {
        let service = service();
        let (token, _) = service
            .login("officer@example.com", "password123")
            .expect("login");
        assert_eq!(
            service.switch_role(&token, Role::Admin),
            Err(SessionError::RoleSwitchingDisabled)
        );

        let service = service.with_role_switching(true);
        let switched = service
            .switch_role(&token, Role::Admin)
            .expect("switch allowed");
        assert_eq!(switched.role, Role::Admin);
        assert_eq!(
            service.resolve(&token).map(|session| session.map(|s| s.role)),
            Ok(Some(Role::Admin))
        );
    }

    #[test]
    fn resolve_follows_directory_changes() {
        let service = service();
        let (token, _) = service
            .login("officer@example.com", "password123")
            .expect("login");

        let mut user = service
            .users
            .get_by_id(&UserId("officer-001".to_string()))
            .expect("lookup")
            .expect("seeded user");
        user.role = Role::Bidder;
        user.name = "Jane Bidder".to_string();
        service.users.update(user).expect("demote");

        let session = service.resolve(&token).expect("resolve").expect("still signed in");
        assert_eq!(session.role, Role::Bidder);
        assert_eq!(session.name, "Jane Bidder");

        service
            .users
            .delete(&UserId("officer-001".to_string()))
            .expect("delete");
        assert_eq!(service.resolve(&token), Ok(None));
        assert_eq!(service.logout(&token), Err(SessionError::UnknownSession));
    }
}
