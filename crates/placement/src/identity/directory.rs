use std::sync::Arc;

use tracing::{info, warn};

use super::credentials::CredentialHasher;
use super::domain::{NewUser, Role, User, UserId, MAX_USERNAME_LEN};
use crate::error::{Entity, PlacementError, ValidationError};
use crate::storage::PlacementRepository;

/// Accounts created by `init`, one per role. All share the password `pass`.
pub const DEFAULT_ACCOUNTS: [(&str, Role); 3] = [
    ("student1", Role::Student),
    ("staff1", Role::Staff),
    ("employer1", Role::Employer),
];

const DEFAULT_PASSWORD: &str = "pass";

/// User creation and lookup over the shared record store.
pub struct UserDirectory<R, H> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R, H> UserDirectory<R, H>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Validate, hash the password, and persist a new user.
    pub fn create_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, PlacementError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::BlankUsername.into());
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::UsernameTooLong {
                max: MAX_USERNAME_LEN,
            }
            .into());
        }
        if password.is_empty() {
            return Err(ValidationError::BlankPassword.into());
        }

        let password_hash = self.hasher.hash(password)?;
        let user = self.repository.insert_user(NewUser {
            username: username.to_string(),
            password_hash,
            role,
        })?;

        info!(user_id = user.id.0, role = %user.role, "user created");
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>, PlacementError> {
        Ok(self.repository.users()?)
    }

    pub fn get_user(&self, id: UserId) -> Result<User, PlacementError> {
        self.repository
            .fetch_user(id)?
            .ok_or_else(|| PlacementError::not_found(Entity::User, id.0))
    }

    /// Check a username/password pair. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, PlacementError> {
        let candidate = self.repository.find_user_by_username(username.trim())?;
        match candidate {
            Some(user) if self.hasher.verify(password, &user.password_hash) => Ok(user),
            _ => {
                warn!("credential verification failed");
                Err(PlacementError::InvalidCredentials)
            }
        }
    }

    pub fn seed_default_accounts(&self) -> Result<Vec<User>, PlacementError> {
        DEFAULT_ACCOUNTS
            .iter()
            .map(|(username, role)| self.create_user(username, DEFAULT_PASSWORD, *role))
            .collect()
    }

    /// Destroy every stored record, optionally seeding the default accounts afterwards.
    pub fn reinitialize(&self, seed: bool) -> Result<Vec<User>, PlacementError> {
        self.repository.reset()?;
        if !seed {
            return Ok(Vec::new());
        }
        self.seed_default_accounts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Argon2Hasher;
    use crate::storage::{MemoryStore, RepositoryError};

    fn directory() -> (UserDirectory<MemoryStore, Argon2Hasher>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let directory = UserDirectory::new(store.clone(), Arc::new(Argon2Hasher::default()));
        (directory, store)
    }

    #[test]
    fn create_user_hashes_password_and_trims_username() {
        let (directory, store) = directory();
        let user = directory
            .create_user("  alice ", "secret", Role::Student)
            .expect("user created");

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret");
        let stored = store.fetch_user(user.id).unwrap().expect("stored");
        assert_eq!(stored, user);
    }

    #[test]
    fn create_user_rejects_blank_and_oversized_input() {
        let (directory, store) = directory();
        assert!(matches!(
            directory.create_user("   ", "secret", Role::Student),
            Err(PlacementError::Validation(ValidationError::BlankUsername))
        ));
        assert!(matches!(
            directory.create_user("a".repeat(21).as_str(), "secret", Role::Student),
            Err(PlacementError::Validation(ValidationError::UsernameTooLong { max: 20 }))
        ));
        assert!(matches!(
            directory.create_user("alice", "", Role::Student),
            Err(PlacementError::Validation(ValidationError::BlankPassword))
        ));
        assert!(store.users().unwrap().is_empty());
    }

    #[test]
    fn duplicate_usernames_surface_as_conflicts() {
        let (directory, _) = directory();
        directory
            .create_user("alice", "secret", Role::Student)
            .expect("first insert");
        assert!(matches!(
            directory.create_user("alice", "other", Role::Staff),
            Err(PlacementError::Repository(RepositoryError::Conflict))
        ));
    }

    #[test]
    fn verify_credentials_checks_hash() {
        let (directory, _) = directory();
        let alice = directory
            .create_user("alice", "secret", Role::Employer)
            .expect("user created");

        let verified = directory
            .verify_credentials("alice", "secret")
            .expect("password verifies");
        assert_eq!(verified.id, alice.id);
        assert!(matches!(
            directory.verify_credentials("alice", "wrong"),
            Err(PlacementError::InvalidCredentials)
        ));
        assert!(matches!(
            directory.verify_credentials("nobody", "secret"),
            Err(PlacementError::InvalidCredentials)
        ));
    }

    #[test]
    fn get_user_reports_missing_ids() {
        let (directory, _) = directory();
        match directory.get_user(UserId(5)) {
            Err(PlacementError::NotFound { entity, id }) => {
                assert_eq!(entity, Entity::User);
                assert_eq!(id, 5);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn reinitialize_wipes_and_reseeds() {
        let (directory, _) = directory();
        directory
            .create_user("leftover", "secret", Role::Staff)
            .expect("user created");

        let seeded = directory.reinitialize(true).expect("reinitialized");
        let roles: Vec<Role> = seeded.iter().map(|user| user.role).collect();
        assert_eq!(roles, vec![Role::Student, Role::Staff, Role::Employer]);

        let usernames: Vec<String> = directory
            .list_users()
            .unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(usernames, vec!["student1", "staff1", "employer1"]);
        assert!(directory.verify_credentials("staff1", "pass").is_ok());

        assert!(directory.reinitialize(false).unwrap().is_empty());
        assert!(directory.list_users().unwrap().is_empty());
    }
}
