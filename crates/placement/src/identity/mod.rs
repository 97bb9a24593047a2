//! Users, their role tags, and the credential hashing capability.

mod credentials;
mod directory;
pub mod domain;

pub use credentials::{Argon2Hasher, CredentialError, CredentialHasher};
pub use directory::{UserDirectory, DEFAULT_ACCOUNTS};
pub use domain::{NewUser, Role, UnknownRole, User, UserId, UserView};
