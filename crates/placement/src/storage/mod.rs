//! Record store shared by the identity directory and the placement workflow.
//!
//! Services only see the [`PlacementRepository`] trait; the concrete stores are an
//! in-memory map for tests and demos and a SQLite database for the CLI and HTTP
//! service.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::identity::{NewUser, User, UserId};
use crate::workflows::placement::domain::{
    Application, ApplicationId, Internship, InternshipId, NewApplication, NewInternship,
};

/// Exact-match filter over internships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternshipFilter {
    pub employer_id: Option<UserId>,
}

impl InternshipFilter {
    pub fn matches(&self, internship: &Internship) -> bool {
        self.employer_id
            .map_or(true, |employer_id| internship.employer_id == employer_id)
    }
}

/// Exact-match filter over applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub student_id: Option<UserId>,
    pub internship_id: Option<InternshipId>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.student_id
            .map_or(true, |student_id| application.student_id == student_id)
            && self
                .internship_id
                .map_or(true, |internship_id| application.internship_id == internship_id)
    }
}

/// Storage abstraction so services can be exercised in isolation.
///
/// Listings come back in ascending id order. Each call is its own unit of work.
pub trait PlacementRepository: Send + Sync {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    fn users(&self) -> Result<Vec<User>, RepositoryError>;

    fn insert_internship(&self, internship: NewInternship)
        -> Result<Internship, RepositoryError>;
    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError>;
    fn internships(&self, filter: InternshipFilter) -> Result<Vec<Internship>, RepositoryError>;

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError>;
    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn applications(&self, filter: ApplicationFilter)
        -> Result<Vec<Application>, RepositoryError>;
    /// Persist an application's status. The student and internship references are
    /// fixed at insert time and are not rewritten. Fails with `NotFound` for unknown ids.
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;

    /// Drop every record and restart id assignment.
    fn reset(&self) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored record is corrupt: {0}")]
    Corrupt(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
