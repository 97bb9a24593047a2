use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::identity::{
    CredentialError, CredentialHasher, NewUser, Role, User, UserDirectory, UserId,
};
use crate::storage::{
    ApplicationFilter, InternshipFilter, MemoryStore, PlacementRepository, RepositoryError,
};
use crate::workflows::placement::domain::{
    Application, ApplicationId, Internship, InternshipId, NewApplication, NewInternship,
};
use crate::workflows::placement::{
    placement_router, PlacementApi, PlacementService, TransitionPolicy,
};

/// Deterministic hasher that skips the Argon2 work factor so fixtures stay fast.
#[derive(Default)]
pub(super) struct PlainHasher;

fn reversed(plaintext: &str) -> String {
    format!("rev${}", plaintext.chars().rev().collect::<String>())
}

impl CredentialHasher for PlainHasher {
    fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        Ok(reversed(plaintext))
    }

    fn verify(&self, plaintext: &str, digest: &str) -> bool {
        digest == reversed(plaintext)
    }
}

/// Store seeded with one user per role, a second employer, and one posting.
pub(super) struct Fixture {
    pub(super) store: Arc<MemoryStore>,
    pub(super) service: PlacementService<MemoryStore>,
    pub(super) student: User,
    pub(super) staff: User,
    pub(super) employer: User,
    pub(super) other_employer: User,
    pub(super) internship: Internship,
}

impl Fixture {
    pub(super) fn application_count(&self) -> usize {
        self.store
            .applications(ApplicationFilter::default())
            .expect("list applications")
            .len()
    }

    pub(super) fn internship_count(&self) -> usize {
        self.store
            .internships(InternshipFilter::default())
            .expect("list internships")
            .len()
    }

    pub(super) fn stored_status(
        &self,
        id: ApplicationId,
    ) -> crate::workflows::placement::ApplicationStatus {
        self.store
            .fetch_application(id)
            .expect("fetch succeeds")
            .expect("application present")
            .status
    }

    pub(super) fn apply(&self) -> Application {
        self.service
            .create_application(self.student.id, self.internship.id)
            .expect("student can apply")
    }
}

pub(super) fn build_fixture() -> Fixture {
    build_fixture_with_policy(TransitionPolicy::Permissive)
}

pub(super) fn build_fixture_with_policy(policy: TransitionPolicy) -> Fixture {
    let store = Arc::new(MemoryStore::default());
    let directory = UserDirectory::new(store.clone(), Arc::new(PlainHasher));
    let student = directory
        .create_user("student1", "pass", Role::Student)
        .expect("student");
    let staff = directory
        .create_user("staff1", "pass", Role::Staff)
        .expect("staff");
    let employer = directory
        .create_user("employer1", "pass", Role::Employer)
        .expect("employer");
    let other_employer = directory
        .create_user("employer2", "pass", Role::Employer)
        .expect("second employer");

    let service = PlacementService::with_policy(store.clone(), policy);
    let internship = service
        .create_internship(
            "Platform engineering intern",
            Some("Help run the campus job board"),
            employer.id,
        )
        .expect("internship");

    Fixture {
        store,
        service,
        student,
        staff,
        employer,
        other_employer,
        internship,
    }
}

pub(super) fn build_api() -> (Arc<PlacementApi<MemoryStore, PlainHasher>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let api = Arc::new(PlacementApi {
        users: UserDirectory::new(store.clone(), Arc::new(PlainHasher)),
        placement: PlacementService::new(store.clone()),
    });
    (api, store)
}

pub(super) fn router_with_api(api: Arc<PlacementApi<MemoryStore, PlainHasher>>) -> axum::Router {
    placement_router(api)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Repository whose backing database is gone.
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PlacementRepository for UnavailableRepository {
    fn insert_user(&self, _user: NewUser) -> Result<User, RepositoryError> {
        offline()
    }

    fn fetch_user(&self, _id: UserId) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn find_user_by_username(&self, _username: &str) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        offline()
    }

    fn insert_internship(
        &self,
        _internship: NewInternship,
    ) -> Result<Internship, RepositoryError> {
        offline()
    }

    fn fetch_internship(&self, _id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        offline()
    }

    fn internships(&self, _filter: InternshipFilter) -> Result<Vec<Internship>, RepositoryError> {
        offline()
    }

    fn insert_application(
        &self,
        _application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        offline()
    }

    fn fetch_application(
        &self,
        _id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        offline()
    }

    fn applications(
        &self,
        _filter: ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        offline()
    }

    fn update_application(&self, _application: Application) -> Result<(), RepositoryError> {
        offline()
    }

    fn reset(&self) -> Result<(), RepositoryError> {
        offline()
    }
}
