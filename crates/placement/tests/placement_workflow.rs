//! End-to-end placement scenarios against the SQLite store through the public
//! service facade.

mod common {
    use std::sync::Arc;

    use placement::identity::{Argon2Hasher, Role, User, UserDirectory};
    use placement::storage::SqliteStore;
    use placement::workflows::placement::{PlacementService, TransitionPolicy};

    pub(super) struct Campus {
        pub(super) store: Arc<SqliteStore>,
        pub(super) directory: UserDirectory<SqliteStore, Argon2Hasher>,
        pub(super) placement: PlacementService<SqliteStore>,
    }

    impl Campus {
        pub(super) fn user(&self, username: &str, role: Role) -> User {
            self.directory
                .create_user(username, "pass", role)
                .expect("user created")
        }
    }

    pub(super) fn campus(policy: TransitionPolicy) -> Campus {
        let store = Arc::new(SqliteStore::in_memory().expect("database opens"));
        Campus {
            directory: UserDirectory::new(store.clone(), Arc::new(Argon2Hasher::default())),
            placement: PlacementService::with_policy(store.clone(), policy),
            store,
        }
    }
}

mod workflow {
    use super::common::*;
    use placement::error::PlacementError;
    use placement::identity::Role;
    use placement::storage::{ApplicationFilter, PlacementRepository};
    use placement::workflows::placement::{ApplicationStatus, TransitionPolicy};

    #[test]
    fn shortlist_then_owner_accepts() {
        let campus = campus(TransitionPolicy::Permissive);
        let s1 = campus.user("s1", Role::Student);
        let st1 = campus.user("st1", Role::Staff);
        let e1 = campus.user("e1", Role::Employer);
        let e2 = campus.user("e2", Role::Employer);

        let i1 = campus
            .placement
            .create_internship("Robotics intern", Some("ROS and Rust"), e1.id)
            .expect("e1 posts");
        let application = campus
            .placement
            .create_application(s1.id, i1.id)
            .expect("s1 applies");
        assert_eq!(application.status, ApplicationStatus::Pending);

        let shortlisted = campus
            .placement
            .shortlist_application(application.id, st1.id)
            .expect("st1 shortlists");
        assert_eq!(shortlisted.status, ApplicationStatus::Shortlisted);

        assert!(matches!(
            campus.placement.accept_application(application.id, e2.id),
            Err(PlacementError::NotOwner { .. })
        ));
        assert_eq!(
            campus
                .placement
                .get_application(application.id)
                .expect("still stored")
                .status,
            ApplicationStatus::Shortlisted
        );

        campus
            .placement
            .accept_application(application.id, e1.id)
            .expect("e1 accepts");
        let views = campus
            .placement
            .student_applications(s1.id)
            .expect("student listing");
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].status, ApplicationStatus::Accepted);
        assert_eq!(views[0].student_name.as_deref(), Some("s1"));
        assert_eq!(views[0].internship_title.as_deref(), Some("Robotics intern"));
    }

    #[test]
    fn non_student_application_leaves_store_unchanged() {
        let campus = campus(TransitionPolicy::Permissive);
        let staff = campus.user("staff1", Role::Staff);
        let employer = campus.user("employer1", Role::Employer);
        let internship = campus
            .placement
            .create_internship("Ops intern", None, employer.id)
            .expect("posted");

        for actor in [staff.id, employer.id] {
            assert!(campus
                .placement
                .create_application(actor, internship.id)
                .is_err());
        }
        let stored = campus
            .store
            .applications(ApplicationFilter::default())
            .expect("listing");
        assert!(stored.is_empty());
    }

    #[test]
    fn strict_policy_keeps_terminal_status() {
        let campus = campus(TransitionPolicy::Strict);
        let student = campus.user("student1", Role::Student);
        let employer = campus.user("employer1", Role::Employer);
        let internship = campus
            .placement
            .create_internship("Infra intern", None, employer.id)
            .expect("posted");
        let application = campus
            .placement
            .create_application(student.id, internship.id)
            .expect("applied");

        campus
            .placement
            .reject_application(application.id, employer.id)
            .expect("rejected from pending");
        assert!(campus
            .placement
            .accept_application(application.id, employer.id)
            .is_err());
        assert_eq!(
            campus
                .placement
                .get_application(application.id)
                .expect("stored")
                .status,
            ApplicationStatus::Rejected
        );
    }
}

mod persistence {
    use std::sync::Arc;

    use placement::identity::{Argon2Hasher, Role, UserDirectory};
    use placement::storage::SqliteStore;
    use placement::workflows::placement::{ApplicationStatus, PlacementService};

    #[test]
    fn records_survive_reopening_the_database() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("placement.db");

        let (internship, application) = {
            let store = Arc::new(SqliteStore::open(&path).expect("database opens"));
            let directory = UserDirectory::new(store.clone(), Arc::new(Argon2Hasher::default()));
            let placement = PlacementService::new(store);
            let student = directory
                .create_user("student1", "pass", Role::Student)
                .expect("student");
            let staff = directory
                .create_user("staff1", "pass", Role::Staff)
                .expect("staff");
            let employer = directory
                .create_user("employer1", "pass", Role::Employer)
                .expect("employer");
            let internship = placement
                .create_internship(" Kernel intern ", Some("  Scheduler work\n"), employer.id)
                .expect("posted");
            let application = placement
                .create_application(student.id, internship.id)
                .expect("applied");
            placement
                .shortlist_application(application.id, staff.id)
                .expect("shortlisted");
            (internship, application)
        };

        let store = Arc::new(SqliteStore::open(&path).expect("database reopens"));
        let directory = UserDirectory::new(store.clone(), Arc::new(Argon2Hasher::default()));
        let placement = PlacementService::new(store);

        let fetched = placement
            .get_internship(internship.id)
            .expect("internship persisted");
        assert_eq!(fetched, internship);
        assert_eq!(fetched.title, " Kernel intern ");
        assert_eq!(fetched.description.as_deref(), Some("  Scheduler work\n"));
        assert!(fetched.is_active);
        assert_eq!(
            placement
                .get_application(application.id)
                .expect("application persisted")
                .status,
            ApplicationStatus::Shortlisted
        );
        assert!(directory.verify_credentials("staff1", "pass").is_ok());
        assert!(directory.verify_credentials("staff1", "nope").is_err());

        let seeded = directory.reinitialize(true).expect("reinitialized");
        assert_eq!(seeded.len(), 3);
        assert!(placement.list_internships().expect("listing").is_empty());
        assert!(placement.list_applications().expect("listing").is_empty());
    }
}
