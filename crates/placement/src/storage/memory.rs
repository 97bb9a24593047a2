use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ApplicationFilter, InternshipFilter, PlacementRepository, RepositoryError};
use crate::identity::{NewUser, User, UserId};
use crate::workflows::placement::domain::{
    Application, ApplicationId, Internship, InternshipId, NewApplication, NewInternship,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    internships: BTreeMap<InternshipId, Internship>,
    applications: BTreeMap<ApplicationId, Application>,
    last_user_id: i64,
    last_internship_id: i64,
    last_application_id: i64,
}

/// Process-local store. Cloning shares the same tables.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store mutex poisoned".to_string()))
    }
}

impl PlacementRepository for MemoryStore {
    fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.lock()?;
        if tables
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(RepositoryError::Conflict);
        }
        tables.last_user_id += 1;
        let record = User {
            id: UserId(tables.last_user_id),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn insert_internship(
        &self,
        internship: NewInternship,
    ) -> Result<Internship, RepositoryError> {
        let mut tables = self.lock()?;
        tables.last_internship_id += 1;
        let record = Internship {
            id: InternshipId(tables.last_internship_id),
            employer_id: internship.employer_id,
            title: internship.title,
            description: internship.description,
            is_active: internship.is_active,
            created_at: internship.created_at,
        };
        tables.internships.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch_internship(&self, id: InternshipId) -> Result<Option<Internship>, RepositoryError> {
        Ok(self.lock()?.internships.get(&id).cloned())
    }

    fn internships(&self, filter: InternshipFilter) -> Result<Vec<Internship>, RepositoryError> {
        Ok(self
            .lock()?
            .internships
            .values()
            .filter(|internship| filter.matches(internship))
            .cloned()
            .collect())
    }

    fn insert_application(
        &self,
        application: NewApplication,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock()?;
        tables.last_application_id += 1;
        let record = Application {
            id: ApplicationId(tables.last_application_id),
            student_id: application.student_id,
            internship_id: application.internship_id,
            status: application.status,
        };
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn applications(
        &self,
        filter: ApplicationFilter,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| filter.matches(application))
            .cloned()
            .collect())
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.applications.get_mut(&application.id) {
            Some(slot) => {
                slot.status = application.status;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn reset(&self) -> Result<(), RepositoryError> {
        *self.lock()? = Tables::default();
        Ok(())
    }
}
