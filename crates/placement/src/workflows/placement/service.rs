use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Internship, InternshipId, NewApplication,
    NewInternship, MAX_TITLE_LEN,
};
use super::transitions::{TransitionPolicy, WorkflowAction};
use super::views::{ApplicationView, InternshipView};
use crate::error::{Entity, PlacementError, ValidationError};
use crate::identity::{Role, User, UserId};
use crate::storage::{ApplicationFilter, InternshipFilter, PlacementRepository};

/// Internship postings and the application status workflow.
///
/// Every operation loads what it needs from the repository, checks the actor's
/// role (and ownership for employer actions), and performs at most one write.
pub struct PlacementService<R> {
    repository: Arc<R>,
    policy: TransitionPolicy,
}

impl<R> PlacementService<R>
where
    R: PlacementRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_policy(repository, TransitionPolicy::default())
    }

    pub fn with_policy(repository: Arc<R>, policy: TransitionPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Post a new internship on behalf of an employer. Title and description are
    /// stored exactly as given.
    pub fn create_internship(
        &self,
        title: &str,
        description: Option<&str>,
        employer_id: UserId,
    ) -> Result<Internship, PlacementError> {
        let employer = self.require_actor(employer_id, Role::Employer)?;

        if title.trim().is_empty() {
            return Err(ValidationError::BlankTitle.into());
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TitleTooLong { max: MAX_TITLE_LEN }.into());
        }
        let description = description.map(str::to_string);

        let internship = self.repository.insert_internship(NewInternship {
            employer_id: employer.id,
            title: title.to_string(),
            description,
            is_active: true,
            created_at: Utc::now(),
        })?;

        info!(
            internship_id = internship.id.0,
            employer_id = employer.id.0,
            "internship created"
        );
        Ok(internship)
    }

    pub fn get_internship(&self, id: InternshipId) -> Result<Internship, PlacementError> {
        self.repository
            .fetch_internship(id)?
            .ok_or_else(|| PlacementError::not_found(Entity::Internship, id.0))
    }

    pub fn internship_view(&self, id: InternshipId) -> Result<InternshipView, PlacementError> {
        let internship = self.get_internship(id)?;
        let employer = self.repository.fetch_user(internship.employer_id)?;
        Ok(InternshipView::new(&internship, employer.as_ref()))
    }

    pub fn list_internships(&self) -> Result<Vec<InternshipView>, PlacementError> {
        self.internship_views(InternshipFilter::default())
    }

    pub fn employer_internships(
        &self,
        employer_id: UserId,
    ) -> Result<Vec<InternshipView>, PlacementError> {
        self.internship_views(InternshipFilter {
            employer_id: Some(employer_id),
        })
    }

    /// Student applies to an internship; the application starts out pending.
    pub fn create_application(
        &self,
        student_id: UserId,
        internship_id: InternshipId,
    ) -> Result<Application, PlacementError> {
        let student = self.require_actor(student_id, Role::Student)?;
        let internship = self.get_internship(internship_id)?;

        let application = self.repository.insert_application(NewApplication {
            student_id: student.id,
            internship_id: internship.id,
            status: ApplicationStatus::Pending,
        })?;

        info!(
            application_id = application.id.0,
            student_id = student.id.0,
            internship_id = internship.id.0,
            "application submitted"
        );
        Ok(application)
    }

    pub fn shortlist_application(
        &self,
        application_id: ApplicationId,
        staff_id: UserId,
    ) -> Result<Application, PlacementError> {
        self.transition(application_id, staff_id, WorkflowAction::Shortlist)
    }

    pub fn accept_application(
        &self,
        application_id: ApplicationId,
        employer_id: UserId,
    ) -> Result<Application, PlacementError> {
        self.transition(application_id, employer_id, WorkflowAction::Accept)
    }

    pub fn reject_application(
        &self,
        application_id: ApplicationId,
        employer_id: UserId,
    ) -> Result<Application, PlacementError> {
        self.transition(application_id, employer_id, WorkflowAction::Reject)
    }

    /// Apply a workflow action as a single read-modify-write. Guards run before the
    /// write, so a failed transition leaves the stored status untouched.
    pub fn transition(
        &self,
        application_id: ApplicationId,
        actor_id: UserId,
        action: WorkflowAction,
    ) -> Result<Application, PlacementError> {
        let mut application = self.get_application(application_id)?;
        let actor = self.require_actor(actor_id, action.required_role())?;

        if action.requires_ownership() {
            let internship = self.get_internship(application.internship_id)?;
            if internship.employer_id != actor.id {
                warn!(
                    application_id = application.id.0,
                    actor_id = actor.id.0,
                    owner_id = internship.employer_id.0,
                    %action,
                    "ownership guard rejected transition"
                );
                return Err(PlacementError::NotOwner {
                    employer: actor.id,
                    internship: internship.id,
                });
            }
        }

        let previous = application.status;
        let target = action.target();
        self.policy.check(previous, target)?;

        application.status = target;
        self.repository.update_application(application.clone())?;

        info!(
            application_id = application.id.0,
            actor_id = actor.id.0,
            from = %previous,
            to = %target,
            "application status changed"
        );
        Ok(application)
    }

    pub fn get_application(&self, id: ApplicationId) -> Result<Application, PlacementError> {
        self.repository
            .fetch_application(id)?
            .ok_or_else(|| PlacementError::not_found(Entity::Application, id.0))
    }

    pub fn application_view(&self, id: ApplicationId) -> Result<ApplicationView, PlacementError> {
        let application = self.get_application(id)?;
        let mut views = self.enrich_applications(vec![application])?;
        views
            .pop()
            .ok_or_else(|| PlacementError::not_found(Entity::Application, id.0))
    }

    pub fn list_applications(&self) -> Result<Vec<ApplicationView>, PlacementError> {
        let applications = self.repository.applications(ApplicationFilter::default())?;
        self.enrich_applications(applications)
    }

    pub fn student_applications(
        &self,
        student_id: UserId,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        let applications = self.repository.applications(ApplicationFilter {
            student_id: Some(student_id),
            ..ApplicationFilter::default()
        })?;
        self.enrich_applications(applications)
    }

    fn require_actor(&self, id: UserId, required: Role) -> Result<User, PlacementError> {
        let user = self
            .repository
            .fetch_user(id)?
            .ok_or_else(|| PlacementError::not_found(Entity::User, id.0))?;

        if user.role != required {
            warn!(actor_id = id.0, actual = %user.role, %required, "actor role rejected");
            return Err(PlacementError::WrongRole {
                actor: id,
                required,
                actual: user.role,
            });
        }
        Ok(user)
    }

    fn internship_views(
        &self,
        filter: InternshipFilter,
    ) -> Result<Vec<InternshipView>, PlacementError> {
        let internships = self.repository.internships(filter)?;
        let mut users = UserCache::new(self.repository.as_ref());

        internships
            .iter()
            .map(|internship| {
                let employer = users.get(internship.employer_id)?;
                Ok(InternshipView::new(internship, employer))
            })
            .collect()
    }

    fn enrich_applications(
        &self,
        applications: Vec<Application>,
    ) -> Result<Vec<ApplicationView>, PlacementError> {
        let mut users = UserCache::new(self.repository.as_ref());
        let mut internships: HashMap<InternshipId, Option<Internship>> = HashMap::new();

        let mut views = Vec::with_capacity(applications.len());
        for application in &applications {
            if !internships.contains_key(&application.internship_id) {
                let fetched = self.repository.fetch_internship(application.internship_id)?;
                internships.insert(application.internship_id, fetched);
            }
            let internship = internships
                .get(&application.internship_id)
                .and_then(Option::as_ref);
            let student = users.get(application.student_id)?;
            views.push(ApplicationView::new(application, student, internship));
        }
        Ok(views)
    }
}

/// Per-call lookup cache so listings resolve each referenced user once.
struct UserCache<'a, R> {
    repository: &'a R,
    users: HashMap<UserId, Option<User>>,
}

impl<'a, R: PlacementRepository> UserCache<'a, R> {
    fn new(repository: &'a R) -> Self {
        Self {
            repository,
            users: HashMap::new(),
        }
    }

    fn get(&mut self, id: UserId) -> Result<Option<&User>, PlacementError> {
        if !self.users.contains_key(&id) {
            let fetched = self.repository.fetch_user(id)?;
            self.users.insert(id, fetched);
        }
        Ok(self.users.get(&id).and_then(Option::as_ref))
    }
}
