use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, ApplicationStatus, Internship, InternshipId};
use crate::identity::{User, UserId};

/// Flat read-model of a posting with the employer's username resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternshipView {
    pub id: InternshipId,
    pub title: String,
    pub description: Option<String>,
    pub employer_id: UserId,
    pub employer_username: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl InternshipView {
    pub fn new(internship: &Internship, employer: Option<&User>) -> Self {
        Self {
            id: internship.id,
            title: internship.title.clone(),
            description: internship.description.clone(),
            employer_id: internship.employer_id,
            employer_username: employer.map(|user| user.username.clone()),
            is_active: internship.is_active,
            created_at: internship.created_at,
        }
    }
}

/// Flat read-model of an application with student and posting names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub student_id: UserId,
    pub internship_id: InternshipId,
    pub status: ApplicationStatus,
    pub student_name: Option<String>,
    pub internship_title: Option<String>,
}

impl ApplicationView {
    pub fn new(
        application: &Application,
        student: Option<&User>,
        internship: Option<&Internship>,
    ) -> Self {
        Self {
            id: application.id,
            student_id: application.student_id,
            internship_id: application.internship_id,
            status: application.status,
            student_name: student.map(|user| user.username.clone()),
            internship_title: internship.map(|posting| posting.title.clone()),
        }
    }

    /// Student name for display, falling back to the raw id.
    pub fn student_label(&self) -> String {
        self.student_name
            .clone()
            .unwrap_or_else(|| format!("Student {}", self.student_id))
    }

    /// Internship title for display, falling back to the raw id.
    pub fn internship_label(&self) -> String {
        self.internship_title
            .clone()
            .unwrap_or_else(|| format!("Internship {}", self.internship_id))
    }
}
