use clap::{Args, Subcommand};
use placement::error::{AppError, Entity, ErrorKind, PlacementError};
use placement::identity::{CredentialHasher, Role, UserId};
use placement::storage::PlacementRepository;
use placement::workflows::placement::{
    ApplicationId, InternshipId, InternshipView, PlacementApi, WorkflowAction,
};
use tracing::{debug, error};

#[derive(Subcommand, Debug)]
pub(crate) enum UserCommand {
    /// Create a user (role defaults to student)
    Create {
        username: String,
        password: String,
        role: Option<String>,
    },
    /// List every user
    List,
}

#[derive(Subcommand, Debug)]
pub(crate) enum InternshipCommand {
    /// Post an internship on behalf of an employer
    Create {
        employer_id: i64,
        title: String,
        description: Option<String>,
    },
    /// List every internship
    List,
    /// List the internships posted by one employer
    Employer { employer_id: i64 },
}

#[derive(Subcommand, Debug)]
pub(crate) enum ApplicationCommand {
    /// Apply a student to an internship
    Create { student_id: i64, internship_id: i64 },
    /// Shortlist an application (staff only)
    Shortlist { application_id: i64, staff_id: i64 },
    /// Accept an application (owning employer only)
    Accept {
        application_id: i64,
        employer_id: i64,
    },
    /// Reject an application (owning employer only)
    Reject {
        application_id: i64,
        employer_id: i64,
    },
    /// List every application
    List,
    /// List the applications of one student
    Student { student_id: i64 },
}

#[derive(Args, Debug, Default)]
pub(crate) struct InitArgs {
    /// Recreate the tables without seeding the default accounts
    #[arg(long)]
    pub(crate) empty: bool,
}

const INVALID_ROLE: &str = "Invalid role. Must be one of: student, staff, employer";

/// Turn a workflow outcome into one console line. Storage and hashing failures
/// become an `Error ...` line; every other failure becomes the rejection line.
fn settle<T>(
    result: Result<T, PlacementError>,
    context: &str,
    success: impl FnOnce(T) -> String,
    rejection: impl FnOnce(&PlacementError) -> String,
) -> String {
    match result {
        Ok(value) => success(value),
        Err(err) if err.kind() == ErrorKind::Internal => {
            error!(error = %err, context, "command failed");
            format!("Error {context}: {err}")
        }
        Err(err) => {
            debug!(error = %err, context, "command rejected");
            rejection(&err)
        }
    }
}

pub(crate) fn run_user<R, H>(api: &PlacementApi<R, H>, command: UserCommand) -> Vec<String>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    match command {
        UserCommand::Create {
            username,
            password,
            role,
        } => {
            let role = match role.as_deref().map(str::parse::<Role>) {
                Some(Ok(role)) => role,
                Some(Err(_)) => return vec![INVALID_ROLE.to_string()],
                None => Role::default(),
            };
            vec![settle(
                api.users.create_user(&username, &password, role),
                "creating user",
                |user| format!("User {} ({}) created!", user.username, user.role),
                |err| format!("Error creating user: {err}"),
            )]
        }
        UserCommand::List => match api.users.list_users() {
            Ok(users) if users.is_empty() => vec!["No users found.".to_string()],
            Ok(users) => users
                .iter()
                .map(|user| format!("{}: {} ({})", user.id, user.username, user.role))
                .collect(),
            Err(err) => {
                error!(error = %err, "listing users failed");
                vec![format!("Error listing users: {err}")]
            }
        },
    }
}

pub(crate) fn run_internship<R, H>(
    api: &PlacementApi<R, H>,
    command: InternshipCommand,
) -> Vec<String>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    match command {
        InternshipCommand::Create {
            employer_id,
            title,
            description,
        } => vec![settle(
            api.placement
                .create_internship(&title, description.as_deref(), UserId(employer_id)),
            "creating internship",
            |internship| format!("Internship '{}' created successfully!", internship.title),
            |err| match err {
                PlacementError::NotFound {
                    entity: Entity::User,
                    id,
                } => format!("User {id} not found"),
                PlacementError::WrongRole { .. } => {
                    "Cannot create internship. Only employers can post internships.".to_string()
                }
                other => format!("Error creating internship: {other}"),
            },
        )],
        InternshipCommand::List => internship_lines(api.placement.list_internships(), None),
        InternshipCommand::Employer { employer_id } => internship_lines(
            api.placement.employer_internships(UserId(employer_id)),
            Some(employer_id),
        ),
    }
}

fn internship_lines(
    result: Result<Vec<InternshipView>, PlacementError>,
    employer_id: Option<i64>,
) -> Vec<String> {
    let views = match result {
        Ok(views) => views,
        Err(err) => {
            error!(error = %err, "listing internships failed");
            return vec![format!("Error listing internships: {err}")];
        }
    };
    if views.is_empty() {
        return vec![match employer_id {
            Some(id) => format!("No internships found for employer {id}"),
            None => "No internships found.".to_string(),
        }];
    }

    let mut lines = Vec::with_capacity(views.len() * 2);
    for view in views {
        lines.push(format!(
            "{}: {} - Employer: {}",
            view.id, view.title, view.employer_id
        ));
        if let Some(description) = view.description.as_deref() {
            lines.push(format!("   Description: {description}"));
        }
    }
    lines
}

pub(crate) fn run_application<R, H>(
    api: &PlacementApi<R, H>,
    command: ApplicationCommand,
) -> Vec<String>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    match command {
        ApplicationCommand::Create {
            student_id,
            internship_id,
        } => vec![settle(
            api.placement
                .create_application(UserId(student_id), InternshipId(internship_id)),
            "creating application",
            |_| format!("Application created! Student {student_id} → Internship {internship_id}"),
            |_| "Cannot create application. Make sure the user is a student and the internship exists."
                .to_string(),
        )],
        ApplicationCommand::Shortlist {
            application_id,
            staff_id,
        } => vec![transition(api, application_id, staff_id, WorkflowAction::Shortlist)],
        ApplicationCommand::Accept {
            application_id,
            employer_id,
        } => vec![transition(api, application_id, employer_id, WorkflowAction::Accept)],
        ApplicationCommand::Reject {
            application_id,
            employer_id,
        } => vec![transition(api, application_id, employer_id, WorkflowAction::Reject)],
        ApplicationCommand::List => match api.placement.list_applications() {
            Ok(views) if views.is_empty() => vec!["No applications found.".to_string()],
            Ok(views) => views
                .iter()
                .map(|view| {
                    format!(
                        "{}: {} → {} | Status: {}",
                        view.id,
                        view.student_label(),
                        view.internship_label(),
                        view.status
                    )
                })
                .collect(),
            Err(err) => {
                error!(error = %err, "listing applications failed");
                vec![format!("Error listing applications: {err}")]
            }
        },
        ApplicationCommand::Student { student_id } => {
            match api.placement.student_applications(UserId(student_id)) {
                Ok(views) if views.is_empty() => {
                    vec![format!("No applications found for student {student_id}")]
                }
                Ok(views) => {
                    let mut lines = vec![format!("Applications for student {student_id}:")];
                    lines.extend(views.iter().map(|view| {
                        format!(
                            "  {}: {} | {} | Status: {}",
                            view.id,
                            view.internship_label(),
                            view.student_label(),
                            view.status
                        )
                    }));
                    lines
                }
                Err(err) => {
                    error!(error = %err, "listing applications failed");
                    vec![format!("Error listing applications: {err}")]
                }
            }
        }
    }
}

fn transition<R, H>(
    api: &PlacementApi<R, H>,
    application_id: i64,
    actor_id: i64,
    action: WorkflowAction,
) -> String
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let (done, actor, refusal) = match action {
        WorkflowAction::Shortlist => (
            "shortlisted",
            "Staff",
            "Cannot shortlist application. Only staff can shortlist valid applications.",
        ),
        WorkflowAction::Accept => (
            "accepted",
            "Employer",
            "Cannot accept application. Only the employer who owns the internship can accept.",
        ),
        WorkflowAction::Reject => (
            "rejected",
            "Employer",
            "Cannot reject application. Only the employer who owns the internship can reject.",
        ),
    };

    settle(
        api.placement
            .transition(ApplicationId(application_id), UserId(actor_id), action),
        "updating application",
        |_| format!("Application {application_id} {done} by {actor} {actor_id}"),
        |err| match err {
            PlacementError::Validation(invalid) => {
                format!("Cannot {action} application {application_id}: {invalid}")
            }
            _ => refusal.to_string(),
        },
    )
}

/// Drop and recreate every table, then seed the default accounts unless asked not to.
pub(crate) fn run_init<R, H>(
    api: &PlacementApi<R, H>,
    args: InitArgs,
) -> Result<Vec<String>, AppError>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let seeded = api.users.reinitialize(!args.empty)?;
    Ok(vec![if seeded.is_empty() {
        "Database initialized".to_string()
    } else {
        "Database initialized with default users".to_string()
    }])
}
