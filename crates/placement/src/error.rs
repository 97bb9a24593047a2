use crate::config::ConfigError;
use crate::identity::{CredentialError, Role, UnknownRole, UserId};
use crate::storage::RepositoryError;
use crate::telemetry::TelemetryError;
use crate::workflows::placement::domain::{ApplicationStatus, InternshipId};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Record kinds named in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Internship,
    Application,
}

impl Entity {
    pub const fn label(self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Internship => "internship",
            Entity::Application => "application",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Malformed input rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("username must not be blank")]
    BlankUsername,
    #[error("username must be at most {max} characters")]
    UsernameTooLong { max: usize },
    #[error("password must not be blank")]
    BlankPassword,
    #[error("internship title must not be blank")]
    BlankTitle,
    #[error("internship title must be at most {max} characters")]
    TitleTooLong { max: usize },
    #[error("application cannot move from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

/// Coarse classification used by the CLI and HTTP boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Conflict,
    Internal,
}

/// Failure of an identity or placement operation. Nothing is persisted when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },
    #[error("user {actor} is a {actual}, but this action requires a {required}")]
    WrongRole {
        actor: UserId,
        required: Role,
        actual: Role,
    },
    #[error("employer {employer} does not own internship {internship}")]
    NotOwner {
        employer: UserId,
        internship: InternshipId,
    },
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl PlacementError {
    pub(crate) fn not_found(entity: Entity, id: impl Into<i64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlacementError::NotFound { .. } => ErrorKind::NotFound,
            PlacementError::WrongRole { .. }
            | PlacementError::NotOwner { .. }
            | PlacementError::InvalidCredentials => ErrorKind::Forbidden,
            PlacementError::Validation(_) => ErrorKind::Validation,
            PlacementError::Repository(RepositoryError::Conflict) => ErrorKind::Conflict,
            PlacementError::Repository(RepositoryError::NotFound) => ErrorKind::NotFound,
            PlacementError::Repository(_) | PlacementError::Credential(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UnknownRole> for PlacementError {
    fn from(value: UnknownRole) -> Self {
        Self::Validation(value.into())
    }
}

impl IntoResponse for PlacementError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

/// Process-level failures surfaced by the binaries.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Storage(RepositoryError),
    Placement(PlacementError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Placement(err) => write!(f, "placement error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Placement(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Storage(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Storage(RepositoryError::Conflict) => StatusCode::CONFLICT,
            AppError::Placement(ref err) => err.status_code(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<PlacementError> for AppError {
    fn from(value: PlacementError) -> Self {
        match value {
            PlacementError::Repository(err) => Self::Storage(err),
            other => Self::Placement(other),
        }
    }
}
