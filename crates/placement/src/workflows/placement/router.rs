use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{ApplicationId, InternshipId};
use super::service::PlacementService;
use super::transitions::WorkflowAction;
use super::views::{ApplicationView, InternshipView};
use crate::error::PlacementError;
use crate::identity::{CredentialHasher, Role, UserDirectory, UserId, UserView};
use crate::storage::PlacementRepository;

/// Both services behind the HTTP read-model, sharing one repository.
pub struct PlacementApi<R, H> {
    pub users: UserDirectory<R, H>,
    pub placement: PlacementService<R>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInternshipRequest {
    pub employer_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub student_id: UserId,
    pub internship_id: InternshipId,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub actor_id: UserId,
}

type ApiResult<T> = Result<(StatusCode, Json<T>), PlacementError>;

/// Router builder exposing users, internships, and the application workflow.
pub fn placement_router<R, H>(api: Arc<PlacementApi<R, H>>) -> Router
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    Router::new()
        .route(
            "/api/v1/users",
            post(create_user_handler::<R, H>).get(list_users_handler::<R, H>),
        )
        .route(
            "/api/v1/internships",
            post(create_internship_handler::<R, H>).get(list_internships_handler::<R, H>),
        )
        .route(
            "/api/v1/internships/:internship_id",
            get(internship_handler::<R, H>),
        )
        .route(
            "/api/v1/employers/:employer_id/internships",
            get(employer_internships_handler::<R, H>),
        )
        .route(
            "/api/v1/applications",
            post(create_application_handler::<R, H>).get(list_applications_handler::<R, H>),
        )
        .route(
            "/api/v1/students/:student_id/applications",
            get(student_applications_handler::<R, H>),
        )
        .route(
            "/api/v1/applications/:application_id/shortlist",
            post(shortlist_handler::<R, H>),
        )
        .route(
            "/api/v1/applications/:application_id/accept",
            post(accept_handler::<R, H>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<R, H>),
        )
        .with_state(api)
}

pub(crate) async fn create_user_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<UserView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let role = match request.role.as_deref() {
        Some(raw) => raw.parse::<Role>()?,
        None => Role::default(),
    };
    let user = api
        .users
        .create_user(&request.username, &request.password, role)?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

pub(crate) async fn list_users_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
) -> ApiResult<Vec<UserView>>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let users = api.users.list_users()?;
    Ok((StatusCode::OK, Json(users.iter().map(|user| user.view()).collect())))
}

pub(crate) async fn create_internship_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Json(request): Json<CreateInternshipRequest>,
) -> ApiResult<InternshipView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let internship = api.placement.create_internship(
        &request.title,
        request.description.as_deref(),
        request.employer_id,
    )?;
    let view = api.placement.internship_view(internship.id)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn list_internships_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
) -> ApiResult<Vec<InternshipView>>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    Ok((StatusCode::OK, Json(api.placement.list_internships()?)))
}

pub(crate) async fn internship_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(internship_id): Path<i64>,
) -> ApiResult<InternshipView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let view = api.placement.internship_view(InternshipId(internship_id))?;
    Ok((StatusCode::OK, Json(view)))
}

pub(crate) async fn employer_internships_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(employer_id): Path<i64>,
) -> ApiResult<Vec<InternshipView>>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let views = api.placement.employer_internships(UserId(employer_id))?;
    Ok((StatusCode::OK, Json(views)))
}

pub(crate) async fn create_application_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Json(request): Json<CreateApplicationRequest>,
) -> ApiResult<ApplicationView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let application = api
        .placement
        .create_application(request.student_id, request.internship_id)?;
    let view = api.placement.application_view(application.id)?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn list_applications_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
) -> ApiResult<Vec<ApplicationView>>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    Ok((StatusCode::OK, Json(api.placement.list_applications()?)))
}

pub(crate) async fn student_applications_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(student_id): Path<i64>,
) -> ApiResult<Vec<ApplicationView>>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let views = api.placement.student_applications(UserId(student_id))?;
    Ok((StatusCode::OK, Json(views)))
}

pub(crate) async fn shortlist_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(application_id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<ApplicationView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    apply_action(&api, application_id, request, WorkflowAction::Shortlist)
}

pub(crate) async fn accept_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(application_id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<ApplicationView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    apply_action(&api, application_id, request, WorkflowAction::Accept)
}

pub(crate) async fn reject_handler<R, H>(
    State(api): State<Arc<PlacementApi<R, H>>>,
    Path(application_id): Path<i64>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<ApplicationView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    apply_action(&api, application_id, request, WorkflowAction::Reject)
}

fn apply_action<R, H>(
    api: &PlacementApi<R, H>,
    application_id: i64,
    request: TransitionRequest,
    action: WorkflowAction,
) -> ApiResult<ApplicationView>
where
    R: PlacementRepository + 'static,
    H: CredentialHasher + 'static,
{
    let application =
        api.placement
            .transition(ApplicationId(application_id), request.actor_id, action)?;
    let view = api.placement.application_view(application.id)?;
    Ok((StatusCode::OK, Json(view)))
}
