//! User account handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CommissionListResponse, CreateUserRequest, PaginationParams};
use crate::app_state::AppState;
use crate::domain::{Account, UserId};
use crate::error::{ErrorResponse, LedgerError};
use crate::service::NewAccount;

/// `POST /users`: Create a user.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for invalid fields or an unknown
/// referral code.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Create a user",
    description = "Creates a user record. A referral code links the new user to the referrer who will earn commissions on their payments.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = Account),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let account = state
        .account_service
        .create_account(NewAccount {
            name: req.name,
            email: req.email,
            role: req.role,
            referral_code: req.referral_code,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /users/{id}`: User record with balances.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Get a user",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "User record", body = Account),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<Account>, LedgerError> {
    let account = state
        .account_service
        .get_account(UserId::from_uuid(id))
        .await?;
    Ok(Json(account))
}

/// `GET /users/{id}/commissions`: Commissions earned by a user.
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/commissions",
    tag = "Users",
    summary = "List earned commissions",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        PaginationParams,
    ),
    responses(
        (status = 200, description = "Commission records, newest first", body = CommissionListResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn list_user_commissions(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<CommissionListResponse>, LedgerError> {
    let records = state
        .account_service
        .commissions_for(UserId::from_uuid(id))
        .await?;
    let (data, pagination) = params.paginate(records);
    Ok(Json(CommissionListResponse { data, pagination }))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/commissions", get(list_user_commissions))
}
