//! Admin panel handlers. Every route here sits behind the admin key.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    AdjustBalanceRequest, CommissionListResponse, CreateLeadRequest, PaginationParams,
    UpdatePermissionsRequest, UpdateWithdrawalStatusRequest, WithdrawalListResponse,
    WithdrawalQuery,
};
use crate::app_state::AppState;
use crate::domain::{Account, BalanceKind, Lead, UserId, Withdrawal, WithdrawalId};
use crate::error::{ErrorResponse, LedgerError};
use crate::service::NewLead;

/// `PUT /admin/users/{id}/permissions`
///
/// # Errors
///
/// Returns [`LedgerError::UserNotFound`] if the user does not exist.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/permissions",
    tag = "Admin",
    summary = "Set role and permission flags",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Updated user", body = Account),
        (status = 401, description = "Bad admin key", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn update_permissions(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdatePermissionsRequest>,
) -> Result<Json<Account>, LedgerError> {
    let account = state
        .account_service
        .set_permissions(UserId::from_uuid(id), req.role, req.permissions())
        .await?;
    Ok(Json(account))
}

/// `POST /admin/users/{id}/balance`: Manual balance adjustment.
///
/// # Errors
///
/// Returns [`LedgerError::InsufficientBalance`] if the balance would go
/// negative.
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{id}/balance",
    tag = "Admin",
    summary = "Adjust a balance",
    description = "Applies a signed adjustment with an audit reason. Defaults to the personal balance.",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    request_body = AdjustBalanceRequest,
    responses(
        (status = 200, description = "Updated user", body = Account),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Balance would go negative", body = ErrorResponse),
    )
)]
pub async fn adjust_balance(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AdjustBalanceRequest>,
) -> Result<Json<Account>, LedgerError> {
    let account = state
        .account_service
        .adjust_balance(
            UserId::from_uuid(id),
            req.balance.unwrap_or(BalanceKind::Personal),
            req.delta_cents,
            req.reason,
        )
        .await?;
    Ok(Json(account))
}

/// `POST /admin/leads`: Lead intake.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for missing fields.
#[utoipa::path(
    post,
    path = "/api/v1/admin/leads",
    tag = "Admin",
    summary = "Add a lead",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    request_body = CreateLeadRequest,
    responses(
        (status = 201, description = "Lead stored", body = serde_json::Value),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn create_lead(
    State(state): State<AppState>,
    Json(req): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let lead: Lead = state
        .lead_service
        .create_lead(NewLead {
            name: req.name,
            company: req.company,
            segment: req.segment,
            email: req.email,
            phone: req.phone,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

/// `GET /admin/withdrawals`: Withdrawal queue, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/admin/withdrawals",
    tag = "Admin",
    summary = "List withdrawals",
    params(
        WithdrawalQuery,
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    responses(
        (status = 200, description = "Withdrawal queue", body = WithdrawalListResponse),
    )
)]
pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<WithdrawalQuery>,
) -> Json<WithdrawalListResponse> {
    let list = state.withdrawal_service.list(query.status).await;
    let (data, pagination) = query.pagination().paginate(list);
    Json(WithdrawalListResponse { data, pagination })
}

/// `PUT /admin/withdrawals/{id}/status`
///
/// # Errors
///
/// Returns [`LedgerError::InvalidTransition`] for a change the status
/// table forbids.
#[utoipa::path(
    put,
    path = "/api/v1/admin/withdrawals/{id}/status",
    tag = "Admin",
    summary = "Move a withdrawal",
    description = "Allowed: pending to processing or failed, processing to done or failed. Failing a withdrawal refunds the held amount.",
    params(
        ("id" = uuid::Uuid, Path, description = "Withdrawal UUID"),
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    request_body = UpdateWithdrawalStatusRequest,
    responses(
        (status = 200, description = "Updated withdrawal", body = Withdrawal),
        (status = 404, description = "Withdrawal not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn update_withdrawal_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateWithdrawalStatusRequest>,
) -> Result<Json<Withdrawal>, LedgerError> {
    let withdrawal = state
        .withdrawal_service
        .update_status(WithdrawalId::from_uuid(id), req.status, req.reason)
        .await?;
    Ok(Json(withdrawal))
}

/// `GET /admin/commissions`: Full commission audit log.
#[utoipa::path(
    get,
    path = "/api/v1/admin/commissions",
    tag = "Admin",
    summary = "Commission audit log",
    params(
        PaginationParams,
        ("X-Admin-Key" = String, Header, description = "Admin API key"),
    ),
    responses(
        (status = 200, description = "Commission records, newest first", body = CommissionListResponse),
    )
)]
pub async fn list_commissions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Json<CommissionListResponse> {
    let records = state.account_service.all_commissions().await;
    let (data, pagination) = params.paginate(records);
    Json(CommissionListResponse { data, pagination })
}

/// Admin routes, relative to `/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}/permissions", put(update_permissions))
        .route("/users/{id}/balance", post(adjust_balance))
        .route("/leads", post(create_lead))
        .route("/withdrawals", get(list_withdrawals))
        .route("/withdrawals/{id}/status", put(update_withdrawal_status))
        .route("/commissions", get(list_commissions))
}
