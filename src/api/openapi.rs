//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto;
use super::handlers;
use crate::domain;
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::{PaymentDisposition, PaymentOutcome};

/// Generated OpenAPI description, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "credit-ledger",
        description = "Payment webhooks, credit ledger, referral commissions, leads and withdrawals."
    ),
    paths(
        handlers::webhook::receive_payment,
        handlers::accounts::create_user,
        handlers::accounts::get_user,
        handlers::accounts::list_user_commissions,
        handlers::leads::list_leads,
        handlers::leads::unlock_lead,
        handlers::proposals::create_proposal,
        handlers::proposals::list_proposals,
        handlers::proposals::update_proposal_status,
        handlers::withdrawals::request_withdrawal,
        handlers::withdrawals::list_withdrawals,
        handlers::admin::update_permissions,
        handlers::admin::adjust_balance,
        handlers::admin::create_lead,
        handlers::admin::list_withdrawals,
        handlers::admin::update_withdrawal_status,
        handlers::admin::list_commissions,
        handlers::system::health_handler,
        handlers::system::credit_packages_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        PaymentOutcome,
        PaymentDisposition,
        domain::PaymentEvent,
        domain::PaymentRecord,
        domain::Account,
        domain::CommissionRecord,
        domain::LeadView,
        domain::Proposal,
        domain::Withdrawal,
        domain::CreditPackage,
        dto::CreateUserRequest,
        dto::CreateLeadRequest,
        dto::CreateProposalRequest,
        dto::UpdateProposalStatusRequest,
        dto::CreateWithdrawalRequest,
        dto::UpdateWithdrawalStatusRequest,
        dto::UpdatePermissionsRequest,
        dto::AdjustBalanceRequest,
        dto::WithdrawalListResponse,
        dto::CommissionListResponse,
        dto::PaginationMeta,
    )),
    tags(
        (name = "Webhooks", description = "Payment provider callbacks"),
        (name = "Users", description = "User records and commissions"),
        (name = "Leads", description = "Lead catalog and unlocks"),
        (name = "Proposals", description = "Proposals to unlocked leads"),
        (name = "Withdrawals", description = "Payout requests"),
        (name = "Admin", description = "Back-office operations, require X-Admin-Key"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;
