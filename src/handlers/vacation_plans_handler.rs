use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    db::{PlanFilter, PlanScope},
    extractors::ActingMember,
    models::{
        CreateVacationPlanInput, EditApproversInput, Period, StageDecisionInput, VacationPlan,
        VacationPlanMutationResponse,
    },
    workflow::{StageDecision, Transition},
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetVacationPlansQuery {
    /// Plans submitted by this member
    pub member_id: Option<i32>,
    /// Plans where this member is in the approver chain
    pub approver_id: Option<i32>,
    /// With approver_id: false lists plans waiting on the approver, true lists plans already passed
    #[serde(default)]
    pub approved: bool,
    pub rejected: Option<bool>,
    pub year: i32,
    pub month: Option<u32>,
}

impl GetVacationPlansQuery {
    fn into_filter(self) -> AppResult<PlanFilter> {
        let scope = match (self.member_id, self.approver_id) {
            (Some(member_id), None) => PlanScope::Member(member_id),
            (None, Some(member_id)) => PlanScope::Approver {
                member_id,
                approved: self.approved,
            },
            _ => {
                return Err(AppError::BadRequest(
                    "Exactly one of member_id or approver_id is required".to_string(),
                ))
            }
        };

        let period = Period::from_year_month(self.year, self.month).map_err(AppError::BadRequest)?;

        Ok(PlanFilter {
            scope,
            rejected: self.rejected,
            period,
        })
    }
}

/// GET /api/vacation-plans?member_id=|approver_id=&approved=&rejected=&year=&month=
#[utoipa::path(
    get,
    path = "/api/vacation-plans",
    params(GetVacationPlansQuery),
    responses(
        (status = 200, description = "Vacation plans with leave in the period", body = Vec<VacationPlan>),
        (status = 400, description = "Missing scope or invalid period")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacation_plans(
    State(state): State<Arc<AppState>>,
    _auth: ActingMember,
    Query(query): Query<GetVacationPlansQuery>,
) -> AppResult<Json<Vec<VacationPlan>>> {
    let filter = query.into_filter()?;
    let plans = state.workflow.list_plans(&filter).await?;

    tracing::debug!(count = plans.len(), scope = ?filter.scope, "Listed vacation plans");
    Ok(Json(plans))
}

#[utoipa::path(
    get,
    path = "/api/vacation-plans/{id}",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    responses(
        (status = 200, description = "Vacation plan", body = VacationPlan),
        (status = 404, description = "Vacation plan not found")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacation_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    _auth: ActingMember,
) -> AppResult<Json<VacationPlan>> {
    Ok(Json(state.workflow.get_plan(plan_id).await?))
}

/// POST /api/vacation-plans
///
/// Submits a plan for the acting member at stage 0.
#[utoipa::path(
    post,
    path = "/api/vacation-plans",
    request_body = CreateVacationPlanInput,
    responses(
        (status = 201, description = "Vacation plan created", body = VacationPlan),
        (status = 422, description = "Empty approver chain, no leave entries or an inverted date range")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn create_vacation_plan(
    State(state): State<Arc<AppState>>,
    auth: ActingMember,
    Json(input): Json<CreateVacationPlanInput>,
) -> AppResult<(StatusCode, Json<VacationPlan>)> {
    let plan = state.workflow.create_plan(auth.member_id, input).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[utoipa::path(
    delete,
    path = "/api/vacation-plans/{id}",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    responses(
        (status = 200, description = "Vacation plan deleted", body = VacationPlanMutationResponse),
        (status = 400, description = "Plan is already under approval or completed"),
        (status = 403, description = "Only the submitter may delete a plan"),
        (status = 404, description = "Vacation plan not found")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_vacation_plan(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    auth: ActingMember,
) -> AppResult<Json<VacationPlanMutationResponse>> {
    state.workflow.delete_plan(plan_id, auth.member_id).await?;

    Ok(Json(VacationPlanMutationResponse {
        success: true,
        message: Some("Vacation plan deleted successfully".to_string()),
    }))
}

/// PUT /api/vacation-plans/{id}/approvers
#[utoipa::path(
    put,
    path = "/api/vacation-plans/{id}/approvers",
    params(
        ("id" = i32, Path, description = "Vacation plan ID"),
        ("version" = Option<i32>, Query, description = "Plan version the client last observed")
    ),
    request_body = EditApproversInput,
    responses(
        (status = 200, description = "Approver chain replaced", body = VacationPlan),
        (status = 403, description = "Only the submitter may edit the chain"),
        (status = 404, description = "Vacation plan not found"),
        (status = 409, description = "Plan changed since it was read"),
        (status = 422, description = "Chain empty or shorter than the current stage")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn edit_approvers(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    Query(version): Query<VersionQuery>,
    auth: ActingMember,
    Json(input): Json<EditApproversInput>,
) -> AppResult<Json<VacationPlan>> {
    let plan = state
        .workflow
        .edit_approvers(plan_id, auth.member_id, &input.approvers, version.version)
        .await?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
pub struct VersionQuery {
    pub version: Option<i32>,
}

async fn decide(
    state: &AppState,
    plan_id: i32,
    auth: ActingMember,
    transition: Transition,
    input: StageDecisionInput,
) -> AppResult<Json<VacationPlan>> {
    let decision = StageDecision {
        stage: input.stage,
        member_id: auth.member_id,
    };
    let plan = state
        .workflow
        .transition(plan_id, transition, decision, input.version)
        .await?;
    Ok(Json(plan))
}

/// POST /api/vacation-plans/{id}/approve
#[utoipa::path(
    post,
    path = "/api/vacation-plans/{id}/approve",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    request_body = StageDecisionInput,
    responses(
        (status = 200, description = "Stage approved", body = VacationPlan),
        (status = 400, description = "Stage out of order or plan rejected"),
        (status = 403, description = "Acting member is not the approver for this stage"),
        (status = 404, description = "Vacation plan not found"),
        (status = 409, description = "Plan changed since it was read")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn approve(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    auth: ActingMember,
    Json(input): Json<StageDecisionInput>,
) -> AppResult<Json<VacationPlan>> {
    decide(&state, plan_id, auth, Transition::Approve, input).await
}

#[utoipa::path(
    post,
    path = "/api/vacation-plans/{id}/cancel-approve",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    request_body = StageDecisionInput,
    responses(
        (status = 200, description = "Approval withdrawn", body = VacationPlan),
        (status = 400, description = "Stage is not the last approved one"),
        (status = 403, description = "Acting member did not approve this stage"),
        (status = 404, description = "Vacation plan not found"),
        (status = 409, description = "Plan changed since it was read")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn cancel_approve(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    auth: ActingMember,
    Json(input): Json<StageDecisionInput>,
) -> AppResult<Json<VacationPlan>> {
    decide(&state, plan_id, auth, Transition::CancelApprove, input).await
}

#[utoipa::path(
    post,
    path = "/api/vacation-plans/{id}/reject",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    request_body = StageDecisionInput,
    responses(
        (status = 200, description = "Plan rejected", body = VacationPlan),
        (status = 400, description = "Stage out of order or plan already rejected"),
        (status = 403, description = "Acting member is not the approver for this stage"),
        (status = 404, description = "Vacation plan not found"),
        (status = 409, description = "Plan changed since it was read")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn reject(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    auth: ActingMember,
    Json(input): Json<StageDecisionInput>,
) -> AppResult<Json<VacationPlan>> {
    decide(&state, plan_id, auth, Transition::Reject, input).await
}

#[utoipa::path(
    post,
    path = "/api/vacation-plans/{id}/cancel-reject",
    params(
        ("id" = i32, Path, description = "Vacation plan ID")
    ),
    request_body = StageDecisionInput,
    responses(
        (status = 200, description = "Rejection withdrawn", body = VacationPlan),
        (status = 400, description = "Plan is not rejected or stage out of order"),
        (status = 403, description = "Acting member is not the approver for this stage"),
        (status = 404, description = "Vacation plan not found"),
        (status = 409, description = "Plan changed since it was read")
    ),
    tag = "vacation-plans",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn cancel_reject(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i32>,
    auth: ActingMember,
    Json(input): Json<StageDecisionInput>,
) -> AppResult<Json<VacationPlan>> {
    decide(&state, plan_id, auth, Transition::CancelReject, input).await
}
