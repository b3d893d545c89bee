use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::{
    extractors::ActingMember,
    models::{ApplyVacation, Period, VacationInput, VacationPlanMutationResponse},
    AppError, AppResult, AppState,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct GetVacationsQuery {
    pub member_id: i32,
    pub year: i32,
    pub month: Option<u32>,
}

/// GET /api/vacations?member_id=&year=&month=
#[utoipa::path(
    get,
    path = "/api/vacations",
    params(GetVacationsQuery),
    responses(
        (status = 200, description = "Leave entries overlapping the period", body = Vec<ApplyVacation>),
        (status = 400, description = "Invalid period")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacations(
    State(state): State<Arc<AppState>>,
    _auth: ActingMember,
    Query(query): Query<GetVacationsQuery>,
) -> AppResult<Json<Vec<ApplyVacation>>> {
    let period = Period::from_year_month(query.year, query.month).map_err(AppError::BadRequest)?;
    let vacations = state.workflow.list_vacations(query.member_id, period).await?;
    Ok(Json(vacations))
}

#[utoipa::path(
    get,
    path = "/api/vacations/{id}",
    params(
        ("id" = i32, Path, description = "Leave entry ID")
    ),
    responses(
        (status = 200, description = "Leave entry", body = ApplyVacation),
        (status = 404, description = "Leave entry not found")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn get_vacation(
    State(state): State<Arc<AppState>>,
    Path(vacation_id): Path<i32>,
    _auth: ActingMember,
) -> AppResult<Json<ApplyVacation>> {
    Ok(Json(state.workflow.get_vacation(vacation_id).await?))
}

/// PUT /api/vacations/{id}
///
/// Changes the dates of one entry. Only the plan's submitter may do this.
#[utoipa::path(
    put,
    path = "/api/vacations/{id}",
    params(
        ("id" = i32, Path, description = "Leave entry ID")
    ),
    request_body = VacationInput,
    responses(
        (status = 200, description = "Leave entry updated", body = ApplyVacation),
        (status = 400, description = "Plan is under approval or the entry has been rejected"),
        (status = 403, description = "Only the submitter may edit entries"),
        (status = 404, description = "Leave entry not found"),
        (status = 422, description = "End date before start date")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn update_vacation(
    State(state): State<Arc<AppState>>,
    Path(vacation_id): Path<i32>,
    auth: ActingMember,
    Json(input): Json<VacationInput>,
) -> AppResult<Json<ApplyVacation>> {
    let vacation = state
        .workflow
        .edit_vacation(vacation_id, auth.member_id, &input)
        .await?;
    Ok(Json(vacation))
}

#[utoipa::path(
    delete,
    path = "/api/vacations/{id}",
    params(
        ("id" = i32, Path, description = "Leave entry ID")
    ),
    responses(
        (status = 200, description = "Leave entry deleted", body = VacationPlanMutationResponse),
        (status = 400, description = "Plan is under approval or this is its last entry"),
        (status = 403, description = "Only the submitter may delete entries"),
        (status = 404, description = "Leave entry not found")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn delete_vacation(
    State(state): State<Arc<AppState>>,
    Path(vacation_id): Path<i32>,
    auth: ActingMember,
) -> AppResult<Json<VacationPlanMutationResponse>> {
    state.workflow.delete_vacation(vacation_id, auth.member_id).await?;

    Ok(Json(VacationPlanMutationResponse {
        success: true,
        message: Some("Vacation deleted successfully".to_string()),
    }))
}

/// POST /api/vacations/{id}/reject
#[utoipa::path(
    post,
    path = "/api/vacations/{id}/reject",
    params(
        ("id" = i32, Path, description = "Leave entry ID")
    ),
    responses(
        (status = 200, description = "Leave entry rejected", body = ApplyVacation),
        (status = 400, description = "Entry or plan already rejected"),
        (status = 403, description = "Acting member is not the current approver"),
        (status = 404, description = "Leave entry not found")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn reject_vacation(
    State(state): State<Arc<AppState>>,
    Path(vacation_id): Path<i32>,
    auth: ActingMember,
) -> AppResult<Json<ApplyVacation>> {
    let vacation = state.workflow.reject_vacation(vacation_id, auth.member_id).await?;
    Ok(Json(vacation))
}

#[utoipa::path(
    post,
    path = "/api/vacations/{id}/cancel-reject",
    params(
        ("id" = i32, Path, description = "Leave entry ID")
    ),
    responses(
        (status = 200, description = "Leave entry rejection withdrawn", body = ApplyVacation),
        (status = 400, description = "Entry is not rejected or the plan is rejected"),
        (status = 403, description = "Acting member is not the current approver"),
        (status = 404, description = "Leave entry not found")
    ),
    tag = "vacations",
    security(("bearer_auth" = []), ("cookie_auth" = []))
)]
pub async fn cancel_reject_vacation(
    State(state): State<Arc<AppState>>,
    Path(vacation_id): Path<i32>,
    auth: ActingMember,
) -> AppResult<Json<ApplyVacation>> {
    let vacation = state
        .workflow
        .cancel_reject_vacation(vacation_id, auth.member_id)
        .await?;
    Ok(Json(vacation))
}
