use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::workflow::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

fn workflow_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::InvalidStageOrder { .. }
        | WorkflowError::PlanAlreadyRejected(_)
        | WorkflowError::PlanNotRejected(_)
        | WorkflowError::VacationAlreadyRejected(_)
        | WorkflowError::VacationNotRejected(_)
        | WorkflowError::PlanNotCancellable(_)
        | WorkflowError::PlanLocked(_)
        | WorkflowError::LastVacation { .. } => StatusCode::BAD_REQUEST,
        WorkflowError::NotAuthorizedApprover { .. } | WorkflowError::NotPlanOwner { .. } => StatusCode::FORBIDDEN,
        WorkflowError::PlanNotFound(_) | WorkflowError::VacationNotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::EmptyApproverChain
        | WorkflowError::EmptyVacationList
        | WorkflowError::InvalidDateRange { .. }
        | WorkflowError::ApproverChainTooShort { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::VersionConflict { .. } => StatusCode::CONFLICT,
        WorkflowError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn workflow_response(err: WorkflowError) -> Response {
    let status = workflow_status(&err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "Workflow persistence failure");
    }

    let body = Json(json!({
        "error": err.to_string(),
        "code": err.code()
    }));

    (status, body).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Workflow(err) => return workflow_response(err),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_status_mapping() {
        assert_eq!(
            workflow_status(&WorkflowError::InvalidStageOrder { requested: 2, current: 0 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            workflow_status(&WorkflowError::NotAuthorizedApprover { stage: 1, member_id: 3 }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(workflow_status(&WorkflowError::PlanNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(workflow_status(&WorkflowError::PlanLocked(1)), StatusCode::BAD_REQUEST);
        assert_eq!(
            workflow_status(&WorkflowError::LastVacation { plan_id: 1, vacation_id: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            workflow_status(&WorkflowError::VersionConflict { plan_id: 1, expected: 2 }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            workflow_status(&WorkflowError::EmptyApproverChain),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            workflow_status(&WorkflowError::Persistence(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
