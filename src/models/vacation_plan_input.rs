use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Input for submitting a new vacation plan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateVacationPlanInput {
    /// Approver member ids in approval order
    pub approvers: Vec<i32>,
    pub vacations: Vec<VacationInput>,
}

/// A single leave range, used both on creation and on edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VacationInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub half_first: bool,
    #[serde(default)]
    pub half_last: bool,
}

/// Input for replacing a plan's approver chain
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EditApproversInput {
    pub approvers: Vec<i32>,
}

/// Input for approve / cancel-approve / reject / cancel-reject
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StageDecisionInput {
    /// Chain position the acting member decides for
    pub stage: i32,
    /// Plan version the client last observed
    pub version: Option<i32>,
}

/// Response for vacation plan mutations without a body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacationPlanMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}
