use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::apply_vacation::ApplyVacation;

/// A leave request routed through an ordered approver chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VacationPlan {
    pub id: i32,
    pub member_id: i32,
    pub applied_at: DateTime<Utc>,
    /// Number of chain positions that have approved so far (0 = none).
    pub approve_stage: i32,
    pub rejected: bool,
    pub completed: bool,
    /// Optimistic concurrency counter, incremented on every write.
    pub version: i32,
    pub approvers: Vec<ApproverOrder>,
    pub vacations: Vec<ApplyVacation>,
}

impl VacationPlan {
    pub fn chain_len(&self) -> i32 {
        self.approvers.len() as i32
    }

    /// Approver link at a 1-based chain position.
    pub fn approver_at(&self, order: i32) -> Option<&ApproverOrder> {
        self.approvers.iter().find(|a| a.order == order)
    }

    /// Pending / partially approved / complete / rejected, derived from the flags.
    pub fn status(&self) -> PlanStatus {
        if self.rejected {
            PlanStatus::Rejected
        } else if self.completed {
            PlanStatus::Complete
        } else if self.approve_stage == 0 {
            PlanStatus::Draft
        } else {
            PlanStatus::InProgress
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Draft,
    InProgress,
    Complete,
    Rejected,
}

/// One link of a plan's approval chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApproverOrder {
    pub vacation_plan_id: i32,
    /// 1-based position in the chain.
    pub order: i32,
    pub member_id: i32,
    pub decided_at: Option<DateTime<Utc>>,
}
