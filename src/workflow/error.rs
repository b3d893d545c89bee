use chrono::NaiveDate;

/// Failures surfaced by the approval workflow.
///
/// Validation variants are always produced before any write; only
/// `Persistence` and `VersionConflict` can originate from the store.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid approval stage {requested}: plan is at stage {current}")]
    InvalidStageOrder { requested: i32, current: i32 },

    #[error("Member {member_id} is not the approver at stage {stage}")]
    NotAuthorizedApprover { stage: i32, member_id: i32 },

    #[error("Vacation plan {0} is rejected")]
    PlanAlreadyRejected(i32),

    #[error("Vacation plan {0} is not rejected")]
    PlanNotRejected(i32),

    #[error("Vacation plan {0} not found")]
    PlanNotFound(i32),

    #[error("Vacation {0} not found")]
    VacationNotFound(i32),

    #[error("Vacation {0} is rejected")]
    VacationAlreadyRejected(i32),

    #[error("Vacation {0} is not rejected")]
    VacationNotRejected(i32),

    #[error("Member {member_id} does not own vacation plan {plan_id}")]
    NotPlanOwner { plan_id: i32, member_id: i32 },

    #[error("Vacation plan {0} can no longer be cancelled")]
    PlanNotCancellable(i32),

    #[error("Vacation plan {0} is under approval; its vacations can no longer change")]
    PlanLocked(i32),

    #[error("Vacation {vacation_id} is the last one in plan {plan_id}; delete the plan instead")]
    LastVacation { plan_id: i32, vacation_id: i32 },

    #[error("Approver chain must not be empty")]
    EmptyApproverChain,

    #[error("Vacation plan must contain at least one vacation")]
    EmptyVacationList,

    #[error("Invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Approver chain of length {len} is shorter than approved stage {stage}")]
    ApproverChainTooShort { len: i32, stage: i32 },

    #[error("Vacation plan {plan_id} was modified concurrently (expected version {expected})")]
    VersionConflict { plan_id: i32, expected: i32 },

    #[error("{0}")]
    Persistence(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Stable machine-readable kind, exposed to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidStageOrder { .. } => "INVALID_STAGE_ORDER",
            WorkflowError::NotAuthorizedApprover { .. } => "NOT_AUTHORIZED_APPROVER",
            WorkflowError::PlanAlreadyRejected(_) => "PLAN_ALREADY_REJECTED",
            WorkflowError::PlanNotRejected(_) => "PLAN_NOT_REJECTED",
            WorkflowError::PlanNotFound(_) => "PLAN_NOT_FOUND",
            WorkflowError::VacationNotFound(_) => "VACATION_NOT_FOUND",
            WorkflowError::VacationAlreadyRejected(_) => "VACATION_ALREADY_REJECTED",
            WorkflowError::VacationNotRejected(_) => "VACATION_NOT_REJECTED",
            WorkflowError::NotPlanOwner { .. } => "NOT_PLAN_OWNER",
            WorkflowError::PlanNotCancellable(_) => "PLAN_NOT_CANCELLABLE",
            WorkflowError::PlanLocked(_) => "PLAN_LOCKED",
            WorkflowError::LastVacation { .. } => "LAST_VACATION",
            WorkflowError::EmptyApproverChain => "EMPTY_APPROVER_CHAIN",
            WorkflowError::EmptyVacationList => "EMPTY_VACATION_LIST",
            WorkflowError::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            WorkflowError::ApproverChainTooShort { .. } => "APPROVER_CHAIN_TOO_SHORT",
            WorkflowError::VersionConflict { .. } => "VERSION_CONFLICT",
            WorkflowError::Persistence(_) => "PERSISTENCE_FAILURE",
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
