pub mod apply_vacation;
pub mod period;
pub mod vacation_plan;
pub mod vacation_plan_input;

pub use apply_vacation::ApplyVacation;
pub use period::Period;
pub use vacation_plan::{ApproverOrder, PlanStatus, VacationPlan};
pub use vacation_plan_input::{
    CreateVacationPlanInput, EditApproversInput, StageDecisionInput, VacationInput, VacationPlanMutationResponse,
};
