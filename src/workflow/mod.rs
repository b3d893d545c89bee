pub mod approval;
pub mod error;
pub mod service;

pub use approval::{NewVacationPlan, StageDecision, Transition};
pub use error::WorkflowError;
pub use service::WorkflowService;
