pub mod debug;
pub mod health;
pub mod metrics;
pub mod vacation_plans_handler;
pub mod vacations_handler;

pub use debug::debug_handler;
pub use health::health_check;
pub use metrics::{metrics_handler, setup_metrics_recorder, MetricsState};
