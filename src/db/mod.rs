#[cfg(test)]
pub mod memory;
pub mod plan_repository;
pub mod pool;
pub mod postgres;

pub use plan_repository::{PlanFilter, PlanRepository, PlanScope};
pub use pool::create_pool;
pub use postgres::PgPlanRepository;
