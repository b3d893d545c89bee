use async_trait::async_trait;

use crate::models::{ApplyVacation, Period, VacationPlan};
use crate::workflow::NewVacationPlan;

/// Which plans a listing returns.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanScope {
    /// Plans submitted by a member.
    Member(i32),
    /// Plans where the member sits in the approver chain. With `approved`
    /// false only plans waiting on that member are returned, otherwise only
    /// plans the member has already passed.
    Approver { member_id: i32, approved: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanFilter {
    pub scope: PlanScope,
    pub rejected: Option<bool>,
    pub period: Period,
}

/// Durable store for plans, their approver chains and their leave entries.
///
/// Writes that touch a plan take the version the caller loaded (`plan.version`
/// or `expected_version`) and return `Ok(false)` without writing anything when
/// the stored version has moved on. Multi-row writes are all-or-nothing.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn find_plan(&self, plan_id: i32) -> Result<Option<VacationPlan>, sqlx::Error>;

    async fn find_vacation(&self, vacation_id: i32) -> Result<Option<ApplyVacation>, sqlx::Error>;

    /// Insert the plan, its chain and its entries in one transaction.
    async fn insert_plan(&self, plan: &NewVacationPlan) -> Result<VacationPlan, sqlx::Error>;

    /// Persist plan flags, entry state and approver decision timestamps.
    async fn save_plan(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error>;

    /// Delete the stored chain and insert `plan.approvers` in its place.
    async fn replace_approvers(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error>;

    async fn delete_plan(&self, plan_id: i32, expected_version: i32) -> Result<bool, sqlx::Error>;

    async fn delete_vacation(
        &self,
        plan_id: i32,
        vacation_id: i32,
        expected_version: i32,
    ) -> Result<bool, sqlx::Error>;

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<VacationPlan>, sqlx::Error>;

    async fn list_vacations(&self, member_id: i32, period: Period) -> Result<Vec<ApplyVacation>, sqlx::Error>;
}
