use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One contiguous, possibly half-day bounded, date range inside a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ApplyVacation {
    pub id: i32,
    pub vacation_plan_id: i32,
    pub member_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub half_first: bool,
    pub half_last: bool,
    pub approve_stage: i32,
    pub rejected: bool,
}

impl ApplyVacation {
    pub fn overlaps(&self, from: NaiveDate, until: NaiveDate) -> bool {
        self.start_date <= until && self.end_date >= from
    }
}
