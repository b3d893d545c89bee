use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use super::plan_repository::{PlanFilter, PlanRepository, PlanScope};
use crate::models::{ApplyVacation, ApproverOrder, Period, VacationPlan};
use crate::workflow::NewVacationPlan;

#[derive(Debug, FromRow)]
struct VacationPlanRow {
    id: i32,
    member_id: i32,
    applied_at: DateTime<Utc>,
    approve_stage: i32,
    rejected: bool,
    completed: bool,
    version: i32,
}

impl VacationPlanRow {
    fn into_plan(self, approvers: Vec<ApproverOrder>, vacations: Vec<ApplyVacation>) -> VacationPlan {
        VacationPlan {
            id: self.id,
            member_id: self.member_id,
            applied_at: self.applied_at,
            approve_stage: self.approve_stage,
            rejected: self.rejected,
            completed: self.completed,
            version: self.version,
            approvers,
            vacations,
        }
    }
}

const PLAN_COLUMNS: &str = "p.id, p.member_id, p.applied_at, p.approve_stage, p.rejected, p.completed, p.version";

const APPROVER_COLUMNS: &str = r#"vacation_plan_id, "order", member_id, decided_at"#;

const VACATION_COLUMNS: &str =
    "id, vacation_plan_id, member_id, start_date, end_date, half_first, half_last, approve_stage, rejected";

/// `PlanRepository` backed by PostgreSQL.
pub struct PgPlanRepository {
    db: PgPool,
}

impl PgPlanRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    async fn find_plan(&self, plan_id: i32) -> Result<Option<VacationPlan>, sqlx::Error> {
        let row = sqlx::query_as::<_, VacationPlanRow>(&format!(
            "SELECT {} FROM vacation_plans p WHERE p.id = $1",
            PLAN_COLUMNS
        ))
        .bind(plan_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let approvers = sqlx::query_as::<_, ApproverOrder>(&format!(
            r#"SELECT {} FROM approver_orders WHERE vacation_plan_id = $1 ORDER BY "order""#,
            APPROVER_COLUMNS
        ))
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;

        let vacations = sqlx::query_as::<_, ApplyVacation>(&format!(
            "SELECT {} FROM apply_vacations WHERE vacation_plan_id = $1 ORDER BY start_date, id",
            VACATION_COLUMNS
        ))
        .bind(plan_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(row.into_plan(approvers, vacations)))
    }

    async fn find_vacation(&self, vacation_id: i32) -> Result<Option<ApplyVacation>, sqlx::Error> {
        sqlx::query_as::<_, ApplyVacation>(&format!(
            "SELECT {} FROM apply_vacations WHERE id = $1",
            VACATION_COLUMNS
        ))
        .bind(vacation_id)
        .fetch_optional(&self.db)
        .await
    }

    async fn insert_plan(&self, plan: &NewVacationPlan) -> Result<VacationPlan, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, VacationPlanRow>(
            r#"
            INSERT INTO vacation_plans (member_id, applied_at, approve_stage, rejected, completed, version)
            VALUES ($1, $2, 0, false, false, 1)
            RETURNING id, member_id, applied_at, approve_stage, rejected, completed, version
            "#,
        )
        .bind(plan.member_id)
        .bind(plan.applied_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut approvers = Vec::with_capacity(plan.approvers.len());
        for (i, approver_id) in plan.approvers.iter().enumerate() {
            let approver = sqlx::query_as::<_, ApproverOrder>(&format!(
                r#"
                INSERT INTO approver_orders (vacation_plan_id, "order", member_id)
                VALUES ($1, $2, $3)
                RETURNING {}
                "#,
                APPROVER_COLUMNS
            ))
            .bind(row.id)
            .bind(i as i32 + 1)
            .bind(approver_id)
            .fetch_one(&mut *tx)
            .await?;
            approvers.push(approver);
        }

        let mut vacations = Vec::with_capacity(plan.vacations.len());
        for input in &plan.vacations {
            let vacation = sqlx::query_as::<_, ApplyVacation>(&format!(
                r#"
                INSERT INTO apply_vacations (
                    vacation_plan_id, member_id, start_date, end_date, half_first, half_last, approve_stage, rejected
                )
                VALUES ($1, $2, $3, $4, $5, $6, 0, false)
                RETURNING {}
                "#,
                VACATION_COLUMNS
            ))
            .bind(row.id)
            .bind(plan.member_id)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.half_first)
            .bind(input.half_last)
            .fetch_one(&mut *tx)
            .await?;
            vacations.push(vacation);
        }

        tx.commit().await?;

        Ok(row.into_plan(approvers, vacations))
    }

    async fn save_plan(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE vacation_plans
            SET approve_stage = $1, rejected = $2, completed = $3, version = version + 1, updated_at = NOW()
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(plan.approve_stage)
        .bind(plan.rejected)
        .bind(plan.completed)
        .bind(plan.id)
        .bind(plan.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for approver in &plan.approvers {
            sqlx::query(r#"UPDATE approver_orders SET decided_at = $1 WHERE vacation_plan_id = $2 AND "order" = $3"#)
                .bind(approver.decided_at)
                .bind(plan.id)
                .bind(approver.order)
                .execute(&mut *tx)
                .await?;
        }

        for vacation in &plan.vacations {
            sqlx::query(
                r#"
                UPDATE apply_vacations
                SET start_date = $1, end_date = $2, half_first = $3, half_last = $4, approve_stage = $5, rejected = $6
                WHERE id = $7 AND vacation_plan_id = $8
                "#,
            )
            .bind(vacation.start_date)
            .bind(vacation.end_date)
            .bind(vacation.half_first)
            .bind(vacation.half_last)
            .bind(vacation.approve_stage)
            .bind(vacation.rejected)
            .bind(vacation.id)
            .bind(plan.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn replace_approvers(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE vacation_plans
            SET completed = $1, version = version + 1, updated_at = NOW()
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(plan.completed)
        .bind(plan.id)
        .bind(plan.version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM approver_orders WHERE vacation_plan_id = $1")
            .bind(plan.id)
            .execute(&mut *tx)
            .await?;

        for approver in &plan.approvers {
            sqlx::query(
                r#"INSERT INTO approver_orders (vacation_plan_id, "order", member_id, decided_at) VALUES ($1, $2, $3, $4)"#,
            )
            .bind(plan.id)
            .bind(approver.order)
            .bind(approver.member_id)
            .bind(approver.decided_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_plan(&self, plan_id: i32, expected_version: i32) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let version: Option<i32> = sqlx::query_scalar("SELECT version FROM vacation_plans WHERE id = $1 FOR UPDATE")
            .bind(plan_id)
            .fetch_optional(&mut *tx)
            .await?;

        if version != Some(expected_version) {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM approver_orders WHERE vacation_plan_id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM apply_vacations WHERE vacation_plan_id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM vacation_plans WHERE id = $1")
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_vacation(
        &self,
        plan_id: i32,
        vacation_id: i32,
        expected_version: i32,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE vacation_plans SET version = version + 1, updated_at = NOW() WHERE id = $1 AND version = $2",
        )
        .bind(plan_id)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM apply_vacations WHERE id = $1 AND vacation_plan_id = $2")
            .bind(vacation_id)
            .bind(plan_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<VacationPlan>, sqlx::Error> {
        let (scope_clause, member_id, approved) = match filter.scope {
            PlanScope::Member(member_id) => ("p.member_id = $4", member_id, None),
            PlanScope::Approver { member_id, approved } => (
                r#"EXISTS (
                    SELECT 1 FROM approver_orders a
                    WHERE a.vacation_plan_id = p.id
                    AND a.member_id = $4
                    AND CASE WHEN $5 THEN p.approve_stage > a."order" - 1
                             ELSE p.approve_stage = a."order" - 1 END
                )"#,
                member_id,
                Some(approved),
            ),
        };

        let sql = format!(
            r#"
            SELECT {}
            FROM vacation_plans p
            WHERE EXISTS (
                SELECT 1 FROM apply_vacations v
                WHERE v.vacation_plan_id = p.id AND v.start_date <= $2 AND v.end_date >= $1
            )
            AND ($3::boolean IS NULL OR p.rejected = $3)
            AND {}
            ORDER BY p.applied_at DESC, p.id DESC
            "#,
            PLAN_COLUMNS, scope_clause
        );

        let mut query = sqlx::query_as::<_, VacationPlanRow>(&sql)
            .bind(filter.period.from)
            .bind(filter.period.until)
            .bind(filter.rejected)
            .bind(member_id);
        if let Some(approved) = approved {
            query = query.bind(approved);
        }
        let rows = query.fetch_all(&self.db).await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let plan_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

        let approvers = sqlx::query_as::<_, ApproverOrder>(&format!(
            r#"SELECT {} FROM approver_orders WHERE vacation_plan_id = ANY($1) ORDER BY vacation_plan_id, "order""#,
            APPROVER_COLUMNS
        ))
        .bind(&plan_ids)
        .fetch_all(&self.db)
        .await?;

        let vacations = sqlx::query_as::<_, ApplyVacation>(&format!(
            r#"
            SELECT {} FROM apply_vacations
            WHERE vacation_plan_id = ANY($1) AND start_date <= $3 AND end_date >= $2
            ORDER BY start_date, id
            "#,
            VACATION_COLUMNS
        ))
        .bind(&plan_ids)
        .bind(filter.period.from)
        .bind(filter.period.until)
        .fetch_all(&self.db)
        .await?;

        let mut approvers_by_plan: HashMap<i32, Vec<ApproverOrder>> = HashMap::new();
        for approver in approvers {
            approvers_by_plan.entry(approver.vacation_plan_id).or_default().push(approver);
        }
        let mut vacations_by_plan: HashMap<i32, Vec<ApplyVacation>> = HashMap::new();
        for vacation in vacations {
            vacations_by_plan.entry(vacation.vacation_plan_id).or_default().push(vacation);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let approvers = approvers_by_plan.remove(&row.id).unwrap_or_default();
                let vacations = vacations_by_plan.remove(&row.id).unwrap_or_default();
                row.into_plan(approvers, vacations)
            })
            .collect())
    }

    async fn list_vacations(&self, member_id: i32, period: Period) -> Result<Vec<ApplyVacation>, sqlx::Error> {
        sqlx::query_as::<_, ApplyVacation>(&format!(
            r#"
            SELECT {} FROM apply_vacations
            WHERE member_id = $1 AND start_date <= $3 AND end_date >= $2
            ORDER BY start_date, id
            "#,
            VACATION_COLUMNS
        ))
        .bind(member_id)
        .bind(period.from)
        .bind(period.until)
        .fetch_all(&self.db)
        .await
    }
}
