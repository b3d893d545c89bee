use chrono::Utc;
use metrics::counter;
use std::sync::Arc;

use super::approval::{self, StageDecision, Transition};
use super::error::{WorkflowError, WorkflowResult};
use crate::db::{PlanFilter, PlanRepository};
use crate::models::{ApplyVacation, CreateVacationPlanInput, Period, VacationInput, VacationPlan};

/// Loads plans, runs the state machine and writes the outcome back.
#[derive(Clone)]
pub struct WorkflowService {
    repo: Arc<dyn PlanRepository>,
}

impl WorkflowService {
    pub fn new(repo: Arc<dyn PlanRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_plan(&self, member_id: i32, input: CreateVacationPlanInput) -> WorkflowResult<VacationPlan> {
        let new_plan = approval::new_plan(member_id, input.approvers, input.vacations, Utc::now())?;

        let plan = self.repo.insert_plan(&new_plan).await.map_err(|e| {
            tracing::error!(error = %e, member_id, "Failed to insert vacation plan");
            WorkflowError::Persistence(e)
        })?;

        tracing::info!(
            plan_id = plan.id,
            member_id,
            approvers = plan.approvers.len(),
            vacations = plan.vacations.len(),
            "Vacation plan created"
        );
        Ok(plan)
    }

    pub async fn get_plan(&self, plan_id: i32) -> WorkflowResult<VacationPlan> {
        self.repo
            .find_plan(plan_id)
            .await?
            .ok_or(WorkflowError::PlanNotFound(plan_id))
    }

    pub async fn list_plans(&self, filter: &PlanFilter) -> WorkflowResult<Vec<VacationPlan>> {
        Ok(self.repo.list_plans(filter).await?)
    }

    /// Approve, cancel an approval, reject or cancel a rejection.
    pub async fn transition(
        &self,
        plan_id: i32,
        transition: Transition,
        decision: StageDecision,
        expected_version: Option<i32>,
    ) -> WorkflowResult<VacationPlan> {
        let result = self.run_transition(plan_id, transition, decision, expected_version).await;

        let outcome = match &result {
            Ok(_) => "accepted",
            Err(WorkflowError::Persistence(_)) => "failed",
            Err(WorkflowError::VersionConflict { .. }) => "conflict",
            Err(_) => "refused",
        };
        counter!(
            "vacation_plan_transitions_total",
            "transition" => transition.as_str(),
            "outcome" => outcome
        )
        .increment(1);

        match &result {
            Ok(plan) => tracing::info!(
                plan_id,
                transition = transition.as_str(),
                member_id = decision.member_id,
                stage = plan.approve_stage,
                rejected = plan.rejected,
                completed = plan.completed,
                status = ?plan.status(),
                "Vacation plan transition applied"
            ),
            Err(e) => tracing::warn!(
                plan_id,
                transition = transition.as_str(),
                member_id = decision.member_id,
                requested_stage = decision.stage,
                error = %e,
                "Vacation plan transition refused"
            ),
        }

        result
    }

    async fn run_transition(
        &self,
        plan_id: i32,
        transition: Transition,
        decision: StageDecision,
        expected_version: Option<i32>,
    ) -> WorkflowResult<VacationPlan> {
        let plan = self.get_plan(plan_id).await?;
        ensure_version(&plan, expected_version)?;
        let next = approval::apply(&plan, transition, decision, Utc::now())?;
        self.save(next).await
    }

    /// Replace the whole approver chain. Earlier decision timestamps are lost.
    pub async fn edit_approvers(
        &self,
        plan_id: i32,
        member_id: i32,
        approvers: &[i32],
        expected_version: Option<i32>,
    ) -> WorkflowResult<VacationPlan> {
        let plan = self.get_plan(plan_id).await?;
        ensure_version(&plan, expected_version)?;
        let next = approval::replace_approvers(&plan, member_id, approvers)?;

        if !self.repo.replace_approvers(&next).await? {
            return Err(conflict(&next));
        }

        tracing::info!(plan_id, member_id, approvers = approvers.len(), "Approver chain replaced");
        self.get_plan(plan_id).await
    }

    pub async fn delete_plan(&self, plan_id: i32, member_id: i32) -> WorkflowResult<()> {
        let plan = self.get_plan(plan_id).await?;
        approval::check_deletable(&plan, member_id)?;

        if !self.repo.delete_plan(plan_id, plan.version).await? {
            return Err(conflict(&plan));
        }

        tracing::info!(plan_id, member_id, "Vacation plan deleted");
        Ok(())
    }

    pub async fn get_vacation(&self, vacation_id: i32) -> WorkflowResult<ApplyVacation> {
        self.repo
            .find_vacation(vacation_id)
            .await?
            .ok_or(WorkflowError::VacationNotFound(vacation_id))
    }

    pub async fn list_vacations(&self, member_id: i32, period: Period) -> WorkflowResult<Vec<ApplyVacation>> {
        Ok(self.repo.list_vacations(member_id, period).await?)
    }

    pub async fn edit_vacation(
        &self,
        vacation_id: i32,
        member_id: i32,
        input: &VacationInput,
    ) -> WorkflowResult<ApplyVacation> {
        let plan = self.plan_of_vacation(vacation_id).await?;
        let next = approval::edit_vacation(&plan, vacation_id, member_id, input)?;
        let saved = self.save(next).await?;
        tracing::info!(vacation_id, plan_id = saved.id, member_id, "Vacation dates updated");
        vacation_in(&saved, vacation_id)
    }

    pub async fn delete_vacation(&self, vacation_id: i32, member_id: i32) -> WorkflowResult<()> {
        let plan = self.plan_of_vacation(vacation_id).await?;
        approval::check_vacation_deletable(&plan, vacation_id, member_id)?;

        if !self.repo.delete_vacation(plan.id, vacation_id, plan.version).await? {
            return Err(conflict(&plan));
        }

        tracing::info!(vacation_id, plan_id = plan.id, member_id, "Vacation deleted");
        Ok(())
    }

    pub async fn reject_vacation(&self, vacation_id: i32, member_id: i32) -> WorkflowResult<ApplyVacation> {
        let plan = self.plan_of_vacation(vacation_id).await?;
        let next = approval::reject_vacation(&plan, vacation_id, member_id)?;
        let saved = self.save(next).await?;
        tracing::info!(vacation_id, plan_id = saved.id, member_id, "Vacation rejected");
        vacation_in(&saved, vacation_id)
    }

    pub async fn cancel_reject_vacation(&self, vacation_id: i32, member_id: i32) -> WorkflowResult<ApplyVacation> {
        let plan = self.plan_of_vacation(vacation_id).await?;
        let next = approval::cancel_reject_vacation(&plan, vacation_id, member_id)?;
        let saved = self.save(next).await?;
        tracing::info!(vacation_id, plan_id = saved.id, member_id, "Vacation rejection cancelled");
        vacation_in(&saved, vacation_id)
    }

    async fn plan_of_vacation(&self, vacation_id: i32) -> WorkflowResult<VacationPlan> {
        let vacation = self.get_vacation(vacation_id).await?;
        self.get_plan(vacation.vacation_plan_id).await
    }

    /// Write `plan` guarded by the version it was loaded with, then re-read it.
    async fn save(&self, plan: VacationPlan) -> WorkflowResult<VacationPlan> {
        let saved = self.repo.save_plan(&plan).await.map_err(|e| {
            tracing::error!(error = %e, plan_id = plan.id, "Failed to save vacation plan");
            WorkflowError::Persistence(e)
        })?;
        if !saved {
            return Err(conflict(&plan));
        }
        self.get_plan(plan.id).await
    }
}

fn ensure_version(plan: &VacationPlan, expected: Option<i32>) -> WorkflowResult<()> {
    match expected {
        Some(expected) if expected != plan.version => Err(WorkflowError::VersionConflict {
            plan_id: plan.id,
            expected,
        }),
        _ => Ok(()),
    }
}

fn conflict(plan: &VacationPlan) -> WorkflowError {
    tracing::warn!(plan_id = plan.id, version = plan.version, "Vacation plan changed concurrently");
    WorkflowError::VersionConflict {
        plan_id: plan.id,
        expected: plan.version,
    }
}

fn vacation_in(plan: &VacationPlan, vacation_id: i32) -> WorkflowResult<ApplyVacation> {
    plan.vacations
        .iter()
        .find(|v| v.id == vacation_id)
        .cloned()
        .ok_or(WorkflowError::VacationNotFound(vacation_id))
}
