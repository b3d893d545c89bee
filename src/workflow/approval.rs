//! Approval state machine for vacation plans.
//!
//! Everything here is pure: functions take the current plan and return the
//! plan as it should be persisted, or the reason the transition is refused.
//! Nothing is mutated when a transition fails.

use chrono::{DateTime, Utc};

use super::error::{WorkflowError, WorkflowResult};
use crate::models::{ApproverOrder, VacationInput, VacationPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Approve,
    CancelApprove,
    Reject,
    CancelReject,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::CancelApprove => "cancel_approve",
            Transition::Reject => "reject",
            Transition::CancelReject => "cancel_reject",
        }
    }
}

/// A decision by `member_id` for chain position `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDecision {
    pub stage: i32,
    pub member_id: i32,
}

/// A validated plan that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVacationPlan {
    pub member_id: i32,
    pub applied_at: DateTime<Utc>,
    pub approvers: Vec<i32>,
    pub vacations: Vec<VacationInput>,
}

/// Run one approval-chain transition against `plan`.
pub fn apply(
    plan: &VacationPlan,
    transition: Transition,
    decision: StageDecision,
    now: DateTime<Utc>,
) -> WorkflowResult<VacationPlan> {
    match transition {
        Transition::Approve => approve(plan, decision, now),
        Transition::CancelApprove => cancel_approve(plan, decision),
        Transition::Reject => reject(plan, decision, now),
        Transition::CancelReject => cancel_reject(plan, decision),
    }
}

fn approve(plan: &VacationPlan, decision: StageDecision, now: DateTime<Utc>) -> WorkflowResult<VacationPlan> {
    if plan.rejected {
        return Err(WorkflowError::PlanAlreadyRejected(plan.id));
    }
    check_next_stage(plan, decision.stage)?;
    check_approver(plan, decision)?;

    let mut next = plan.clone();
    next.approve_stage = decision.stage;
    next.rejected = false;
    next.completed = next.approver_at(decision.stage + 1).is_none();
    mirror_stage(&mut next);
    stamp_decision(&mut next, decision.stage, Some(now));
    Ok(next)
}

fn cancel_approve(plan: &VacationPlan, decision: StageDecision) -> WorkflowResult<VacationPlan> {
    if plan.rejected {
        return Err(WorkflowError::PlanAlreadyRejected(plan.id));
    }
    if decision.stage < 1 || decision.stage != plan.approve_stage {
        return Err(WorkflowError::InvalidStageOrder {
            requested: decision.stage,
            current: plan.approve_stage,
        });
    }
    check_approver(plan, decision)?;

    let mut next = plan.clone();
    next.approve_stage = decision.stage - 1;
    next.rejected = false;
    next.completed = false;
    mirror_stage(&mut next);
    stamp_decision(&mut next, decision.stage, None);
    Ok(next)
}

fn reject(plan: &VacationPlan, decision: StageDecision, now: DateTime<Utc>) -> WorkflowResult<VacationPlan> {
    if plan.rejected {
        return Err(WorkflowError::PlanAlreadyRejected(plan.id));
    }
    check_next_stage(plan, decision.stage)?;
    check_approver(plan, decision)?;

    let mut next = plan.clone();
    next.rejected = true;
    for vacation in &mut next.vacations {
        vacation.rejected = true;
    }
    stamp_decision(&mut next, decision.stage, Some(now));
    Ok(next)
}

fn cancel_reject(plan: &VacationPlan, decision: StageDecision) -> WorkflowResult<VacationPlan> {
    if !plan.rejected {
        return Err(WorkflowError::PlanNotRejected(plan.id));
    }
    check_next_stage(plan, decision.stage)?;
    check_approver(plan, decision)?;

    let mut next = plan.clone();
    next.rejected = false;
    for vacation in &mut next.vacations {
        vacation.rejected = false;
    }
    mirror_stage(&mut next);
    stamp_decision(&mut next, decision.stage, None);
    Ok(next)
}

/// Forward decisions are only accepted for the position right after the current stage.
fn check_next_stage(plan: &VacationPlan, requested: i32) -> WorkflowResult<()> {
    if requested != plan.approve_stage + 1 {
        return Err(WorkflowError::InvalidStageOrder {
            requested,
            current: plan.approve_stage,
        });
    }
    Ok(())
}

fn check_approver(plan: &VacationPlan, decision: StageDecision) -> WorkflowResult<()> {
    match plan.approver_at(decision.stage) {
        Some(approver) if approver.member_id == decision.member_id => Ok(()),
        _ => Err(WorkflowError::NotAuthorizedApprover {
            stage: decision.stage,
            member_id: decision.member_id,
        }),
    }
}

/// Entries that were rejected on their own keep their stage.
fn mirror_stage(plan: &mut VacationPlan) {
    let stage = plan.approve_stage;
    for vacation in plan.vacations.iter_mut().filter(|v| !v.rejected) {
        vacation.approve_stage = stage;
    }
}

fn stamp_decision(plan: &mut VacationPlan, order: i32, at: Option<DateTime<Utc>>) {
    if let Some(approver) = plan.approvers.iter_mut().find(|a| a.order == order) {
        approver.decided_at = at;
    }
}

/// Validate a submission before anything is written.
pub fn new_plan(
    member_id: i32,
    approvers: Vec<i32>,
    vacations: Vec<VacationInput>,
    now: DateTime<Utc>,
) -> WorkflowResult<NewVacationPlan> {
    if approvers.is_empty() {
        return Err(WorkflowError::EmptyApproverChain);
    }
    if vacations.is_empty() {
        return Err(WorkflowError::EmptyVacationList);
    }
    for vacation in &vacations {
        check_date_range(vacation)?;
    }

    Ok(NewVacationPlan {
        member_id,
        applied_at: now,
        approvers,
        vacations,
    })
}

pub fn check_date_range(vacation: &VacationInput) -> WorkflowResult<()> {
    if vacation.end_date < vacation.start_date {
        return Err(WorkflowError::InvalidDateRange {
            start: vacation.start_date,
            end: vacation.end_date,
        });
    }
    Ok(())
}

/// Build the replacement chain for `plan`. Previous decision timestamps are dropped.
pub fn replace_approvers(plan: &VacationPlan, member_id: i32, approvers: &[i32]) -> WorkflowResult<VacationPlan> {
    check_owner(plan, member_id)?;
    if approvers.is_empty() {
        return Err(WorkflowError::EmptyApproverChain);
    }
    let len = approvers.len() as i32;
    if len < plan.approve_stage {
        return Err(WorkflowError::ApproverChainTooShort {
            len,
            stage: plan.approve_stage,
        });
    }

    let mut next = plan.clone();
    next.approvers = approvers
        .iter()
        .enumerate()
        .map(|(i, approver_id)| ApproverOrder {
            vacation_plan_id: plan.id,
            order: i as i32 + 1,
            member_id: *approver_id,
            decided_at: None,
        })
        .collect();
    next.completed = next.approve_stage == next.chain_len();
    Ok(next)
}

fn check_owner(plan: &VacationPlan, member_id: i32) -> WorkflowResult<()> {
    if plan.member_id != member_id {
        return Err(WorkflowError::NotPlanOwner {
            plan_id: plan.id,
            member_id,
        });
    }
    Ok(())
}

/// Approvers have signed off on the plan as it stands: past stage 0 and not
/// rejected, or completed.
fn is_locked(plan: &VacationPlan) -> bool {
    plan.completed || (plan.approve_stage > 0 && !plan.rejected)
}

/// A plan may be withdrawn by its submitter before anyone approved it, or once rejected.
pub fn check_deletable(plan: &VacationPlan, member_id: i32) -> WorkflowResult<()> {
    check_owner(plan, member_id)?;
    if is_locked(plan) {
        return Err(WorkflowError::PlanNotCancellable(plan.id));
    }
    Ok(())
}

fn check_entries_open(plan: &VacationPlan, member_id: i32) -> WorkflowResult<()> {
    check_owner(plan, member_id)?;
    if is_locked(plan) {
        return Err(WorkflowError::PlanLocked(plan.id));
    }
    Ok(())
}

/// Removing an entry follows the same rule as editing one, and a plan keeps
/// at least one entry.
pub fn check_vacation_deletable(plan: &VacationPlan, vacation_id: i32, member_id: i32) -> WorkflowResult<()> {
    check_entries_open(plan, member_id)?;
    if !plan.vacations.iter().any(|v| v.id == vacation_id) {
        return Err(WorkflowError::VacationNotFound(vacation_id));
    }
    if plan.vacations.len() == 1 {
        return Err(WorkflowError::LastVacation {
            plan_id: plan.id,
            vacation_id,
        });
    }
    Ok(())
}

/// Reject a single leave entry. Only the approver whose turn it is may do this.
pub fn reject_vacation(plan: &VacationPlan, vacation_id: i32, member_id: i32) -> WorkflowResult<VacationPlan> {
    check_entry_decision(plan, member_id)?;
    let mut next = plan.clone();
    let vacation = next
        .vacations
        .iter_mut()
        .find(|v| v.id == vacation_id)
        .ok_or(WorkflowError::VacationNotFound(vacation_id))?;
    if vacation.rejected {
        return Err(WorkflowError::VacationAlreadyRejected(vacation_id));
    }
    vacation.rejected = true;
    Ok(next)
}

/// Lift a single-entry rejection; the entry catches up with the plan's stage.
pub fn cancel_reject_vacation(plan: &VacationPlan, vacation_id: i32, member_id: i32) -> WorkflowResult<VacationPlan> {
    check_entry_decision(plan, member_id)?;
    let stage = plan.approve_stage;
    let mut next = plan.clone();
    let vacation = next
        .vacations
        .iter_mut()
        .find(|v| v.id == vacation_id)
        .ok_or(WorkflowError::VacationNotFound(vacation_id))?;
    if !vacation.rejected {
        return Err(WorkflowError::VacationNotRejected(vacation_id));
    }
    vacation.rejected = false;
    vacation.approve_stage = stage;
    Ok(next)
}

fn check_entry_decision(plan: &VacationPlan, member_id: i32) -> WorkflowResult<()> {
    if plan.rejected {
        return Err(WorkflowError::PlanAlreadyRejected(plan.id));
    }
    check_approver(
        plan,
        StageDecision {
            stage: plan.approve_stage + 1,
            member_id,
        },
    )
}

/// Change the dates of one entry. Entries of a plan under approval and
/// rejected entries are frozen.
pub fn edit_vacation(
    plan: &VacationPlan,
    vacation_id: i32,
    member_id: i32,
    input: &VacationInput,
) -> WorkflowResult<VacationPlan> {
    check_entries_open(plan, member_id)?;
    check_date_range(input)?;
    let mut next = plan.clone();
    let vacation = next
        .vacations
        .iter_mut()
        .find(|v| v.id == vacation_id)
        .ok_or(WorkflowError::VacationNotFound(vacation_id))?;
    if vacation.rejected {
        return Err(WorkflowError::VacationAlreadyRejected(vacation_id));
    }
    vacation.start_date = input.start_date;
    vacation.end_date = input.end_date;
    vacation.half_first = input.half_first;
    vacation.half_last = input.half_last;
    Ok(next)
}
