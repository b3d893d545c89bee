//! In-memory `PlanRepository` for tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::plan_repository::{PlanFilter, PlanRepository, PlanScope};
use crate::models::{ApplyVacation, ApproverOrder, Period, VacationPlan};
use crate::workflow::NewVacationPlan;

#[derive(Default)]
struct Store {
    plans: BTreeMap<i32, VacationPlan>,
    next_plan_id: i32,
    next_vacation_id: i32,
}

#[derive(Default)]
pub struct MemoryPlanRepository {
    store: Mutex<Store>,
    fail_writes: AtomicBool,
}

impl MemoryPlanRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail before touching the store.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Overwrite a stored plan's version, simulating a concurrent writer.
    pub fn bump_version(&self, plan_id: i32) {
        let mut store = self.store.lock().unwrap();
        if let Some(plan) = store.plans.get_mut(&plan_id) {
            plan.version += 1;
        }
    }

    pub fn plan_count(&self) -> usize {
        self.store.lock().unwrap().plans.len()
    }

    fn check_writable(&self) -> Result<(), sqlx::Error> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for MemoryPlanRepository {
    async fn find_plan(&self, plan_id: i32) -> Result<Option<VacationPlan>, sqlx::Error> {
        Ok(self.store.lock().unwrap().plans.get(&plan_id).cloned())
    }

    async fn find_vacation(&self, vacation_id: i32) -> Result<Option<ApplyVacation>, sqlx::Error> {
        let store = self.store.lock().unwrap();
        Ok(store
            .plans
            .values()
            .flat_map(|p| p.vacations.iter())
            .find(|v| v.id == vacation_id)
            .cloned())
    }

    async fn insert_plan(&self, plan: &NewVacationPlan) -> Result<VacationPlan, sqlx::Error> {
        self.check_writable()?;
        let mut store = self.store.lock().unwrap();
        store.next_plan_id += 1;
        let id = store.next_plan_id;

        let approvers = plan
            .approvers
            .iter()
            .enumerate()
            .map(|(i, member_id)| ApproverOrder {
                vacation_plan_id: id,
                order: i as i32 + 1,
                member_id: *member_id,
                decided_at: None,
            })
            .collect();

        let mut vacations = Vec::with_capacity(plan.vacations.len());
        for input in &plan.vacations {
            store.next_vacation_id += 1;
            vacations.push(ApplyVacation {
                id: store.next_vacation_id,
                vacation_plan_id: id,
                member_id: plan.member_id,
                start_date: input.start_date,
                end_date: input.end_date,
                half_first: input.half_first,
                half_last: input.half_last,
                approve_stage: 0,
                rejected: false,
            });
        }

        let stored = VacationPlan {
            id,
            member_id: plan.member_id,
            applied_at: plan.applied_at,
            approve_stage: 0,
            rejected: false,
            completed: false,
            version: 1,
            approvers,
            vacations,
        };
        store.plans.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save_plan(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.plans.get_mut(&plan.id) else {
            return Ok(false);
        };
        if stored.version != plan.version {
            return Ok(false);
        }
        stored.approve_stage = plan.approve_stage;
        stored.rejected = plan.rejected;
        stored.completed = plan.completed;
        stored.version += 1;
        for approver in &mut stored.approvers {
            if let Some(updated) = plan.approver_at(approver.order) {
                approver.decided_at = updated.decided_at;
            }
        }
        for vacation in &mut stored.vacations {
            if let Some(updated) = plan.vacations.iter().find(|v| v.id == vacation.id) {
                *vacation = updated.clone();
            }
        }
        Ok(true)
    }

    async fn replace_approvers(&self, plan: &VacationPlan) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.plans.get_mut(&plan.id) else {
            return Ok(false);
        };
        if stored.version != plan.version {
            return Ok(false);
        }
        stored.approvers = plan.approvers.clone();
        stored.completed = plan.completed;
        stored.version += 1;
        Ok(true)
    }

    async fn delete_plan(&self, plan_id: i32, expected_version: i32) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        let mut store = self.store.lock().unwrap();
        match store.plans.get(&plan_id) {
            Some(plan) if plan.version == expected_version => {
                store.plans.remove(&plan_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_vacation(
        &self,
        plan_id: i32,
        vacation_id: i32,
        expected_version: i32,
    ) -> Result<bool, sqlx::Error> {
        self.check_writable()?;
        let mut store = self.store.lock().unwrap();
        let Some(stored) = store.plans.get_mut(&plan_id) else {
            return Ok(false);
        };
        if stored.version != expected_version {
            return Ok(false);
        }
        stored.vacations.retain(|v| v.id != vacation_id);
        stored.version += 1;
        Ok(true)
    }

    async fn list_plans(&self, filter: &PlanFilter) -> Result<Vec<VacationPlan>, sqlx::Error> {
        let store = self.store.lock().unwrap();
        let period = filter.period;
        let mut plans: Vec<VacationPlan> = store
            .plans
            .values()
            .filter(|p| filter.rejected.map_or(true, |r| p.rejected == r))
            .filter(|p| match filter.scope {
                PlanScope::Member(member_id) => p.member_id == member_id,
                PlanScope::Approver { member_id, approved } => p.approvers.iter().any(|a| {
                    a.member_id == member_id
                        && if approved {
                            p.approve_stage > a.order - 1
                        } else {
                            p.approve_stage == a.order - 1
                        }
                }),
            })
            .filter_map(|p| {
                let mut plan = p.clone();
                plan.vacations.retain(|v| v.overlaps(period.from, period.until));
                (!plan.vacations.is_empty()).then_some(plan)
            })
            .collect();
        plans.sort_by(|a, b| b.applied_at.cmp(&a.applied_at).then(b.id.cmp(&a.id)));
        Ok(plans)
    }

    async fn list_vacations(&self, member_id: i32, period: Period) -> Result<Vec<ApplyVacation>, sqlx::Error> {
        let store = self.store.lock().unwrap();
        let mut vacations: Vec<ApplyVacation> = store
            .plans
            .values()
            .flat_map(|p| p.vacations.iter())
            .filter(|v| v.member_id == member_id && v.overlaps(period.from, period.until))
            .cloned()
            .collect();
        vacations.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
        Ok(vacations)
    }
}
