use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use contract_domain::{ContractStatus, Priority};

use super::ApprovalStore;
use crate::errors::CoreEngineError;
use crate::flow::ApprovalFlow;
use crate::model::{ApprovalInstance, ApprovalTask, AuditEntry, ContractSnapshot, InstanceStatus, NewTask, OverdueTask, TaskStatus};

#[derive(Debug, Clone)]
struct MemUser {
    full_name: String,
    active: bool,
    roles: Vec<String>,
}

/// Store en memoria para tests. `atomically` toma una copia completa y la
/// restaura si la operación falla.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApprovalStore {
    contracts: BTreeMap<i32, ContractSnapshot>,
    flows: Vec<ApprovalFlow>,
    instances: BTreeMap<i32, ApprovalInstance>,
    tasks: BTreeMap<i32, ApprovalTask>,
    users: BTreeMap<i32, MemUser>,
    cursors: HashMap<String, u64>,
    audit: Vec<AuditEntry>,
    next_instance_id: i32,
    next_task_id: i32,
}

impl InMemoryApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contract(&mut self, contract: ContractSnapshot) {
        self.contracts.insert(contract.id, contract);
    }

    pub fn add_flow(&mut self, flow: ApprovalFlow) {
        self.flows.push(flow);
    }

    pub fn add_user(&mut self, id: i32, full_name: &str, roles: &[&str], active: bool) {
        self.users.insert(id,
                          MemUser { full_name: full_name.to_string(),
                                    active,
                                    roles: roles.iter().map(|r| r.to_string()).collect() });
    }

    pub fn contract_snapshot(&self, contract_id: i32) -> Option<&ContractSnapshot> {
        self.contracts.get(&contract_id)
    }

    pub fn instances(&self) -> Vec<ApprovalInstance> {
        self.instances.values().cloned().collect()
    }

    /// Tareas de la instancia en orden de creación.
    pub fn tasks_of(&self, instance_id: i32) -> Vec<ApprovalTask> {
        self.tasks.values().filter(|t| t.instance_id == instance_id).cloned().collect()
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        &self.audit
    }

    fn contract_mut(&mut self, contract_id: i32) -> Result<&mut ContractSnapshot, CoreEngineError> {
        self.contracts.get_mut(&contract_id).ok_or(CoreEngineError::ContractNotFound(contract_id))
    }
}

impl ApprovalStore for InMemoryApprovalStore {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreEngineError>
        where F: FnOnce(&mut Self) -> Result<T, CoreEngineError>
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    fn contract(&mut self, contract_id: i32) -> Result<Option<ContractSnapshot>, CoreEngineError> {
        Ok(self.contracts.get(&contract_id).cloned())
    }

    fn set_contract_status(&mut self, contract_id: i32, status: ContractStatus, _now: NaiveDateTime) -> Result<(), CoreEngineError> {
        self.contract_mut(contract_id)?.status = status;
        Ok(())
    }

    fn set_contract_deadline(&mut self,
                             contract_id: i32,
                             priority: Priority,
                             deadline: NaiveDateTime,
                             _now: NaiveDateTime)
                             -> Result<(), CoreEngineError> {
        let contract = self.contract_mut(contract_id)?;
        contract.priority = priority;
        contract.deadline_at = Some(deadline);
        Ok(())
    }

    fn flow_for_department(&mut self, department: &str) -> Result<Option<ApprovalFlow>, CoreEngineError> {
        Ok(self.flows.iter().find(|f| f.department.as_deref() == Some(department)).cloned())
    }

    fn flow(&mut self, flow_id: i32) -> Result<Option<ApprovalFlow>, CoreEngineError> {
        Ok(self.flows.iter().find(|f| f.id == flow_id).cloned())
    }

    fn open_instance(&mut self, contract_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError> {
        Ok(self.instances
               .values()
               .find(|i| i.contract_id == contract_id && i.status != InstanceStatus::Finished)
               .cloned())
    }

    fn instance(&mut self, instance_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError> {
        Ok(self.instances.get(&instance_id).cloned())
    }

    fn create_instance(&mut self, contract_id: i32, flow_id: i32, now: NaiveDateTime) -> Result<i32, CoreEngineError> {
        self.next_instance_id += 1;
        let id = self.next_instance_id;
        self.instances.insert(id,
                              ApprovalInstance { id,
                                                 contract_id,
                                                 flow_id,
                                                 status: InstanceStatus::Running,
                                                 started_at: Some(now),
                                                 finished_at: None });
        Ok(id)
    }

    fn finish_instance(&mut self, instance_id: i32, now: NaiveDateTime) -> Result<(), CoreEngineError> {
        let instance = self.instances.get_mut(&instance_id).ok_or(CoreEngineError::InstanceNotFound(instance_id))?;
        instance.status = InstanceStatus::Finished;
        instance.finished_at = Some(now);
        Ok(())
    }

    fn discard_instance(&mut self, instance_id: i32) -> Result<(), CoreEngineError> {
        self.tasks.retain(|_, t| t.instance_id != instance_id);
        self.instances.remove(&instance_id);
        Ok(())
    }

    fn insert_task(&mut self, task: &NewTask) -> Result<i32, CoreEngineError> {
        self.next_task_id += 1;
        let id = self.next_task_id;
        self.tasks.insert(id,
                          ApprovalTask { id,
                                         instance_id: task.instance_id,
                                         step_order: task.step_order,
                                         role_name: task.role_name.clone(),
                                         assigned_user_id: task.assigned_user_id,
                                         status: TaskStatus::Pending,
                                         assigned_at: Some(task.assigned_at),
                                         completed_at: None,
                                         comment: None,
                                         deadline_at: Some(task.deadline_at),
                                         deadline_notified: false });
        Ok(id)
    }

    fn task(&mut self, task_id: i32) -> Result<Option<ApprovalTask>, CoreEngineError> {
        Ok(self.tasks.get(&task_id).cloned())
    }

    fn complete_task(&mut self, task_id: i32, status: TaskStatus, comment: &str, now: NaiveDateTime) -> Result<(), CoreEngineError> {
        let task = self.tasks.get_mut(&task_id).ok_or(CoreEngineError::TaskNotFound(task_id))?;
        task.status = status;
        task.completed_at = Some(now);
        task.comment = Some(comment.to_string());
        Ok(())
    }

    fn count_pending(&mut self, instance_id: i32, step: u32) -> Result<i64, CoreEngineError> {
        Ok(self.tasks
               .values()
               .filter(|t| t.instance_id == instance_id && t.step_order == step && t.status == TaskStatus::Pending)
               .count() as i64)
    }

    fn cancel_pending(&mut self, instance_id: i32, suffix: &str, now: NaiveDateTime) -> Result<usize, CoreEngineError> {
        let mut cancelled = 0;
        for task in self.tasks.values_mut().filter(|t| t.instance_id == instance_id && t.status == TaskStatus::Pending) {
            task.status = TaskStatus::Cancelled;
            task.completed_at = Some(now);
            task.comment = Some(format!("{}{}", task.comment.as_deref().unwrap_or(""), suffix));
            cancelled += 1;
        }
        Ok(cancelled)
    }

    fn active_users_with_role(&mut self, role: &str) -> Result<Vec<i32>, CoreEngineError> {
        Ok(self.users
               .iter()
               .filter(|(_, u)| u.active && u.roles.iter().any(|r| r == role))
               .map(|(id, _)| *id)
               .collect())
    }

    fn advance_cursor(&mut self, role: &str, modulo: usize) -> Result<usize, CoreEngineError> {
        let cursor = self.cursors.entry(role.to_string()).or_insert(0);
        let index = (*cursor % modulo.max(1) as u64) as usize;
        *cursor += 1;
        Ok(index)
    }

    fn overdue_tasks(&mut self, now: NaiveDateTime) -> Result<Vec<OverdueTask>, CoreEngineError> {
        let mut overdue = Vec::new();
        for task in self.tasks.values() {
            let (Some(user_id), Some(deadline)) = (task.assigned_user_id, task.deadline_at) else { continue };
            if task.status != TaskStatus::Pending || task.deadline_notified || deadline >= now {
                continue;
            }
            let Some(user) = self.users.get(&user_id) else { continue };
            let Some(contract) = self.instances
                                     .get(&task.instance_id)
                                     .and_then(|i| self.contracts.get(&i.contract_id))
            else {
                continue;
            };
            overdue.push(OverdueTask { task_id: task.id,
                                       assigned_user_id: user_id,
                                       user_name: user.full_name.clone(),
                                       contract_number: contract.label(),
                                       role_name: task.role_name.clone(),
                                       deadline_at: deadline });
        }
        Ok(overdue)
    }

    fn mark_notified(&mut self, task_id: i32) -> Result<(), CoreEngineError> {
        let task = self.tasks.get_mut(&task_id).ok_or(CoreEngineError::TaskNotFound(task_id))?;
        task.deadline_notified = true;
        Ok(())
    }

    fn reschedule_pending_tasks(&mut self, contract_id: i32, deadline: NaiveDateTime) -> Result<usize, CoreEngineError> {
        let running: Vec<i32> = self.instances
                                    .values()
                                    .filter(|i| i.contract_id == contract_id && i.status == InstanceStatus::Running)
                                    .map(|i| i.id)
                                    .collect();
        let mut moved = 0;
        for task in self.tasks
                        .values_mut()
                        .filter(|t| running.contains(&t.instance_id) && t.status == TaskStatus::Pending)
        {
            task.deadline_at = Some(deadline);
            task.deadline_notified = false;
            moved += 1;
        }
        Ok(moved)
    }

    fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), CoreEngineError> {
        self.audit.push(entry.clone());
        Ok(())
    }
}
