//! Core ApprovalEngine implementation

use chrono::NaiveDateTime;
use contract_domain::{ContractStatus, Priority, GENERAL_DEPARTMENT};
use log::{debug, info};

use crate::constants::{cancellation_suffix, APPROVED_COMMENT, REJECTED_COMMENT};
use crate::deadline::DeadlinePolicy;
use crate::engine::assign::next_assignee;
use crate::errors::CoreEngineError;
use crate::flow::{ApprovalFlow, FlowStep};
use crate::model::{AuditAction, AuditEntry, Decision, NewTask, OverdueTask, Rescheduled, SubmitOutcome, TaskOutcome, TaskStatus};
use crate::store::ApprovalStore;

/// Motor de aprobación de contratos
///
/// Cada operación corre dentro de `ApprovalStore::atomically`; la hora
/// actual se recibe como argumento para que los plazos sean reproducibles.
#[derive(Debug)]
pub struct ApprovalEngine<S>
    where S: ApprovalStore
{
    store: S,
    policy: DeadlinePolicy,
}

impl<S> ApprovalEngine<S> where S: ApprovalStore
{
    pub fn new(store: S) -> Self {
        Self { store, policy: DeadlinePolicy::default() }
    }

    pub fn with_policy(store: S, policy: DeadlinePolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn policy(&self) -> DeadlinePolicy {
        self.policy
    }

    /// Envía un contrato en borrador a aprobación.
    ///
    /// Descarta cualquier instancia sin terminar, elige la ruta del
    /// departamento (o la general), abre las tareas del primer grupo y deja el
    /// contrato `На согласовании`.
    pub fn submit(&mut self, contract_id: i32, actor: Option<i32>, now: NaiveDateTime) -> Result<SubmitOutcome, CoreEngineError> {
        debug!("submit:start contract_id={contract_id}");
        let policy = self.policy;
        let outcome = self.store.atomically(|store| {
            let contract = store.contract(contract_id)?.ok_or(CoreEngineError::ContractNotFound(contract_id))?;
            if contract.status != ContractStatus::Draft {
                return Err(CoreEngineError::NotDraft(contract.status.to_string()));
            }

            let replaced_instance = match store.open_instance(contract_id)? {
                Some(previous) => {
                    store.discard_instance(previous.id)?;
                    info!("Discarded unfinished approval instance {} of contract {}", previous.id, contract.label());
                    Some(previous.id)
                }
                None => None,
            };

            let department = contract.department.clone().unwrap_or_else(|| GENERAL_DEPARTMENT.to_string());
            let flow = match store.flow_for_department(&department)? {
                Some(flow) => flow,
                None => store.flow_for_department(GENERAL_DEPARTMENT)?
                             .ok_or_else(|| CoreEngineError::NoFlowForDepartment(department.clone()))?,
            };
            let step = flow.first_step()
                           .ok_or_else(|| CoreEngineError::InvalidFlowDefinition(format!("flow '{}' has no steps", flow.name)))?;

            let instance_id = store.create_instance(contract_id, flow.id, now)?;
            let deadline = policy.submission_deadline(contract.priority, contract.deadline_at, now);
            let tasks = open_step(store, instance_id, &flow, step, |_| deadline, now)?;

            store.set_contract_status(contract_id, ContractStatus::OnApproval, now)?;
            store.record_audit(&AuditEntry { user_id: actor,
                                             action: AuditAction::SendForApproval,
                                             details: format!("Договор {} отправлен на согласование", contract.label()),
                                             created_at: now })?;
            Ok(SubmitOutcome { instance_id,
                               flow_id: flow.id,
                               step,
                               tasks,
                               deadline,
                               replaced_instance })
        })?;
        info!("Contract {contract_id} sent for approval (instance {}, {} task(s))",
              outcome.instance_id,
              outcome.tasks.len());
        Ok(outcome)
    }

    /// Aprueba o rechaza una tarea pendiente.
    ///
    /// Aprobar el último pendiente de un paso abre el siguiente grupo o, si no
    /// hay más pasos, cierra la instancia y aprueba el contrato. Rechazar
    /// cancela el resto de tareas pendientes y rechaza el contrato.
    pub fn process_task(&mut self,
                        task_id: i32,
                        decision: Decision,
                        comment: &str,
                        actor: Option<i32>,
                        now: NaiveDateTime)
                        -> Result<TaskOutcome, CoreEngineError> {
        debug!("process_task:start task_id={task_id} decision={decision:?}");
        let policy = self.policy;
        let comment = match comment.trim() {
            "" => match decision {
                Decision::Approve => APPROVED_COMMENT,
                Decision::Reject => REJECTED_COMMENT,
            },
            text => text,
        };
        let outcome = self.store.atomically(|store| {
            let task = store.task(task_id)?.ok_or(CoreEngineError::TaskNotFound(task_id))?;
            if task.status != TaskStatus::Pending {
                return Err(CoreEngineError::TaskNotPending(task_id));
            }
            let instance = store.instance(task.instance_id)?.ok_or(CoreEngineError::InstanceNotFound(task.instance_id))?;
            let contract = store.contract(instance.contract_id)?
                                .ok_or(CoreEngineError::ContractNotFound(instance.contract_id))?;

            store.complete_task(task_id, decision.task_status(), comment, now)?;

            let outcome = match decision {
                Decision::Approve => {
                    let pending = store.count_pending(instance.id, task.step_order)?;
                    if pending > 0 {
                        TaskOutcome::StepOpen { pending }
                    } else {
                        let flow = store.flow(instance.flow_id)?.ok_or(CoreEngineError::FlowNotFound(instance.flow_id))?;
                        let next = task.step_order + 1;
                        if flow.has_step(next) {
                            let tasks = open_step(store, instance.id, &flow, next, |s| policy.step_deadline(s, now), now)?;
                            TaskOutcome::Advanced { step: next, tasks }
                        } else {
                            store.finish_instance(instance.id, now)?;
                            store.set_contract_status(contract.id, ContractStatus::Approved, now)?;
                            TaskOutcome::Approved { instance_id: instance.id }
                        }
                    }
                }
                Decision::Reject => {
                    let cancelled = store.cancel_pending(instance.id, &cancellation_suffix(&task.role_name), now)?;
                    store.finish_instance(instance.id, now)?;
                    store.set_contract_status(contract.id, ContractStatus::Rejected, now)?;
                    TaskOutcome::Rejected { instance_id: instance.id, cancelled }
                }
            };

            let action = match decision {
                Decision::Approve => AuditAction::ApproveTask,
                Decision::Reject => AuditAction::RejectTask,
            };
            store.record_audit(&AuditEntry { user_id: actor,
                                             action,
                                             details: format!("Задача {task_id} для договора {}", contract.label()),
                                             created_at: now })?;
            Ok(outcome)
        })?;
        info!("Task {task_id} {} with comment: {comment}",
              match decision {
                  Decision::Approve => "approved",
                  Decision::Reject => "rejected",
              });
        Ok(outcome)
    }

    /// Devuelve las tareas vencidas aún no notificadas y las marca como
    /// notificadas, de modo que cada una se informa una sola vez.
    pub fn check_deadlines(&mut self, now: NaiveDateTime) -> Result<Vec<OverdueTask>, CoreEngineError> {
        let overdue = self.store.atomically(|store| {
            let overdue = store.overdue_tasks(now)?;
            for task in &overdue {
                store.mark_notified(task.task_id)?;
            }
            Ok(overdue)
        })?;
        for task in &overdue {
            info!("Overdue notice sent to {}: {}", task.user_name, task.notice());
        }
        Ok(overdue)
    }

    /// Cambia prioridad y plazo del contrato y mueve las tareas pendientes de
    /// sus instancias en curso al nuevo plazo.
    pub fn reschedule(&mut self,
                      contract_id: i32,
                      priority: Priority,
                      custom: Option<NaiveDateTime>,
                      now: NaiveDateTime)
                      -> Result<Rescheduled, CoreEngineError> {
        let deadline = self.policy.contract_deadline(priority, custom, now)?;
        let rescheduled = self.store.atomically(|store| {
            let contract = store.contract(contract_id)?.ok_or(CoreEngineError::ContractNotFound(contract_id))?;
            store.set_contract_deadline(contract.id, priority, deadline, now)?;
            let moved_tasks = store.reschedule_pending_tasks(contract.id, deadline)?;
            Ok(Rescheduled { deadline, moved_tasks })
        })?;
        info!("Contract {contract_id} deadline changed to {}", deadline.format("%Y-%m-%d %H:%M:%S"));
        Ok(rescheduled)
    }
}

/// Crea una tarea pendiente por cada entrada del grupo `step`.
fn open_step<S, D>(store: &mut S,
                   instance_id: i32,
                   flow: &ApprovalFlow,
                   step: u32,
                   deadline_for: D,
                   now: NaiveDateTime)
                   -> Result<Vec<i32>, CoreEngineError>
    where S: ApprovalStore,
          D: Fn(&FlowStep) -> NaiveDateTime
{
    let mut created = Vec::new();
    for entry in flow.roles_at(step) {
        let assigned_user_id = next_assignee(store, &entry.role)?;
        let id = store.insert_task(&NewTask { instance_id,
                                              step_order: step,
                                              role_name: entry.role.clone(),
                                              assigned_user_id,
                                              assigned_at: now,
                                              deadline_at: deadline_for(entry) })?;
        created.push(id);
    }
    debug!("open_step:done instance_id={instance_id} step={step} tasks={}", created.len());
    Ok(created)
}
