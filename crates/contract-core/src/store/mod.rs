//! Puerto de persistencia del motor de aprobación.
//!
//! `ApprovalStore` reúne todas las lecturas/escrituras que necesita
//! `ApprovalEngine`. El motor agrupa cada operación dentro de `atomically`,
//! de modo que una implementación transaccional (SQLite) o una en memoria
//! (tests) garantizan que un fallo a mitad de camino no deja estado parcial.

mod memory;

use chrono::NaiveDateTime;
use contract_domain::{ContractStatus, Priority};

use crate::errors::CoreEngineError;
use crate::flow::ApprovalFlow;
use crate::model::{ApprovalInstance, ApprovalTask, AuditEntry, ContractSnapshot, NewTask, OverdueTask, TaskStatus};

pub use memory::InMemoryApprovalStore;

pub trait ApprovalStore {
    /// Ejecuta `f` como una unidad: si devuelve `Err`, ningún cambio hecho
    /// dentro de `f` queda visible.
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreEngineError>
        where F: FnOnce(&mut Self) -> Result<T, CoreEngineError>,
              Self: Sized;

    fn contract(&mut self, contract_id: i32) -> Result<Option<ContractSnapshot>, CoreEngineError>;
    fn set_contract_status(&mut self, contract_id: i32, status: ContractStatus, now: NaiveDateTime) -> Result<(), CoreEngineError>;
    fn set_contract_deadline(&mut self,
                             contract_id: i32,
                             priority: Priority,
                             deadline: NaiveDateTime,
                             now: NaiveDateTime)
                             -> Result<(), CoreEngineError>;

    /// Primera ruta cuyo departamento coincide exactamente.
    fn flow_for_department(&mut self, department: &str) -> Result<Option<ApprovalFlow>, CoreEngineError>;
    fn flow(&mut self, flow_id: i32) -> Result<Option<ApprovalFlow>, CoreEngineError>;

    /// Instancia del contrato que aún no está `finished`, si existe.
    fn open_instance(&mut self, contract_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError>;
    fn instance(&mut self, instance_id: i32) -> Result<Option<ApprovalInstance>, CoreEngineError>;
    fn create_instance(&mut self, contract_id: i32, flow_id: i32, now: NaiveDateTime) -> Result<i32, CoreEngineError>;
    fn finish_instance(&mut self, instance_id: i32, now: NaiveDateTime) -> Result<(), CoreEngineError>;
    /// Borra la instancia junto con todas sus tareas.
    fn discard_instance(&mut self, instance_id: i32) -> Result<(), CoreEngineError>;

    fn insert_task(&mut self, task: &NewTask) -> Result<i32, CoreEngineError>;
    fn task(&mut self, task_id: i32) -> Result<Option<ApprovalTask>, CoreEngineError>;
    fn complete_task(&mut self, task_id: i32, status: TaskStatus, comment: &str, now: NaiveDateTime) -> Result<(), CoreEngineError>;
    fn count_pending(&mut self, instance_id: i32, step: u32) -> Result<i64, CoreEngineError>;
    /// Cancela las tareas pendientes de la instancia añadiendo `suffix` al
    /// comentario existente. Devuelve cuántas se cancelaron.
    fn cancel_pending(&mut self, instance_id: i32, suffix: &str, now: NaiveDateTime) -> Result<usize, CoreEngineError>;

    /// Ids de usuarios activos con el rol, ordenados por id.
    fn active_users_with_role(&mut self, role: &str) -> Result<Vec<i32>, CoreEngineError>;
    /// Devuelve `cursor % modulo` para el rol y guarda el siguiente valor.
    fn advance_cursor(&mut self, role: &str, modulo: usize) -> Result<usize, CoreEngineError>;

    /// Tareas pendientes asignadas, vencidas antes de `now` y aún no notificadas.
    fn overdue_tasks(&mut self, now: NaiveDateTime) -> Result<Vec<OverdueTask>, CoreEngineError>;
    fn mark_notified(&mut self, task_id: i32) -> Result<(), CoreEngineError>;
    /// Mueve al nuevo plazo las tareas pendientes de instancias en curso del
    /// contrato y reinicia su marca de notificación.
    fn reschedule_pending_tasks(&mut self, contract_id: i32, deadline: NaiveDateTime) -> Result<usize, CoreEngineError>;

    fn record_audit(&mut self, entry: &AuditEntry) -> Result<(), CoreEngineError>;
}
