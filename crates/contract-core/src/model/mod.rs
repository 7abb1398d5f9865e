//! Registros del flujo de aprobación: instancias, tareas, auditoría y los
//! resultados que devuelve el motor.

mod outcome;
mod records;
mod status;

pub use outcome::{Rescheduled, SubmitOutcome, TaskOutcome};
pub use records::{ApprovalInstance, ApprovalTask, AuditEntry, ContractSnapshot, NewTask, OverdueTask};
pub use status::{AuditAction, Decision, InstanceStatus, TaskStatus};
