//! contract-core: motor de aprobación de contratos por rutas de pasos
pub mod constants;
pub mod deadline;
pub mod engine;
pub mod errors;
pub mod flow;
pub mod model;
pub mod store;

pub use deadline::{ContractTag, DeadlinePolicy, TaskTag};
pub use engine::{next_assignee, ApprovalEngine};
pub use errors::CoreEngineError;
pub use flow::{ApprovalFlow, FlowStep};
pub use model::{ApprovalInstance, ApprovalTask, AuditAction, AuditEntry, ContractSnapshot, Decision, InstanceStatus, NewTask,
                OverdueTask, Rescheduled, SubmitOutcome, TaskOutcome, TaskStatus};
pub use store::{ApprovalStore, InMemoryApprovalStore};
