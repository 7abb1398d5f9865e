//! Errores del motor de aprobación.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("contract {0} not found")] ContractNotFound(i32),
    #[error("approval task {0} not found")] TaskNotFound(i32),
    #[error("approval instance {0} not found")] InstanceNotFound(i32),
    #[error("approval flow {0} not found")] FlowNotFound(i32),
    #[error("only draft contracts can be sent for approval (current status: {0})")] NotDraft(String),
    #[error("task {0} is not pending")] TaskNotPending(i32),
    #[error("no approval flow for department '{0}' and no general flow")] NoFlowForDepartment(String),
    #[error("deadline must be in the future")] DeadlineInPast,
    #[error("custom priority requires an explicit deadline")] MissingCustomDeadline,
    #[error("invalid approval flow definition: {0}")] InvalidFlowDefinition(String),
    #[error("storage: {0}")] Storage(String),
}
