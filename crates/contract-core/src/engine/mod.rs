//! Motor de aprobación: envío de contratos, resolución de tareas, barrido de
//! plazos y reprogramación.

pub mod assign;
pub mod core;

pub use assign::next_assignee;
pub use core::ApprovalEngine;
