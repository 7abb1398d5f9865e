//! Definición de rutas de aprobación (`approval_flows`).
//!
//! Una ruta es una lista de pasos; las entradas que comparten número de paso
//! forman un grupo paralelo y sus tareas se abren a la vez.

mod types;

pub use types::{ApprovalFlow, FlowStep};
