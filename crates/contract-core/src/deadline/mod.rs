//! Cálculo de plazos y clasificación visual (etiquetas) de contratos y tareas.

mod policy;
mod tags;

pub use policy::DeadlinePolicy;
pub use tags::{ContractTag, TaskTag};
