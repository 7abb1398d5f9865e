use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Resultado de enviar un contrato a aprobación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub instance_id: i32,
    pub flow_id: i32,
    pub step: u32,
    /// Ids de las tareas abiertas para el primer grupo.
    pub tasks: Vec<i32>,
    pub deadline: NaiveDateTime,
    /// Instancia sin terminar que se descartó antes de crear la nueva.
    pub replaced_instance: Option<i32>,
}

/// Efecto de procesar una tarea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// Aprobada, pero quedan tareas pendientes en el mismo paso.
    StepOpen { pending: i64 },
    /// El paso quedó completo y se abrieron las tareas de `step`.
    Advanced { step: u32, tasks: Vec<i32> },
    /// Último paso aprobado; el contrato pasa a `Согласован`.
    Approved { instance_id: i32 },
    /// Rechazo; `cancelled` tareas pendientes quedaron canceladas.
    Rejected { instance_id: i32, cancelled: usize },
}

/// Resultado de reprogramar el plazo de un contrato.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rescheduled {
    pub deadline: NaiveDateTime,
    /// Tareas pendientes de instancias abiertas que recibieron el nuevo plazo.
    pub moved_tasks: usize,
}
