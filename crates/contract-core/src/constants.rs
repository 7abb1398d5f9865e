//! Constantes del flujo de aprobación.
//!
//! Los textos se guardan tal cual en `approval_tasks.comment`, por lo que deben
//! coincidir con los que escribía la aplicación de escritorio.

/// Plazo de un paso cuando la definición no trae `deadline_days`.
pub const DEFAULT_STEP_DEADLINE_DAYS: i64 = 3;
/// Plazo inicial para contratos urgentes sin fecha límite propia.
pub const URGENT_DEADLINE_DAYS: i64 = 1;
/// Plazo inicial para contratos estándar (y `custom` sin fecha).
pub const STANDARD_DEADLINE_DAYS: i64 = 3;
/// Hora del día en que vencen los plazos reprogramados.
pub const RESCHEDULE_HOUR: u32 = 18;

pub const APPROVED_COMMENT: &str = "Согласовано";
pub const REJECTED_COMMENT: &str = "Отклонено";

/// Sufijo que se añade al comentario de las tareas canceladas por un rechazo.
pub fn cancellation_suffix(rejecting_role: &str) -> String {
    format!(" | Отменено из-за отклонения отделом {rejecting_role}")
}
