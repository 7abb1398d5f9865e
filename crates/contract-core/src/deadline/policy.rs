use chrono::{Duration, NaiveDateTime};
use contract_domain::Priority;

use crate::constants::{DEFAULT_STEP_DEADLINE_DAYS, RESCHEDULE_HOUR, STANDARD_DEADLINE_DAYS, URGENT_DEADLINE_DAYS};
use crate::errors::CoreEngineError;
use crate::flow::FlowStep;

/// Reglas de plazo por prioridad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlinePolicy {
    pub urgent_days: i64,
    pub standard_days: i64,
    pub default_step_days: i64,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self { urgent_days: URGENT_DEADLINE_DAYS,
               standard_days: STANDARD_DEADLINE_DAYS,
               default_step_days: DEFAULT_STEP_DEADLINE_DAYS }
    }
}

impl DeadlinePolicy {
    fn days_for(&self, priority: Priority) -> i64 {
        match priority {
            Priority::Urgent => self.urgent_days,
            Priority::Standard | Priority::Custom => self.standard_days,
        }
    }

    /// Plazo de las tareas del primer paso: el del contrato si lo tiene, si no
    /// `now` más los días de la prioridad.
    pub fn submission_deadline(&self, priority: Priority, contract_deadline: Option<NaiveDateTime>, now: NaiveDateTime) -> NaiveDateTime {
        contract_deadline.unwrap_or_else(|| now + Duration::days(self.days_for(priority)))
    }

    /// Plazo de las tareas de un paso posterior.
    pub fn step_deadline(&self, step: &FlowStep, now: NaiveDateTime) -> NaiveDateTime {
        now + Duration::days(step.deadline_days.unwrap_or(self.default_step_days))
    }

    /// Nuevo plazo del contrato al reprogramarlo. Las prioridades fijas vencen
    /// a las 18:00 del día resultante; `Custom` usa la fecha dada. El
    /// resultado debe quedar estrictamente en el futuro.
    pub fn contract_deadline(&self,
                             priority: Priority,
                             custom: Option<NaiveDateTime>,
                             now: NaiveDateTime)
                             -> Result<NaiveDateTime, CoreEngineError> {
        let deadline = match priority {
            Priority::Custom => custom.ok_or(CoreEngineError::MissingCustomDeadline)?,
            fixed => {
                let shifted = now + Duration::days(self.days_for(fixed));
                shifted.date().and_hms_opt(RESCHEDULE_HOUR, 0, 0).unwrap_or(shifted)
            }
        };
        if deadline <= now {
            return Err(CoreEngineError::DeadlineInPast);
        }
        Ok(deadline)
    }
}
