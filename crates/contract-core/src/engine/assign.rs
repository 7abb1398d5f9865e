//! Asignación round-robin de tareas a usuarios de un rol.

use log::debug;

use crate::errors::CoreEngineError;
use crate::store::ApprovalStore;

/// Siguiente usuario activo con `role`, rotando sobre los candidatos
/// ordenados por id. Sin candidatos la tarea queda sin asignar y el cursor
/// del rol no avanza.
pub fn next_assignee<S: ApprovalStore>(store: &mut S, role: &str) -> Result<Option<i32>, CoreEngineError> {
    let candidates = store.active_users_with_role(role)?;
    if candidates.is_empty() {
        debug!("assign:none role={role}");
        return Ok(None);
    }
    let index = store.advance_cursor(role, candidates.len())?;
    let user_id = candidates[index % candidates.len()];
    debug!("assign:done role={role} user_id={user_id} slot={index}/{}", candidates.len());
    Ok(Some(user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryApprovalStore;

    #[test]
    fn rotates_over_active_holders() {
        let mut store = InMemoryApprovalStore::new();
        store.add_user(3, "Юрист Б", &["Юрист"], true);
        store.add_user(1, "Юрист А", &["Юрист"], true);
        store.add_user(2, "Уволен", &["Юрист"], false);
        let picks: Vec<_> = (0..4).map(|_| next_assignee(&mut store, "Юрист").unwrap()).collect();
        assert_eq!(picks, vec![Some(1), Some(3), Some(1), Some(3)]);
    }

    #[test]
    fn new_holder_joins_the_rotation_at_the_running_cursor() {
        let mut store = InMemoryApprovalStore::new();
        store.add_user(1, "Юрист А", &["Юрист"], true);
        store.add_user(2, "Юрист Б", &["Юрист"], true);
        let picks: Vec<_> = (0..3).map(|_| next_assignee(&mut store, "Юрист").unwrap()).collect();
        assert_eq!(picks, vec![Some(1), Some(2), Some(1)]);

        // cursor = 3 con tres candidatos: 3 % 3 = 0
        store.add_user(3, "Юрист В", &["Юрист"], true);
        let picks: Vec<_> = (0..3).map(|_| next_assignee(&mut store, "Юрист").unwrap()).collect();
        assert_eq!(picks, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn no_candidates_leaves_unassigned() {
        let mut store = InMemoryApprovalStore::new();
        assert_eq!(next_assignee(&mut store, "Отдел логистики").unwrap(), None);
        store.add_user(7, "Логист", &["Отдел логистики"], true);
        assert_eq!(next_assignee(&mut store, "Отдел логистики").unwrap(), Some(7));
    }
}
