use serde::{Deserialize, Serialize};

use crate::errors::CoreEngineError;

/// Entrada de la columna JSON `steps`: `{"step":1,"role":"Юрист","deadline_days":2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub step: u32,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_days: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFlow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub department: Option<String>,
    pub steps: Vec<FlowStep>,
}

impl ApprovalFlow {
    /// Decodifica la columna `steps`. Texto vacío o ausente equivale a una ruta sin pasos.
    pub fn parse_steps(json: Option<&str>) -> Result<Vec<FlowStep>, CoreEngineError> {
        match json.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|e| CoreEngineError::InvalidFlowDefinition(e.to_string())),
        }
    }

    pub fn steps_json(&self) -> Result<String, CoreEngineError> {
        serde_json::to_string(&self.steps).map_err(|e| CoreEngineError::InvalidFlowDefinition(e.to_string()))
    }

    /// Número de paso más bajo; `None` si la ruta no tiene pasos.
    pub fn first_step(&self) -> Option<u32> {
        self.steps.iter().map(|s| s.step).min()
    }

    /// Entradas del grupo paralelo `step`, en el orden de la definición.
    pub fn roles_at(&self, step: u32) -> Vec<&FlowStep> {
        self.steps.iter().filter(|s| s.step == step).collect()
    }

    pub fn has_step(&self, step: u32) -> bool {
        self.steps.iter().any(|s| s.step == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PURCHASES: &str = r#"[{"step": 1, "role": "Юрист", "deadline_days": 2},
        {"step": 1, "role": "Финансовый директор", "deadline_days": 2},
        {"step": 2, "role": "Коммерческий директор"},
        {"step": 3, "role": "Генеральный директор", "deadline_days": 3}]"#;

    fn flow() -> ApprovalFlow {
        ApprovalFlow { id: 1,
                       name: "Закупки".into(),
                       description: None,
                       department: Some("Закупки".into()),
                       steps: ApprovalFlow::parse_steps(Some(PURCHASES)).unwrap() }
    }

    #[test]
    fn parses_groups_and_optional_deadline() {
        let f = flow();
        assert_eq!(f.first_step(), Some(1));
        assert_eq!(f.roles_at(1).len(), 2);
        assert_eq!(f.roles_at(2)[0].deadline_days, None);
        assert!(f.has_step(3));
        assert!(!f.has_step(4));
    }

    #[test]
    fn steps_json_is_readable_back() {
        let f = flow();
        let json = f.steps_json().unwrap();
        assert!(!json.contains("null"));
        assert_eq!(ApprovalFlow::parse_steps(Some(&json)).unwrap(), f.steps);
    }

    #[test]
    fn empty_or_broken_definitions() {
        assert!(ApprovalFlow::parse_steps(None).unwrap().is_empty());
        assert!(ApprovalFlow::parse_steps(Some("  ")).unwrap().is_empty());
        assert!(matches!(ApprovalFlow::parse_steps(Some("{not json")),
                         Err(CoreEngineError::InvalidFlowDefinition(_))));
    }
}
