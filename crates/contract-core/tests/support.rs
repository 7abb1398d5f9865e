#![allow(dead_code)]

use chrono::NaiveDateTime;
use contract_core::{ApprovalFlow, ContractSnapshot, InMemoryApprovalStore};
use contract_domain::{parse_timestamp, ContractStatus, Priority};

pub fn at(s: &str) -> NaiveDateTime {
    parse_timestamp(s).expect("valid timestamp")
}

pub fn flow(id: i32, department: &str, steps: &str) -> ApprovalFlow {
    ApprovalFlow { id,
                   name: department.to_string(),
                   description: None,
                   department: Some(department.to_string()),
                   steps: ApprovalFlow::parse_steps(Some(steps)).expect("valid steps") }
}

pub fn draft(id: i32, department: &str, priority: Priority) -> ContractSnapshot {
    ContractSnapshot { id,
                       contract_number: Some(format!("Д-2025-{id:03}")),
                       status: ContractStatus::Draft,
                       department: Some(department.to_string()),
                       priority,
                       deadline_at: None }
}

/// Store con dos rutas (Закупки y Общий), seis usuarios y tres contratos en borrador.
pub fn seeded_store() -> InMemoryApprovalStore {
    let mut store = InMemoryApprovalStore::new();
    store.add_flow(flow(1,
                        "Закупки",
                        r#"[{"step":1,"role":"Юрист","deadline_days":2},
                            {"step":1,"role":"Финансовый директор","deadline_days":2},
                            {"step":2,"role":"Коммерческий директор","deadline_days":2},
                            {"step":3,"role":"Генеральный директор"}]"#));
    store.add_flow(flow(2, "Общий", r#"[{"step":1,"role":"Юрист","deadline_days":2}]"#));
    store.add_user(1, "Администратор", &["Администратор"], true);
    store.add_user(2, "Юрист Первый", &["Юрист"], true);
    store.add_user(3, "Финансовый Директор", &["Финансовый директор"], true);
    store.add_user(4, "Коммерческий Директор", &["Коммерческий директор"], true);
    store.add_user(5, "Генеральный Директор", &["Генеральный директор"], true);
    store.add_user(6, "Юрист Второй", &["Юрист"], true);
    store.add_contract(draft(10, "Закупки", Priority::Standard));
    store.add_contract(draft(11, "Маркетинг", Priority::Urgent));
    store.add_contract(draft(12, "Закупки", Priority::Standard));
    store
}
