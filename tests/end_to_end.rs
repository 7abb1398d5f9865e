use contractflow_rust::core::TaskOutcome;
use contractflow_rust::domain::{parse_timestamp, ContractStatus, Session};
use contractflow_rust::persistence::DbConfig;
use contractflow_rust::ContractDesk;

fn login(desk: &ContractDesk, username: &str) -> Session {
    desk.login(username, "123").expect("login")
}

#[test]
fn sales_contract_walks_the_whole_route() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("contracts.db");
    let desk = ContractDesk::open(DbConfig::for_path(path.to_string_lossy().to_string())).expect("open");
    let now = parse_timestamp("2025-03-03 10:00:00").unwrap();
    desk.initialize(now).expect("seed");

    let sales = login(&desk, "sales");
    let submitted = desk.send_for_approval(&sales, 21, now).expect("submit");
    assert_eq!(submitted.step, 1);
    assert_eq!(submitted.tasks.len(), 1);
    assert_eq!(desk.contract(21).unwrap().status, ContractStatus::OnApproval);

    // jefe de ventas, revisión de expertos, comercial, general
    let route = ["sales", "lawyer", "finance", "security", "logistics", "commercial", "gen_dir"];
    let mut last = None;
    for username in route {
        let session = login(&desk, username);
        let task = desk.inbox(&session, now)
                       .unwrap()
                       .into_iter()
                       .find(|line| line.task.contract_number.as_deref() == Some("Д-2025-021"))
                       .unwrap_or_else(|| panic!("{username} has no task"))
                       .task
                       .task_id;
        last = Some(desk.approve_task(&session, task, "ok", now).expect("approve"));
    }
    assert!(matches!(last, Some(TaskOutcome::Approved { .. })));
    assert_eq!(desk.contract(21).unwrap().status, ContractStatus::Approved);
    assert_eq!(desk.statistics().unwrap().pending_tasks, 0);
}
