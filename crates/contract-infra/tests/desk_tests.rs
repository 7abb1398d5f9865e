use chrono::NaiveDateTime;
use contract_core::{ContractTag, CoreEngineError, TaskOutcome, TaskTag};
use contract_domain::{parse_timestamp, ContractDraft, ContractStatus, DomainError, OrganizationDraft, OrganizationType, Priority,
                      Session, UserDraft};
use contract_infra::{ContractDesk, DeskError};
use contract_persistence::DbConfig;
use tempfile::TempDir;

fn at(s: &str) -> NaiveDateTime {
    parse_timestamp(s).expect("valid timestamp")
}

fn now() -> NaiveDateTime {
    at("2025-03-03 10:00:00")
}

fn desk() -> (TempDir, ContractDesk) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("contracts.db");
    let desk = ContractDesk::open(DbConfig::for_path(path.to_string_lossy().to_string())).expect("open");
    desk.initialize(now()).expect("seed");
    (dir, desk)
}

fn login(desk: &ContractDesk, username: &str) -> Session {
    let password = if username == "admin" { "admin" } else { "123" };
    desk.login(username, password).expect("login")
}

fn draft(number: &str) -> ContractDraft {
    ContractDraft { contract_number: number.into(),
                    title: "Поставка запчастей".into(),
                    counterparty_id: Some(1),
                    amount: 120_000.0,
                    department: "Закупки".into(),
                    file_path: None,
                    priority: Priority::Standard,
                    custom_deadline: None }
}

/// Tarea pendiente del usuario para el contrato `number`.
fn task_of(desk: &ContractDesk, session: &Session, number: &str) -> i32 {
    desk.inbox(session, now())
        .unwrap()
        .into_iter()
        .find(|line| line.task.contract_number.as_deref() == Some(number))
        .unwrap_or_else(|| panic!("{} has no task for {number}", session.username))
        .task
        .task_id
}

#[test]
fn login_rejects_wrong_password() {
    let (_dir, desk) = desk();
    assert!(matches!(desk.login("lawyer", "wrong"), Err(DeskError::InvalidCredentials)));
    assert!(matches!(desk.login("", ""), Err(DeskError::InvalidCredentials)));
    let admin = login(&desk, "admin");
    assert!(admin.is_admin());
    desk.logout(&admin);
}

#[test]
fn user_management_is_admin_only() {
    let (_dir, desk) = desk();
    let lawyer = login(&desk, "lawyer");
    let admin = login(&desk, "admin");
    let new_user = UserDraft { username: "auditor".into(),
                               full_name: "Аудитор Первый".into(),
                               password: Some("secret".into()),
                               department: Some("Финансы".into()),
                               position: None,
                               is_active: true,
                               roles: vec!["Финансовый директор".into()] };

    assert!(matches!(desk.create_user(&lawyer, &new_user, now()), Err(DeskError::Domain(DomainError::Forbidden(_)))));
    assert!(matches!(desk.users(&lawyer), Err(DeskError::Domain(DomainError::Forbidden(_)))));

    let id = desk.create_user(&admin, &new_user, now()).unwrap();
    assert_eq!(desk.users(&admin).unwrap().len(), 10);
    assert!(desk.login("auditor", "secret").is_ok());
    assert!(matches!(desk.create_user(&admin, &new_user, now()), Err(DeskError::Domain(DomainError::Conflict(_)))));

    assert!(matches!(desk.delete_user(&admin, admin.user_id), Err(DeskError::Domain(DomainError::Conflict(_)))));
    desk.delete_user(&admin, id).unwrap();
    assert!(matches!(desk.login("auditor", "secret"), Err(DeskError::InvalidCredentials)));
}

#[test]
fn organizations_are_managed_by_directors() {
    let (_dir, desk) = desk();
    let org = OrganizationDraft { name: "ООО 'Северный склад'".into(),
                                  organization_type: OrganizationType::Legal,
                                  inn: "7720000007".into(),
                                  kpp: Some("772001001".into()),
                                  ..Default::default() };
    let lawyer = login(&desk, "lawyer");
    assert!(matches!(desk.create_organization(&lawyer, org.clone(), now()),
                     Err(DeskError::Domain(DomainError::Forbidden(_)))));

    let commercial = login(&desk, "commercial");
    let before = desk.organizations().unwrap().len();
    let id = desk.create_organization(&commercial, org, now()).unwrap();
    assert_eq!(desk.organizations().unwrap().len(), before + 1);
    assert_eq!(desk.organization(id).unwrap().kpp.as_deref(), Some("772001001"));
    desk.delete_organization(&commercial, id).unwrap();
    assert_eq!(desk.organization_options().unwrap().len(), before);
}

#[test]
fn new_contract_gets_priority_deadline_and_shows_in_search() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    let id = desk.create_contract(&purchase, &draft("Д-2025-900"), now()).unwrap();

    let contract = desk.contract(id).unwrap();
    assert_eq!(contract.status, ContractStatus::Draft);
    assert_eq!(contract.owner_id, Some(purchase.user_id));
    assert_eq!(contract.deadline_at, Some(at("2025-03-06 18:00:00")));

    let found = desk.contracts(&purchase, "д-2025-900", now()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].tag, ContractTag::None);
    assert!(matches!(desk.create_contract(&purchase, &draft("Д-2025-900"), now()),
                     Err(DeskError::Domain(DomainError::Conflict(_)))));
}

#[test]
fn custom_deadline_must_be_in_the_future() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    let past = ContractDraft { priority: Priority::Custom,
                               custom_deadline: Some(at("2025-03-01 12:00:00")),
                               ..draft("Д-2025-901") };
    assert!(matches!(desk.create_contract(&purchase, &past, now()),
                     Err(DeskError::Engine(CoreEngineError::DeadlineInPast))));
}

#[test]
fn only_the_assignee_or_an_admin_resolves_a_task() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    desk.send_for_approval(&purchase, 1, now()).unwrap();

    let lawyer = login(&desk, "lawyer");
    let lawyer_task = task_of(&desk, &lawyer, "Д-2025-001");
    let security = login(&desk, "security");
    assert!(matches!(desk.approve_task(&security, lawyer_task, "", now()),
                     Err(DeskError::Domain(DomainError::Forbidden(_)))));
    assert!(matches!(desk.approve_task(&lawyer, lawyer_task, "", now()).unwrap(), TaskOutcome::StepOpen { pending: 3 }));

    let admin = login(&desk, "admin");
    let security_task = task_of(&desk, &security, "Д-2025-001");
    assert!(matches!(desk.reject_task(&admin, security_task, "нет допуска", now()).unwrap(),
                     TaskOutcome::Rejected { cancelled: 2, .. }));
    assert_eq!(desk.contract(1).unwrap().status, ContractStatus::Rejected);
    assert!(matches!(desk.approve_task(&admin, security_task, "", now()),
                     Err(DeskError::Engine(CoreEngineError::TaskNotPending(_)))));
}

#[test]
fn approved_contract_needs_reopen_to_be_edited() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    desk.send_for_approval(&purchase, 1, now()).unwrap();
    for username in ["lawyer", "finance", "security", "logistics", "commercial", "gen_dir"] {
        let session = login(&desk, username);
        let task = task_of(&desk, &session, "Д-2025-001");
        desk.approve_task(&session, task, "", now()).unwrap();
    }
    assert_eq!(desk.contract(1).unwrap().status, ContractStatus::Approved);
    let status = desk.approval_status(1).unwrap();
    assert_eq!(status.instances[0].status, "finished");

    let edit = ContractDraft { title: "Поставка сырья (доп. соглашение)".into(), ..draft("Д-2025-001") };
    assert!(matches!(desk.update_contract(&purchase, 1, &edit, false, now()),
                     Err(DeskError::Domain(DomainError::Conflict(_)))));
    desk.update_contract(&purchase, 1, &edit, true, now()).unwrap();
    let contract = desk.contract(1).unwrap();
    assert_eq!(contract.status, ContractStatus::Draft);
    assert_eq!(contract.title, "Поставка сырья (доп. соглашение)");
}

#[test]
fn deadline_changes_are_for_directors() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    desk.send_for_approval(&purchase, 2, now()).unwrap();
    assert!(matches!(desk.change_deadline(&purchase, 2, Priority::Standard, None, now()),
                     Err(DeskError::Domain(DomainError::Forbidden(_)))));

    let director = login(&desk, "gen_dir");
    let moved = desk.change_deadline(&director, 2, Priority::Standard, None, now()).unwrap();
    assert_eq!(moved.deadline, at("2025-03-06 18:00:00"));
    assert_eq!(moved.moved_tasks, 4);
}

#[test]
fn overdue_tasks_are_tagged_and_swept_once() {
    let (_dir, desk) = desk();
    let purchase = login(&desk, "purchase");
    // срочный: vence a las 24 h
    desk.send_for_approval(&purchase, 2, now()).unwrap();
    let later = at("2025-03-04 12:00:00");

    let lawyer = login(&desk, "lawyer");
    let inbox = desk.inbox(&lawyer, later).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].tag, TaskTag::Overdue);

    let overdue = desk.check_deadlines(later).unwrap();
    assert_eq!(overdue.len(), 4);
    assert!(desk.check_deadlines(later).unwrap().is_empty());
}

#[test]
fn statistics_follow_the_workflow() {
    let (_dir, desk) = desk();
    let stats = desk.statistics().unwrap();
    assert_eq!(stats.total_contracts, 50);
    assert_eq!(stats.on_approval, 0);
    let purchase = login(&desk, "purchase");
    desk.send_for_approval(&purchase, 1, now()).unwrap();
    let stats = desk.statistics().unwrap();
    assert_eq!(stats.on_approval, 1);
    assert_eq!(stats.pending_tasks, 4);

    let admin = login(&desk, "admin");
    let audit = desk.recent_audit(&admin, 5).unwrap();
    assert_eq!(audit[0].action.as_deref(), Some("send_for_approval"));
    assert!(desk.recent_audit(&purchase, 5).is_err());
}

#[test]
fn backup_and_reset_are_admin_only() {
    let (dir, desk) = desk();
    let admin = login(&desk, "admin");
    let lawyer = login(&desk, "lawyer");
    let backups = dir.path().join("backups");

    assert!(matches!(desk.backup(&lawyer, &backups, now()), Err(DeskError::Domain(DomainError::Forbidden(_)))));
    let copy = desk.backup(&admin, &backups, now()).unwrap();
    assert_eq!(copy, backups.join("backup_20250303_100000.db"));
    assert!(copy.is_file());

    let purchase = login(&desk, "purchase");
    desk.delete_contract(&purchase, 50).unwrap();
    assert_eq!(desk.statistics().unwrap().total_contracts, 49);

    let (desk, report) = desk.reset(&admin, now()).unwrap();
    assert_eq!(report.contracts, 50);
    assert_eq!(desk.statistics().unwrap().total_contracts, 50);
}
