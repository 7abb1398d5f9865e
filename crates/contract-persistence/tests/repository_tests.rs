
use contract_core::ApprovalStore;
use contract_domain::{ContractDraft, ContractStatus, DomainError, OrganizationDraft, OrganizationType, Priority, UserDraft};
use contract_persistence::{ContractRepository, OrganizationRepository, PersistenceError, SqliteApprovalStore, UserRepository};
use test_support::*;

fn valid_org() -> OrganizationDraft {
    OrganizationDraft { name: "ИП Тестов".into(),
                        organization_type: OrganizationType::Individual,
                        inn: "500100732259".into(),
                        kpp: Some("  ".into()),
                        ogrn: Some("304500116000157".into()),
                        legal_address: None,
                        phone: Some("+7 (495) 111-2233".into()),
                        email: Some("test@example.ru".into()) }
}

fn contract_draft(number: &str, counterparty: i32) -> ContractDraft {
    ContractDraft { contract_number: number.into(),
                    title: "Тестовый договор".into(),
                    counterparty_id: Some(counterparty),
                    amount: 1000.0,
                    department: "Закупки".into(),
                    file_path: None,
                    priority: Priority::Standard,
                    custom_deadline: None }
}

fn is_conflict(err: &PersistenceError) -> bool {
    matches!(err, PersistenceError::Domain(DomainError::Conflict(_)))
}

#[test]
fn organization_crud_normalizes_and_validates() {
    let db = fresh_db();
    let repo = OrganizationRepository::new(db.provider.clone());
    let id = repo.create(valid_org(), now()).unwrap();
    let stored = repo.get(id).unwrap();
    assert_eq!(stored.organization_type, OrganizationType::Individual);
    assert!(stored.kpp.is_none());
    assert_eq!(stored.created_at, Some(now()));

    let bad = OrganizationDraft { inn: "123".into(), ..valid_org() };
    assert!(matches!(repo.create(bad, now()), Err(PersistenceError::Domain(DomainError::Validation(_)))));

    repo.update(id, OrganizationDraft { name: "ИП Тестов-Обновлён".into(), ..valid_org() }).unwrap();
    assert_eq!(repo.get(id).unwrap().name, "ИП Тестов-Обновлён");
    assert_eq!(repo.options().unwrap().len(), 1);

    repo.delete(id).unwrap();
    assert!(matches!(repo.get(id), Err(PersistenceError::Domain(DomainError::NotFound(_)))));
}

#[test]
fn organization_in_use_cannot_be_deleted() {
    let db = seeded_db();
    let repo = OrganizationRepository::new(db.provider.clone());
    let supplier = repo.list().unwrap().into_iter().find(|o| o.name == "ООО 'Поставщик+'").unwrap();
    let used = repo.contract_count(supplier.id).unwrap();
    assert_eq!(used, 5);
    let err = repo.delete(supplier.id).unwrap_err();
    assert!(is_conflict(&err));
    assert!(err.to_string().contains("5 contract(s)"));
}

#[test]
fn users_replace_roles_and_keep_password_when_omitted() {
    let db = seeded_db();
    let repo = UserRepository::new(db.provider.clone());
    let draft = UserDraft { username: "lawyer2".into(),
                            full_name: "Юрист Второй".into(),
                            password: Some("secret".into()),
                            department: Some("Юридический".into()),
                            position: None,
                            is_active: true,
                            roles: vec!["Юрист".into(), "Нет такой роли".into()] };
    let id = repo.create(&draft, now()).unwrap();
    assert_eq!(repo.roles_of(id).unwrap(), vec!["Юрист".to_string()]);
    assert!(is_conflict(&repo.create(&draft, now()).unwrap_err()));

    let edit = UserDraft { password: None,
                           roles: vec!["Служба безопасности".into(), "Юрист".into()],
                           ..draft.clone() };
    repo.update(id, &edit).unwrap();
    assert_eq!(repo.roles_of(id).unwrap().len(), 2);
    assert!(repo.authenticate("lawyer2", "secret").unwrap().is_some());

    let listed = repo.list().unwrap().into_iter().find(|u| u.user.id == id).unwrap();
    assert_eq!(listed.roles.len(), 2);

    repo.update(id, &UserDraft { is_active: false, ..edit }).unwrap();
    assert!(repo.authenticate("lawyer2", "secret").unwrap().is_none());
    assert!(repo.list_active().unwrap().iter().all(|u| u.user.id != id));

    repo.delete(id).unwrap();
    assert!(repo.roles_of(id).unwrap().is_empty());
    assert!(repo.get(id).is_err());
}

#[test]
fn contract_numbers_are_unique_and_visibility_follows_roles() {
    let db = seeded_db();
    let contracts = ContractRepository::new(db.provider.clone());
    let orgs = OrganizationRepository::new(db.provider.clone()).options().unwrap();
    let purchase = login(&db, "purchase", "123");
    let lawyer = login(&db, "lawyer", "123");

    let deadline = at("2025-03-06 18:00:00");
    let id = contracts.create(&contract_draft("Т-1", orgs[0].id), purchase.user_id, deadline, now()).unwrap();
    let stored = contracts.get(id).unwrap();
    assert_eq!(stored.status, ContractStatus::Draft);
    assert_eq!(stored.owner_id, Some(purchase.user_id));
    assert_eq!(stored.counterparty_id, Some(orgs[0].id));
    assert_eq!(stored.deadline_at, Some(deadline));

    let dup = contracts.create(&contract_draft("Т-1", orgs[0].id), purchase.user_id, deadline, now()).unwrap_err();
    assert!(is_conflict(&dup));

    let mine = contracts.list_visible(&purchase).unwrap();
    assert_eq!(mine.len(), 21);
    assert_eq!(mine[0].id, id);
    assert!(contracts.list_visible(&lawyer).unwrap().is_empty());

    let mut store = SqliteApprovalStore::from_provider(&db.provider).unwrap();
    store.set_contract_status(id, ContractStatus::OnApproval, now()).unwrap();
    let visible = contracts.list_visible(&lawyer).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].contract_number.as_deref(), Some("Т-1"));
}

#[test]
fn approved_contract_reopens_as_draft_once() {
    let db = seeded_db();
    let contracts = ContractRepository::new(db.provider.clone());
    let mut store = SqliteApprovalStore::from_provider(&db.provider).unwrap();
    store.set_contract_status(1, ContractStatus::Approved, now()).unwrap();

    assert!(contracts.reopen_for_edit(1, now()).unwrap());
    assert_eq!(contracts.get(1).unwrap().status, ContractStatus::Draft);
    assert!(!contracts.reopen_for_edit(1, now()).unwrap());
}

#[test]
fn update_keeps_status_and_missing_contract_is_not_found() {
    let db = seeded_db();
    let contracts = ContractRepository::new(db.provider.clone());
    let orgs = OrganizationRepository::new(db.provider.clone()).options().unwrap();
    let deadline = at("2025-03-10 18:00:00");
    contracts.update(1, &contract_draft("Д-2025-001", orgs[1].id), deadline, now()).unwrap();
    let stored = contracts.get(1).unwrap();
    assert_eq!(stored.title, "Тестовый договор");
    assert_eq!(stored.status, ContractStatus::Draft);
    assert_eq!(stored.updated_at, Some(now()));

    let err = contracts.update(9999, &contract_draft("X", orgs[1].id), deadline, now()).unwrap_err();
    assert!(matches!(err, PersistenceError::Domain(DomainError::NotFound(_))));
    assert!(contracts.delete(9999).is_err());
}
