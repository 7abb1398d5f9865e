
use contract_persistence::{seed_if_empty, ContractRepository, OrganizationRepository, RoleRepository, StatisticsRepository,
                           UserRepository};
use test_support::*;

#[test]
fn seed_fills_every_table_once() {
    let db = fresh_db();
    let report = seed_if_empty(&db.provider, now()).unwrap();
    assert_eq!(report.organizations, 21);
    assert_eq!(report.roles, 9);
    assert_eq!(report.users, 9);
    assert_eq!(report.flows, 3);
    assert_eq!(report.contracts, 50);

    let again = seed_if_empty(&db.provider, now()).unwrap();
    assert!(again.is_empty());

    let stats = StatisticsRepository::new(db.provider.clone()).collect().unwrap();
    assert_eq!(stats.total_contracts, 50);
    assert_eq!(stats.on_approval, 0);
    assert_eq!(stats.pending_tasks, 0);
    assert_eq!(stats.active_users, 9);
}

#[test]
fn seeded_users_log_in_with_their_roles() {
    let db = seeded_db();
    let admin = login(&db, "admin", "admin");
    assert!(admin.is_admin());
    assert_eq!(admin.department.as_deref(), Some("ИТ"));

    let lawyer = login(&db, "lawyer", "123");
    assert_eq!(lawyer.roles, vec!["Юрист".to_string()]);

    let users = UserRepository::new(db.provider.clone());
    assert!(users.authenticate("lawyer", "wrong").unwrap().is_none());
    assert!(users.authenticate("nobody", "123").unwrap().is_none());
}

#[test]
fn seeded_catalogs_are_ordered_by_name() {
    let db = seeded_db();
    let orgs = OrganizationRepository::new(db.provider.clone()).list().unwrap();
    assert_eq!(orgs.len(), 21);
    let names: Vec<&str> = orgs.iter().map(|o| o.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let roles = RoleRepository::new(db.provider.clone()).list().unwrap();
    assert_eq!(roles.len(), 9);

    let admin = login(&db, "admin", "admin");
    let contracts = ContractRepository::new(db.provider.clone()).list_visible(&admin).unwrap();
    assert_eq!(contracts.len(), 50);
    assert!(contracts.iter().all(|c| c.counterparty_name.is_some()));
}
