//! Demo de consola: abre la base configurada, siembra si está vacía, envía un
//! contrato a aprobación y ejecuta un barrido de plazos.

use contractflow_rust::domain::{now_local, ContractStatus};
use contractflow_rust::infra::init_logging;
use contractflow_rust::{AppConfig, ContractDesk, DeskError};
use log::info;

fn run() -> Result<(), DeskError> {
    let config = AppConfig::from_env();
    init_logging(&config, true);
    let now = now_local();

    let desk = ContractDesk::open(config.db.clone())?;
    let seeded = desk.initialize(now)?;
    info!("Database {} ready (seeded: {:?})", desk.database_path().display(), seeded);

    let stats = desk.statistics()?;
    println!("contracts: {} | on approval: {} | pending tasks: {} | active users: {}",
             stats.total_contracts, stats.on_approval, stats.pending_tasks, stats.active_users);

    let admin = desk.login("admin", "admin")?;
    // el primer borrador visible entra en la ruta de su departamento
    let draft = desk.contracts(&admin, "", now)?
                    .into_iter()
                    .find(|line| line.listing.status == ContractStatus::Draft);
    if let Some(line) = draft {
        let outcome = desk.send_for_approval(&admin, line.listing.id, now)?;
        println!("contract {} sent for approval: step {} with {} task(s), deadline {}",
                 line.listing.contract_number.as_deref().unwrap_or("-"),
                 outcome.step,
                 outcome.tasks.len(),
                 outcome.deadline.format("%Y-%m-%d %H:%M"));
    }

    for overdue in desk.check_deadlines(now)? {
        println!("{}", overdue.notice());
    }
    desk.logout(&admin);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
