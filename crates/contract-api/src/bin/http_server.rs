use std::net::SocketAddr;
use std::time::Duration;

use contract_api::{build_router, spawn_deadline_sweep, ApiState};
use contract_domain::now_local;
use contract_infra::{init_logging, AppConfig, ContractDesk};
use log::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    init_logging(&config, true);
    let addr: SocketAddr = config.http_bind.parse()?;

    let desk = ContractDesk::open(config.db.clone())?;
    let seeded = desk.initialize(now_local())?;
    if !seeded.is_empty() {
        info!("Empty database seeded with demo data");
    }
    let state = ApiState::new(desk);
    let sweeper = spawn_deadline_sweep(state.clone(), Duration::from_secs(config.deadline_interval_secs));

    let app = build_router(state);
    info!("contractflow-api listening on http://{addr} (deadline sweep every {}s)", config.deadline_interval_secs);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(async {
                                  let _ = tokio::signal::ctrl_c().await;
                              })
                              .await?;
    sweeper.abort();
    info!("contractflow-api stopped");
    Ok(())
}
