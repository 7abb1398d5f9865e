//! contract-api: superficie REST de sólo lectura sobre `ContractDesk` y el
//! barrido periódico de plazos.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use contract_domain::{now_local, Organization};
use contract_infra::{ContractDesk, DeskError};
use contract_persistence::Statistics;
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;

#[derive(Clone)]
pub struct ApiState {
    desk: Arc<ContractDesk>,
}

impl ApiState {
    pub fn new(desk: ContractDesk) -> Self {
        Self { desk: Arc::new(desk) }
    }

    pub fn desk(&self) -> &ContractDesk {
        &self.desk
    }
}

/// Error HTTP con cuerpo `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        error!("api request failed: {err}");
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Banner {
    pub service: &'static str,
    pub version: &'static str,
    pub message: &'static str,
}

/// Corre `f` sobre el desk en el pool bloqueante de tokio (diesel es síncrono).
async fn blocking<T, F>(state: &ApiState, f: F) -> Result<T, ApiError>
    where T: Send + 'static,
          F: FnOnce(&ContractDesk) -> Result<T, DeskError> + Send + 'static
{
    let desk = Arc::clone(&state.desk);
    let joined = tokio::task::spawn_blocking(move || f(&desk)).await;
    match joined {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError { status: StatusCode::INTERNAL_SERVER_ERROR,
                                 message: format!("worker failed: {e}") }),
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new().route("/", get(banner))
                 .route("/clients", get(clients))
                 .route("/contracts/stats", get(contract_stats))
                 .with_state(state)
}

async fn banner() -> Json<Banner> {
    Json(Banner { service: "contractflow",
                  version: env!("CARGO_PKG_VERSION"),
                  message: "Contract registry API" })
}

async fn clients(State(state): State<ApiState>) -> Result<Json<Vec<Organization>>, ApiError> {
    Ok(Json(blocking(&state, |desk| desk.organizations()).await?))
}

async fn contract_stats(State(state): State<ApiState>) -> Result<Json<Statistics>, ApiError> {
    Ok(Json(blocking(&state, |desk| desk.statistics()).await?))
}

/// Un barrido de plazos; devuelve cuántas tareas vencidas se notificaron.
pub async fn sweep_deadlines(state: &ApiState) -> Result<usize, ApiError> {
    let overdue = blocking(state, |desk| desk.check_deadlines(now_local())).await?;
    if !overdue.is_empty() {
        info!("Deadline sweep: {} overdue task(s) notified", overdue.len());
    }
    Ok(overdue.len())
}

/// Lanza el barrido periódico en segundo plano.
pub fn spawn_deadline_sweep(state: ApiState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(err) = sweep_deadlines(&state).await {
                warn!("deadline sweep failed: {}", err.message);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contract_persistence::DbConfig;

    #[tokio::test]
    async fn worker_panic_becomes_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contracts.db");
        let desk = ContractDesk::open(DbConfig::for_path(path.to_string_lossy().to_string())).unwrap();
        let state = ApiState::new(desk);

        let err = blocking(&state, |_| -> Result<(), DeskError> { panic!("boom") }).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("worker failed"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
