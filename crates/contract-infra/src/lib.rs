//! contract-infra: configuración, log de la aplicación y `ContractDesk`, el
//! servicio que usan la CLI y la API REST.
pub mod config;
pub mod desk;
pub mod logging;

pub use config::AppConfig;
pub use desk::{ContractDesk, ContractLine, DeskError, TaskLine};
pub use logging::{flat_layer, format_line, init_logging, FlatLine};
