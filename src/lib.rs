//! ContractFlow Rust Library
//!
//! Reúne los crates del registro de contratos bajo un mismo nombre:
//! - `domain`: entidades, validaciones y permisos de sesión.
//! - `core`: motor de aprobación, plazos y etiquetas.
//! - `persistence`: SQLite (diesel), siembra, copias de seguridad.
//! - `infra`: configuración, logging a fichero y `ContractDesk`.

pub use contract_core as core;
pub use contract_domain as domain;
pub use contract_infra as infra;
pub use contract_persistence as persistence;

pub use contract_infra::{AppConfig, ContractDesk, DeskError};
