use thiserror::Error;

/// Error del dominio de contratos.
///
/// Los mensajes son los que ve el usuario final (CLI / REST), por eso se
/// mantienen cortos y nombran el campo que falla.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }
}
