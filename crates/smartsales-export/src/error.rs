//! Export error types

use smartsales_core::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No hay datos para exportar")]
    EmptyExport,

    #[error("Export destination unavailable: {0}")]
    SinkUnavailable(String),

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("Duplicate column key: {0}")]
    DuplicateColumn(String),

    #[error("Column '{0}' has neither an accessor nor an export value")]
    InvalidColumn(String),

    #[error("Unsupported export cap {0}; expected one of 100, 500, 1000, 5000")]
    InvalidCap(u32),

    #[error("Job targets {expected} but was handed to the {actual} sink")]
    SinkMismatch { expected: String, actual: String },

    #[error("Failed to fetch export rows: {0}")]
    Fetch(#[from] smartsales_core::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("PDF render error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::EmptyExport => ErrorKind::EmptyExport,
            ExportError::SinkUnavailable(_) => ErrorKind::SinkUnavailable,
            ExportError::ExportInProgress => ErrorKind::ExportInProgress,
            ExportError::DuplicateColumn(_)
            | ExportError::InvalidColumn(_)
            | ExportError::InvalidCap(_)
            | ExportError::SinkMismatch { .. } => ErrorKind::InvalidArgument,
            ExportError::Fetch(inner) => inner.kind(),
            ExportError::Xlsx(_) | ExportError::Pdf(_) | ExportError::Io(_) => ErrorKind::Io,
        }
    }

    /// Text suitable for a notice shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ExportError::SinkUnavailable(_) => {
                "Por favor, habilite las ventanas emergentes para imprimir el reporte.".to_string()
            }
            ExportError::Fetch(inner) => {
                format!("Error al preparar la exportación: {}", inner.user_message())
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ExportError::EmptyExport.kind(), ErrorKind::EmptyExport);
        assert_eq!(
            ExportError::SinkUnavailable("popup blocked".into()).kind(),
            ErrorKind::SinkUnavailable
        );
        assert_eq!(ExportError::InvalidCap(42).kind(), ErrorKind::InvalidArgument);

        let fetch = ExportError::from(smartsales_core::Error::Network("refused".into()));
        assert_eq!(fetch.kind(), ErrorKind::Network);
        assert!(fetch.user_message().starts_with("Error al preparar la exportación"));
    }
}
