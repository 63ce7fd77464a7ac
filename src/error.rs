use thiserror::Error;

pub type TabulaResult<T> = Result<T, TabulaError>;

#[derive(Error, Debug)]
pub enum TabulaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Named table, column or header line is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unrecognized write-mode string
    #[error("Invalid write mode '{0}' (expected overwrite, append or overlay)")]
    InvalidMode(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Duplicate header '{name}' at positions {first} and {second}")]
    DuplicateHeader {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl TabulaError {
    pub(crate) fn table_not_found(table: &str) -> Self {
        TabulaError::NotFound(format!("table '{}'", table))
    }
}
