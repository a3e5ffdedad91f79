/// Error types for the command-line front end
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scene JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Query failed: {0}")]
    Query(#[from] viewport_query_lib::QueryError),
}

pub type Result<T> = std::result::Result<T, CliError>;
