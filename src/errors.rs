use reqwest;
use thiserror::Error;

/// Errors from the remote catalog API.
///
/// `search` never surfaces these to callers (it degrades to fallback
/// results); `get_download_url` and `get_album_details` propagate them so
/// the workflow can decide how far to fall back.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP request failed with status: {0}")]
    Http(reqwest::StatusCode),
    #[error("catalog API reported failure: {message}")]
    RemoteApi { message: String },
    #[error("catalog response was not valid JSON")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Unavailable(#[from] reqwest::Error),
}

/// Errors surfaced by the search/download workflow.
///
/// Remote failures are absorbed into fallback delivery before they reach
/// this type; only session loss and local I/O remain.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("session expired or track not found")]
    SessionExpired,
    #[error("local file operation failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
