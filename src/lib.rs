//! FlacBot - Telegram bot for searching a lossless music catalog and
//! delivering track downloads in chat.
//!
//! # Module Structure
//!
//! - `catalog`: remote catalog client with fallback search results
//! - `placeholder`: deterministic stand-in files and filename sanitizing
//! - `session`: per-chat search sessions with time-based expiry
//! - `workflow`: the search/select/download/deliver coordinator
//! - `telegram`: bot integration and handlers

pub mod catalog;
pub mod config;
pub mod errors;
pub mod placeholder;
pub mod session;
pub mod telegram;
pub mod workflow;

// Re-export commonly used types for convenience
pub use catalog::{CatalogClient, Provenance, SearchOutcome, Track};
pub use errors::{CatalogError, WorkflowError};
pub use session::SessionStore;
pub use workflow::{Coordinator, DownloadResult, SearchReply};
