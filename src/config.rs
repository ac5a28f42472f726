use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Configuration constants for the bot

/// Base URL of the Qobuz-style catalog API
/// Read once at startup from QOBUZ_BASE_URL or defaults to the mock endpoint
pub static API_BASE_URL: Lazy<String> =
    Lazy::new(|| env::var("QOBUZ_BASE_URL").unwrap_or_else(|_| "https://api.example.com".to_string()));

/// Download folder path
/// Read from DOWNLOAD_FOLDER environment variable, defaults to ./downloads
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "./downloads".to_string()));

/// Network configuration
pub mod network {
    use super::Duration;

    /// Timeout for search and metadata calls (in seconds)
    pub const SEARCH_TIMEOUT_SECS: u64 = 10;

    /// Timeout for bulk file downloads (in seconds)
    pub const DOWNLOAD_TIMEOUT_SECS: u64 = 60;

    /// Search/metadata request timeout duration
    pub fn search_timeout() -> Duration {
        Duration::from_secs(SEARCH_TIMEOUT_SECS)
    }

    /// File download timeout duration
    pub fn download_timeout() -> Duration {
        Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)
    }
}

/// Session expiry configuration
pub mod session {
    use super::Duration;

    /// Maximum age of an idle search session (in seconds)
    pub const MAX_AGE_SECS: u64 = 30 * 60;

    /// Interval between expiry sweeps (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 10 * 60;

    /// Maximum session age duration
    pub fn max_age() -> Duration {
        Duration::from_secs(MAX_AGE_SECS)
    }

    /// Sweep interval duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Quality code handling for the catalog API
pub mod quality {
    /// Quality code the API uses for lossless FLAC
    pub const LOSSLESS: &str = "27";

    /// File extension implied by a quality code. Only "27" is ever requested
    /// today, but the mapping decides delivered filenames so it stays.
    pub fn extension_for(code: &str) -> &'static str {
        if code == LOSSLESS {
            "flac"
        } else {
            "mp3"
        }
    }
}
