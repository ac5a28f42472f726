//! Client for the Qobuz-style catalog API.
//!
//! Search degrades to locally synthesized fallback results whenever the
//! remote source fails; download-url and album lookups propagate typed
//! errors so the workflow can decide how far to fall back.

use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::Value;

use crate::config;
use crate::errors::CatalogError;

/// Response envelope shared by every catalog endpoint.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Canonical search-result record.
///
/// Display fields are always non-empty; raw numeric duration/quality from
/// the upstream payload never leak out of this module.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_display: String,
    pub quality_display: String,
    pub is_fallback: bool,
    /// Opaque upstream payload, kept only to request a download URL later.
    pub raw: Value,
}

impl Track {
    /// Builds a locally synthesized fallback record.
    pub fn fallback(id: &str, title: &str, artist: &str, album: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            duration_display: "Unknown".to_string(),
            quality_display: "FLAC High Quality".to_string(),
            is_fallback: true,
            raw: Value::Null,
        }
    }
}

/// Where a search result list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Remote,
    Fallback,
}

impl Provenance {
    pub fn is_remote(self) -> bool {
        matches!(self, Provenance::Remote)
    }
}

/// Result of one search call, carrying its provenance explicitly instead of
/// hiding a "last search used the real API" flag on the client.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub tracks: Vec<Track>,
    pub provenance: Provenance,
}

impl SearchOutcome {
    /// Human-readable two-line status shown above search results.
    pub fn status_message(&self) -> String {
        match self.provenance {
            Provenance::Remote => "✅ Connected to the music catalog\n\
                                   Results below come from the live API."
                .to_string(),
            Provenance::Fallback => "⚠️ Music catalog is currently unreachable\n\
                                     Showing demonstration results instead."
                .to_string(),
        }
    }
}

/// HTTP client for the two catalog endpoints plus bulk byte fetches.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    /// Creates a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, CatalogError> {
        let client = ClientBuilder::new().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates a client from the QOBUZ_BASE_URL setting.
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::new(config::API_BASE_URL.as_str())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Searches the catalog. Never fails: transport errors, non-2xx
    /// statuses, failure-flagged responses and unparsable bodies all yield
    /// the fallback outcome so the user always sees results.
    pub async fn search(&self, query: &str, offset: u32) -> SearchOutcome {
        match self.search_remote(query, offset).await {
            Ok(tracks) => SearchOutcome {
                tracks,
                provenance: Provenance::Remote,
            },
            Err(e) => {
                log::warn!("Catalog search failed ({}), using fallback results", e);
                SearchOutcome {
                    tracks: fallback_tracks(query),
                    provenance: Provenance::Fallback,
                }
            }
        }
    }

    async fn search_remote(&self, query: &str, offset: u32) -> Result<Vec<Track>, CatalogError> {
        let url = format!(
            "{}/get-music?q={}&offset={}",
            self.base_url,
            urlencoding::encode(query),
            offset
        );
        let data = self.get_json(&url, config::network::search_timeout()).await?;

        let items = data
            .pointer("/tracks/items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items.iter().map(normalize_track).collect())
    }

    /// Requests a time-limited download URL for a track.
    pub async fn get_download_url(&self, track_id: &str, quality: &str) -> Result<String, CatalogError> {
        let url = format!(
            "{}/download-music?track_id={}&quality={}",
            self.base_url,
            urlencoding::encode(track_id),
            urlencoding::encode(quality)
        );
        let data = self.get_json(&url, config::network::search_timeout()).await?;

        data.pointer("/url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::RemoteApi {
                message: "download response carried no URL".to_string(),
            })
    }

    /// Fetches album details. Same failure contract as `get_download_url`;
    /// not on the search/download critical path.
    pub async fn get_album_details(&self, album_id: &str) -> Result<Value, CatalogError> {
        let url = format!("{}/get-album?album_id={}", self.base_url, urlencoding::encode(album_id));
        self.get_json(&url, config::network::search_timeout()).await
    }

    /// Fetches the file body behind a download URL with the long timeout.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, CatalogError> {
        let response = self
            .client
            .get(url)
            .timeout(config::network::download_timeout())
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Http(response.status()));
        }
        Ok(response.bytes().await?)
    }

    /// GET + status check + success-flag check shared by the JSON
    /// endpoints. Returns the envelope's `data` payload.
    async fn get_json(&self, url: &str, timeout: std::time::Duration) -> Result<Value, CatalogError> {
        let response = self.client.get(url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Http(response.status()));
        }
        let body = response.bytes().await?;
        let envelope: ApiEnvelope = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(CatalogError::RemoteApi {
                message: envelope
                    .error
                    .unwrap_or_else(|| "no error message in response".to_string()),
            });
        }
        Ok(envelope.data)
    }
}

/// The fixed demonstration results returned when the remote source fails.
/// Titles embed the query so the substitution is visible to the user.
fn fallback_tracks(query: &str) -> Vec<Track> {
    let fixtures = [
        ("1", "3:45", "FLAC 16bit/44.1kHz"),
        ("2", "4:12", "FLAC 24bit/96.0kHz"),
        ("3", "2:58", "FLAC 16bit/44.1kHz"),
    ];

    fixtures
        .iter()
        .map(|(id, duration, quality)| {
            let mut track = Track::fallback(
                id,
                &format!("{} - Song {}", query, id),
                &format!("Artist Name {}", id),
                &format!("Album Name {}", id),
            );
            track.duration_display = (*duration).to_string();
            track.quality_display = (*quality).to_string();
            track
        })
        .collect()
}

/// Maps one upstream item to the canonical record, defaulting every missing
/// display field so nothing downstream has to handle nulls.
fn normalize_track(item: &Value) -> Track {
    let id = match &item["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    let title = item["title"].as_str().unwrap_or("Unknown Title").to_string();

    let artist = item
        .pointer("/performer/name")
        .and_then(Value::as_str)
        .or_else(|| item["performer"].as_str())
        .unwrap_or("Unknown Artist")
        .to_string();

    let album = item
        .pointer("/album/title")
        .and_then(Value::as_str)
        .unwrap_or("Unknown Album")
        .to_string();

    Track {
        id,
        title,
        artist,
        album,
        duration_display: format_duration(item["duration"].as_f64()),
        quality_display: format_quality(
            item["maximum_bit_depth"].as_f64(),
            item["maximum_sampling_rate"].as_f64(),
        ),
        is_fallback: false,
        raw: item.clone(),
    }
}

/// Formats a duration in seconds as `m:ss`, or "Unknown" when the upstream
/// value is missing, NaN or negative.
fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => "Unknown".to_string(),
    }
}

/// Derives the human-readable quality label. Bit depth and sample rate must
/// both be present for the specific form; otherwise a generic label is used.
fn format_quality(bit_depth: Option<f64>, sample_rate_hz: Option<f64>) -> String {
    match (bit_depth, sample_rate_hz) {
        (Some(bits), Some(rate)) if bits.is_finite() && rate.is_finite() => {
            format!("FLAC {}bit/{:.1}kHz", bits as u64, rate / 1000.0)
        }
        _ => "FLAC High Quality".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalize_defaults_missing_fields() {
        let item = json!({ "id": 42, "title": null, "performer": null, "duration": 185 });
        let track = normalize_track(&item);

        assert_eq!(track.id, "42");
        assert_eq!(track.title, "Unknown Title");
        assert_eq!(track.artist, "Unknown Artist");
        assert_eq!(track.album, "Unknown Album");
        assert_eq!(track.duration_display, "3:05");
        assert_eq!(track.quality_display, "FLAC High Quality");
        assert!(!track.is_fallback);
    }

    #[test]
    fn test_normalize_full_item() {
        let item = json!({
            "id": "7890",
            "title": "One Vision",
            "performer": { "name": "Queen" },
            "album": { "title": "A Kind of Magic" },
            "duration": 310,
            "maximum_bit_depth": 24,
            "maximum_sampling_rate": 96000,
        });
        let track = normalize_track(&item);

        assert_eq!(track.id, "7890");
        assert_eq!(track.artist, "Queen");
        assert_eq!(track.album, "A Kind of Magic");
        assert_eq!(track.duration_display, "5:10");
        assert_eq!(track.quality_display, "FLAC 24bit/96.0kHz");
        assert_eq!(track.raw, item);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Some(185.0)), "3:05");
        assert_eq!(format_duration(Some(59.0)), "0:59");
        assert_eq!(format_duration(Some(0.0)), "0:00");
        assert_eq!(format_duration(Some(600.0)), "10:00");
        assert_eq!(format_duration(None), "Unknown");
        assert_eq!(format_duration(Some(f64::NAN)), "Unknown");
        assert_eq!(format_duration(Some(-3.0)), "Unknown");
    }

    #[test]
    fn test_format_quality() {
        assert_eq!(format_quality(Some(16.0), Some(44100.0)), "FLAC 16bit/44.1kHz");
        assert_eq!(format_quality(Some(24.0), Some(192000.0)), "FLAC 24bit/192.0kHz");
        assert_eq!(format_quality(Some(16.0), None), "FLAC High Quality");
        assert_eq!(format_quality(None, Some(44100.0)), "FLAC High Quality");
    }

    #[test]
    fn test_fallback_tracks_embed_query_and_have_unique_ids() {
        let tracks = fallback_tracks("Bohemian Rhapsody Queen");
        assert_eq!(tracks.len(), 3);

        for (i, track) in tracks.iter().enumerate() {
            assert_eq!(track.title, format!("Bohemian Rhapsody Queen - Song {}", i + 1));
            assert!(track.is_fallback);
            assert!(!track.duration_display.is_empty());
            assert!(!track.quality_display.is_empty());
        }

        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_status_message_distinguishes_provenance() {
        let remote = SearchOutcome {
            tracks: vec![],
            provenance: Provenance::Remote,
        };
        let fallback = SearchOutcome {
            tracks: vec![],
            provenance: Provenance::Fallback,
        };

        assert!(remote.provenance.is_remote());
        assert!(!fallback.provenance.is_remote());
        assert_ne!(remote.status_message(), fallback.status_message());
        // Two-line status used directly for display
        assert_eq!(remote.status_message().lines().count(), 2);
        assert_eq!(fallback.status_message().lines().count(), 2);
    }
}
