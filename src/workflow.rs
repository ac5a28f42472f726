//! Coordinates the search → select → download → deliver → cleanup cycle.
//!
//! A download never dead-ends on a remote failure: when the real file cannot
//! be obtained the coordinator writes a placeholder instead. Only local file
//! system failures propagate.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use fs_err::tokio as fs;
use serde_json::Value;
use teloxide::types::ChatId;

use crate::catalog::{CatalogClient, Track};
use crate::errors::{CatalogError, WorkflowError};
use crate::placeholder::{make_placeholder, sanitize_filename};
use crate::session::SessionStore;
use crate::config;

/// What a search produced for the chat layer to present.
#[derive(Debug)]
pub enum SearchReply {
    /// Ordered results (order preserved verbatim for display numbering and
    /// callback indexing) plus the provenance status line for display.
    Results { tracks: Vec<Track>, status: String },
    /// The remote source answered successfully but had nothing.
    NoResults,
}

/// Outcome of one download, alive for a single deliver-then-cleanup cycle.
#[derive(Debug)]
pub struct DownloadResult {
    pub track: Track,
    pub path: PathBuf,
    pub used_fallback: bool,
}

pub struct Coordinator {
    catalog: CatalogClient,
    sessions: Arc<SessionStore>,
    download_dir: PathBuf,
}

impl Coordinator {
    pub fn new(catalog: CatalogClient, sessions: Arc<SessionStore>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            sessions,
            download_dir: download_dir.into(),
        }
    }

    /// Runs a catalog search for the chat. Non-empty results are persisted
    /// as the chat's session; an empty remote result list writes nothing so
    /// stale buttons from an earlier search keep resolving.
    pub async fn search(&self, owner: ChatId, query: &str) -> SearchReply {
        let outcome = self.catalog.search(query, 0).await;
        if outcome.tracks.is_empty() {
            return SearchReply::NoResults;
        }

        let status = outcome.status_message();
        self.sessions.put(owner, query, outcome.tracks.clone()).await;
        log::info!(
            "Stored {} result(s) for chat {} (remote: {})",
            outcome.tracks.len(),
            owner,
            outcome.provenance.is_remote()
        );

        SearchReply::Results {
            tracks: outcome.tracks,
            status,
        }
    }

    /// Resolves a selected track id against the chat's session.
    pub async fn resolve(&self, owner: ChatId, track_id: &str) -> Result<Track, WorkflowError> {
        self.sessions
            .resolve_track(owner, track_id)
            .await
            .ok_or(WorkflowError::SessionExpired)
    }

    /// Obtains the track's bytes (real download or placeholder) and writes
    /// them under the download directory as `"{artist} - {title}.{ext}"`.
    pub async fn download(&self, track: &Track, quality: &str) -> Result<DownloadResult, WorkflowError> {
        let (bytes, used_fallback) = if track.is_fallback {
            (Bytes::from(make_placeholder(track)), true)
        } else {
            match self.fetch_real(track, quality).await {
                Ok(bytes) => (bytes, false),
                Err(e) => {
                    log::warn!(
                        "Download of track {} failed ({}), delivering placeholder",
                        track.id,
                        e
                    );
                    (Bytes::from(make_placeholder(track)), true)
                }
            }
        };

        fs::create_dir_all(&self.download_dir).await?;
        let file_name = format!(
            "{}.{}",
            sanitize_filename(&format!("{} - {}", track.artist, track.title)),
            config::quality::extension_for(quality)
        );
        let path = self.download_dir.join(file_name);
        fs::write(&path, &bytes).await?;
        log::info!("Wrote {} byte(s) to {}", bytes.len(), path.display());

        Ok(DownloadResult {
            track: track.clone(),
            path,
            used_fallback,
        })
    }

    /// Resolve + download in one step.
    pub async fn select_and_download(
        &self,
        owner: ChatId,
        track_id: &str,
        quality: &str,
    ) -> Result<DownloadResult, WorkflowError> {
        let track = self.resolve(owner, track_id).await?;
        self.download(&track, quality).await
    }

    async fn fetch_real(&self, track: &Track, quality: &str) -> Result<Bytes, CatalogError> {
        let url = self.catalog.get_download_url(&track.id, quality).await?;
        self.catalog.fetch_bytes(&url).await
    }

    /// Removes a delivered temp file. A file that is already gone is fine.
    pub async fn cleanup(&self, path: &Path) -> Result<(), WorkflowError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WorkflowError::Io(e)),
        }
    }

    /// Typed passthrough for album lookups; callers see the catalog error.
    pub async fn album_details(&self, album_id: &str) -> Result<Value, WorkflowError> {
        Ok(self.catalog.get_album_details(album_id).await?)
    }
}
