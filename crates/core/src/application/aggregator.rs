// Playlist Aggregator - read-only snapshot of a playlist for export

use crate::domain::ExportPayload;
use crate::error::{AppError, Result};
use crate::port::PlaylistRepository;
use std::sync::Arc;
use tracing::debug;

pub struct PlaylistAggregator {
    playlists: Arc<dyn PlaylistRepository>,
}

impl PlaylistAggregator {
    pub fn new(playlists: Arc<dyn PlaylistRepository>) -> Self {
        Self { playlists }
    }

    /// Build the current snapshot of `playlist_id`.
    ///
    /// Two reads: metadata (with owner username) then member songs in
    /// insertion order. Fails with `NotFound` if the playlist is gone.
    pub async fn aggregate(&self, playlist_id: &str) -> Result<ExportPayload> {
        let header = self
            .playlists
            .find_header(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Playlist {} not found", playlist_id)))?;

        let songs = self.playlists.list_song_summaries(playlist_id).await?;

        debug!(
            playlist_id = %playlist_id,
            song_count = songs.len(),
            "Playlist aggregated"
        );

        Ok(ExportPayload::new(header, songs))
    }
}
