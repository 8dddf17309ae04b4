// Ownership Gate - only a playlist's owner may export it

use crate::error::{AppError, Result};
use crate::port::PlaylistRepository;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct OwnershipGate {
    playlists: Arc<dyn PlaylistRepository>,
}

impl OwnershipGate {
    pub fn new(playlists: Arc<dyn PlaylistRepository>) -> Self {
        Self { playlists }
    }

    /// Fails with `NotFound` for an unknown playlist and `Authorization` when
    /// `requester_id` is not the owner. No side effects.
    pub async fn verify_owner(&self, playlist_id: &str, requester_id: &str) -> Result<()> {
        let playlist = self
            .playlists
            .find_by_id(playlist_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

        if playlist.owner_id != requester_id {
            warn!(
                playlist_id = %playlist_id,
                requester_id = %requester_id,
                "Export rejected: requester is not the playlist owner"
            );
            return Err(AppError::Authorization(
                "You are not entitled to access this resource".to_string(),
            ));
        }

        debug!(playlist_id = %playlist_id, "Ownership verified");
        Ok(())
    }
}
