// Playlist Repository Port (read side of the library store)

use crate::domain::{Playlist, PlaylistHeader, SongSummary};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to playlists and their member songs
#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    /// Playlist with its owner, for the ownership gate
    async fn find_by_id(&self, playlist_id: &str) -> Result<Option<Playlist>>;

    /// Playlist metadata left-joined with the owner's username
    async fn find_header(&self, playlist_id: &str) -> Result<Option<PlaylistHeader>>;

    /// Member songs in insertion order (empty for an empty playlist)
    async fn list_song_summaries(&self, playlist_id: &str) -> Result<Vec<SongSummary>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Library {
        playlists: HashMap<String, Playlist>,
        usernames: HashMap<String, String>,
        members: HashMap<String, Vec<SongSummary>>,
    }

    /// In-memory library store
    #[derive(Default)]
    pub struct InMemoryPlaylistRepository {
        library: Mutex<Library>,
        fail_reads: Mutex<Option<String>>,
    }

    impl InMemoryPlaylistRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_user(&self, user_id: &str, username: &str) {
            self.library
                .lock()
                .unwrap()
                .usernames
                .insert(user_id.to_string(), username.to_string());
        }

        pub fn add_playlist(&self, id: &str, name: &str, owner_id: &str) {
            let mut library = self.library.lock().unwrap();
            library.playlists.insert(
                id.to_string(),
                Playlist {
                    id: id.to_string(),
                    name: name.to_string(),
                    owner_id: owner_id.to_string(),
                },
            );
            library.members.entry(id.to_string()).or_default();
        }

        pub fn add_song(&self, playlist_id: &str, song_id: &str, title: &str, performer: &str) {
            self.library
                .lock()
                .unwrap()
                .members
                .entry(playlist_id.to_string())
                .or_default()
                .push(SongSummary {
                    id: song_id.to_string(),
                    title: title.to_string(),
                    performer: performer.to_string(),
                });
        }

        pub fn remove_playlist(&self, id: &str) {
            let mut library = self.library.lock().unwrap();
            library.playlists.remove(id);
            library.members.remove(id);
        }

        /// Make every read fail with a database error (store outage)
        pub fn fail_reads(&self, message: impl Into<String>) {
            *self.fail_reads.lock().unwrap() = Some(message.into());
        }

        fn check_available(&self) -> Result<()> {
            match self.fail_reads.lock().unwrap().as_ref() {
                Some(msg) => Err(AppError::Database(msg.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PlaylistRepository for InMemoryPlaylistRepository {
        async fn find_by_id(&self, playlist_id: &str) -> Result<Option<Playlist>> {
            self.check_available()?;
            Ok(self.library.lock().unwrap().playlists.get(playlist_id).cloned())
        }

        async fn find_header(&self, playlist_id: &str) -> Result<Option<PlaylistHeader>> {
            self.check_available()?;
            let library = self.library.lock().unwrap();
            Ok(library.playlists.get(playlist_id).map(|p| PlaylistHeader {
                id: p.id.clone(),
                name: p.name.clone(),
                username: library.usernames.get(&p.owner_id).cloned(),
            }))
        }

        async fn list_song_summaries(&self, playlist_id: &str) -> Result<Vec<SongSummary>> {
            self.check_available()?;
            Ok(self
                .library
                .lock()
                .unwrap()
                .members
                .get(playlist_id)
                .cloned()
                .unwrap_or_default())
        }
    }
}
