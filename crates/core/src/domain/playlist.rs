// Playlist Domain Model (read-only projections of the library store)

use serde::{Deserialize, Serialize};

/// Playlist as seen by the ownership gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Playlist metadata joined with the owner's display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistHeader {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
}

/// Narrow song projection; full song attributes never leave the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub performer: String,
}

/// Snapshot mailed to the requester, built fresh per job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub songs: Vec<SongSummary>,
}

impl ExportPayload {
    pub fn new(header: PlaylistHeader, songs: Vec<SongSummary>) -> Self {
        Self {
            id: header.id,
            name: header.name,
            username: header.username,
            songs,
        }
    }

    /// Body handed to the mailer
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
