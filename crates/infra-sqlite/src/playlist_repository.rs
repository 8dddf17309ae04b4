// SQLite PlaylistRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use playlist_export_core::domain::{Playlist, PlaylistHeader, SongSummary};
use playlist_export_core::error::Result;
use playlist_export_core::port::PlaylistRepository;
use sqlx::SqlitePool;

pub struct SqlitePlaylistRepository {
    pool: SqlitePool,
}

impl SqlitePlaylistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Library writes. The export pipeline never calls these; they exist for
    // the CRUD side of the service and for seeding test databases.

    pub async fn create_user(&self, id: &str, username: &str, fullname: &str) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, fullname) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(fullname)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn create_song(
        &self,
        id: &str,
        title: &str,
        year: i32,
        performer: &str,
        genre: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO songs (id, title, year, performer, genre) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(title)
        .bind(year)
        .bind(performer)
        .bind(genre)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    pub async fn create_playlist(&self, id: &str, name: &str, owner_id: &str) -> Result<()> {
        sqlx::query("INSERT INTO playlists (id, name, owner) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Append a song; membership order is insertion order
    pub async fn add_song_to_playlist(&self, playlist_id: &str, song_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO playlist_songs (id, playlist_id, song_id)
            VALUES ('playlistsong-' || lower(hex(randomblob(8))), ?, ?)
            "#,
        )
        .bind(playlist_id)
        .bind(song_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Delete a playlist; memberships cascade
    pub async fn delete_playlist(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PlaylistRepository for SqlitePlaylistRepository {
    async fn find_by_id(&self, playlist_id: &str) -> Result<Option<Playlist>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            "SELECT id, name, owner FROM playlists WHERE id = ?",
        )
        .bind(playlist_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| Playlist {
            id: r.id,
            name: r.name,
            owner_id: r.owner,
        }))
    }

    async fn find_header(&self, playlist_id: &str) -> Result<Option<PlaylistHeader>> {
        let row = sqlx::query_as::<_, HeaderRow>(
            r#"
            SELECT p.id, p.name, u.username
            FROM playlists p
            LEFT JOIN users u ON u.id = p.owner
            WHERE p.id = ?
            "#,
        )
        .bind(playlist_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|r| PlaylistHeader {
            id: r.id,
            name: r.name,
            username: r.username,
        }))
    }

    async fn list_song_summaries(&self, playlist_id: &str) -> Result<Vec<SongSummary>> {
        let rows = sqlx::query_as::<_, SongSummaryRow>(
            r#"
            SELECT s.id, s.title, s.performer
            FROM playlist_songs ps
            JOIN songs s ON s.id = ps.song_id
            WHERE ps.playlist_id = ?
            ORDER BY ps.seq ASC
            "#,
        )
        .bind(playlist_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|r| SongSummary {
                id: r.id,
                title: r.title,
                performer: r.performer,
            })
            .collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlaylistRow {
    id: String,
    name: String,
    owner: String,
}

#[derive(Debug, sqlx::FromRow)]
struct HeaderRow {
    id: String,
    name: String,
    username: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct SongSummaryRow {
    id: String,
    title: String,
    performer: String,
}
