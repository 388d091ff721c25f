//! Playlist ownership, capacity and membership operations for the repository.

use crate::domain::{
    PlaylistAction, PlaylistId, PlaylistSummary, Song, SongId, UserId, MAX_PLAYLISTS_PER_USER,
};
use crate::error::{is_foreign_key_violation, is_unique_violation, PlaylistError};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::info;

use super::songs::{song_from_row, SONG_COLUMNS};
use super::Repository;

const SUMMARY_SELECT: &str = r#"
    SELECT p.playlist_id, p.user_id, p.name, p.created_at,
           COUNT(ps.song_uuid) AS song_count
    FROM playlists p
    LEFT JOIN playlist_songs ps ON p.playlist_id = ps.playlist_id
"#;

impl Repository {
    /// Create a playlist for `user_id`, enforcing the per-user cap.
    ///
    /// The cap is checked by the insert itself, so concurrent creates cannot
    /// overshoot it.
    ///
    /// # Errors
    /// `EmptyName`, `DuplicateName` or `CapacityExceeded`.
    pub async fn create_playlist(
        &self,
        user_id: UserId,
        name: &str,
    ) -> Result<PlaylistId, PlaylistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO playlists (user_id, name)
            SELECT ?, ?
            WHERE (SELECT COUNT(*) FROM playlists WHERE user_id = ?) < ?
            "#,
        )
        .bind(user_id.as_i64())
        .bind(name)
        .bind(user_id.as_i64())
        .bind(MAX_PLAYLISTS_PER_USER)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(PlaylistError::CapacityExceeded),
            Ok(done) => {
                let playlist_id = PlaylistId::new(done.last_insert_rowid());
                info!(user_id = %user_id, playlist_id = %playlist_id, "playlist created");
                Ok(playlist_id)
            }
            Err(e) if is_unique_violation(&e) => Err(PlaylistError::DuplicateName),
            Err(e) => Err(PlaylistError::Db(e)),
        }
    }

    /// A user's playlists with song counts, newest first.
    pub async fn list_playlists(&self, user_id: UserId) -> Result<Vec<PlaylistSummary>, sqlx::Error> {
        let sql = format!(
            "{} WHERE p.user_id = ? GROUP BY p.playlist_id ORDER BY p.created_at DESC, p.playlist_id DESC",
            SUMMARY_SELECT
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(summary_from_row).collect())
    }

    /// One playlist, only if owned by `user_id`.
    pub async fn get_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
    ) -> Result<Option<PlaylistSummary>, sqlx::Error> {
        let sql = format!(
            "{} WHERE p.playlist_id = ? AND p.user_id = ? GROUP BY p.playlist_id",
            SUMMARY_SELECT
        );
        let row = sqlx::query(&sql)
            .bind(playlist_id.as_i64())
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(summary_from_row))
    }

    /// Rename a playlist owned by `user_id`.
    pub async fn rename_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
        name: &str,
    ) -> Result<(), PlaylistError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        let result = sqlx::query("UPDATE playlists SET name = ? WHERE playlist_id = ? AND user_id = ?")
            .bind(name)
            .bind(playlist_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(PlaylistError::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(PlaylistError::DuplicateName),
            Err(e) => Err(PlaylistError::Db(e)),
        }
    }

    /// Delete a playlist owned by `user_id`; memberships cascade.
    pub async fn delete_playlist(
        &self,
        user_id: UserId,
        playlist_id: PlaylistId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM playlists WHERE playlist_id = ? AND user_id = ?")
            .bind(playlist_id.as_i64())
            .bind(user_id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Add or remove songs in one transaction. Adding an existing member
    /// and removing a non-member are no-ops.
    ///
    /// Returns the number of membership rows changed. Ownership is the
    /// caller's responsibility.
    ///
    /// # Errors
    /// `UnknownSong` when adding a uuid that is not in the catalogue; the
    /// whole batch is rolled back.
    pub async fn manage_playlist_songs(
        &self,
        playlist_id: PlaylistId,
        song_uuids: &[SongId],
        action: PlaylistAction,
    ) -> Result<u64, PlaylistError> {
        let sql = match action {
            PlaylistAction::Add => {
                "INSERT OR IGNORE INTO playlist_songs (playlist_id, song_uuid) VALUES (?, ?)"
            }
            PlaylistAction::Remove => {
                "DELETE FROM playlist_songs WHERE playlist_id = ? AND song_uuid = ?"
            }
        };

        let mut affected = 0u64;
        let mut tx = self.pool.begin().await?;

        for uuid in song_uuids {
            let result = sqlx::query(sql)
                .bind(playlist_id.as_i64())
                .bind(uuid.as_str())
                .execute(&mut *tx)
                .await;
            match result {
                Ok(done) => affected += done.rows_affected(),
                Err(e) if is_foreign_key_violation(&e) => {
                    return Err(PlaylistError::UnknownSong(uuid.to_string()));
                }
                Err(e) => return Err(PlaylistError::Db(e)),
            }
        }

        tx.commit().await?;
        info!(playlist_id = %playlist_id, action = %action, affected, "playlist membership changed");
        Ok(affected)
    }

    /// Songs in a playlist, most recently catalogued first.
    pub async fn playlist_songs(
        &self,
        playlist_id: PlaylistId,
        limit: Option<i64>,
    ) -> Result<Vec<Song>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM songs
            JOIN playlist_songs ON songs.uuid = playlist_songs.song_uuid
            WHERE playlist_songs.playlist_id = ?
            ORDER BY songs.created_at DESC, playlist_songs.added_at DESC
            LIMIT ?
            "#,
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(playlist_id.as_i64())
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(song_from_row).collect())
    }
}

fn summary_from_row(row: &SqliteRow) -> PlaylistSummary {
    PlaylistSummary {
        playlist_id: PlaylistId::new(row.get("playlist_id")),
        user_id: UserId::new(row.get("user_id")),
        name: row.get("name"),
        created_at: row.get::<Option<String>, _>("created_at").unwrap_or_default(),
        song_count: row.get("song_count"),
    }
}
