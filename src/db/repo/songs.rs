//! Song catalogue operations for the repository.

use crate::catalog::search::{SearchFilter, SqlParam};
use crate::domain::{FieldValue, NewSong, Song, SongId, SongPatch};
use crate::error::CatalogError;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::Repository;

// SQLite caps bound parameters at 999.
const IN_CHUNK_SIZE: usize = 500;

/// Column list shared by every query that materialises a `Song`.
pub const SONG_COLUMNS: &str = "uuid, song_title, tags, music_key, author, lyrics, category, \
     tempo_start, tempo_end, tempo_range, source, path, query_count, img_url, mp3_url, created_at";

impl Repository {
    /// Insert a song under a fresh UUID.
    ///
    /// # Errors
    /// `MissingField` for a blank title or path, `InvalidTempo` when the
    /// schema rejects `tempo_start > tempo_end`.
    pub async fn insert_song(&self, song: &NewSong) -> Result<SongId, CatalogError> {
        if let Some(field) = song.missing_required_field() {
            return Err(CatalogError::MissingField(field));
        }

        let uuid = SongId::generate();
        sqlx::query(
            r#"
            INSERT INTO songs (
                uuid, song_title, tags, music_key, author, lyrics, category,
                tempo_start, tempo_end, source, path, img_url, mp3_url
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid.as_str())
        .bind(song.song_title.trim())
        .bind(song.tags.as_deref())
        .bind(song.music_key.as_deref())
        .bind(song.author.as_deref())
        .bind(song.lyrics.as_deref())
        .bind(song.category.as_deref())
        .bind(song.tempo_start)
        .bind(song.tempo_end)
        .bind(song.source.as_deref())
        .bind(song.path.trim())
        .bind(song.img_url.as_deref())
        .bind(song.mp3_url.as_deref())
        .execute(&self.pool)
        .await?;

        info!(uuid = %uuid, title = %song.song_title, "song created");
        Ok(uuid)
    }

    /// Replace every editable column of an existing song.
    pub async fn update_song(&self, uuid: &SongId, song: &NewSong) -> Result<(), CatalogError> {
        if let Some(field) = song.missing_required_field() {
            return Err(CatalogError::MissingField(field));
        }

        let result = sqlx::query(
            r#"
            UPDATE songs
            SET song_title = ?, tags = ?, music_key = ?, author = ?, lyrics = ?, category = ?,
                tempo_start = ?, tempo_end = ?, source = ?, path = ?, img_url = ?, mp3_url = ?
            WHERE uuid = ?
            "#,
        )
        .bind(song.song_title.trim())
        .bind(song.tags.as_deref())
        .bind(song.music_key.as_deref())
        .bind(song.author.as_deref())
        .bind(song.lyrics.as_deref())
        .bind(song.category.as_deref())
        .bind(song.tempo_start)
        .bind(song.tempo_end)
        .bind(song.source.as_deref())
        .bind(song.path.trim())
        .bind(song.img_url.as_deref())
        .bind(song.mp3_url.as_deref())
        .bind(uuid.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(uuid.to_string()));
        }
        Ok(())
    }

    /// Apply a batch of partial updates in one transaction.
    ///
    /// Patches without a uuid or columns, with unknown columns, or rejected
    /// by a constraint are skipped; the rest still commit. Returns the number
    /// of songs actually updated.
    pub async fn batch_update_songs(&self, patches: &[SongPatch]) -> Result<usize, sqlx::Error> {
        let mut updated = 0usize;
        let mut tx = self.pool.begin().await?;

        for patch in patches {
            let Some(uuid) = patch.uuid.as_deref().filter(|u| !u.trim().is_empty()) else {
                continue;
            };
            let assignments = match patch.assignments() {
                Ok(a) if !a.is_empty() => a,
                Ok(_) => continue,
                Err(field) => {
                    warn!(uuid = %uuid, field = %field, "batch update skipped: bad field");
                    continue;
                }
            };

            let set_clause = assignments
                .iter()
                .map(|(field, _)| format!("{} = ?", field.column()))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!("UPDATE songs SET {} WHERE uuid = ?", set_clause);

            let mut query = sqlx::query(&sql);
            for (_, value) in assignments {
                query = match value {
                    FieldValue::Text(v) => query.bind(v),
                    FieldValue::Integer(v) => query.bind(v),
                };
            }

            match query.bind(uuid).execute(&mut *tx).await {
                Ok(result) if result.rows_affected() > 0 => updated += 1,
                Ok(_) => debug!(uuid = %uuid, "batch update matched no song"),
                Err(sqlx::Error::Database(e)) => {
                    warn!(uuid = %uuid, error = %e, "batch update skipped: constraint");
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit().await?;
        Ok(updated)
    }

    /// Fetch one song.
    pub async fn get_song(&self, uuid: &SongId) -> Result<Option<Song>, sqlx::Error> {
        let sql = format!("SELECT {} FROM songs WHERE uuid = ?", SONG_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(uuid.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(song_from_row))
    }

    /// All songs, newest first.
    pub async fn list_songs(&self, limit: Option<i64>) -> Result<Vec<Song>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM songs ORDER BY created_at DESC, rowid DESC LIMIT ?",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit.unwrap_or(-1))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(song_from_row).collect())
    }

    /// Delete a song; playlist memberships cascade.
    pub async fn delete_song(&self, uuid: &SongId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM songs WHERE uuid = ?")
            .bind(uuid.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Most-queried songs first.
    pub async fn trending_songs(&self, limit: i64) -> Result<Vec<Song>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM songs ORDER BY query_count DESC, created_at DESC LIMIT ?",
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(limit).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(song_from_row).collect())
    }

    /// Run a ranked keyword search and bump `query_count` of every hit.
    ///
    /// The bump transaction must open with its UPDATE: under WAL a
    /// transaction that reads first cannot take the write lock once another
    /// writer has committed. Returned songs carry their counts from before
    /// the bump.
    pub async fn search_songs(
        &self,
        filter: &SearchFilter,
        limit: i64,
    ) -> Result<Vec<Song>, sqlx::Error> {
        let search = filter.build();

        let mut query = sqlx::query(&search.sql);
        for param in &search.params {
            query = match param {
                SqlParam::Text(s) => query.bind(s.as_str()),
                SqlParam::Int(i) => query.bind(*i),
            };
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;
        let songs: Vec<Song> = rows.iter().map(song_from_row).collect();

        if !songs.is_empty() {
            let mut tx = self.pool.begin().await?;
            for chunk in songs.chunks(IN_CHUNK_SIZE) {
                let placeholders = vec!["?"; chunk.len()].join(",");
                let sql = format!(
                    "UPDATE songs SET query_count = query_count + 1 WHERE uuid IN ({})",
                    placeholders
                );
                let mut bump = sqlx::query(&sql);
                for song in chunk {
                    bump = bump.bind(song.uuid.as_str());
                }
                bump.execute(&mut *tx).await?;
            }
            tx.commit().await?;
        }

        debug!(hits = songs.len(), "catalogue search");
        Ok(songs)
    }

    /// `(uuid, lyrics)` for every song that has lyrics.
    pub async fn lyrics_candidates(&self) -> Result<Vec<(SongId, String)>, sqlx::Error> {
        let rows = sqlx::query("SELECT uuid, lyrics FROM songs WHERE lyrics IS NOT NULL")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|row| (SongId::new(row.get("uuid")), row.get("lyrics")))
            .collect())
    }

    /// Fetch songs by id, preserving the order of `uuids`. Unknown ids are dropped.
    pub async fn songs_by_ids(&self, uuids: &[SongId]) -> Result<Vec<Song>, sqlx::Error> {
        if uuids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<SongId, Song> = HashMap::with_capacity(uuids.len());

        for chunk in uuids.chunks(IN_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT {} FROM songs WHERE uuid IN ({})",
                SONG_COLUMNS, placeholders
            );
            let mut query = sqlx::query(&sql);
            for uuid in chunk {
                query = query.bind(uuid.as_str());
            }
            for row in query.fetch_all(&self.pool).await? {
                let song = song_from_row(&row);
                by_id.insert(song.uuid.clone(), song);
            }
        }

        Ok(uuids.iter().filter_map(|u| by_id.remove(u)).collect())
    }

    /// Songs sharing category or key with `uuid`, closest tempo first.
    ///
    /// Returns an empty list when the target song does not exist.
    pub async fn recommendations(
        &self,
        uuid: &SongId,
        limit: i64,
    ) -> Result<Vec<Song>, sqlx::Error> {
        let Some(target) = self.get_song(uuid).await? else {
            return Ok(Vec::new());
        };

        let sql = format!(
            r#"
            SELECT {},
                   ABS(tempo_start - ?) * 0.5 + ABS(tempo_end - ?) * 0.5 AS score
            FROM songs
            WHERE uuid != ?
              AND (category = ? OR music_key = ?)
            ORDER BY score IS NULL, score ASC, query_count DESC
            LIMIT ?
            "#,
            SONG_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(target.tempo_start)
            .bind(target.tempo_end)
            .bind(uuid.as_str())
            .bind(target.category.as_deref())
            .bind(target.music_key.as_deref())
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(song_from_row).collect())
    }
}

pub(super) fn song_from_row(row: &SqliteRow) -> Song {
    Song {
        uuid: SongId::new(row.get("uuid")),
        song_title: row.get("song_title"),
        tags: row.get("tags"),
        music_key: row.get("music_key"),
        author: row.get("author"),
        lyrics: row.get("lyrics"),
        category: row.get("category"),
        tempo_start: row.get("tempo_start"),
        tempo_end: row.get("tempo_end"),
        tempo_range: row.get("tempo_range"),
        source: row.get("source"),
        path: row.get("path"),
        query_count: row.get::<Option<i64>, _>("query_count").unwrap_or(0),
        img_url: row.get("img_url"),
        mp3_url: row.get("mp3_url"),
        created_at: row.get::<Option<String>, _>("created_at").unwrap_or_default(),
    }
}
