//! Song rows and the write-side shapes used to create and patch them.

use crate::domain::SongId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A catalogued song as stored in the `songs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub uuid: SongId,
    pub song_title: String,
    pub tags: Option<String>,
    pub music_key: Option<String>,
    pub author: Option<String>,
    pub lyrics: Option<String>,
    pub category: Option<String>,
    pub tempo_start: Option<i64>,
    pub tempo_end: Option<i64>,
    /// Generated by the database, e.g. `"72-84"`.
    pub tempo_range: Option<String>,
    pub source: Option<String>,
    pub path: String,
    pub query_count: i64,
    pub img_url: Option<String>,
    pub mp3_url: Option<String>,
    pub created_at: String,
}

/// Metadata for inserting a song or replacing every editable column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    #[serde(default)]
    pub song_title: String,
    pub tags: Option<String>,
    pub music_key: Option<String>,
    pub author: Option<String>,
    pub lyrics: Option<String>,
    pub category: Option<String>,
    pub tempo_start: Option<i64>,
    pub tempo_end: Option<i64>,
    pub source: Option<String>,
    #[serde(default)]
    pub path: String,
    pub img_url: Option<String>,
    pub mp3_url: Option<String>,
}

impl NewSong {
    pub fn new(song_title: impl Into<String>, path: impl Into<String>) -> Self {
        NewSong {
            song_title: song_title.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Name of the first required field that is blank, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.song_title.trim().is_empty() {
            Some("song_title")
        } else if self.path.trim().is_empty() {
            Some("path")
        } else {
            None
        }
    }
}

/// Editable song columns accepted by batch updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SongField {
    SongTitle,
    Tags,
    MusicKey,
    Author,
    Lyrics,
    Category,
    TempoStart,
    TempoEnd,
    Source,
    Path,
    ImgUrl,
    Mp3Url,
}

impl SongField {
    pub fn column(&self) -> &'static str {
        match self {
            SongField::SongTitle => "song_title",
            SongField::Tags => "tags",
            SongField::MusicKey => "music_key",
            SongField::Author => "author",
            SongField::Lyrics => "lyrics",
            SongField::Category => "category",
            SongField::TempoStart => "tempo_start",
            SongField::TempoEnd => "tempo_end",
            SongField::Source => "source",
            SongField::Path => "path",
            SongField::ImgUrl => "img_url",
            SongField::Mp3Url => "mp3_url",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, SongField::TempoStart | SongField::TempoEnd)
    }

    fn is_required(&self) -> bool {
        matches!(self, SongField::SongTitle | SongField::Path)
    }
}

impl FromStr for SongField {
    type Err = String;

    /// Accepts both the column name and its camelCase form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "song_title" | "songTitle" => SongField::SongTitle,
            "tags" => SongField::Tags,
            "music_key" | "musicKey" => SongField::MusicKey,
            "author" => SongField::Author,
            "lyrics" => SongField::Lyrics,
            "category" => SongField::Category,
            "tempo_start" | "tempoStart" => SongField::TempoStart,
            "tempo_end" | "tempoEnd" => SongField::TempoEnd,
            "source" => SongField::Source,
            "path" => SongField::Path,
            "img_url" | "imgUrl" => SongField::ImgUrl,
            "mp3_url" | "mp3Url" => SongField::Mp3Url,
            other => return Err(other.to_string()),
        })
    }
}

/// A value bound into a patched column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Integer(Option<i64>),
}

/// One entry of a batch update: a song uuid plus any subset of columns.
///
/// Deserialized from a flat object such as `{"uuid": "...", "tempo_start": 72}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongPatch {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl SongPatch {
    pub fn new(uuid: &SongId) -> Self {
        SongPatch {
            uuid: Some(uuid.as_str().to_string()),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(mut self, field: &str, value: serde_json::Value) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    /// Resolve the raw fields into typed column assignments.
    ///
    /// Fails with the offending key when a field is unknown, has the wrong
    /// type, or nulls out a required column.
    pub fn assignments(&self) -> Result<Vec<(SongField, FieldValue)>, String> {
        let mut out = Vec::with_capacity(self.fields.len());
        for (key, value) in &self.fields {
            let field = SongField::from_str(key)?;
            let bound = if field.is_integer() {
                match value {
                    serde_json::Value::Null => FieldValue::Integer(None),
                    v => FieldValue::Integer(Some(v.as_i64().ok_or_else(|| key.clone())?)),
                }
            } else {
                match value {
                    serde_json::Value::Null if field.is_required() => return Err(key.clone()),
                    serde_json::Value::Null => FieldValue::Text(None),
                    serde_json::Value::String(s) => FieldValue::Text(Some(s.clone())),
                    _ => return Err(key.clone()),
                }
            };
            out.push((field, bound));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_required_field() {
        assert_eq!(NewSong::default().missing_required_field(), Some("song_title"));
        assert_eq!(NewSong::new("Title", " ").missing_required_field(), Some("path"));
        assert_eq!(NewSong::new("Title", "/a.mp3").missing_required_field(), None);
    }

    #[test]
    fn test_patch_deserializes_flat_object() {
        let patch: SongPatch = serde_json::from_value(json!({
            "uuid": "abc",
            "tempo_start": 72,
            "tempoEnd": 84,
            "author": null
        }))
        .unwrap();
        assert_eq!(patch.uuid.as_deref(), Some("abc"));

        let assignments = patch.assignments().unwrap();
        assert_eq!(assignments.len(), 3);
        assert!(assignments.contains(&(SongField::TempoStart, FieldValue::Integer(Some(72)))));
        assert!(assignments.contains(&(SongField::TempoEnd, FieldValue::Integer(Some(84)))));
        assert!(assignments.contains(&(SongField::Author, FieldValue::Text(None))));
    }

    #[test]
    fn test_patch_rejects_unknown_column() {
        let patch = SongPatch::default().set("query_count", json!(1_000));
        assert_eq!(patch.assignments().unwrap_err(), "query_count");
    }

    #[test]
    fn test_patch_rejects_wrong_type_and_null_title() {
        let patch = SongPatch::default().set("tempo_start", json!("fast"));
        assert!(patch.assignments().is_err());

        let patch = SongPatch::default().set("song_title", json!(null));
        assert!(patch.assignments().is_err());
    }
}
