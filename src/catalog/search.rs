//! Keyword search composition.
//!
//! A search ranks songs by
//!
//! ```text
//! relevance  = query_count * 0.3 + similarity * 0.7
//! similarity = title_hit * 3 + lyrics_hit * 2 + author_hit * 1.5 + tags_hit * 1
//! ```
//!
//! where each `*_hit` is a case-insensitive substring match of the search
//! term. Tempo bounds keep only songs whose range overlaps `[min, max]`;
//! category, author and musical key are exact filters.

use crate::db::repo::SONG_COLUMNS;
use serde::Deserialize;

pub const TITLE_WEIGHT: f64 = 3.0;
pub const LYRICS_WEIGHT: f64 = 2.0;
pub const AUTHOR_WEIGHT: f64 = 1.5;
pub const TAGS_WEIGHT: f64 = 1.0;

pub const POPULARITY_WEIGHT: f64 = 0.3;
pub const SIMILARITY_WEIGHT: f64 = 0.7;

/// Optional criteria for a catalogue search. Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub term: Option<String>,
    pub min_tempo: Option<i64>,
    pub max_tempo: Option<i64>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub music_key: Option<String>,
}

/// A positional SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

/// SQL text plus its parameters in bind order, not including the limit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SearchFilter {
    pub fn with_term(term: impl Into<String>) -> Self {
        SearchFilter {
            term: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn tempo(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_tempo = min;
        self.max_tempo = max;
        self
    }

    fn term(&self) -> Option<&str> {
        non_blank(&self.term)
    }

    /// Compose the ranked, filtered query. The trailing `LIMIT ?` is left
    /// for the caller to bind.
    pub fn build(&self) -> SearchQuery {
        let mut params = Vec::new();

        let similarity_clause = match self.term() {
            Some(term) => {
                let pattern = format!("%{}%", escape_like(term));
                for _ in 0..4 {
                    params.push(SqlParam::Text(pattern.clone()));
                }
                format!(
                    "((song_title LIKE ? ESCAPE '\\') * {} + \
                      (COALESCE(lyrics, '') LIKE ? ESCAPE '\\') * {} + \
                      (COALESCE(author, '') LIKE ? ESCAPE '\\') * {} + \
                      (COALESCE(tags, '') LIKE ? ESCAPE '\\') * {}) AS similarity",
                    TITLE_WEIGHT, LYRICS_WEIGHT, AUTHOR_WEIGHT, TAGS_WEIGHT
                )
            }
            None => "0 AS similarity".to_string(),
        };

        let mut conditions = Vec::new();
        if let Some(min) = self.min_tempo {
            conditions.push("tempo_end >= ?");
            params.push(SqlParam::Int(min));
        }
        if let Some(max) = self.max_tempo {
            conditions.push("tempo_start <= ?");
            params.push(SqlParam::Int(max));
        }
        for (column, value) in [
            ("category = ?", &self.category),
            ("author = ?", &self.author),
            ("music_key = ?", &self.music_key),
        ] {
            if let Some(v) = non_blank(value) {
                conditions.push(column);
                params.push(SqlParam::Text(v.to_string()));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            r#"
            SELECT {columns},
                   (query_count * {pop} + similarity * {sim}) AS relevance
            FROM (
                SELECT *, {similarity_clause}
                FROM songs
                {where_clause}
            )
            ORDER BY relevance DESC, query_count DESC, created_at DESC
            LIMIT ?
            "#,
            columns = SONG_COLUMNS,
            pop = POPULARITY_WEIGHT,
            sim = SIMILARITY_WEIGHT,
        );

        SearchQuery { sql, params }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_criteria_has_zero_similarity_and_no_where() {
        let q = SearchFilter::default().build();
        assert!(q.sql.contains("0 AS similarity"));
        assert!(!q.sql.contains("WHERE"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn test_term_binds_four_patterns() {
        let q = SearchFilter::with_term("love").build();
        assert_eq!(q.params.len(), 4);
        assert!(q
            .params
            .iter()
            .all(|p| *p == SqlParam::Text("%love%".to_string())));
    }

    #[test]
    fn test_tempo_bounds_use_overlap() {
        let q = SearchFilter::default().tempo(Some(70), Some(90)).build();
        assert!(q.sql.contains("tempo_end >= ? AND tempo_start <= ?"));
        assert_eq!(q.params, vec![SqlParam::Int(70), SqlParam::Int(90)]);
    }

    #[test]
    fn test_param_order_matches_placeholders() {
        let filter = SearchFilter {
            term: Some("x".into()),
            min_tempo: Some(60),
            category: Some("Rock".into()),
            music_key: Some("C#".into()),
            ..Default::default()
        };
        let q = filter.build();
        assert_eq!(q.sql.matches('?').count(), q.params.len() + 1);
        assert_eq!(q.params[4], SqlParam::Int(60));
        assert_eq!(q.params[5], SqlParam::Text("Rock".into()));
        assert_eq!(q.params[6], SqlParam::Text("C#".into()));
    }

    #[test]
    fn test_blank_strings_are_ignored() {
        let filter = SearchFilter {
            term: Some("   ".into()),
            author: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter.build(), SearchFilter::default().build());
    }

    #[test]
    fn test_like_wildcards_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }
}
