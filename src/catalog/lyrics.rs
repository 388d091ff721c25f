//! Lyrics matching: sequence ratio plus containment and prefix bonuses.

use super::similarity::ratio;
use crate::domain::SongId;
use std::cmp::Ordering;

pub const RATIO_WEIGHT: f64 = 0.8;
pub const CONTAINS_BONUS: f64 = 0.15;
pub const PREFIX_BONUS: f64 = 0.05;
pub const ACCEPT_THRESHOLD: f64 = 0.4;

/// A song whose lyrics matched a query.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricsMatch {
    pub uuid: SongId,
    pub score: f64,
}

/// Score one lyric against an already-lowercased query.
pub fn score(query_lower: &str, lyric: &str) -> (f64, bool) {
    let lyric = lyric.to_lowercase();
    let contained = lyric.contains(query_lower);

    let mut score = ratio(query_lower, &lyric) * RATIO_WEIGHT;
    if contained {
        score += CONTAINS_BONUS;
    }
    if lyric.starts_with(query_lower) {
        score += PREFIX_BONUS;
    }
    (score, contained)
}

/// Rank `candidates` by lyric similarity to `query`, best first.
///
/// A candidate is kept when its score clears the threshold or its lyric
/// contains the whole query. Equal scores keep candidate order.
pub fn rank<I>(query: &str, candidates: I, limit: usize) -> Vec<LyricsMatch>
where
    I: IntoIterator<Item = (SongId, String)>,
{
    let query_lower = query.trim().to_lowercase();
    if query_lower.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut matches: Vec<LyricsMatch> = candidates
        .into_iter()
        .filter_map(|(uuid, lyric)| {
            let (score, contained) = score(&query_lower, &lyric);
            (score > ACCEPT_THRESHOLD || contained).then_some(LyricsMatch { uuid, score })
        })
        .collect();

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    matches.truncate(limit);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> SongId {
        SongId::new(format!("00000000-0000-0000-0000-0000000000{:02}", n))
    }

    #[test]
    fn test_exact_lyric_scores_full_bonus() {
        let (s, contained) = score("you can dance", "You can dance");
        assert!(contained);
        assert!((s - (0.8 + 0.15 + 0.05)).abs() < 1e-9);
    }

    #[test]
    fn test_unrelated_lyric_rejected() {
        let out = rank(
            "you can dance",
            vec![(id(1), "zzzz qqqq wwww".to_string())],
            5,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_substring_of_long_lyric_is_kept() {
        let long = format!(
            "{} you can dance, you can jive {}",
            "verse line ".repeat(30),
            "chorus line ".repeat(30)
        );
        let (s, _) = score("you can dance", &long);
        assert!(s <= ACCEPT_THRESHOLD, "precondition: ratio alone is low");

        let out = rank("You Can Dance", vec![(id(1), long)], 5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].uuid, id(1));
    }

    #[test]
    fn test_ranked_best_first_and_truncated() {
        let candidates = vec![
            (id(1), "dancing queen young and sweet".to_string()),
            (id(2), "you can dance".to_string()),
            (id(3), "you can dance you can jive".to_string()),
        ];
        let out = rank("you can dance", candidates, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].uuid, id(2));
        assert_eq!(out[1].uuid, id(3));
        assert!(out[0].score >= out[1].score);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        let out = rank("  ", vec![(id(1), "anything".to_string())], 5);
        assert!(out.is_empty());
    }
}
