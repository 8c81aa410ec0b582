use strsim::normalized_levenshtein;

use crate::spotify::SpotifyTrack;
use crate::tidal::TidalTrack;

const TITLE_WEIGHT: f64 = 0.4;
const ARTIST_WEIGHT: f64 = 0.4;
const ALBUM_WEIGHT: f64 = 0.1;
const DURATION_WEIGHT: f64 = 0.1;

/// Minimum score the fuzzy strategy must strictly exceed.
pub const FUZZY_THRESHOLD: f64 = 85.0;

/// Maximum duration difference (exclusive, seconds) for an exact match.
pub const EXACT_DURATION_TOLERANCE_SECS: f64 = 5.0;

/// The metadata a score is computed from.
#[derive(Debug, Clone, Copy)]
pub struct TrackFields<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub album: &'a str,
    pub duration_secs: Option<f64>,
}

/// Case-folded, whitespace-trimmed form used for every text comparison.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Edit-distance ratio of two strings on a 0-100 scale.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b)) * 100.0
}

/// Step function over the absolute duration difference. An unknown or zero
/// duration on either side is not penalized.
pub fn duration_similarity(a_secs: Option<f64>, b_secs: Option<f64>) -> f64 {
    match (a_secs, b_secs) {
        (Some(a), Some(b)) if a > 0.0 && b > 0.0 => {
            let diff = (a - b).abs();
            if diff < 5.0 {
                100.0
            } else if diff < 15.0 {
                80.0
            } else {
                50.0
            }
        }
        _ => 100.0,
    }
}

/// Similarity of two tracks in [0, 100]: 40% title, 40% artist, 10% album and
/// 10% duration.
pub fn score(a: &TrackFields<'_>, b: &TrackFields<'_>) -> f64 {
    let title_score = text_similarity(a.title, b.title);
    let artist_score = text_similarity(a.artist, b.artist);
    let album_score = text_similarity(a.album, b.album);
    let duration_score = duration_similarity(a.duration_secs, b.duration_secs);

    let total = title_score * TITLE_WEIGHT
        + artist_score * ARTIST_WEIGHT
        + album_score * ALBUM_WEIGHT
        + duration_score * DURATION_WEIGHT;

    total.clamp(0.0, 100.0)
}

/// Score of a Spotify track against a Tidal candidate.
pub fn calculate_similarity(spotify: &SpotifyTrack, tidal: &TidalTrack) -> f64 {
    score(&spotify.fields(), &tidal.fields())
}

pub fn is_fuzzy_match(score: f64) -> bool {
    score > FUZZY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(title: &'a str, artist: &'a str, album: &'a str, secs: Option<f64>) -> TrackFields<'a> {
        TrackFields {
            title,
            artist,
            album,
            duration_secs: secs,
        }
    }

    #[test]
    fn test_identical_tracks_score_100() {
        let a = fields("Bohemian Rhapsody", "Queen", "A Night at the Opera", Some(354.0));
        assert!((score(&a, &a) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let padded = score(
            &fields(" Foo ", " Bar", "Baz ", Some(200.0)),
            &fields("foo", "bar", "baz", Some(200.0)),
        );
        let plain = score(
            &fields("Foo", "Bar", "Baz", Some(200.0)),
            &fields("foo", "bar", "baz", Some(200.0)),
        );
        assert_eq!(padded, plain);
        assert!((plain - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_steps() {
        assert_eq!(duration_similarity(Some(180.0), Some(184.9)), 100.0);
        assert_eq!(duration_similarity(Some(180.0), Some(185.0)), 80.0);
        assert_eq!(duration_similarity(Some(180.0), Some(194.9)), 80.0);
        assert_eq!(duration_similarity(Some(180.0), Some(195.0)), 50.0);
    }

    #[test]
    fn test_unknown_target_duration_not_penalized() {
        assert_eq!(duration_similarity(Some(180.0), None), 100.0);
        assert_eq!(duration_similarity(Some(180.0), Some(0.0)), 100.0);
    }

    #[test]
    fn test_unknown_album_compared_to_empty() {
        let with_album = fields("Song", "Artist", "Album", Some(180.0));
        let no_album = fields("Song", "Artist", "", Some(180.0));

        // Album contributes nothing, everything else is perfect.
        assert!((score(&with_album, &no_album) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights() {
        // Title and artist identical, album fully different, duration far apart.
        let a = fields("Song", "Artist", "abc", Some(100.0));
        let b = fields("Song", "Artist", "xyz", Some(200.0));
        assert_eq!(score(&a, &b), 85.0);
    }

    #[test]
    fn test_score_bounds() {
        let cases = [
            (fields("", "", "", None), fields("", "", "", None)),
            (fields("a", "", "", Some(0.0)), fields("", "b", "c", Some(1e9))),
            (
                fields("Stairway to Heaven", "Led Zeppelin", "IV", Some(482.0)),
                fields("Bohemian Rhapsody", "Queen", "A Night at the Opera", Some(354.0)),
            ),
        ];

        for (a, b) in cases {
            let s = score(&a, &b);
            assert!((0.0..=100.0).contains(&s), "score {} out of bounds", s);
        }
    }

    #[test]
    fn test_fuzzy_threshold_is_strict() {
        assert!(!is_fuzzy_match(85.0));
        assert!(is_fuzzy_match(85.0001));
        assert!(!is_fuzzy_match(10.0));
    }

    #[test]
    fn test_similar_titles_pass_threshold() {
        let a = fields("Don't Stop Me Now", "Queen", "Jazz", Some(209.0));
        let b = fields("Dont Stop Me Now", "Queen", "Jazz", Some(209.0));
        let s = score(&a, &b);
        assert!(is_fuzzy_match(s), "Score {} should be > 85", s);
    }

    #[test]
    fn test_different_songs_fail_threshold() {
        let a = fields("Bohemian Rhapsody", "Queen", "A Night at the Opera", Some(354.0));
        let b = fields("Stairway to Heaven", "Led Zeppelin", "Led Zeppelin IV", Some(482.0));
        let s = score(&a, &b);
        assert!(!is_fuzzy_match(s), "Score {} should be < 85", s);
    }
}
