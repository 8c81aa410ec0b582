pub mod cascade;
pub mod scoring;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::TrackSearch;
use crate::error::{AppError, Result};
use crate::matcher::cascade::AttemptResult;
use crate::spotify::SpotifyTrack;
use crate::tidal::TidalTrack;

pub use scoring::{FUZZY_THRESHOLD, TrackFields, calculate_similarity};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Isrc,
    Exact,
    Fuzzy,
    NoMatch,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::Isrc => write!(f, "isrc"),
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Fuzzy => write!(f, "fuzzy"),
            MatchMethod::NoMatch => write!(f, "no_match"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub spotify_track: SpotifyTrack,
    pub tidal_track: Option<TidalTrack>,
    pub match_score: f64,
    pub match_method: MatchMethod,
    pub success: bool,
}

impl MatchOutcome {
    pub fn matched(spotify_track: SpotifyTrack, tidal_track: TidalTrack, method: MatchMethod, score: f64) -> Self {
        Self {
            spotify_track,
            tidal_track: Some(tidal_track),
            match_score: score.clamp(0.0, 100.0),
            match_method: method,
            success: true,
        }
    }

    pub fn no_match(spotify_track: SpotifyTrack) -> Self {
        Self {
            spotify_track,
            tidal_track: None,
            match_score: 0.0,
            match_method: MatchMethod::NoMatch,
            success: false,
        }
    }
}

/// Finds the Tidal counterpart of a Spotify track.
///
/// Search failures inside a single strategy are logged and skipped. An error is
/// only returned when the failure is fatal (authentication) or when every
/// strategy that ran failed to search at all.
pub struct TrackMatcher<'a, S: ?Sized> {
    search: &'a S,
}

impl<'a, S> TrackMatcher<'a, S>
where
    S: TrackSearch + ?Sized,
{
    pub fn new(search: &'a S) -> Self {
        Self { search }
    }

    pub async fn find_match(&self, track: &SpotifyTrack) -> Result<MatchOutcome> {
        let run = cascade::find_match(track, self.search).await;
        let all_failed = run.all_failed();
        let attempted = run.attempts.len();

        let mut last_error = None;
        for attempt in run.attempts {
            match attempt.result {
                AttemptResult::Matched { score } => {
                    debug!(
                        "Found track by {} match: {} (score {:.1})",
                        attempt.method, track.name, score
                    );
                }
                AttemptResult::Missed => {
                    debug!("No {} match for track: {}", attempt.method, track.name);
                }
                AttemptResult::Failed(e) => {
                    debug!("{} search failed for {}: {}", attempt.method, track.name, e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        if all_failed {
            return Err(AppError::Search(format!(
                "all {} strategies failed for '{}': {}",
                attempted,
                track.name,
                last_error.map(|e| e.to_string()).unwrap_or_default()
            )));
        }

        if !run.outcome.success {
            debug!("No match found for track: {}", track.name);
        }

        Ok(run.outcome)
    }
}
