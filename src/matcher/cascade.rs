use tracing::debug;

use crate::catalog::TrackSearch;
use crate::error::AppError;
use crate::matcher::scoring::{
    EXACT_DURATION_TOLERANCE_SECS, calculate_similarity, is_fuzzy_match, normalize,
};
use crate::matcher::{MatchMethod, MatchOutcome};
use crate::spotify::SpotifyTrack;
use crate::tidal::TidalTrack;

const FUZZY_CANDIDATES: usize = 10;

#[derive(Debug)]
pub enum AttemptResult {
    Matched { score: f64 },
    Missed,
    Failed(AppError),
}

#[derive(Debug)]
pub struct StrategyAttempt {
    pub method: MatchMethod,
    pub result: AttemptResult,
}

/// Outcome of one cascade run together with what each strategy reported.
#[derive(Debug)]
pub struct CascadeRun {
    pub outcome: MatchOutcome,
    pub attempts: Vec<StrategyAttempt>,
}

impl CascadeRun {
    pub fn all_failed(&self) -> bool {
        !self.attempts.is_empty()
            && self
                .attempts
                .iter()
                .all(|a| matches!(a.result, AttemptResult::Failed(_)))
    }
}

/// First candidate carrying exactly the given ISRC.
pub fn select_by_isrc<'a>(candidates: &'a [TidalTrack], isrc: &str) -> Option<&'a TidalTrack> {
    candidates
        .iter()
        .find(|candidate| candidate.isrc.as_deref() == Some(isrc))
}

/// Same normalized title and primary artist, and a known duration within 5 seconds.
pub fn is_exact_match(spotify: &SpotifyTrack, tidal: &TidalTrack) -> bool {
    let name_match = normalize(&spotify.name) == normalize(&tidal.name);
    let artist_match = normalize(spotify.primary_artist()) == normalize(tidal.primary_artist());

    let duration_match = match tidal.duration_secs {
        Some(secs) if secs > 0 => {
            (spotify.duration_secs() - secs as f64).abs() < EXACT_DURATION_TOLERANCE_SECS
        }
        _ => false,
    };

    name_match && artist_match && duration_match
}

/// First candidate, in service order, that is an exact match.
pub fn select_exact<'a>(spotify: &SpotifyTrack, candidates: &'a [TidalTrack]) -> Option<&'a TidalTrack> {
    candidates.iter().find(|candidate| is_exact_match(spotify, candidate))
}

/// Highest scoring candidate among the first ten that clears the fuzzy threshold.
/// On equal scores the earlier candidate wins.
pub fn select_fuzzy<'a>(
    spotify: &SpotifyTrack,
    candidates: &'a [TidalTrack],
) -> Option<(&'a TidalTrack, f64)> {
    let mut best: Option<(&TidalTrack, f64)> = None;

    for candidate in candidates.iter().take(FUZZY_CANDIDATES) {
        let score = calculate_similarity(spotify, candidate);
        if !is_fuzzy_match(score) {
            continue;
        }
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }

    best
}

/// Runs the cascade for one track against the given search capability.
pub async fn find_match<S>(spotify: &SpotifyTrack, search: &S) -> CascadeRun
where
    S: TrackSearch + ?Sized,
{
    let text_query = spotify.search_query();

    // Exact and fuzzy each issue the text query themselves, so one failed search
    // does not take the other strategy down with it.
    let strategies = spotify
        .isrc
        .iter()
        .map(|isrc| (MatchMethod::Isrc, isrc.clone()))
        .chain([
            (MatchMethod::Exact, text_query.clone()),
            (MatchMethod::Fuzzy, text_query),
        ]);

    let mut attempts = Vec::with_capacity(3);

    for (method, query) in strategies {
        debug!("{} search for '{}' with query '{}'", method, spotify.name, query);

        let candidates = match search.search_tracks(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                let fatal = e.is_fatal();
                attempts.push(StrategyAttempt {
                    method,
                    result: AttemptResult::Failed(e),
                });
                if fatal {
                    break;
                }
                continue;
            }
        };

        match select(method, spotify, &candidates) {
            Some((tidal, score)) => {
                attempts.push(StrategyAttempt {
                    method,
                    result: AttemptResult::Matched { score },
                });
                return CascadeRun {
                    outcome: MatchOutcome::matched(spotify.clone(), tidal, method, score),
                    attempts,
                };
            }
            None => attempts.push(StrategyAttempt {
                method,
                result: AttemptResult::Missed,
            }),
        }
    }

    CascadeRun {
        outcome: MatchOutcome::no_match(spotify.clone()),
        attempts,
    }
}

fn select(
    method: MatchMethod,
    spotify: &SpotifyTrack,
    candidates: &[TidalTrack],
) -> Option<(TidalTrack, f64)> {
    let found = match method {
        MatchMethod::Isrc => spotify
            .isrc
            .as_deref()
            .and_then(|isrc| select_by_isrc(candidates, isrc)),
        MatchMethod::Exact => select_exact(spotify, candidates),
        MatchMethod::Fuzzy => {
            return select_fuzzy(spotify, candidates).map(|(track, score)| (track.clone(), score));
        }
        MatchMethod::NoMatch => None,
    };

    found.map(|track| (track.clone(), calculate_similarity(spotify, track)))
}
