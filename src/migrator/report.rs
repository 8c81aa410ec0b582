use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::matcher::{MatchMethod, MatchOutcome};

/// Per-playlist statistics. Built from the match outcomes so the counters
/// always add up to the total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    playlist_name: String,
    total_tracks: usize,
    successful_matches: usize,
    failed_matches: usize,
    success_rate: f64,
    failed_tracks: Vec<FailedTrack>,
    match_breakdown: MatchBreakdown,
    failed_batches: usize,
    tidal_playlist_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTrack {
    pub name: String,
    pub artist: String,
    pub album: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub isrc: usize,
    pub exact: usize,
    pub fuzzy: usize,
}

impl MigrationResult {
    pub fn from_outcomes(playlist_name: impl Into<String>, outcomes: &[MatchOutcome]) -> Self {
        let mut breakdown = MatchBreakdown::default();
        let mut failed_tracks = Vec::new();

        for outcome in outcomes {
            match outcome.match_method {
                MatchMethod::Isrc if outcome.success => breakdown.isrc += 1,
                MatchMethod::Exact if outcome.success => breakdown.exact += 1,
                MatchMethod::Fuzzy if outcome.success => breakdown.fuzzy += 1,
                _ => {
                    let track = &outcome.spotify_track;
                    failed_tracks.push(FailedTrack {
                        name: track.name.clone(),
                        artist: track.artists.join(", "),
                        album: track.album.clone(),
                    });
                }
            }
        }

        let total_tracks = outcomes.len();
        let failed_matches = failed_tracks.len();
        let successful_matches = total_tracks - failed_matches;

        Self {
            playlist_name: playlist_name.into(),
            total_tracks,
            successful_matches,
            failed_matches,
            success_rate: success_rate(successful_matches, total_tracks),
            failed_tracks,
            match_breakdown: breakdown,
            failed_batches: 0,
            tidal_playlist_id: None,
        }
    }

    pub fn playlist_name(&self) -> &str {
        &self.playlist_name
    }

    pub fn total_tracks(&self) -> usize {
        self.total_tracks
    }

    pub fn successful_matches(&self) -> usize {
        self.successful_matches
    }

    pub fn failed_matches(&self) -> usize {
        self.failed_matches
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    pub fn failed_tracks(&self) -> &[FailedTrack] {
        &self.failed_tracks
    }

    pub fn match_breakdown(&self) -> &MatchBreakdown {
        &self.match_breakdown
    }

    pub fn failed_batches(&self) -> usize {
        self.failed_batches
    }

    pub fn tidal_playlist_id(&self) -> Option<&str> {
        self.tidal_playlist_id.as_deref()
    }

    pub(crate) fn record_target_playlist(&mut self, playlist_id: String, failed_batches: usize) {
        self.tidal_playlist_id = Some(playlist_id);
        self.failed_batches = failed_batches;
    }
}

/// Percentage of matched tracks; 0 for an empty playlist.
pub fn success_rate(successful: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (successful as f64 / total as f64) * 100.0
    }
}

/// Totals across every playlist of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub playlists: usize,
    pub total_tracks: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
}

impl RunSummary {
    pub fn from_results(results: &[MigrationResult]) -> Self {
        let total_tracks = results.iter().map(|r| r.total_tracks).sum();
        let successful = results.iter().map(|r| r.successful_matches).sum();
        let failed = results.iter().map(|r| r.failed_matches).sum();

        Self {
            playlists: results.len(),
            total_tracks,
            successful,
            failed,
            success_rate: success_rate(successful, total_tracks),
        }
    }
}

/// Writes the run's results as pretty JSON into a timestamped file under `dir`.
pub fn save_migration_results(dir: &Path, results: &[MigrationResult]) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    fs::create_dir_all(dir)?;

    let filename = dir.join(format!("migration_results_{}.json", timestamp));
    let json = serde_json::to_string_pretty(results)?;

    fs::write(&filename, json)?;

    info!("Migration results saved to: {}", filename.display());

    Ok(filename)
}

pub fn playlist_line(result: &MigrationResult) -> String {
    format!(
        "{}: {}/{} ({:.1}%)",
        result.playlist_name, result.successful_matches, result.total_tracks, result.success_rate
    )
}

pub fn print_summary(results: &[MigrationResult], results_dir: &Path) {
    let summary = RunSummary::from_results(results);

    println!();
    println!("{}", "=".repeat(60));
    println!("{}", "MIGRATION SUMMARY".bold());
    println!("{}", "=".repeat(60));
    println!("Total playlists processed: {}", summary.playlists);
    println!("Total tracks processed: {}", summary.total_tracks);
    println!(
        "Successfully matched: {}",
        summary.successful.to_string().green()
    );
    println!("Failed to match: {}", summary.failed.to_string().red());
    println!("Overall success rate: {:.1}%", summary.success_rate);
    println!("{}", "=".repeat(60));

    println!("\nPlaylist breakdown:");
    for result in results {
        let line = playlist_line(result);
        let line = if result.success_rate >= 90.0 {
            line.green()
        } else if result.success_rate >= 70.0 {
            line.yellow()
        } else {
            line.red()
        };
        println!("  {}", line);

        if result.failed_batches > 0 {
            println!(
                "    {}",
                format!("{} batch(es) could not be added to Tidal", result.failed_batches).yellow()
            );
        }
    }

    if results.iter().any(|r| !r.failed_tracks.is_empty()) {
        println!(
            "\n{}",
            format!(
                "Failed tracks have been logged and saved to {}/",
                results_dir.display()
            )
            .yellow()
        );
    }
}
