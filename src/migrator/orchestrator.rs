use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{error, info, warn};

use crate::catalog::{SourceCatalog, TargetCatalog};
use crate::error::Result;
use crate::migrator::engine::{PlaylistMigrator, progress_style};
use crate::migrator::report::{MigrationResult, print_summary, save_migration_results};
use crate::spotify::SpotifyPlaylist;

/// Outcome of resolving requested playlist names against the user's playlists.
#[derive(Debug)]
pub struct PlaylistSelection<'a> {
    pub found: Vec<&'a SpotifyPlaylist>,
    pub missing: Vec<&'a str>,
}

/// Case-insensitive exact-name lookup, in the order the names were requested.
pub fn resolve_playlists<'a>(playlists: &'a [SpotifyPlaylist], names: &'a [String]) -> PlaylistSelection<'a> {
    let mut found = Vec::new();
    let mut missing = Vec::new();

    for name in names {
        let wanted = name.to_lowercase();
        match playlists.iter().find(|p| p.name.to_lowercase() == wanted) {
            Some(playlist) => found.push(playlist),
            None => missing.push(name.as_str()),
        }
    }

    PlaylistSelection { found, missing }
}

/// Runs each playlist through the migrator in order, then saves and prints the
/// run's results. A fatal error stops the run, but the playlists finished before
/// it are still saved and summarized.
pub async fn migrate_playlists<T: TargetCatalog>(
    migrator: &PlaylistMigrator<T>,
    playlists: &[&SpotifyPlaylist],
    dry_run: bool,
    results_dir: &Path,
) -> Result<Vec<MigrationResult>> {
    let mut results = Vec::with_capacity(playlists.len());

    let pb = ProgressBar::new(playlists.len() as u64);
    pb.set_style(progress_style(
        "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ));

    for playlist in playlists {
        pb.set_message(format!("Migrating: {}", playlist.name));
        match migrator.migrate(playlist, dry_run).await {
            Ok(result) => results.push(result),
            Err(e) => {
                pb.abandon();
                error!("Migration stopped at {}: {}", playlist.name, e);
                if !results.is_empty() {
                    save_migration_results(results_dir, &results)?;
                    print_summary(&results, results_dir);
                }
                return Err(e);
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Migration complete");

    save_migration_results(results_dir, &results)?;
    print_summary(&results, results_dir);

    Ok(results)
}

/// Drives a whole run: lists the user's Spotify playlists and migrates all of
/// them, or a named subset, to Tidal.
pub struct MigrationOrchestrator<S, T> {
    spotify_client: S,
    migrator: PlaylistMigrator<T>,
    results_dir: PathBuf,
}

impl<S: SourceCatalog, T: TargetCatalog> MigrationOrchestrator<S, T> {
    pub fn new(spotify_client: S, tidal_client: T, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            spotify_client,
            migrator: PlaylistMigrator::new(tidal_client),
            results_dir: results_dir.into(),
        }
    }

    pub fn migrator(&self) -> &PlaylistMigrator<T> {
        &self.migrator
    }

    pub async fn migrate_all_playlists(&self, dry_run: bool) -> Result<Vec<MigrationResult>> {
        let playlists = self.spotify_client.get_user_playlists().await?;

        info!(
            "Starting migration of {} playlists (dry_run={})",
            playlists.len(),
            dry_run
        );

        let selected: Vec<&SpotifyPlaylist> = playlists.iter().collect();
        migrate_playlists(&self.migrator, &selected, dry_run, &self.results_dir).await
    }

    pub async fn migrate_specific_playlists(
        &self,
        playlist_names: &[String],
        dry_run: bool,
    ) -> Result<Vec<MigrationResult>> {
        let all_playlists = self.spotify_client.get_user_playlists().await?;
        let selection = resolve_playlists(&all_playlists, playlist_names);

        for name in &selection.missing {
            warn!("Playlist not found: {}", name);
        }

        if selection.found.is_empty() {
            error!("No valid playlists found to migrate");
            return Ok(Vec::new());
        }

        info!(
            "Starting migration of {} playlists (dry_run={})",
            selection.found.len(),
            dry_run
        );

        migrate_playlists(&self.migrator, &selection.found, dry_run, &self.results_dir).await
    }
}
