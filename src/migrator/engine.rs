use indicatif::{ProgressBar, ProgressStyle};
use tracing::{Instrument, error, info, info_span, warn};

use crate::catalog::TargetCatalog;
use crate::error::Result;
use crate::matcher::{MatchOutcome, TrackMatcher};
use crate::migrator::report::MigrationResult;
use crate::spotify::SpotifyPlaylist;

/// Tracks added to Tidal per request.
pub const BATCH_SIZE: usize = 100;

const DESCRIPTION_PREFIX: &str = "Migrated from Spotify. ";

pub(crate) fn progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Migrates one Spotify playlist at a time into the target catalog.
pub struct PlaylistMigrator<T> {
    tidal_client: T,
}

impl<T: TargetCatalog> PlaylistMigrator<T> {
    pub fn new(tidal_client: T) -> Self {
        Self { tidal_client }
    }

    pub fn target(&self) -> &T {
        &self.tidal_client
    }

    pub async fn migrate(&self, spotify_playlist: &SpotifyPlaylist, dry_run: bool) -> Result<MigrationResult> {
        let span = info_span!("playlist", name = %spotify_playlist.name);
        self.migrate_inner(spotify_playlist, dry_run)
            .instrument(span)
            .await
    }

    async fn migrate_inner(&self, spotify_playlist: &SpotifyPlaylist, dry_run: bool) -> Result<MigrationResult> {
        info!("Migrating playlist: {}", spotify_playlist.name);

        let outcomes = self.match_tracks(spotify_playlist).await?;
        let mut result = MigrationResult::from_outcomes(spotify_playlist.name.clone(), &outcomes);

        // Create Tidal playlist if not dry run and we have matches
        if !dry_run && result.successful_matches() > 0 {
            let track_ids: Vec<String> = outcomes
                .into_iter()
                .filter_map(|outcome| outcome.tidal_track)
                .map(|track| track.id)
                .collect();

            if let Some((playlist_id, failed_batches)) =
                self.create_tidal_playlist(spotify_playlist, &track_ids).await
            {
                result.record_target_playlist(playlist_id, failed_batches);
            }
        }

        info!(
            "Playlist migration completed: {} - {}/{} tracks matched ({:.1}% success rate)",
            spotify_playlist.name,
            result.successful_matches(),
            result.total_tracks(),
            result.success_rate()
        );

        Ok(result)
    }

    async fn match_tracks(&self, spotify_playlist: &SpotifyPlaylist) -> Result<Vec<MatchOutcome>> {
        let matcher = TrackMatcher::new(&self.tidal_client);
        let mut outcomes = Vec::with_capacity(spotify_playlist.tracks.len());

        let pb = ProgressBar::new(spotify_playlist.tracks.len() as u64);
        pb.set_style(progress_style("  {spinner:.green} [{bar:30.cyan/blue}] {pos}/{len}"));

        for track in &spotify_playlist.tracks {
            let outcome = match matcher.find_match(track).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => {
                    pb.abandon();
                    return Err(e);
                }
                Err(e) => {
                    warn!("Treating '{}' as unmatched: {}", track.name, e);
                    MatchOutcome::no_match(track.clone())
                }
            };
            outcomes.push(outcome);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(outcomes)
    }

    /// Creates the playlist and fills it batch by batch. Returns the new playlist
    /// id and the number of batches that could not be added, or `None` when the
    /// playlist itself could not be created.
    async fn create_tidal_playlist(
        &self,
        spotify_playlist: &SpotifyPlaylist,
        track_ids: &[String],
    ) -> Option<(String, usize)> {
        let description = format!("{}{}", DESCRIPTION_PREFIX, spotify_playlist.description);

        let playlist_id = match self
            .tidal_client
            .create_playlist(&spotify_playlist.name, &description)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                error!(
                    "Failed to create Tidal playlist for {}: {}",
                    spotify_playlist.name, e
                );
                return None;
            }
        };

        let mut failed_batches = 0;
        for (i, chunk) in track_ids.chunks(BATCH_SIZE).enumerate() {
            if let Err(e) = self
                .tidal_client
                .add_tracks_to_playlist(&playlist_id, chunk)
                .await
            {
                failed_batches += 1;
                warn!(
                    "Failed to add batch {} to playlist {}: {}",
                    i + 1,
                    spotify_playlist.name,
                    e
                );
            }
        }

        Some((playlist_id, failed_batches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::spotify::SpotifyTrack;
    use crate::testing::{MockTarget, road_trip};
    use crate::tidal::TidalTrack;

    #[tokio::test]
    async fn test_road_trip_end_to_end() {
        let (playlist, target) = road_trip();
        let migrator = PlaylistMigrator::new(target);

        let result = migrator.migrate(&playlist, false).await.unwrap();

        assert_eq!(result.total_tracks(), 3);
        assert_eq!(result.successful_matches(), 2);
        assert_eq!(result.failed_matches(), 1);
        assert!((result.success_rate() - 66.7).abs() < 0.05);
        assert_eq!(result.failed_tracks().len(), 1);
        assert_eq!(result.failed_tracks()[0].name, "Lost Highway Demo");
        assert_eq!(result.match_breakdown().isrc, 1);
        assert_eq!(result.match_breakdown().exact, 1);

        let created = migrator.target().created_playlists();
        assert_eq!(
            created,
            vec![(
                "Road Trip".to_string(),
                "Migrated from Spotify. Songs for the highway".to_string()
            )]
        );
        assert_eq!(
            migrator.target().batches(),
            vec![vec!["t-isrc".to_string(), "t-exact".to_string()]]
        );
        assert_eq!(result.tidal_playlist_id(), Some("tidal-playlist-1"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_writes() {
        let (playlist, target) = road_trip();
        let migrator = PlaylistMigrator::new(target);

        let result = migrator.migrate(&playlist, true).await.unwrap();

        assert_eq!(result.total_tracks(), 3);
        assert_eq!(result.successful_matches(), 2);
        assert_eq!(result.failed_matches(), 1);
        assert_eq!(result.tidal_playlist_id(), None);
        assert!(migrator.target().created_playlists().is_empty());
        assert!(migrator.target().batches().is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_skips_creation() {
        let playlist = SpotifyPlaylist::mock("Nothing", vec![SpotifyTrack::mock("Ghost", "Nobody")]);
        let migrator = PlaylistMigrator::new(MockTarget::default());

        let result = migrator.migrate(&playlist, false).await.unwrap();

        assert_eq!(result.successful_matches(), 0);
        assert_eq!(result.tidal_playlist_id(), None);
        assert!(migrator.target().created_playlists().is_empty());
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let playlist = SpotifyPlaylist::mock("Empty", Vec::new());
        let migrator = PlaylistMigrator::new(MockTarget::default());

        let result = migrator.migrate(&playlist, false).await.unwrap();

        assert_eq!(result.total_tracks(), 0);
        assert_eq!(result.success_rate(), 0.0);
        assert!(migrator.target().created_playlists().is_empty());
    }

    fn large_playlist(size: usize) -> (SpotifyPlaylist, MockTarget) {
        let mut target = MockTarget::default();
        let mut tracks = Vec::with_capacity(size);
        for i in 0..size {
            let isrc = format!("USXYZ{:07}", i);
            let track = SpotifyTrack::mock(&format!("Track {}", i), "Band").with_isrc(&isrc);
            target = target.with_results(
                &isrc,
                vec![TidalTrack::mock(&format!("t{}", i), &track.name, "Band").with_isrc(&isrc)],
            );
            tracks.push(track);
        }
        (SpotifyPlaylist::mock("Big", tracks), target)
    }

    #[tokio::test]
    async fn test_batches_of_100_in_match_order() {
        let (playlist, target) = large_playlist(250);
        let migrator = PlaylistMigrator::new(target);

        let result = migrator.migrate(&playlist, false).await.unwrap();
        assert_eq!(result.successful_matches(), 250);

        let batches = migrator.target().batches();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let flattened: Vec<String> = batches.into_iter().flatten().collect();
        let expected: Vec<String> = (0..250).map(|i| format!("t{}", i)).collect();
        assert_eq!(flattened, expected);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_migration() {
        let (playlist, target) = large_playlist(250);
        let migrator = PlaylistMigrator::new(target.failing_batch(1));

        let result = migrator.migrate(&playlist, false).await.unwrap();

        assert_eq!(migrator.target().batches().len(), 3);
        assert_eq!(result.failed_batches(), 1);
        assert_eq!(result.tidal_playlist_id(), Some("tidal-playlist-1"));
    }

    #[tokio::test]
    async fn test_create_failure_keeps_statistics() {
        let (playlist, target) = road_trip();
        let migrator = PlaylistMigrator::new(target.failing_create());

        let result = migrator.migrate(&playlist, false).await.unwrap();

        assert_eq!(result.successful_matches(), 2);
        assert_eq!(result.tidal_playlist_id(), None);
        assert!(migrator.target().batches().is_empty());
    }

    #[tokio::test]
    async fn test_search_outage_counts_as_unmatched() {
        let track = SpotifyTrack::mock("Song", "Artist");
        let target = MockTarget::default().failing(&track.search_query());
        let playlist = SpotifyPlaylist::mock("Outage", vec![track]);
        let migrator = PlaylistMigrator::new(target);

        let result = migrator.migrate(&playlist, true).await.unwrap();
        assert_eq!(result.failed_matches(), 1);
        assert_eq!(result.failed_tracks()[0].name, "Song");
    }

    #[tokio::test]
    async fn test_auth_failure_aborts() {
        let playlist = SpotifyPlaylist::mock("Locked", vec![SpotifyTrack::mock("Song", "Artist")]);
        let migrator = PlaylistMigrator::new(MockTarget::default().unauthorized());

        let err = migrator.migrate(&playlist, false).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
