use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;

use crate::catalog::{SourceCatalog, TargetCatalog, TrackSearch};
use crate::error::{AppError, Result};
use crate::spotify::{SpotifyPlaylist, SpotifyTrack};
use crate::tidal::TidalTrack;

/// Target catalog answering searches from a fixed query table and recording
/// every call.
#[derive(Default)]
pub struct MockTarget {
    results: HashMap<String, Vec<TidalTrack>>,
    failing_queries: HashSet<String>,
    unauthorized_queries: HashSet<String>,
    failing_batches: HashSet<usize>,
    unauthorized: bool,
    fail_create: bool,
    searches: Mutex<Vec<String>>,
    created: Mutex<Vec<(String, String)>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockTarget {
    pub fn with_results(mut self, query: &str, tracks: Vec<TidalTrack>) -> Self {
        self.results.insert(query.to_string(), tracks);
        self
    }

    pub fn failing(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    /// Zero-based index of an add-tracks call that should fail.
    pub fn failing_batch(mut self, index: usize) -> Self {
        self.failing_batches.insert(index);
        self
    }

    /// Rejects only this query as unauthorized, as if the session expired mid-run.
    pub fn unauthorized_for(mut self, query: &str) -> Self {
        self.unauthorized_queries.insert(query.to_string());
        self
    }

    pub fn unauthorized(mut self) -> Self {
        self.unauthorized = true;
        self
    }

    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }

    pub fn created_playlists(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackSearch for MockTarget {
    async fn search_tracks(&self, query: &str) -> Result<Vec<TidalTrack>> {
        self.searches.lock().unwrap().push(query.to_string());

        if self.unauthorized || self.unauthorized_queries.contains(query) {
            return Err(AppError::Auth("session expired".into()));
        }
        if self.failing_queries.contains(query) {
            return Err(AppError::TidalApi("503 Service Unavailable".into()));
        }

        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl TargetCatalog for MockTarget {
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        if self.fail_create {
            return Err(AppError::TidalApi("Failed to create playlist".into()));
        }

        let mut created = self.created.lock().unwrap();
        created.push((name.to_string(), description.to_string()));
        Ok(format!("tidal-playlist-{}", created.len()))
    }

    async fn add_tracks_to_playlist(&self, _playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let mut batches = self.batches.lock().unwrap();
        let index = batches.len();
        batches.push(track_ids.to_vec());

        if self.failing_batches.contains(&index) {
            return Err(AppError::TidalApi("429 Too Many Requests".into()));
        }
        Ok(())
    }
}

pub struct MockSource {
    playlists: Vec<SpotifyPlaylist>,
}

impl MockSource {
    pub fn new(playlists: Vec<SpotifyPlaylist>) -> Self {
        Self { playlists }
    }
}

#[async_trait]
impl SourceCatalog for MockSource {
    async fn get_user_playlists(&self) -> Result<Vec<SpotifyPlaylist>> {
        Ok(self.playlists.clone())
    }
}

/// "Road Trip": one ISRC match, one exact match, one track with nothing close.
pub fn road_trip() -> (SpotifyPlaylist, MockTarget) {
    let by_isrc = SpotifyTrack::mock("Highway Star", "Deep Purple")
        .with_album("Machine Head")
        .with_duration_ms(365_000)
        .with_isrc("GBAJE7200001");
    let by_exact = SpotifyTrack::mock("Born to Run", "Bruce Springsteen")
        .with_album("Born to Run")
        .with_duration_ms(270_000);
    let unmatched = SpotifyTrack::mock("Lost Highway Demo", "Garage Tapes")
        .with_album("Basement Sessions")
        .with_duration_ms(151_000);

    let target = MockTarget::default()
        .with_results(
            "GBAJE7200001",
            vec![
                TidalTrack::mock("t-isrc", "Highway Star (Remastered)", "Deep Purple")
                    .with_album("Machine Head")
                    .with_duration(Some(366))
                    .with_isrc("GBAJE7200001"),
            ],
        )
        .with_results(
            &by_exact.search_query(),
            vec![
                TidalTrack::mock("t-live", "Born to Run (Live)", "Bruce Springsteen")
                    .with_duration(Some(290)),
                TidalTrack::mock("t-exact", "Born To Run", "Bruce Springsteen")
                    .with_album("Born to Run")
                    .with_duration(Some(271)),
            ],
        )
        .with_results(
            &unmatched.search_query(),
            vec![
                TidalTrack::mock("t-other", "Highway to Hell", "AC/DC")
                    .with_album("Highway to Hell")
                    .with_duration(Some(208)),
            ],
        );

    let mut playlist = SpotifyPlaylist::mock("Road Trip", vec![by_isrc, by_exact, unmatched]);
    playlist.description = "Songs for the highway".to_string();

    (playlist, target)
}

/// Collects formatted log output so tests can assert on warnings.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a subscriber writing into this capture for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
