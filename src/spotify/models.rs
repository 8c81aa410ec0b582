use serde::{Deserialize, Serialize};

use crate::matcher::scoring::TrackFields;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    pub duration_ms: u64,
    pub isrc: Option<String>,
    pub popularity: u8,
    pub preview_url: Option<String>,
}

impl SpotifyTrack {
    /// First listed artist, or an empty string for tracks without artists.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }

    /// Free-text query used by the exact and fuzzy strategies.
    pub fn search_query(&self) -> String {
        format!("{} {}", self.primary_artist(), self.name)
    }

    pub fn fields(&self) -> TrackFields<'_> {
        TrackFields {
            title: &self.name,
            artist: self.primary_artist(),
            album: &self.album,
            duration_secs: Some(self.duration_secs()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tracks: Vec<SpotifyTrack>,
    pub total_tracks: usize,
    pub public: bool,
    pub owner: String,
}

#[cfg(test)]
impl SpotifyTrack {
    pub fn mock(name: &str, artist: &str) -> Self {
        Self {
            id: format!("spotify:{}", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            album: "Mock Album".to_string(),
            duration_ms: 180000,
            isrc: None,
            popularity: 50,
            preview_url: None,
        }
    }

    pub fn with_isrc(mut self, isrc: &str) -> Self {
        self.isrc = Some(isrc.to_string());
        self
    }

    pub fn with_album(mut self, album: &str) -> Self {
        self.album = album.to_string();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

#[cfg(test)]
impl SpotifyPlaylist {
    pub fn mock(name: &str, tracks: Vec<SpotifyTrack>) -> Self {
        Self {
            id: format!("playlist:{}", name.to_lowercase().replace(' ', "-")),
            name: name.to_string(),
            description: format!("{} mix", name),
            total_tracks: tracks.len(),
            tracks,
            public: false,
            owner: "tester".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_without_artists_uses_empty_primary() {
        let mut track = SpotifyTrack::mock("Instrumental", "nobody");
        track.artists.clear();

        assert_eq!(track.primary_artist(), "");
        assert_eq!(track.search_query(), " Instrumental");
    }

    #[test]
    fn test_duration_keeps_fraction() {
        let track = SpotifyTrack::mock("Song", "Artist").with_duration_ms(209_500);
        assert!((track.duration_secs() - 209.5).abs() < f64::EPSILON);
    }
}
