use serde::{Deserialize, Serialize};

use crate::matcher::scoring::TrackFields;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidalTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album: String,
    /// `None` when the catalog reports no (or a zero) duration.
    pub duration_secs: Option<u64>,
    pub isrc: Option<String>,
}

impl TidalTrack {
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    pub fn fields(&self) -> TrackFields<'_> {
        TrackFields {
            title: &self.name,
            artist: self.primary_artist(),
            album: &self.album,
            duration_secs: self.duration_secs.map(|d| d as f64),
        }
    }
}

#[cfg(test)]
impl TidalTrack {
    pub fn mock(id: &str, name: &str, artist: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![artist.to_string()],
            album: "Mock Album".to_string(),
            duration_secs: Some(180),
            isrc: None,
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

    pub fn with_duration(mut self, duration_secs: Option<u64>) -> Self {
        self.duration_secs = duration_secs;
        self
    }
}
