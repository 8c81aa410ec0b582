//! Service seams used by the migration core.
//!
//! The matcher and migrator only ever talk to these traits; the Spotify and Tidal
//! clients implement them, and tests plug in in-memory catalogs.

use async_trait::async_trait;

use crate::error::Result;
use crate::spotify::SpotifyPlaylist;
use crate::tidal::TidalTrack;

/// Where playlists are migrated from.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Playlists owned by the authenticated user, tracks included, in listing order.
    async fn get_user_playlists(&self) -> Result<Vec<SpotifyPlaylist>>;
}

/// Free-text track search against the target catalog.
#[async_trait]
pub trait TrackSearch: Send + Sync {
    /// Candidates in the service's relevance order.
    async fn search_tracks(&self, query: &str) -> Result<Vec<TidalTrack>>;
}

/// Where playlists are migrated to.
#[async_trait]
pub trait TargetCatalog: TrackSearch {
    /// Returns the id of the new playlist.
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String>;

    /// Adds one batch of tracks to an existing playlist.
    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
