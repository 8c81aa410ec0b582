pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod migrator;
pub mod spotify;
pub mod tidal;

#[cfg(test)]
mod testing;

pub use catalog::{SourceCatalog, TargetCatalog, TrackSearch};
pub use config::Config;
pub use error::{AppError, Result};
pub use matcher::{MatchMethod, MatchOutcome, TrackMatcher};
pub use migrator::{MigrationOrchestrator, MigrationResult, PlaylistMigrator};
pub use spotify::{PublicSpotifyClient, SpotifyClient, SpotifyPlaylist, SpotifyTrack};
pub use tidal::{TidalClient, TidalTrack};
