pub mod engine;
pub mod orchestrator;
pub mod report;

pub use engine::{BATCH_SIZE, PlaylistMigrator};
pub use orchestrator::{MigrationOrchestrator, migrate_playlists, resolve_playlists};
pub use report::{FailedTrack, MatchBreakdown, MigrationResult, RunSummary};
