pub mod client;
pub mod models;

pub use client::{PublicSpotifyClient, SpotifyClient};
pub use models::{SpotifyPlaylist, SpotifyTrack};
