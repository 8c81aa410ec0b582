pub mod client;
pub mod models;
pub mod session;

pub use client::TidalClient;
pub use models::TidalTrack;
pub use session::TidalSession;
