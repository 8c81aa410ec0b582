use std::path::PathBuf;

use crate::error::Result;

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/callback";

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_redirect_uri: String,
    pub spotify_token_cache: PathBuf,
    pub tidal_session_file: PathBuf,
    pub results_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Build a config from an arbitrary key lookup. Missing credentials are left
    /// empty so that [`Config::get_missing_config`] can report all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let path_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        let spotify_redirect_uri = lookup("SPOTIFY_REDIRECT_URI")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

        Self {
            spotify_client_id: value("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: value("SPOTIFY_CLIENT_SECRET"),
            spotify_redirect_uri,
            spotify_token_cache: path_or("SPOTIFY_TOKEN_CACHE", ".spotify_cache"),
            tidal_session_file: path_or("TIDAL_SESSION_FILE", ".tidal_session.json"),
            results_dir: path_or("MIGRATION_RESULTS_DIR", "migration_results"),
            log_dir: path_or("MIGRATION_LOG_DIR", "logs"),
        }
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if self.spotify_client_id.is_empty() {
            missing.push("SPOTIFY_CLIENT_ID".to_string());
        }
        if self.spotify_client_secret.is_empty() {
            missing.push("SPOTIFY_CLIENT_SECRET".to_string());
        }
        if self.spotify_redirect_uri.is_empty() {
            missing.push("SPOTIFY_REDIRECT_URI".to_string());
        }

        missing
    }

    pub fn validate_spotify_config(&self) -> bool {
        self.get_missing_config().is_empty()
    }
}
