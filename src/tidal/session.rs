use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// Sessions closer than this to expiry are not reused.
const EXPIRY_MARGIN_SECS: i64 = 60;

const MAX_LIFETIME_SECS: u64 = 365 * 24 * 60 * 60;

/// A Tidal login persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidalSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub user_id: Option<String>,
}

impl TidalSession {
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: u64,
        user_id: Option<String>,
    ) -> Self {
        let expires_in = expires_in_secs.min(MAX_LIFETIME_SECS) as i64;
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
            user_id,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }

    /// Loads a saved session. A missing or unreadable file yields `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No saved Tidal session at {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Ignoring corrupt Tidal session file {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved Tidal session to {}", path.display());
        Ok(())
    }
}
