use async_trait::async_trait;
use rspotify::{
    AuthCodeSpotify, ClientCredsSpotify, Credentials, OAuth,
    model::{FullTrack, PlayableItem, PlaylistId, SimplifiedPlaylist},
    prelude::*,
    scopes,
};
use std::io::{self, Write};
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::SourceCatalog;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::spotify::models::{SpotifyPlaylist, SpotifyTrack};

const PLAYLIST_PAGE_SIZE: u32 = 50;
const TRACK_PAGE_SIZE: u32 = 100;

/// Converts a playlist entry. Local files and podcast episodes have no catalog
/// identity and are skipped.
fn map_track(track: &FullTrack) -> Option<SpotifyTrack> {
    let id = track.id.as_ref()?;

    Some(SpotifyTrack {
        id: id.id().to_string(),
        name: track.name.clone(),
        artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        album: track.album.name.clone(),
        duration_ms: track.duration.num_milliseconds().max(0) as u64,
        isrc: track.external_ids.get("isrc").cloned(),
        popularity: track.popularity.min(u8::MAX as u32) as u8,
        preview_url: track.preview_url.clone(),
    })
}

/// Pages through every item of a playlist.
async fn fetch_playlist_tracks<C: BaseClient>(
    client: &C,
    playlist_id: &PlaylistId<'_>,
) -> Result<Vec<SpotifyTrack>> {
    let mut tracks = Vec::new();
    let mut offset = 0;

    loop {
        let page = client
            .playlist_items_manual(
                playlist_id.clone_static(),
                None,
                None,
                Some(TRACK_PAGE_SIZE),
                Some(offset),
            )
            .await?;

        for item in &page.items {
            match &item.track {
                Some(PlayableItem::Track(track)) => match map_track(track) {
                    Some(spotify_track) => tracks.push(spotify_track),
                    None => debug!("Skipping local track: {}", track.name),
                },
                Some(_) => debug!("Skipping non-track playlist item"),
                None => {}
            }
        }

        if page.next.is_none() {
            break;
        }
        offset += TRACK_PAGE_SIZE;
    }

    Ok(tracks)
}

pub struct SpotifyClient {
    client: AuthCodeSpotify,
    user_id: String,
}

impl SpotifyClient {
    /// Authenticates with the cached token when there is one, otherwise walks the
    /// user through the browser authorization and caches the result.
    pub async fn new(config: &Config) -> Result<Self> {
        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);

        let oauth = OAuth {
            redirect_uri: config.spotify_redirect_uri.clone(),
            scopes: scopes!(
                "user-library-read",
                "playlist-read-private",
                "playlist-read-collaborative"
            ),
            ..Default::default()
        };

        let client_config = rspotify::Config {
            token_cached: true,
            token_refreshing: true,
            cache_path: config.spotify_token_cache.clone(),
            ..Default::default()
        };

        let client = AuthCodeSpotify::with_config(creds, oauth, client_config);

        if !Self::restore_cached_token(&client).await? {
            Self::authorize_interactively(&client).await?;
        }

        let user = client.current_user().await?;
        let user_id = user.id.to_string();
        let display_name = user.display_name.unwrap_or_else(|| user_id.clone());

        info!("Successfully authenticated as Spotify user: {}", display_name);

        Ok(Self { client, user_id })
    }

    async fn restore_cached_token(client: &AuthCodeSpotify) -> Result<bool> {
        let token = match client.read_token_cache(true).await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(false),
            Err(e) => {
                debug!("No usable Spotify token cache: {}", e);
                return Ok(false);
            }
        };

        let expired = token.is_expired();
        *client
            .token
            .lock()
            .await
            .map_err(|_| AppError::Auth("Spotify token lock poisoned".into()))? = Some(token);

        if !expired {
            info!("Using cached Spotify token");
            return Ok(true);
        }

        match client.refresh_token().await {
            Ok(()) => {
                info!("Refreshed cached Spotify token");
                Ok(true)
            }
            Err(e) => {
                warn!("Could not refresh cached Spotify token: {}", e);
                Ok(false)
            }
        }
    }

    async fn authorize_interactively(client: &AuthCodeSpotify) -> Result<()> {
        let auth_url = client.get_authorize_url(false)?;
        println!("\nOpen this URL in your browser to authorize Spotify:");
        println!("{}\n", auth_url);

        print!("Enter the URL you were redirected to: ");
        io::stdout().flush()?;

        let mut redirect_url = String::new();
        io::stdin().read_line(&mut redirect_url)?;

        let code = client
            .parse_response_code(redirect_url.trim())
            .ok_or_else(|| AppError::Auth("Failed to parse authorization code".into()))?;

        // Also writes the token cache.
        client.request_token(&code).await?;
        Ok(())
    }

    async fn get_playlist_details(&self, playlist: &SimplifiedPlaylist) -> Result<SpotifyPlaylist> {
        let total_tracks = playlist.tracks.total as usize;

        info!(
            "Fetching tracks for playlist: {} ({} tracks)",
            playlist.name, total_tracks
        );

        // The listing endpoint omits descriptions.
        let full = self
            .client
            .playlist(playlist.id.clone_static(), None, None)
            .await?;
        let tracks = fetch_playlist_tracks(&self.client, &playlist.id).await?;

        Ok(SpotifyPlaylist {
            id: playlist.id.id().to_string(),
            name: playlist.name.clone(),
            description: full.description.unwrap_or_default(),
            tracks,
            total_tracks,
            public: playlist.public.unwrap_or(false),
            owner: playlist
                .owner
                .display_name
                .clone()
                .unwrap_or_else(|| playlist.owner.id.to_string()),
        })
    }
}

#[async_trait]
impl SourceCatalog for SpotifyClient {
    async fn get_user_playlists(&self) -> Result<Vec<SpotifyPlaylist>> {
        let mut playlists = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .client
                .current_user_playlists_manual(Some(PLAYLIST_PAGE_SIZE), Some(offset))
                .await?;

            // Followed playlists are not the user's to migrate.
            for playlist in page.items.iter().filter(|p| p.owner.id.to_string() == self.user_id) {
                match self.get_playlist_details(playlist).await {
                    Ok(details) => playlists.push(details),
                    Err(e) => warn!("Failed to get playlist details for {}: {}", playlist.name, e),
                }
            }

            if page.next.is_none() {
                break;
            }
            offset += PLAYLIST_PAGE_SIZE;
        }

        info!("Found {} user playlists", playlists.len());
        Ok(playlists)
    }
}

/// Client for fetching public Spotify playlists using client credentials.
/// Does not require user authentication - only app credentials.
pub struct PublicSpotifyClient {
    client: ClientCredsSpotify,
}

impl PublicSpotifyClient {
    pub async fn new(config: &Config) -> Result<Self> {
        let creds = Credentials::new(&config.spotify_client_id, &config.spotify_client_secret);
        let client = ClientCredsSpotify::new(creds);

        client.request_token().await?;
        info!("Authenticated with Spotify using client credentials");

        Ok(Self { client })
    }

    /// Extracts the playlist id from a share link or URI:
    /// - https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH
    /// - https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH?si=...
    /// - spotify:playlist:37i9dQZF1E8NC99vGqLsaH
    pub fn parse_playlist_url(url_str: &str) -> Result<String> {
        let url_str = url_str.trim();

        if let Some(id) = url_str.strip_prefix("spotify:playlist:") {
            return non_empty_id(id);
        }

        let url = Url::parse(url_str).map_err(|e| AppError::Config(format!("Invalid URL: {}", e)))?;

        if url.host_str() != Some("open.spotify.com") {
            return Err(AppError::Config(format!(
                "Not a Spotify URL: {}",
                url.host_str().unwrap_or_default()
            )));
        }

        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(|| AppError::Config("Invalid Spotify URL".into()))?
            .filter(|s| !s.is_empty())
            .collect();

        // Localized links look like /intl-de/playlist/{id}
        match segments.iter().position(|s| *s == "playlist") {
            Some(i) if i + 1 < segments.len() => non_empty_id(segments[i + 1]),
            _ => Err(AppError::Config(
                "URL does not appear to be a Spotify playlist URL".into(),
            )),
        }
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<SpotifyPlaylist> {
        let id = PlaylistId::from_id(playlist_id)
            .map_err(|e| AppError::Config(format!("Invalid playlist ID: {}", e)))?;

        let playlist = self.client.playlist(id.clone_static(), None, None).await?;

        info!(
            "Fetching public playlist: {} ({} tracks)",
            playlist.name, playlist.tracks.total
        );

        let tracks = fetch_playlist_tracks(&self.client, &id).await?;
        info!("Fetched {} tracks from playlist", tracks.len());

        Ok(SpotifyPlaylist {
            id: playlist_id.to_string(),
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
            tracks,
            total_tracks: playlist.tracks.total as usize,
            public: playlist.public.unwrap_or(true),
            owner: playlist
                .owner
                .display_name
                .unwrap_or_else(|| playlist.owner.id.to_string()),
        })
    }
}

fn non_empty_id(id: &str) -> Result<String> {
    if id.is_empty() {
        Err(AppError::Config("Spotify playlist URL has no playlist id".into()))
    } else {
        Ok(id.to_string())
    }
}
