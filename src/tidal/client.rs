use std::io::{self, Write};
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{TargetCatalog, TrackSearch};
use crate::error::{AppError, Result};
use crate::tidal::models::TidalTrack;
use crate::tidal::session::TidalSession;

const TIDAL_API_BASE: &str = "https://openapi.tidal.com/v2";
const TIDAL_AUTH_URL: &str = "https://auth.tidal.com/v1/oauth2";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceAuthResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    verification_uri_complete: Option<String>,
    expires_in: u64,
    interval: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
    user_id: Option<ApiId>,
}

/// Tidal sends ids as numbers on some endpoints and as strings on others.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(u64),
    Text(String),
}

impl From<ApiId> for String {
    fn from(id: ApiId) -> Self {
        match id {
            ApiId::Number(n) => n.to_string(),
            ApiId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TidalSearchResponse {
    tracks: Option<Vec<TidalApiTrack>>,
}

#[derive(Debug, Deserialize)]
struct TidalApiTrack {
    id: ApiId,
    title: String,
    #[serde(default)]
    artists: Vec<TidalApiArtist>,
    album: Option<TidalApiAlbum>,
    duration: Option<u64>,
    isrc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TidalApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TidalApiAlbum {
    title: String,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TidalApiPlaylist {
    uuid: String,
}

impl From<TidalApiTrack> for TidalTrack {
    fn from(track: TidalApiTrack) -> Self {
        Self {
            id: track.id.into(),
            name: track.title,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album: track.album.map(|a| a.title).unwrap_or_default(),
            duration_secs: track.duration.filter(|&d| d > 0),
            isrc: track.isrc,
        }
    }
}

fn parse_search_response(body: &str) -> Result<Vec<TidalTrack>> {
    let response: TidalSearchResponse = serde_json::from_str(body)?;
    Ok(response
        .tracks
        .unwrap_or_default()
        .into_iter()
        .map(TidalTrack::from)
        .collect())
}

/// Maps a failed response to an error. Rejected credentials are authentication
/// failures, everything else is an API error.
fn status_error(status: StatusCode, body: &str, context: &str) -> AppError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        AppError::Auth(format!("{} ({}): {}", context, status, body))
    } else {
        AppError::TidalApi(format!("{} ({}): {}", context, status, body))
    }
}

/// POST to the token endpoint. The client secret is only sent when configured.
fn token_request(
    client: &Client,
    client_id: &str,
    client_secret: Option<&str>,
    params: &[(&str, &str)],
) -> RequestBuilder {
    let mut form = vec![("client_id", client_id)];
    form.extend_from_slice(params);

    let request = client.post(format!("{}/token", TIDAL_AUTH_URL)).form(&form);
    match client_secret {
        Some(secret) => request.basic_auth(client_id, Some(secret)),
        None => request,
    }
}

pub struct TidalClient {
    http_client: Client,
    access_token: String,
    user_id: String,
}

impl TidalClient {
    /// Reuses the session saved at `session_path` when it is still valid, refreshes
    /// it when possible, and otherwise runs the interactive device login and saves
    /// the new session.
    pub async fn connect(
        client_id: &str,
        client_secret: Option<&str>,
        session_path: &Path,
    ) -> Result<Self> {
        let http_client = Client::new();

        let saved = TidalSession::load(session_path);
        let session = match saved {
            Some(session) if session.is_valid_at(Utc::now()) => {
                info!("Using existing Tidal session");
                session
            }
            Some(TidalSession {
                refresh_token: Some(refresh_token),
                user_id,
                ..
            }) => match Self::refresh(&http_client, client_id, client_secret, &refresh_token).await {
                Ok(token) => {
                    info!("Refreshed Tidal session");
                    let session = Self::session_from(token, Some(refresh_token), user_id);
                    session.save(session_path)?;
                    session
                }
                Err(e) => {
                    warn!("Could not refresh Tidal session: {}", e);
                    Self::login(&http_client, client_id, client_secret, session_path).await?
                }
            },
            _ => Self::login(&http_client, client_id, client_secret, session_path).await?,
        };

        Ok(Self {
            http_client,
            access_token: session.access_token,
            user_id: session.user_id.unwrap_or_else(|| "me".to_string()),
        })
    }

    fn session_from(
        token: TokenResponse,
        previous_refresh: Option<String>,
        previous_user: Option<String>,
    ) -> TidalSession {
        TidalSession::new(
            token.access_token,
            token.refresh_token.or(previous_refresh),
            token.expires_in,
            token.user_id.map(String::from).or(previous_user),
        )
    }

    async fn login(
        http_client: &Client,
        client_id: &str,
        client_secret: Option<&str>,
        session_path: &Path,
    ) -> Result<TidalSession> {
        let device_auth = Self::device_authorization(http_client, client_id).await?;

        println!("\nTidal Authentication Required");
        println!("==============================");
        println!("Your session will be saved for future runs.");
        if let Some(uri) = &device_auth.verification_uri_complete {
            println!("Visit this URL: {}", uri);
        } else {
            println!("Visit: {}", device_auth.verification_uri);
            println!("Enter code: {}", device_auth.user_code);
        }
        println!("\nWaiting for authentication...");

        let token = Self::poll_for_token(
            http_client,
            client_id,
            client_secret,
            &device_auth.device_code,
            device_auth.interval,
            device_auth.expires_in,
        )
        .await?;

        info!("Successfully authenticated with Tidal");

        let session = Self::session_from(token, None, None);
        session.save(session_path)?;
        Ok(session)
    }

    async fn device_authorization(client: &Client, client_id: &str) -> Result<DeviceAuthResponse> {
        let response = client
            .post(format!("{}/device_authorization", TIDAL_AUTH_URL))
            .form(&[
                ("client_id", client_id),
                ("scope", "playlists.read playlists.write search.read"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Device authorization failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse device auth response: {}", e)))
    }

    async fn poll_for_token(
        client: &Client,
        client_id: &str,
        client_secret: Option<&str>,
        device_code: &str,
        interval: u64,
        expires_in: u64,
    ) -> Result<TokenResponse> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_secs(expires_in);

        loop {
            if start.elapsed() > timeout {
                return Err(AppError::Auth("Device authorization timed out".into()));
            }

            tokio::time::sleep(std::time::Duration::from_secs(interval.max(1))).await;

            let response = token_request(
                client,
                client_id,
                client_secret,
                &[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                    ("device_code", device_code),
                ],
            )
            .send()
            .await?;

            if response.status().is_success() {
                return response.json().await.map_err(|e| {
                    AppError::Auth(format!("Failed to parse token response: {}", e))
                });
            }

            // Check if still pending
            let error_text = response.text().await.unwrap_or_default();
            if !error_text.contains("authorization_pending") {
                return Err(AppError::Auth(format!("Token request failed: {}", error_text)));
            }

            print!(".");
            io::stdout().flush().ok();
        }
    }

    async fn refresh(
        client: &Client,
        client_id: &str,
        client_secret: Option<&str>,
        refresh_token: &str,
    ) -> Result<TokenResponse> {
        let response = token_request(
            client,
            client_id,
            client_secret,
            &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
        )
        .send()
        .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token refresh failed ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }
}

#[async_trait]
impl TrackSearch for TidalClient {
    async fn search_tracks(&self, query: &str) -> Result<Vec<TidalTrack>> {
        let url = format!(
            "{}/searchresults/{}/relationships/tracks",
            TIDAL_API_BASE,
            urlencoding::encode(query)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("countryCode", "US"), ("limit", "20")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body, "Tidal search failed"));
        }

        let tracks = parse_search_response(&body)?;
        debug!("Tidal search '{}' returned {} tracks", query, tracks.len());
        Ok(tracks)
    }
}

#[async_trait]
impl TargetCatalog for TidalClient {
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let url = format!("{}/users/{}/playlists", TIDAL_API_BASE, self.user_id);

        let request = CreatePlaylistRequest {
            name,
            description: Some(description),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text, "Failed to create playlist"));
        }

        let api_playlist: TidalApiPlaylist = response.json().await?;

        info!("Created Tidal playlist: {}", name);

        Ok(api_playlist.uuid)
    }

    async fn add_tracks_to_playlist(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        if track_ids.is_empty() {
            return Ok(());
        }

        let url = format!(
            "{}/playlists/{}/relationships/tracks",
            TIDAL_API_BASE, playlist_id
        );

        let track_data: Vec<_> = track_ids
            .iter()
            .map(|id| serde_json::json!({"id": id, "type": "tracks"}))
            .collect();

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({"data": track_data}))
            .send()
            .await?;

        if response.status().is_success() {
            info!("Added {} tracks to playlist", track_ids.len());
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(status_error(status, &error_text, "Failed to add tracks to playlist"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response_maps_tracks() {
        let body = r#"{
            "tracks": [
                {
                    "id": 77646170,
                    "title": "Bohemian Rhapsody",
                    "artists": [{"name": "Queen"}],
                    "album": {"title": "A Night at the Opera"},
                    "duration": 354,
                    "isrc": "GBUM71029604"
                },
                {
                    "id": "abc-123",
                    "title": "Untimed",
                    "duration": 0
                }
            ]
        }"#;

        let tracks = parse_search_response(body).unwrap();
        assert_eq!(tracks.len(), 2);

        assert_eq!(tracks[0].id, "77646170");
        assert_eq!(tracks[0].artists, vec!["Queen".to_string()]);
        assert_eq!(tracks[0].album, "A Night at the Opera");
        assert_eq!(tracks[0].duration_secs, Some(354));
        assert_eq!(tracks[0].isrc.as_deref(), Some("GBUM71029604"));

        assert_eq!(tracks[1].id, "abc-123");
        assert!(tracks[1].artists.is_empty());
        assert_eq!(tracks[1].album, "");
        assert_eq!(tracks[1].duration_secs, None);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse_search_response("{}").unwrap().is_empty());
        assert!(matches!(
            parse_search_response("<html>busy</html>"),
            Err(AppError::Json(_))
        ));
    }

    #[test]
    fn test_status_error_classification() {
        assert!(status_error(StatusCode::UNAUTHORIZED, "", "search").is_fatal());
        assert!(status_error(StatusCode::FORBIDDEN, "", "search").is_fatal());
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "", "search"),
            AppError::TidalApi(_)
        ));
    }
}
