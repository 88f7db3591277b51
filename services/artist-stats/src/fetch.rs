//!
//! src/fetch.rs  Andrew Belles  Oct 19th, 2026
//!
//! Spotify transport. Builds the http client, exchanges client
//! credentials for a bearer token, hits the four catalog endpoints
//! and owns retry / backoff for every request it sends
//!

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use reqwest::{Client, header, redirect, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::{sync::Mutex, time::sleep};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::CatalogSource;
use crate::config::{
    HttpConfig, RetryConfig, SpotifyConfig,
    ALBUMS_PAGE_LIMIT, SEARCH_LIMIT, TRACKS_PAGE_LIMIT
};
use crate::errors::StatsError;
use crate::types::{ArtistRef, SpotifyAlbumId, SpotifyArtistId, SpotifyTrackId, Track};

/// Tokens are refreshed this long before Spotify says they expire
const TOKEN_EXPIRY_SLACK_SECS: i64 = 60;

/// Client building functionality
fn client_helper(http: &HttpConfig) -> reqwest::ClientBuilder  {
    Client::builder()
        .timeout(http.timeout)
        .connect_timeout(http.connect_timeout)
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .pool_idle_timeout(Some(http.pool_idle_timeout))
        .redirect(redirect::Policy::limited(http.max_redirects as usize))
}

pub fn base_client(http: &HttpConfig) -> Result<Client, StatsError> {
    let mut h = header::HeaderMap::new();
    h.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    client_helper(http)
        .default_headers(h)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| StatsError::Config(format!("build client: {e}")))
}

///
/// Wire shapes of the Spotify responses. Only the fields read are modelled.
///

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64
}

#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub total: Option<u32>
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    pub id: String
}

#[derive(Debug, Deserialize)]
pub struct AlbumName {
    pub name: String
}

/// Track as listed inside a search page or an album page
#[derive(Debug, Deserialize)]
pub struct TrackRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistObject>
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub tracks: Paging<TrackRef>
}

/// GET /v1/tracks/{id}
#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub name: String,
    pub popularity: u32,
    pub album: AlbumName,
    pub artists: Vec<ArtistObject>
}

impl From<TrackObject> for Track {
    fn from(t: TrackObject) -> Self {
        Track::new(
            t.name,
            t.artists.into_iter().map(|a| a.name).collect(),
            t.popularity,
            t.album.name
        )
    }
}

/// First artist credited on the first search hit, if there is one
pub fn first_artist(response: SearchResponse) -> Option<ArtistRef> {
    let track = response.tracks.items.into_iter().next()?;
    let artist = track.artists.into_iter().next()?;
    Some(ArtistRef { id: SpotifyArtistId(artist.id?), name: artist.name })
}

#[derive(Clone)]
pub struct AccessToken {
    bearer: String,
    expires_at: DateTime<Utc>
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("bearer", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl AccessToken {
    pub fn from_response(token: TokenResponse, now: DateTime<Utc>) -> Self {
        let ttl = (token.expires_in - TOKEN_EXPIRY_SLACK_SECS).max(0);
        Self {
            bearer: token.access_token,
            expires_at: now + chrono::Duration::seconds(ttl)
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Simple function to generate random wait between attempts
fn generate_backoff(
    base: Duration,
    attempt: u8,
    jitter: bool,
    rng: &mut SmallRng
) -> Duration {
    let exp = base.saturating_mul(1_u32 << attempt.min(6));
    let jitter = if jitter { rng.gen_range(50..=200) } else { 0 };
    exp + Duration::from_millis(jitter)
}

/// Retry-After is sent in whole seconds by Spotify on 429
fn retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers.get(header::RETRY_AFTER)?
        .to_str().ok()?
        .trim()
        .parse::<u64>().ok()
        .map(Duration::from_secs)
}

/// Sends request, retrying transport failures and retryable statuses,
/// and decodes the json body of the first successful response
async fn send_with_retry<T: DeserializeOwned>(
    request: RequestBuilder,
    retry: &RetryConfig,
    what: &str
) -> Result<T, StatsError> {
    let mut rng = SmallRng::from_entropy();
    let mut attempt = 0_u8;
    loop {
        let response = request.try_clone()
            .ok_or_else(|| StatsError::RemoteUnavailable(
                format!("{what}: non-cloneable request")
            ))?
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                let body = resp.bytes().await?;
                return serde_json::from_slice::<T>(&body)
                    .map_err(|e| StatsError::Parse(format!("{what}: {e}")));
            },
            Ok(resp) => {
                let status = resp.status();
                let hinted = retry_after(resp.headers());
                if !retry.is_retryable(status.as_u16()) || attempt >= retry.max_attempts {
                    return Err(status_error(status, attempt, what));
                }
                // a penalty longer than we are willing to wait fails the run
                if hinted.is_some_and(|wait| wait > retry.max_retry_after) {
                    warn!(status = %status, retry_after = ?hinted, what, "http.retry.refused");
                    return Err(status_error(status, attempt, what));
                }
                let backoff = hinted.unwrap_or_else(||
                    generate_backoff(retry.base_backoff, attempt, retry.jitter, &mut rng)
                );
                warn!(status = %status, backoff = ?backoff.as_millis(), what, "http.retry");
                sleep(backoff).await;
                attempt += 1;
            },
            Err(e) => {
                if attempt >= retry.max_attempts {
                    return Err(StatsError::RemoteUnavailable(format!("{what}: {e}")));
                }
                let backoff = generate_backoff(
                    retry.base_backoff, attempt, retry.jitter, &mut rng
                );
                warn!(error = %e, backoff = ?backoff.as_millis(), what, "http.retry.error");
                sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

fn status_error(status: StatusCode, attempt: u8, what: &str) -> StatsError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => StatsError::RateLimited(
            format!("{what}: status {status} after {attempt} retries")
        ),
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN =>
            StatsError::RemoteUnavailable(
                format!("{what}: rejected with status {status}, check credentials")
            ),
        _ => StatsError::RemoteUnavailable(
            format!("{what}: status {status} after {attempt} retries")
        )
    }
}

#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    cfg: SpotifyConfig,
    retry: RetryConfig,
    token: Mutex<Option<AccessToken>>
}

impl SpotifyClient {
    pub fn new(http_config: &HttpConfig, cfg: &SpotifyConfig) ->
        Result<Self, StatsError> {

        let http = base_client(http_config)?;
        Ok( Self {
            http,
            cfg: cfg.clone(),
            retry: http_config.retry.clone(),
            token: Mutex::new(None)
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StatsError> {
        self.cfg.api_base.join(path)
            .map_err(|e| StatsError::Config(format!("join {path} onto api base: {e}")))
    }

    fn with_market(&self, rb: RequestBuilder) -> RequestBuilder {
        match self.cfg.market.as_deref() {
            Some(market) => rb.query(&[("market", market)]),
            None => rb
        }
    }

    pub fn token_request(&self) -> RequestBuilder {
        self.http
            .post(self.cfg.token_url.clone())
            .basic_auth(&self.cfg.client_id, Some(&self.cfg.client_secret))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
    }

    /// GET /v1/search?type=track&q=...&limit=&offset=
    pub fn search(&self, query: &str, limit: u32, offset: u32, bearer: &str) ->
        Result<RequestBuilder, StatsError> {
        let url = self.endpoint("search")?;
        Ok(self.http.get(url).bearer_auth(bearer).query(&[
            ("type", "track"),
            ("q", query),
            ("limit", &limit.to_string()),
            ("offset", &offset.to_string())
        ]))
    }

    /// GET /v1/artists/{id}/albums?limit=&offset=
    pub fn artist_albums_page(&self, artist_id: &str, limit: u32, offset: u32, bearer: &str) ->
        Result<RequestBuilder, StatsError> {
        let url = self.endpoint(&format!("artists/{artist_id}/albums"))?;
        let rb = self.http.get(url).bearer_auth(bearer).query(&[
            ("limit", &limit.to_string()),
            ("offset", &offset.to_string())
        ]);
        Ok(self.with_market(rb))
    }

    /// GET /v1/albums/{id}/tracks?limit=&offset=
    pub fn album_tracks_page(&self, album_id: &str, limit: u32, offset: u32, bearer: &str) ->
        Result<RequestBuilder, StatsError> {
        let url = self.endpoint(&format!("albums/{album_id}/tracks"))?;
        let rb = self.http.get(url).bearer_auth(bearer).query(&[
            ("limit", &limit.to_string()),
            ("offset", &offset.to_string())
        ]);
        Ok(self.with_market(rb))
    }

    /// GET /v1/tracks/{id}
    pub fn track(&self, track_id: &str, bearer: &str) -> Result<RequestBuilder, StatsError> {
        let url = self.endpoint(&format!("tracks/{track_id}"))?;
        Ok(self.with_market(self.http.get(url).bearer_auth(bearer)))
    }

    /// Cached bearer token, exchanging client credentials when stale
    pub async fn bearer(&self) -> Result<String, StatsError> {
        let mut slot = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = slot.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.bearer.clone());
        }

        debug!("spotify.token.request");
        let response: TokenResponse = send_with_retry(
            self.token_request(), &self.retry, "token"
        ).await?;
        let token = AccessToken::from_response(response, Utc::now());
        debug!(expires_at = %token.expires_at, "spotify.token.granted");

        let bearer = token.bearer.clone();
        *slot = Some(token);
        Ok(bearer)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str
    ) -> Result<T, StatsError> {
        send_with_retry(request, &self.retry, what).await
    }
}

#[async_trait]
impl CatalogSource for SpotifyClient {
    async fn search_artist(&self, query: &str) -> Result<Option<ArtistRef>, StatsError> {
        let bearer = self.bearer().await?;
        let request = self.search(query, SEARCH_LIMIT, 0, &bearer)?;
        let response: SearchResponse = self.get(request, "search").await?;
        Ok(first_artist(response))
    }

    async fn artist_albums(&self, artist: &SpotifyArtistId) ->
        Result<Vec<SpotifyAlbumId>, StatsError> {
        let bearer = self.bearer().await?;
        let request = self.artist_albums_page(&artist.0, ALBUMS_PAGE_LIMIT, 0, &bearer)?;
        let page: Paging<AlbumObject> = self.get(request, "artist albums").await?;
        if page.next.is_some() {
            debug!(artist = %artist.0, total = ?page.total, "spotify.albums.truncated");
        }
        Ok(page.items.into_iter().map(|a| SpotifyAlbumId(a.id)).collect())
    }

    async fn album_tracks(&self, album: &SpotifyAlbumId) ->
        Result<Vec<SpotifyTrackId>, StatsError> {
        let bearer = self.bearer().await?;
        let request = self.album_tracks_page(&album.0, TRACKS_PAGE_LIMIT, 0, &bearer)?;
        let page: Paging<TrackRef> = self.get(request, "album tracks").await?;
        if page.next.is_some() {
            debug!(album = %album.0, total = ?page.total, "spotify.tracks.truncated");
        }

        // local files on an album carry no id and cannot be looked up
        let ids = page.items.into_iter()
            .filter_map(|t| t.id)
            .map(SpotifyTrackId)
            .collect();
        Ok(ids)
    }

    async fn track_detail(&self, track: &SpotifyTrackId) -> Result<Track, StatsError> {
        let bearer = self.bearer().await?;
        let request = self.track(&track.0, &bearer)?;
        let detail: TrackObject = self.get(request, "track").await?;
        Ok(detail.into())
    }
}
