//!
//! src/config.rs  Andrew Belles  Oct 19th, 2026
//!
//! Loads credentials, endpoints and tunables from the environment
//! (optionally a .env file) into one AppConfig at program start
//!

use std::fmt;
use std::time;

use url::Url;

use crate::errors::StatsError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 4;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const RETRY_MAX_ATTEMPTS: u8 = 3;
pub const RETRY_BASE_BACKOFF: u64 = 500;
pub const RETRY_JITTER: bool = true;
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
/// Longest Retry-After we are willing to sleep through, in ms
pub const RETRY_MAX_AFTER: u64 = 30000;

/// Page sizes used against the catalog endpoints. Only one page is read.
pub const SEARCH_LIMIT: u32 = 1;
pub const ALBUMS_PAGE_LIMIT: u32 = 20;
pub const TRACKS_PAGE_LIMIT: u32 = 50;

/// Source of configuration values, `std::env::var` outside of tests
type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Returns the value for s or an error naming the unset variable
fn env_check(env: EnvLookup, s: &str) -> Result<String, StatsError> {
    match env(s) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(StatsError::Config(format!("{s} was not set"))),
    }
}

/// Ensures that url is https
fn ensure_https(url: &Url) -> Result<(), String> {
    if url.scheme() == "https" {
        Ok(())
    } else {
        Err(format!("URL must be https: {url}"))
    }
}

fn ensure_host(url: &Url, expected_host: &str) -> Result<(), String> {
    match url.host_str() {
        Some(h) if h.eq_ignore_ascii_case(expected_host) => Ok(()),
        Some(h) => Err(
            format!("Unexpected host for {url} (got {h}, expected {expected_host})")
        ),
        None => Err(format!("URL missing host: {url}"))
    }
}

fn ensure_trailing_slash(url: &mut Url) {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
}

/// Parses, validates and normalizes one endpoint url
fn endpoint(
    env: EnvLookup,
    key: &str,
    default: &str,
    expected_host: &str
) -> Result<Url, StatsError> {
    let raw = env(key).unwrap_or_else(|| default.to_string());
    let mut url = Url::parse(&raw)
        .map_err(|e| StatsError::Config(format!("{key} invalid {e}")))?;

    ensure_https(&url).map_err(StatsError::Config)?;
    ensure_host(&url, expected_host).map_err(StatsError::Config)?;
    ensure_trailing_slash(&mut url);
    Ok(url)
}

/// Configuration that Spotify expects when hitting endpoints
#[derive(Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: Url,
    pub api_base: Url,
    pub market: Option<String>
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url.as_str())
            .field("api_base", &self.api_base.as_str())
            .field("market", &self.market)
            .finish()
    }
}

fn build_spotify(env: EnvLookup) -> Result<SpotifyConfig, StatsError> {
    let client_id     = env_check(env, "SPOTIFY_CLIENT_ID")?;
    let client_secret = env_check(env, "SPOTIFY_CLIENT_SECRET")?;

    // token url keeps its exact path, api base is joined against
    let token_url = {
        let raw = env("SPOTIFY_TOKEN_URL")
            .unwrap_or_else(|| "https://accounts.spotify.com/api/token".to_string());
        let url = Url::parse(&raw)
            .map_err(|e| StatsError::Config(format!("SPOTIFY_TOKEN_URL invalid {e}")))?;
        ensure_https(&url).map_err(StatsError::Config)?;
        ensure_host(&url, "accounts.spotify.com").map_err(StatsError::Config)?;
        url
    };

    let api_base = endpoint(
        env,
        "SPOTIFY_API_BASE",
        "https://api.spotify.com/v1/",
        "api.spotify.com"
    )?;

    let market = env("SPOTIFY_MARKET")
        .map(|m| m.trim().to_ascii_uppercase())
        .filter(|m| !m.is_empty());

    if let Some(m) = market.as_deref() {
        if m.len() != 2 || !m.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(StatsError::Config(
                format!("SPOTIFY_MARKET must be a two letter country code, got {m}")
            ));
        }
    }

    Ok( SpotifyConfig { client_id, client_secret, token_url, api_base, market })
}

///
/// Configuration for Http timeouts, retries, etc.
///
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u8,
    pub base_backoff: time::Duration,
    pub jitter: bool,
    pub retryable_statuses: Vec<u16>,
    pub max_retry_after: time::Duration
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_backoff: time::Duration::from_millis(RETRY_BASE_BACKOFF),
            jitter: RETRY_JITTER,
            retryable_statuses: RETRYABLE_STATUSES.to_vec(),
            max_retry_after: time::Duration::from_millis(RETRY_MAX_AFTER)
        }
    }
}

impl RetryConfig {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8,
    pub retry: RetryConfig
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS,
            retry: RetryConfig::default()
        }
    }
}

///
/// Configuration for the analysis pass
///

//
// Which track field most_popular_album groups on
//
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlbumKey {
    #[default]
    TrackTitle,
    AlbumTitle
}

impl AlbumKey {
    pub fn parse(s: &str) -> Option<AlbumKey> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "name" | "track" => Some(AlbumKey::TrackTitle),
            "album" => Some(AlbumKey::AlbumTitle),
            _ => None
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub album_key: AlbumKey,
    pub top_n: usize
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { album_key: AlbumKey::default(), top_n: crate::analyzer::TOP_TRACKS }
    }
}

fn build_analysis(env: EnvLookup) -> Result<AnalysisConfig, StatsError> {
    let mut cfg = AnalysisConfig::default();

    if let Some(raw) = env("ALBUM_GROUP_KEY") {
        cfg.album_key = AlbumKey::parse(&raw).ok_or_else(|| StatsError::Config(
            format!("ALBUM_GROUP_KEY must be title or album, got {raw}")
        ))?;
    }

    if let Some(raw) = env("TOP_TRACKS") {
        cfg.top_n = match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => return Err(StatsError::Config(
                format!("TOP_TRACKS must be a positive integer, got {raw}")
            ))
        };
    }

    Ok(cfg)
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "warn,artist_stats=info".to_string(),
            format: LogFormat::Pretty,
            with_ansi: true,
            include_file_line: false,
            include_target: true
        }
    }
}

fn build_logging(env: EnvLookup) -> Result<LoggingConfig, StatsError> {
    let mut cfg = LoggingConfig::default();

    if let Some(raw) = env("LOG_FORMAT") {
        let format = match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => return Err(StatsError::Config(
                format!("LOG_FORMAT must be pretty or json, got {raw}")
            ))
        };
        cfg.include_file_line = format == LogFormat::Json;
        cfg.format = format;
    }

    // https://no-color.org
    if env("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        cfg.with_ansi = false;
    }

    Ok(cfg)
}

///
/// AppConfig which holds everything the client, analyzer and logger need
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub spotify: SpotifyConfig,
    pub http: HttpConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig
}

fn build_config(env: EnvLookup) -> Result<AppConfig, StatsError> {
    let spotify  = build_spotify(env)?;
    let http     = HttpConfig::default();
    let analysis = build_analysis(env)?;
    let logging  = build_logging(env)?;

    Ok( AppConfig { spotify, http, analysis, logging } )
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, StatsError> {
    dotenvy::dotenv().ok();
    build_config(&process_env)
}
