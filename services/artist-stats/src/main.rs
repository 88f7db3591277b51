//!
//! src/main.rs  Andrew Belles  Oct 19th, 2026
//!
//! Entry point. Prompts for an artist, pulls their catalog from Spotify,
//! prints the popularity summary and maps typed failures to exit codes
//!
//!

mod analyzer;
mod catalog;
mod config;
mod errors;
mod fetch;
mod logging;
mod report;
mod types;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::{error, info, Instrument};

use crate::analyzer::CatalogAnalyzer;
use crate::catalog::{CatalogClient, CatalogSource};
use crate::config::AppConfig;
use crate::errors::StatsError;

#[tokio::main]
async fn main() -> Result<ExitCode, StatsError> {
    let cfgs = config::load_config()?;
    let _logger = logging::init_logging(&cfgs.logging)?;

    info!(
        service="artist-stats",
        version=%env!("CARGO_PKG_VERSION"),
        "starting"
    );

    let artist_name = {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        prompt_artist_name(&mut input, &mut io::stdout())
    };

    let run_id = uuid::Uuid::new_v4();
    let outcome = match artist_name {
        Ok(name) => run(&cfgs, &name)
            .instrument(tracing::info_span!("run", %run_id))
            .await,
        Err(e) => Err(e)
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, remote = e.is_remote(), code = e.exit_code(), "run.failed");
            eprintln!("error: {e}");
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

/// Reads one artist name, rejecting blank lines and a closed input
fn prompt_artist_name<R: BufRead, W: Write>(input: &mut R, out: &mut W) ->
    Result<String, StatsError> {
    write!(out, "Enter artist name: ")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(StatsError::InvalidInput("no artist name given".to_string()));
    }

    let name = line.trim();
    if name.is_empty() {
        return Err(StatsError::InvalidInput("artist name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

async fn run(cfgs: &AppConfig, artist_name: &str) -> Result<(), StatsError> {
    let spotify = fetch::SpotifyClient::new(&cfgs.http, &cfgs.spotify)?;
    summarize(spotify, cfgs, artist_name, &mut io::stdout().lock()).await
}

/// Fetch, analyze and report for one artist against any catalog source
async fn summarize<S: CatalogSource, W: Write>(
    source: S,
    cfgs: &AppConfig,
    artist_name: &str,
    out: &mut W
) -> Result<(), StatsError> {
    let client = CatalogClient::new(source);
    let tracks = client.fetch_all_tracks(artist_name).await?;

    let analyzer = CatalogAnalyzer::with_album_key(tracks, cfgs.analysis.album_key);
    let summary = analyzer.summary(cfgs.analysis.top_n)?;
    info!(
        album = %summary.most_popular_album,
        average = summary.average_popularity,
        ranked = summary.top_tracks.len(),
        "analysis.done"
    );

    report::write_report(out, &summary)
}

/// Unit Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use url::Url;

    use crate::catalog::tests::FakeSource;
    use crate::config::{AnalysisConfig, HttpConfig, LoggingConfig, SpotifyConfig};

    fn live() -> bool {
        std::env::var("LIVE_HTTP").ok().as_deref() == Some("1")
    }

    fn offline_config() -> AppConfig {
        AppConfig {
            spotify: SpotifyConfig {
                client_id: "id".into(),
                client_secret: "secret".into(),
                token_url: Url::parse("https://accounts.spotify.com/api/token").unwrap(),
                api_base: Url::parse("https://api.spotify.com/v1/").unwrap(),
                market: None
            },
            http: HttpConfig::default(),
            analysis: AnalysisConfig::default(),
            logging: LoggingConfig::default()
        }
    }

    #[test]
    fn prompt_trims_the_name() {
        let mut input = Cursor::new("  Tame Impala \n");
        let mut out = Vec::new();
        let name = prompt_artist_name(&mut input, &mut out).unwrap();

        assert_eq!(name, "Tame Impala");
        assert_eq!(String::from_utf8(out).unwrap(), "Enter artist name: ");
    }

    #[test]
    fn prompt_rejects_blank_and_closed_input() {
        let err = prompt_artist_name(&mut Cursor::new("   \n"), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
        assert_eq!(err.exit_code(), 5);

        let err = prompt_artist_name(&mut Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, StatsError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn summarize_prints_full_report() {
        let mut out = Vec::new();
        summarize(FakeSource::band(), &offline_config(), "band", &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "\
Most popular album is Closer
Average song popularity 55.00
Top20 song by popularity:
1. Band - Closer, album First
2. Band - Single, album Second
3. Band - Opener, album First
");
    }

    #[tokio::test]
    async fn summarize_groups_by_album_when_configured() {
        let mut cfgs = offline_config();
        cfgs.analysis.album_key = config::AlbumKey::AlbumTitle;
        cfgs.analysis.top_n = 1;

        let mut out = Vec::new();
        summarize(FakeSource::band(), &cfgs, "band", &mut out).await.unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Most popular album is First\n"));
        assert!(printed.ends_with("Top1 song by popularity:\n1. Band - Closer, album First\n"));
    }

    #[tokio::test]
    async fn summarize_surfaces_typed_errors() {
        let mut out = Vec::new();
        let err = summarize(FakeSource::default(), &offline_config(), "nobody", &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(out.is_empty());

        let no_albums = FakeSource { albums: vec![], ..FakeSource::band() };
        let err = summarize(no_albums, &offline_config(), "band", &mut out)
            .await
            .unwrap_err();
        assert!(matches!(err, StatsError::EmptyInput(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    #[allow(dead_code)]
    async fn artist_summary_testbench() -> Result<(), StatsError> {
        dotenvy::dotenv().ok();

        if !live() {
            eprintln!("Set LIVE_HTTP=1 to run");
            return Ok(())
        }

        let cfgs = config::load_config()?;
        let spotify = fetch::SpotifyClient::new(&cfgs.http, &cfgs.spotify)?;

        let mut out = Vec::new();
        summarize(spotify, &cfgs, "Tame Impala", &mut out).await?;

        let printed = String::from_utf8(out).unwrap();
        println!("{printed}");
        assert!(printed.starts_with("Most popular album is "));

        Ok(())
    }
}
