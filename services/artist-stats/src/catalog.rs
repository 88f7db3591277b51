//!
//! src/catalog.rs  Andrew Belles  Oct 19th, 2026
//!
//! Turns an artist name into the flat list of enriched tracks across
//! every album credited to the first matching artist. Requests are
//! issued strictly one after another: search, albums, tracks per
//! album, then one detail lookup per track
//!

use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::StatsError;
use crate::types::{ArtistRef, SpotifyAlbumId, SpotifyArtistId, SpotifyTrackId, Track};

/// Remote capabilities the catalog client is built on
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Best textual match for query, None when the search is empty
    async fn search_artist(&self, query: &str) -> Result<Option<ArtistRef>, StatsError>;

    /// One page of albums credited to artist
    async fn artist_albums(&self, artist: &SpotifyArtistId) ->
        Result<Vec<SpotifyAlbumId>, StatsError>;

    /// One page of tracks on album
    async fn album_tracks(&self, album: &SpotifyAlbumId) ->
        Result<Vec<SpotifyTrackId>, StatsError>;

    async fn track_detail(&self, track: &SpotifyTrackId) -> Result<Track, StatsError>;
}

pub struct CatalogClient<S> {
    source: S
}

impl<S: CatalogSource> CatalogClient<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn resolve_artist(&self, artist_name: &str) -> Result<ArtistRef, StatsError> {
        let artist = self.source.search_artist(artist_name).await?
            .ok_or_else(|| StatsError::NotFound(
                format!("no artist matches {artist_name:?}")
            ))?;
        info!(query = artist_name, artist = %artist.name, id = %artist.id.0, "catalog.resolved");
        Ok(artist)
    }

    /// Every track on every album of the first artist matching artist_name,
    /// in fetch order
    pub async fn fetch_all_tracks(&self, artist_name: &str) -> Result<Vec<Track>, StatsError> {
        let artist = self.resolve_artist(artist_name).await?;

        let albums = self.source.artist_albums(&artist.id).await?;
        debug!(albums = albums.len(), "catalog.albums");

        let mut track_ids = Vec::new();
        for album in &albums {
            let ids = self.source.album_tracks(album).await?;
            debug!(album = %album.0, tracks = ids.len(), "catalog.album.tracks");
            track_ids.extend(ids);
        }

        let mut tracks = Vec::with_capacity(track_ids.len());
        for id in &track_ids {
            tracks.push(self.source.track_detail(id).await?);
        }

        info!(
            artist = %artist.name,
            albums = albums.len(),
            tracks = tracks.len(),
            "catalog.fetched"
        );
        Ok(tracks)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog that records every call made against it
    #[derive(Default)]
    pub(crate) struct FakeSource {
        pub artist: Option<ArtistRef>,
        pub albums: Vec<SpotifyAlbumId>,
        pub album_tracks: HashMap<SpotifyAlbumId, Vec<SpotifyTrackId>>,
        pub details: HashMap<SpotifyTrackId, Track>,
        pub fail_on_track: Option<SpotifyTrackId>,
        pub calls: Mutex<Vec<String>>
    }

    impl FakeSource {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Artist "Band" with two albums: a1 = [t1, t2], a2 = [t3]
        pub(crate) fn band() -> Self {
            let mut source = FakeSource {
                artist: Some(ArtistRef {
                    id: SpotifyArtistId("art".into()),
                    name: "Band".into()
                }),
                albums: vec![SpotifyAlbumId("a1".into()), SpotifyAlbumId("a2".into())],
                ..Default::default()
            };
            source.album_tracks.insert(
                SpotifyAlbumId("a1".into()),
                vec![SpotifyTrackId("t1".into()), SpotifyTrackId("t2".into())]
            );
            source.album_tracks.insert(
                SpotifyAlbumId("a2".into()),
                vec![SpotifyTrackId("t3".into())]
            );
            for (id, name, popularity, album) in [
                ("t1", "Opener", 40, "First"),
                ("t2", "Closer", 70, "First"),
                ("t3", "Single", 55, "Second"),
            ] {
                source.details.insert(
                    SpotifyTrackId(id.into()),
                    Track::new(name, vec!["Band".into()], popularity, album)
                );
            }
            source
        }
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn search_artist(&self, query: &str) -> Result<Option<ArtistRef>, StatsError> {
            self.log(format!("search:{query}"));
            Ok(self.artist.clone())
        }

        async fn artist_albums(&self, artist: &SpotifyArtistId) ->
            Result<Vec<SpotifyAlbumId>, StatsError> {
            self.log(format!("albums:{}", artist.0));
            Ok(self.albums.clone())
        }

        async fn album_tracks(&self, album: &SpotifyAlbumId) ->
            Result<Vec<SpotifyTrackId>, StatsError> {
            self.log(format!("tracks:{}", album.0));
            Ok(self.album_tracks.get(album).cloned().unwrap_or_default())
        }

        async fn track_detail(&self, track: &SpotifyTrackId) -> Result<Track, StatsError> {
            self.log(format!("track:{}", track.0));
            if self.fail_on_track.as_ref() == Some(track) {
                return Err(StatsError::RemoteUnavailable("status 503".into()));
            }
            self.details.get(track).cloned()
                .ok_or_else(|| StatsError::RemoteUnavailable(format!("status 404 for {}", track.0)))
        }
    }

    #[tokio::test]
    async fn fetches_every_track_of_every_album_in_order() {
        let client = CatalogClient::new(FakeSource::band());
        let tracks = client.fetch_all_tracks("band").await.unwrap();

        let names: Vec<_> = tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Opener", "Closer", "Single"]);
        assert_eq!(tracks[2].album, "Second");
        assert_eq!(tracks[1].popularity, 70);
    }

    #[tokio::test]
    async fn requests_are_issued_in_a_fixed_sequence() {
        let client = CatalogClient::new(FakeSource::band());
        client.fetch_all_tracks("band").await.unwrap();

        assert_eq!(client.source.calls(), vec![
            "search:band",
            "albums:art",
            "tracks:a1",
            "tracks:a2",
            "track:t1",
            "track:t2",
            "track:t3",
        ]);
    }

    #[tokio::test]
    async fn empty_search_is_not_found() {
        let client = CatalogClient::new(FakeSource::default());
        let err = client.fetch_all_tracks("Nobody At All").await.unwrap_err();

        assert!(matches!(err, StatsError::NotFound(ref m) if m.contains("Nobody At All")));
        assert_eq!(client.source.calls(), vec!["search:Nobody At All"]);
    }

    #[tokio::test]
    async fn artist_without_albums_yields_empty_catalog() {
        let source = FakeSource { albums: vec![], ..FakeSource::band() };
        let client = CatalogClient::new(source);
        let tracks = client.fetch_all_tracks("band").await.unwrap();
        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn remote_failure_aborts_without_partial_result() {
        let source = FakeSource {
            fail_on_track: Some(SpotifyTrackId("t2".into())),
            ..FakeSource::band()
        };
        let client = CatalogClient::new(source);
        let err = client.fetch_all_tracks("band").await.unwrap_err();

        assert!(err.is_remote());
        // no request after the failing one
        assert_eq!(client.source.calls().last().map(String::as_str), Some("track:t2"));
    }
}
