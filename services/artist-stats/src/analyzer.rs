//!
//! src/analyzer.rs  Andrew Belles  Oct 19th, 2026
//!
//! Summary statistics over one artist catalog. The analyzer owns its
//! tracks and never reorders them, so the order calls are made in
//! cannot change any result
//!

use std::collections::BTreeMap;

use crate::config::AlbumKey;
use crate::errors::StatsError;
use crate::types::Track;

pub const TOP_TRACKS: usize = 20;

/// Everything the report prints for one artist
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistSummary {
    pub most_popular_album: String,
    pub average_popularity: f64,
    /// Ranking size asked for; top_tracks may be shorter
    pub top_n: usize,
    pub top_tracks: Vec<Track>
}

#[derive(Debug, Clone)]
pub struct CatalogAnalyzer {
    tracks: Vec<Track>,
    album_key: AlbumKey
}

#[cfg(test)]
impl CatalogAnalyzer {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self::with_album_key(tracks, AlbumKey::default())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

impl CatalogAnalyzer {
    pub fn with_album_key(tracks: Vec<Track>, album_key: AlbumKey) -> Self {
        Self { tracks, album_key }
    }

    fn ensure_tracks(&self, what: &str) -> Result<(), StatsError> {
        if self.tracks.is_empty() {
            return Err(StatsError::EmptyInput(format!("{what} over an empty catalog")));
        }
        Ok(())
    }

    fn group_key<'a>(&self, track: &'a Track) -> &'a str {
        match self.album_key {
            AlbumKey::TrackTitle => &track.name,
            AlbumKey::AlbumTitle => &track.album
        }
    }

    /// Popularity summed per group key
    pub fn popularity_by_group(&self) -> BTreeMap<&str, u64> {
        let mut sums = BTreeMap::new();
        for track in &self.tracks {
            *sums.entry(self.group_key(track)).or_insert(0) += u64::from(track.popularity);
        }
        sums
    }

    /// Group key with the highest summed popularity. Ties go to the
    /// lexicographically smallest key.
    pub fn most_popular_album(&self) -> Result<String, StatsError> {
        self.ensure_tracks("most popular album")?;

        let mut best: Option<(&str, u64)> = None;
        for (key, sum) in self.popularity_by_group() {
            match best {
                Some((_, top)) if sum <= top => {},
                _ => best = Some((key, sum))
            }
        }

        best.map(|(key, _)| key.to_string())
            .ok_or_else(|| StatsError::EmptyInput("no groups to rank".to_string()))
    }

    pub fn average_popularity(&self) -> Result<f64, StatsError> {
        self.ensure_tracks("average popularity")?;

        let sum: u64 = self.tracks.iter().map(|t| u64::from(t.popularity)).sum();
        Ok(sum as f64 / self.tracks.len() as f64)
    }

    /// At most n tracks, most popular first. Equal popularity keeps
    /// catalog order.
    pub fn top_by_popularity(&self, n: usize) -> Vec<Track> {
        let mut ranked: Vec<&Track> = self.tracks.iter().collect();
        ranked.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        ranked.into_iter().take(n).cloned().collect()
    }

    pub fn top20_by_popularity(&self) -> Vec<Track> {
        self.top_by_popularity(TOP_TRACKS)
    }

    pub fn summary(&self, top_n: usize) -> Result<ArtistSummary, StatsError> {
        let top_tracks = if top_n == TOP_TRACKS {
            self.top20_by_popularity()
        } else {
            self.top_by_popularity(top_n)
        };

        Ok(ArtistSummary {
            most_popular_album: self.most_popular_album()?,
            average_popularity: self.average_popularity()?,
            top_n,
            top_tracks
        })
    }
}
