//!
//! src/types.rs  Andrew Belles  Oct 19th, 2026
//!
//! Identifier newtypes for Spotify entities and the enriched
//! track value that flows from the client into the analyzer
//!

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotifyArtistId(pub String);


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotifyAlbumId(pub String);


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotifyTrackId(pub String);


/// Artist resolved from a free-text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: SpotifyArtistId,
    pub name: String
}

/// Fully populated snapshot of one track. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub authors: Vec<String>,
    pub popularity: u32,
    pub album: String
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        authors: Vec<String>,
        popularity: u32,
        album: impl Into<String>
    ) -> Self {
        Self { name: name.into(), authors, popularity, album: album.into() }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}, album {}", self.authors.join(", "), self.name, self.album)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_renders_authors_title_and_album() {
        let track = Track::new(
            "Breathe Deeper",
            vec!["Tame Impala".to_string(), "Lil Yachty".to_string()],
            71,
            "The Slow Rush"
        );
        assert_eq!(
            track.to_string(),
            "Tame Impala, Lil Yachty - Breathe Deeper, album The Slow Rush"
        );
    }

    #[test]
    fn track_without_authors_still_renders() {
        let track = Track::new("Intro", vec![], 3, "Demo");
        assert_eq!(track.to_string(), " - Intro, album Demo");
    }
}
