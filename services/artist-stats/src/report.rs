//!
//! src/report.rs  Andrew Belles  Oct 19th, 2026
//!
//! Plain-text rendering of an artist summary
//!

use std::io::Write;

use crate::analyzer::ArtistSummary;
use crate::errors::StatsError;

pub fn write_report<W: Write>(out: &mut W, summary: &ArtistSummary) -> Result<(), StatsError> {
    writeln!(out, "Most popular album is {}", summary.most_popular_album)?;
    writeln!(out, "Average song popularity {:.2}", summary.average_popularity)?;
    writeln!(out, "Top{} song by popularity:", summary.top_n)?;
    for (rank, track) in summary.top_tracks.iter().enumerate() {
        writeln!(out, "{}. {}", rank + 1, track)?;
    }
    out.flush()?;
    Ok(())
}
