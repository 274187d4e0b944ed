use std::fmt;

use serde::{Deserialize, Serialize};

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchResult {
    #[serde(rename = "name")]
    pub title: String,
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: String,
    pub name: String,
    pub year: Option<u16>,
    /// Duration in seconds, as reported by the API.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Season {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub id: String,
    pub title: String,
    pub seasons: Vec<Season>,
}

/**
    Result of resolving a title: one or more movies, or a series.
*/
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Titles {
    Movies { movies: Vec<Movie> },
    Series(Series),
}

impl Titles {
    pub fn name(&self) -> &str {
        match self {
            Titles::Movies { movies } => movies.first().map(|m| m.name.as_str()).unwrap_or(""),
            Titles::Series(series) => &series.title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
            TrackKind::Subtitle => "subtitle",
        })
    }
}

/**
    Everything needed to request a Widevine license for a track. The
    challenge itself is produced by the caller's CDM.
*/
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidevineDrm {
    /// Base64 PSSH box from the manifest.
    pub pssh: String,
    /// `default_KID` from the manifest.
    pub kid: String,
    pub license_url: String,
    pub content_id: String,
    /// Media id sent with the license query.
    pub media_id: String,
}

/// One DASH representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: String,
    pub kind: TrackKind,
    pub codecs: Option<String>,
    pub bandwidth: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub language: Option<String>,
    pub manifest_url: String,
    pub drm: Option<WidevineDrm>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    pub name: Option<String>,
    /// Start offset in seconds.
    pub start: f64,
}
