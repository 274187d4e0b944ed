//! Brasil Paralelo service adapter: title metadata and licenses over the
//! platform's GraphQL API, tracks and protection metadata from its DASH
//! manifests.

mod brasil_paralelo;
mod config;
mod cookies;
mod error;
mod manifest;
mod service;
mod title;
mod transport;
mod types;

pub use self::brasil_paralelo::{BrasilParalelo, Options, SERVICE_TAG};
pub use self::config::{ClientProfile, Config, Endpoints, StreamTable};
pub use self::cookies::{Cookie, CookieJar, DEFAULT_COOKIES_PATH};
pub use self::error::{Result, ServiceError};
pub use self::manifest::parse_tracks;
pub use self::service::Service;
pub use self::title::TitleId;
pub use self::types::{
    Chapter, Movie, SearchResult, Season, Series, Titles, Track, TrackKind, WidevineDrm,
};
