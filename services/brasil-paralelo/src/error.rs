use thiserror::Error;

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

/**
    Errors surfaced by the service. Nothing is retried or recovered locally,
    every variant carries enough context (URL or raw API payload) to be shown
    to the user as-is.
*/
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cookies are required, export them from the browser to {0}")]
    Auth(String),

    #[error("failed to load cookies from {path}: {reason}")]
    Cookies { path: String, reason: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("invalid title '{0}', expected a 24 character media id or a media URL")]
    InvalidTitle(String),

    #[error("no title id given")]
    NoTitle,

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API returned errors for {context}: {payload}")]
    Api {
        context: &'static str,
        payload: serde_json::Value,
    },

    #[error("'{field}' missing from API response: {payload}")]
    MissingField {
        field: &'static str,
        payload: serde_json::Value,
    },

    #[error(transparent)]
    Manifest(#[from] drm_mpd::ExtractError),

    #[error("no playable tracks in MPD manifest: {manifest_url}")]
    NoTracks { manifest_url: String },

    #[error("failed to obtain Widevine license: {0}")]
    License(String),
}

impl ServiceError {
    pub(crate) fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }
}
