use thiserror::Error;

/**
    Errors from pulling protection metadata out of a DASH manifest.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("failed to parse MPD XML: {0}")]
    Parse(String),

    #[error("no default_KID found in MPD manifest: {manifest_url}")]
    MissingKid { manifest_url: String },

    #[error("no PSSH found in MPD manifest: {manifest_url}")]
    MissingPssh { manifest_url: String },

    #[error("invalid default_KID '{0}'")]
    InvalidKid(String),
}

/**
    Errors from decoding a PSSH box header.
*/
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PsshError {
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    #[error("malformed PSSH box: {0}")]
    Malformed(String),
}
