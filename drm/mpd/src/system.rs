use core::fmt;

use crate::constants::{
    CLEARKEY_SYSTEM_ID, FAIRPLAY_SYSTEM_ID, PLAYREADY_SYSTEM_ID, WIDEVINE_SYSTEM_ID,
};

/**
    DRM system a PSSH box or `ContentProtection` descriptor belongs to.

    Known systems are matched by their DASH-IF registered UUIDs, anything
    else is kept verbatim in `Unknown`.

    Reference: <https://dashif.org/identifiers/content_protection/>
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemId {
    Widevine,
    PlayReady,
    FairPlay,
    ClearKey,
    Unknown([u8; 16]),
}

impl SystemId {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        match bytes {
            WIDEVINE_SYSTEM_ID => Self::Widevine,
            PLAYREADY_SYSTEM_ID => Self::PlayReady,
            FAIRPLAY_SYSTEM_ID => Self::FairPlay,
            CLEARKEY_SYSTEM_ID => Self::ClearKey,
            other => Self::Unknown(other),
        }
    }

    /**
        Resolve a `urn:uuid:...` scheme URI, as found on `ContentProtection`
        elements. Returns `None` for schemes that do not name a system UUID,
        such as `urn:mpeg:dash:mp4protection:2011`.
    */
    pub fn from_scheme_uri(uri: &str) -> Option<Self> {
        let uuid = uri.strip_prefix("urn:uuid:")?;
        let hex: String = uuid.chars().filter(|c| *c != '-').collect();
        let decoded = hex::decode(hex.to_ascii_lowercase()).ok()?;
        let bytes: [u8; 16] = decoded.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    pub fn to_bytes(self) -> [u8; 16] {
        match self {
            Self::Widevine => WIDEVINE_SYSTEM_ID,
            Self::PlayReady => PLAYREADY_SYSTEM_ID,
            Self::FairPlay => FAIRPLAY_SYSTEM_ID,
            Self::ClearKey => CLEARKEY_SYSTEM_ID,
            Self::Unknown(bytes) => bytes,
        }
    }

    /**
        Hyphenated lowercase UUID form, e.g. `edef8ba9-79d6-4ace-a3c8-27dcd51d21ed`.
    */
    pub fn to_uuid_string(self) -> String {
        format_uuid(&self.to_bytes())
    }

    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Widevine => f.write_str("Widevine"),
            Self::PlayReady => f.write_str("PlayReady"),
            Self::FairPlay => f.write_str("FairPlay"),
            Self::ClearKey => f.write_str("ClearKey"),
            Self::Unknown(bytes) => f.write_str(&format_uuid(bytes)),
        }
    }
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let h = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &h[0..8],
        &h[8..12],
        &h[12..16],
        &h[16..20],
        &h[20..32]
    )
}
