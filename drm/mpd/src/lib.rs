//! Protection metadata for DASH manifests: the default key id and the
//! Widevine PSSH a license exchange needs, plus just enough PSSH box
//! decoding to tell which DRM system a header belongs to.

mod constants;
mod error;
mod protection;
mod pssh;
mod system;
mod xml;

pub use self::constants::{
    CLEARKEY_SYSTEM_ID, FAIRPLAY_SYSTEM_ID, MP4_PROTECTION_SCHEME, PLAYREADY_SYSTEM_ID,
    WIDEVINE_SCHEME, WIDEVINE_SYSTEM_ID,
};
pub use self::error::{ExtractError, PsshError};
pub use self::protection::{Descriptor, Protection, PsshOrigin, descriptors, extract};
pub use self::pssh::PsshHeader;
pub use self::system::SystemId;
pub use self::xml::{parse_document, select_elements};
