use hex_literal::hex;

/**
    `schemeIdUri` of the generic MPEG Common Encryption descriptor, the one
    that carries `cenc:default_KID`.
*/
pub const MP4_PROTECTION_SCHEME: &str = "urn:mpeg:dash:mp4protection:2011";

/**
    `schemeIdUri` of the Widevine descriptor, the one whose `cenc:pssh` child
    is handed to the license exchange.
*/
pub const WIDEVINE_SCHEME: &str = "urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed";

/**
    Widevine DRM System ID: `edef8ba9-79d6-4ace-a3c8-27dcd51d21ed`
*/
pub const WIDEVINE_SYSTEM_ID: [u8; 16] = hex!(
    "edef8ba9"
    "79d6"
    "4ace"
    "a3c8"
    "27dcd51d21ed"
);

/**
    PlayReady DRM System ID: `9a04f079-9840-4286-ab92-e65be0885f95`
*/
pub const PLAYREADY_SYSTEM_ID: [u8; 16] = hex!(
    "9a04f079"
    "9840"
    "4286"
    "ab92"
    "e65be0885f95"
);

/**
    Apple FairPlay DRM System ID: `94ce86fb-07ff-4f43-adb8-93d2fa968ca2`
*/
pub const FAIRPLAY_SYSTEM_ID: [u8; 16] = hex!(
    "94ce86fb"
    "07ff"
    "4f43"
    "adb8"
    "93d2fa968ca2"
);

/**
    W3C ClearKey System ID: `1077efec-c0b2-4d02-ace3-3c1e52e2fb4b`
*/
pub const CLEARKEY_SYSTEM_ID: [u8; 16] = hex!(
    "1077efec"
    "c0b2"
    "4d02"
    "ace3"
    "3c1e52e2fb4b"
);
