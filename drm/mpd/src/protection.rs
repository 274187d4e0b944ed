use sxd_document::dom::{ChildOfElement, Element};
use tracing::{debug, warn};

use crate::constants::{MP4_PROTECTION_SCHEME, WIDEVINE_SCHEME};
use crate::error::ExtractError;
use crate::pssh::PsshHeader;
use crate::system::SystemId;
use crate::xml::{parse_document, select_elements};

const CONTENT_PROTECTION_XPATH: &str = "//*[local-name()='ContentProtection']";

/**
    Which descriptor the PSSH was taken from.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsshOrigin {
    /// A `ContentProtection` with the Widevine scheme URI.
    Widevine,
    /// The first `ContentProtection` of any scheme carrying a `pssh` child.
    Fallback,
}

/**
    Key id and protection header extracted from a DASH manifest.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protection {
    /**
        `default_KID` exactly as written in the manifest, usually a
        hyphenated UUID.
    */
    pub kid: String,
    /**
        Base64-encoded PSSH box.
    */
    pub pssh: String,
    pub pssh_origin: PsshOrigin,
}

impl Protection {
    /**
        The key id as 32 lowercase hex characters.
    */
    pub fn kid_hex(&self) -> String {
        self.kid.replace('-', "").to_ascii_lowercase()
    }

    pub fn kid_bytes(&self) -> Result<[u8; 16], ExtractError> {
        let bytes =
            hex::decode(self.kid_hex()).map_err(|_| ExtractError::InvalidKid(self.kid.clone()))?;
        bytes
            .try_into()
            .map_err(|_| ExtractError::InvalidKid(self.kid.clone()))
    }
}

/**
    Extract the default key id and the Widevine PSSH from MPD text.

    The key id comes from the first `ContentProtection` (document order) whose
    `schemeIdUri` is the mp4protection scheme. The PSSH comes from the first
    Widevine `ContentProtection` with a non-empty `pssh` child, falling back to
    the first `ContentProtection` of any scheme that has one. Both must be
    present, and the PSSH is only searched for once a key id was found.

    `manifest_url` is only used to label errors.
*/
pub fn extract(manifest_url: &str, xml: &str) -> Result<Protection, ExtractError> {
    let package = parse_document(xml)?;
    let document = package.as_document();
    let elements = select_elements(&document, CONTENT_PROTECTION_XPATH)?;

    let kid = elements
        .iter()
        .filter(|cp| cp.attribute_value("schemeIdUri") == Some(MP4_PROTECTION_SCHEME))
        .find_map(|cp| default_kid(*cp))
        .ok_or_else(|| ExtractError::MissingKid {
            manifest_url: manifest_url.to_string(),
        })?;
    debug!(%kid, "found default_KID in mp4protection descriptor");

    let widevine = elements
        .iter()
        .filter(|cp| cp.attribute_value("schemeIdUri") == Some(WIDEVINE_SCHEME))
        .find_map(|cp| pssh_child(*cp));

    let (pssh, pssh_origin) = match widevine {
        Some(pssh) => {
            debug!(%pssh, "found PSSH in Widevine descriptor");
            (pssh, PsshOrigin::Widevine)
        }
        None => {
            let pssh = elements
                .iter()
                .find_map(|cp| pssh_child(*cp))
                .ok_or_else(|| ExtractError::MissingPssh {
                    manifest_url: manifest_url.to_string(),
                })?;
            match PsshHeader::from_base64(&pssh) {
                Ok(header) if !header.is_widevine() => warn!(
                    system = %header.system_id,
                    "no Widevine descriptor in manifest, using PSSH of another system"
                ),
                Ok(_) => debug!(%pssh, "found PSSH in fallback descriptor"),
                Err(e) => warn!(error = %e, "fallback PSSH does not decode as a PSSH box"),
            }
            (pssh, PsshOrigin::Fallback)
        }
    };

    Ok(Protection {
        kid,
        pssh,
        pssh_origin,
    })
}

/**
    One `ContentProtection` element, as listed by [`descriptors`].
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub scheme_id_uri: Option<String>,
    pub system: Option<SystemId>,
    pub default_kid: Option<String>,
    pub pssh: Option<String>,
}

/**
    List every `ContentProtection` element in document order.
*/
pub fn descriptors(xml: &str) -> Result<Vec<Descriptor>, ExtractError> {
    let package = parse_document(xml)?;
    let document = package.as_document();

    let list = select_elements(&document, CONTENT_PROTECTION_XPATH)?
        .into_iter()
        .map(|cp| {
            let scheme_id_uri = cp.attribute_value("schemeIdUri").map(str::to_string);
            Descriptor {
                system: scheme_id_uri.as_deref().and_then(SystemId::from_scheme_uri),
                scheme_id_uri,
                default_kid: default_kid(cp),
                pssh: pssh_child(cp),
            }
        })
        .collect();

    Ok(list)
}

fn default_kid(element: Element) -> Option<String> {
    element
        .attributes()
        .into_iter()
        .find(|attr| attr.name().local_part() == "default_KID")
        .map(|attr| attr.value().trim().to_string())
        .filter(|kid| !kid.is_empty())
}

/// Text of the first `pssh` child, if that child is non-empty.
fn pssh_child(element: Element) -> Option<String> {
    let pssh = element.children().into_iter().find_map(|child| match child {
        ChildOfElement::Element(el) if el.name().local_part() == "pssh" => Some(el),
        _ => None,
    })?;
    let text = element_text(pssh);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn element_text(element: Element) -> String {
    element
        .children()
        .into_iter()
        .filter_map(|child| match child {
            ChildOfElement::Text(text) => Some(text.text().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PLAYREADY_SYSTEM_ID, WIDEVINE_SYSTEM_ID};
    use crate::pssh::tests::build_pssh_base64;

    const URL: &str = "https://stream.example.com/abc/def/mpd/stream.mpd";
    const KID: &str = "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";

    fn mpd(protections: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:cenc="urn:mpeg:cenc:2013" type="static">
  <Period id="0">
    <AdaptationSet contentType="video" mimeType="video/mp4">
      {protections}
      <Representation id="v1" bandwidth="1000000" codecs="avc1.64001f" width="1280" height="720"/>
    </AdaptationSet>
  </Period>
</MPD>"#
        )
    }

    fn mp4protection(kid: &str) -> String {
        format!(
            r#"<ContentProtection schemeIdUri="urn:mpeg:dash:mp4protection:2011" value="cenc" cenc:default_KID="{kid}"/>"#
        )
    }

    fn scheme_with_pssh(scheme: &str, pssh: &str) -> String {
        format!(
            r#"<ContentProtection schemeIdUri="{scheme}"><cenc:pssh>{pssh}</cenc:pssh></ContentProtection>"#
        )
    }

    #[test]
    fn kid_and_widevine_pssh() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            "{}{}",
            mp4protection(KID),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.kid, KID);
        assert_eq!(protection.pssh, wv);
        assert_eq!(protection.pssh_origin, PsshOrigin::Widevine);
    }

    #[test]
    fn widevine_preferred_over_earlier_descriptor() {
        let pr = build_pssh_base64(PLAYREADY_SYSTEM_ID, b"playready");
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            "{}{}{}",
            mp4protection(KID),
            scheme_with_pssh("urn:uuid:9a04f079-9840-4286-ab92-e65be0885f95", &pr),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.pssh, wv);
    }

    #[test]
    fn falls_back_to_any_descriptor_with_pssh() {
        let pr = build_pssh_base64(PLAYREADY_SYSTEM_ID, b"playready");
        let xml = mpd(&format!(
            "{}{}",
            mp4protection(KID),
            scheme_with_pssh("urn:uuid:9a04f079-9840-4286-ab92-e65be0885f95", &pr)
        ));
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.kid, KID);
        assert_eq!(protection.pssh, pr);
        assert_eq!(protection.pssh_origin, PsshOrigin::Fallback);
    }

    #[test]
    fn empty_widevine_pssh_falls_back() {
        let xml = mpd(&format!(
            "{}{}{}",
            mp4protection(KID),
            scheme_with_pssh(WIDEVINE_SCHEME, "   "),
            scheme_with_pssh("urn:uuid:00000000-0000-0000-0000-000000000000", "AAAA")
        ));
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.pssh, "AAAA");
        assert_eq!(protection.pssh_origin, PsshOrigin::Fallback);
    }

    #[test]
    fn only_first_pssh_child_counts() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let pr = build_pssh_base64(PLAYREADY_SYSTEM_ID, b"playready");
        let xml = mpd(&format!(
            r#"{}<ContentProtection schemeIdUri="{WIDEVINE_SCHEME}"><cenc:pssh/><cenc:pssh>{wv}</cenc:pssh></ContentProtection>{}"#,
            mp4protection(KID),
            scheme_with_pssh("urn:uuid:9a04f079-9840-4286-ab92-e65be0885f95", &pr)
        ));
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.pssh, pr);
        assert_eq!(protection.pssh_origin, PsshOrigin::Fallback);

        let listed = descriptors(&xml).unwrap();
        assert_eq!(listed[1].pssh, None);
    }

    #[test]
    fn missing_kid_fails_before_pssh_search() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&scheme_with_pssh(WIDEVINE_SCHEME, &wv));
        let err = extract(URL, &xml).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingKid {
                manifest_url: URL.into()
            }
        );
    }

    #[test]
    fn empty_kid_counts_as_missing() {
        let xml = mpd(&mp4protection(""));
        let err = extract(URL, &xml).unwrap_err();
        assert!(matches!(err, ExtractError::MissingKid { .. }));
    }

    #[test]
    fn kid_without_any_pssh_fails() {
        let xml = mpd(&format!(
            "{}{}",
            mp4protection(KID),
            r#"<ContentProtection schemeIdUri="urn:uuid:edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"/>"#
        ));
        let err = extract(URL, &xml).unwrap_err();
        assert_eq!(
            err,
            ExtractError::MissingPssh {
                manifest_url: URL.into()
            }
        );
        assert!(err.to_string().contains(URL));
    }

    #[test]
    fn scheme_match_is_case_sensitive() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            r#"<ContentProtection schemeIdUri="URN:MPEG:DASH:MP4PROTECTION:2011" cenc:default_KID="{KID}"/>{}"#,
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        let err = extract(URL, &xml).unwrap_err();
        assert!(matches!(err, ExtractError::MissingKid { .. }));
    }

    #[test]
    fn first_kid_in_document_order_wins() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            "{}{}{}",
            mp4protection(KID),
            mp4protection("ffffffff-ffff-ffff-ffff-ffffffffffff"),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        assert_eq!(extract(URL, &xml).unwrap().kid, KID);
    }

    #[test]
    fn descriptors_found_at_any_depth() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = format!(
            r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:cenc="urn:mpeg:cenc:2013">
  <Period>
    <AdaptationSet>
      <Representation id="a">{}</Representation>
    </AdaptationSet>
    <AdaptationSet>{}</AdaptationSet>
  </Period>
</MPD>"#,
            mp4protection(KID),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        );
        let protection = extract(URL, &xml).unwrap();
        assert_eq!(protection.kid, KID);
        assert_eq!(protection.pssh, wv);
    }

    #[test]
    fn malformed_xml_is_parse_error() {
        let err = extract(URL, "<MPD><Period></MPD>").unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn extraction_is_idempotent() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            "{}{}",
            mp4protection(KID),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        assert_eq!(extract(URL, &xml).unwrap(), extract(URL, &xml).unwrap());
    }

    #[test]
    fn kid_helpers() {
        let protection = Protection {
            kid: "0F1E2D3C-4B5A-6978-8796-A5B4C3D2E1F0".into(),
            pssh: String::new(),
            pssh_origin: PsshOrigin::Widevine,
        };
        assert_eq!(protection.kid_hex(), "0f1e2d3c4b5a69788796a5b4c3d2e1f0");
        assert_eq!(
            protection.kid_bytes().unwrap(),
            hex_literal::hex!("0f1e2d3c4b5a69788796a5b4c3d2e1f0")
        );

        let bad = Protection {
            kid: "xyz".into(),
            ..protection
        };
        assert!(matches!(bad.kid_bytes(), Err(ExtractError::InvalidKid(_))));
    }

    #[test]
    fn lists_descriptors_in_order() {
        let wv = build_pssh_base64(WIDEVINE_SYSTEM_ID, b"widevine");
        let xml = mpd(&format!(
            "{}{}",
            mp4protection(KID),
            scheme_with_pssh(WIDEVINE_SCHEME, &wv)
        ));
        let list = descriptors(&xml).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].default_kid.as_deref(), Some(KID));
        assert_eq!(list[0].system, None);
        assert_eq!(list[1].system, Some(SystemId::Widevine));
        assert_eq!(list[1].pssh.as_deref(), Some(wv.as_str()));
    }
}
