use drm_mpd::{ExtractError, parse_document, select_elements};
use sxd_document::dom::{Element, ParentOfChild};

use crate::types::{Track, TrackKind};

const REPRESENTATION_XPATH: &str = "//*[local-name()='Representation']";

/**
    List the representations of an MPD as tracks, in document order.

    Attributes missing on a `Representation` are inherited from its
    `AdaptationSet`. Representations whose kind cannot be told are skipped.
*/
pub fn parse_tracks(manifest_url: &str, xml: &str) -> Result<Vec<Track>, ExtractError> {
    let package = parse_document(xml)?;
    let document = package.as_document();

    let tracks = select_elements(&document, REPRESENTATION_XPATH)?
        .into_iter()
        .filter_map(|rep| representation_to_track(manifest_url, rep))
        .collect();

    Ok(tracks)
}

fn representation_to_track(manifest_url: &str, rep: Element) -> Option<Track> {
    let set = match rep.parent() {
        Some(ParentOfChild::Element(parent)) if parent.name().local_part() == "AdaptationSet" => {
            Some(parent)
        }
        _ => None,
    };
    let attr = |name: &str| -> Option<String> {
        rep.attribute_value(name)
            .or_else(|| set.and_then(|s| s.attribute_value(name)))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let codecs = attr("codecs");
    let kind = track_kind(
        attr("contentType").as_deref(),
        attr("mimeType").as_deref(),
        codecs.as_deref(),
    )?;

    Some(Track {
        id: attr("id").unwrap_or_default(),
        kind,
        codecs,
        bandwidth: attr("bandwidth").and_then(|v| v.parse().ok()),
        width: attr("width").and_then(|v| v.parse().ok()),
        height: attr("height").and_then(|v| v.parse().ok()),
        language: attr("lang"),
        manifest_url: manifest_url.to_string(),
        drm: None,
    })
}

fn track_kind(
    content_type: Option<&str>,
    mime_type: Option<&str>,
    codecs: Option<&str>,
) -> Option<TrackKind> {
    match content_type {
        Some("video") => return Some(TrackKind::Video),
        Some("audio") => return Some(TrackKind::Audio),
        Some("text") => return Some(TrackKind::Subtitle),
        _ => {}
    }

    if let Some(codecs) = codecs
        && (codecs.starts_with("stpp") || codecs.starts_with("wvtt"))
    {
        return Some(TrackKind::Subtitle);
    }

    let mime = mime_type?;
    if mime.starts_with("video/") {
        Some(TrackKind::Video)
    } else if mime.starts_with("audio/") {
        Some(TrackKind::Audio)
    } else if mime.starts_with("text/") || mime == "application/ttml+xml" {
        Some(TrackKind::Subtitle)
    } else {
        None
    }
}
