use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, ServiceError};

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:https?://plataforma\.brasilparalelo\.com\.br/playlists/(?P<slug>[^/]+)/media/)?(?P<title_id>[0-9a-f]{24})$",
        )
        .expect("title regex is valid")
    })
}

/**
    A media id, optionally with the playlist slug taken from a media URL.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleId {
    pub id: String,
    pub slug: Option<String>,
}

impl TitleId {
    /**
        Accepts a bare 24 character hex media id or a full
        `https://plataforma.brasilparalelo.com.br/playlists/<slug>/media/<id>` URL.
    */
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let caps = title_re()
            .captures(input)
            .ok_or_else(|| ServiceError::InvalidTitle(input.to_string()))?;
        Ok(Self {
            id: caps["title_id"].to_string(),
            slug: caps.name("slug").map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
