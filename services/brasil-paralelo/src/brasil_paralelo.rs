use std::path::PathBuf;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::Config;
use crate::cookies::{CookieJar, DEFAULT_COOKIES_PATH};
use crate::error::{Result, ServiceError};
use crate::manifest::parse_tracks;
use crate::service::Service;
use crate::title::TitleId;
use crate::transport::Transport;
use crate::types::{Chapter, Movie, SearchResult, Season, Series, Titles, Track, WidevineDrm};

pub const SERVICE_TAG: &str = "BRASIL_PARALELO";

const MEDIA_QUERY: &str = r#"
query ($media_id: String!, $slug: String!) {
  media(media_id: $media_id, playlistslug: $slug) {
    id
    name
    duration
    playlist {
      type { name }
      name
      slug
    }
  }
}
"#;

const SOURCE_QUERY: &str = r#"
query ($media_id: String!, $slug: String!) {
  media(media_id: $media_id, playlistslug: $slug) {
    source { id }
  }
}
"#;

const LICENSE_QUERY: &str = r#"
query ($drm_type: String!, $license_challenge: String!, $media_id: String!) {
  drm_license_v_2(drm_type: $drm_type, license_challenge: $license_challenge, media_id: $media_id) {
    ... on license {
      license
    }
    ... on error {
      error
      code
      message
    }
  }
}
"#;

/**
    Options the service is created with, mirroring the command line.
*/
#[derive(Debug, Clone)]
pub struct Options {
    /// Media id or media URL.
    pub title: Option<String>,
    /// Treat the title as a movie regardless of its playlist type.
    pub movie: bool,
    /// Client profile from the config (`client.<device>.headers`).
    pub device: String,
    /// Netscape cookie file; authentication fails without one.
    pub cookies: Option<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            title: None,
            movie: false,
            device: "web".to_string(),
            cookies: Some(PathBuf::from(DEFAULT_COOKIES_PATH)),
        }
    }
}

/**
    Brasil Paralelo: metadata and licenses over GraphQL, video as
    Widevine-protected DASH.
*/
pub struct BrasilParalelo {
    config: Config,
    transport: Transport,
    title: Option<TitleId>,
    movie: bool,
    cookies: Option<PathBuf>,
    /// Playlist slug learned from `get_titles`, reused by `get_tracks`.
    slug: Option<String>,
}

impl BrasilParalelo {
    pub fn new(config: Config, options: Options) -> Result<Self> {
        let transport = Transport::new(config.headers_for(&options.device)?)?;
        let title = options.title.as_deref().map(TitleId::parse).transpose()?;
        Ok(Self {
            config,
            transport,
            title,
            movie: options.movie,
            cookies: options.cookies,
            slug: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn resolve_title(&self, title_id: Option<&str>) -> Result<TitleId> {
        match title_id {
            Some(input) => TitleId::parse(input),
            None => self.title.clone().ok_or(ServiceError::NoTitle),
        }
    }

    fn slug_for(&self, title: &TitleId) -> String {
        self.slug
            .clone()
            .or_else(|| title.slug.clone())
            .unwrap_or_else(|| self.config.default_slug.clone())
    }

    /**
        GraphQL `media` query; returns the full payload and the `media` object.
    */
    async fn query_media(
        &self,
        query: &str,
        title: &TitleId,
        slug: &str,
        context: &'static str,
    ) -> Result<(Value, Value)> {
        let variables = json!({
            "media_id": title.id,
            "slug": slug,
        });
        let payload = self
            .transport
            .graphql(&self.config.endpoints.metadata, query, &variables, context)
            .await?;

        let media = payload
            .pointer("/data/media")
            .filter(|m| !m.is_null())
            .cloned()
            .ok_or_else(|| ServiceError::MissingField {
                field: "data.media",
                payload: payload.clone(),
            })?;

        Ok((payload, media))
    }
}

#[async_trait]
impl Service for BrasilParalelo {
    fn name(&self) -> &'static str {
        SERVICE_TAG
    }

    async fn authenticate(&mut self) -> Result<()> {
        let Some(path) = &self.cookies else {
            return Err(ServiceError::Auth(DEFAULT_COOKIES_PATH.to_string()));
        };
        let jar = CookieJar::load(path)?;
        info!(count = jar.len(), path = %path.display(), "loaded cookies");
        self.transport.add_cookies(&jar);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = self.config.search_url();
        let payload = self.transport.get_json(&url, &[("q", query)]).await?;

        let Some(results) = payload.get("results").filter(|r| !r.is_null()) else {
            return Ok(Vec::new());
        };

        serde_json::from_value(results.clone()).map_err(|_| ServiceError::MissingField {
            field: "results[].name/id",
            payload,
        })
    }

    async fn get_titles(&mut self, title_id: Option<&str>) -> Result<Titles> {
        let title = self.resolve_title(title_id)?;
        let slug = title
            .slug
            .clone()
            .unwrap_or_else(|| self.config.default_slug.clone());

        let (payload, media) = self
            .query_media(MEDIA_QUERY, &title, &slug, "title metadata")
            .await?;

        let missing = |field| ServiceError::MissingField {
            field,
            payload: payload.clone(),
        };

        let name = media
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| missing("media.name"))?
            .to_string();
        let playlist_slug = media
            .pointer("/playlist/slug")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| missing("media.playlist.slug"))?
            .to_string();
        let content_type = media.pointer("/playlist/type/name").and_then(Value::as_str);
        let duration = media.get("duration").and_then(Value::as_f64);

        debug!(slug = %playlist_slug, ?content_type, "resolved title metadata");

        let titles = if self.movie || content_type == Some("movie") {
            Titles::Movies {
                movies: vec![Movie {
                    id: title.id.clone(),
                    name,
                    year: None,
                    duration,
                }],
            }
        } else {
            let season = media
                .pointer("/playlist/name")
                .and_then(Value::as_str)
                .map(str::to_string);
            Titles::Series(Series {
                id: title.id.clone(),
                title: name,
                seasons: vec![Season { name: season }],
            })
        };

        self.slug = Some(playlist_slug);
        Ok(titles)
    }

    async fn get_tracks(&mut self, title_id: Option<&str>) -> Result<Vec<Track>> {
        let title = self.resolve_title(title_id)?;
        let slug = self.slug_for(&title);

        let (payload, media) = self
            .query_media(SOURCE_QUERY, &title, &slug, "tracks")
            .await?;

        let content_id = match media.pointer("/source/id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => {
                return Err(ServiceError::MissingField {
                    field: "media.source.id",
                    payload,
                });
            }
        };

        let stream_id = self.config.streams.resolve(&title.id);
        let manifest_url = self.config.manifest_url(&content_id, stream_id);
        info!(%manifest_url, "fetching MPD manifest");

        let xml = self.transport.get_text(&manifest_url).await?;
        debug!(bytes = xml.len(), "MPD manifest content:\n{xml}");

        let protection = drm_mpd::extract(&manifest_url, &xml)?;
        debug!(kid = %protection.kid, pssh = %protection.pssh, "extracted protection metadata");

        let mut tracks = parse_tracks(&manifest_url, &xml)?;
        let first = tracks.first_mut().ok_or_else(|| ServiceError::NoTracks {
            manifest_url: manifest_url.clone(),
        })?;
        first.drm = Some(WidevineDrm {
            pssh: protection.pssh,
            kid: protection.kid,
            license_url: self.config.license_url().to_string(),
            content_id,
            media_id: title.id,
        });

        Ok(tracks)
    }

    async fn get_widevine_license(&self, challenge: &[u8], track: &Track) -> Result<Vec<u8>> {
        let (license_url, media_id) = match &track.drm {
            Some(drm) => (drm.license_url.clone(), drm.media_id.clone()),
            None => (
                self.config.license_url().to_string(),
                self.resolve_title(None)?.id,
            ),
        };

        let variables = json!({
            "drm_type": "widevine",
            "license_challenge": STANDARD.encode(challenge),
            "media_id": media_id,
        });
        let payload = self
            .transport
            .graphql(&license_url, LICENSE_QUERY, &variables, "Widevine license")
            .await?;

        let result = payload
            .pointer("/data/drm_license_v_2")
            .filter(|r| !r.is_null());

        if let Some(license) = result.and_then(|r| r.get("license")).and_then(Value::as_str) {
            return STANDARD
                .decode(license)
                .map_err(|e| ServiceError::License(format!("license is not valid base64: {e}")));
        }

        let message = result
            .and_then(|r| r.get("message").or_else(|| r.get("error")))
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        Err(ServiceError::License(message.to_string()))
    }

    async fn get_chapters(&self, title_id: Option<&str>) -> Result<Vec<Chapter>> {
        debug!(?title_id, "chapters are not provided by the API");
        Ok(Vec::new())
    }
}
