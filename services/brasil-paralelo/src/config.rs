use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

const DEFAULT_CONFIG: &str = include_str!("../config.yaml");

/**
    Service configuration: endpoints, per-device request headers and the
    table used to resolve stream ids.
*/
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub base_url: String,
    pub stream_base: String,
    /// Playlist slug sent with metadata queries until a title's real slug is known.
    pub default_slug: String,
    pub endpoints: Endpoints,
    pub client: HashMap<String, ClientProfile>,
    pub streams: StreamTable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Endpoints {
    /// GraphQL endpoint for metadata and license queries.
    pub metadata: String,
    #[serde(default)]
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClientProfile {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/**
    Stream ids are not exposed by the metadata API, so they are looked up
    here: a per-title override first, then the default.
*/
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamTable {
    pub default: String,
    #[serde(default)]
    pub titles: HashMap<String, String>,
}

impl StreamTable {
    pub fn resolve(&self, title_id: &str) -> &str {
        self.titles
            .get(title_id)
            .map(String::as_str)
            .unwrap_or(&self.default)
    }
}

impl Config {
    /**
        Load config from `path`, or the built-in config when `None`.
    */
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    ServiceError::Config(format!("failed to read {}: {e}", path.display()))
                })?;
                Self::from_yaml(&content)
            }
            None => Self::from_yaml(DEFAULT_CONFIG),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ServiceError::Config(e.to_string()))
    }

    pub fn headers_for(&self, device: &str) -> Result<&HashMap<String, String>> {
        self.client
            .get(device)
            .map(|profile| &profile.headers)
            .ok_or_else(|| ServiceError::Config(format!("no client profile for device '{device}'")))
    }

    pub fn license_url(&self) -> &str {
        self.endpoints
            .license
            .as_deref()
            .unwrap_or(&self.endpoints.metadata)
    }

    pub fn search_url(&self) -> String {
        format!("{}/api/search", self.base_url.trim_end_matches('/'))
    }

    pub fn manifest_url(&self, content_id: &str, stream_id: &str) -> String {
        format!(
            "{}/{content_id}/{stream_id}/mpd/stream.mpd",
            self.stream_base.trim_end_matches('/')
        )
    }
}
