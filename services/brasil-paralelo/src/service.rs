use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Chapter, SearchResult, Titles, Track};

/**
    What a streaming service adapter provides to the downloader driving it.

    Calls are made in order (`authenticate`, `get_titles`, `get_tracks`,
    then `get_widevine_license` once per track needing a license), and
    `title_id` falls back to the title the service was created for.
*/
#[async_trait]
pub trait Service: Send + Sync {
    /// Service tag, e.g. `BRASIL_PARALELO`.
    fn name(&self) -> &'static str;

    async fn authenticate(&mut self) -> Result<()>;

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>>;

    async fn get_titles(&mut self, title_id: Option<&str>) -> Result<Titles>;

    async fn get_tracks(&mut self, title_id: Option<&str>) -> Result<Vec<Track>>;

    /**
        Exchange a CDM license challenge for a license. Both are opaque bytes.
    */
    async fn get_widevine_license(&self, challenge: &[u8], track: &Track) -> Result<Vec<u8>>;

    async fn get_chapters(&self, title_id: Option<&str>) -> Result<Vec<Chapter>>;
}
