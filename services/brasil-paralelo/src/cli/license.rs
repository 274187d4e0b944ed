use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use brasil_paralelo::Service;

use super::Globals;

#[derive(Parser, Debug)]
pub struct LicenseCommand {
    /// Media id or media URL
    pub title: String,

    /// File holding the raw license challenge produced by a CDM
    #[arg(long)]
    pub challenge: PathBuf,

    /// Where to write the raw license response
    #[arg(short, long)]
    pub output: PathBuf,
}

impl LicenseCommand {
    pub async fn run(self, globals: &Globals) -> Result<()> {
        let challenge = tokio::fs::read(&self.challenge)
            .await
            .with_context(|| format!("failed to read {}", self.challenge.display()))?;

        let mut service = globals.connect(Some(&self.title), false).await?;
        service.get_titles(None).await?;
        let tracks = service.get_tracks(None).await?;
        let track = tracks
            .iter()
            .find(|t| t.drm.is_some())
            .context("no protected track in manifest")?;

        let license = service.get_widevine_license(&challenge, track).await?;
        tokio::fs::write(&self.output, &license)
            .await
            .with_context(|| format!("failed to write {}", self.output.display()))?;

        println!(
            "Wrote {} byte license to {}",
            license.len(),
            self.output.display()
        );
        Ok(())
    }
}
