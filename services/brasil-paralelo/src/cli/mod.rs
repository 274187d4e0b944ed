use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use brasil_paralelo::{BrasilParalelo, Config, DEFAULT_COOKIES_PATH, Options, Service};

mod info;
mod license;
mod protection;
mod search;

pub use info::InfoCommand;
pub use license::LicenseCommand;
pub use protection::ProtectionCommand;
pub use search::SearchCommand;

#[derive(Parser, Debug)]
#[command(name = "bp")]
#[command(about = "Brasil Paralelo titles, DASH tracks and Widevine licenses")]
pub struct Args {
    #[command(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Command,
}

/**
    Options shared by every subcommand.
*/
#[derive(clap::Args, Debug)]
pub struct Globals {
    /// Service config (YAML), the built-in config is used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Netscape cookie file exported from the browser
    #[arg(long, global = true, default_value = DEFAULT_COOKIES_PATH)]
    pub cookies: PathBuf,

    /// Client profile from the config
    #[arg(short, long, global = true, default_value = "web")]
    pub device: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a title and list its tracks
    Info(InfoCommand),
    /// Search the catalogue
    Search(SearchCommand),
    /// Exchange a CDM license challenge for a license
    License(LicenseCommand),
    /// Extract KID and PSSH from a local MPD file
    Protection(ProtectionCommand),
}

impl Args {
    pub async fn run(self) -> Result<()> {
        init_logging(self.globals.debug);

        match self.command {
            Command::Info(cmd) => cmd.run(&self.globals).await,
            Command::Search(cmd) => cmd.run(&self.globals).await,
            Command::License(cmd) => cmd.run(&self.globals).await,
            Command::Protection(cmd) => cmd.run(&self.globals),
        }
    }
}

impl Globals {
    /**
        Create and authenticate the service.
    */
    pub async fn connect(&self, title: Option<&str>, movie: bool) -> Result<BrasilParalelo> {
        let config = Config::load(self.config.as_deref()).context("failed to load config")?;
        let mut service = BrasilParalelo::new(
            config,
            Options {
                title: title.map(str::to_string),
                movie,
                device: self.device.clone(),
                cookies: Some(self.cookies.clone()),
            },
        )?;
        service.authenticate().await?;
        Ok(service)
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
