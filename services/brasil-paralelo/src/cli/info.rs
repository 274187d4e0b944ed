use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use brasil_paralelo::{Chapter, Service, Titles, Track};

use super::Globals;

#[derive(Parser, Debug)]
pub struct InfoCommand {
    /// Media id or media URL
    pub title: String,

    /// Treat the title as a movie
    #[arg(short, long)]
    pub movie: bool,
}

#[derive(Serialize)]
struct InfoOutput {
    titles: Titles,
    tracks: Vec<Track>,
    chapters: Vec<Chapter>,
}

impl InfoCommand {
    pub async fn run(self, globals: &Globals) -> Result<()> {
        let mut service = globals.connect(Some(&self.title), self.movie).await?;

        let titles = service.get_titles(None).await?;
        let tracks = service.get_tracks(None).await?;
        let chapters = service.get_chapters(None).await?;

        if globals.json {
            return globals.print_json(&InfoOutput {
                titles,
                tracks,
                chapters,
            });
        }

        match &titles {
            Titles::Movies { movies } => {
                for movie in movies {
                    println!("Movie:  {} ({})", movie.name, movie.id);
                    if let Some(duration) = movie.duration {
                        println!("Length: {:.0}s", duration);
                    }
                }
            }
            Titles::Series(series) => {
                println!("Series: {} ({})", series.title, series.id);
                for season in &series.seasons {
                    println!("  Season: {}", season.name.as_deref().unwrap_or("(unnamed)"));
                }
            }
        }

        println!();
        println!("Tracks ({}):", tracks.len());
        for (i, track) in tracks.iter().enumerate() {
            let resolution = match (track.width, track.height) {
                (Some(w), Some(h)) => format!(" {w}x{h}"),
                _ => String::new(),
            };
            println!(
                "  {:>3}. [{}] {} {}{} {} kbps{}",
                i + 1,
                track.kind,
                track.id,
                track.codecs.as_deref().unwrap_or("?"),
                resolution,
                track.bandwidth.map(|b| b / 1000).unwrap_or(0),
                track
                    .language
                    .as_deref()
                    .map(|l| format!(" ({l})"))
                    .unwrap_or_default(),
            );
        }

        if let Some(drm) = tracks.iter().find_map(|t| t.drm.as_ref()) {
            println!();
            println!("Widevine:");
            println!("  KID:        {}", drm.kid);
            println!("  PSSH:       {}", drm.pssh);
            println!("  Content ID: {}", drm.content_id);
            println!("  License:    {}", drm.license_url);
        }

        if !chapters.is_empty() {
            println!();
            println!("Chapters ({}):", chapters.len());
            for chapter in &chapters {
                println!(
                    "  {:>8.1}s {}",
                    chapter.start,
                    chapter.name.as_deref().unwrap_or("")
                );
            }
        }

        Ok(())
    }
}
