use anyhow::Result;
use clap::Parser;

use brasil_paralelo::Service;

use super::Globals;

#[derive(Parser, Debug)]
pub struct SearchCommand {
    /// Search terms
    pub query: String,
}

impl SearchCommand {
    pub async fn run(self, globals: &Globals) -> Result<()> {
        let service = globals.connect(None, false).await?;
        let results = service.search(&self.query).await?;

        if globals.json {
            return globals.print_json(&results);
        }

        if results.is_empty() {
            println!("No results for '{}'", self.query);
            return Ok(());
        }

        for (i, result) in results.iter().enumerate() {
            println!(
                "  {:>3}. {} (id: {}, type: {})",
                i + 1,
                result.title,
                result.id,
                result.kind.as_deref().unwrap_or("?")
            );
        }

        Ok(())
    }
}
