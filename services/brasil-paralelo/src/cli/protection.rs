use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use drm_mpd::{PsshHeader, PsshOrigin};

use super::Globals;

#[derive(Parser, Debug)]
pub struct ProtectionCommand {
    /// Path to an MPD manifest
    pub path: PathBuf,
}

#[derive(Serialize)]
struct ProtectionOutput {
    kid: String,
    pssh: String,
    fallback: bool,
    system: Option<String>,
}

impl ProtectionCommand {
    pub fn run(self, globals: &Globals) -> Result<()> {
        let xml = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let label = self.path.display().to_string();

        let protection = drm_mpd::extract(&label, &xml)?;
        let header = PsshHeader::from_base64(&protection.pssh).ok();

        if globals.json {
            return globals.print_json(&ProtectionOutput {
                kid: protection.kid_hex(),
                pssh: protection.pssh.clone(),
                fallback: protection.pssh_origin == PsshOrigin::Fallback,
                system: header.as_ref().map(|h| h.system_id.to_string()),
            });
        }

        println!("KID:        {}", protection.kid);
        println!("KID (hex):  {}", protection.kid_hex());
        println!("PSSH:       {}", protection.pssh);
        if protection.pssh_origin == PsshOrigin::Fallback {
            println!("            (no Widevine descriptor, taken from another system)");
        }

        if let Some(header) = &header {
            println!();
            println!("Version:    {}", header.version);
            println!("System ID:  {} ({})", header.system_id, header.system_id.to_uuid_string());
            println!("Data Size:  {} bytes", header.data_len);
            if !header.key_ids.is_empty() {
                println!("Key IDs ({}):", header.key_ids.len());
                for kid in &header.key_ids {
                    println!("  {}", hex::encode(kid));
                }
            }
        }

        let descriptors = drm_mpd::descriptors(&xml)?;
        println!();
        println!("ContentProtection elements ({}):", descriptors.len());
        for d in &descriptors {
            let system = d
                .system
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} [{}]{}{}",
                d.scheme_id_uri.as_deref().unwrap_or("(no scheme)"),
                system,
                if d.default_kid.is_some() { " kid" } else { "" },
                if d.pssh.is_some() { " pssh" } else { "" },
            );
        }

        Ok(())
    }
}
