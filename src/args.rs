use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "takeout-dates",
    version,
    about = "Backfill capture dates on exported media from their JSON sidecars"
)]
pub struct Args {
    /// Takeout folder to scan (prompted for when omitted)
    pub root: Option<String>,

    /// Leave the file system modification time untouched
    #[arg(long)]
    pub keep_file_time: bool,

    /// exiftool binary to invoke
    #[arg(long, default_value = "exiftool")]
    pub exiftool: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Root folder from the command line or stdin, tilde-expanded and checked
    pub fn resolve_root(&self) -> Result<PathBuf> {
        let raw = match &self.root {
            Some(root) => root.clone(),
            None => prompt_root()?,
        };
        validate_root(expand_tilde(&raw))
    }
}

fn prompt_root() -> Result<String> {
    print!("Enter path to Takeout folder: ");
    io::stdout().flush().context("Failed to write prompt")?;

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read folder path from stdin")?;
    Ok(input)
}

/// Replace a leading `~` with the home directory
pub fn expand_tilde(input: &str) -> PathBuf {
    let input = input.trim();

    if let Some(home) = dirs::home_dir() {
        if input == "~" {
            return home;
        }
        if let Some(rest) = input.strip_prefix("~/") {
            return home.join(rest);
        }
    }

    PathBuf::from(input)
}

pub fn validate_root(root: PathBuf) -> Result<PathBuf> {
    if !root.exists() {
        bail!("Path does not exist: {}", root.display());
    }
    Ok(root)
}
