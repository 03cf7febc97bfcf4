use anyhow::{Context, Result};
use clap::Parser;
use fastdlis::dlis::encode::logged_well;
use std::{fs, path::PathBuf};
use tracing::info;

/// Write a small demonstration tree of well folders.
#[derive(Parser, Debug)]
#[command(name = "dlis-fixture", version)]
struct Args {
    dir: PathBuf,
}

fn main() -> Result<()> {
    fastdlis::init_logging();
    let Args { dir } = Args::parse();

    let first = dir.join("1-ABC-1-RJS");
    let second = dir.join("3-DEF-2-SPS");
    fs::create_dir_all(&first).with_context(|| format!("creating {}", first.display()))?;
    fs::create_dir_all(&second).with_context(|| format!("creating {}", second.display()))?;

    fs::write(first.join("main_runs.dlis"), logged_well("1-ABC-1-RJS", 4)?)?;
    fs::write(first.join("notes.txt"), "not a log\n")?;

    // cut short inside its last visible record
    let mut corrupted = logged_well("3-DEF-2-SPS", 1)?;
    corrupted.truncate(corrupted.len() - 3);
    fs::write(second.join("corrupted.DLIS"), corrupted)?;

    info!(dir = %dir.display(), "fixture written");
    Ok(())
}
