use anyhow::Result;
use clap::Parser;
use fastdlis::{
    file_tags, frames::FileFrames, init_logging, load_file, presenter::write_json,
    walker::DEFAULT_EXTENSIONS, DlisLoader, Extensions,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Write the frame summaries of every DLIS file under a directory as JSON.
#[derive(Parser, Debug)]
#[command(name = "dlis-frames", version)]
struct Args {
    /// Directory holding one folder per well
    path: PathBuf,

    #[arg(short, long, default_value = "frames.json")]
    output: PathBuf,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let extensions = Extensions::new(DEFAULT_EXTENSIONS)?;
    let mut files = Vec::new();

    for tag in file_tags(&args.path, &extensions)? {
        let file_name = tag.file_name();
        let physical = match load_file(&DlisLoader, &tag).into_outcome() {
            Ok(physical) => physical,
            // already logged by the loader
            Err(_) => continue,
        };

        match FileFrames::from_physical(&physical, &file_name, Some(tag.well())) {
            Ok(frames) => files.push(frames),
            Err(e) => warn!(file = %file_name, error = %e, "skipping unreadable metadata"),
        }
    }

    write_json(&args.output, &files)?;
    info!(files = files.len(), output = %args.output.display(), "frames written");

    Ok(())
}
