use anyhow::Result;
use clap::Parser;
use fastdlis::{file_tags, find_duplicate_tags, walker::DEFAULT_EXTENSIONS, Extensions};
use std::path::PathBuf;

/// List files whose well name occurs more than once.
#[derive(Parser, Debug)]
#[command(name = "dlis-duplicates", version)]
struct Args {
    path: PathBuf,

    /// File extension to look for (repeatable)
    #[arg(short, long = "extension", default_values_t = DEFAULT_EXTENSIONS.map(String::from))]
    extensions: Vec<String>,
}

fn main() -> Result<()> {
    fastdlis::init_logging();
    let args = Args::parse();

    let tags = file_tags(&args.path, &Extensions::new(&args.extensions)?)?;

    for tag in find_duplicate_tags(&tags) {
        println!("{}\t{}\t{}", tag.well(), tag.path().display(), tag.size());
    }

    Ok(())
}
