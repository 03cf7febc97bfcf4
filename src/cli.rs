use clap::Parser;
use fastdlis::walker::DEFAULT_EXTENSIONS;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "fastdlis",
    version,
    about = "Process .dlis files in a directory and output a summary as JSON."
)]
pub struct Args {
    /// Path to the directory containing one folder per well
    pub path: PathBuf,

    /// Where to write the JSON summary
    #[arg(short, long, env = "FASTDLIS_OUTPUT", default_value = "output.json")]
    pub output: PathBuf,

    /// File extension to look for, matched case-sensitively (repeatable)
    #[arg(
        short,
        long = "extension",
        env = "FASTDLIS_EXTENSIONS",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.map(String::from)
    )]
    pub extensions: Vec<String>,

    /// Also write the summary as CSV
    #[arg(long, env = "FASTDLIS_CSV")]
    pub csv: Option<PathBuf>,

    /// Also write the bar chart as SVG
    #[arg(long, env = "FASTDLIS_CHART_SVG")]
    pub chart_svg: Option<PathBuf>,

    /// Don't print the summary table
    #[arg(long)]
    pub no_table: bool,

    /// Don't print the bar chart
    #[arg(long)]
    pub no_chart: bool,

    /// Don't draw the progress bar
    #[arg(long)]
    pub no_progress: bool,
}
