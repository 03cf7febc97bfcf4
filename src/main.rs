use anyhow::{anyhow, Context, Result};
use clap::Parser;
use fastdlis::presenter::{
    run_presenters, BarChart, ConsoleTable, CsvWriter, JsonWriter, PresenterInstance, SvgChart,
};
use fastdlis::progress::{ProgressBarSink, ProgressSink, Silent};
use fastdlis::{build_report, init_logging, make_presenters, DlisLoader, Extensions};
use std::path::PathBuf;
use tracing::info;

mod cli;

use cli::Args;

/// Drops inner `.` components and trailing separators.
fn normalize(path: PathBuf) -> PathBuf {
    let normalized: PathBuf = path.components().collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

/// Presenters picked by the flags, JSON always first.
fn presenters(args: &Args) -> Vec<PresenterInstance> {
    let mut presenters = make_presenters!["json" => JsonWriter(args.output.clone())];
    if let Some(path) = &args.csv {
        presenters.extend(make_presenters!["csv" => CsvWriter(path.clone())]);
    }
    if let Some(path) = &args.chart_svg {
        presenters.extend(make_presenters!["svg" => SvgChart(path.clone())]);
    }
    if !args.no_table {
        presenters.extend(make_presenters!["table" => ConsoleTable]);
    }
    if !args.no_chart {
        presenters.extend(make_presenters!["chart" => BarChart]);
    }

    presenters
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let root = normalize(args.path.clone());
    let extensions = Extensions::new(&args.extensions)?;
    info!(root = %root.display(), "scanning");

    let mut progress: Box<dyn ProgressSink> = if args.no_progress {
        Box::new(Silent)
    } else {
        Box::new(ProgressBarSink::new())
    };

    let records = build_report(&root, &extensions, &DlisLoader, progress.as_mut())
        .with_context(|| format!("failed to scan {}", root.display()))?;

    let mut presenters = presenters(&args);
    run_presenters(&mut presenters, &records).map_err(|e| anyhow!("{e}"))?;

    Ok(())
}
