use super::Presenter;
use crate::report::SummaryRecord;
use console::{pad_str, style, Alignment};
use std::{
    error::Error,
    fmt::Write as _,
    fs,
    io::{self, Write},
    path::PathBuf,
};
use tracing::info;

pub const TITLE: &str = "Logical Files in DLIS Files";
pub const X_LABEL: &str = "DLIS File";
pub const Y_LABEL: &str = "Number of Logical Files";

const LABEL_WIDTH: usize = 24;
const BAR_WIDTH: usize = 40;

fn bar_len(count: usize, max: usize, width: usize) -> usize {
    if max == 0 {
        0
    } else {
        // round half up without going through floats
        (count * width * 2 + max) / (max * 2)
    }
}

/// Horizontal bar chart of logical files per file, scaled to the largest
/// count.
pub fn render_bar_chart(records: &[SummaryRecord], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", style(TITLE).bold())?;

    let max = records.iter().map(|r| r.logical_files()).max().unwrap_or(0);
    for record in records {
        let label = console::truncate_str(record.file(), LABEL_WIDTH, "…");
        let bar = "█".repeat(bar_len(record.logical_files(), max, BAR_WIDTH));

        writeln!(
            out,
            "{} │{} {}",
            pad_str(&label, LABEL_WIDTH, Alignment::Right, None),
            style(bar).blue(),
            record.logical_files()
        )?;
    }

    Ok(())
}

pub struct BarChart;

impl Presenter for BarChart {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
        let stdout = io::stdout();
        render_bar_chart(records, &mut stdout.lock())?;
        Ok(())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Vertical bar chart as a standalone SVG document.
pub fn render_svg(records: &[SummaryRecord]) -> String {
    const SLOT: usize = 60;
    const PLOT_HEIGHT: usize = 300;
    const LEFT: usize = 80;
    const TOP: usize = 50;
    const BOTTOM: usize = 160;

    let max = records.iter().map(|r| r.logical_files()).max().unwrap_or(0);
    let plot_width = SLOT * records.len().max(1);
    let width = LEFT + plot_width + 40;
    let height = TOP + PLOT_HEIGHT + BOTTOM;
    let axis_y = TOP + PLOT_HEIGHT;

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" font-family="sans-serif">"#
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="30" text-anchor="middle" font-size="16">{}</text>"#,
        width / 2,
        escape(TITLE)
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{LEFT}" y1="{TOP}" x2="{LEFT}" y2="{axis_y}" stroke="black"/>"#
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{LEFT}" y1="{axis_y}" x2="{}" y2="{axis_y}" stroke="black"/>"#,
        LEFT + plot_width
    );

    for (i, record) in records.iter().enumerate() {
        let bar = bar_len(record.logical_files(), max, PLOT_HEIGHT);
        let x = LEFT + i * SLOT + SLOT / 6;
        let center = LEFT + i * SLOT + SLOT / 2;

        let _ = writeln!(
            svg,
            r#"<rect x="{x}" y="{}" width="{}" height="{bar}" fill="blue"><title>{}: {}</title></rect>"#,
            axis_y - bar,
            SLOT * 2 / 3,
            escape(record.file()),
            record.logical_files()
        );
        let _ = writeln!(
            svg,
            r#"<text x="{center}" y="{}" text-anchor="end" font-size="11" transform="rotate(-40 {center} {})">{}</text>"#,
            axis_y + 15,
            axis_y + 15,
            escape(record.file())
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="12" font-weight="bold">{}</text>"#,
        LEFT + plot_width / 2,
        height - 10,
        escape(X_LABEL)
    );
    let _ = writeln!(
        svg,
        r#"<text x="20" y="{}" text-anchor="middle" font-size="12" font-weight="bold" transform="rotate(-90 20 {})">{}</text>"#,
        TOP + PLOT_HEIGHT / 2,
        TOP + PLOT_HEIGHT / 2,
        escape(Y_LABEL)
    );
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="end" font-size="11">{max}</text>"#,
        LEFT - 5,
        TOP + 4
    );
    svg.push_str("</svg>\n");

    svg
}

/// Writes the SVG chart to a file.
pub struct SvgChart(pub PathBuf);

impl Presenter for SvgChart {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
        fs::write(&self.0, render_svg(records))?;
        info!(path = %self.0.display(), "wrote SVG chart");
        Ok(())
    }
}
