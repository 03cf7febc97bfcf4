use super::Presenter;
use crate::report::SummaryRecord;
use console::{pad_str, style, Alignment};
use std::{
    error::Error,
    io::{self, Write},
};

const FILE_WIDTH: usize = 20;
const HEADERS: [&str; 5] = ["File", "Well Name", "Size", "Error", "Logical Files"];

fn cells(record: &SummaryRecord) -> [String; 5] {
    [
        console::truncate_str(record.file(), FILE_WIDTH, "…").into_owned(),
        record.well().to_owned(),
        record.size().to_owned(),
        if record.error() { "Yes" } else { "No" }.to_owned(),
        record.logical_files().to_string(),
    ]
}

fn alignment(column: usize) -> Alignment {
    if column >= 3 {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

/// Renders the records as a bordered table.
pub fn render_table(records: &[SummaryRecord], out: &mut impl Write) -> io::Result<()> {
    let rows: Vec<[String; 5]> = records.iter().map(cells).collect();

    let mut widths = HEADERS.map(console::measure_text_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(console::measure_text_width(cell));
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{left}{}{right}", parts.join(mid))
    };

    writeln!(out, "{}", rule("┌", "┬", "┐"))?;

    let header: Vec<String> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let padded = pad_str(h, widths[i], alignment(i), None);
            style(padded).bold().magenta().to_string()
        })
        .collect();
    writeln!(out, "│ {} │", header.join(" │ "))?;
    writeln!(out, "{}", rule("├", "┼", "┤"))?;

    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let padded = pad_str(cell, widths[i], alignment(i), None).into_owned();
                if i == 0 {
                    style(padded).dim().to_string()
                } else {
                    padded
                }
            })
            .collect();
        writeln!(out, "│ {} │", line.join(" │ "))?;
    }

    writeln!(out, "{}", rule("└", "┴", "┘"))
}

/// Prints the table to stdout.
pub struct ConsoleTable;

impl Presenter for ConsoleTable {
    fn present(&mut self, records: &[SummaryRecord]) -> Result<(), Box<dyn Error>> {
        let stdout = io::stdout();
        render_table(records, &mut stdout.lock())?;
        Ok(())
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::presenter::testing::records;

    fn rendered() -> Vec<String> {
        let mut out = Vec::new();
        render_table(&records(), &mut out).unwrap();
        console::strip_ansi_codes(&String::from_utf8(out).unwrap())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn render_headers_and_rows() {
        let lines = rendered();

        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("File"));
        assert!(lines[1].contains("Logical Files"));
        assert!(lines[3].contains("1-ABC-2-RJS"));
        assert!(lines[3].contains("Yes"));
        assert!(lines[4].contains("main.dlis"));
        assert!(lines[4].contains("3.0 MB"));
        assert!(lines[4].trim_end().ends_with("4 │"));
    }

    #[test]
    fn truncate_long_file_names() {
        let lines = rendered();

        assert!(!lines[3].contains("broken_file_with_a_long_name.DLIS"));
        assert!(lines[3].contains("broken_file"));
        assert!(lines[3].contains('…'));
    }

    #[test]
    fn keep_rows_aligned() {
        let widths: Vec<usize> = rendered()
            .iter()
            .map(|l| console::measure_text_width(l))
            .collect();

        assert!(widths.windows(2).all(|w| w[0] == w[1]));
    }
}
