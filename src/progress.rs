use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::{
    io::{self, Write},
    sync::Mutex,
};

/// The bar currently drawing on stderr, if any.
static ACTIVE_BAR: Mutex<Option<ProgressBar>> = Mutex::new(None);

fn set_active(bar: Option<ProgressBar>) {
    if let Ok(mut active) = ACTIVE_BAR.lock() {
        *active = bar;
    }
}

fn active() -> Option<ProgressBar> {
    ACTIVE_BAR.lock().ok().and_then(|active| active.clone())
}

/// Stderr writer for log output. While a [`ProgressBarSink`] is drawing, the
/// bar is hidden for each write so log lines never land inside it.
pub struct LogWriter;

/// `MakeWriter` for `tracing_subscriber`.
pub fn log_writer() -> LogWriter {
    LogWriter
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match active() {
            Some(bar) => bar.suspend(|| io::stderr().write_all(buf)).map(|_| buf.len()),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// Receives progress of a report run.
pub trait ProgressSink {
    #[allow(unused_variables)]
    fn start(&mut self, total: usize, title: &str) {}

    #[allow(unused_variables)]
    fn advance(&mut self, message: &str) {}

    fn finish(&mut self) {}
}

/// Reports nothing.
pub struct Silent;

impl ProgressSink for Silent {}

/// Progress bar on stderr. Draws nothing when stderr is not a terminal.
#[derive(Default)]
pub struct ProgressBarSink {
    bar: Option<ProgressBar>,
}

impl ProgressBarSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for ProgressBarSink {
    fn start(&mut self, total: usize, title: &str) {
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());

        if let Ok(style) = ProgressStyle::with_template(
            "{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} ({elapsed}) {wide_msg}",
        ) {
            bar.set_style(style.progress_chars("=> "));
        }

        bar.set_prefix(title.to_owned());
        set_active(Some(bar.clone()));
        self.bar = Some(bar);
    }

    fn advance(&mut self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_owned());
            bar.inc(1);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            set_active(None);
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod does {
    use super::*;

    // One test, since the active bar is process-wide.
    #[test]
    fn tolerate_calls_out_of_order_and_route_logs() {
        let mut sink = ProgressBarSink::new();
        sink.advance("before start");
        sink.finish();
        assert!(active().is_none());

        sink.start(2, "Test");
        assert!(active().is_some());
        assert_eq!(LogWriter.write(b"during\n").unwrap(), 7);
        sink.advance("one");
        sink.advance("two");
        sink.finish();
        sink.finish();

        assert!(active().is_none());
        assert_eq!(LogWriter.write(b"after\n").unwrap(), 6);
    }
}
