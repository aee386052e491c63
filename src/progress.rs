//! Progress bars that stay pinned below log output.
//!
//! All bars share one `MultiProgress`; the tracing writer prints through it
//! so log lines never tear a bar that is being drawn.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}";

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

fn emit_line(line: &str) {
    let _ = multi_progress().println(line.trim_end_matches('\r'));
}

/// Start a bar for `len` steps. Nothing is drawn for empty work.
pub fn start_progress_bar(len: usize, message: &str) -> Option<ProgressBar> {
    if len == 0 {
        return None;
    }

    let pb = multi_progress().add(ProgressBar::new(len as u64));
    if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn advance_progress(pb: &Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.set_message(message.to_string());
        pb.inc(1);
    }
}

pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// `MakeWriter` for the human log layer
#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Line-buffered writer printing complete lines above the bars
#[derive(Default)]
pub struct LogWriter {
    pending: String,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=idx).collect();
            emit_line(line.trim_end_matches('\n'));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            let line = std::mem::take(&mut self.pending);
            emit_line(line.trim_end_matches('\n'));
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_bar_for_empty_work() {
        assert!(start_progress_bar(0, "nothing").is_none());
        // Helpers accept the absent bar
        advance_progress(&None, "step");
        finish_progress(None, "done");
    }

    #[test]
    fn test_log_writer_accepts_partial_lines() {
        let mut writer = LogWriter::default();
        assert_eq!(writer.write(b"partial").unwrap(), 7);
        assert_eq!(writer.pending, "partial");

        writer.write_all(b" line\nnext").unwrap();
        assert_eq!(writer.pending, "next");

        writer.flush().unwrap();
        assert!(writer.pending.is_empty());
    }
}
