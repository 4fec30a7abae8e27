// ABOUTME: Fixed-cadence progress reporting for record transfers
// ABOUTME: Emits an info event every N records and optionally drives a terminal progress bar

use crate::utils::format_count;
use indicatif::{ProgressBar, ProgressStyle};

/// Reports transfer progress every `interval` records.
pub struct Progress {
    verb: &'static str,
    interval: u64,
    bar: ProgressBar,
}

impl Progress {
    /// Create a reporter. `expected` sizes the bar; without it a spinner is shown.
    pub fn new(verb: &'static str, interval: u64, expected: Option<u64>, show_bar: bool) -> Self {
        let bar = if !show_bar {
            ProgressBar::hidden()
        } else {
            match expected {
                Some(len) if len > 0 => {
                    let bar = ProgressBar::new(len);
                    if let Ok(style) = ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    {
                        bar.set_style(style.progress_chars("##-"));
                    }
                    bar
                }
                _ => ProgressBar::new_spinner(),
            }
        };

        Self {
            verb,
            interval: interval.max(1),
            bar,
        }
    }

    /// Reporter that only logs.
    pub fn hidden(verb: &'static str, interval: u64) -> Self {
        Self::new(verb, interval, None, false)
    }

    pub fn is_checkpoint(&self, done: u64) -> bool {
        done > 0 && done % self.interval == 0
    }

    /// Record that `done` records have been transferred so far.
    pub fn record(&self, done: u64) {
        self.bar.set_position(done);
        if self.is_checkpoint(done) {
            let verb = self.verb;
            self.bar
                .suspend(|| tracing::info!("{} {} records", verb, format_count(done)));
        }
    }

    pub fn finish(&self, done: u64) {
        self.bar
            .finish_with_message(format!("{} {} records", self.verb, format_count(done)));
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}
