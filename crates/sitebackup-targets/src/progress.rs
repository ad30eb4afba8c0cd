//! Upload progress indicator

use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while an archive is uploaded
///
/// Hidden unless enabled and stdout is a terminal.
#[derive(Debug)]
pub struct UploadProgress {
    bar: ProgressBar,
}

impl UploadProgress {
    pub fn start(message: &str, enabled: bool) -> Self {
        if !enabled || !Term::stdout().is_term() {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}
