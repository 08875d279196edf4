use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::ops::Operation;

/// Live status line on stderr: a bar when the run has a time cap, a spinner otherwise.
pub(crate) struct HumanProgress {
    operation: Operation,
    max_duration: Option<Duration>,
    bar: Mutex<Option<ProgressBar>>,
}

impl HumanProgress {
    pub(crate) fn new(operation: Operation, max_duration: Option<Duration>) -> Self {
        Self {
            operation,
            max_duration,
            bar: Mutex::new(None),
        }
    }

    pub(crate) fn update(&self, elapsed: Duration, message: String) {
        let mut inner = self
            .bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let pb = inner.get_or_insert_with(|| self.create_bar());
        pb.set_message(message);

        match self.max_duration {
            Some(total) => {
                let total_ms = total.as_millis() as u64;
                pb.set_position((elapsed.as_millis() as u64).min(total_ms));
            }
            None => pb.tick(),
        }
    }

    pub(crate) fn finish(&self) {
        let mut inner = self
            .bar
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(pb) = inner.take() {
            pb.finish_and_clear();
        }
    }

    fn create_bar(&self) -> ProgressBar {
        let pb = match self.max_duration {
            Some(total) => {
                let pb = ProgressBar::new(total.as_millis() as u64);
                pb.set_style(bar_style());
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(spinner_style());
                pb.enable_steady_tick(Duration::from_millis(120));
                pb
            }
        };
        pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(5));
        pb.set_prefix(self.operation.to_string());
        pb
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} [ {bar:20.cyan/blue} ] {percent:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix} {spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
