use std::path::PathBuf;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use lodestar_core::prelude::*;
use tracing::{error, info};

/// Terminal rendering surface: one spinner line per stage, sub-status lines
/// printed above the spinners, the final report written to a file or stdout.
pub struct TerminalView {
    multi: MultiProgress,
    bars: [ProgressBar; 4],
    output: Option<PathBuf>,
}

impl TerminalView {
    pub fn new(output: Option<PathBuf>) -> Self {
        let multi = MultiProgress::new();
        let bars = Stage::ALL.map(|stage| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(
                ProgressStyle::with_template("{prefix:>18} {spinner:.green} {msg}")
                    .expect("valid progress template"),
            );
            bar.set_prefix(format!("[{}/4] {}", stage.number(), stage.label()));
            bar
        });

        Self {
            multi,
            bars,
            output,
        }
    }

    fn bar(&self, stage: Stage) -> &ProgressBar {
        &self.bars[stage.index()]
    }
}

impl ProgressView for TerminalView {
    fn reset(&self) {
        for bar in &self.bars {
            bar.reset();
            bar.set_message("");
        }
    }

    fn set_stage(&self, stage: Stage, status: StageStatus, message: &str) {
        let bar = self.bar(stage);
        match status {
            StageStatus::Pending => {
                bar.set_message(message.to_string());
            }
            StageStatus::Active => {
                bar.enable_steady_tick(Duration::from_millis(120));
                bar.set_message(message.to_string());
            }
            StageStatus::Complete => {
                if bar.is_finished() {
                    return;
                }
                let text = if message.is_empty() { "done" } else { message };
                bar.finish_with_message(format!("✅ {text}"));
            }
        }
    }

    fn append_sub_status(&self, stage: Stage, text: &str) {
        let _ = self.multi.println(format!("    {} · {}", stage.label(), text));
    }

    fn render_report(&self, html: &str) {
        for bar in &self.bars {
            if !bar.is_finished() {
                bar.finish();
            }
        }

        match &self.output {
            Some(path) => match std::fs::write(path, html) {
                Ok(()) => info!("Report written to {}", path.display()),
                Err(e) => error!("Failed to write report to {}: {}", path.display(), e),
            },
            None => {
                let _ = self.multi.println(html.to_string());
            }
        }
    }

    fn render_error(&self, message: &str) {
        for bar in &self.bars {
            if !bar.is_finished() {
                bar.abandon();
            }
        }
        error!("Research failed: {}", message);
    }
}
