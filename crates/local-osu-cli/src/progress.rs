use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use local_osu_core::updater::ItemOutcome;
use local_osu_core::{UpdateReport, UpdateReporter};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Update progress on the terminal.
///
/// - Check: spinner while the manifest is fetched
/// - Sync: bar over every manifest entry
/// - Install: spinner while dependencies reinstall
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spinner(&self, message: &'static str) {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.slot();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        if let Some(pb) = self.slot().take() {
            pb.finish_and_clear();
        }
    }
}

impl UpdateReporter for CliReporter {
    fn on_check_start(&self) {
        self.spinner("Checking for updates...");
    }

    fn on_update_start(&self, from_version: &str, to_version: &str, total_items: usize) {
        self.finish_bar();
        eprintln!(
            "  {} Updating {} -> {}",
            "↻".cyan(),
            from_version,
            to_version.green()
        );

        let pb = ProgressBar::new(total_items as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Syncing [{bar:30.cyan/dim}] {pos}/{len} {msg}",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_item(&self, path: &str, outcome: &ItemOutcome) {
        let guard = self.slot();
        if let Some(pb) = guard.as_ref() {
            if let ItemOutcome::Failed(reason) = outcome {
                pb.println(format!("  {} {}: {}", "✗".red(), path, reason));
            }
            pb.set_message(path.to_string());
            pb.inc(1);
        }
    }

    fn on_install_start(&self) {
        self.spinner("Installing dependencies...");
    }

    fn on_update_complete(&self, report: &UpdateReport) {
        self.finish_bar();
        let mark = if report.is_clean() {
            "✓".green()
        } else {
            "!".yellow()
        };
        eprintln!(
            "  {} Update complete: {} applied, {} failed",
            mark,
            report.succeeded(),
            report.failures.len()
        );
    }
}
