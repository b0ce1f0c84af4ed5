use crate::updater::{ItemOutcome, UpdateReport};

/// Trait for reporting update progress.
///
/// The CLI implements it with indicatif; library callers can stay silent.
/// All methods have default no-op implementations.
pub trait UpdateReporter: Send + Sync {
    fn on_check_start(&self) {}
    fn on_update_start(&self, _from_version: &str, _to_version: &str, _total_items: usize) {}
    fn on_item(&self, _path: &str, _outcome: &ItemOutcome) {}
    fn on_install_start(&self) {}
    fn on_update_complete(&self, _report: &UpdateReport) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl UpdateReporter for SilentReporter {}
