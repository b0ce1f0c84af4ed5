//! Self-updater: compare the local version with the published manifest and,
//! on mismatch, patch the installation file by file.
//!
//! The sync is not atomic. A failed item is recorded and skipped, so an
//! interrupted run can leave a mix of old and new files behind; the
//! [`UpdateReport`] says exactly which items did not make it.

pub mod installer;
pub mod manifest;
pub mod remote;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::progress::UpdateReporter;

pub use installer::{DependencyInstaller, InstallOutcome, ShellInstaller};
pub use manifest::{entry_kind, EntryKind, Manifest, MANIFEST_FILE};
pub use remote::{HttpRemote, RemoteSource};

/// Result of comparing the local install with the published manifest.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateCheck {
    UpToDate { version: String },
    Available(Manifest),
    /// The manifest could not be fetched or parsed; treated as "no update".
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    DirectoryCreated,
    FileWritten,
    Deleted,
    /// Listed for deletion but already gone.
    AlreadyAbsent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub from_version: String,
    pub to_version: String,
    pub directories_created: usize,
    pub files_written: usize,
    pub files_deleted: usize,
    pub already_absent: usize,
    pub failures: Vec<ItemFailure>,
    /// Set when the dependency manifest was rewritten and an install ran.
    pub dependency_install: Option<InstallOutcome>,
}

impl UpdateReport {
    fn record(&mut self, path: &str, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::DirectoryCreated => self.directories_created += 1,
            ItemOutcome::FileWritten => self.files_written += 1,
            ItemOutcome::Deleted => self.files_deleted += 1,
            ItemOutcome::AlreadyAbsent => self.already_absent += 1,
            ItemOutcome::Failed(reason) => self.failures.push(ItemFailure {
                path: path.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.directories_created + self.files_written + self.files_deleted + self.already_absent
    }

    /// Every item applied and any dependency install succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && !matches!(self.dependency_install, Some(InstallOutcome::Failed(_)))
    }
}

/// Version of the installation rooted at `root`: its own manifest if it has
/// one, otherwise this build's version.
pub fn local_version(root: &Path) -> String {
    match Manifest::load(&root.join(MANIFEST_FILE)) {
        Ok(manifest) => manifest.version,
        Err(e) => {
            debug!("No usable local manifest ({}), using build version", e);
            env!("CARGO_PKG_VERSION").to_string()
        }
    }
}

pub struct SelfUpdater<S, I> {
    remote: S,
    installer: I,
    root: PathBuf,
    local_version: String,
    dependency_manifest: String,
}

impl<S: RemoteSource, I: DependencyInstaller> SelfUpdater<S, I> {
    pub fn new(
        remote: S,
        installer: I,
        root: impl Into<PathBuf>,
        local_version: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            installer,
            root: root.into(),
            local_version: local_version.into(),
            dependency_manifest: "requirements.txt".to_string(),
        }
    }

    /// File name whose rewrite triggers a dependency install.
    pub fn with_dependency_manifest(mut self, file_name: impl Into<String>) -> Self {
        self.dependency_manifest = file_name.into();
        self
    }

    pub fn local_version(&self) -> &str {
        &self.local_version
    }

    /// Fails closed: any problem fetching or parsing the manifest reads as
    /// "no update available".
    pub async fn check(&self) -> UpdateCheck {
        let raw = match self.remote.fetch_manifest().await {
            Ok(raw) => raw,
            Err(e) => {
                error!("No version manifest found upstream: {}", e);
                return UpdateCheck::Unavailable(e.to_string());
            }
        };

        let manifest = match Manifest::parse(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                error!("Upstream manifest is unusable: {}", e);
                return UpdateCheck::Unavailable(e.to_string());
            }
        };

        if manifest.matches_version(&self.local_version) {
            info!("Server up to date! ({})", self.local_version);
            UpdateCheck::UpToDate {
                version: manifest.version,
            }
        } else {
            info!(
                "Server needs updating: {} -> {}",
                self.local_version, manifest.version
            );
            UpdateCheck::Available(manifest)
        }
    }

    /// Apply `manifest` to the install directory. Per-item failures are
    /// logged, recorded, and skipped.
    pub async fn update(&self, manifest: &Manifest, reporter: &dyn UpdateReporter) -> UpdateReport {
        let mut report = UpdateReport {
            from_version: self.local_version.clone(),
            to_version: manifest.version.clone(),
            ..Default::default()
        };
        reporter.on_update_start(&self.local_version, &manifest.version, manifest.item_count());

        let mut dependencies_changed = false;

        for entry in &manifest.files {
            let outcome = match self.apply_file(entry).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Couldn't update {}: {}", entry, e);
                    ItemOutcome::Failed(e.to_string())
                }
            };

            if outcome == ItemOutcome::FileWritten
                && manifest::file_name(entry) == self.dependency_manifest
            {
                dependencies_changed = true;
            }

            report.record(entry, &outcome);
            reporter.on_item(entry, &outcome);
        }

        for entry in &manifest.deleted_files {
            let outcome = match self.apply_deletion(entry).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Couldn't delete {}: {}", entry, e);
                    ItemOutcome::Failed(e.to_string())
                }
            };
            report.record(entry, &outcome);
            reporter.on_item(entry, &outcome);
        }

        if dependencies_changed {
            reporter.on_install_start();
            let outcome = self.installer.install(&self.root).await;
            match &outcome {
                InstallOutcome::Succeeded => info!("Updated packages!"),
                InstallOutcome::Failed(reason) => error!("Package install failed: {}", reason),
            }
            report.dependency_install = Some(outcome);
        }

        reporter.on_update_complete(&report);
        report
    }

    /// CHECKING -> UP_TO_DATE | UPDATING -> DONE. Returns the report when an
    /// update was applied.
    pub async fn run(&self, reporter: &dyn UpdateReporter) -> Option<UpdateReport> {
        reporter.on_check_start();
        let manifest = match self.check().await {
            UpdateCheck::Available(manifest) => manifest,
            UpdateCheck::UpToDate { .. } | UpdateCheck::Unavailable(_) => return None,
        };

        let report = self.update(&manifest, reporter).await;
        if report.is_clean() {
            info!("Successfully updated the server to {}!", report.to_version);
        } else {
            warn!(
                "Update to {} finished with {} failed items",
                report.to_version,
                report.failures.len()
            );
        }
        info!("Restart the server to run the new version.");
        Some(report)
    }

    async fn apply_file(&self, entry: &str) -> Result<ItemOutcome> {
        let path = manifest::resolve(&self.root, entry)?;

        if entry_kind(entry) == EntryKind::Directory {
            fs::create_dir_all(&path).await?;
            info!("Successfully created path {}", entry);
            return Ok(ItemOutcome::DirectoryCreated);
        }

        let content = self.remote.fetch_file(entry).await?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(Error::Other(format!("{} is a directory", path.display())));
        }
        fs::write(&path, content).await?;
        info!("Successfully updated file {}", entry);
        Ok(ItemOutcome::FileWritten)
    }

    async fn apply_deletion(&self, entry: &str) -> Result<ItemOutcome> {
        let path = manifest::resolve(&self.root, entry)?;

        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::Other(format!(
                    "{} is a directory, not removing it",
                    path.display()
                )));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} already absent", entry);
                return Ok(ItemOutcome::AlreadyAbsent);
            }
            _ => {}
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Successfully deleted file {}", entry);
                Ok(ItemOutcome::Deleted)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ItemOutcome::AlreadyAbsent),
            Err(e) => Err(e.into()),
        }
    }
}
