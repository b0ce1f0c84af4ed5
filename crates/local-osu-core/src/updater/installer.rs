use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Succeeded,
    Failed(String),
}

/// Reinstalls the installation's dependencies after its dependency manifest
/// changed.
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, root: &Path) -> impl Future<Output = InstallOutcome> + Send;
}

/// Runs a shell command in the install directory with all stdio discarded.
pub struct ShellInstaller {
    command: String,
}

impl ShellInstaller {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    fn shell(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C");
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c");
            cmd
        };
        cmd.arg(&self.command);
        cmd
    }
}

impl DependencyInstaller for ShellInstaller {
    async fn install(&self, root: &Path) -> InstallOutcome {
        debug!("Running '{}' in {}", self.command, root.display());
        let status = self
            .shell()
            .current_dir(root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => InstallOutcome::Succeeded,
            Ok(status) => {
                error!("'{}' exited with {}", self.command, status);
                InstallOutcome::Failed(format!("exited with {}", status))
            }
            Err(e) => {
                error!("Could not start '{}': {}", self.command, e);
                InstallOutcome::Failed(e.to_string())
            }
        }
    }
}
