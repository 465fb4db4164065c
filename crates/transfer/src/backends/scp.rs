//! ScpSession - secure-shell copy

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use contracts::HarnessError;

const BACKEND: &str = "scp";

/// Streams each staged file through a remote shell
///
/// The remote command creates the parent directory and redirects stdin into
/// the target path, so a plain `ssh` is the only tool required remotely.
pub struct ScpSession {
    host: String,
    path: PathBuf,
}

impl ScpSession {
    pub fn new(host: &str, path: &Path) -> Self {
        info!(host, path = %path.display(), "scp: saving host and path");
        Self {
            host: host.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        BACKEND
    }

    /// Shell command run on the remote host for one staged file.
    fn remote_command(&self, relative: &Path) -> String {
        let remote = self.path.join(relative);
        let parent = remote.parent().unwrap_or(&self.path);
        format!(
            "mkdir -p {} && cat > {}",
            parent.display(),
            remote.display()
        )
    }

    #[instrument(
        name = "scp_transfer",
        skip(self, scratch_root, relative),
        fields(host = %self.host, relative = %relative.display())
    )]
    pub async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        let local = scratch_root.join(relative);
        let command = self.remote_command(relative);
        debug!(command = %command, "scp: streaming");

        let stdin = std::fs::File::open(&local).map_err(|e| {
            HarnessError::transfer(BACKEND, format!("open {} failed: {e}", local.display()))
        })?;

        let output = Command::new("ssh")
            .arg(&self.host)
            .arg(&command)
            .stdin(Stdio::from(stdin))
            .output()
            .await
            .map_err(|e| HarnessError::transfer(BACKEND, format!("failed to run ssh: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::transfer(
                BACKEND,
                format!(
                    "ssh to {} exited with {}: {}",
                    self.host,
                    output.status,
                    stderr.trim()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_command_creates_parent() {
        let session = ScpSession::new("archiver", Path::new("/data/staging"));
        let relative = Path::new("2026-08-23/x/MC_O_x_S00.fits");
        assert_eq!(
            session.remote_command(relative),
            "mkdir -p /data/staging/2026-08-23/x && cat > /data/staging/2026-08-23/x/MC_O_x_S00.fits"
        );
    }
}
