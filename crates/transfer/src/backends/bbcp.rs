//! BbcpSession - external high-throughput parallel copy

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use contracts::HarnessError;

const BACKEND: &str = "bbcp";

/// Shells out to `bbcp` for each staged file
///
/// `-A` makes the tool create missing remote parent directories, so there is
/// no explicit existence check or mkdir pre-step.
pub struct BbcpSession {
    host: String,
    path: PathBuf,
}

impl BbcpSession {
    pub fn new(host: &str, path: &Path) -> Self {
        info!(host, path = %path.display(), "bbcp: saving host and path");
        Self {
            host: host.to_string(),
            path: path.to_path_buf(),
        }
    }

    pub fn name(&self) -> &str {
        BACKEND
    }

    /// Remote target spec, `host:path/relative`.
    fn target(&self, relative: &Path) -> String {
        format!("{}:{}", self.host, self.path.join(relative).display())
    }

    #[instrument(
        name = "bbcp_transfer",
        skip(self, scratch_root, relative),
        fields(host = %self.host, relative = %relative.display())
    )]
    pub async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        let local = scratch_root.join(relative);
        let target = self.target(relative);
        debug!(target = %target, "bbcp: streaming");

        let output = Command::new("bbcp")
            .arg("-A")
            .arg(&local)
            .arg(&target)
            .output()
            .await
            .map_err(|e| HarnessError::transfer(BACKEND, format!("failed to run bbcp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HarnessError::transfer(
                BACKEND,
                format!(
                    "bbcp to {target} exited with {}: {}",
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
    fn test_target_spec() {
        let session = BbcpSession::new("relay-01", Path::new("export/staging"));
        let relative = Path::new("2026-08-23/x/MC_O_x_S00.fits");
        assert_eq!(
            session.target(relative),
            "relay-01:export/staging/2026-08-23/x/MC_O_x_S00.fits"
        );
    }
}
