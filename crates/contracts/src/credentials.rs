//! Credential injection for object-store backends.
//!
//! Deployments hand the harness credential material through one environment
//! variable; the hook writes it to a file whose path is passed explicitly to
//! the sessions that need it. No process-wide environment mutation.

use std::path::PathBuf;

use crate::HarnessError;

/// Default environment variable holding credential material.
pub const DEFAULT_CREDENTIAL_VAR: &str = "CCD_STREAMER_KEY";

/// Writes credential material from the environment to a local file.
#[derive(Debug, Clone)]
pub struct CredentialHook {
    source_var: String,
    target_path: PathBuf,
}

impl CredentialHook {
    pub fn new(source_var: impl Into<String>, target_path: impl Into<PathBuf>) -> Self {
        Self {
            source_var: source_var.into(),
            target_path: target_path.into(),
        }
    }

    /// Install the credential file if the source variable is present.
    ///
    /// Returns the path to hand to object-store sessions, or `None` when the
    /// variable is unset and ambient credentials apply.
    ///
    /// # Errors
    /// Returns an IO error when the target file cannot be written.
    pub fn install(&self) -> Result<Option<PathBuf>, HarnessError> {
        let Ok(material) = std::env::var(&self.source_var) else {
            return Ok(None);
        };
        if let Some(parent) = self.target_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.target_path, material)?;
        Ok(Some(self.target_path.clone()))
    }

    /// The environment variable this hook reads.
    pub fn source_var(&self) -> &str {
        &self.source_var
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_writes_material() {
        let dir = std::env::temp_dir().join("ccd-streamer-cred-test");
        let target = dir.join("key.json");
        std::env::set_var("CCD_STREAMER_TEST_KEY_A", "{\"token\":\"abc\"}");

        let hook = CredentialHook::new("CCD_STREAMER_TEST_KEY_A", &target);
        let installed = hook.install().unwrap();

        assert_eq!(installed, Some(target.clone()));
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "{\"token\":\"abc\"}"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_install_without_variable_is_none() {
        let hook = CredentialHook::new("CCD_STREAMER_TEST_KEY_UNSET", "/nonexistent/key.json");
        assert_eq!(hook.install().unwrap(), None);
    }
}
