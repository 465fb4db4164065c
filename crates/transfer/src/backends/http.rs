//! HttpSession - generic HTTP PUT

use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, instrument};

use contracts::HarnessError;

use super::file_body;

const BACKEND: &str = "http";

/// Reusable HTTP session; one client for all of a worker's exposures
pub struct HttpSession {
    client: Client,
    base: String,
}

impl HttpSession {
    /// Open the session. No probe is performed for plain HTTP.
    pub fn connect(base: &str) -> Result<Self, HarnessError> {
        info!(url = %base, "http: opening session");
        let client = Client::builder()
            .build()
            .map_err(|e| HarnessError::transfer(BACKEND, format!("client build failed: {e}")))?;
        Ok(Self {
            client,
            base: base.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        BACKEND
    }

    #[instrument(
        name = "http_transfer",
        skip(self, scratch_root, relative),
        fields(relative = %relative.display())
    )]
    pub async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        let url = format!("{}/{}", self.base, relative.to_string_lossy());
        debug!(url = %url, "http: putting");

        let body = file_body(&scratch_root.join(relative), BACKEND).await?;
        let response = self
            .client
            .put(&url)
            .body(body)
            .send()
            .await
            .map_err(|e| HarnessError::transfer(BACKEND, format!("PUT {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(HarnessError::transfer(
                BACKEND,
                format!("PUT {url} failed with status {}", response.status()),
            ));
        }
        Ok(())
    }
}
