//! GsapiSession - object-store API style A (JSON-API media upload)

use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use contracts::HarnessError;

use crate::session::{Credentials, SessionConfig};

use super::{file_body, object_key};

const BACKEND: &str = "gsapi";

/// Session against the object store's JSON API
///
/// Uploads go to `POST {endpoint}/upload/storage/v1/b/{bucket}/o` with
/// `uploadType=media`; repeat uploads of the same key overwrite.
pub struct GsapiSession {
    client: Client,
    endpoint: String,
    bucket: String,
    prefix: Option<String>,
    credentials: Credentials,
}

impl GsapiSession {
    /// Open the session and pre-warm the connection.
    #[instrument(name = "gsapi_connect", skip(config), fields(bucket = %bucket))]
    pub async fn connect(
        bucket: &str,
        prefix: Option<&str>,
        config: &SessionConfig,
    ) -> Result<Self, HarnessError> {
        info!(
            bucket,
            prefix = prefix.unwrap_or(""),
            "gsapi: opening bucket"
        );
        let client = Client::builder()
            .build()
            .map_err(|e| HarnessError::transfer(BACKEND, format!("client build failed: {e}")))?;

        let session = Self {
            client,
            endpoint: config.endpoint.clone(),
            bucket: bucket.to_string(),
            prefix: prefix.map(str::to_string),
            credentials: Credentials::load(config.credential_file.as_deref()),
        };
        session.probe().await;
        Ok(session)
    }

    /// Best-effort existence probe of a sentinel object.
    ///
    /// Advisory pre-warming only: any failure, transport or status, is
    /// logged and ignored.
    async fn probe(&self) {
        let url = format!(
            "{}/storage/v1/b/{}/o/.null",
            self.endpoint, self.bucket
        );
        let request = self.client.get(&url).query(&[("alt", "media")]);
        match self.credentials.apply(request).send().await {
            Ok(response) => {
                debug!(status = %response.status(), "gsapi: probe completed")
            }
            Err(e) => warn!(error = %e, "gsapi: ignoring failed probe"),
        }
    }

    pub fn name(&self) -> &str {
        BACKEND
    }

    #[instrument(
        name = "gsapi_transfer",
        skip(self, scratch_root, relative),
        fields(bucket = %self.bucket, relative = %relative.display())
    )]
    pub async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        let key = object_key(self.prefix.as_deref(), relative);
        debug!(key = %key, "gsapi: uploading");

        let url = format!(
            "{}/upload/storage/v1/b/{}/o",
            self.endpoint, self.bucket
        );
        let body = file_body(&scratch_root.join(relative), BACKEND).await?;
        let request = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", key.as_str())])
            .body(body);

        let response = self
            .credentials
            .apply(request)
            .send()
            .await
            .map_err(|e| HarnessError::transfer(BACKEND, format!("upload of '{key}' failed: {e}")))?;

        if !response.status().is_success() {
            return Err(HarnessError::transfer(
                BACKEND,
                format!("upload of '{key}' failed with status {}", response.status()),
            ));
        }
        Ok(())
    }
}
