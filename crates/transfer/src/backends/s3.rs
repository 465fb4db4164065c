//! S3Session - object-store API style B (path-style PUT)

use reqwest::Client;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use contracts::HarnessError;

use crate::session::{Credentials, SessionConfig};

use super::{file_body, object_key};

const BACKEND: &str = "s3";

/// Session against an S3-compatible endpoint
///
/// Uploads are path-style `PUT {endpoint}/{bucket}/{key}`; repeat uploads
/// overwrite.
pub struct S3Session {
    client: Client,
    endpoint: String,
    bucket: String,
    prefix: Option<String>,
    credentials: Credentials,
}

impl S3Session {
    /// Open the session and pre-warm the connection.
    #[instrument(name = "s3_connect", skip(config), fields(bucket = %bucket))]
    pub async fn connect(
        bucket: &str,
        prefix: Option<&str>,
        config: &SessionConfig,
    ) -> Result<Self, HarnessError> {
        info!(bucket, prefix = prefix.unwrap_or(""), "s3: opening bucket");
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

    /// Best-effort write probe: PUT an empty sentinel object, swallowing
    /// any failure.
    async fn probe(&self) {
        let url = format!("{}/{}/.null", self.endpoint, self.bucket);
        let request = self.client.put(&url).body(Vec::new());
        match self.credentials.apply(request).send().await {
            Ok(response) => debug!(status = %response.status(), "s3: probe completed"),
            Err(e) => warn!(error = %e, "s3: ignoring failed probe"),
        }
    }

    pub fn name(&self) -> &str {
        BACKEND
    }

    #[instrument(
        name = "s3_transfer",
        skip(self, scratch_root, relative),
        fields(bucket = %self.bucket, relative = %relative.display())
    )]
    pub async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        let key = object_key(self.prefix.as_deref(), relative);
        debug!(key = %key, "s3: uploading");

        let url = format!("{}/{}/{}", self.endpoint, self.bucket, key);
        let body = file_body(&scratch_root.join(relative), BACKEND).await?;
        let request = self.client.put(&url).body(body);

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
