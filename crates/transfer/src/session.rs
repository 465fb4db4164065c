//! Session configuration and the unified backend session.

use std::path::{Path, PathBuf};
use tracing::warn;

use contracts::{HarnessError, Uploader};

use crate::backends::{BbcpSession, GsapiSession, HttpSession, S3Session, ScpSession};
use crate::destination::Destination;

/// Default object-store endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Shared configuration for backend sessions
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Object-store endpoint, overridable for private interconnects and
    /// local test servers
    pub endpoint: String,
    /// Credential file installed by the credential hook
    pub credential_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential_file: None,
        }
    }
}

impl SessionConfig {
    /// Hostname component of the endpoint URL.
    pub fn endpoint_host(&self) -> &str {
        let rest = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        rest.split(|c| c == '/' || c == ':').next().unwrap_or(rest)
    }
}

/// Bearer material for object-store requests
///
/// Loaded once per session from the file the credential hook installed. A
/// file without a usable token falls back to ambient credentials with a
/// warning; requests are sent unauthenticated in that case.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    /// Load credentials from the installed credential file, if any.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read credential file");
                return Self::default();
            }
        };
        match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(value) => {
                let token = value
                    .get("token")
                    .and_then(|t| t.as_str())
                    .map(str::to_string);
                if token.is_none() {
                    warn!(
                        path = %path.display(),
                        "Credential file has no 'token' field, relying on ambient credentials"
                    );
                }
                Self { token }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Credential file is not JSON");
                Self::default()
            }
        }
    }

    /// Attach bearer auth to a request when a token is present.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    #[cfg(test)]
    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// One live backend session, resolved once per worker
pub enum TransferSession {
    Gsapi(GsapiSession),
    S3(S3Session),
    Http(HttpSession),
    Bbcp(BbcpSession),
    Scp(ScpSession),
}

impl TransferSession {
    /// Open the session for a parsed destination.
    ///
    /// Object-store sessions probe the endpoint to pre-warm the connection;
    /// probe failures are logged and swallowed.
    ///
    /// # Errors
    /// Returns [`HarnessError::Transfer`] when the session itself cannot be
    /// constructed.
    pub async fn connect(
        destination: &Destination,
        config: &SessionConfig,
    ) -> Result<Self, HarnessError> {
        match destination {
            Destination::Gsapi { bucket, prefix } => Ok(Self::Gsapi(
                GsapiSession::connect(bucket, prefix.as_deref(), config).await?,
            )),
            Destination::S3 { bucket, prefix } => Ok(Self::S3(
                S3Session::connect(bucket, prefix.as_deref(), config).await?,
            )),
            Destination::Http { base } => Ok(Self::Http(HttpSession::connect(base)?)),
            Destination::Bbcp { host, path } => Ok(Self::Bbcp(BbcpSession::new(host, path))),
            Destination::Scp { host, path } => Ok(Self::Scp(ScpSession::new(host, path))),
        }
    }
}

impl Uploader for TransferSession {
    fn name(&self) -> &str {
        match self {
            Self::Gsapi(session) => session.name(),
            Self::S3(session) => session.name(),
            Self::Http(session) => session.name(),
            Self::Bbcp(session) => session.name(),
            Self::Scp(session) => session.name(),
        }
    }

    async fn transfer(
        &mut self,
        scratch_root: &Path,
        relative: &Path,
    ) -> Result<(), HarnessError> {
        match self {
            Self::Gsapi(session) => session.transfer(scratch_root, relative).await,
            Self::S3(session) => session.transfer(scratch_root, relative).await,
            Self::Http(session) => session.transfer(scratch_root, relative).await,
            Self::Bbcp(session) => session.transfer(scratch_root, relative).await,
            Self::Scp(session) => session.transfer(scratch_root, relative).await,
        }
    }
}
