//! Protocol-specific backend sessions.

mod bbcp;
mod gsapi;
mod http;
mod s3;
mod scp;

pub use bbcp::BbcpSession;
pub use gsapi::GsapiSession;
pub use http::HttpSession;
pub use s3::S3Session;
pub use scp::ScpSession;

use std::path::Path;

/// Remote object key for a staged file: `prefix/relative` or bare
/// `relative`.
pub(crate) fn object_key(prefix: Option<&str>, relative: &Path) -> String {
    let rel = relative.to_string_lossy();
    match prefix {
        Some(prefix) => format!("{prefix}/{rel}"),
        None => rel.into_owned(),
    }
}

/// Open a staged file as a streaming request body.
pub(crate) async fn file_body(
    local: &Path,
    backend: &str,
) -> Result<reqwest::Body, contracts::HarnessError> {
    let file = tokio::fs::File::open(local).await.map_err(|e| {
        contracts::HarnessError::transfer(backend, format!("open {} failed: {e}", local.display()))
    })?;
    Ok(reqwest::Body::wrap_stream(tokio_util::io::ReaderStream::new(
        file,
    )))
}
