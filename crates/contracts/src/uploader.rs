//! Uploader trait - transfer backend interface
//!
//! Defines the single-file transfer contract every backend implements.

use std::path::Path;

use crate::HarnessError;

/// Single-file transfer capability
///
/// A session is opened once per worker and reused for every exposure; it is
/// torn down by drop at the end of the run.
#[trait_variant::make(Uploader: Send)]
pub trait LocalUploader {
    /// Backend name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Send one staged file
    ///
    /// `relative` is resolved against `scratch_root` to locate the local
    /// file and reused verbatim as the remote object key or path.
    ///
    /// # Errors
    /// Returns [`HarnessError::Transfer`] on a non-success response or
    /// transport failure.
    async fn transfer(&mut self, scratch_root: &Path, relative: &Path)
        -> Result<(), HarnessError>;
}
