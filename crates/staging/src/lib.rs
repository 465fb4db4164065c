//! # Staging
//!
//! Source-image lookup and exposure staging.
//!
//! Staging materializes one source FITS file at an exposure-specific
//! relative path inside the worker's scratch directory, optionally passing
//! it through a compression strategy that rewrites the extension. Every
//! copy and compress failure is checked and surfaced as
//! [`HarnessError::Staging`].
//!
//! [`HarnessError::Staging`]: contracts::HarnessError::Staging

mod source;
mod stage;

pub use source::{find_source_image, resolve_source, DEFAULT_SOURCE_FILE};
pub use stage::stage;
