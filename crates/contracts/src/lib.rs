//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and
//! traits. All business crates can only depend on this crate, reverse
//! dependencies are prohibited.
//!
//! ## Time Model
//! - The run baseline is today's local date at the configured `HH:MM`
//! - Exposure `i` is due at `baseline + i * interval`
//! - Sequence numbers embed the baseline, not the worker, so identical
//!   indexes across sensors share a sequence number but never a file name

mod credentials;
mod error;
mod exposure;
mod run_config;
mod sensor_name;
mod uploader;

pub use credentials::{CredentialHook, DEFAULT_CREDENTIAL_VAR};
pub use error::*;
pub use exposure::{compressed_path, Exposure, ExposureNamer};
pub use run_config::*;
pub use sensor_name::SensorName;
pub use uploader::*;
