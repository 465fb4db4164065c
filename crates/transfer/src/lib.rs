//! # Transfer
//!
//! Destination resolution and protocol-specific transfer backends.
//!
//! A destination descriptor is classified once per run into a
//! [`Destination`]; each worker then opens its own [`TransferSession`],
//! which owns any connection state for the run's lifetime and moves one
//! staged file per call. Transfer calls carry no timeout: a hung backend
//! blocks its worker, never its siblings.

mod backends;
mod destination;
mod session;

pub use backends::{BbcpSession, GsapiSession, HttpSession, S3Session, ScpSession};
pub use destination::Destination;
pub use session::{Credentials, SessionConfig, TransferSession, DEFAULT_ENDPOINT};
