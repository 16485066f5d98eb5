//! Format plugins: translate flat payloads into keysets and back.

pub mod ini;
pub mod json;

pub use ini::IniFormat;
pub use json::JsonFormat;

use crate::error::BackendError;
use crate::key::KeyName;
use crate::keyset::Keyset;

/// Translates a byte payload into a keyset mounted under `root`, and a
/// keyset back into bytes.
///
/// For lossless input, `write(parse(bytes)) == bytes`; formats with lossy
/// surface features (comments, blank lines) preserve them through explicit
/// metadata passthrough.
pub trait Format: Send + Sync {
    fn parse(&self, bytes: &[u8], root: &KeyName) -> Result<Keyset, BackendError>;
    fn write(&self, ks: &Keyset) -> Result<Vec<u8>, BackendError>;
}
