//! JSON format plugin: serde round-trip of a keyset.

use crate::error::BackendError;
use crate::format::Format;
use crate::key::KeyName;
use crate::keyset::Keyset;

/// JSON reader/writer
///
/// Names, payloads (text or binary), and metadata all serialize explicitly,
/// so the format is lossless by construction. Key names are absolute; the
/// mount root is not consulted.
#[derive(Debug, Default, Clone)]
pub struct JsonFormat;

impl JsonFormat {
    pub fn new() -> Self {
        JsonFormat
    }
}

impl Format for JsonFormat {
    fn parse(&self, bytes: &[u8], _root: &KeyName) -> Result<Keyset, BackendError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn write(&self, ks: &Keyset) -> Result<Vec<u8>, BackendError> {
        let mut bytes = serde_json::to_vec_pretty(ks)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
