//! Key model: a named, valued, metadata-bearing configuration leaf.

pub mod name;

pub use name::{KeyName, Namespace, Segment};

use crate::error::KeyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata name under which a contextual template declares its default value
pub const META_DEFAULT: &str = "default";

/// Key payload: textual or raw binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPayload {
    Text(String),
    Binary(Vec<u8>),
}

/// A configuration leaf: name, optional payload, and a unique-by-name
/// metadata map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    name: KeyName,
    payload: Option<KeyPayload>,
    meta: BTreeMap<String, String>,
}

impl Key {
    /// Create a key from a textual name, validating well-formedness
    pub fn new(name: &str) -> Result<Self, KeyError> {
        Ok(Self::from_name(KeyName::parse(name)?))
    }

    /// Create a key from an already-parsed name
    pub fn from_name(name: KeyName) -> Self {
        Key {
            name,
            payload: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.payload = Some(KeyPayload::Text(value.into()));
        self
    }

    pub fn with_binary(mut self, bytes: Vec<u8>) -> Self {
        self.payload = Some(KeyPayload::Binary(bytes));
        self
    }

    pub fn with_meta(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(name.into(), value.into());
        self
    }

    pub fn name(&self) -> &KeyName {
        &self.name
    }

    pub fn payload(&self) -> Option<&KeyPayload> {
        self.payload.as_ref()
    }

    /// Textual payload, if the key holds one
    pub fn string_value(&self) -> Option<&str> {
        match &self.payload {
            Some(KeyPayload::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        self.payload = Some(KeyPayload::Text(value.into()));
    }

    pub fn set_binary(&mut self, bytes: Vec<u8>) {
        self.payload = Some(KeyPayload::Binary(bytes));
    }

    pub fn meta(&self, name: &str) -> Option<&str> {
        self.meta.get(name).map(|v| v.as_str())
    }

    pub fn set_meta(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(name.into(), value.into());
    }

    pub fn meta_iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.meta.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
