//! INI format plugin.
//!
//! Structural conventions carried in metadata: every parsed key records its
//! file position as zero-padded `order` metadata, section keys carry an
//! `ini/section` index, and comment or blank lines preceding a key are kept
//! verbatim in `comment` metadata (trailing lines in `comment/trailing` on
//! the last key). The writer replays all of it, so lossless input round-trips
//! byte-identically.

use crate::error::BackendError;
use crate::format::Format;
use crate::key::{Key, KeyName, KeyPayload};
use crate::keyset::Keyset;
use std::collections::{HashMap, HashSet};

const META_ORDER: &str = "order";
const META_SECTION: &str = "ini/section";
const META_COMMENT: &str = "comment";
const META_TRAILING: &str = "comment/trailing";

/// INI reader/writer
#[derive(Debug, Default, Clone)]
pub struct IniFormat;

impl IniFormat {
    pub fn new() -> Self {
        IniFormat
    }
}

impl Format for IniFormat {
    fn parse(&self, bytes: &[u8], root: &KeyName) -> Result<Keyset, BackendError> {
        let text = std::str::from_utf8(bytes).map_err(|e| BackendError::Parse {
            line: 0,
            reason: format!("not valid UTF-8: {}", e),
        })?;

        let mut ks = Keyset::new();
        let mut section: Option<String> = None;
        let mut comments: Vec<String> = Vec::new();
        let mut last_name: Option<String> = None;
        let mut order = 0usize;
        let mut section_index = 0usize;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                comments.push(line.to_string());
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| BackendError::Parse {
                    line: idx + 1,
                    reason: "unterminated section header".to_string(),
                })?;
                order += 1;
                section_index += 1;
                let key_name = child_name(root, name, idx + 1)?;
                let mut key = Key::from_name(key_name.clone())
                    .with_meta(META_ORDER, format!("{:09}", order))
                    .with_meta(META_SECTION, section_index.to_string());
                attach_comments(&mut key, &mut comments);
                last_name = Some(key_name.to_string());
                ks.append(key);
                section = Some(name.to_string());
                continue;
            }

            let (entry, value) = trimmed.split_once('=').ok_or_else(|| BackendError::Parse {
                line: idx + 1,
                reason: "expected `key = value`".to_string(),
            })?;
            order += 1;
            let relative = match &section {
                Some(section) => format!("{}/{}", section, entry.trim()),
                None => entry.trim().to_string(),
            };
            let key_name = child_name(root, &relative, idx + 1)?;
            let mut key = Key::from_name(key_name.clone())
                .with_value(value.trim())
                .with_meta(META_ORDER, format!("{:09}", order));
            attach_comments(&mut key, &mut comments);
            last_name = Some(key_name.to_string());
            ks.append(key);
        }

        // Lines after the last key stay with that key for write-back.
        if !comments.is_empty() {
            if let Some(name) = last_name {
                if let Some(key) = ks.lookup_mut(&name) {
                    key.set_meta(META_TRAILING, comments.join("\n"));
                }
            }
        }

        Ok(ks)
    }

    fn write(&self, ks: &Keyset) -> Result<Vec<u8>, BackendError> {
        let section_names: HashSet<String> = ks
            .iter()
            .filter(|k| k.meta(META_SECTION).is_some())
            .map(|k| k.name().to_string())
            .collect();

        let mut sections: Vec<&Key> = Vec::new();
        let mut top_level: Vec<&Key> = Vec::new();
        let mut children: HashMap<String, Vec<&Key>> = HashMap::new();
        for key in ks.iter() {
            if key.meta(META_SECTION).is_some() {
                sections.push(key);
            } else {
                let parent = parent_name(&key.name().to_string());
                if section_names.contains(&parent) {
                    children.entry(parent).or_default().push(key);
                } else {
                    top_level.push(key);
                }
            }
        }

        sort_by_order(&mut sections);
        sort_by_order(&mut top_level);
        for group in children.values_mut() {
            sort_by_order(group);
        }

        let mut out = String::new();
        for key in &top_level {
            write_entry(&mut out, key)?;
        }
        for section in &sections {
            write_comments(&mut out, section.meta(META_COMMENT));
            out.push('[');
            out.push_str(&section.name().base_name());
            out.push_str("]\n");
            write_comments(&mut out, section.meta(META_TRAILING));
            let rendered = section.name().to_string();
            if let Some(entries) = children.get(&rendered) {
                for key in entries {
                    write_entry(&mut out, key)?;
                }
            }
        }
        Ok(out.into_bytes())
    }
}

fn child_name(root: &KeyName, relative: &str, line: usize) -> Result<KeyName, BackendError> {
    KeyName::parse(&format!("{}/{}", root, relative)).map_err(|e| BackendError::Parse {
        line,
        reason: e.to_string(),
    })
}

fn attach_comments(key: &mut Key, comments: &mut Vec<String>) {
    if !comments.is_empty() {
        key.set_meta(META_COMMENT, comments.join("\n"));
        comments.clear();
    }
}

fn parent_name(rendered: &str) -> String {
    match rendered.rsplit_once('/') {
        Some((parent, _)) => parent.to_string(),
        None => String::new(),
    }
}

fn sort_by_order(keys: &mut [&Key]) {
    keys.sort_by(|a, b| {
        let ka = (a.meta(META_ORDER).unwrap_or("~"), a.name().to_string());
        let kb = (b.meta(META_ORDER).unwrap_or("~"), b.name().to_string());
        ka.cmp(&kb)
    });
}

fn write_comments(out: &mut String, meta: Option<&str>) {
    if let Some(block) = meta {
        for line in block.split('\n') {
            out.push_str(line);
            out.push('\n');
        }
    }
}

fn write_entry(out: &mut String, key: &Key) -> Result<(), BackendError> {
    write_comments(out, key.meta(META_COMMENT));
    let value = match key.payload() {
        Some(KeyPayload::Text(text)) => text.as_str(),
        Some(KeyPayload::Binary(_)) => {
            return Err(BackendError::UnsupportedPayload(format!(
                "binary payload at {}",
                key.name()
            )))
        }
        None => "",
    };
    out.push_str(&key.name().base_name());
    out.push_str(" = ");
    out.push_str(value);
    out.push('\n');
    write_comments(out, key.meta(META_TRAILING));
    Ok(())
}
