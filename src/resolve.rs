//! Layer-tag resolver: rewrites a templated name into a concrete name.

use crate::key::{KeyName, Segment};
use std::collections::HashMap;

/// Snapshot of the active layer set: tag to current substitution string
pub type LayerMap = HashMap<String, String>;

/// Resolve a templated name against a layer snapshot.
///
/// Total over all inputs: literals pass through, `%tag%` substitutes the
/// provider string when the tag is active and degrades to the wildcard `%`
/// when it is not, and anonymous wildcards stay `%`. A provider string is
/// substituted segment-wise so the result is always a well-formed name; an
/// empty provider string degrades like an absent one.
pub fn resolve_name(template: &KeyName, layers: &LayerMap) -> KeyName {
    let mut segments = Vec::with_capacity(template.segments().len());
    for segment in template.segments() {
        match segment {
            Segment::Literal(text) => segments.push(Segment::Literal(text.clone())),
            Segment::Wildcard => segments.push(Segment::Wildcard),
            Segment::Placeholder(tag) => match layers.get(tag) {
                Some(current) => substitute(current, &mut segments),
                None => segments.push(Segment::Wildcard),
            },
        }
    }
    KeyName::from_parts(template.namespace(), segments)
}

fn substitute(current: &str, segments: &mut Vec<Segment>) {
    let mut pushed = false;
    for part in current.split('/').filter(|p| !p.is_empty()) {
        segments.push(Segment::Literal(part.to_string()));
        pushed = true;
    }
    if !pushed {
        segments.push(Segment::Wildcard);
    }
}
