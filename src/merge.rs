//! Merge/import boundary: combine a base keyset with an incoming one.

use crate::error::MergeConflict;
use crate::keyset::Keyset;
use tracing::debug;

/// Conflict handling for [`merge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the base entry when both sides differ
    PreferBase,
    /// Take the incoming entry when both sides differ
    PreferIncoming,
    /// Report every differing name instead of producing a keyset
    FailOnConflict,
}

/// Merge `incoming` into a copy of `base`.
///
/// Names present on one side only are unioned. A name present on both sides
/// with an identical payload is kept as-is; differing payloads are a conflict
/// resolved per the strategy. Comparison is by exact rendered name, never
/// cascading.
pub fn merge(
    base: &Keyset,
    incoming: &Keyset,
    strategy: MergeStrategy,
) -> Result<Keyset, MergeConflict> {
    let mut merged = base.clone();
    let mut conflicts = Vec::new();

    for key in incoming.iter() {
        let name = key.name().to_string();
        match base.get(&name) {
            None => {
                merged.append(key.clone());
            }
            Some(existing) if existing.payload() == key.payload() => {}
            Some(_) => match strategy {
                MergeStrategy::PreferBase => {}
                MergeStrategy::PreferIncoming => {
                    merged.append(key.clone());
                }
                MergeStrategy::FailOnConflict => conflicts.push(name),
            },
        }
    }

    if conflicts.is_empty() {
        debug!(base = base.len(), incoming = incoming.len(), merged = merged.len(), "merged keysets");
        Ok(merged)
    } else {
        Err(MergeConflict { conflicts })
    }
}
