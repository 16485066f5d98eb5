//! Context domain: layer coordination, per-thread handles, and contextual values.
//! Owns the four-tier cache invalidation protocol; keysets and backends are
//! consumed through explicit contracts.

pub mod coordinator;
pub mod handle;
pub mod value;

pub use coordinator::Coordinator;
pub use handle::ContextHandle;
pub use value::{ContextualValue, ValueType};
