//! Branch store: the durable routing state
//!
//! TigerStyle: One trait at the persistence seam, explicit operations,
//! atomic where the routing semantics demand it.
//!
//! Branch rows are the durable routing state: each carries the running
//! centroid, its parent link, and last-update bookkeeping. The
//! [`BranchStore`] trait names exactly the operations the routing pipeline
//! needs; [`MemoryStore`] is the in-process backend used by tests and
//! single-node deployments. Durable backends plug in behind the same trait.

pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{BranchStore, NewBranch, NewMessage};
pub use types::{Branch, BranchSummary, Conversation, DriftType, FactRecord, MessageRecord, Role};
