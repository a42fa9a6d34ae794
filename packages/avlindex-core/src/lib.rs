#![forbid(unsafe_code)]
//! In-memory ordered index built on a height-balanced (AVL) search tree, guarded by a
//! single reader/writer gate, with encrypted whole-tree snapshots.
//!
//! An unbalanced search tree with the same surface is kept as a baseline so the cost of
//! skipping rebalancing can be measured on sorted input.

pub mod arena;
pub mod avl;
pub mod bst;
pub mod error;
#[cfg(feature = "persistence")]
pub mod snapshot;
pub mod traits;
pub mod tree;

pub use arena::{InOrder, Linked, NodeRef};
pub use avl::{AvlCore, AvlNode};
pub use bst::{BstCore, BstNode};
pub use error::{Error, Result};
#[cfg(feature = "persistence")]
pub use snapshot::SnapshotKey;
pub use traits::{
    AcceptAll, AuditAction, AuditEntry, AuditSink, MemoryAudit, NoopAudit, SearchTree,
    TracingAudit, Validator,
};
pub use tree::{AvlTree, BstTree, BulkLoadReport, GuardedTree};
