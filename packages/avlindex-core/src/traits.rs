use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::arena::{InOrder, Linked};
use crate::error::Result;

/// Unguarded ordered-tree algorithms. Implementations own their nodes and know
/// nothing about locking, validation, or auditing.
pub trait SearchTree: Default {
    type Item: Ord;
    type Node: Linked<Item = Self::Item>;

    /// Adds `item` unless an equal element is present. Returns `false` (and drops
    /// `item`) on a duplicate.
    fn insert(&mut self, item: Self::Item) -> bool;
    fn remove(&mut self, key: &Self::Item) -> Option<Self::Item>;
    fn get(&self, key: &Self::Item) -> Option<&Self::Item>;
    /// Swaps in `item` over the element comparing equal to it without touching the
    /// tree shape. Hands `item` back if no such element exists.
    fn replace(&mut self, item: Self::Item) -> std::result::Result<Self::Item, Self::Item>;
    fn iter(&self) -> InOrder<'_, Self::Node>;
    fn len(&self) -> usize;
    /// Nodes on the longest root-to-leaf path; 0 when empty.
    fn depth(&self) -> usize;
    fn clear(&mut self);
    fn root_item(&self) -> Option<&Self::Item>;
    /// Elements held by the left and right children of the node equal to `key`.
    fn children(&self, key: &Self::Item) -> Option<(Option<&Self::Item>, Option<&Self::Item>)>;
    fn check_invariants(&self) -> Result<()>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Admission check consulted before any element enters the tree.
pub trait Validator<T>: Send + Sync {
    fn accepts(&self, element: &T) -> bool;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn accepts(&self, element: &T) -> bool {
        self(element)
    }
}

/// Admits everything; the default when no validation is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<T> Validator<T> for AcceptAll {
    fn accepts(&self, _element: &T) -> bool {
        true
    }
}

/// What an audit entry is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Add,
    Remove,
    Update,
    Search,
    Error,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Add => "ADD",
            AuditAction::Remove => "REMOVE",
            AuditAction::Update => "UPDATE",
            AuditAction::Search => "SEARCH",
            AuditAction::Error => "ERROR",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub subject: String,
    pub detail: String,
}

impl AuditEntry {
    pub fn new(action: AuditAction, subject: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            action,
            subject: subject.into(),
            detail: detail.into(),
        }
    }
}

/// One-way sink for engine activity.
///
/// Sinks are purely observational: the engine never changes tree state based on
/// what a sink does, and an `Err` from `record` is logged and dropped.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditEntry) -> Result<()>;
}

impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        (**self).record(entry)
    }
}

/// Discards every entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAudit;

impl AuditSink for NoopAudit {
    fn record(&self, _entry: &AuditEntry) -> Result<()> {
        Ok(())
    }
}

/// Forwards entries to `tracing` under the `avlindex::audit` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        match entry.action {
            AuditAction::Error => tracing::warn!(
                target: "avlindex::audit",
                action = %entry.action,
                subject = %entry.subject,
                "{}",
                entry.detail
            ),
            _ => tracing::info!(
                target: "avlindex::audit",
                action = %entry.action,
                subject = %entry.subject,
                "{}",
                entry.detail
            ),
        }
        Ok(())
    }
}

/// In-memory buffer of entries. Clones share the same buffer, which makes it handy
/// for inspecting what an engine reported from the outside.
#[derive(Clone, Debug, Default)]
pub struct MemoryAudit {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.entries.lock().iter().map(|e| e.action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, entry: &AuditEntry) -> Result<()> {
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
