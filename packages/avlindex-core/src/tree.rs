use std::cmp::Ordering;
use std::fmt;

use parking_lot::RwLock;

use crate::avl::AvlCore;
use crate::bst::BstCore;
use crate::error::{Error, Result};
use crate::traits::{AcceptAll, AuditAction, AuditEntry, AuditSink, NoopAudit, SearchTree, Validator};

/// Balanced index; the engine meant for real use.
pub type AvlTree<T, V = AcceptAll, A = NoopAudit> = GuardedTree<AvlCore<T>, V, A>;

/// Unbalanced baseline with the same surface minus range and paging.
pub type BstTree<T, V = AcceptAll, A = NoopAudit> = GuardedTree<BstCore<T>, V, A>;

/// Outcome of a [`GuardedTree::bulk_load`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BulkLoadReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub rejected: usize,
}

/// A search tree behind a single reader/writer gate, wired to a validator and an
/// audit sink.
///
/// Reads (`find`, `range_query`, `page`, `sorted_snapshot`, `save`) share the gate;
/// mutations (`insert`, `remove`, `update`, `bulk_load`, `load`) hold it
/// exclusively, so readers never observe a half-applied rotation or splice. The
/// gate is released before the audit sink is notified.
pub struct GuardedTree<C, V = AcceptAll, A = NoopAudit> {
    pub(crate) core: RwLock<C>,
    validator: V,
    audit: A,
}

impl<C: SearchTree> GuardedTree<C> {
    pub fn new() -> Self {
        Self::with_hooks(AcceptAll, NoopAudit)
    }
}

impl<C: SearchTree> Default for GuardedTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SearchTree, V, A> GuardedTree<C, V, A> {
    pub fn with_hooks(validator: V, audit: A) -> Self {
        Self {
            core: RwLock::new(C::default()),
            validator,
            audit,
        }
    }
}

impl<C, V, A> GuardedTree<C, V, A>
where
    C: SearchTree,
    C::Item: Clone + fmt::Display,
    V: Validator<C::Item>,
    A: AuditSink,
{
    /// Adds `element`. Returns `Ok(false)` without touching the tree when an equal
    /// element is already stored; the stored one is kept.
    pub fn insert(&self, element: C::Item) -> Result<bool> {
        let subject = element.to_string();
        if !self.validator.accepts(&element) {
            self.notify(AuditAction::Error, &subject, "insert rejected: invalid element");
            return Err(Error::Rejected(subject));
        }
        let inserted = self.core.write().insert(element);
        if inserted {
            self.notify(AuditAction::Add, &subject, "inserted");
        } else {
            self.notify(AuditAction::Add, &subject, "already present, left unchanged");
        }
        Ok(inserted)
    }

    /// Removes and returns the element equal to `key`.
    pub fn remove(&self, key: &C::Item) -> Option<C::Item> {
        let removed = self.core.write().remove(key);
        match &removed {
            Some(element) => self.notify(AuditAction::Remove, element, "removed"),
            None => self.notify(AuditAction::Error, key, "remove failed: not found"),
        }
        removed
    }

    /// Replaces the element equal to `old_key` with `element`.
    ///
    /// When the key is unchanged the payload is swapped in place. Otherwise the old
    /// element is removed and the new one inserted under one write acquisition, so no
    /// reader sees the intermediate state. Returns `Ok(false)` if `old_key` is absent
    /// and `DuplicateKey` if the new key already belongs to another element.
    pub fn update(&self, old_key: &C::Item, element: C::Item) -> Result<bool> {
        let subject = element.to_string();
        if !self.validator.accepts(&element) {
            self.notify(AuditAction::Error, &subject, "update rejected: invalid element");
            return Err(Error::Rejected(subject));
        }
        let outcome = {
            let mut core = self.core.write();
            if old_key.cmp(&element) == Ordering::Equal {
                Ok(core.replace(element).is_ok())
            } else if core.get(old_key).is_none() {
                Ok(false)
            } else if core.get(&element).is_some() {
                Err(Error::DuplicateKey(subject.clone()))
            } else {
                core.remove(old_key);
                Ok(core.insert(element))
            }
        };
        match &outcome {
            Ok(true) => self.notify(
                AuditAction::Update,
                &subject,
                &format!("updated from {old_key}"),
            ),
            Ok(false) => self.notify(AuditAction::Error, old_key, "update failed: not found"),
            Err(_) => self.notify(AuditAction::Error, &subject, "update failed: key already taken"),
        }
        outcome
    }

    /// Looks up the element equal to `key`.
    pub fn find(&self, key: &C::Item) -> Option<C::Item> {
        let found = self.core.read().get(key).cloned();
        match &found {
            Some(element) => self.notify(AuditAction::Search, element, "found"),
            None => self.notify(AuditAction::Search, key, "not found"),
        }
        found
    }

    pub fn contains(&self, key: &C::Item) -> bool {
        self.core.read().get(key).is_some()
    }

    /// Every element in ascending order.
    pub fn sorted_snapshot(&self) -> Vec<C::Item> {
        self.core.read().iter().cloned().collect()
    }

    /// Inserts a whole batch under one write acquisition without per-element audit
    /// entries.
    ///
    /// Rejected and duplicate elements are skipped and only counted, so one bad
    /// record never aborts the batch. Single-element APIs still surface every
    /// failure.
    pub fn bulk_load<I>(&self, elements: I) -> BulkLoadReport
    where
        I: IntoIterator<Item = C::Item>,
    {
        let mut report = BulkLoadReport::default();
        {
            let mut core = self.core.write();
            for element in elements {
                if !self.validator.accepts(&element) {
                    report.rejected += 1;
                } else if core.insert(element) {
                    report.inserted += 1;
                } else {
                    report.duplicates += 1;
                }
            }
        }
        tracing::debug!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            rejected = report.rejected,
            "bulk load finished"
        );
        report
    }

    pub fn len(&self) -> usize {
        self.core.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.read().is_empty()
    }

    /// Nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.core.read().depth()
    }

    pub fn clear(&self) {
        self.core.write().clear();
    }

    /// Runs `f` against the unguarded core while holding the read gate.
    pub fn read<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.core.read())
    }

    /// Validate ordering and (for the balanced core) height and balance invariants.
    /// Intended for tests and debugging.
    pub fn validate_invariants(&self) -> Result<()> {
        self.core.read().check_invariants()
    }

    fn notify(&self, action: AuditAction, subject: &dyn fmt::Display, detail: &str) {
        let entry = AuditEntry::new(action, subject.to_string(), detail);
        if let Err(err) = self.audit.record(&entry) {
            tracing::warn!(action = %action, error = %err, "audit sink failed; entry dropped");
        }
    }
}

impl<T, V, A> GuardedTree<AvlCore<T>, V, A>
where
    T: Ord + Clone + fmt::Display,
    V: Validator<T>,
    A: AuditSink,
{
    /// Elements `e` with `min <= e <= max`, ascending. Subtrees entirely below `min`
    /// are never visited and the walk stops at the first element above `max`.
    pub fn range_query(&self, min: &T, max: &T) -> Vec<T> {
        if min > max {
            return Vec::new();
        }
        self.core
            .read()
            .iter_from(min)
            .take_while(|element| *element <= max)
            .cloned()
            .collect()
    }

    /// One page of the ascending sequence. `page_index` is 1-based; index 0 or a
    /// zero `page_size` yields an empty page.
    pub fn page(&self, page_index: usize, page_size: usize) -> Vec<T> {
        if page_index == 0 || page_size == 0 {
            return Vec::new();
        }
        let Some(offset) = (page_index - 1).checked_mul(page_size) else {
            return Vec::new();
        };
        self.core
            .read()
            .iter()
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect()
    }
}
