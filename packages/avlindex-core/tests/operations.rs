use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use avlindex_core::{
    AcceptAll, AuditAction, AuditEntry, AuditSink, AvlTree, BstTree, Error, MemoryAudit,
    SearchTree,
};

/// Ordered by `id` only, so lookups can use a placeholder with an empty name.
#[derive(Clone, Debug)]
struct Person {
    id: String,
    name: String,
}

impl Person {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn key(id: &str) -> Self {
        Self::new(id, "")
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl PartialOrd for Person {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Person {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ID: {}] {}", self.id, self.name)
    }
}

fn ids(people: &[Person]) -> Vec<&str> {
    people.iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn find_after_insert_and_after_remove() {
    let tree = AvlTree::new();
    tree.insert(Person::new("001", "An")).unwrap();

    assert_eq!(tree.find(&Person::key("001")).unwrap().name, "An");
    assert_eq!(tree.remove(&Person::key("001")).unwrap().name, "An");
    assert!(tree.find(&Person::key("001")).is_none());
    assert!(tree.remove(&Person::key("001")).is_none());
}

#[test]
fn removing_only_element_leaves_empty_tree() {
    let tree = AvlTree::new();
    tree.insert(7u32).unwrap();
    assert_eq!(tree.remove(&7), Some(7));
    assert!(tree.is_empty());
    assert_eq!(tree.depth(), 0);
    for key in [0, 7, 100] {
        assert_eq!(tree.find(&key), None);
    }
    tree.validate_invariants().unwrap();
}

#[test]
fn duplicate_insert_keeps_first_element() {
    let tree = AvlTree::new();
    assert!(tree.insert(Person::new("001", "An")).unwrap());
    assert!(tree.insert(Person::new("002", "Binh")).unwrap());
    let before = tree.sorted_snapshot();

    assert!(!tree.insert(Person::new("001", "Someone Else")).unwrap());

    let after = tree.sorted_snapshot();
    assert_eq!(after.len(), before.len());
    assert_eq!(ids(&after), ids(&before));
    assert_eq!(tree.find(&Person::key("001")).unwrap().name, "An");
}

#[test]
fn validator_rejects_without_mutation() {
    let audit = MemoryAudit::new();
    let tree = AvlTree::with_hooks(|p: &Person| p.name.len() >= 2, audit.clone());

    let err = tree.insert(Person::new("001", "A")).unwrap_err();
    assert!(matches!(err, Error::Rejected(_)));
    assert!(tree.is_empty());
    assert_eq!(audit.actions(), vec![AuditAction::Error]);

    tree.insert(Person::new("001", "An")).unwrap();
    let err = tree
        .update(&Person::key("001"), Person::new("001", "B"))
        .unwrap_err();
    assert!(matches!(err, Error::Rejected(_)));
    assert_eq!(tree.find(&Person::key("001")).unwrap().name, "An");
}

#[test]
fn update_in_place_keeps_shape() {
    let tree = AvlTree::new();
    for (id, name) in [("050", "a"), ("030", "b"), ("070", "c")] {
        tree.insert(Person::new(id, name)).unwrap();
    }

    assert!(tree.update(&Person::key("030"), Person::new("030", "renamed")).unwrap());
    assert_eq!(tree.find(&Person::key("030")).unwrap().name, "renamed");
    let root = tree.read(|core| core.root_item().map(|p| p.id.clone()));
    assert_eq!(root.as_deref(), Some("050"));
}

#[test]
fn update_with_new_key_moves_element() {
    let tree = AvlTree::new();
    for id in ["010", "020", "030"] {
        tree.insert(Person::new(id, "x")).unwrap();
    }

    assert!(tree.update(&Person::key("010"), Person::new("040", "moved")).unwrap());
    assert!(tree.find(&Person::key("010")).is_none());
    assert_eq!(tree.find(&Person::key("040")).unwrap().name, "moved");
    assert_eq!(ids(&tree.sorted_snapshot()), vec!["020", "030", "040"]);
    tree.validate_invariants().unwrap();
}

#[test]
fn update_reports_missing_and_conflicting_keys() {
    let tree = AvlTree::new();
    for id in ["010", "020"] {
        tree.insert(Person::new(id, "x")).unwrap();
    }

    assert!(!tree.update(&Person::key("099"), Person::new("099", "y")).unwrap());
    assert!(!tree.update(&Person::key("099"), Person::new("098", "y")).unwrap());

    let err = tree
        .update(&Person::key("010"), Person::new("020", "clash"))
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey(_)));
    assert_eq!(tree.find(&Person::key("010")).unwrap().name, "x");
    assert_eq!(tree.find(&Person::key("020")).unwrap().name, "x");
    assert_eq!(tree.len(), 2);
}

#[test]
fn audit_sees_every_single_item_operation() {
    let audit = MemoryAudit::new();
    let tree = AvlTree::with_hooks(AcceptAll, audit.clone());

    tree.insert(Person::new("001", "An")).unwrap();
    tree.find(&Person::key("001"));
    tree.find(&Person::key("404"));
    tree.update(&Person::key("001"), Person::new("002", "An")).unwrap();
    tree.remove(&Person::key("002"));
    tree.remove(&Person::key("002"));

    assert_eq!(
        audit.actions(),
        vec![
            AuditAction::Add,
            AuditAction::Search,
            AuditAction::Search,
            AuditAction::Update,
            AuditAction::Remove,
            AuditAction::Error,
        ]
    );
    let entries = audit.entries();
    assert_eq!(entries[0].subject, "[ID: 001] An");
    assert_eq!(entries[1].detail, "found");
    assert_eq!(entries[2].detail, "not found");
}

/// Sink that fails every write, like a full disk under a file log.
#[derive(Default)]
struct FailingAudit {
    calls: AtomicUsize,
}

impl AuditSink for FailingAudit {
    fn record(&self, _entry: &AuditEntry) -> avlindex_core::Result<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        Err(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")))
    }
}

#[test]
fn failing_audit_sink_never_changes_outcomes() {
    let sink = Arc::new(FailingAudit::default());
    let tree = AvlTree::with_hooks(AcceptAll, Arc::clone(&sink));

    assert!(tree.insert(Person::new("005", "Eve")).unwrap());
    assert!(!tree.insert(Person::new("005", "Dup")).unwrap());
    assert_eq!(tree.find(&Person::key("005")).unwrap().name, "Eve");
    assert!(tree.find(&Person::key("404")).is_none());
    assert!(tree.update(&Person::key("005"), Person::new("007", "Eve")).unwrap());
    assert!(!tree.update(&Person::key("404"), Person::new("405", "Nobody")).unwrap());
    assert!(tree.insert(Person::new("009", "Ian")).unwrap());
    assert_eq!(tree.remove(&Person::key("009")).unwrap().name, "Ian");
    assert!(tree.remove(&Person::key("009")).is_none());

    assert_eq!(ids(&tree.sorted_snapshot()), ["007"]);
    tree.validate_invariants().unwrap();
    assert_eq!(sink.calls.load(AtomicOrdering::SeqCst), 9);
}

#[test]
fn bulk_load_skips_audit_and_counts_outcomes() {
    let audit = MemoryAudit::new();
    let tree = AvlTree::with_hooks(|n: &u32| n % 10 != 0, audit.clone());

    let report = tree.bulk_load((1..=25).chain([3, 5]));
    assert_eq!(report.inserted, 23);
    assert_eq!(report.rejected, 2);
    assert_eq!(report.duplicates, 2);
    assert!(audit.is_empty());
    assert_eq!(tree.len(), 23);
    tree.validate_invariants().unwrap();
}

#[test]
fn range_query_is_inclusive_and_ordered() {
    let tree = AvlTree::new();
    tree.bulk_load((1..=50u32).map(|n| n * 2));

    assert_eq!(tree.range_query(&10, &20), vec![10, 12, 14, 16, 18, 20]);
    assert_eq!(tree.range_query(&11, &15), vec![12, 14]);
    assert_eq!(tree.range_query(&0, &3), vec![2]);
    assert_eq!(tree.range_query(&99, &1000), vec![100]);
    assert!(tree.range_query(&20, &10).is_empty());
    assert!(tree.range_query(&101, &200).is_empty());
}

#[test]
fn pages_walk_the_sorted_sequence() {
    let tree = AvlTree::new();
    tree.bulk_load((1..=23u32).rev());

    assert_eq!(tree.page(1, 10), (1..=10).collect::<Vec<_>>());
    assert_eq!(tree.page(2, 10), (11..=20).collect::<Vec<_>>());
    assert_eq!(tree.page(3, 10), vec![21, 22, 23]);
    assert!(tree.page(4, 10).is_empty());
    assert!(tree.page(0, 10).is_empty());
    assert!(tree.page(1, 0).is_empty());
    assert!(tree.page(usize::MAX, usize::MAX).is_empty());
}

#[test]
fn baseline_supports_the_same_crud_surface() {
    let audit = MemoryAudit::new();
    let tree = BstTree::with_hooks(|p: &Person| !p.name.is_empty(), audit.clone());

    for id in ["050", "030", "070", "060"] {
        tree.insert(Person::new(id, "x")).unwrap();
    }
    assert!(tree.insert(Person::key("080")).is_err());
    assert!(!tree.insert(Person::new("050", "dup")).unwrap());

    assert!(tree.update(&Person::key("060"), Person::new("065", "y")).unwrap());
    assert!(tree.remove(&Person::key("050")).is_some());
    assert_eq!(ids(&tree.sorted_snapshot()), vec!["030", "065", "070"]);
    assert_eq!(tree.find(&Person::key("065")).unwrap().name, "y");
    tree.validate_invariants().unwrap();
    assert_eq!(audit.actions().first(), Some(&AuditAction::Add));
}

#[test]
fn clear_empties_the_tree() {
    let tree = AvlTree::new();
    tree.bulk_load(0..100u32);
    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.sorted_snapshot().is_empty());
    assert!(tree.insert(1).unwrap());
}
