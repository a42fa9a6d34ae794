use avlindex_core::{AvlTree, BstTree, SearchTree};

fn sorted_ids(n: u32) -> Vec<String> {
    (1..=n).map(|i| format!("{i:012}")).collect()
}

#[test]
fn sorted_input_chains_the_baseline_but_not_the_avl() {
    let n = 2_000u32;
    let bst = BstTree::new();
    let avl = AvlTree::new();
    bst.bulk_load(sorted_ids(n));
    avl.bulk_load(sorted_ids(n));

    assert_eq!(bst.depth(), n as usize);
    let bound = (1.44 * f64::from(n + 2).log2()).ceil() as usize;
    assert!(avl.depth() <= bound, "avl depth {} > {bound}", avl.depth());

    assert_eq!(bst.sorted_snapshot(), avl.sorted_snapshot());
    avl.validate_invariants().unwrap();
    bst.validate_invariants().unwrap();
}

#[test]
fn three_key_insert_shapes() {
    let avl = AvlTree::new();
    let bst = BstTree::new();
    for key in ["072", "061", "085"] {
        avl.insert(key).unwrap();
        bst.insert(key).unwrap();
    }
    assert_eq!(avl.read(|c| c.root_item().copied()), Some("072"));
    assert_eq!(avl.read(|c| c.children(&"072").map(|(l, r)| (l.copied(), r.copied()))), Some((Some("061"), Some("085"))));
    assert_eq!(bst.read(|c| c.root_item().copied()), Some("072"));
}

#[test]
fn skewed_sequence_rotates_avl_and_chains_bst() {
    let keys = ["061", "072", "085", "090", "095"];
    let avl = AvlTree::new();
    let bst = BstTree::new();
    for key in keys {
        avl.insert(key).unwrap();
        bst.insert(key).unwrap();
    }

    assert_eq!(avl.read(|c| c.root_item().copied()), Some("072"));
    assert_eq!(avl.depth(), 3);
    assert_eq!(bst.read(|c| c.root_item().copied()), Some("061"));
    assert_eq!(bst.read(|c| c.children(&"061").map(|(l, _)| l.is_none())), Some(true));
    assert_eq!(bst.depth(), 5);
}

#[test]
fn removing_from_a_long_chain_does_not_recurse() {
    let bst = BstTree::new();
    bst.bulk_load(0..5_000u32);
    for key in (0..5_000u32).step_by(2) {
        assert_eq!(bst.remove(&key), Some(key));
    }
    assert_eq!(bst.len(), 2_500);
    assert_eq!(bst.depth(), 2_500);
    bst.validate_invariants().unwrap();
}
