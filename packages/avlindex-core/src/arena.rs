//! Slot arena that owns every node of a tree.
//!
//! Children are addressed by [`NodeRef`] instead of boxed pointers, so rotations and
//! splices are index reassignments and tearing down a degenerate chain never recurses.

use std::cmp::Ordering;

/// Index of a node inside its [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shape shared by the AVL and BST nodes, enough to walk a tree in order.
pub trait Linked {
    type Item;

    fn item(&self) -> &Self::Item;
    fn left(&self) -> Option<NodeRef>;
    fn right(&self) -> Option<NodeRef>;
}

#[derive(Debug)]
enum Slot<N> {
    Occupied(N),
    Vacant { next_free: Option<u32> },
}

#[derive(Debug)]
pub struct Arena<N> {
    slots: Vec<Slot<N>>,
    free_head: Option<u32>,
    len: usize,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }
}

impl<N> Arena<N> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    pub fn alloc(&mut self, node: N) -> NodeRef {
        self.len += 1;
        if let Some(idx) = self.free_head {
            let slot = &mut self.slots[idx as usize];
            if let Slot::Vacant { next_free } = *slot {
                self.free_head = next_free;
            }
            *slot = Slot::Occupied(node);
            return NodeRef(idx);
        }
        let idx = u32::try_from(self.slots.len()).unwrap_or_else(|_| {
            panic!("node arena exceeded {} slots", u32::MAX)
        });
        self.slots.push(Slot::Occupied(node));
        NodeRef(idx)
    }

    /// Releases the slot and hands the node back to the caller.
    pub fn free(&mut self, at: NodeRef) -> N {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match std::mem::replace(&mut self.slots[at.index()], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(at.0);
                self.len -= 1;
                node
            }
            Slot::Vacant { .. } => panic!("double free of arena slot {}", at.0),
        }
    }

    pub fn get(&self, at: NodeRef) -> &N {
        match &self.slots[at.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling node reference {}", at.0),
        }
    }

    pub fn get_mut(&mut self, at: NodeRef) -> &mut N {
        match &mut self.slots[at.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling node reference {}", at.0),
        }
    }

    /// Mutable access to two distinct nodes at once.
    pub fn pair_mut(&mut self, a: NodeRef, b: NodeRef) -> (&mut N, &mut N) {
        assert_ne!(a, b, "pair_mut requires distinct nodes");
        let (lo, hi, swapped) = if a.index() < b.index() {
            (a.index(), b.index(), false)
        } else {
            (b.index(), a.index(), true)
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let first = match &mut head[lo] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling node reference {lo}"),
        };
        let second = match &mut tail[0] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => panic!("dangling node reference {hi}"),
        };
        if swapped {
            (second, first)
        } else {
            (first, second)
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.len = 0;
    }
}

/// In-order walk over an arena-backed tree using a heap-allocated stack.
pub struct InOrder<'a, N> {
    arena: &'a Arena<N>,
    stack: Vec<NodeRef>,
}

impl<'a, N: Linked> InOrder<'a, N> {
    pub fn new(arena: &'a Arena<N>, root: Option<NodeRef>) -> Self {
        let mut iter = Self {
            arena,
            stack: Vec::new(),
        };
        iter.push_left_spine(root);
        iter
    }

    /// Starts at the first element that is not less than `lower`, skipping every
    /// subtree that lies entirely below it.
    pub fn starting_at(arena: &'a Arena<N>, root: Option<NodeRef>, lower: &N::Item) -> Self
    where
        N::Item: Ord,
    {
        let mut stack = Vec::new();
        let mut cur = root;
        while let Some(at) = cur {
            let node = arena.get(at);
            match node.item().cmp(lower) {
                Ordering::Less => cur = node.right(),
                Ordering::Equal => {
                    stack.push(at);
                    break;
                }
                Ordering::Greater => {
                    stack.push(at);
                    cur = node.left();
                }
            }
        }
        Self { arena, stack }
    }

    fn push_left_spine(&mut self, mut cur: Option<NodeRef>) {
        while let Some(at) = cur {
            self.stack.push(at);
            cur = self.arena.get(at).left();
        }
    }
}

impl<'a, N: Linked> Iterator for InOrder<'a, N> {
    type Item = &'a N::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let at = self.stack.pop()?;
        let node = self.arena.get(at);
        self.push_left_spine(node.right());
        Some(node.item())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(u32);

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = Arena::default();
        let a = arena.alloc(Leaf(1));
        let b = arena.alloc(Leaf(2));
        assert_eq!(arena.len(), 2);

        assert_eq!(arena.free(a).0, 1);
        let c = arena.alloc(Leaf(3));
        assert_eq!(c, a);
        assert_eq!(arena.get(c).0, 3);
        assert_eq!(arena.get(b).0, 2);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn pair_mut_returns_requested_order() {
        let mut arena = Arena::default();
        let a = arena.alloc(Leaf(1));
        let b = arena.alloc(Leaf(2));
        let (x, y) = arena.pair_mut(b, a);
        assert_eq!((x.0, y.0), (2, 1));
        std::mem::swap(&mut x.0, &mut y.0);
        assert_eq!(arena.get(a).0, 2);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_panics() {
        let mut arena = Arena::default();
        let a = arena.alloc(Leaf(1));
        arena.free(a);
        arena.free(a);
    }
}
