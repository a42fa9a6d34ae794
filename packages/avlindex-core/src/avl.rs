//! Height-balanced search tree.
//!
//! Insert and delete descend iteratively while recording the path on a heap stack,
//! then walk that path back up, reattaching each rebalanced subtree to its parent.
//! This is the same bottom-up retrace a recursive implementation performs on the way
//! out of the recursion.

use std::cmp::Ordering;

use crate::arena::{Arena, InOrder, Linked, NodeRef};
use crate::error::{Error, Result};
use crate::traits::SearchTree;

#[derive(Debug)]
pub struct AvlNode<T> {
    item: T,
    left: Option<NodeRef>,
    right: Option<NodeRef>,
    height: i32,
}

impl<T> AvlNode<T> {
    fn leaf(item: T) -> Self {
        Self {
            item,
            left: None,
            right: None,
            height: 1,
        }
    }
}

impl<T> Linked for AvlNode<T> {
    type Item = T;

    fn item(&self) -> &T {
        &self.item
    }

    fn left(&self) -> Option<NodeRef> {
        self.left
    }

    fn right(&self) -> Option<NodeRef> {
        self.right
    }
}

/// Path entry: a node and the side the descent left it through.
type Step = (NodeRef, Ordering);

#[derive(Debug)]
pub struct AvlCore<T> {
    arena: Arena<AvlNode<T>>,
    root: Option<NodeRef>,
}

impl<T> Default for AvlCore<T> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            root: None,
        }
    }
}

impl<T: Ord> AvlCore<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            root: None,
        }
    }

    /// In-order walk beginning at the first element `>= lower`.
    pub fn iter_from(&self, lower: &T) -> InOrder<'_, AvlNode<T>> {
        InOrder::starting_at(&self.arena, self.root, lower)
    }

    fn find(&self, key: &T) -> Option<NodeRef> {
        let mut cur = self.root;
        while let Some(at) = cur {
            let node = self.arena.get(at);
            cur = match key.cmp(&node.item) {
                Ordering::Equal => return Some(at),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        None
    }

    fn height(&self, at: Option<NodeRef>) -> i32 {
        at.map_or(0, |at| self.arena.get(at).height)
    }

    fn balance(&self, at: NodeRef) -> i32 {
        let node = self.arena.get(at);
        self.height(node.left) - self.height(node.right)
    }

    fn update_height(&mut self, at: NodeRef) {
        let node = self.arena.get(at);
        let height = 1 + self.height(node.left).max(self.height(node.right));
        self.arena.get_mut(at).height = height;
    }

    fn rotate_right(&mut self, y: NodeRef) -> NodeRef {
        let Some(x) = self.arena.get(y).left else {
            return y;
        };
        let t2 = self.arena.get(x).right;
        self.arena.get_mut(y).left = t2;
        self.arena.get_mut(x).right = Some(y);
        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: NodeRef) -> NodeRef {
        let Some(y) = self.arena.get(x).right else {
            return x;
        };
        let t2 = self.arena.get(y).left;
        self.arena.get_mut(x).right = t2;
        self.arena.get_mut(y).left = Some(x);
        self.update_height(x);
        self.update_height(y);
        y
    }

    /// Restores the balance invariant at `at`, returning the new subtree root.
    fn rebalance(&mut self, at: NodeRef) -> NodeRef {
        self.update_height(at);
        let balance = self.balance(at);
        if balance > 1 {
            if let Some(left) = self.arena.get(at).left {
                if self.balance(left) < 0 {
                    let left = self.rotate_left(left);
                    self.arena.get_mut(at).left = Some(left);
                }
            }
            return self.rotate_right(at);
        }
        if balance < -1 {
            if let Some(right) = self.arena.get(at).right {
                if self.balance(right) > 0 {
                    let right = self.rotate_right(right);
                    self.arena.get_mut(at).right = Some(right);
                }
            }
            return self.rotate_left(at);
        }
        at
    }

    /// Hangs `child` under the deepest step of `path`, then rebalances every
    /// ancestor up to the root. Returns the (possibly new) root.
    fn retrace(&mut self, path: Vec<Step>, mut child: Option<NodeRef>) -> Option<NodeRef> {
        for (at, side) in path.into_iter().rev() {
            let node = self.arena.get_mut(at);
            if side == Ordering::Less {
                node.left = child;
            } else {
                node.right = child;
            }
            child = Some(self.rebalance(at));
        }
        child
    }

    fn path_capacity(&self) -> usize {
        self.height(self.root) as usize + 1
    }
}

impl<T: Ord> SearchTree for AvlCore<T> {
    type Item = T;
    type Node = AvlNode<T>;

    fn insert(&mut self, item: T) -> bool {
        let mut path: Vec<Step> = Vec::with_capacity(self.path_capacity());
        let mut cur = self.root;
        while let Some(at) = cur {
            let node = self.arena.get(at);
            let side = item.cmp(&node.item);
            cur = match side {
                Ordering::Equal => return false,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            path.push((at, side));
        }
        let leaf = self.arena.alloc(AvlNode::leaf(item));
        self.root = self.retrace(path, Some(leaf));
        true
    }

    fn remove(&mut self, key: &T) -> Option<T> {
        let mut path: Vec<Step> = Vec::with_capacity(self.path_capacity());
        let mut cur = self.root;
        let target = loop {
            let at = cur?;
            let node = self.arena.get(at);
            let side = key.cmp(&node.item);
            cur = match side {
                Ordering::Equal => break at,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            path.push((at, side));
        };

        let (left, right) = {
            let node = self.arena.get(target);
            (node.left, node.right)
        };
        match (left, right) {
            (Some(_), Some(right)) => {
                // Pull the in-order successor's element up into `target`, then unlink
                // the successor, which has no left child.
                path.push((target, Ordering::Greater));
                let mut successor = right;
                while let Some(next) = self.arena.get(successor).left {
                    path.push((successor, Ordering::Less));
                    successor = next;
                }
                let (kept, dropped) = self.arena.pair_mut(target, successor);
                std::mem::swap(&mut kept.item, &mut dropped.item);
                let orphan = self.arena.get(successor).right;
                let removed = self.arena.free(successor).item;
                self.root = self.retrace(path, orphan);
                Some(removed)
            }
            (only, None) | (None, only) => {
                let removed = self.arena.free(target).item;
                self.root = self.retrace(path, only);
                Some(removed)
            }
        }
    }

    fn get(&self, key: &T) -> Option<&T> {
        self.find(key).map(|at| &self.arena.get(at).item)
    }

    fn replace(&mut self, item: T) -> std::result::Result<T, T> {
        match self.find(&item) {
            Some(at) => Ok(std::mem::replace(&mut self.arena.get_mut(at).item, item)),
            None => Err(item),
        }
    }

    fn iter(&self) -> InOrder<'_, AvlNode<T>> {
        InOrder::new(&self.arena, self.root)
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn depth(&self) -> usize {
        self.height(self.root) as usize
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    fn root_item(&self) -> Option<&T> {
        self.root.map(|at| &self.arena.get(at).item)
    }

    fn children(&self, key: &T) -> Option<(Option<&T>, Option<&T>)> {
        let node = self.arena.get(self.find(key)?);
        let item = |at: Option<NodeRef>| at.map(|at| &self.arena.get(at).item);
        Some((item(node.left), item(node.right)))
    }

    fn check_invariants(&self) -> Result<()> {
        let mut reachable = 0usize;
        let mut stack: Vec<NodeRef> = self.root.into_iter().collect();
        while let Some(at) = stack.pop() {
            reachable += 1;
            let node = self.arena.get(at);
            let (lh, rh) = (self.height(node.left), self.height(node.right));
            if node.height != 1 + lh.max(rh) {
                return Err(Error::InconsistentState(format!(
                    "stale height {} (children {lh}/{rh})",
                    node.height
                )));
            }
            if (lh - rh).abs() > 1 {
                return Err(Error::InconsistentState(format!(
                    "balance factor {} out of range",
                    lh - rh
                )));
            }
            stack.extend(node.left);
            stack.extend(node.right);
        }
        if reachable != self.arena.len() {
            return Err(Error::InconsistentState(format!(
                "{} nodes allocated but {reachable} reachable",
                self.arena.len()
            )));
        }
        check_ascending(self.iter())
    }
}

/// Fails unless the walk is strictly ascending, which also rules out duplicates.
pub(crate) fn check_ascending<'a, T: Ord + 'a>(mut items: impl Iterator<Item = &'a T>) -> Result<()> {
    let Some(mut prev) = items.next() else {
        return Ok(());
    };
    for item in items {
        if prev >= item {
            return Err(Error::InconsistentState(
                "in-order walk is not strictly ascending".into(),
            ));
        }
        prev = item;
    }
    Ok(())
}
