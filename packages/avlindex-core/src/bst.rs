//! Unbalanced search tree kept as a baseline.
//!
//! Nothing here ever rotates: ascending input produces a right-leaning chain whose
//! depth equals its length. Every walk is a loop, so chains of any length are safe.

use std::cmp::Ordering;

use crate::arena::{Arena, InOrder, Linked, NodeRef};
use crate::avl::check_ascending;
use crate::error::{Error, Result};
use crate::traits::SearchTree;

#[derive(Debug)]
pub struct BstNode<T> {
    item: T,
    left: Option<NodeRef>,
    right: Option<NodeRef>,
}

impl<T> Linked for BstNode<T> {
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

#[derive(Debug)]
pub struct BstCore<T> {
    arena: Arena<BstNode<T>>,
    root: Option<NodeRef>,
}

impl<T> Default for BstCore<T> {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            root: None,
        }
    }
}

impl<T: Ord> BstCore<T> {
    /// Locates `key`, returning the node and the parent link that points at it.
    fn find_with_parent(&self, key: &T) -> Option<(NodeRef, Option<(NodeRef, Ordering)>)> {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(at) = cur {
            let node = self.arena.get(at);
            let side = key.cmp(&node.item);
            cur = match side {
                Ordering::Equal => return Some((at, parent)),
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            parent = Some((at, side));
        }
        None
    }

    fn relink(&mut self, parent: Option<(NodeRef, Ordering)>, child: Option<NodeRef>) {
        match parent {
            None => self.root = child,
            Some((at, Ordering::Less)) => self.arena.get_mut(at).left = child,
            Some((at, _)) => self.arena.get_mut(at).right = child,
        }
    }
}

impl<T: Ord> SearchTree for BstCore<T> {
    type Item = T;
    type Node = BstNode<T>;

    fn insert(&mut self, item: T) -> bool {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(at) = cur {
            let node = self.arena.get(at);
            let side = item.cmp(&node.item);
            cur = match side {
                Ordering::Equal => return false,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
            parent = Some((at, side));
        }
        let leaf = self.arena.alloc(BstNode {
            item,
            left: None,
            right: None,
        });
        self.relink(parent, Some(leaf));
        true
    }

    fn remove(&mut self, key: &T) -> Option<T> {
        let (target, parent) = self.find_with_parent(key)?;
        let (left, right) = {
            let node = self.arena.get(target);
            (node.left, node.right)
        };
        match (left, right) {
            (Some(_), Some(right)) => {
                let mut successor_parent = (target, Ordering::Greater);
                let mut successor = right;
                while let Some(next) = self.arena.get(successor).left {
                    successor_parent = (successor, Ordering::Less);
                    successor = next;
                }
                let (kept, dropped) = self.arena.pair_mut(target, successor);
                std::mem::swap(&mut kept.item, &mut dropped.item);
                let orphan = self.arena.get(successor).right;
                self.relink(Some(successor_parent), orphan);
                Some(self.arena.free(successor).item)
            }
            (only, None) | (None, only) => {
                self.relink(parent, only);
                Some(self.arena.free(target).item)
            }
        }
    }

    fn get(&self, key: &T) -> Option<&T> {
        self.find_with_parent(key)
            .map(|(at, _)| &self.arena.get(at).item)
    }

    fn replace(&mut self, item: T) -> std::result::Result<T, T> {
        match self.find_with_parent(&item) {
            Some((at, _)) => Ok(std::mem::replace(&mut self.arena.get_mut(at).item, item)),
            None => Err(item),
        }
    }

    fn iter(&self) -> InOrder<'_, BstNode<T>> {
        InOrder::new(&self.arena, self.root)
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeRef, usize)> = self.root.map(|at| (at, 1)).into_iter().collect();
        while let Some((at, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = self.arena.get(at);
            stack.extend(node.left.map(|l| (l, level + 1)));
            stack.extend(node.right.map(|r| (r, level + 1)));
        }
        deepest
    }

    fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    fn root_item(&self) -> Option<&T> {
        self.root.map(|at| &self.arena.get(at).item)
    }

    fn children(&self, key: &T) -> Option<(Option<&T>, Option<&T>)> {
        let (at, _) = self.find_with_parent(key)?;
        let node = self.arena.get(at);
        let item = |at: Option<NodeRef>| at.map(|at| &self.arena.get(at).item);
        Some((item(node.left), item(node.right)))
    }

    fn check_invariants(&self) -> Result<()> {
        let walked = self.iter().count();
        if walked != self.arena.len() {
            return Err(Error::InconsistentState(format!(
                "{} nodes allocated but {walked} reachable",
                self.arena.len()
            )));
        }
        check_ascending(self.iter())
    }
}
