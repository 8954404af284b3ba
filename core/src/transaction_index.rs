//! Ordered transaction index: one per customer.
//!
//! A B-tree of minimum degree MIN_DEGREE keyed by `time_key`.
//!
//! RULES:
//!   - Insertion is top-down: any full node is split *before* it is
//!     entered, so no call ever descends into a full node.
//!   - Non-root nodes hold MIN_DEGREE-1 ..= MAX_KEYS keys.
//!   - All leaves sit at the same depth.
//!   - The index never rejects a key. Duplicate ids are the caller's problem.

use crate::{
    transaction::Transaction,
    types::{TimeKey, Timestamp, TransactionId},
};
use thiserror::Error;

/// Minimum degree `t`.
pub const MIN_DEGREE: usize = 3;
/// `2t - 1`
pub const MAX_KEYS: usize = 2 * MIN_DEGREE - 1;
/// `2t`
pub const MAX_CHILDREN: usize = 2 * MIN_DEGREE;

// ── Node ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Node {
    keys:     Vec<Transaction>,
    children: Vec<Box<Node>>,
    is_leaf:  bool,
    /// Keys in this subtree, this node included.
    size:     usize,
}

impl Node {
    fn new(is_leaf: bool) -> Self {
        Self {
            keys:     Vec::with_capacity(MAX_KEYS),
            children: if is_leaf { Vec::new() } else { Vec::with_capacity(MAX_CHILDREN) },
            is_leaf,
            size: 0,
        }
    }

    /// Keys in ascending `time_key` order.
    pub fn keys(&self) -> &[Transaction] {
        &self.keys
    }

    /// Children left to right. Empty for leaves.
    pub fn children(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.children.iter().map(|c| c.as_ref())
    }

    pub fn is_leaf(&self) -> bool {
        self.is_leaf
    }

    /// Number of keys held by this node alone.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys held by this node and every node below it.
    pub fn subtree_len(&self) -> usize {
        self.size
    }

    fn is_full(&self) -> bool {
        self.keys.len() == MAX_KEYS
    }

    /// Split the full child at position `i`. `self` must not be full.
    ///
    /// The child keeps keys `[0, t-1)`, the median `keys[t-1]` moves up to
    /// `self.keys[i]`, and the new right sibling at `children[i+1]` takes
    /// keys `[t, 2t-1)` plus, for internal children, children `[t, 2t]`.
    fn split_child(&mut self, i: usize) {
        debug_assert!(!self.is_full(), "split_child on a full parent");
        let y = &mut self.children[i];
        debug_assert!(y.is_full(), "split_child on a non-full child");

        let mut z = Node::new(y.is_leaf);
        let mut upper = y.keys.split_off(MIN_DEGREE - 1);
        let median = upper.remove(0);
        z.keys = upper;
        if !y.is_leaf {
            z.children = y.children.split_off(MIN_DEGREE);
        }
        z.size = z.keys.len() + z.children.iter().map(|c| c.size).sum::<usize>();
        y.size -= z.size + 1;

        self.children.insert(i + 1, Box::new(z));
        self.keys.insert(i, median);
    }

    /// Place `txn` in the subtree rooted here. `self` must not be full.
    /// Equal time keys land after the existing ones.
    fn insert_non_full(&mut self, txn: Transaction) {
        self.size += 1;
        let mut i = self.keys.partition_point(|k| k.time_key() <= txn.time_key());

        if self.is_leaf {
            self.keys.insert(i, txn);
            return;
        }

        if self.children[i].is_full() {
            self.split_child(i);
            if txn.time_key() >= self.keys[i].time_key() {
                i += 1;
            }
        }
        self.children[i].insert_non_full(txn);
    }

    fn in_order<'a, F: FnMut(&'a Transaction)>(&'a self, visit: &mut F) {
        for (i, key) in self.keys.iter().enumerate() {
            if !self.is_leaf {
                self.children[i].in_order(visit);
            }
            visit(key);
        }
        if !self.is_leaf {
            self.children[self.keys.len()].in_order(visit);
        }
    }

    fn find_by_id(&self, id: TransactionId) -> Option<&Transaction> {
        for (i, key) in self.keys.iter().enumerate() {
            if !self.is_leaf {
                if let Some(found) = self.children[i].find_by_id(id) {
                    return Some(found);
                }
            }
            if key.id() == id {
                return Some(key);
            }
        }
        if self.is_leaf {
            return None;
        }
        self.children[self.keys.len()].find_by_id(id)
    }

    /// Keys with `date_time >= cutoff` in this subtree.
    ///
    /// Relies on `date_time` being non-decreasing in `time_key` order:
    /// children left of the first qualifying key are skipped outright and
    /// children right of it contribute their stored size. Only one child
    /// per level is descended, so the cost is O(height * MAX_KEYS).
    fn count_since(&self, cutoff: Timestamp) -> usize {
        let first = self.keys.partition_point(|k| k.date_time() < cutoff);
        let mut count = self.keys.len() - first;
        if !self.is_leaf {
            count += self.children[first].count_since(cutoff);
            count += self.children[first + 1..]
                .iter()
                .map(|c| c.size)
                .sum::<usize>();
        }
        count
    }

    fn validate(
        &self,
        is_root: bool,
        depth: usize,
        lower: Option<TimeKey>,
        upper: Option<TimeKey>,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize, IndexViolation> {
        let n = self.keys.len();
        let min_keys = if is_root { 1 } else { MIN_DEGREE - 1 };
        if n < min_keys || n > MAX_KEYS {
            return Err(IndexViolation::KeyCount { depth, count: n });
        }

        if self.keys.windows(2).any(|w| w[0].time_key() > w[1].time_key()) {
            return Err(IndexViolation::Unsorted { depth });
        }

        let out_of_bounds = |k: &Transaction| {
            lower.is_some_and(|lo| k.time_key() < lo) || upper.is_some_and(|hi| k.time_key() > hi)
        };
        if self.keys.iter().any(out_of_bounds) {
            return Err(IndexViolation::Separation { depth });
        }

        if self.is_leaf {
            if !self.children.is_empty() {
                return Err(IndexViolation::ChildCount { depth, keys: n, children: self.children.len() });
            }
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(IndexViolation::UnevenLeaves { expected, found: depth });
                }
                Some(_) => {}
            }
            if self.size != n {
                return Err(IndexViolation::SizeMismatch { depth, recorded: self.size, actual: n });
            }
            return Ok(n);
        }

        if self.children.len() != n + 1 {
            return Err(IndexViolation::ChildCount { depth, keys: n, children: self.children.len() });
        }

        let mut total = n;
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(self.keys[i - 1].time_key()) };
            let hi = if i == n { upper } else { Some(self.keys[i].time_key()) };
            total += child.validate(false, depth + 1, lo, hi, leaf_depth)?;
        }
        if self.size != total {
            return Err(IndexViolation::SizeMismatch { depth, recorded: self.size, actual: total });
        }
        Ok(total)
    }
}

// ── Index ────────────────────────────────────────────────────────────────────

/// A structural invariant the index failed to uphold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexViolation {
    #[error("node at depth {depth} holds {count} keys")]
    KeyCount { depth: usize, count: usize },

    #[error("keys out of order in node at depth {depth}")]
    Unsorted { depth: usize },

    #[error("key outside its parent's separator range at depth {depth}")]
    Separation { depth: usize },

    #[error("node at depth {depth} has {keys} keys but {children} children")]
    ChildCount { depth: usize, keys: usize, children: usize },

    #[error("leaves at depth {found}, expected {expected}")]
    UnevenLeaves { expected: usize, found: usize },

    #[error("node at depth {depth} records subtree size {recorded} but holds {actual}")]
    SizeMismatch { depth: usize, recorded: usize, actual: usize },

    #[error("index reports {reported} transactions but holds {actual}")]
    LenMismatch { reported: usize, actual: usize },
}

#[derive(Debug, Clone, Default)]
pub struct TransactionIndex {
    root: Option<Box<Node>>,
    len:  usize,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read-only view of the root node, if any transaction has been stored.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Levels from root to leaf. 0 for an empty index.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            height += 1;
            node = n.children.first().map(|c| c.as_ref());
        }
        height
    }

    /// Insert in a single root-to-leaf pass.
    pub fn insert(&mut self, txn: Transaction) {
        let root = match self.root.take() {
            None => {
                let mut leaf = Node::new(true);
                leaf.keys.push(txn);
                leaf.size = 1;
                Box::new(leaf)
            }
            Some(root) if root.is_full() => {
                let mut new_root = Node::new(false);
                new_root.size = root.size;
                new_root.children.push(root);
                new_root.split_child(0);
                new_root.insert_non_full(txn);
                log::debug!("index root split at {} transactions", self.len + 1);
                Box::new(new_root)
            }
            Some(mut root) => {
                root.insert_non_full(txn);
                root
            }
        };
        self.root = Some(root);
        self.len += 1;
    }

    /// First transaction with this id in ascending time-key order.
    /// The index is not ordered on id, so this visits every key: O(n).
    pub fn find_by_id(&self, id: TransactionId) -> Option<&Transaction> {
        self.root.as_deref().and_then(|r| r.find_by_id(id))
    }

    pub fn contains_id(&self, id: TransactionId) -> bool {
        self.find_by_id(id).is_some()
    }

    /// Visit every transaction in ascending time-key order.
    pub fn in_order<'a, F: FnMut(&'a Transaction)>(&'a self, mut visit: F) {
        if let Some(root) = self.root.as_deref() {
            root.in_order(&mut visit);
        }
    }

    /// Lazy ascending iterator. Each call starts a fresh walk.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            stack:     Vec::new(),
            remaining: self.len,
        };
        if let Some(root) = self.root.as_deref() {
            iter.descend_left(root);
        }
        iter
    }

    /// Transactions with `date_time >= cutoff`.
    pub fn count_since(&self, cutoff: Timestamp) -> usize {
        self.root.as_deref().map_or(0, |r| r.count_since(cutoff))
    }

    /// Check every structural invariant of the tree.
    pub fn validate(&self) -> Result<(), IndexViolation> {
        let actual = match self.root.as_deref() {
            None => 0,
            Some(root) => root.validate(true, 0, None, None, &mut None)?,
        };
        if actual != self.len {
            return Err(IndexViolation::LenMismatch { reported: self.len, actual });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a TransactionIndex {
    type Item = &'a Transaction;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a TransactionIndex.
/// Holds a stack of (node, next key position) down the current path.
pub struct Iter<'a> {
    stack:     Vec<(&'a Node, usize)>,
    remaining: usize,
}

impl<'a> Iter<'a> {
    fn descend_left(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child.as_ref(),
                None => break,
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            let node: &'a Node = top.0;
            let idx = top.1;
            if idx < node.keys.len() {
                top.1 += 1;
                if !node.is_leaf {
                    self.descend_left(&node.children[idx + 1]);
                }
                self.remaining -= 1;
                return Some(&node.keys[idx]);
            }
            self.stack.pop();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
