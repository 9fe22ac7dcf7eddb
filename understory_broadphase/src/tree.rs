// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamic AABB tree: node arena, key table, and incremental maintenance.
//!
//! Leaves hold fattened boxes and payloads; internal nodes hold the union of
//! their two children. After every structural change the path to the root is
//! refit and rebalanced so sibling heights never differ by more than one.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt::Debug;

use tracing::{debug, trace};

use crate::config::TreeConfig;
use crate::error::PartitionError;
use crate::partition::SpatialData;
use crate::types::{Aabb3D, Scalar};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Kind<K, T, P> {
    Leaf {
        key: K,
        data: SpatialData<T, P>,
    },
    Internal {
        left: NodeIdx,
        right: NodeIdx,
        height: u32,
    },
    Free,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<K, T, P> {
    /// Fattened box for leaves, union of children for internal nodes.
    pub(crate) aabb: Aabb3D<T>,
    pub(crate) parent: Option<NodeIdx>,
    pub(crate) kind: Kind<K, T, P>,
}

/// A height-balanced bounding volume hierarchy over 3D AABBs.
///
/// Entries are registered under caller-issued keys `K` and carry an opaque
/// payload `P` that queries hand back. Each leaf stores its box enlarged
/// according to the tree's [`TreeConfig`], so small movements are absorbed by
/// [`update`](Self::update) without touching the structure.
///
/// The tree is single-threaded and has no interior mutability: queries borrow
/// it shared, mutations borrow it exclusively.
pub struct DynamicAabbTree<K, T, P> {
    config: TreeConfig<T>,
    pub(crate) root: Option<NodeIdx>,
    pub(crate) nodes: Vec<Node<K, T, P>>,
    free_list: Vec<usize>,
    keys: BTreeMap<K, NodeIdx>,
}

impl<K, T, P> DynamicAabbTree<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
    TreeConfig<T>: Default,
{
    /// Create an empty tree with the default fattening.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }
}

impl<K, T, P> Default for DynamicAabbTree<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
    TreeConfig<T>: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T, P> DynamicAabbTree<K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    /// Create an empty tree with explicit fattening parameters.
    pub fn with_config(config: TreeConfig<T>) -> Self {
        Self {
            config,
            root: None,
            nodes: Vec::new(),
            free_list: Vec::new(),
            keys: BTreeMap::new(),
        }
    }

    /// The fattening parameters this tree was built with.
    pub fn config(&self) -> &TreeConfig<T> {
        &self.config
    }

    /// Register a new leaf under `key`.
    ///
    /// # Errors
    ///
    /// [`PartitionError::DuplicateKey`] if `key` is already present,
    /// [`PartitionError::InvalidGeometry`] if `data.aabb` is not finite or is
    /// inverted. The tree is unchanged on error.
    pub fn insert(&mut self, key: K, data: SpatialData<T, P>) -> Result<(), PartitionError<K>> {
        data.aabb.validate()?;
        if self.keys.contains_key(&key) {
            return Err(PartitionError::DuplicateKey(key));
        }
        let leaf = self.alloc(Node {
            aabb: self.config.fatten(&data.aabb),
            parent: None,
            kind: Kind::Leaf { key, data },
        });
        self.attach_leaf(leaf);
        let _ = self.keys.insert(key, leaf);
        debug!(?key, leaves = self.keys.len(), "inserted leaf");
        Ok(())
    }

    /// Replace the box and payload stored under `key`.
    ///
    /// The payload is always replaced in place. If the new box still fits in
    /// the leaf's fattened box nothing else changes; otherwise the leaf is
    /// detached and reinserted with a freshly fattened box. Returns `true` in
    /// the latter case.
    ///
    /// # Errors
    ///
    /// [`PartitionError::KeyNotFound`] if `key` is absent,
    /// [`PartitionError::InvalidGeometry`] if `data.aabb` is malformed.
    pub fn update(&mut self, key: K, data: SpatialData<T, P>) -> Result<bool, PartitionError<K>> {
        data.aabb.validate()?;
        let Some(&leaf) = self.keys.get(&key) else {
            return Err(PartitionError::KeyNotFound(key));
        };
        let fat = self.config.fatten(&data.aabb);
        let node = &mut self.nodes[leaf.get()];
        let contained = node.aabb.contains(&data.aabb);
        node.kind = Kind::Leaf { key, data };
        if contained {
            return Ok(false);
        }
        node.aabb = fat;
        self.detach_leaf(leaf);
        self.attach_leaf(leaf);
        trace!(?key, "reinserted leaf that escaped its fattened box");
        Ok(true)
    }

    /// Remove the leaf stored under `key` and return its payload.
    ///
    /// # Errors
    ///
    /// [`PartitionError::KeyNotFound`] if `key` is absent.
    pub fn remove(&mut self, key: K) -> Result<P, PartitionError<K>> {
        let Some(leaf) = self.keys.remove(&key) else {
            return Err(PartitionError::KeyNotFound(key));
        };
        self.detach_leaf(leaf);
        let node = self.free(leaf);
        debug!(?key, leaves = self.keys.len(), "removed leaf");
        match node.kind {
            Kind::Leaf { data, .. } => Ok(data.client_data),
            // The key table only ever points at leaves.
            Kind::Internal { .. } | Kind::Free => Err(PartitionError::KeyNotFound(key)),
        }
    }

    /// Remove every leaf and release the arena.
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.free_list.clear();
        self.keys.clear();
        debug!("cleared tree");
    }

    /// The real box and payload registered under `key`.
    pub fn get(&self, key: K) -> Option<&SpatialData<T, P>> {
        let leaf = self.keys.get(&key)?;
        match &self.nodes[leaf.get()].kind {
            Kind::Leaf { data, .. } => Some(data),
            Kind::Internal { .. } | Kind::Free => None,
        }
    }

    /// The fattened box stored for `key`.
    pub fn fat_aabb(&self, key: K) -> Option<Aabb3D<T>> {
        self.keys.get(&key).map(|leaf| self.nodes[leaf.get()].aabb)
    }

    /// Whether `key` is registered.
    pub fn contains_key(&self, key: K) -> bool {
        self.keys.contains_key(&key)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True if the tree has no leaves.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of live nodes, leaves and internal nodes together.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Height of the root; `0` for an empty tree or a single leaf.
    pub fn height(&self) -> u32 {
        self.root.map_or(0, |r| self.height_of(r))
    }

    /// Read-only view of the root node.
    pub fn root(&self) -> Option<NodeRef<'_, K, T, P>> {
        self.root.map(|idx| NodeRef { tree: self, idx })
    }

    /// Iterate over registered keys and their data in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &SpatialData<T, P>)> + '_ {
        self.keys
            .iter()
            .filter_map(|(k, leaf)| match &self.nodes[leaf.get()].kind {
                Kind::Leaf { data, .. } => Some((*k, data)),
                Kind::Internal { .. } | Kind::Free => None,
            })
    }

    pub(crate) fn children(&self, i: NodeIdx) -> Option<(NodeIdx, NodeIdx)> {
        match self.nodes[i.get()].kind {
            Kind::Internal { left, right, .. } => Some((left, right)),
            Kind::Leaf { .. } | Kind::Free => None,
        }
    }

    pub(crate) fn height_of(&self, i: NodeIdx) -> u32 {
        match self.nodes[i.get()].kind {
            Kind::Internal { height, .. } => height,
            Kind::Leaf { .. } | Kind::Free => 0,
        }
    }

    fn alloc(&mut self, node: Node<K, T, P>) -> NodeIdx {
        if let Some(i) = self.free_list.pop() {
            self.nodes[i] = node;
            NodeIdx::new(i)
        } else {
            self.nodes.push(node);
            NodeIdx::new(self.nodes.len() - 1)
        }
    }

    fn free(&mut self, i: NodeIdx) -> Node<K, T, P> {
        let aabb = self.nodes[i.get()].aabb;
        self.free_list.push(i.get());
        core::mem::replace(
            &mut self.nodes[i.get()],
            Node {
                aabb,
                parent: None,
                kind: Kind::Free,
            },
        )
    }

    /// Hang `leaf` next to the leaf whose box grows least by absorbing it.
    fn attach_leaf(&mut self, leaf: NodeIdx) {
        let fat = self.nodes[leaf.get()].aabb;
        let Some(root) = self.root else {
            self.nodes[leaf.get()].parent = None;
            self.root = Some(leaf);
            return;
        };

        let mut sibling = root;
        while let Some((left, right)) = self.children(sibling) {
            let lb = self.nodes[left.get()].aabb;
            let rb = self.nodes[right.get()].aabb;
            let (l_area, r_area) = (lb.surface_area(), rb.surface_area());
            let grow_l = lb.union(&fat).surface_area() - l_area;
            let grow_r = rb.union(&fat).surface_area() - r_area;
            sibling = if grow_l < grow_r {
                left
            } else if grow_r < grow_l {
                right
            } else if r_area < l_area {
                right
            } else {
                left
            };
        }

        let old_parent = self.nodes[sibling.get()].parent;
        let branch = self.alloc(Node {
            aabb: self.nodes[sibling.get()].aabb.union(&fat),
            parent: old_parent,
            kind: Kind::Internal {
                left: sibling,
                right: leaf,
                height: 1,
            },
        });
        self.nodes[sibling.get()].parent = Some(branch);
        self.nodes[leaf.get()].parent = Some(branch);
        match old_parent {
            Some(p) => self.replace_child(p, sibling, branch),
            None => self.root = Some(branch),
        }
        self.fix_upwards(old_parent);
    }

    /// Unlink `leaf`, splice its sibling into the parent's place, and free the parent.
    ///
    /// The leaf itself stays allocated so it can be reattached or freed by the caller.
    fn detach_leaf(&mut self, leaf: NodeIdx) {
        if self.root == Some(leaf) {
            self.root = None;
            return;
        }
        let Some(parent) = self.nodes[leaf.get()].parent else {
            debug_assert!(false, "non-root leaf without a parent");
            return;
        };
        let Some((left, right)) = self.children(parent) else {
            debug_assert!(false, "leaf parent is not an internal node");
            return;
        };
        let sibling = if left == leaf { right } else { left };
        let grandparent = self.nodes[parent.get()].parent;

        self.nodes[sibling.get()].parent = grandparent;
        match grandparent {
            Some(g) => self.replace_child(g, parent, sibling),
            None => self.root = Some(sibling),
        }
        let _ = self.free(parent);
        self.nodes[leaf.get()].parent = None;
        self.fix_upwards(grandparent);
    }

    fn replace_child(&mut self, parent: NodeIdx, old: NodeIdx, new: NodeIdx) {
        if let Kind::Internal { left, right, .. } = &mut self.nodes[parent.get()].kind {
            if *left == old {
                *left = new;
            } else {
                debug_assert_eq!(*right, old, "replaced node must be a child");
                *right = new;
            }
        }
    }

    /// Recompute an internal node's box and height from its children.
    fn refit(&mut self, i: NodeIdx) {
        let Some((left, right)) = self.children(i) else {
            return;
        };
        let aabb = self.nodes[left.get()]
            .aabb
            .union(&self.nodes[right.get()].aabb);
        let h = 1 + self.height_of(left).max(self.height_of(right));
        let node = &mut self.nodes[i.get()];
        node.aabb = aabb;
        if let Kind::Internal { height, .. } = &mut node.kind {
            *height = h;
        }
    }

    /// Walk from `start` to the root, rebalancing and refitting each ancestor.
    fn fix_upwards(&mut self, start: Option<NodeIdx>) {
        let mut cur = start;
        while let Some(i) = cur {
            let top = self.balance(i);
            cur = self.nodes[top.get()].parent;
        }
    }

    /// Rotate at `a` if its children's heights differ by more than one.
    ///
    /// Returns the node now occupying `a`'s position.
    fn balance(&mut self, a: NodeIdx) -> NodeIdx {
        let Some((left, right)) = self.children(a) else {
            return a;
        };
        let (hl, hr) = (self.height_of(left), self.height_of(right));
        if hr > hl + 1 {
            self.rotate(a, right)
        } else if hl > hr + 1 {
            self.rotate(a, left)
        } else {
            self.refit(a);
            a
        }
    }

    /// Promote the heavy child `b` of `a` into `a`'s position.
    ///
    /// `b` keeps its taller child and hands the shorter one to `a`, which covers
    /// the left-left, left-right, right-left, and right-right cases with one
    /// rotation because children are unordered.
    fn rotate(&mut self, a: NodeIdx, b: NodeIdx) -> NodeIdx {
        let Some((bl, br)) = self.children(b) else {
            debug_assert!(false, "heavy child must be internal");
            self.refit(a);
            return a;
        };
        let heavy_is_left = self.children(a).is_some_and(|(l, _)| l == b);
        let (hbl, hbr) = (self.height_of(bl), self.height_of(br));
        // On a tie keep the outer grandchild, as a single AVL rotation would.
        let tall_is_left = hbl > hbr || (hbl == hbr && heavy_is_left);
        let (tall, short) = if tall_is_left { (bl, br) } else { (br, bl) };

        let a_parent = self.nodes[a.get()].parent;
        self.nodes[b.get()].parent = a_parent;
        match a_parent {
            Some(p) => self.replace_child(p, a, b),
            None => self.root = Some(b),
        }
        self.replace_child(a, b, short);
        self.nodes[short.get()].parent = Some(a);
        self.replace_child(b, short, a);
        self.nodes[a.get()].parent = Some(b);

        self.refit(a);
        self.refit(b);
        trace!(
            case = rotation_case(heavy_is_left, tall_is_left),
            height = self.height_of(b),
            "rotated"
        );
        debug_assert!(
            self.children(b).is_some_and(|(l, r)| l == tall || r == tall),
            "promoted node keeps its taller child"
        );
        b
    }
}

/// Name of the classic AVL case given which side was heavy and which
/// grandchild was taller.
fn rotation_case(heavy_was_left: bool, tall_was_left: bool) -> &'static str {
    match (heavy_was_left, tall_was_left) {
        (true, true) => "left-left",
        (true, false) => "left-right",
        (false, true) => "right-left",
        (false, false) => "right-right",
    }
}

impl<K: Debug, T: Debug, P: Debug> Debug for DynamicAabbTree<K, T, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicAabbTree")
            .field("config", &self.config)
            .field("leaves", &self.keys.len())
            .field("arena_nodes", &self.nodes.len())
            .field("free", &self.free_list.len())
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

/// Read-only view of a node in a [`DynamicAabbTree`].
///
/// Obtained from [`DynamicAabbTree::root`] and navigated with
/// [`left`](Self::left), [`right`](Self::right), and [`parent`](Self::parent).
pub struct NodeRef<'a, K, T, P> {
    tree: &'a DynamicAabbTree<K, T, P>,
    idx: NodeIdx,
}

impl<K, T, P> Clone for NodeRef<'_, K, T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, T, P> Copy for NodeRef<'_, K, T, P> {}

impl<'a, K, T, P> NodeRef<'a, K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    fn node(&self) -> &'a Node<K, T, P> {
        &self.tree.nodes[self.idx.get()]
    }

    fn at(&self, idx: NodeIdx) -> Self {
        Self {
            tree: self.tree,
            idx,
        }
    }

    /// Stored box: fattened for leaves, union of children otherwise.
    pub fn aabb(&self) -> Aabb3D<T> {
        self.node().aabb
    }

    /// `0` for leaves, `1 + max(children)` otherwise.
    pub fn height(&self) -> u32 {
        self.tree.height_of(self.idx)
    }

    /// Whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.node().kind, Kind::Leaf { .. })
    }

    /// Key of a leaf.
    pub fn key(&self) -> Option<K> {
        match &self.node().kind {
            Kind::Leaf { key, .. } => Some(*key),
            Kind::Internal { .. } | Kind::Free => None,
        }
    }

    /// Payload of a leaf.
    pub fn client_data(&self) -> Option<P> {
        match &self.node().kind {
            Kind::Leaf { data, .. } => Some(data.client_data),
            Kind::Internal { .. } | Kind::Free => None,
        }
    }

    /// Real (unfattened) box of a leaf.
    pub fn tight_aabb(&self) -> Option<Aabb3D<T>> {
        match &self.node().kind {
            Kind::Leaf { data, .. } => Some(data.aabb),
            Kind::Internal { .. } | Kind::Free => None,
        }
    }

    /// Parent node, `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        self.node().parent.map(|p| self.at(p))
    }

    /// Left child of an internal node.
    pub fn left(&self) -> Option<Self> {
        self.tree.children(self.idx).map(|(l, _)| self.at(l))
    }

    /// Right child of an internal node.
    pub fn right(&self) -> Option<Self> {
        self.tree.children(self.idx).map(|(_, r)| self.at(r))
    }
}

impl<K, T, P> Debug for NodeRef<'_, K, T, P>
where
    K: Copy + Ord + Debug,
    T: Scalar,
    P: Copy + Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeRef")
            .field("index", &self.idx.get())
            .field("aabb", &self.aabb())
            .field("height", &self.height())
            .field("client_data", &self.client_data())
            .finish_non_exhaustive()
    }
}
