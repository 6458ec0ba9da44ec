//! Vantage-Point Trees are a data structure for fast
//! k-nearest-neighbor and radius searches in metric spaces.
//!
//! Points live in leaf bins of at most `bin_size` entries. Internal nodes
//! hold a center point and a distance threshold: everything within the
//! threshold of the center sits in the `closer` subtree, everything else in
//! the `farther` subtree. The tree stays searchable while points are added,
//! removed and moved around.
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::Debug;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::iter::{Iter, Leaves};
use crate::metric::{MetricItem, Relocatable, Scalar};
use crate::node::{Dump, Path, Side, VPNode};
use crate::results::SearchResults;

/// Leaf capacity used when none is given.
pub const DEFAULT_BIN_SIZE: usize = 32;

/// A dynamic vantage point tree.
///
/// ```
/// use vptree::{MetricItem, VPTree};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Point(f64, f64);
///
/// impl MetricItem<f64> for Point {
///     fn distance(&self, other: &Self) -> f64 {
///         ((self.0 - other.0).powi(2) + (self.1 - other.1).powi(2)).sqrt()
///     }
/// }
///
/// let points = vec![Point(0.0, 0.0), Point(1.0, 0.0), Point(0.0, 1.0), Point(5.0, 5.0), Point(5.0, 6.0)];
/// let tree: VPTree<f64, Point> = VPTree::from_vec_with_bin_size(points, 2).unwrap();
///
/// assert_eq!(tree.nearest_neighbors(&Point(0.1, 0.1), 1), vec![&Point(0.0, 0.0)]);
/// assert_eq!(tree.all_within_distance(&Point(5.0, 5.0), 2.0), vec![&Point(5.0, 5.0), &Point(5.0, 6.0)]);
/// ```
pub struct VPTree<F: Scalar, T> {
    root: VPNode<F, T>,
    bin_size: usize,
}

fn check_bin_size(bin_size: usize) -> Result<usize> {
    if bin_size == 0 {
        Err(Error::InvalidBinSize(bin_size))
    } else {
        Ok(bin_size)
    }
}

impl<F: Scalar, T> VPTree<F, T> {
    /// Construct an empty tree with the default bin size.
    pub fn new() -> Self {
        VPTree { root: VPNode::empty(), bin_size: DEFAULT_BIN_SIZE }
    }

    /// Construct an empty tree whose leaves hold up to `bin_size` points.
    pub fn with_bin_size(bin_size: usize) -> Result<Self> {
        Ok(VPTree { root: VPNode::empty(), bin_size: check_bin_size(bin_size)? })
    }

    pub fn bin_size(&self) -> usize {
        self.bin_size
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Remove every point.
    pub fn clear(&mut self) {
        self.root = VPNode::empty();
    }

    pub fn iter(&self) -> Iter<'_, F, T> {
        Iter::new(&self.root)
    }

    /// The leaf bins of the tree, closer subtrees first.
    pub fn leaves(&self) -> Leaves<'_, F, T> {
        Leaves::new(&self.root)
    }

    /// Copy every stored point into a vector.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut points = Vec::with_capacity(self.len());
        points.extend(self.iter().cloned());
        points
    }

    /// Take every stored point out of the tree.
    pub fn into_vec(self) -> Vec<T> {
        self.root.into_points()
    }

    /// Not supported: always fails with [`Error::Unsupported`].
    pub fn retain_all<'b, I>(&mut self, _items: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'b T>,
        T: 'b,
    {
        Err(Error::Unsupported("vp-trees do not support retain_all"))
    }
}

impl<F: Scalar, T: MetricItem<F> + Clone> VPTree<F, T> {
    /// Construct a tree over `items` with the default bin size.
    pub fn from_vec(items: Vec<T>) -> Self {
        VPTree { root: VPNode::build(items, DEFAULT_BIN_SIZE), bin_size: DEFAULT_BIN_SIZE }
    }

    pub fn from_vec_with_bin_size(items: Vec<T>, bin_size: usize) -> Result<Self> {
        let bin_size = check_bin_size(bin_size)?;
        Ok(VPTree { root: VPNode::build(items, bin_size), bin_size })
    }

    /// Add a point, splitting its leaf right away if it overflows.
    pub fn insert(&mut self, item: T) -> bool {
        let mut path = Vec::new();
        if self.root.insert(item, self.bin_size, &mut path) {
            self.root.follow_mut(&path).partition(self.bin_size);
        }
        true
    }

    /// Add many points. Leaves that overflow along the way are split once,
    /// after every point has been placed.
    ///
    /// Returns whether any point was given.
    pub fn insert_all<I: IntoIterator<Item = T>>(&mut self, items: I) -> bool {
        let mut nodes_to_partition: HashSet<Path> = HashSet::new();
        let mut modified = false;

        for item in items {
            modified = true;
            let mut path = Vec::new();
            if self.root.insert(item, self.bin_size, &mut path) {
                nodes_to_partition.insert(path);
            }
        }

        if !nodes_to_partition.is_empty() {
            debug!("partitioning {} oversized leaves after bulk insert", nodes_to_partition.len());
        }
        // Splitting a leaf never moves another leaf, so every recorded path
        // stays valid while the set is drained.
        for path in &nodes_to_partition {
            self.root.follow_mut(path).partition(self.bin_size);
        }

        modified
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.root.contains(item)
    }

    pub fn contains_all<'b, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'b T>,
        T: PartialEq + 'b,
    {
        items.into_iter().all(|item| self.contains(item))
    }

    /// Remove a point and hand it back, or `None` if it is not stored.
    pub fn take(&mut self, item: &T) -> Result<Option<T>>
    where
        T: PartialEq,
    {
        self.take_deferring(item, None)
    }

    /// Remove a point; returns whether it was stored.
    pub fn remove(&mut self, item: &T) -> Result<bool>
    where
        T: PartialEq,
    {
        Ok(self.take(item)?.is_some())
    }

    /// Remove many points, collapsing emptied subtrees once at the end.
    ///
    /// Returns whether any point was removed.
    pub fn remove_all<'b, I>(&mut self, items: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'b T>,
        T: PartialEq + 'b,
    {
        let mut nodes_to_prune: HashSet<Path> = HashSet::new();

        let outcome = items.into_iter().try_fold(false, |removed, item| {
            Ok::<bool, Error>(self.take_deferring(item, Some(&mut nodes_to_prune))?.is_some() || removed)
        });

        if !nodes_to_prune.is_empty() {
            debug!("pruning {} emptied leaves after bulk removal", nodes_to_prune.len());
        }
        // Both children of one node may be in the set; whichever is pruned
        // second finds its path cut short and does nothing.
        for path in &nodes_to_prune {
            self.prune(path);
        }

        outcome
    }

    fn take_deferring(&mut self, item: &T, nodes_to_prune: Option<&mut HashSet<Path>>) -> Result<Option<T>>
    where
        T: PartialEq,
    {
        let path = self.root.locate(item);
        let leaf = self.root.follow_mut(&path);
        let removed = leaf.remove_point(item)?;

        if leaf.is_empty() {
            match nodes_to_prune {
                Some(nodes) => {
                    nodes.insert(path);
                }
                None => self.prune(&path),
            }
        }

        Ok(removed)
    }

    /// Collapse the ancestors of the empty leaf at the end of `path` until
    /// one of them ends up holding points.
    fn prune(&mut self, path: &[Side]) {
        let path = &path[..self.root.reachable_depth(path)];
        if !self.root.follow(path).is_empty() {
            return;
        }

        for depth in (0..path.len()).rev() {
            let ancestor = self.root.follow_mut(&path[..depth]);
            ancestor.absorb_children();

            if !ancestor.is_empty() {
                debug!("collapsed subtree at depth {} into a leaf of {} points", depth, ancestor.len());
                ancestor.partition(self.bin_size);
                return;
            }
        }
    }

    /// The closest stored point to `query`.
    pub fn nearest_neighbor(&self, query: &T) -> Option<&T> {
        self.nearest_neighbors(query, 1).pop()
    }

    /// Find the `k` nearest neighbors, closest first.
    pub fn nearest_neighbors(&self, query: &T, k: usize) -> Vec<&T> {
        self.nearest_neighbors_where(query, k, None, |_: &T| true)
    }

    /// Find the `k` nearest neighbors no farther than `max_distance`.
    pub fn nearest_neighbors_within(&self, query: &T, k: usize, max_distance: F) -> Vec<&T> {
        self.nearest_neighbors_where(query, k, Some(max_distance), |_: &T| true)
    }

    /// Find the `k` nearest neighbors accepted by `predicate`.
    pub fn nearest_neighbors_matching<P>(&self, query: &T, k: usize, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        self.nearest_neighbors_where(query, k, None, predicate)
    }

    pub fn nearest_neighbors_where<P>(&self, query: &T, k: usize, max_distance: Option<F>, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        let mut results = SearchResults::new(query, k, max_distance, predicate);
        if k > 0 {
            self.root.nearest_neighbors(&mut results, query);
        }
        trace!("nearest neighbor search kept {} of {} requested", results.len(), k);
        results.into_sorted_vec()
    }

    /// Every stored point within `max_distance` of `query`, closest first.
    pub fn all_within_distance(&self, query: &T, max_distance: F) -> Vec<&T> {
        self.all_within_distance_matching(query, max_distance, |_: &T| true)
    }

    pub fn all_within_distance_matching<P>(&self, query: &T, max_distance: F, predicate: P) -> Vec<&T>
    where
        P: Fn(&T) -> bool,
    {
        let mut found = Vec::new();
        self.root.all_within(query, max_distance, &predicate, &mut found);
        found.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        found.into_iter().map(|(_, p)| p).collect()
    }

    /// Move a stored point to the coordinates of `destination`.
    ///
    /// When both positions fall in the same leaf the point is updated in
    /// place; otherwise it is removed, moved and inserted again. Returns
    /// whether the point was stored.
    pub fn move_point(&mut self, item: &T, destination: &T) -> Result<bool>
    where
        T: Relocatable<F> + PartialEq,
    {
        let source = self.root.locate(item);
        let target = self.root.locate(destination);

        if source == target {
            trace!("relocating point within its leaf");
            let leaf = self.root.follow_mut(&source);
            let moved = leaf.relocate_point(item, destination)?;
            // A coincident leaf may be oversized; once one of its points
            // moves away it can be split.
            leaf.partition(self.bin_size);
            return Ok(moved);
        }

        trace!("relocating point across leaves");
        match self.take(item)? {
            Some(mut moved) => {
                moved.relocate_to(destination);
                self.insert(moved);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<F: Scalar, T: Debug> VPTree<F, T> {
    /// Render the tree structure, one node per line.
    pub fn dump(&self) -> String {
        Dump(&self.root).to_string()
    }
}

impl<F: Scalar, T> Default for VPTree<F, T> {
    fn default() -> Self {
        VPTree::new()
    }
}

impl<F: Scalar, T: MetricItem<F> + Clone> FromIterator<T> for VPTree<F, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        VPTree::from_vec(iter.into_iter().collect())
    }
}

impl<F: Scalar, T: MetricItem<F> + Clone> Extend<T> for VPTree<F, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<'a, F: Scalar, T> IntoIterator for &'a VPTree<F, T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, F, T>;

    fn into_iter(self) -> Iter<'a, F, T> {
        self.iter()
    }
}

impl<F: Scalar, T> IntoIterator for VPTree<F, T> {
    type Item = T;
    type IntoIter = ::std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}
