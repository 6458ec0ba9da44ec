//! Recursive partition units of a vantage point tree.
use std::cmp::Ordering;
use std::fmt::{self, Debug};
use std::mem;

use log::debug;

use crate::error::{Error, Result};
use crate::metric::{MetricItem, Relocatable, Scalar};
use crate::results::SearchResults;

/// Which child a descent took at an internal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Side {
    Closer,
    Farther,
}

impl Side {
    /// Points at distance `<= threshold` from the center live on the
    /// closer side, everything else on the farther side.
    fn of<F: Scalar>(d_center: F, threshold: F) -> Side {
        if d_center <= threshold {
            Side::Closer
        } else {
            Side::Farther
        }
    }
}

/// Root-to-leaf route through the tree.
pub(crate) type Path = Vec<Side>;

pub(crate) enum VPNode<F: Scalar, T> {
    Leaf(Vec<T>),
    Branch {
        center: T,
        threshold: F,
        closer: Box<VPNode<F, T>>,
        farther: Box<VPNode<F, T>>,
    },
}

impl<F: Scalar, T> VPNode<F, T> {
    pub fn empty() -> Self {
        VPNode::Leaf(Vec::new())
    }

    pub fn is_leaf(&self) -> bool {
        match *self {
            VPNode::Leaf(_) => true,
            VPNode::Branch { .. } => false,
        }
    }

    pub fn len(&self) -> usize {
        match *self {
            VPNode::Leaf(ref points) => points.len(),
            VPNode::Branch { ref closer, ref farther, .. } => closer.len() + farther.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match *self {
            VPNode::Leaf(ref points) => points.is_empty(),
            VPNode::Branch { ref closer, ref farther, .. } => closer.is_empty() && farther.is_empty(),
        }
    }

    /// Follow `path` for as long as it leads through internal nodes.
    pub fn follow(&self, path: &[Side]) -> &Self {
        match (self, path.split_first()) {
            (VPNode::Branch { closer, .. }, Some((Side::Closer, rest))) => closer.follow(rest),
            (VPNode::Branch { farther, .. }, Some((Side::Farther, rest))) => farther.follow(rest),
            (node, _) => node,
        }
    }

    pub fn follow_mut(&mut self, path: &[Side]) -> &mut Self {
        match (self, path.split_first()) {
            (VPNode::Branch { closer, .. }, Some((Side::Closer, rest))) => closer.follow_mut(rest),
            (VPNode::Branch { farther, .. }, Some((Side::Farther, rest))) => farther.follow_mut(rest),
            (node, _) => node,
        }
    }

    /// Number of leading steps of `path` that can still be followed.
    pub fn reachable_depth(&self, path: &[Side]) -> usize {
        match (self, path.split_first()) {
            (VPNode::Branch { closer, .. }, Some((Side::Closer, rest))) => 1 + closer.reachable_depth(rest),
            (VPNode::Branch { farther, .. }, Some((Side::Farther, rest))) => 1 + farther.reachable_depth(rest),
            _ => 0,
        }
    }

    /// Move every point of this subtree into `out`, closer side first.
    fn drain_into(self, out: &mut Vec<T>) {
        match self {
            VPNode::Leaf(points) => out.extend(points),
            VPNode::Branch { closer, farther, .. } => {
                VPNode::drain_into(*closer, out);
                VPNode::drain_into(*farther, out);
            }
        }
    }

    /// Turn an internal node back into a leaf holding all of the points
    /// of its subtree. Leaves are left alone.
    pub fn absorb_children(&mut self) {
        if self.is_leaf() {
            return;
        }
        let mut points = Vec::with_capacity(self.len());
        mem::replace(self, VPNode::empty()).drain_into(&mut points);
        *self = VPNode::Leaf(points);
    }

    pub fn into_points(self) -> Vec<T> {
        let mut points = Vec::with_capacity(self.len());
        self.drain_into(&mut points);
        points
    }
}

impl<F: Scalar, T: MetricItem<F> + Clone> VPNode<F, T> {
    /// Build a subtree over `items`, splitting until no leaf holds more
    /// than `bin_size` points (coincident points excepted).
    pub fn build(items: Vec<T>, bin_size: usize) -> Self {
        if items.len() <= bin_size {
            return VPNode::Leaf(items);
        }
        match VPNode::split(items, bin_size) {
            Ok(node) => node,
            Err(items) => {
                debug!("no viable partition threshold for {} coincident points; keeping an oversized leaf", items.len());
                VPNode::Leaf(items)
            }
        }
    }

    /// Partition `items` around the first of them, handing the items back
    /// when every one of them is at distance zero from that center.
    fn split(items: Vec<T>, bin_size: usize) -> ::std::result::Result<Self, Vec<T>> {
        if items.is_empty() {
            return Err(items);
        }
        let center = items[0].clone();

        // Distances to the center are computed once and carried with the
        // items through the sort and the threshold scans.
        let mut tagged: Vec<(F, T)> = items.into_iter().map(|x| (center.distance(&x), x)).collect();
        tagged.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let n = tagged.len();
        let median_index = (n - 1) / 2;
        let median_distance = tagged[median_index].0;

        // Prefer the median itself as threshold; the split goes right before
        // the first point strictly beyond it.
        let mut split = (median_index + 1..n)
            .find(|&i| tagged[i].0 > median_distance)
            .map(|i| (median_distance, i));

        // Everything past the median ties with it: pull the threshold in to
        // the nearest strictly closer distance instead.
        if split.is_none() {
            split = (0..median_index + 1)
                .rev()
                .find(|&i| tagged[i].0 < median_distance)
                .map(|i| (tagged[i].0, i + 1));
        }

        let (threshold, partition_index) = match split {
            Some(s) => s,
            None => return Err(tagged.into_iter().map(|(_, x)| x).collect()),
        };

        let mut closer_items: Vec<T> = tagged.into_iter().map(|(_, x)| x).collect();
        let farther_items = closer_items.split_off(partition_index);

        Ok(VPNode::Branch {
            center,
            threshold,
            closer: Box::new(VPNode::build(closer_items, bin_size)),
            farther: Box::new(VPNode::build(farther_items, bin_size)),
        })
    }

    /// Re-split a leaf that has grown past `bin_size`. Internal nodes and
    /// leaves within capacity are left alone, as are leaves that cannot be
    /// split.
    pub fn partition(&mut self, bin_size: usize) {
        let oversized = match *self {
            VPNode::Leaf(ref points) => points.len() > bin_size,
            VPNode::Branch { .. } => false,
        };
        if oversized {
            let points = mem::replace(self, VPNode::empty()).into_points();
            *self = VPNode::build(points, bin_size);
        }
    }

    /// Route from this node to the leaf that holds (or would hold) `item`.
    pub fn locate(&self, item: &T) -> Path {
        let mut path = Vec::new();
        let mut node = self;
        while let VPNode::Branch { ref center, threshold, ref closer, ref farther } = *node {
            let side = Side::of(center.distance(item), threshold);
            path.push(side);
            node = match side {
                Side::Closer => &**closer,
                Side::Farther => &**farther,
            };
        }
        path
    }

    /// Append `item` to the leaf it belongs to, recording the route in
    /// `path`. Returns whether that leaf now holds more than `bin_size`
    /// points.
    pub fn insert(&mut self, item: T, bin_size: usize, path: &mut Path) -> bool {
        match *self {
            VPNode::Leaf(ref mut points) => {
                points.push(item);
                points.len() > bin_size
            }
            VPNode::Branch { ref center, threshold, ref mut closer, ref mut farther } => {
                let side = Side::of(center.distance(&item), threshold);
                path.push(side);
                match side {
                    Side::Closer => closer.insert(item, bin_size, path),
                    Side::Farther => farther.insert(item, bin_size, path),
                }
            }
        }
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        match *self.follow(&self.locate(item)) {
            VPNode::Leaf(ref points) => points.contains(item),
            VPNode::Branch { .. } => false,
        }
    }

    /// Remove `item` from this leaf.
    pub fn remove_point(&mut self, item: &T) -> Result<Option<T>>
    where
        T: PartialEq,
    {
        match *self {
            VPNode::Leaf(ref mut points) => Ok(points.iter().position(|p| p == item).map(|i| points.remove(i))),
            VPNode::Branch { .. } => Err(Error::NotALeaf),
        }
    }

    /// Offer candidates to `results`, skipping subtrees that provably
    /// cannot hold anything better than what has already been found.
    pub fn nearest_neighbors<'a, P>(&'a self, results: &mut SearchResults<'_, 'a, F, T, P>, query: &T)
    where
        P: Fn(&T) -> bool,
    {
        match *self {
            VPNode::Leaf(ref points) => results.offer_all(points),
            VPNode::Branch { ref center, threshold, ref closer, ref farther } => {
                let d_center = center.distance(query);

                if d_center <= threshold {
                    closer.nearest_neighbors(results, query);

                    // Everything on the far side is at least this far away.
                    if results.longest_distance() > threshold - d_center {
                        farther.nearest_neighbors(results, query);
                    }
                } else {
                    farther.nearest_neighbors(results, query);

                    if d_center - threshold <= results.longest_distance() {
                        closer.nearest_neighbors(results, query);
                    }
                }
            }
        }
    }

    /// Collect every item within `max_distance` of `query` that passes
    /// `predicate`, together with its distance.
    pub fn all_within<'a, P>(&'a self, query: &T, max_distance: F, predicate: &P, out: &mut Vec<(F, &'a T)>)
    where
        P: Fn(&T) -> bool,
    {
        match *self {
            VPNode::Leaf(ref points) => {
                for p in points {
                    let d = query.distance(p);
                    if d <= max_distance && predicate(p) {
                        out.push((d, p));
                    }
                }
            }
            VPNode::Branch { ref center, threshold, ref closer, ref farther } => {
                let d_center = center.distance(query);

                if d_center <= threshold + max_distance {
                    closer.all_within(query, max_distance, predicate, out);
                }
                if d_center + max_distance > threshold {
                    farther.all_within(query, max_distance, predicate, out);
                }
            }
        }
    }
}

impl<F: Scalar, T: Relocatable<F> + PartialEq> VPNode<F, T> {
    /// Move a point of this leaf to `destination` without leaving the
    /// leaf. Returns whether the point was found.
    pub fn relocate_point(&mut self, item: &T, destination: &T) -> Result<bool> {
        match *self {
            VPNode::Leaf(ref mut points) => match points.iter_mut().find(|p| **p == *item) {
                Some(p) => {
                    p.relocate_to(destination);
                    Ok(true)
                }
                None => Ok(false),
            },
            VPNode::Branch { .. } => Err(Error::NotALeaf),
        }
    }
}

impl<F: Scalar, T: Debug> VPNode<F, T> {
    fn dump(&self, depth: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match *self {
            VPNode::Leaf(ref points) => writeln!(f, "{}leaf {:?}", indent, points),
            VPNode::Branch { ref center, threshold, ref closer, ref farther } => {
                writeln!(f, "{}center {:?} threshold {}", indent, center, threshold)?;
                closer.dump(depth + 1, f)?;
                farther.dump(depth + 1, f)
            }
        }
    }
}

/// Indented rendering of a subtree, one node per line.
pub(crate) struct Dump<'a, F: Scalar, T: 'a>(pub &'a VPNode<F, T>);

impl<'a, F: Scalar, T: Debug + 'a> fmt::Display for Dump<'a, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.dump(0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Side, VPNode};
    use crate::metric::MetricItem;

    #[derive(Debug, Clone, PartialEq)]
    struct P(f64, f64);

    impl MetricItem<f64> for P {
        fn distance(&self, other: &Self) -> f64 {
            let dx = self.0 - other.0;
            let dy = self.1 - other.1;
            (dx * dx + dy * dy).sqrt()
        }
    }

    fn line(n: usize) -> Vec<P> {
        (0..n).map(|i| P(i as f64, 0.0)).collect()
    }

    fn check_thresholds(node: &VPNode<f64, P>) {
        if let VPNode::Branch { ref center, threshold, ref closer, ref farther } = *node {
            for p in closer.clone_points() {
                assert!(center.distance(&p) <= threshold);
            }
            for p in farther.clone_points() {
                assert!(center.distance(&p) > threshold);
            }
            check_thresholds(closer);
            check_thresholds(farther);
        }
    }

    impl VPNode<f64, P> {
        fn clone_points(&self) -> Vec<P> {
            match *self {
                VPNode::Leaf(ref points) => points.clone(),
                VPNode::Branch { ref closer, ref farther, .. } => {
                    let mut v = closer.clone_points();
                    v.extend(farther.clone_points());
                    v
                }
            }
        }
    }

    #[test]
    fn small_input_stays_a_leaf() {
        let node: VPNode<f64, P> = VPNode::build(line(4), 4);
        assert!(node.is_leaf());
        assert_eq!(node.len(), 4);
    }

    #[test]
    fn build_splits_at_median() {
        let node: VPNode<f64, P> = VPNode::build(line(10), 2);
        match node {
            VPNode::Branch { ref center, threshold, ref closer, ref farther } => {
                assert_eq!(*center, P(0.0, 0.0));
                assert_eq!(threshold, 4.0);
                assert_eq!(closer.len(), 5);
                assert_eq!(farther.len(), 5);
            }
            VPNode::Leaf(_) => panic!("expected a branch"),
        }
        check_thresholds(&node);
    }

    #[test]
    fn coincident_points_stay_an_oversized_leaf() {
        let points = vec![P(1.0, 1.0); 10];
        let node: VPNode<f64, P> = VPNode::build(points, 3);
        assert!(node.is_leaf());
        assert_eq!(node.len(), 10);
    }

    #[test]
    fn ties_past_the_median_pull_the_threshold_in() {
        // Center at the origin and every other point at distance one.
        let mut points = vec![P(0.0, 0.0)];
        for _ in 0..2 {
            points.extend(vec![P(1.0, 0.0), P(0.0, 1.0), P(-1.0, 0.0), P(0.0, -1.0)]);
        }
        let node: VPNode<f64, P> = VPNode::build(points, 4);
        match node {
            VPNode::Branch { threshold, ref closer, ref farther, .. } => {
                assert_eq!(threshold, 0.0);
                assert_eq!(closer.len(), 1);
                assert_eq!(farther.len(), 8);
            }
            VPNode::Leaf(_) => panic!("expected a branch"),
        }
        check_thresholds(&node);
    }

    #[test]
    fn ties_with_the_median_land_on_the_closer_side() {
        let points = vec![P(0.0, 0.0), P(1.0, 0.0), P(2.0, 0.0), P(2.0, 0.0), P(2.0, 0.0), P(2.0, 0.0)];
        let node: VPNode<f64, P> = VPNode::build(points, 2);
        check_thresholds(&node);
        assert_eq!(node.len(), 6);
    }

    #[test]
    fn locate_and_follow_agree() {
        let node: VPNode<f64, P> = VPNode::build(line(50), 4);
        for p in line(50) {
            let path = node.locate(&p);
            assert!(node.follow(&path).is_leaf());
            assert_eq!(node.reachable_depth(&path), path.len());
            assert!(node.contains(&p));
        }
        assert!(!node.contains(&P(0.5, 0.0)));
    }

    #[test]
    fn absorb_children_collects_subtree() {
        let mut node: VPNode<f64, P> = VPNode::build(line(20), 2);
        assert!(!node.is_leaf());
        node.absorb_children();
        assert!(node.is_leaf());
        assert_eq!(node.len(), 20);
    }

    #[test]
    fn follow_stops_at_leaves() {
        let node: VPNode<f64, P> = VPNode::build(line(3), 4);
        let path = vec![Side::Closer, Side::Farther];
        assert!(node.follow(&path).is_leaf());
        assert_eq!(node.reachable_depth(&path), 0);
    }

    #[test]
    fn removing_from_a_branch_is_an_error() {
        let mut node: VPNode<f64, P> = VPNode::build(line(20), 2);
        assert!(node.remove_point(&P(1.0, 0.0)).is_err());
    }

    #[test]
    fn insert_reports_overflow() {
        let mut node: VPNode<f64, P> = VPNode::empty();
        let mut path = Vec::new();
        assert!(!node.insert(P(0.0, 0.0), 1, &mut path));
        assert!(node.insert(P(1.0, 0.0), 1, &mut path));
        assert!(path.is_empty());
        node.partition(1);
        assert!(!node.is_leaf());
        assert_eq!(node.len(), 2);
    }
}
