//! Bounded collection of the best candidates seen during a query.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::metric::{MetricItem, Scalar};

pub(crate) struct HeapElem<'a, F: Scalar, T: 'a> {
    pub dist: F,
    pub item: &'a T,
}

impl<'a, F: Scalar, T: 'a> HeapElem<'a, F, T> {
    fn new(d: F, i: &'a T) -> Self {
        HeapElem { dist: d, item: i }
    }
}

impl<'a, F: Scalar, T: 'a> PartialOrd for HeapElem<'a, F, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a, F: Scalar, T: 'a> PartialEq for HeapElem<'a, F, T> {
    fn eq(&self, other: &Self) -> bool {
        self.dist.eq(&other.dist)
    }
}

impl<'a, F: Scalar, T: 'a> Eq for HeapElem<'a, F, T> {}

impl<'a, F: Scalar, T: 'a> Ord for HeapElem<'a, F, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist.partial_cmp(&other.dist).unwrap_or(Ordering::Equal)
    }
}

/// Keeps the `capacity` closest items offered so far, subject to an
/// optional distance ceiling and a predicate.
///
/// The heap is a max-heap on distance, so the current worst candidate is
/// always on top and is the one evicted when something better arrives.
pub(crate) struct SearchResults<'q, 'a, F: Scalar, T: 'a, P> {
    query: &'q T,
    capacity: usize,
    max_distance: Option<F>,
    predicate: P,
    heap: BinaryHeap<HeapElem<'a, F, T>>,
}

impl<'q, 'a, F, T, P> SearchResults<'q, 'a, F, T, P>
where
    F: Scalar,
    T: MetricItem<F> + 'a,
    P: Fn(&T) -> bool,
{
    pub fn new(query: &'q T, capacity: usize, max_distance: Option<F>, predicate: P) -> Self {
        SearchResults {
            query,
            capacity,
            max_distance,
            predicate,
            heap: BinaryHeap::with_capacity(capacity.min(1024)),
        }
    }

    /// Offer a candidate; returns whether it was kept.
    pub fn offer(&mut self, item: &'a T) -> bool {
        if self.capacity == 0 {
            return false;
        }

        let d = self.query.distance(item);
        if let Some(max) = self.max_distance {
            if d > max {
                return false;
            }
        }

        if self.heap.len() >= self.capacity {
            match self.heap.peek() {
                Some(worst) if d < worst.dist => {}
                _ => return false,
            }
        }

        if !(self.predicate)(item) {
            return false;
        }

        if self.heap.len() >= self.capacity {
            self.heap.pop();
        }
        self.heap.push(HeapElem::new(d, item));
        true
    }

    pub fn offer_all<I: IntoIterator<Item = &'a T>>(&mut self, items: I) {
        for item in items {
            self.offer(item);
        }
    }

    /// Distance a new candidate has to beat to be kept.
    ///
    /// Infinite (or the ceiling, when one is set) until the collector is
    /// full; afterwards the distance of the worst kept candidate.
    pub fn longest_distance(&self) -> F {
        let open = self.max_distance.unwrap_or_else(F::infinity);
        if self.capacity == 0 {
            return F::neg_infinity();
        }
        if self.heap.len() < self.capacity {
            return open;
        }
        match self.heap.peek() {
            Some(worst) => worst.dist,
            None => open,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Consume the collector, returning the kept items closest first.
    pub fn into_sorted_vec(self) -> Vec<&'a T> {
        self.heap.into_sorted_vec().into_iter().map(|e| e.item).collect()
    }
}
