//! Capabilities a point type must provide to be indexed.
use std::fmt::{Debug, Display};
pub use num::Float;

/// Distance type used throughout the tree.
pub trait Scalar: Float + Debug + Display {}
impl<T: Float + Debug + Display> Scalar for T {}

/// An item living in a metric space.
///
/// `distance` must be non-negative, symmetric and satisfy the triangle
/// inequality. Both the nearest-neighbor and radius searches prune whole
/// subtrees on the strength of those properties, so a distance that breaks
/// them gives wrong answers rather than slow ones.
pub trait MetricItem<F: Scalar> {
    fn distance(&self, other: &Self) -> F;
}

/// An item whose position can be changed in place.
pub trait Relocatable<F: Scalar>: MetricItem<F> {
    /// Copy the coordinates of `destination` onto `self`, keeping
    /// everything else (names, payloads, ids) untouched.
    fn relocate_to(&mut self, destination: &Self);
}
