use thiserror::Error;

/// Errors reported by [`VPTree`](crate::VPTree).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// The descent ended on an internal node. This means the threshold
    /// invariant is broken, most likely because a stored point was mutated
    /// behind the tree's back.
    #[error("cannot remove points from a non-leaf node")]
    NotALeaf,

    #[error("invalid bin size {0}: leaves must hold at least one point")]
    InvalidBinSize(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
