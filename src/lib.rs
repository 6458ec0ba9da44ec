//! Dynamic vantage point trees for nearest-neighbor and radius queries
//! over any metric space.

pub mod error;
pub mod geo;
pub mod iter;
pub mod metric;
mod node;
mod results;
pub mod vptree;

pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use iter::{Iter, Leaves};
pub use metric::{Float, MetricItem, Relocatable, Scalar};
pub use vptree::{VPTree, DEFAULT_BIN_SIZE};
