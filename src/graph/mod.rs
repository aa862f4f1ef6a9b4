mod builder;
mod contiguity;
mod knn;
mod neighbors;

pub use builder::{build_neighbors, NeighborGraph, NeighborOptions};
pub use contiguity::Contiguity;
pub use knn::DistanceMetric;
pub use neighbors::NeighborList;
