mod weights;

pub use weights::{MissingPolicy, SpatialWeights, ZeroPolicy};
