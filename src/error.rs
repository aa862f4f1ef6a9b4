//! Error types for the spatial and flow engines.

use thiserror::Error;

use crate::region::RegionId;
use crate::weights::ZeroPolicy;

/// Engine error. Input errors, degeneracies and policy violations are kept
/// apart so callers can tell "not computable" from "computed as zero".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Input errors
    #[error("Invalid geometry for region {region}: {reason}")]
    InvalidGeometry { region: RegionId, reason: String },

    #[error("Non-finite value {value} for region {region} in `{attribute}`")]
    NonFiniteAttribute { region: RegionId, attribute: String, value: f64 },

    #[error("Negative stock {value} for {origin} -> {destination} in period {period}")]
    NegativeStock { origin: RegionId, destination: RegionId, period: i32, value: f64 },

    #[error("Length mismatch in {context}: expected {expected}, got {actual}")]
    LengthMismatch { context: &'static str, expected: usize, actual: usize },

    #[error("Unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("Duplicate region: {0}")]
    DuplicateRegion(RegionId),

    #[error("Period {0} is not present in the stock table")]
    MissingPeriod(i32),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter { name: &'static str, value: String, reason: String },

    // Degeneracies
    #[error("{statistic} is undefined: attribute has zero variance over {n} regions")]
    ZeroVariance { statistic: &'static str, n: usize },

    #[error("{statistic} needs at least {required} regions, got {actual}")]
    InsufficientRegions { statistic: &'static str, required: usize, actual: usize },

    #[error("Region {0} has no neighbors")]
    NoNeighbors(RegionId),

    #[error("{statistic} is undefined: the weights sum to zero")]
    ZeroWeights { statistic: &'static str },

    // Policy violations
    #[error("Weights were built with zero-neighbor policy {built:?} but {requested:?} was declared")]
    PolicyMismatch { built: ZeroPolicy, requested: ZeroPolicy },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
