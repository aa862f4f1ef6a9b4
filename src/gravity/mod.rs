//! Inputs for gravity models of bilateral flows, and the per-region view of
//! their residuals used for spatial diagnostics.

mod pairs;
mod residuals;

pub use pairs::{gravity_rows, DestinationAttributes, GravityRow, OriginAttributes};
pub use residuals::{aggregate_residuals, PairResidual, Side};
