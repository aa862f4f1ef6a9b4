#![doc = "migspat public API"]
mod error;
mod flow;
mod geom;
mod graph;
mod gravity;
mod region;
mod stats;
mod weights;

pub mod cli;
pub mod commands;
pub mod config;
pub mod io;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use region::{AttributeTable, Region, RegionFeature, RegionId, RegionSet};

#[doc(inline)]
pub use geom::{ExclusionReason, ResolveReport};

#[doc(inline)]
pub use graph::{build_neighbors, Contiguity, DistanceMetric, NeighborGraph, NeighborList, NeighborOptions};

#[doc(inline)]
pub use weights::{MissingPolicy, SpatialWeights, ZeroPolicy};

#[doc(inline)]
pub use stats::{
    global_moran, local_moran, moran_scatter, Cluster, GlobalMoran, LocalMoran, LocalMoranRecord, MoranOptions,
    Quadrant, ScatterPoint,
};

#[doc(inline)]
pub use flow::{
    estimate_flows, net_migration, FlowEstimate, FlowMethod, FlowRecord, NetMigration, NetMigrationRecord, Period,
    StockEntry, StockTable,
};

#[doc(inline)]
pub use gravity::{aggregate_residuals, gravity_rows, DestinationAttributes, GravityRow, OriginAttributes, PairResidual, Side};

#[doc(inline)]
pub use config::AnalysisConfig;
