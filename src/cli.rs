use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

use crate::flow::FlowMethod;
use crate::graph::{Contiguity, DistanceMetric};
use crate::weights::{MissingPolicy, ZeroPolicy};

/// Spatial autocorrelation and bilateral flow estimation for migration data
#[derive(Parser, Debug)]
#[command(name = "migspat", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON file with analysis settings; flags override its values
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the neighbor graph of a region file
    Neighbors(NeighborsArgs),

    /// Global and local Moran's I of one attribute
    Moran(MoranArgs),

    /// Estimate bilateral flows from a stock table
    Flows(FlowsArgs),
}

/// Where a report goes; stdout when no file is given.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Output JSON report
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

/// Region geometries and how neighbors are built over them.
#[derive(Args, Debug)]
pub struct RegionArgs {
    /// GeoJSON FeatureCollection of region polygons
    #[arg(value_hint = ValueHint::FilePath)]
    pub regions: PathBuf,

    /// Property (and attribute CSV column) holding the region id
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// CSV with an id column and numeric attribute columns
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub attributes: Option<PathBuf>,

    /// Number of nearest neighbors added to every region
    #[arg(short, long)]
    pub k: Option<usize>,

    #[arg(long, value_enum)]
    pub contiguity: Option<ContiguityArg>,

    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
}

#[derive(Args, Debug)]
pub struct NeighborsArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Also report the spatial lag of this attribute
    #[arg(long)]
    pub lag: Option<String>,

    /// How missing neighbor values enter the lag
    #[arg(long, value_enum)]
    pub missing: Option<MissingArg>,

    #[arg(long, value_enum)]
    pub zero_policy: Option<ZeroPolicyArg>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct MoranArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Attribute to analyze
    #[arg(short, long)]
    pub attribute: String,

    #[arg(long, value_enum)]
    pub zero_policy: Option<ZeroPolicyArg>,

    /// Random relabellings for pseudo p-values (0 disables)
    #[arg(long)]
    pub permutations: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Significance level for cluster labels
    #[arg(long)]
    pub alpha: Option<f64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug)]
pub struct FlowsArgs {
    /// CSV with columns origin,destination,period,stock
    #[arg(value_hint = ValueHint::FilePath)]
    pub stocks: PathBuf,

    /// First period
    #[arg(long)]
    pub from: i32,

    /// Second period
    #[arg(long)]
    pub to: i32,

    #[arg(long, value_enum)]
    pub method: Option<MethodArg>,

    /// Include per-country net migration
    #[arg(long)]
    pub net: bool,

    /// Region GeoJSON; adds gravity rows with centroid distances
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub regions: Option<PathBuf>,

    /// Property (and attribute CSV column) holding the region id
    #[arg(long, default_value = "id")]
    pub id_field: String,

    /// CSV with an id column and numeric attribute columns
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub attributes: Option<PathBuf>,

    /// Attribute columns attached to both ends of each gravity row
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Attribute column with population, for net migration rates per 1,000
    #[arg(long)]
    pub population: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum ContiguityArg { Queen, Rook }

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum MetricArg { GreatCircle, Planar }

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum ZeroPolicyArg { Fail, Drop, ZeroRow }

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum MissingArg { Renormalize, Propagate }

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum MethodArg { Dennett, StockDifference }

impl From<ContiguityArg> for Contiguity {
    fn from(arg: ContiguityArg) -> Self {
        match arg {
            ContiguityArg::Queen => Contiguity::Queen,
            ContiguityArg::Rook => Contiguity::Rook,
        }
    }
}

impl From<MetricArg> for DistanceMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::GreatCircle => DistanceMetric::GreatCircle,
            MetricArg::Planar => DistanceMetric::Planar,
        }
    }
}

impl From<ZeroPolicyArg> for ZeroPolicy {
    fn from(arg: ZeroPolicyArg) -> Self {
        match arg {
            ZeroPolicyArg::Fail => ZeroPolicy::Fail,
            ZeroPolicyArg::Drop => ZeroPolicy::Drop,
            ZeroPolicyArg::ZeroRow => ZeroPolicy::ZeroRow,
        }
    }
}

impl From<MissingArg> for MissingPolicy {
    fn from(arg: MissingArg) -> Self {
        match arg {
            MissingArg::Renormalize => MissingPolicy::Renormalize,
            MissingArg::Propagate => MissingPolicy::Propagate,
        }
    }
}

impl From<MethodArg> for FlowMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Dennett => FlowMethod::Dennett,
            MethodArg::StockDifference => FlowMethod::StockDifference,
        }
    }
}
