use anyhow::Result;
use serde::Serialize;

use crate::cli::{Cli, NeighborsArgs};
use crate::commands::{apply_region_flags, load_config, load_regions};
use crate::geom::ResolveReport;
use crate::graph::{build_neighbors, Contiguity, DistanceMetric};
use crate::io::write_report;
use crate::region::RegionId;
use crate::weights::{SpatialWeights, ZeroPolicy};

#[derive(Serialize)]
struct NeighborRow<'a> {
    id: &'a RegionId,
    contiguity: Vec<&'a RegionId>,
    knn: Vec<&'a RegionId>,
    weights: Vec<(&'a RegionId, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lag: Option<Option<f64>>,
}

#[derive(Serialize)]
struct NeighborsReport<'a> {
    regions: usize,
    k: usize,
    contiguity: Contiguity,
    metric: DistanceMetric,
    zero_policy: ZeroPolicy,
    mean_degree: f64,
    contiguity_islands: Vec<&'a RegionId>,
    dropped: Vec<&'a RegionId>,
    resolve: &'a ResolveReport,
    rows: Vec<NeighborRow<'a>>,
}

pub fn run(cli: &Cli, args: &NeighborsArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    apply_region_flags(&mut config, &args.region);
    if let Some(policy) = args.zero_policy { config.zero_policy = policy.into() }
    if let Some(missing) = args.missing { config.missing_policy = missing.into() }

    let (regions, resolve) = load_regions(&args.region)?;
    let graph = build_neighbors(&regions, &config.neighbor_options());
    let weights = SpatialWeights::standardize(&regions, &graph.combined, config.zero_policy)?;

    let lag = match &args.lag {
        Some(attribute) => Some(weights.lag(&regions.attribute(attribute), config.missing_policy)?),
        None => None,
    };

    let ids = regions.ids();
    let rows = (0..regions.len())
        .map(|i| NeighborRow {
            id: &ids[i],
            contiguity: graph.contiguity.neighbors(i).map(|j| &ids[j]).collect(),
            knn: graph.knn.neighbors(i).map(|j| &ids[j]).collect(),
            weights: weights.row(i).map(|(j, w)| (&ids[j], w)).collect(),
            lag: lag.as_ref().map(|lag| lag[i]),
        })
        .collect();

    let report = NeighborsReport {
        regions: regions.len(),
        k: graph.k,
        contiguity: config.contiguity,
        metric: config.metric,
        zero_policy: config.zero_policy,
        mean_degree: graph.combined.mean_degree(),
        contiguity_islands: graph.contiguity_islands().map(|i| &ids[i]).collect(),
        dropped: weights.dropped().collect(),
        resolve: &resolve,
        rows,
    };

    write_report(args.output.output.as_deref(), &report, args.output.force)
}
