use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cli::{Cli, MoranArgs};
use crate::commands::{apply_region_flags, load_config, load_regions};
use crate::geom::ResolveReport;
use crate::graph::build_neighbors;
use crate::io::write_report;
use crate::region::RegionId;
use crate::stats::{global_moran, local_moran, Cluster, GlobalMoran, LocalMoran};
use crate::weights::SpatialWeights;

#[derive(Serialize)]
struct MoranReport<'a> {
    attribute: &'a str,
    regions: usize,
    dropped: Vec<&'a RegionId>,
    resolve: &'a ResolveReport,
    global: GlobalMoran,
    clusters: BTreeMap<Cluster, usize>,
    local: LocalMoran,
}

pub fn run(cli: &Cli, args: &MoranArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    apply_region_flags(&mut config, &args.region);
    if let Some(policy) = args.zero_policy { config.zero_policy = policy.into() }
    if let Some(permutations) = args.permutations { config.permutations = permutations }
    if let Some(seed) = args.seed { config.seed = seed }
    if let Some(alpha) = args.alpha { config.alpha = alpha }
    config.validate()?;

    let (regions, resolve) = load_regions(&args.region)?;
    let graph = build_neighbors(&regions, &config.neighbor_options());
    let weights = SpatialWeights::standardize(&regions, &graph.combined, config.zero_policy)?;

    let values = regions.attribute(&args.attribute);
    let missing = (0..regions.len())
        .filter(|&i| weights.is_included(i) && values[i].is_none())
        .map(|i| regions.ids()[i].as_str())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        bail!("[moran] {} regions have no `{}` value: {}", missing.len(), args.attribute, missing.join(", "));
    }
    // Dropped regions take no part in the statistics, so their value is never read.
    let x = values.iter().map(|v| v.unwrap_or(f64::NAN)).collect::<Vec<_>>();

    let options = config.moran_options();
    let global = global_moran(&weights, &x, &options)?;
    let local = local_moran(&weights, &x, &options)?;
    tracing::info!(statistic = global.statistic, p = ?global.inference_p(), "global Moran's I");

    let report = MoranReport {
        attribute: &args.attribute,
        regions: weights.included_count(),
        dropped: weights.dropped().collect(),
        resolve: &resolve,
        global,
        clusters: local.counts(),
        local,
    };

    write_report(args.output.output.as_deref(), &report, args.output.force)
}
