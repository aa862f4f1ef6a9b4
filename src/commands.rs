use anyhow::{Context, Result};

use crate::cli::{Cli, RegionArgs};
use crate::config::AnalysisConfig;
use crate::geom::ResolveReport;
use crate::io::{read_attribute_table, read_regions};
use crate::region::RegionSet;

pub mod flows;
pub mod moran;
pub mod neighbors;

/// Settings from `--config`, or the defaults.
pub(crate) fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path),
        None => Ok(AnalysisConfig::default()),
    }
}

/// Apply the graph flags shared by the region commands.
pub(crate) fn apply_region_flags(config: &mut AnalysisConfig, args: &RegionArgs) {
    if let Some(k) = args.k { config.k = k }
    if let Some(contiguity) = args.contiguity { config.contiguity = contiguity.into() }
    if let Some(metric) = args.metric { config.metric = metric.into() }
}

/// Read and resolve the region file, joining the attribute CSV when given.
pub(crate) fn load_regions(args: &RegionArgs) -> Result<(RegionSet, ResolveReport)> {
    let features = read_regions(&args.regions, &args.id_field)?;
    let (regions, report) = RegionSet::resolve(features);
    if regions.is_empty() {
        anyhow::bail!("[commands] No usable regions in {}", args.regions.display());
    }
    tracing::info!(regions = regions.len(), excluded = report.excluded.len(), "loaded regions");

    match &args.attributes {
        Some(path) => {
            let table = read_attribute_table(path, &args.id_field)
                .with_context(|| format!("[commands] Failed to load attributes from {}", path.display()))?;
            Ok((regions.with_attributes(&table), report))
        }
        None => Ok((regions, report)),
    }
}
