use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{Cli, FlowsArgs};
use crate::commands::load_config;
use crate::flow::{estimate_flows, net_migration, FlowEstimate, NetMigration};
use crate::gravity::{gravity_rows, GravityRow};
use crate::io::{read_attribute_table, read_regions, read_stock_table, write_report};
use crate::region::{AttributeTable, RegionSet};

#[derive(Serialize)]
struct FlowsReport {
    estimate: FlowEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    net: Option<NetMigration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gravity: Option<Vec<GravityRow>>,
}

pub fn run(cli: &Cli, args: &FlowsArgs) -> Result<()> {
    let mut config = load_config(cli)?;
    if let Some(method) = args.method { config.flow_method = method.into() }

    let table = read_stock_table(&args.stocks)?;
    let estimate = estimate_flows(&table, args.from, args.to, config.flow_method)?;
    tracing::info!(total = estimate.total(), pairs = estimate.records().len(), "estimated flows");

    let attributes = match &args.attributes {
        Some(path) => read_attribute_table(path, &args.id_field)
            .with_context(|| format!("[flows] Failed to load attributes from {}", path.display()))?,
        None => AttributeTable::new(),
    };

    let net = if args.net {
        let net = net_migration(&table, args.from, args.to)?;
        Some(match &args.population {
            Some(column) => net.with_rates(&attributes, column)?,
            None => net,
        })
    } else {
        None
    };

    let gravity = match &args.regions {
        Some(path) => {
            let (regions, _) = RegionSet::resolve(read_regions(path, &args.id_field)?);
            let columns = args.columns.iter().map(String::as_str).collect::<Vec<_>>();
            Some(gravity_rows(&estimate, &regions, &attributes, &columns, config.metric)?)
        }
        None => None,
    };

    let report = FlowsReport { estimate, net, gravity };
    write_report(args.output.output.as_deref(), &report, args.output.force)
}
