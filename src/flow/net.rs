use serde::Serialize;

use crate::error::{Error, Result};
use crate::flow::{Period, StockTable};
use crate::region::{AttributeTable, RegionId, RegionSet};

/// Net migration of one country between two periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetMigrationRecord {
    pub id: RegionId,
    /// Change in foreign-born stock living in the country.
    pub immigrants_change: f64,
    /// Change in native-born stock living abroad.
    pub emigrants_change: f64,
    pub net: f64,
    /// Net migration per 1,000 population, when a population was supplied.
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetMigration {
    pub from: Period,
    pub to: Period,
    pub records: Vec<NetMigrationRecord>,
}

/// Derive per-country net migration: change in immigrant stock minus change in emigrant stock.
pub fn net_migration(table: &StockTable, from: Period, to: Period) -> Result<NetMigration> {
    let (imm_from, imm_to) = (table.immigrants(from)?, table.immigrants(to)?);
    let (emi_from, emi_to) = (table.emigrants(from)?, table.emigrants(to)?);

    let records = table.countries().iter().enumerate()
        .map(|(i, id)| {
            let immigrants_change = imm_to[i] - imm_from[i];
            let emigrants_change = emi_to[i] - emi_from[i];
            NetMigrationRecord {
                id: id.clone(),
                immigrants_change,
                emigrants_change,
                net: immigrants_change - emigrants_change,
                rate: None,
            }
        })
        .collect();

    Ok(NetMigration { from, to, records })
}

impl NetMigration {
    pub fn get(&self, id: &str) -> Option<&NetMigrationRecord> {
        self.records.iter().find(|record| record.id.as_str() == id)
    }

    /// Attach rates per 1,000 using the `column` of `population`.
    /// Countries without a positive population keep no rate.
    pub fn with_rates(mut self, population: &AttributeTable, column: &str) -> Result<Self> {
        if !population.has_column(column) {
            return Err(Error::InvalidParameter {
                name: "population column",
                value: column.to_string(),
                reason: "not present in attribute table".to_string(),
            })
        }
        for record in &mut self.records {
            record.rate = population.get(column, record.id.as_str())
                .filter(|&pop| pop.is_finite() && pop > 0.0)
                .map(|pop| 1000.0 * record.net / pop);
        }
        Ok(self)
    }

    /// Net migration aligned to `regions`; `None` where a region is not in the stock table.
    pub fn align(&self, regions: &RegionSet) -> Vec<Option<f64>> {
        regions.ids().iter().map(|id| self.get(id.as_str()).map(|r| r.net)).collect()
    }

    /// Rates aligned to `regions`; `None` where a region has no rate.
    pub fn align_rates(&self, regions: &RegionSet) -> Vec<Option<f64>> {
        regions.ids().iter().map(|id| self.get(id.as_str()).and_then(|r| r.rate)).collect()
    }
}
