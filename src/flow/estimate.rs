use ndarray::{Array2, Axis};
use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::flow::{Period, StockTable};
use crate::region::RegionId;

/// How bilateral flows are derived from two stock snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowMethod {
    /// Distribute the global change in foreign-born stock by the
    /// origin shares of each destination's stock at the first period.
    #[default]
    Dennett,
    /// Per-pair positive stock change, max(s[t+1] - s[t], 0).
    StockDifference,
}

/// One nonzero origin -> destination flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowRecord {
    pub origin: RegionId,
    pub destination: RegionId,
    pub flow: f64,
    pub rate: f64,
}

/// Estimated flows between two periods. Rows are origins, columns destinations,
/// both in the order of the stock table's countries.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEstimate {
    countries: Vec<RegionId>,
    flows: Array2<f64>,
    rates: Array2<f64>,
    total: f64,
    method: FlowMethod,
    from: Period,
    to: Period,
}

impl FlowEstimate {
    #[inline] pub fn countries(&self) -> &[RegionId] { &self.countries }

    /// Get the flow matrix.
    #[inline] pub fn flows(&self) -> &Array2<f64> { &self.flows }

    /// Get the rate matrix (origin shares per destination).
    #[inline] pub fn rates(&self) -> &Array2<f64> { &self.rates }

    /// Get the total migration volume M.
    #[inline] pub fn total(&self) -> f64 { self.total }

    #[inline] pub fn method(&self) -> FlowMethod { self.method }

    #[inline] pub fn periods(&self) -> (Period, Period) { (self.from, self.to) }

    fn position(&self, id: &str) -> Result<usize> {
        self.countries.binary_search_by(|c| c.as_str().cmp(id))
            .map_err(|_| Error::UnknownRegion(RegionId::new(id)))
    }

    /// Get the estimated flow from `origin` to `destination`.
    pub fn flow(&self, origin: &str, destination: &str) -> Result<f64> {
        Ok(self.flows[[self.position(origin)?, self.position(destination)?]])
    }

    /// Get the rate of `origin` at `destination`.
    pub fn rate(&self, origin: &str, destination: &str) -> Result<f64> {
        Ok(self.rates[[self.position(origin)?, self.position(destination)?]])
    }

    /// Total estimated inflow per destination.
    pub fn inflows(&self) -> Vec<(RegionId, f64)> {
        let totals = self.flows.sum_axis(Axis(0));
        self.countries.iter().cloned().zip(totals.iter().copied()).collect()
    }

    /// Total estimated outflow per origin.
    pub fn outflows(&self) -> Vec<(RegionId, f64)> {
        let totals = self.flows.sum_axis(Axis(1));
        self.countries.iter().cloned().zip(totals.iter().copied()).collect()
    }

    /// Nonzero flows in origin-major order.
    pub fn records(&self) -> Vec<FlowRecord> {
        self.flows.indexed_iter()
            .filter(|&(_, &flow)| flow > 0.0)
            .map(|((g, h), &flow)| FlowRecord {
                origin: self.countries[g].clone(),
                destination: self.countries[h].clone(),
                flow,
                rate: self.rates[[g, h]],
            })
            .collect()
    }
}

impl Serialize for FlowEstimate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FlowEstimate", 5)?;
        state.serialize_field("method", &self.method)?;
        state.serialize_field("from", &self.from)?;
        state.serialize_field("to", &self.to)?;
        state.serialize_field("total", &self.total)?;
        state.serialize_field("flows", &self.records())?;
        state.end()
    }
}

/// Share of each origin in the foreign-born stock of each destination.
/// Destinations without foreign-born stock get a zero column.
fn origin_shares(stock: &Array2<f64>) -> Array2<f64> {
    let mut rates = stock.clone();
    rates.diag_mut().fill(0.0);
    for mut column in rates.columns_mut() {
        let total = column.sum();
        if total > 0.0 {
            column /= total;
        } else {
            column.fill(0.0);
        }
    }
    rates
}

/// Sum over destinations of the absolute change in foreign-born stock.
fn foreign_born_change(table: &StockTable, from: Period, to: Period) -> Result<f64> {
    let before = table.immigrants(from)?;
    let after = table.immigrants(to)?;
    Ok(before.iter().zip(&after).map(|(b, a)| (a - b).abs()).sum())
}

/// Estimate origin -> destination flows between periods `from` and `to`.
pub fn estimate_flows(table: &StockTable, from: Period, to: Period, method: FlowMethod) -> Result<FlowEstimate> {
    if from >= to {
        return Err(Error::InvalidParameter {
            name: "to",
            value: to.to_string(),
            reason: format!("must come after the first period {from}"),
        })
    }
    let before = table.snapshot(from)?;
    let after = table.snapshot(to)?;

    let (flows, rates, total) = match method {
        FlowMethod::Dennett => {
            let rates = origin_shares(before);
            let total = foreign_born_change(table, from, to)?;
            (&rates * total, rates, total)
        }
        FlowMethod::StockDifference => {
            let mut flows = (after - before).mapv(|delta| delta.max(0.0));
            flows.diag_mut().fill(0.0);
            let total = flows.sum();
            (flows, origin_shares(before), total)
        }
    };

    tracing::debug!(?method, from, to, total, "estimated bilateral flows");

    Ok(FlowEstimate { countries: table.countries().to_vec(), flows, rates, total, method, from, to })
}
