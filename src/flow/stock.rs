use std::collections::BTreeMap;

use ahash::AHashMap;
use ndarray::{Array2, Axis};

use crate::error::{Error, Result};
use crate::region::RegionId;

pub type Period = i32;

/// Number of people born in `origin` living in `destination` at `period`.
#[derive(Debug, Clone, PartialEq)]
pub struct StockEntry {
    pub origin: RegionId,
    pub destination: RegionId,
    pub period: Period,
    pub stock: f64,
}

impl StockEntry {
    pub fn new(origin: impl Into<RegionId>, destination: impl Into<RegionId>, period: Period, stock: f64) -> Self {
        Self { origin: origin.into(), destination: destination.into(), period, stock }
    }
}

/// Migrant stocks as one origin x destination matrix per period.
/// Countries are sorted by id; pairs absent from the input hold zero.
#[derive(Debug, Clone)]
pub struct StockTable {
    countries: Vec<RegionId>,
    index: AHashMap<RegionId, u32>,
    snapshots: BTreeMap<Period, Array2<f64>>,
}

impl StockTable {
    /// Build a table from entries. Stocks must be finite and nonnegative;
    /// repeated (origin, destination, period) entries are summed.
    pub fn from_entries(entries: impl IntoIterator<Item = StockEntry>) -> Result<Self> {
        let entries = entries.into_iter().collect::<Vec<_>>();

        for entry in &entries {
            if !entry.stock.is_finite() {
                return Err(Error::NonFiniteAttribute {
                    region: entry.origin.clone(),
                    attribute: format!("stock in {} ({})", entry.destination, entry.period),
                    value: entry.stock,
                })
            }
            if entry.stock < 0.0 {
                return Err(Error::NegativeStock {
                    origin: entry.origin.clone(),
                    destination: entry.destination.clone(),
                    period: entry.period,
                    value: entry.stock,
                })
            }
        }

        let mut countries = entries.iter()
            .flat_map(|entry| [entry.origin.clone(), entry.destination.clone()])
            .collect::<Vec<_>>();
        countries.sort();
        countries.dedup();

        let index = countries.iter().enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect::<AHashMap<_, _>>();

        let n = countries.len();
        let mut snapshots = BTreeMap::new();
        let mut duplicates = 0usize;
        let mut seen = ahash::AHashSet::with_capacity(entries.len());
        for entry in &entries {
            let (g, h) = (index[&entry.origin] as usize, index[&entry.destination] as usize);
            if !seen.insert((g, h, entry.period)) { duplicates += 1 }
            snapshots.entry(entry.period)
                .or_insert_with(|| Array2::zeros((n, n)))[[g, h]] += entry.stock;
        }
        if duplicates > 0 {
            tracing::warn!(duplicates, "summed repeated stock entries");
        }

        tracing::debug!(countries = n, periods = snapshots.len(), "built stock table");
        Ok(Self { countries, index, snapshots })
    }

    /// Get the countries in matrix order.
    #[inline] pub fn countries(&self) -> &[RegionId] { &self.countries }

    /// Get the periods present in the table, ascending.
    pub fn periods(&self) -> impl Iterator<Item = Period> + '_ { self.snapshots.keys().copied() }

    #[inline] pub fn has_period(&self, period: Period) -> bool { self.snapshots.contains_key(&period) }

    /// Get the matrix index of a country.
    #[inline]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|&i| i as usize)
    }

    /// Get the origin x destination matrix of a period.
    pub fn snapshot(&self, period: Period) -> Result<&Array2<f64>> {
        self.snapshots.get(&period).ok_or(Error::MissingPeriod(period))
    }

    /// Get one stock; unknown countries and absent pairs hold zero.
    pub fn get(&self, origin: &str, destination: &str, period: Period) -> Result<f64> {
        let snapshot = self.snapshot(period)?;
        Ok(match (self.index_of(origin), self.index_of(destination)) {
            (Some(g), Some(h)) => snapshot[[g, h]],
            _ => 0.0,
        })
    }

    /// Foreign-born stock living in each country (column sums without the diagonal).
    pub fn immigrants(&self, period: Period) -> Result<Vec<f64>> {
        let snapshot = self.snapshot(period)?;
        Ok(snapshot.sum_axis(Axis(0)).iter().enumerate()
            .map(|(h, &total)| total - snapshot[[h, h]])
            .collect())
    }

    /// Stock born in each country living abroad (row sums without the diagonal).
    pub fn emigrants(&self, period: Period) -> Result<Vec<f64>> {
        let snapshot = self.snapshot(period)?;
        Ok(snapshot.sum_axis(Axis(1)).iter().enumerate()
            .map(|(g, &total)| total - snapshot[[g, g]])
            .collect())
    }
}
