use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::region::{RegionId, RegionSet};

/// Which end of a pair a residual is attributed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    #[default]
    Origin,
    Destination,
}

/// Residual of one origin -> destination observation from an external regression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairResidual {
    pub origin: RegionId,
    pub destination: RegionId,
    pub residual: f64,
}

impl PairResidual {
    pub fn new(origin: impl Into<RegionId>, destination: impl Into<RegionId>, residual: f64) -> Self {
        Self { origin: origin.into(), destination: destination.into(), residual }
    }
}

/// Mean residual per region on the chosen side, aligned to `regions`.
/// Regions without any pair are `None`; pairs naming unknown regions are skipped.
pub fn aggregate_residuals(residuals: &[PairResidual], side: Side, regions: &RegionSet) -> Result<Vec<Option<f64>>> {
    let mut sums: AHashMap<usize, (f64, usize)> = AHashMap::new();
    let mut skipped = 0usize;

    for pair in residuals {
        let id = match side {
            Side::Origin => &pair.origin,
            Side::Destination => &pair.destination,
        };
        if !pair.residual.is_finite() {
            return Err(Error::NonFiniteAttribute { region: id.clone(), attribute: "residual".to_string(), value: pair.residual })
        }
        match regions.index_of(id.as_str()) {
            Some(i) => {
                let entry = sums.entry(i).or_insert((0.0, 0));
                entry.0 += pair.residual;
                entry.1 += 1;
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::debug!(skipped, ?side, "residuals for regions outside the region set");
    }

    Ok((0..regions.len())
        .map(|i| sums.get(&i).map(|&(sum, count)| sum / count as f64))
        .collect())
}
