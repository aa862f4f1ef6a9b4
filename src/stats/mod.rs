//! Global and local Moran's I over row-standardized spatial weights.

mod local;
mod moran;
mod normal;

pub use local::{local_moran, moran_scatter, Cluster, LocalMoran, LocalMoranRecord, Quadrant, ScatterPoint};
pub use moran::{global_moran, GlobalMoran};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::weights::{SpatialWeights, ZeroPolicy};

/// Inference settings shared by the global and local statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoranOptions {
    /// Zero-neighbor policy the caller expects the weights to carry.
    pub zero_policy: ZeroPolicy,
    /// Number of random relabellings; 0 disables permutation inference.
    pub permutations: usize,
    /// Seed for permutation inference.
    pub seed: u64,
    /// Significance level for cluster labels.
    pub alpha: f64,
}

impl Default for MoranOptions {
    fn default() -> Self {
        Self { zero_policy: ZeroPolicy::default(), permutations: 0, seed: 12345, alpha: 0.05 }
    }
}

impl MoranOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                value: self.alpha.to_string(),
                reason: "must lie strictly between 0 and 1".to_string(),
            })
        }
        Ok(())
    }
}

/// Deviations from the mean over the regions that take part in the statistic.
#[derive(Debug, Clone)]
pub(crate) struct Sample {
    /// Included row indices, ascending.
    pub positions: Vec<usize>,
    /// Deviations indexed by row; zero for dropped rows.
    pub z: Vec<f64>,
    pub mean: f64,
    /// Second moment, sum(z^2) / n.
    pub m2: f64,
    /// Kurtosis, m4 / m2^2.
    pub b2: f64,
}

impl Sample {
    /// Check the inputs shared by every Moran statistic and center `x`.
    pub(crate) fn prepare(statistic: &'static str, weights: &SpatialWeights, x: &[f64], options: &MoranOptions) -> Result<Self> {
        options.validate()?;
        weights.ensure_policy(options.zero_policy)?;
        if x.len() != weights.len() {
            return Err(Error::LengthMismatch { context: "attribute vector", expected: weights.len(), actual: x.len() })
        }

        let positions = (0..weights.len()).filter(|&i| weights.is_included(i)).collect::<Vec<_>>();
        if let Some(&i) = positions.iter().find(|&&i| !x[i].is_finite()) {
            return Err(Error::NonFiniteAttribute { region: weights.ids()[i].clone(), attribute: statistic.to_string(), value: x[i] })
        }

        let n = positions.len();
        if n < 3 {
            return Err(Error::InsufficientRegions { statistic, required: 3, actual: n })
        }

        let first = x[positions[0]];
        if positions.iter().all(|&i| x[i] == first) {
            return Err(Error::ZeroVariance { statistic, n })
        }

        let mean = positions.iter().map(|&i| x[i]).sum::<f64>() / n as f64;
        let mut z = vec![0.0; x.len()];
        for &i in &positions { z[i] = x[i] - mean }

        let m2 = positions.iter().map(|&i| z[i].powi(2)).sum::<f64>() / n as f64;
        let m4 = positions.iter().map(|&i| z[i].powi(4)).sum::<f64>() / n as f64;

        // Values that differ only by rounding noise around a large mean.
        if m2.sqrt() <= 1e-12 * mean.abs() {
            return Err(Error::ZeroVariance { statistic, n })
        }

        Ok(Self { positions, z, mean, m2, b2: m4 / (m2 * m2) })
    }

    #[inline] pub(crate) fn n(&self) -> usize { self.positions.len() }

    /// Row-standardized lag of the deviations; `None` for empty rows.
    pub(crate) fn lag(&self, weights: &SpatialWeights, i: usize) -> Option<f64> {
        (weights.degree(i) > 0).then(|| weights.row(i).map(|(j, w)| w * self.z[j]).sum())
    }
}

/// Folded permutation pseudo p-value: (min(#sim >= obs, #sim < obs) + 1) / (perms + 1).
pub(crate) fn pseudo_p(observed: f64, simulated: impl Iterator<Item = f64>, permutations: usize) -> f64 {
    let above = simulated.filter(|&s| s >= observed).count();
    let larger = above.min(permutations - above);
    (larger + 1) as f64 / (permutations + 1) as f64
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::graph::NeighborList;
    use crate::region::RegionId;
    use crate::weights::{SpatialWeights, ZeroPolicy};

    /// Rook neighbors on a `rows` x `cols` lattice, row-major.
    pub(crate) fn lattice(rows: usize, cols: usize) -> SpatialWeights {
        let index = |r: usize, c: usize| (r * cols + c) as u32;
        let lists = (0..rows * cols)
            .map(|i| {
                let (r, c) = (i / cols, i % cols);
                let mut row = Vec::new();
                if r > 0 { row.push(index(r - 1, c)) }
                if r + 1 < rows { row.push(index(r + 1, c)) }
                if c > 0 { row.push(index(r, c - 1)) }
                if c + 1 < cols { row.push(index(r, c + 1)) }
                row
            })
            .collect();
        from_lists(lists, ZeroPolicy::ZeroRow)
    }

    pub(crate) fn from_lists(lists: Vec<Vec<u32>>, policy: ZeroPolicy) -> SpatialWeights {
        let ids = (0..lists.len()).map(|i| RegionId::new(&format!("R{i:02}"))).collect::<Vec<_>>();
        SpatialWeights::from_neighbors(&ids, &NeighborList::new(lists), policy).unwrap()
    }
}
