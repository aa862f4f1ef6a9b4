use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::NeighborList;
use crate::region::{RegionId, RegionSet};

/// What to do with regions that have no neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroPolicy {
    /// Refuse to build weights.
    Fail,
    /// Remove the region (and links to it) from all subsequent statistics.
    Drop,
    /// Keep the region with an all-zero row; its lag is undefined and it
    /// is removed from the rows of other regions.
    #[default]
    ZeroRow,
}

/// How `lag` treats missing attribute values among a region's neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// Skip missing neighbors and re-normalize over the rest.
    #[default]
    Renormalize,
    /// Any missing neighbor makes the lag undefined.
    Propagate,
}

/// Row-standardized spatial weights in compressed sparse row format.
#[derive(Debug, Clone)]
pub struct SpatialWeights {
    ids: Vec<RegionId>,
    index: AHashMap<RegionId, u32>,
    offsets: Vec<u32>,
    neighbors: Vec<u32>,
    weights: Vec<f64>,
    included: Vec<bool>,
    policy: ZeroPolicy,
}

impl SpatialWeights {
    /// Row-standardize `neighbors` (aligned with `regions`): w(i,j) = 1/|N(i)|.
    pub fn standardize(regions: &RegionSet, neighbors: &NeighborList, policy: ZeroPolicy) -> Result<Self> {
        Self::from_neighbors(regions.ids(), neighbors, policy)
    }

    /// Row-standardize a neighbor list whose rows are labelled by `ids`.
    pub fn from_neighbors(ids: &[RegionId], neighbors: &NeighborList, policy: ZeroPolicy) -> Result<Self> {
        if neighbors.len() != ids.len() {
            return Err(Error::LengthMismatch { context: "neighbor list", expected: ids.len(), actual: neighbors.len() })
        }
        let n = ids.len();
        let mut seen = AHashSet::with_capacity(n);
        if let Some(id) = ids.iter().find(|&id| !seen.insert(id)) {
            return Err(Error::DuplicateRegion(id.clone()))
        }

        if policy == ZeroPolicy::Fail {
            if let Some(i) = neighbors.islands().next() {
                return Err(Error::NoNeighbors(ids[i].clone()))
            }
        }

        // Rows with at least one linked target. Emptying a row can leave another row
        // pointing only at empty rows, so this repeats until nothing changes.
        let mut linked = vec![true; n];
        loop {
            let isolated = (0..n)
                .filter(|&i| linked[i] && !neighbors.neighbors(i).any(|j| linked[j]))
                .collect::<Vec<_>>();
            if isolated.is_empty() { break }
            for i in isolated {
                match policy {
                    ZeroPolicy::Drop => tracing::warn!(region = %ids[i], "region has no neighbors, dropping it"),
                    _ => tracing::warn!(region = %ids[i], "region has no neighbors, keeping an empty weights row"),
                }
                linked[i] = false;
            }
        }

        // Empty rows stay in the statistics under `ZeroRow` but never enter a lag.
        let included = match policy {
            ZeroPolicy::Drop => linked.clone(),
            _ => vec![true; n],
        };

        let mut offsets = Vec::with_capacity(n + 1);
        let mut targets = Vec::with_capacity(neighbors.edge_count());
        let mut weights = Vec::with_capacity(neighbors.edge_count());
        offsets.push(0u32);
        for i in 0..n {
            if included[i] {
                let row = neighbors.neighbors(i).filter(|&j| linked[j]).collect::<Vec<_>>();
                let w = 1.0 / row.len() as f64;
                for j in row {
                    targets.push(j as u32);
                    weights.push(w);
                }
            }
            offsets.push(targets.len() as u32);
        }

        Ok(Self {
            ids: ids.to_vec(),
            index: ids.iter().enumerate().map(|(i, id)| (id.clone(), i as u32)).collect(),
            offsets,
            neighbors: targets,
            weights,
            included,
            policy,
        })
    }

    /// Get the number of rows (all regions, including dropped ones).
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Get the zero-neighbor policy these weights were built with.
    #[inline] pub fn policy(&self) -> ZeroPolicy { self.policy }

    /// Get the region ids in row order.
    #[inline] pub fn ids(&self) -> &[RegionId] { &self.ids }

    /// Check whether row `i` takes part in statistics.
    #[inline] pub fn is_included(&self, i: usize) -> bool { self.included[i] }

    /// Get the number of rows that take part in statistics.
    pub fn included_count(&self) -> usize { self.included.iter().filter(|&&b| b).count() }

    /// Get the regions removed under `ZeroPolicy::Drop`.
    pub fn dropped(&self) -> impl Iterator<Item = &RegionId> + '_ {
        self.ids.iter().zip(&self.included).filter(|(_, inc)| !**inc).map(|(id, _)| id)
    }

    /// Get the included regions whose row is empty.
    pub fn islands(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| self.included[i] && self.degree(i) == 0)
    }

    #[inline]
    fn range(&self, i: usize) -> std::ops::Range<usize> {
        self.offsets[i] as usize .. self.offsets[i + 1] as usize
    }

    /// Get the number of neighbors in row `i`.
    #[inline] pub fn degree(&self, i: usize) -> usize { self.range(i).len() }

    /// Get an iterator over (neighbor, weight) pairs of row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.range(i).map(move |e| (self.neighbors[e] as usize, self.weights[e]))
    }

    /// Sum of the weights in row `i`.
    pub fn row_sum(&self, i: usize) -> f64 { self.row(i).map(|(_, w)| w).sum() }

    /// Sum of squared weights in row `i`.
    pub fn row_sum_sq(&self, i: usize) -> f64 { self.row(i).map(|(_, w)| w * w).sum() }

    /// Get the weights row of a region by id.
    pub fn neighbors_of(&self, id: &str) -> Result<Vec<(&RegionId, f64)>> {
        let i = self.index.get(id).ok_or_else(|| Error::UnknownRegion(RegionId::new(id)))?;
        Ok(self.row(*i as usize).map(|(j, w)| (&self.ids[j], w)).collect())
    }

    /// Fail with `PolicyMismatch` unless `requested` is the policy used to build these weights.
    pub fn ensure_policy(&self, requested: ZeroPolicy) -> Result<()> {
        if requested != self.policy {
            return Err(Error::PolicyMismatch { built: self.policy, requested })
        }
        Ok(())
    }

    /// Spatial lag: lag(x)[i] = sum_j w(i,j) x[j].
    /// `None` for empty rows, dropped regions, and rows left without usable neighbors.
    pub fn lag(&self, x: &[Option<f64>], missing: MissingPolicy) -> Result<Vec<Option<f64>>> {
        if x.len() != self.len() {
            return Err(Error::LengthMismatch { context: "lag attribute", expected: self.len(), actual: x.len() })
        }
        if let Some((i, v)) = x.iter().enumerate().find_map(|(i, v)| v.filter(|v| !v.is_finite()).map(|v| (i, v))) {
            return Err(Error::NonFiniteAttribute { region: self.ids[i].clone(), attribute: "lag input".to_string(), value: v })
        }

        Ok((0..self.len())
            .map(|i| {
                if !self.included[i] || self.degree(i) == 0 { return None }

                let (mut sum, mut weight) = (0.0, 0.0);
                for (j, w) in self.row(i) {
                    match x[j] {
                        Some(v) => { sum += w * v; weight += w; }
                        None if missing == MissingPolicy::Propagate => return None,
                        None => {}
                    }
                }
                (weight > 0.0).then(|| sum / weight)
            })
            .collect())
    }

    /// Spatial lag of a complete attribute vector.
    pub fn lag_values(&self, x: &[f64]) -> Result<Vec<Option<f64>>> {
        self.lag(&x.iter().map(|&v| Some(v)).collect::<Vec<_>>(), MissingPolicy::Propagate)
    }

    /// Total weight S0 = sum_ij w(i,j).
    pub fn s0(&self) -> f64 { self.weights.iter().sum() }

    /// S1 = 1/2 sum_ij (w(i,j) + w(j,i))^2.
    pub fn s1(&self) -> f64 {
        let lookup = (0..self.len())
            .flat_map(|i| self.row(i).map(move |(j, w)| ((i as u32, j as u32), w)))
            .collect::<AHashMap<_, _>>();

        let sum: f64 = lookup.iter()
            .map(|(&(i, j), &w)| match lookup.get(&(j, i)) {
                Some(&back) => (w + back).powi(2),
                // The reverse pair is absent, so (j,i) contributes w^2 as well.
                None => 2.0 * w * w,
            })
            .sum();
        0.5 * sum
    }

    /// S2 = sum_i (row sum_i + column sum_i)^2.
    pub fn s2(&self) -> f64 {
        let mut col_sums = vec![0.0; self.len()];
        for i in 0..self.len() {
            for (j, w) in self.row(i) { col_sums[j] += w }
        }
        (0..self.len())
            .filter(|&i| self.included[i])
            .map(|i| (self.row_sum(i) + col_sums[i]).powi(2))
            .sum()
    }
}
