use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::index, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::region::RegionId;
use crate::stats::{normal::two_tailed_p, pseudo_p, MoranOptions, Sample};
use crate::weights::SpatialWeights;

const STATISTIC: &str = "local Moran's I";

/// Position in the Moran scatter plot, relative to the means of the value and its lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Quadrant {
    #[serde(rename = "High-High")] HighHigh,
    #[serde(rename = "Low-Low")] LowLow,
    #[serde(rename = "High-Low")] HighLow,
    #[serde(rename = "Low-High")] LowHigh,
}

impl Quadrant {
    /// Classify a value and its lag against their means. Equal to the mean counts as low.
    pub fn classify(value: f64, value_mean: f64, lag: f64, lag_mean: f64) -> Self {
        match (value > value_mean, lag > lag_mean) {
            (true, true) => Quadrant::HighHigh,
            (false, false) => Quadrant::LowLow,
            (true, false) => Quadrant::HighLow,
            (false, true) => Quadrant::LowHigh,
        }
    }
}

/// LISA cluster label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Cluster {
    #[serde(rename = "High-High")] HighHigh,
    #[serde(rename = "Low-Low")] LowLow,
    #[serde(rename = "High-Low")] HighLow,
    #[serde(rename = "Low-High")] LowHigh,
    #[serde(rename = "Not significant")] NotSignificant,
    /// The region has no neighbors, so its local statistic does not exist.
    #[serde(rename = "Undefined")] Undefined,
}

impl From<Quadrant> for Cluster {
    fn from(quadrant: Quadrant) -> Self {
        match quadrant {
            Quadrant::HighHigh => Cluster::HighHigh,
            Quadrant::LowLow => Cluster::LowLow,
            Quadrant::HighLow => Cluster::HighLow,
            Quadrant::LowHigh => Cluster::LowHigh,
        }
    }
}

/// Local Moran's I for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalMoranRecord {
    pub id: RegionId,
    pub value: f64,
    /// (value - mean) / sd
    pub standardized: f64,
    /// Spatial lag of the raw value.
    pub lag: Option<f64>,
    pub statistic: Option<f64>,
    pub expectation: Option<f64>,
    pub variance: Option<f64>,
    pub z: Option<f64>,
    pub p_value: Option<f64>,
    pub pseudo_p_value: Option<f64>,
    pub quadrant: Option<Quadrant>,
    pub cluster: Cluster,
    pub significant: bool,
}

/// Local Moran's I for every region taking part in the analysis, in row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalMoran {
    pub records: Vec<LocalMoranRecord>,
    pub alpha: f64,
    pub permutations: usize,
}

impl LocalMoran {
    /// Look up the record of a region by id.
    pub fn get(&self, id: &str) -> Option<&LocalMoranRecord> {
        self.records.iter().find(|record| record.id.as_str() == id)
    }

    /// Count regions per cluster label.
    pub fn counts(&self) -> BTreeMap<Cluster, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.cluster).or_insert(0) += 1;
        }
        counts
    }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }
}

/// One point of the Moran scatter plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub id: RegionId,
    /// Standardized value.
    pub value: f64,
    /// Spatial lag of the standardized value.
    pub lag: f64,
}

/// Standardized values against their spatial lag, for regions with a defined lag.
/// The slope of the least-squares line through these points is global Moran's I.
pub fn moran_scatter(weights: &SpatialWeights, x: &[f64], options: &MoranOptions) -> Result<Vec<ScatterPoint>> {
    let sample = Sample::prepare("Moran scatter", weights, x, options)?;
    let sd = sample.m2.sqrt();
    Ok(sample.positions.iter()
        .filter_map(|&i| sample.lag(weights, i).map(|lag| ScatterPoint {
            id: weights.ids()[i].clone(),
            value: sample.z[i] / sd,
            lag: lag / sd,
        }))
        .collect())
}

/// Conditional permutation: keep region `i` fixed and draw its neighbors' values
/// from the other n - 1 included regions.
fn conditional_pseudo_p(weights: &SpatialWeights, sample: &Sample, rank: usize, observed: f64, options: &MoranOptions) -> f64 {
    let i = sample.positions[rank];
    let row = weights.row(i).map(|(_, w)| w).collect::<Vec<_>>();
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(i as u64));

    let simulated = (0..options.permutations).map(|_| {
        let drawn = index::sample(&mut rng, sample.n() - 1, row.len());
        let lag = drawn.iter().zip(&row)
            .map(|(r, w)| {
                // Skip over region i itself.
                let j = sample.positions[if r < rank { r } else { r + 1 }];
                w * sample.z[j]
            })
            .sum::<f64>();
        sample.z[i] * lag / sample.m2
    });
    pseudo_p(observed, simulated, options.permutations)
}

/// Expectation and variance of I_i when z_i is held fixed and the other n - 1
/// deviations are randomly assigned to the neighbors of i.
///
/// E[I_i] = -z_i^2 w_i / ((n - 1) m2)
/// Var[I_i] = (z_i / m2)^2 n / (n - 2) (w_i2 - w_i^2 / (n - 1)) (m2 - z_i^2 / (n - 1))
fn conditional_moments(zi: f64, wi: f64, wi2: f64, n: f64, m2: f64) -> (f64, f64) {
    let expectation = -zi * zi * wi / ((n - 1.0) * m2);
    let variance = (zi / m2).powi(2) * n / (n - 2.0)
        * (wi2 - wi * wi / (n - 1.0))
        * (m2 - zi * zi / (n - 1.0));
    (expectation, variance)
}

/// Compute local Moran's I (LISA) of `x` for every included region.
/// I_i = z_i / m2 * sum_j w(i,j) z_j, with moments conditional on z_i.
pub fn local_moran(weights: &SpatialWeights, x: &[f64], options: &MoranOptions) -> Result<LocalMoran> {
    let sample = Sample::prepare(STATISTIC, weights, x, options)?;
    let n = sample.n() as f64;
    let sd = sample.m2.sqrt();

    let lags = sample.positions.iter().map(|&i| sample.lag(weights, i)).collect::<Vec<_>>();
    let defined = lags.iter().flatten().copied().collect::<Vec<_>>();
    // Lags of deviations; the mean of raw lags is this plus the value mean.
    let lag_mean = if defined.is_empty() { 0.0 } else { defined.iter().sum::<f64>() / defined.len() as f64 };

    let records = sample.positions.par_iter().enumerate()
        .map(|(rank, &i)| {
            let id = weights.ids()[i].clone();
            let zi = sample.z[i];

            let Some(lag) = lags[rank] else {
                return LocalMoranRecord {
                    id,
                    value: x[i],
                    standardized: zi / sd,
                    lag: None,
                    statistic: None,
                    expectation: None,
                    variance: None,
                    z: None,
                    p_value: None,
                    pseudo_p_value: None,
                    quadrant: None,
                    cluster: Cluster::Undefined,
                    significant: false,
                }
            };

            let statistic = zi * lag / sample.m2;
            let (expectation, variance) =
                conditional_moments(zi, weights.row_sum(i), weights.row_sum_sq(i), n, sample.m2);
            let z = (variance > 0.0).then(|| (statistic - expectation) / variance.sqrt());
            let p_value = z.map(two_tailed_p);
            let pseudo_p_value = (options.permutations > 0)
                .then(|| conditional_pseudo_p(weights, &sample, rank, statistic, options));

            let quadrant = Quadrant::classify(zi, 0.0, lag, lag_mean);
            let significant = pseudo_p_value.or(p_value).is_some_and(|p| p <= options.alpha);

            LocalMoranRecord {
                id,
                value: x[i],
                standardized: zi / sd,
                lag: Some(lag + sample.mean),
                statistic: Some(statistic),
                expectation: Some(expectation),
                variance: Some(variance),
                z,
                p_value,
                pseudo_p_value,
                quadrant: Some(quadrant),
                cluster: if significant { quadrant.into() } else { Cluster::NotSignificant },
                significant,
            }
        })
        .collect::<Vec<_>>();

    let result = LocalMoran { records, alpha: options.alpha, permutations: options.permutations };
    tracing::debug!(regions = result.len(), clusters = ?result.counts(), "computed local Moran's I");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::testing::{from_lists, lattice};
    use crate::stats::global_moran;
    use crate::weights::ZeroPolicy;

    fn path(n: usize) -> SpatialWeights {
        let lists = (0..n)
            .map(|i| {
                let mut row = Vec::new();
                if i > 0 { row.push(i as u32 - 1) }
                if i + 1 < n { row.push(i as u32 + 1) }
                row
            })
            .collect();
        from_lists(lists, ZeroPolicy::ZeroRow)
    }

    #[test]
    fn classify_ties_as_low() {
        assert_eq!(Quadrant::classify(1.0, 1.0, 2.0, 1.0), Quadrant::LowHigh);
        assert_eq!(Quadrant::classify(2.0, 1.0, 1.0, 1.0), Quadrant::HighLow);
        assert_eq!(Quadrant::classify(1.0, 1.0, 1.0, 1.0), Quadrant::LowLow);
        assert_eq!(Quadrant::classify(2.0, 1.0, 2.0, 1.0), Quadrant::HighHigh);
    }

    #[test]
    fn quadrants_on_a_path() {
        // mean(x) = 5; lags are 10, 5, 5, 0, 5, 0 with mean 25/6.
        let weights = path(6);
        let x = [10.0, 10.0, 0.0, 0.0, 0.0, 10.0];
        let local = local_moran(&weights, &x, &MoranOptions::default()).unwrap();

        let quadrants = local.records.iter().map(|r| r.quadrant.unwrap()).collect::<Vec<_>>();
        assert_eq!(quadrants, vec![
            Quadrant::HighHigh, Quadrant::HighHigh, Quadrant::LowHigh,
            Quadrant::LowLow, Quadrant::LowHigh, Quadrant::HighLow,
        ]);
        assert!((local.records[1].lag.unwrap() - 5.0).abs() < 1e-12);
        assert!((local.records[4].lag.unwrap() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn checkerboard_values() {
        let weights = lattice(4, 4);
        let x = (0..16).map(|i| ((i / 4 + i % 4) % 2) as f64).collect::<Vec<_>>();
        let local = local_moran(&weights, &x, &MoranOptions::default()).unwrap();

        for record in &local.records {
            assert!((record.statistic.unwrap() + 1.0).abs() < 1e-12);
            let expected = if record.value > 0.5 { Quadrant::HighLow } else { Quadrant::LowHigh };
            assert_eq!(record.quadrant, Some(expected));
            assert_eq!(record.significant, record.cluster != Cluster::NotSignificant);
        }
        // z_i^2 = m2 everywhere, so E[I_i] = -w_i / 15.
        assert!((local.records[0].expectation.unwrap() + 1.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn moments_condition_on_the_value() {
        // x = 1..5 on a path: z = -2..2, m2 = 2.
        let weights = path(5);
        let local = local_moran(&weights, &[1.0, 2.0, 3.0, 4.0, 5.0], &MoranOptions::default()).unwrap();

        // End region: one neighbor, I = 1, E = -4 / 8, Var = 1 * 5/3 * 3/4 * 1.
        let end = &local.records[0];
        assert!((end.statistic.unwrap() - 1.0).abs() < 1e-12);
        assert!((end.expectation.unwrap() + 0.5).abs() < 1e-12);
        assert!((end.variance.unwrap() - 1.25).abs() < 1e-12);
        assert!((end.z.unwrap() - 1.5 / 1.25f64.sqrt()).abs() < 1e-12);

        // Second region: two half weights, I = 1/2, E = -1/8, Var = 1/4 * 5/3 * 1/4 * 7/4.
        let second = &local.records[1];
        assert!((second.statistic.unwrap() - 0.5).abs() < 1e-12);
        assert!((second.expectation.unwrap() + 0.125).abs() < 1e-12);
        assert!((second.variance.unwrap() - 35.0 / 192.0).abs() < 1e-12);

        // The middle value equals the mean, so I_i is identically zero.
        let middle = &local.records[2];
        assert_eq!(middle.statistic, Some(0.0));
        assert_eq!(middle.expectation, Some(0.0));
        assert_eq!(middle.variance, Some(0.0));
        assert_eq!(middle.z, None);
        assert_eq!(middle.p_value, None);
        assert!(!middle.significant);
        assert_eq!(middle.cluster, Cluster::NotSignificant);
    }

    #[test]
    fn local_values_average_to_global() {
        // Row-standardized weights without islands: sum_i I_i / n = I.
        let weights = lattice(3, 4);
        let x = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0, 8.0];
        let options = MoranOptions::default();
        let local = local_moran(&weights, &x, &options).unwrap();
        let global = global_moran(&weights, &x, &options).unwrap();

        let mean = local.records.iter().map(|r| r.statistic.unwrap()).sum::<f64>() / 12.0;
        assert!((mean - global.statistic).abs() < 1e-12);
    }

    #[test]
    fn islands_are_undefined() {
        let weights = from_lists(vec![vec![1], vec![0, 2], vec![1], vec![]], ZeroPolicy::ZeroRow);
        let local = local_moran(&weights, &[1.0, 2.0, 3.0, 7.0], &MoranOptions::default()).unwrap();

        assert_eq!(local.len(), 4);
        let island = local.get("R03").unwrap();
        assert_eq!(island.cluster, Cluster::Undefined);
        assert_eq!(island.statistic, None);
        assert_eq!(island.quadrant, None);
        assert!(!island.significant);
        assert_eq!(local.counts().get(&Cluster::Undefined), Some(&1));
    }

    #[test]
    fn dropped_regions_are_left_out() {
        let weights = from_lists(vec![vec![1], vec![0, 2], vec![1], vec![]], ZeroPolicy::Drop);
        let options = MoranOptions { zero_policy: ZeroPolicy::Drop, ..Default::default() };
        let local = local_moran(&weights, &[1.0, 2.0, 3.0, f64::NAN], &options).unwrap();
        assert_eq!(local.len(), 3);
        assert!(local.get("R03").is_none());
    }

    #[test]
    fn conditional_permutation_is_deterministic() {
        let weights = lattice(4, 4);
        let x = (0..16).map(|i| if i % 4 < 2 { 0.0 } else { 1.0 } + (i as f64) * 0.01).collect::<Vec<_>>();
        let options = MoranOptions { permutations: 199, seed: 42, ..Default::default() };

        let a = local_moran(&weights, &x, &options).unwrap();
        let b = local_moran(&weights, &x, &options).unwrap();
        assert_eq!(a, b);

        for record in &a.records {
            let p = record.pseudo_p_value.unwrap();
            assert!((1.0 / 200.0..=0.5 + 1e-12).contains(&p));
            assert_eq!(record.significant, p <= options.alpha);
        }
    }

    #[test]
    fn scatter_slope_is_global_moran() {
        let weights = lattice(3, 3);
        let x = [1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 3.0, 4.0, 6.0];
        let options = MoranOptions::default();
        let points = moran_scatter(&weights, &x, &options).unwrap();
        let global = global_moran(&weights, &x, &options).unwrap();

        let sxy = points.iter().map(|p| p.value * p.lag).sum::<f64>();
        let sxx = points.iter().map(|p| p.value * p.value).sum::<f64>();
        assert_eq!(points.len(), 9);
        assert!((sxy / sxx - global.statistic).abs() < 1e-12);
    }
}
