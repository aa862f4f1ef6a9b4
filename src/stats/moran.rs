use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::stats::{normal::two_tailed_p, pseudo_p, MoranOptions, Sample};
use crate::weights::SpatialWeights;

const STATISTIC: &str = "global Moran's I";

/// Global Moran's I with analytical and (optionally) permutation inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalMoran {
    pub statistic: f64,
    pub expectation: f64,
    /// Variance under randomization; absent when n = 3.
    pub variance: Option<f64>,
    /// Variance under normality.
    pub variance_normality: f64,
    /// z-score under randomization.
    pub z: Option<f64>,
    /// Two-tailed normal p-value for `z`.
    pub p_value: Option<f64>,
    pub pseudo_p_value: Option<f64>,
    pub permutations: usize,
    /// Number of regions the statistic was computed over.
    pub n: usize,
    pub s0: f64,
}

impl GlobalMoran {
    /// The p-value used for significance: the pseudo p-value when permutation
    /// inference ran, the analytical one otherwise.
    pub fn inference_p(&self) -> Option<f64> {
        self.pseudo_p_value.or(self.p_value)
    }
}

/// Cross-product sum_i z_i sum_j w(i,j) z_j over included rows.
fn cross_product(weights: &SpatialWeights, positions: &[usize], z: &[f64]) -> f64 {
    positions.iter()
        .map(|&i| z[i] * weights.row(i).map(|(j, w)| w * z[j]).sum::<f64>())
        .sum()
}

/// Compute global Moran's I of `x` (aligned with the weights rows).
/// I = n / S0 * sum_ij w(i,j) z_i z_j / sum_i z_i^2.
pub fn global_moran(weights: &SpatialWeights, x: &[f64], options: &MoranOptions) -> Result<GlobalMoran> {
    let sample = Sample::prepare(STATISTIC, weights, x, options)?;
    let s0 = weights.s0();
    if s0 <= 0.0 {
        return Err(Error::ZeroWeights { statistic: STATISTIC })
    }

    let n = sample.n() as f64;
    let sum_sq = sample.m2 * n;
    let scale = n / (s0 * sum_sq);
    let statistic = scale * cross_product(weights, &sample.positions, &sample.z);
    let expectation = -1.0 / (n - 1.0);

    let (s1, s2) = (weights.s1(), weights.s2());
    let s0_sq = s0 * s0;
    let variance_normality = (n * n * s1 - n * s2 + 3.0 * s0_sq) / ((n * n - 1.0) * s0_sq) - expectation.powi(2);

    let variance = (sample.n() > 3).then(|| {
        let a = n * ((n * n - 3.0 * n + 3.0) * s1 - n * s2 + 3.0 * s0_sq);
        let b = sample.b2 * ((n * n - n) * s1 - 2.0 * n * s2 + 6.0 * s0_sq);
        (a - b) / ((n - 1.0) * (n - 2.0) * (n - 3.0) * s0_sq) - expectation.powi(2)
    });
    let z = variance.filter(|&v| v > 0.0).map(|v| (statistic - expectation) / v.sqrt());
    let p_value = z.map(two_tailed_p);

    let pseudo_p_value = (options.permutations > 0).then(|| {
        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut values = sample.positions.iter().map(|&i| sample.z[i]).collect::<Vec<_>>();
        let mut z = sample.z.clone();
        let simulated = (0..options.permutations)
            .map(|_| {
                values.shuffle(&mut rng);
                for (&i, &v) in sample.positions.iter().zip(&values) { z[i] = v }
                scale * cross_product(weights, &sample.positions, &z)
            })
            .collect::<Vec<_>>();
        pseudo_p(statistic, simulated.into_iter(), options.permutations)
    });

    tracing::debug!(statistic, expectation, ?z, ?p_value, n = sample.n(), "computed global Moran's I");

    Ok(GlobalMoran {
        statistic,
        expectation,
        variance,
        variance_normality,
        z,
        p_value,
        pseudo_p_value,
        permutations: options.permutations,
        n: sample.n(),
        s0,
    })
}
