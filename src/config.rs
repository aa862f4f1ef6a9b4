//! Analysis settings shared by every command, loadable from a JSON file.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::flow::FlowMethod;
use crate::graph::{Contiguity, DistanceMetric, NeighborOptions};
use crate::stats::MoranOptions;
use crate::weights::{MissingPolicy, ZeroPolicy};

/// Every field has a default, so a config file only names what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub k: usize,
    pub contiguity: Contiguity,
    pub metric: DistanceMetric,
    pub zero_policy: ZeroPolicy,
    pub missing_policy: MissingPolicy,
    pub alpha: f64,
    pub permutations: usize,
    pub seed: u64,
    pub flow_method: FlowMethod,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let neighbors = NeighborOptions::default();
        let moran = MoranOptions::default();
        Self {
            k: neighbors.k,
            contiguity: neighbors.contiguity,
            metric: neighbors.metric,
            zero_policy: moran.zero_policy,
            missing_policy: MissingPolicy::default(),
            alpha: moran.alpha,
            permutations: moran.permutations,
            seed: moran.seed,
            flow_method: FlowMethod::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[config] Failed to open config file: {}", path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[config] Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.moran_options().validate().context("[config] Invalid config")?;
        Ok(())
    }

    pub fn neighbor_options(&self) -> NeighborOptions {
        NeighborOptions { k: self.k, contiguity: self.contiguity, metric: self.metric }
    }

    pub fn moran_options(&self) -> MoranOptions {
        MoranOptions {
            zero_policy: self.zero_policy,
            permutations: self.permutations,
            seed: self.seed,
            alpha: self.alpha,
        }
    }
}
