use serde::{Deserialize, Serialize};

use crate::graph::{knn::k_nearest, Contiguity, DistanceMetric, NeighborList};
use crate::region::RegionSet;

/// Rules for building the combined neighbor graph. Fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborOptions {
    /// Number of nearest neighbors added to every region.
    pub k: usize,
    pub contiguity: Contiguity,
    pub metric: DistanceMetric,
}

impl Default for NeighborOptions {
    fn default() -> Self {
        Self { k: 4, contiguity: Contiguity::Queen, metric: DistanceMetric::GreatCircle }
    }
}

/// Contiguity, k-NN and combined neighbor lists over one `RegionSet`.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    pub contiguity: NeighborList,
    pub knn: NeighborList,
    pub combined: NeighborList,
    /// Number of nearest neighbors actually used after capping.
    pub k: usize,
}

impl NeighborGraph {
    /// Regions with no contiguity neighbors (islands in the contiguity sense).
    pub fn contiguity_islands(&self) -> impl Iterator<Item = usize> + '_ {
        self.contiguity.islands()
    }
}

/// Build the combined neighbor list: contiguity neighbors united with the
/// `k` nearest centroids. `k` above `regions.len() - 1` is capped with a warning.
pub fn build_neighbors(regions: &RegionSet, options: &NeighborOptions) -> NeighborGraph {
    let max_k = regions.len().saturating_sub(1);
    let k = if options.k > max_k {
        tracing::warn!(requested = options.k, used = max_k, regions = regions.len(), "k exceeds available regions, capping");
        max_k
    } else {
        options.k
    };

    let contiguity = regions.geoms().contiguity(options.contiguity);
    let knn = k_nearest(regions.centroids(), k, options.metric);
    let combined = contiguity.union(&knn);

    tracing::debug!(
        regions = regions.len(),
        k,
        contiguity_links = contiguity.edge_count(),
        knn_links = knn.edge_count(),
        combined_links = combined.edge_count(),
        "built neighbor graph"
    );

    NeighborGraph { contiguity, knn, combined, k }
}
