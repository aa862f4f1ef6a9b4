use geo::Relate;
use serde::{Deserialize, Serialize};

use crate::geom::Geometries;
use crate::graph::NeighborList;

/// Boundary predicate used to decide that two regions are contiguous.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contiguity {
    /// Touch or overlap: any shared point counts, including a single corner.
    #[default]
    Queen,
    /// Shared boundary segment of positive length and no interior overlap.
    Rook,
}

impl Geometries {
    /// Compute contiguity neighbors. Candidates come from the bounding-box
    /// R-tree; each unordered pair is tested once with a DE-9IM relate.
    pub(crate) fn contiguity(&self, rule: Contiguity) -> NeighborList {
        let mut adj_list: Vec<Vec<u32>> = vec![Vec::new(); self.len()];

        for bbox in self.boxes() {
            let i = bbox.idx();
            for cand in self.query(&bbox.padded(0.0)) {
                let j = cand.idx();
                if j <= i { continue } // check each unordered pair once

                let im = self.shapes()[i].relate(&self.shapes()[j]);
                let adjacent = match rule {
                    Contiguity::Queen => im.is_intersects(),
                    // Index 4 of the DE-9IM string is Boundary/Boundary.
                    Contiguity::Rook => im.is_touches() && im.matches("****1****").unwrap_or(false),
                };

                if adjacent {
                    adj_list[i].push(j as u32);
                    adj_list[j].push(i as u32);
                }
            }
        }

        NeighborList::new(adj_list)
    }
}
