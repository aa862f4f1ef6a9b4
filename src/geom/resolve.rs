//! Geometry repair, part merging and centroid resolution.

use ahash::AHashMap;
use geo::{unary_union, Area, Centroid, CoordsIter, MultiPolygon, Point, Validation};
use serde::Serialize;

use crate::region::RegionId;

/// Why a region was left out of the neighbor graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionReason {
    /// No polygon parts, or only empty rings.
    Empty,
    /// At least one coordinate is NaN or infinite.
    NonFiniteCoordinates,
    /// The repaired geometry has no area.
    ZeroArea,
    /// No centroid could be computed for the repaired geometry.
    NoCentroid,
}

/// Outcome of resolving a collection of region geometries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveReport {
    /// Regions that were dropped, in input order.
    pub excluded: Vec<(RegionId, ExclusionReason)>,
    /// Regions assembled from more than one input part, with the part count.
    pub merged: Vec<(RegionId, usize)>,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ExclusionReason::Empty => "geometry is empty",
            ExclusionReason::NonFiniteCoordinates => "geometry has non-finite coordinates",
            ExclusionReason::ZeroArea => "geometry has no area after repair",
            ExclusionReason::NoCentroid => "no centroid for the repaired geometry",
        })
    }
}

impl ResolveReport {
    #[inline] pub fn is_clean(&self) -> bool { self.excluded.is_empty() }
}

/// A region geometry that survived repair, with its centroid.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedShape {
    pub id: RegionId,
    pub shape: MultiPolygon<f64>,
    pub centroid: Point<f64>,
    /// Positions in the input that were merged into this shape.
    pub sources: Vec<usize>,
}

/// Group parts by region id (first-seen order), repair each group and
/// compute centroids. Unresolvable regions are reported, not zero-filled.
pub(crate) fn resolve_shapes(parts: &[(RegionId, MultiPolygon<f64>)]) -> (Vec<ResolvedShape>, ResolveReport) {
    let mut order: Vec<RegionId> = Vec::new();
    let mut groups: AHashMap<RegionId, Vec<usize>> = AHashMap::new();
    for (i, (id, _)) in parts.iter().enumerate() {
        groups.entry(id.clone())
            .or_insert_with(|| { order.push(id.clone()); Vec::new() })
            .push(i);
    }

    let mut report = ResolveReport::default();
    let mut resolved = Vec::with_capacity(order.len());

    for id in order {
        let sources = groups.remove(&id).unwrap_or_default();
        if sources.len() > 1 { report.merged.push((id.clone(), sources.len())) }

        match repair(sources.iter().map(|&i| &parts[i].1)) {
            Ok((shape, centroid)) => resolved.push(ResolvedShape { id, shape, centroid, sources }),
            Err(reason) => {
                tracing::warn!(region = %id, ?reason, "excluding region from neighbor graph");
                report.excluded.push((id, reason));
            }
        }
    }

    (resolved, report)
}

/// Merge all parts into one valid multipolygon and find its centroid.
/// A single valid part is kept as-is so shared borders stay exact; anything
/// else goes through a unary union, which resolves self-intersections.
fn repair<'a>(parts: impl Iterator<Item = &'a MultiPolygon<f64>>) -> Result<(MultiPolygon<f64>, Point<f64>), ExclusionReason> {
    let parts = parts.collect::<Vec<_>>();

    if parts.iter().all(|part| part.coords_count() == 0) {
        return Err(ExclusionReason::Empty)
    }
    if parts.iter().any(|part| part.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite())) {
        return Err(ExclusionReason::NonFiniteCoordinates)
    }

    let shape = match parts.as_slice() {
        [part] if part.is_valid() => (*part).clone(),
        _ => unary_union(parts.iter().copied()),
    };

    if shape.0.is_empty() || shape.unsigned_area() <= 0.0 {
        return Err(ExclusionReason::ZeroArea)
    }

    let centroid = shape.centroid()
        .filter(|p| p.x().is_finite() && p.y().is_finite())
        .ok_or(ExclusionReason::NoCentroid)?;

    Ok((shape, centroid))
}
