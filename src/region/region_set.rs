use std::collections::BTreeMap;

use ahash::AHashMap;
use geo::{MultiPolygon, Point};

use crate::error::{Error, Result};
use crate::geom::{resolve_shapes, ExclusionReason, Geometries, ResolveReport};
use crate::region::{AttributeTable, RegionId};

/// One input record: an id, a (possibly partial) geometry and numeric attributes.
/// Several features may share an id; their parts are merged.
#[derive(Debug, Clone)]
pub struct RegionFeature {
    pub id: RegionId,
    pub geometry: MultiPolygon<f64>,
    pub attributes: BTreeMap<String, f64>,
}

impl RegionFeature {
    pub fn new(id: impl Into<RegionId>, geometry: MultiPolygon<f64>) -> Self {
        Self { id: id.into(), geometry, attributes: BTreeMap::new() }
    }

    pub fn with_attribute(mut self, name: &str, value: f64) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }
}

/// Borrowed view of a single resolved region.
#[derive(Debug, Clone, Copy)]
pub struct Region<'a> {
    pub id: &'a RegionId,
    pub geometry: &'a MultiPolygon<f64>,
    pub centroid: Point<f64>,
    pub attributes: &'a BTreeMap<String, f64>,
}

/// The fixed, ordered collection of regions for one analysis.
/// Index `i` aligns neighbor lists, weights rows and attribute vectors.
#[derive(Debug, Clone)]
pub struct RegionSet {
    ids: Vec<RegionId>,
    index: AHashMap<RegionId, u32>,
    attributes: Vec<BTreeMap<String, f64>>,
    geoms: Geometries,
    /// Regions left out during resolution, so lookups can say why.
    excluded: AHashMap<RegionId, ExclusionReason>,
}

impl RegionSet {
    /// Repair and merge the input geometries and compute centroids.
    /// Regions whose geometry cannot be resolved are left out and listed in the report.
    pub fn resolve(features: Vec<RegionFeature>) -> (Self, ResolveReport) {
        let parts = features.iter()
            .map(|feature| (feature.id.clone(), feature.geometry.clone()))
            .collect::<Vec<_>>();
        let (resolved, report) = resolve_shapes(&parts);

        let mut ids = Vec::with_capacity(resolved.len());
        let mut shapes = Vec::with_capacity(resolved.len());
        let mut centroids = Vec::with_capacity(resolved.len());
        let mut attributes = Vec::with_capacity(resolved.len());

        for shape in resolved {
            // Earlier parts win on conflicting attribute names.
            let mut merged = BTreeMap::new();
            for &source in &shape.sources {
                for (name, &value) in &features[source].attributes {
                    merged.entry(name.clone()).or_insert(value);
                }
            }
            ids.push(shape.id);
            shapes.push(shape.shape);
            centroids.push(shape.centroid);
            attributes.push(merged);
        }

        let index = ids.iter().enumerate()
            .map(|(i, id)| (id.clone(), i as u32))
            .collect();

        tracing::debug!(regions = ids.len(), excluded = report.excluded.len(), "resolved region geometries");

        let excluded = report.excluded.iter().cloned().collect();

        (Self { ids, index, attributes, geoms: Geometries::new(shapes, centroids), excluded }, report)
    }

    /// Get the number of regions.
    #[inline] pub fn len(&self) -> usize { self.ids.len() }

    /// Check if there are no regions.
    #[inline] pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    /// Get the region ids in index order.
    #[inline] pub fn ids(&self) -> &[RegionId] { &self.ids }

    /// Get the region centroids in index order.
    #[inline] pub fn centroids(&self) -> &[Point<f64>] { self.geoms.centroids() }

    #[inline] pub(crate) fn geoms(&self) -> &Geometries { &self.geoms }

    /// Get the index of a region by id.
    #[inline]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|&i| i as usize)
    }

    /// Get the index of a region by id. Fails with `InvalidGeometry` when the region
    /// was excluded during resolution, `UnknownRegion` when it was never seen.
    pub fn require(&self, id: &str) -> Result<usize> {
        if let Some(i) = self.index_of(id) { return Ok(i) }
        Err(match self.excluded.get_key_value(id) {
            Some((region, reason)) => Error::InvalidGeometry { region: region.clone(), reason: reason.to_string() },
            None => Error::UnknownRegion(RegionId::new(id)),
        })
    }

    /// Get the centroid of a region by id.
    pub fn centroid_of(&self, id: &str) -> Result<Point<f64>> {
        self.require(id).map(|i| self.geoms.centroids()[i])
    }

    /// Get a view of the region at index `i`.
    pub fn region(&self, i: usize) -> Option<Region<'_>> {
        Some(Region {
            id: self.ids.get(i)?,
            geometry: self.geoms.shapes().get(i)?,
            centroid: *self.geoms.centroids().get(i)?,
            attributes: self.attributes.get(i)?,
        })
    }

    /// Iterate over all regions in index order.
    pub fn iter(&self) -> impl Iterator<Item = Region<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.region(i))
    }

    /// Get a named attribute for every region; `None` where the region lacks it.
    pub fn attribute(&self, name: &str) -> Vec<Option<f64>> {
        self.attributes.iter().map(|attrs| attrs.get(name).copied()).collect()
    }

    /// Return a new set whose regions carry the columns of `table` in addition
    /// to their own attributes. Table values replace same-named attributes.
    pub fn with_attributes(&self, table: &AttributeTable) -> Self {
        let mut joined = self.clone();
        for column in table.columns() {
            for (id, attrs) in joined.ids.iter().zip(joined.attributes.iter_mut()) {
                if let Some(value) = table.get(column, id.as_str()) {
                    attrs.insert(column.to_string(), value);
                }
            }
        }
        joined
    }
}
