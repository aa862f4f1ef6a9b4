use geo::{BoundingRect, MultiPolygon, Point};
use rstar::{RTree, AABB};

use crate::geom::BoundingBox;

/// Geometries holds the resolved region shapes, their centroids and a bounding-box R-tree.
/// Index `i` in every vector refers to the same region.
#[derive(Debug, Clone)]
pub(crate) struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    centroids: Vec<Point<f64>>,
    rtree: RTree<BoundingBox>,
}

impl Geometries {
    /// Construct a Geometries object from resolved shapes and their centroids.
    pub(crate) fn new(shapes: Vec<MultiPolygon<f64>>, centroids: Vec<Point<f64>>) -> Self {
        debug_assert_eq!(shapes.len(), centroids.len(), "shapes and centroids must align");
        Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
            centroids,
        }
    }

    /// Get the number of shapes.
    #[inline] pub(crate) fn len(&self) -> usize { self.shapes.len() }

    /// Get a reference to the list of shapes.
    #[inline] pub(crate) fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get a reference to the list of centroids.
    #[inline] pub(crate) fn centroids(&self) -> &[Point<f64>] { &self.centroids }

    /// Get the bounding box entries of the R-tree.
    #[inline]
    pub(crate) fn boxes(&self) -> impl Iterator<Item = &BoundingBox> {
        self.rtree.iter()
    }

    /// Query the R-tree for bounding boxes intersecting the given envelope.
    #[inline]
    pub(crate) fn query(&self, envelope: &AABB<[f64; 2]>) -> impl Iterator<Item = &BoundingBox> {
        self.rtree.locate_in_envelope_intersecting(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Centroid};

    fn square(x: f64, y: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0), (x: x, y: y),
        ]])
    }

    fn geometries(shapes: Vec<MultiPolygon<f64>>) -> Geometries {
        let centroids = shapes.iter().map(|s| s.centroid().unwrap_or(Point::new(0.0, 0.0))).collect();
        Geometries::new(shapes, centroids)
    }

    #[test]
    fn query_returns_overlapping_boxes() {
        let geoms = geometries(vec![square(0.0, 0.0), square(1.0, 0.0), square(5.0, 5.0)]);
        let envelope = AABB::from_corners([0.5, 0.5], [1.5, 0.6]);
        let mut hits = geoms.query(&envelope).map(|b| b.idx()).collect::<Vec<_>>();
        hits.sort();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn boxes_skip_empty_shapes() {
        let geoms = geometries(vec![square(0.0, 0.0), MultiPolygon::new(vec![])]);
        assert_eq!(geoms.len(), 2);
        assert_eq!(geoms.boxes().map(|b| b.idx()).collect::<Vec<_>>(), vec![0]);
    }
}
