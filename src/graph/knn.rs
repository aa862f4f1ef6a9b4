use geo::{Distance, Euclidean, Haversine, Point};
use rayon::prelude::*;
use rstar::{primitives::GeomWithData, RTree};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::graph::NeighborList;

const METERS_PER_KM: f64 = 1000.0;

/// Distance used to rank centroids for k-nearest-neighbor search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Haversine distance on (longitude, latitude) degrees, in kilometers.
    #[default]
    GreatCircle,
    /// Euclidean distance in coordinate units.
    Planar,
}

impl DistanceMetric {
    /// Distance between two centroids under this metric: kilometers for
    /// great-circle, coordinate units for planar.
    pub fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        match self {
            DistanceMetric::Planar => Euclidean.distance(a, b),
            DistanceMetric::GreatCircle => Haversine.distance(a, b) / METERS_PER_KM,
        }
    }
}

/// Position of a (longitude, latitude) point on the unit sphere.
/// Chord length between these is monotone in great-circle distance.
fn unit_vector(p: Point<f64>) -> [f64; 3] {
    let (lon, lat) = (p.x().to_radians(), p.y().to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Compute the `k` nearest other points for every point.
/// Ties at the k-th distance are broken by lower index.
pub(crate) fn k_nearest(centroids: &[Point<f64>], k: usize, metric: DistanceMetric) -> NeighborList {
    if k == 0 || centroids.len() < 2 { return NeighborList::empty(centroids.len()) }

    match metric {
        DistanceMetric::Planar => nearest(&centroids.iter().map(|p| [p.x(), p.y()]).collect::<Vec<_>>(), k),
        DistanceMetric::GreatCircle => nearest(&centroids.iter().map(|&p| unit_vector(p)).collect::<Vec<_>>(), k),
    }
}

fn nearest<P>(points: &[P], k: usize) -> NeighborList
where
    P: rstar::Point<Scalar = f64> + Send + Sync,
{
    let tree = RTree::bulk_load(
        points.iter().enumerate()
            .map(|(i, p)| GeomWithData::new(p.clone(), i))
            .collect()
    );

    let lists = (0..points.len()).into_par_iter()
        .map(|i| {
            let mut found: SmallVec<[(f64, usize); 8]> = SmallVec::new();
            let mut cutoff = f64::INFINITY;

            for (cand, d2) in tree.nearest_neighbor_iter_with_distance_2(&points[i]) {
                if cand.data == i { continue }
                if found.len() >= k && d2 > cutoff { break }
                found.push((d2, cand.data));
                if found.len() == k { cutoff = d2 }
            }

            found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            found.truncate(k);
            found.into_iter().map(|(_, j)| j as u32).collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    NeighborList::new(lists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<Point<f64>> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn planar_nearest_on_a_line() {
        let pts = points(&[(0.0, 0.0), (1.0, 0.0), (3.0, 0.0), (7.0, 0.0)]);
        let list = k_nearest(&pts, 1, DistanceMetric::Planar);

        assert_eq!(list.row(0), &[1]);
        assert_eq!(list.row(1), &[0]);
        assert_eq!(list.row(2), &[1]);
        assert_eq!(list.row(3), &[2]);
        // 3 -> 2 but 2 -> 1: k-NN is not symmetric.
        assert!(!list.is_symmetric());
    }

    #[test]
    fn ties_prefer_lower_index() {
        // Point 0 sits between 1 and 2 at equal distance.
        let pts = points(&[(0.0, 0.0), (-1.0, 0.0), (1.0, 0.0), (0.0, 5.0)]);
        assert_eq!(k_nearest(&pts, 1, DistanceMetric::Planar).row(0), &[1]);
        assert_eq!(k_nearest(&pts, 2, DistanceMetric::Planar).row(0), &[1, 2]);
    }

    #[test]
    fn duplicate_points_do_not_include_self() {
        let pts = points(&[(0.0, 0.0), (0.0, 0.0), (4.0, 0.0)]);
        let list = k_nearest(&pts, 1, DistanceMetric::Planar);
        assert_eq!(list.row(0), &[1]);
        assert_eq!(list.row(1), &[0]);
    }

    #[test]
    fn great_circle_wraps_the_antimeridian() {
        // Planar distance puts 179.5 far from -179.5; on the sphere they are close.
        let pts = points(&[(179.5, 0.0), (-179.5, 0.0), (170.0, 0.0)]);
        assert_eq!(k_nearest(&pts, 1, DistanceMetric::GreatCircle).row(0), &[1]);
        assert_eq!(k_nearest(&pts, 1, DistanceMetric::Planar).row(0), &[2]);
    }

    #[test]
    fn zero_k_gives_no_neighbors() {
        let pts = points(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(k_nearest(&pts, 0, DistanceMetric::Planar).edge_count(), 0);
    }

    #[test]
    fn haversine_distance() {
        let metric = DistanceMetric::GreatCircle;
        // One degree of longitude on the equator.
        let d = metric.distance(Point::new(0.0, 0.0), Point::new(1.0, 0.0));
        assert!((d - 111.195).abs() < 0.01, "got {d}");
        assert_eq!(metric.distance(Point::new(10.0, 20.0), Point::new(10.0, 20.0)), 0.0);
        assert_eq!(DistanceMetric::Planar.distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }
}
