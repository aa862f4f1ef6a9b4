// Integration tests for the spatial pipeline:
//   region resolution, neighbor graph, weights, lag, and Moran's I on real polygons.

use geo::{polygon, MultiPolygon};
use migspat::{
    build_neighbors, global_moran, local_moran, Cluster, Contiguity, DistanceMetric, Error, MissingPolicy,
    MoranOptions, NeighborOptions, RegionFeature, RegionSet, SpatialWeights, ZeroPolicy,
};

fn square(x: f64, y: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![polygon![
        (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0), (x: x, y: y),
    ]])
}

fn planar(k: usize, contiguity: Contiguity) -> NeighborOptions {
    NeighborOptions { k, contiguity, metric: DistanceMetric::Planar }
}

/// `rows` x `cols` unit squares, ids "r{row}c{col}", row-major.
fn grid(rows: usize, cols: usize) -> RegionSet {
    let features = (0..rows * cols)
        .map(|i| {
            let (r, c) = (i / cols, i % cols);
            RegionFeature::new(format!("r{r}c{c}"), square(c as f64, r as f64))
        })
        .collect();
    RegionSet::resolve(features).0
}

#[test]
fn line_of_three_regions() {
    let (regions, report) = RegionSet::resolve(vec![
        RegionFeature::new("A", square(0.0, 0.0)),
        RegionFeature::new("B", square(1.0, 0.0)),
        RegionFeature::new("C", square(2.0, 0.0)),
    ]);
    assert!(report.is_clean());

    let graph = build_neighbors(&regions, &planar(1, Contiguity::Queen));
    assert_eq!(graph.combined.neighbors(1).collect::<Vec<_>>(), vec![0, 2]);
    assert!(!graph.combined.contains(0, 2));

    let weights = SpatialWeights::standardize(&regions, &graph.combined, ZeroPolicy::ZeroRow).unwrap();
    let row = weights.neighbors_of("B").unwrap();
    assert_eq!(row.iter().map(|(id, w)| (id.as_str(), *w)).collect::<Vec<_>>(), vec![("A", 0.5), ("C", 0.5)]);

    for x in [[1.0, 5.0, 3.0], [-2.0, 0.0, 10.5]] {
        let lag = weights.lag_values(&x).unwrap();
        assert_eq!(lag[1], Some((x[0] + x[2]) / 2.0));
        assert_eq!(lag[0], Some(x[1]));
    }
}

#[test]
fn rook_checkerboard_and_blocks() {
    let regions = grid(4, 4);
    let graph = build_neighbors(&regions, &planar(0, Contiguity::Rook));
    assert_eq!(graph.combined.edge_count(), 48);
    assert!(graph.combined.is_symmetric());

    let weights = SpatialWeights::standardize(&regions, &graph.combined, ZeroPolicy::Fail).unwrap();
    let options = MoranOptions { zero_policy: ZeroPolicy::Fail, ..Default::default() };

    let checkerboard = (0..16).map(|i| ((i / 4 + i % 4) % 2) as f64).collect::<Vec<_>>();
    let moran = global_moran(&weights, &checkerboard, &options).unwrap();
    assert!((moran.statistic + 1.0).abs() < 1e-9);
    assert!(moran.p_value.unwrap() < 0.01);

    let blocks = (0..16).map(|i| if i % 4 < 2 { 0.0 } else { 1.0 }).collect::<Vec<_>>();
    let moran = global_moran(&weights, &blocks, &options).unwrap();
    assert!(moran.statistic > 0.0);
}

#[test]
fn queen_adds_diagonal_neighbors() {
    let regions = grid(3, 3);
    let rook = build_neighbors(&regions, &planar(0, Contiguity::Rook));
    let queen = build_neighbors(&regions, &planar(0, Contiguity::Queen));

    // The center cell has 4 edge neighbors and 4 corner neighbors.
    assert_eq!(rook.combined.degree(4), 4);
    assert_eq!(queen.combined.degree(4), 8);
}

#[test]
fn island_policies() {
    let (regions, _) = RegionSet::resolve(vec![
        RegionFeature::new("A", square(0.0, 0.0)).with_attribute("rate", 1.0),
        RegionFeature::new("B", square(1.0, 0.0)).with_attribute("rate", 2.0),
        RegionFeature::new("C", square(2.0, 0.0)).with_attribute("rate", 4.0),
        RegionFeature::new("D", square(1.0, 1.0)).with_attribute("rate", 3.0),
        RegionFeature::new("ISL", square(20.0, 20.0)).with_attribute("rate", 9.0),
    ]);
    let graph = build_neighbors(&regions, &planar(0, Contiguity::Rook));
    assert_eq!(graph.contiguity_islands().collect::<Vec<_>>(), vec![4]);

    let fail = SpatialWeights::standardize(&regions, &graph.combined, ZeroPolicy::Fail).unwrap_err();
    assert_eq!(fail, Error::NoNeighbors("ISL".into()));

    let x = regions.attribute("rate").into_iter().map(|v| v.unwrap()).collect::<Vec<_>>();

    let zero_row = SpatialWeights::standardize(&regions, &graph.combined, ZeroPolicy::ZeroRow).unwrap();
    assert_eq!(zero_row.lag(&regions.attribute("rate"), MissingPolicy::Renormalize).unwrap()[4], None);
    let local = local_moran(&zero_row, &x, &MoranOptions::default()).unwrap();
    assert_eq!(local.get("ISL").unwrap().cluster, Cluster::Undefined);
    assert_eq!(global_moran(&zero_row, &x, &MoranOptions::default()).unwrap().n, 5);

    let drop = SpatialWeights::standardize(&regions, &graph.combined, ZeroPolicy::Drop).unwrap();
    let options = MoranOptions { zero_policy: ZeroPolicy::Drop, ..Default::default() };
    assert_eq!(global_moran(&drop, &x, &options).unwrap().n, 4);
    assert!(local_moran(&drop, &x, &options).unwrap().get("ISL").is_none());

    // Declaring a different policy than the weights carry is fatal.
    assert!(matches!(global_moran(&drop, &x, &MoranOptions::default()), Err(Error::PolicyMismatch { .. })));
}

#[test]
fn knn_reaches_islands() {
    let (regions, _) = RegionSet::resolve(vec![
        RegionFeature::new("A", square(0.0, 0.0)),
        RegionFeature::new("B", square(1.0, 0.0)),
        RegionFeature::new("ISL", square(5.0, 0.0)),
    ]);
    let graph = build_neighbors(&regions, &planar(1, Contiguity::Queen));

    assert_eq!(graph.contiguity.degree(2), 0);
    assert_eq!(graph.combined.neighbors(2).collect::<Vec<_>>(), vec![1]);
    // k-NN links are not mirrored: B keeps only A.
    assert_eq!(graph.combined.neighbors(1).collect::<Vec<_>>(), vec![0]);
    assert!(!graph.combined.is_symmetric());
}
