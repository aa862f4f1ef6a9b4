// Integration tests for flow estimation, net migration and gravity inputs.

use geo::polygon;
use migspat::{
    aggregate_residuals, estimate_flows, net_migration, FlowMethod, PairResidual, RegionFeature, RegionSet, Side,
    StockEntry, StockTable,
};

#[test]
fn single_corridor_growth() {
    let table = StockTable::from_entries([
        StockEntry::new("X", "Y", 2010, 100.0),
        StockEntry::new("X", "Y", 2015, 150.0),
    ]).unwrap();
    let estimate = estimate_flows(&table, 2010, 2015, FlowMethod::Dennett).unwrap();

    assert_eq!(estimate.total(), 50.0);
    assert_eq!(estimate.rate("X", "Y").unwrap(), 1.0);
    assert_eq!(estimate.flow("X", "Y").unwrap(), 50.0);
    assert_eq!(estimate.periods(), (2010, 2015));
    assert_eq!(estimate.method(), FlowMethod::Dennett);
}

#[test]
fn unchanged_stocks() {
    let mut entries = Vec::new();
    for period in [1990, 2000] {
        entries.push(StockEntry::new("DEU", "FRA", period, 120.0));
        entries.push(StockEntry::new("ITA", "FRA", period, 80.0));
        entries.push(StockEntry::new("FRA", "DEU", period, 40.0));
        entries.push(StockEntry::new("FRA", "FRA", period, 60_000.0));
    }
    let table = StockTable::from_entries(entries).unwrap();
    let estimate = estimate_flows(&table, 1990, 2000, FlowMethod::Dennett).unwrap();

    assert_eq!(estimate.total(), 0.0);
    assert!(estimate.records().is_empty());
    // Rates are still defined: shares of each destination's foreign-born stock.
    assert!((estimate.rate("DEU", "FRA").unwrap() - 0.6).abs() < 1e-12);
    assert!((estimate.rate("ITA", "FRA").unwrap() - 0.4).abs() < 1e-12);
    assert_eq!(estimate.rate("FRA", "DEU").unwrap(), 1.0);
}

#[test]
fn flows_are_a_rescaling_not_an_identity() {
    let table = StockTable::from_entries([
        StockEntry::new("A", "C", 1, 10.0),
        StockEntry::new("B", "C", 1, 30.0),
        StockEntry::new("A", "C", 2, 30.0),
        StockEntry::new("B", "C", 2, 30.0),
    ]).unwrap();
    let estimate = estimate_flows(&table, 1, 2, FlowMethod::Dennett).unwrap();

    // Only A -> C grew, but M = 20 is shared out by the first-period shares.
    assert_eq!(estimate.total(), 20.0);
    assert!((estimate.flow("A", "C").unwrap() - 5.0).abs() < 1e-12);
    assert!((estimate.flow("B", "C").unwrap() - 15.0).abs() < 1e-12);

    let naive = estimate_flows(&table, 1, 2, FlowMethod::StockDifference).unwrap();
    assert_eq!(naive.flow("A", "C").unwrap(), 20.0);
    assert_eq!(naive.flow("B", "C").unwrap(), 0.0);
}

#[test]
fn net_migration_feeds_region_vectors() {
    let table = StockTable::from_entries([
        StockEntry::new("AAA", "BBB", 1, 10.0),
        StockEntry::new("AAA", "BBB", 2, 25.0),
        StockEntry::new("BBB", "AAA", 2, 5.0),
    ]).unwrap();
    let net = net_migration(&table, 1, 2).unwrap();

    let square = |x: f64| geo::MultiPolygon::new(vec![polygon![
        (x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0), (x: x, y: 0.0),
    ]]);
    let (regions, _) = RegionSet::resolve(vec![
        RegionFeature::new("BBB", square(0.0)),
        RegionFeature::new("AAA", square(1.0)),
    ]);
    assert_eq!(net.align(&regions), vec![Some(10.0), Some(-10.0)]);

    let residuals = [
        PairResidual::new("AAA", "BBB", 0.5),
        PairResidual::new("BBB", "AAA", -0.25),
    ];
    assert_eq!(aggregate_residuals(&residuals, Side::Destination, &regions).unwrap(), vec![Some(0.5), Some(-0.25)]);
}
