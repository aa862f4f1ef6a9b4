use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::flow::FlowEstimate;
use crate::graph::DistanceMetric;
use crate::region::{AttributeTable, RegionId, RegionSet};

/// Attributes of the sending country of a pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OriginAttributes(pub BTreeMap<String, f64>);

/// Attributes of the receiving country of a pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DestinationAttributes(pub BTreeMap<String, f64>);

/// One origin -> destination observation for a gravity regression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GravityRow {
    pub origin: RegionId,
    pub destination: RegionId,
    pub flow: f64,
    /// Centroid distance; absent when either country has no geometry.
    pub distance: Option<f64>,
    pub origin_attributes: OriginAttributes,
    pub destination_attributes: DestinationAttributes,
}

fn lookup(table: &AttributeTable, columns: &[&str], id: &str) -> BTreeMap<String, f64> {
    columns.iter()
        .filter_map(|&column| table.get(column, id).map(|value| (column.to_string(), value)))
        .collect()
}

/// Pair every nonzero estimated flow with the distance between the two
/// countries and the requested attribute columns of each side.
pub fn gravity_rows(
    estimate: &FlowEstimate,
    regions: &RegionSet,
    attributes: &AttributeTable,
    columns: &[&str],
    metric: DistanceMetric,
) -> Result<Vec<GravityRow>> {
    if let Some(&column) = columns.iter().find(|&&column| !attributes.has_column(column)) {
        return Err(Error::InvalidParameter {
            name: "column",
            value: column.to_string(),
            reason: "not present in attribute table".to_string(),
        })
    }

    let centroid = |id: &RegionId| match regions.centroid_of(id.as_str()) {
        Ok(point) => Some(point),
        Err(err) => {
            tracing::debug!(%err, "flow endpoint has no centroid");
            None
        }
    };

    let rows = estimate.records().into_iter()
        .map(|record| GravityRow {
            distance: centroid(&record.origin).zip(centroid(&record.destination))
                .map(|(a, b)| metric.distance(a, b)),
            origin_attributes: OriginAttributes(lookup(attributes, columns, record.origin.as_str())),
            destination_attributes: DestinationAttributes(lookup(attributes, columns, record.destination.as_str())),
            origin: record.origin,
            destination: record.destination,
            flow: record.flow,
        })
        .collect::<Vec<_>>();

    let unplaced = rows.iter().filter(|row| row.distance.is_none()).count();
    if unplaced > 0 {
        tracing::warn!(pairs = unplaced, "flow pairs without a distance (country missing from regions)");
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{estimate_flows, FlowMethod, StockEntry, StockTable};
    use crate::region::RegionFeature;
    use geo::{polygon, MultiPolygon};

    fn square(x: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0), (x: x, y: 0.0),
        ]])
    }

    #[test]
    fn rows_carry_both_sides() {
        let table = StockTable::from_entries([
            StockEntry::new("AAA", "BBB", 1, 10.0),
            StockEntry::new("CCC", "BBB", 1, 30.0),
            StockEntry::new("AAA", "BBB", 2, 30.0),
            StockEntry::new("CCC", "BBB", 2, 30.0),
        ]).unwrap();
        let estimate = estimate_flows(&table, 1, 2, FlowMethod::Dennett).unwrap();

        let (regions, _) = RegionSet::resolve(vec![
            RegionFeature::new("AAA", square(0.0)),
            RegionFeature::new("BBB", square(3.0)),
        ]);
        let mut attributes = AttributeTable::new();
        attributes.insert("gdp", RegionId::new("AAA"), 1.0);
        attributes.insert("gdp", RegionId::new("BBB"), 2.0);

        let rows = gravity_rows(&estimate, &regions, &attributes, &["gdp"], DistanceMetric::Planar).unwrap();
        assert_eq!(rows.len(), 2);

        let (a, c) = (&rows[0], &rows[1]);
        assert_eq!((a.origin.as_str(), a.destination.as_str()), ("AAA", "BBB"));
        assert!((a.flow - 5.0).abs() < 1e-9);
        assert!((c.flow - 15.0).abs() < 1e-9);
        assert!((a.distance.unwrap() - 3.0).abs() < 1e-9);
        assert_eq!(a.origin_attributes.0.get("gdp"), Some(&1.0));
        assert_eq!(a.destination_attributes.0.get("gdp"), Some(&2.0));

        // CCC has neither geometry nor attributes.
        assert_eq!(c.distance, None);
        assert!(c.origin_attributes.0.is_empty());

        let json = serde_json::to_value(a).unwrap();
        assert_eq!(json["origin_attributes"]["gdp"], 1.0);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let table = StockTable::from_entries([
            StockEntry::new("AAA", "BBB", 1, 1.0),
            StockEntry::new("AAA", "BBB", 2, 2.0),
        ]).unwrap();
        let estimate = estimate_flows(&table, 1, 2, FlowMethod::Dennett).unwrap();
        let (regions, _) = RegionSet::resolve(vec![RegionFeature::new("AAA", square(0.0))]);

        let err = gravity_rows(&estimate, &regions, &AttributeTable::new(), &["gdp"], DistanceMetric::Planar).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "column", .. }));
    }
}
