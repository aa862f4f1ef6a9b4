use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::Value;

use crate::region::RegionFeature;

/// Read region features from a GeoJSON file. `id_field` names the property
/// holding the region id; numeric properties become attributes.
pub fn read_regions(path: &Path, id_field: &str) -> Result<Vec<RegionFeature>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("[io::geojson] Failed to read GeoJSON file: {}", path.display()))?;
    read_regions_str(&text, id_field)
        .with_context(|| format!("[io::geojson] Failed to parse regions from {}", path.display()))
}

/// Read region features from a GeoJSON string.
pub fn read_regions_str(text: &str, id_field: &str) -> Result<Vec<RegionFeature>> {
    let value: Value = serde_json::from_str(text).context("[io::geojson] Invalid JSON")?;
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("[io::geojson] Expected a FeatureCollection");
    }
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] FeatureCollection has no features array"))?;

    features.iter().enumerate()
        .map(|(i, feature)| parse_feature(feature, id_field).with_context(|| format!("[io::geojson] Feature {i}")))
        .collect()
}

fn parse_feature(feature: &Value, id_field: &str) -> Result<RegionFeature> {
    let properties = feature["properties"].as_object();
    let id = match properties.and_then(|props| props.get(id_field)) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => bail!("missing `{id_field}` property"),
    };

    // A null geometry is passed on as empty so the resolver reports it.
    let geometry = match &feature["geometry"] {
        Value::Null => MultiPolygon::new(vec![]),
        geometry => parse_geometry(geometry).with_context(|| format!("region {id}"))?,
    };

    let mut region = RegionFeature::new(id, geometry);
    for (name, value) in properties.into_iter().flatten() {
        if name == id_field { continue }
        if let Some(number) = value.as_f64() {
            region = region.with_attribute(name, number);
        }
    }
    Ok(region)
}

fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    let coordinates = geometry["coordinates"].as_array()
        .ok_or_else(|| anyhow!("geometry has no coordinates"))?;
    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon::new(vec![parse_polygon(coordinates)?])),
        Some("MultiPolygon") => Ok(MultiPolygon::new(
            coordinates.iter()
                .map(|polygon| polygon.as_array()
                    .ok_or_else(|| anyhow!("polygon is not an array"))
                    .and_then(|rings| parse_polygon(rings)))
                .collect::<Result<_>>()?
        )),
        Some(other) => bail!("unsupported geometry type `{other}`"),
        None => bail!("geometry has no type"),
    }
}

/// Parse `[exterior, interior...]` rings.
fn parse_polygon(rings: &[Value]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(parse_ring);
    let exterior = rings.next().ok_or_else(|| anyhow!("polygon has no exterior ring"))??;
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn parse_ring(ring: &Value) -> Result<LineString<f64>> {
    let positions = ring.as_array().ok_or_else(|| anyhow!("ring is not an array"))?;
    positions.iter()
        .map(|position| match position.as_array().map(Vec::as_slice) {
            Some([x, y, ..]) => match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => Ok(Coord { x, y }),
                _ => Err(anyhow!("non-numeric coordinate")),
            },
            _ => Err(anyhow!("position needs two coordinates")),
        })
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}
