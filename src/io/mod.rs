//! Reading region geometries, stock and attribute tables, and writing reports.
//!
//! # Format Modules
//!
//! - `geojson` - FeatureCollection of Polygon / MultiPolygon regions
//! - `csv` - stock tables and attribute tables (via polars)
//! - `json` - pretty-printed JSON reports

mod csv;
mod geojson;
mod json;

pub use csv::{read_attribute_table, read_stock_table};
pub use geojson::{read_regions, read_regions_str};
pub use json::{write_json, write_report};
