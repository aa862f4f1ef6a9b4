//! Stock and attribute tables from CSV.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{bail, ensure, Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{Column, CsvReadOptions, DataType, Field, Schema, SchemaRef}};

use crate::flow::{StockEntry, StockTable};
use crate::region::{AttributeTable, RegionId};

const STOCK_COLUMNS: [&str; 4] = ["origin", "destination", "period", "stock"];

/// Force id columns to strings so codes like "004" keep their leading zeros.
fn string_schema(columns: &[&str]) -> SchemaRef {
    Arc::new(Schema::from_iter(columns.iter().map(|&name| Field::new(name.into(), DataType::String))))
}

fn read_csv(path: &Path, schema: SchemaRef) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(schema))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv] Failed to read CSV from {}", path.display()))
}

fn strings(column: &Column) -> Result<Vec<String>> {
    let name = column.name().to_string();
    column.cast(&DataType::String)?.str()?.into_iter().enumerate()
        .map(|(row, value)| match value {
            Some(value) if !value.trim().is_empty() => Ok(value.to_string()),
            _ => bail!("[io::csv] Empty `{name}` in row {}", row + 1),
        })
        .collect()
}

fn numbers(column: &Column) -> Result<Vec<Option<f64>>> {
    Ok(column.cast(&DataType::Float64)?.f64()?.into_iter().collect())
}

/// Read a stock table with columns `origin,destination,period,stock`.
pub fn read_stock_table(path: &Path) -> Result<StockTable> {
    let df = read_csv(path, string_schema(&["origin", "destination"]))?;
    for name in STOCK_COLUMNS {
        ensure!(df.column(name).is_ok(), "[io::csv] Stock table {} has no `{name}` column", path.display());
    }

    let origins = strings(df.column("origin")?)?;
    let destinations = strings(df.column("destination")?)?;
    let periods = df.column("period")?.cast(&DataType::Int32)?.i32()?.into_iter().collect::<Vec<_>>();
    let stocks = numbers(df.column("stock")?)?;

    let entries = origins.into_iter().zip(destinations).zip(periods).zip(stocks).enumerate()
        .map(|(row, (((origin, destination), period), stock))| match (period, stock) {
            (Some(period), Some(stock)) => Ok(StockEntry::new(origin, destination, period, stock)),
            _ => bail!("[io::csv] Missing period or stock in row {}", row + 1),
        })
        .collect::<Result<Vec<_>>>()?;

    StockTable::from_entries(entries)
        .with_context(|| format!("[io::csv] Invalid stock table {}", path.display()))
}

/// Read an attribute table: an `id_column` plus numeric columns.
/// Non-numeric columns are skipped; empty cells stay missing.
pub fn read_attribute_table(path: &Path, id_column: &str) -> Result<AttributeTable> {
    let df = read_csv(path, string_schema(&[id_column]))?;
    let ids = strings(df.column(id_column)
        .with_context(|| format!("[io::csv] Attribute table {} has no `{id_column}` column", path.display()))?)?
        .into_iter().map(RegionId::from).collect::<Vec<_>>();

    let mut table = AttributeTable::new();
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == id_column { continue }
        if !matches!(
            column.dtype(),
            DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 | DataType::UInt64 | DataType::UInt32
        ) {
            tracing::debug!(column = name, dtype = %column.dtype(), "skipping non-numeric attribute column");
            continue
        }
        for (id, value) in ids.iter().zip(numbers(column)?) {
            if let Some(value) = value {
                table.insert(name, id.clone(), value);
            }
        }
    }
    Ok(table)
}
