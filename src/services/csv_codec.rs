use crate::entities::ProductModel;
use crate::errors::ServiceError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;

/// Fixed header of the product export.
pub const EXPORT_HEADER: &str =
    "id,name,unit,category,brand,stock,status,image,createdAt,updatedAt";

/// One data row of an uploaded CSV file, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRecord(HashMap<String, String>);

impl CsvRecord {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Value of `column`, or an empty string when the file has no such column.
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Parses CSV text with a header row into records.
///
/// Blank lines are ignored. Rows whose field count differs from the header,
/// and bytes that are not UTF-8, reject the whole file.
pub fn parse_records(data: &[u8]) -> Result<Vec<CsvRecord>, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::ParseError(e.to_string()))?
        .clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(|e| ServiceError::ParseError(e.to_string()))?;
        records.push(CsvRecord::from_pairs(
            headers.iter().zip(row.iter()),
        ));
    }

    Ok(records)
}

/// Lenient stock reading used by batch import: anything that is not a
/// non-negative whole number within range becomes 0.
pub fn lenient_stock(raw: &str) -> i32 {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value <= f64::from(i32::MAX) =>
        {
            value as i32
        }
        _ => 0,
    }
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Renders products as export CSV: text fields quoted, id and stock bare.
pub fn render_products(products: &[ProductModel]) -> String {
    let mut out = String::with_capacity(EXPORT_HEADER.len() + 1 + products.len() * 96);
    out.push_str(EXPORT_HEADER);
    out.push('\n');

    for p in products {
        let row = [
            p.id.to_string(),
            quoted(&p.name),
            quoted(&p.unit),
            quoted(&p.category),
            quoted(&p.brand),
            p.stock.to_string(),
            quoted(&p.status),
            quoted(&p.image),
            quoted(&timestamp(&p.created_at)),
            quoted(&timestamp(&p.updated_at)),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}
