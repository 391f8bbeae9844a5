//! `country_mappings` queries (spec.md §3, §4.1 step d).

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tariff_core::errors::StorageError;
use tariff_core::types::country::CountryMapping;

use super::sqe;

fn row_to_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<CountryMapping> {
    let effective_start: String = row.get("effective_start")?;
    let effective_end: Option<String> = row.get("effective_end")?;
    Ok(CountryMapping {
        census_code: row.get("census_code")?,
        ch99_country_heading: row.get("ch99_country_heading")?,
        iso_alpha2: row.get("iso_alpha2")?,
        effective_start: effective_start.parse().unwrap_or(NaiveDate::MIN),
        effective_end: effective_end.and_then(|s| s.parse().ok()),
    })
}

pub fn lookup_by_ch99_heading(
    conn: &Connection,
    ch99_country_heading: &str,
    as_of: NaiveDate,
) -> Result<Option<CountryMapping>, StorageError> {
    conn.query_row(
        "SELECT * FROM country_mappings
         WHERE ch99_country_heading = ?1
           AND effective_start <= ?2 AND (effective_end IS NULL OR effective_end > ?2)
         ORDER BY effective_start DESC LIMIT 1",
        params![ch99_country_heading, as_of.to_string()],
        row_to_mapping,
    )
    .optional()
    .map_err(sqe)
}

pub fn lookup_by_census_code(
    conn: &Connection,
    census_code: &str,
    as_of: NaiveDate,
) -> Result<Option<CountryMapping>, StorageError> {
    conn.query_row(
        "SELECT * FROM country_mappings
         WHERE census_code = ?1
           AND effective_start <= ?2 AND (effective_end IS NULL OR effective_end > ?2)
         ORDER BY effective_start DESC LIMIT 1",
        params![census_code, as_of.to_string()],
        row_to_mapping,
    )
    .optional()
    .map_err(sqe)
}

pub fn insert(conn: &Connection, mapping: &CountryMapping) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO country_mappings
         (census_code, ch99_country_heading, iso_alpha2, effective_start, effective_end)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            mapping.census_code,
            mapping.ch99_country_heading,
            mapping.iso_alpha2,
            mapping.effective_start.to_string(),
            mapping.effective_end.map(|d| d.to_string()),
        ],
    )
    .map_err(sqe)?;
    Ok(())
}
