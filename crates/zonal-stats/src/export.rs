//! Delimited text export of result tables.
//!
//! Output is UTF-8 without a byte-order mark: a header line, then one line
//! per row. A no-data statistic is an empty field. Fields containing the
//! separator, a quote or a line break are quoted with embedded quotes
//! doubled. Columns that hold serialized geometry are never written.

use std::io;
use std::path::Path;

use zonal_common::FieldNames;

use crate::error::{Result, ZonalError};
use crate::result::ResultTable;

/// Field separator.
pub const SEPARATOR: u8 = b',';

/// True for column names that conventionally hold geometry text.
pub fn is_geometry_field(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    lower.starts_with("geom") || lower == "wkt" || lower == "wkb" || lower == "the_geom"
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(SEPARATOR)
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary);
    builder
}

/// Columns of `fields` that get written. The identifier and statistic
/// columns are always kept, whatever their names look like.
fn selected_fields<'f>(table: &ResultTable, fields: &[&'f str]) -> Vec<&'f str> {
    let names = table.fields();
    let selected: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|&name| {
            name == names.identifier || name == names.statistic || !is_geometry_field(name)
        })
        .collect();

    if selected.len() < fields.len() {
        tracing::debug!(
            dropped = fields.len() - selected.len(),
            "Dropped geometry columns from export"
        );
    }
    selected
}

fn write_table<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    table: &ResultTable,
    fields: &[&str],
) -> Result<()> {
    let selected = selected_fields(table, fields);

    let names = table.fields();
    let mut getters: Vec<Box<dyn Fn(usize) -> String + '_>> = Vec::with_capacity(selected.len());
    for &name in &selected {
        if name == names.identifier {
            getters.push(Box::new(move |i| table.rows()[i].id.to_string()));
        } else if name == names.statistic {
            getters.push(Box::new(move |i| format_value(table.rows()[i].value)));
        } else if let Some(column) = table.column(name) {
            getters.push(Box::new(move |i| column.values[i].clone()));
        } else {
            return Err(ZonalError::UnknownField(name.to_string()));
        }
    }

    wtr.write_record(&selected)?;
    for i in 0..table.len() {
        wtr.write_record(getters.iter().map(|get| get(i)))?;
    }
    Ok(())
}

/// Render `fields` of `table` as delimited text.
///
/// Geometry columns named in `fields` are skipped; any other name the table
/// does not carry is an error.
pub fn to_delimited_text(table: &ResultTable, fields: &[&str]) -> Result<String> {
    let mut wtr = writer_builder().from_writer(Vec::new());
    write_table(&mut wtr, table, fields)?;
    let bytes = wtr.into_inner().map_err(|e| ZonalError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ZonalError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Identifier and statistic columns, the layout downstream merges expect.
pub fn to_csv(table: &ResultTable) -> Result<String> {
    let fields = table.fields();
    to_delimited_text(table, &[fields.identifier.as_str(), fields.statistic.as_str()])
}

/// Every non-geometry column of the table.
pub fn to_csv_all(table: &ResultTable) -> Result<String> {
    to_delimited_text(table, &table.column_names())
}

/// Write the [`to_delimited_text`] layout to `path`.
pub fn write_delimited(path: impl AsRef<Path>, table: &ResultTable, fields: &[&str]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer_builder().from_path(path)?;
    write_table(&mut wtr, table, fields)?;
    wtr.flush()?;
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        "Wrote delimited table"
    );
    Ok(())
}

fn format_value(value: Option<f32>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Parsed delimited text: header plus records of the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    pub header: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl DelimitedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

fn delimited_error(err: csv::Error) -> ZonalError {
    let line = err.position().map_or(0, |pos| pos.line() as usize);
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => ZonalError::delimited(
            line,
            format!("expected {} fields, found {}", expected_len, len),
        ),
        _ => ZonalError::delimited(line, err.to_string()),
    }
}

/// Parse delimited text in the format [`to_delimited_text`] writes.
///
/// Accepts `\n` or `\r\n` line endings and quoted fields spanning lines.
/// A leading byte-order mark is ignored. Every record must be as wide as
/// the header.
pub fn parse_delimited_text(text: &str) -> Result<DelimitedTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(SEPARATOR)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let header: Vec<String> = rdr
        .headers()
        .map_err(delimited_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if header.is_empty() {
        return Err(ZonalError::delimited(1, "missing header line"));
    }

    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(delimited_error)?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(DelimitedTable { header, records })
}

/// Read back `(identifier, statistic)` pairs from exported text.
///
/// Identifiers come back exactly as written, compare them with
/// [`ResultTable::exported_pairs`].
pub fn parse_result_pairs(text: &str, fields: &FieldNames) -> Result<Vec<(String, Option<f32>)>> {
    let table = parse_delimited_text(text)?;
    let id_col = table
        .column_index(&fields.identifier)
        .ok_or_else(|| ZonalError::UnknownField(fields.identifier.clone()))?;
    let stat_col = table
        .column_index(&fields.statistic)
        .ok_or_else(|| ZonalError::UnknownField(fields.statistic.clone()))?;

    table
        .records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let raw_value = record[stat_col].trim();
            let value = if raw_value.is_empty() {
                None
            } else {
                Some(raw_value.parse::<f32>().map_err(|e| {
                    ZonalError::delimited(i + 2, format!("bad statistic '{}': {}", raw_value, e))
                })?)
            };
            Ok((record[id_col].clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ResultRow;

    fn table() -> ResultTable {
        ResultTable::new(
            FieldNames::default(),
            vec![
                ResultRow::new(101i64.into(), Some(7.25)),
                ResultRow::new(102i64.into(), None),
                ResultRow::new(103i64.into(), Some(0.0)),
            ],
        )
        .with_column(
            "nom",
            vec!["Fès".into(), "Ain, Sbit".into(), "say \"hi\"".into()],
        )
        .unwrap()
        .with_column("geometry", vec!["POLYGON ((0 0, 1 0, 0 1, 0 0))".into(); 3])
        .unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let text = to_csv(&table()).unwrap();
        assert_eq!(text, "code_commu,OUT_max\n101,7.25\n102,\n103,0\n");
        assert!(!text.starts_with('\u{feff}'));
    }

    #[test]
    fn test_geometry_always_dropped() {
        let text = to_delimited_text(&table(), &["code_commu", "geometry", "OUT_max"]).unwrap();
        assert!(!text.contains("POLYGON"));
        assert!(text.starts_with("code_commu,OUT_max\n"));

        let all = to_csv_all(&table()).unwrap();
        assert!(all.starts_with("code_commu,OUT_max,nom\n"));
        assert!(!all.contains("POLYGON"));
    }

    #[test]
    fn test_geometry_field_names() {
        for name in ["geometry", "GEOM", "geom_wkt", "WKT", "the_geom"] {
            assert!(is_geometry_field(name), "{name}");
        }
        for name in ["OUT_max", "code_commu", "region"] {
            assert!(!is_geometry_field(name), "{name}");
        }
    }

    #[test]
    fn test_identifier_and_statistic_never_filtered() {
        let table = ResultTable::new(
            FieldNames::new("geom_code", "geom_max"),
            vec![ResultRow::new("A1".into(), Some(4.5))],
        )
        .with_column("geometry", vec!["POINT (0 0)".into()])
        .unwrap();

        let text = to_csv_all(&table).unwrap();
        assert_eq!(text, "geom_code,geom_max\nA1,4.5\n");

        let pairs = parse_result_pairs(&text, table.fields()).unwrap();
        assert_eq!(pairs, vec![("A1".to_string(), Some(4.5))]);
    }

    #[test]
    fn test_unknown_field() {
        assert!(matches!(
            to_delimited_text(&table(), &["code_commu", "nope"]),
            Err(ZonalError::UnknownField(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_quoting_and_parse_back() {
        let text = to_csv_all(&table()).unwrap();
        assert!(text.contains("\"Ain, Sbit\""));
        assert!(text.contains("\"say \"\"hi\"\"\""));

        let parsed = parse_delimited_text(&text).unwrap();
        assert_eq!(parsed.header, vec!["code_commu", "OUT_max", "nom"]);
        assert_eq!(parsed.records[1], vec!["102", "", "Ain, Sbit"]);
        assert_eq!(parsed.records[2][2], "say \"hi\"");
        assert_eq!(parsed.records[0][2], "Fès");
    }

    #[test]
    fn test_pairs_recovered() {
        let table = table();
        let text = to_csv(&table).unwrap();
        let pairs = parse_result_pairs(&text, table.fields()).unwrap();
        assert_eq!(pairs, table.exported_pairs());
    }

    #[test]
    fn test_text_ids_keep_leading_zeros() {
        let table = ResultTable::new(
            FieldNames::default(),
            vec![
                ResultRow::new("007".into(), Some(5.0)),
                ResultRow::new("12".into(), None),
                ResultRow::new(12i64.into(), Some(1.5)),
            ],
        );
        let text = to_csv(&table).unwrap();
        assert_eq!(text, "code_commu,OUT_max\n007,5\n12,\n12,1.5\n");

        let pairs = parse_result_pairs(&text, table.fields()).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("007".to_string(), Some(5.0)),
                ("12".to_string(), None),
                ("12".to_string(), Some(1.5)),
            ]
        );
        assert_eq!(pairs, table.exported_pairs());
    }

    #[test]
    fn test_write_delimited_matches_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("communes.csv");
        let table = table();

        write_delimited(&path, &table, &["code_commu", "OUT_max", "nom"]).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_csv_all(&table).unwrap());
    }

    #[test]
    fn test_parse_crlf_and_quoted_newline() {
        let parsed = parse_delimited_text("a,b\r\n1,\"x\ny\"\r\n").unwrap();
        assert_eq!(parsed.records, vec![vec!["1".to_string(), "x\ny".to_string()]]);

        let bom = parse_delimited_text("\u{feff}a,b\n1,2\n").unwrap();
        assert_eq!(bom.header, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_delimited_text("a,b\n1\n"),
            Err(ZonalError::Delimited { line: 2, .. })
        ));
        assert!(matches!(
            parse_delimited_text("a,b\n1,2\n3,4,5\n"),
            Err(ZonalError::Delimited { line: 3, .. })
        ));
        assert!(parse_delimited_text("").is_err());
        assert!(parse_result_pairs("code_commu,OUT_max\n1,high\n", &FieldNames::default()).is_err());
        assert!(matches!(
            parse_result_pairs("id,OUT_max\n1,2\n", &FieldNames::default()),
            Err(ZonalError::UnknownField(name)) if name == "code_commu"
        ));
    }
}
