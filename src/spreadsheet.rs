//! Spreadsheet reading
//!
//! A delimited text file with a header row. Columns are located by the
//! configured header names; a missing column reads as empty fields.

use crate::config::CsvColumns;
use crate::error::{ClipError, Result};
use crate::types::TrackRow;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column positions of the four logical fields
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    name: Option<usize>,
    surname: Option<usize>,
    song: Option<usize>,
    start_time: Option<usize>,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord, columns: &CsvColumns) -> Self {
        let find = |wanted: &str| {
            let idx = headers.iter().position(|h| h.trim() == wanted.trim());
            if idx.is_none() {
                warn!("Column '{}' not found in spreadsheet header", wanted);
            }
            idx
        };
        Self {
            name: find(&columns.name),
            surname: find(&columns.surname),
            song: find(&columns.song),
            start_time: find(&columns.start_time),
        }
    }

    fn row(&self, record: &csv::StringRecord) -> TrackRow {
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("");
        TrackRow::new(
            field(self.name),
            field(self.surname),
            field(self.song),
            field(self.start_time),
        )
    }
}

/// Read every row of a spreadsheet into memory
pub fn read_rows(path: &Path, delimiter: u8, columns: &CsvColumns) -> Result<Vec<TrackRow>> {
    let file = std::fs::File::open(path).map_err(|e| ClipError::SpreadsheetError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let rows = parse_rows(file, delimiter, columns).map_err(|e| match e {
        ClipError::SpreadsheetError { reason, .. } => ClipError::SpreadsheetError {
            path: path.to_path_buf(),
            reason,
        },
        other => other,
    })?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parse rows from any reader
pub fn parse_rows<R: std::io::Read>(
    reader: R,
    delimiter: u8,
    columns: &CsvColumns,
) -> Result<Vec<TrackRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let spreadsheet_error = |e: csv::Error| ClipError::SpreadsheetError {
        path: Default::default(),
        reason: e.to_string(),
    };

    let headers = reader.headers().map_err(spreadsheet_error)?.clone();
    debug!("Spreadsheet header: {:?}", headers);
    let index = ColumnIndex::resolve(&headers, columns);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(spreadsheet_error)?;
        rows.push(index.row(&record));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_rows() {
        let data = "name;surname;song;start_time\nJohn;Doe;Song A;1:00\n Jane ;Roe ; Song B ;0:30\n";
        let rows = parse_rows(data.as_bytes(), b';', &CsvColumns::default()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], TrackRow::new("John", "Doe", "Song A", "1:00"));
        assert_eq!(rows[1].first_name, "Jane");
        assert_eq!(rows[1].song, "Song B");
    }

    #[test]
    fn test_custom_mapping_and_column_order() {
        let columns = CsvColumns {
            name: "First".to_string(),
            surname: "Last".to_string(),
            song: "Track".to_string(),
            start_time: "At".to_string(),
        };
        let data = "At,Track,Extra,Last,First\n2:10,Hello,x,Smith,Sam\n";
        let rows = parse_rows(data.as_bytes(), b',', &columns).unwrap();
        assert_eq!(rows, vec![TrackRow::new("Sam", "Smith", "Hello", "2:10")]);
    }

    #[test]
    fn test_short_records_and_missing_columns_read_empty() {
        let data = "name;surname;song\nJohn;Doe\n";
        let rows = parse_rows(data.as_bytes(), b';', &CsvColumns::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].song, "");
        assert_eq!(rows[0].start_time, "");
        assert!(!rows[0].is_complete());
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let data = "name;surname;song;start_time\nJohn;Doe;\"Hits; Vol 1\";0:05\n";
        let rows = parse_rows(data.as_bytes(), b';', &CsvColumns::default()).unwrap();
        assert_eq!(rows[0].song, "Hits; Vol 1");
    }

    #[test]
    fn test_missing_file_is_spreadsheet_error() {
        let err = read_rows(Path::new("/no/such.csv"), b';', &CsvColumns::default()).unwrap_err();
        assert!(matches!(err, ClipError::SpreadsheetError { .. }));
        assert!(!err.is_recoverable());
    }
}
