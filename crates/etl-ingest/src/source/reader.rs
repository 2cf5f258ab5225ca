//! Source file reading with explicit encoding.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use encoding_rs::Encoding;
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use crate::error::{IngestError, Result};

use super::infer::build_frame;

/// Encoding used when a job does not configure one.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Header and rows of a parsed CSV file, before typing.
///
/// Every row has exactly `headers.len()` cells; blank cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Reads `path`, decodes it under `encoding` and returns a typed frame.
///
/// A header-only file yields a frame with zero rows; a file without a header
/// row is [`IngestError::EmptyInput`].
pub fn extract(path: &Path, encoding: &str) -> Result<DataFrame> {
    let span = info_span!("extract", source = %path.display(), encoding = %encoding);
    let _guard = span.enter();
    let start = Instant::now();

    let bytes = read_source(path)?;
    let text = decode_source(path, &bytes, encoding)?;
    let table = parse_table(path, &text)?;
    let df = build_frame(&table)?;

    info!(rows = df.height(), "extracted rows");
    info!(columns = %table.headers.join(", "), "detected columns");
    debug!(
        duration_ms = start.elapsed().as_millis() as u64,
        "extraction complete"
    );
    Ok(df)
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Maps a configured label to an `encoding_rs` encoding.
///
/// Accepts every WHATWG label plus `utf-8-sig`.
pub fn resolve_encoding(label: &str) -> Option<&'static Encoding> {
    let trimmed = label.trim();
    if trimmed.eq_ignore_ascii_case("utf-8-sig") || trimmed.eq_ignore_ascii_case("utf8-sig") {
        return Some(encoding_rs::UTF_8);
    }
    Encoding::for_label(trimmed.as_bytes())
}

/// Decodes raw bytes, dropping a leading byte order mark.
///
/// Malformed input is an error rather than being replaced.
pub fn decode_source(path: &Path, bytes: &[u8], label: &str) -> Result<String> {
    let encoding = resolve_encoding(label).ok_or_else(|| IngestError::UnknownEncoding {
        path: path.to_path_buf(),
        label: label.to_string(),
    })?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(IngestError::Encoding {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        });
    }
    Ok(text.into_owned())
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn normalize_cell(raw: &str) -> Option<String> {
    let cell = raw.trim_matches('\u{feff}');
    if cell.is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

/// Parses decoded CSV text; the first record is the header.
pub fn parse_table(path: &Path, text: &str) -> Result<RawTable> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header_record = reader.headers().map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let headers: Vec<String> = header_record.iter().map(normalize_header).collect();
    if headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    let mut seen = BTreeSet::new();
    for (position, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
                position,
            });
        }
        if !seen.insert(header.as_str()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                column: header.clone(),
            });
        }
    }

    let width = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }
        if record.len() != width {
            debug!(
                line = record.position().map(|p| p.line()).unwrap_or_default(),
                expected = width,
                found = record.len(),
                "ragged row normalised to header width"
            );
        }
        let row: Vec<Option<String>> = (0..width)
            .map(|idx| record.get(idx).and_then(normalize_cell))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("inline.csv")
    }

    #[test]
    fn test_parse_table_pads_and_truncates() {
        let table = parse_table(&path(), "a,b,c\n1,2\n3,4,5,6\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(
            table.rows[0],
            vec![Some("1".to_string()), Some("2".to_string()), None]
        );
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn test_parse_table_keeps_whitespace_cells() {
        let table = parse_table(&path(), "city,zip\n  Paris  ,\n,\n").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec![Some("  Paris  ".to_string()), None]);
    }

    #[test]
    fn test_parse_table_header_only() {
        let table = parse_table(&path(), "email,age\n").unwrap();
        assert_eq!(table.headers, vec!["email", "age"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_parse_table_without_header() {
        assert!(matches!(
            parse_table(&path(), ""),
            Err(IngestError::EmptyInput { .. })
        ));
        assert!(matches!(
            parse_table(&path(), "   \n"),
            Err(IngestError::EmptyInput { .. })
        ));
    }

    #[test]
    fn test_parse_table_rejects_duplicate_headers() {
        assert!(matches!(
            parse_table(&path(), "a,b,a\n1,2,3\n"),
            Err(IngestError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_decode_strips_bom() {
        let bytes = "\u{feff}name\nÉmile\n".as_bytes();
        let text = decode_source(&path(), bytes, "utf-8-sig").unwrap();
        assert_eq!(text, "name\nÉmile\n");
    }

    #[test]
    fn test_decode_latin1() {
        let bytes = b"name\n\xc9mile\n";
        let text = decode_source(&path(), bytes, "latin1").unwrap();
        assert_eq!(text, "name\nÉmile\n");
    }

    #[test]
    fn test_decode_rejects_malformed_utf8() {
        let bytes = b"name\n\xc9mile\n";
        assert!(matches!(
            decode_source(&path(), bytes, "utf-8"),
            Err(IngestError::Encoding { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_label() {
        assert!(matches!(
            decode_source(&path(), b"a\n1\n", "klingon"),
            Err(IngestError::UnknownEncoding { .. })
        ));
    }
}
