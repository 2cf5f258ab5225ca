use std::io::Write;
use std::path::Path;

use etl_common::any_to_string;
use etl_ingest::{DEFAULT_ENCODING, IngestError, extract};
use polars::prelude::DataType;
use tempfile::NamedTempFile;

fn write_csv(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn extract_reads_typed_frame() {
    let file = write_csv(b"client_id,email,age\n1,a@x.com,30\n2,b@x.com,\n");
    let df = extract(file.path(), DEFAULT_ENCODING).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(
        df.get_column_names()
            .iter()
            .map(|n| n.as_str())
            .collect::<Vec<_>>(),
        vec!["client_id", "email", "age"]
    );
    assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
    assert_eq!(df.column("age").unwrap().null_count(), 1);
}

#[test]
fn extract_header_only_is_empty_frame() {
    let file = write_csv(b"email,age\n");
    let df = extract(file.path(), DEFAULT_ENCODING).unwrap();
    assert_eq!(df.height(), 0);
    assert_eq!(df.width(), 2);
}

#[test]
fn extract_empty_file_is_error() {
    let file = write_csv(b"");
    let err = extract(file.path(), DEFAULT_ENCODING).unwrap_err();
    assert!(matches!(err, IngestError::EmptyInput { .. }));
    assert_eq!(err.kind(), "EmptyInput");
}

#[test]
fn extract_missing_file() {
    let err = extract(Path::new("/nonexistent/clients.csv"), DEFAULT_ENCODING).unwrap_err();
    assert!(matches!(err, IngestError::SourceNotFound { .. }));
}

#[test]
fn extract_latin1_source() {
    let file = write_csv(b"city\nS\xe3o Paulo\n");
    let df = extract(file.path(), "latin1").unwrap();
    let city = df.column("city").unwrap().get(0).unwrap();
    assert_eq!(any_to_string(city), "São Paulo");
}

#[test]
fn extract_wrong_encoding_is_error() {
    let file = write_csv(b"city\nS\xe3o Paulo\n");
    let err = extract(file.path(), "utf-8").unwrap_err();
    assert_eq!(err.kind(), "EncodingError");
}
