use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// A serializable row with a fixed column layout.
///
/// `HEADERS` must list the serialized field names in declaration order.
pub trait CsvRecord: Serialize {
    const HEADERS: &'static [&'static str];
}

/// Writes `records` as UTF-8 CSV with a byte order mark and a header row.
///
/// The header is written even when `records` is empty. Returns the number of
/// records written.
pub fn write_csv<T: CsvRecord>(records: &[T], path: &Path) -> Result<usize, SampleError> {
    let io_error = |source| SampleError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_error = |source| SampleError::Csv {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    let mut file = File::create(path).map_err(io_error)?;
    file.write_all("\u{feff}".as_bytes()).map_err(io_error)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(T::HEADERS).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush().map_err(io_error)?;
    Ok(records.len())
}
