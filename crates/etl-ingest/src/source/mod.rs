//! Source decoding, CSV parsing and column type inference.

mod infer;
mod reader;

pub use infer::{InferredType, build_frame, infer_column_type};
pub use reader::{DEFAULT_ENCODING, RawTable, decode_source, extract, parse_table, resolve_encoding};
