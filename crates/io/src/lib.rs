//! Tabular ingestion: CSV/XLSX bytes to validated reaction-condition rows.

pub mod codec;
mod csv;
pub mod error;
pub mod headers;
pub mod ingest;
pub mod units;
pub mod validate;
mod xlsx;

pub use codec::{codec, Cell, Codec, FileKind, Table};
pub use error::IngestError;
pub use headers::{canonicalize, HeaderMap, UnitHint, UnitHints};
pub use ingest::{ingest, ingest_path, IngestOptions, IngestResult};
pub use units::{Basis, Resolved, TemperatureUnit, Thresholds, TimeUnit, UnitResolution};
pub use validate::{validate_row, validate_rows};
