//! Process-wide tabular codec handle.
//!
//! The decoder tables are built on first use and shared for the life of the
//! process. Concurrent first callers block on the same initialization.

use std::path::Path;
use std::sync::OnceLock;

use encoding_rs::Encoding;

use crate::error::IngestError;

/// One decoded cell. Text is already trimmed; blank text is `Empty`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Finite numeric value, parsing text when needed.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Empty => return None,
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }

    /// Header text of the cell.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Decoded rows and where they sit in the source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
    /// 1-based sheet row (or CSV line) of `rows[0]`.
    pub first_row: usize,
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Classify by extension (case-insensitive).
    pub fn from_name(file_name: &str) -> Result<Self, IngestError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            _ => Err(IngestError::UnsupportedFileType(ext)),
        }
    }
}

/// Shared decoder configuration.
#[derive(Debug)]
pub struct Codec {
    delimiters: Vec<u8>,
    sniff_lines: usize,
    fallback_encoding: &'static Encoding,
}

static CODEC: OnceLock<Codec> = OnceLock::new();

/// The process-wide codec, initialized on first call.
pub fn codec() -> &'static Codec {
    CODEC.get_or_init(|| {
        log::debug!("initializing tabular codec");
        Codec {
            delimiters: vec![b'\t', b';', b',', b'|'],
            sniff_lines: 10,
            fallback_encoding: encoding_rs::WINDOWS_1252,
        }
    })
}

impl Codec {
    /// Decode file bytes into rows of cells.
    pub fn decode(&self, kind: FileKind, bytes: &[u8]) -> Result<Table, IngestError> {
        match kind {
            FileKind::Csv => {
                crate::csv::decode(bytes, &self.delimiters, self.sniff_lines, self.fallback_encoding)
            }
            FileKind::Xlsx => crate::xlsx::decode(bytes),
        }
    }
}
