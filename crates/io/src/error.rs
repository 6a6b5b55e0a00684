use std::fmt;

use pcinn_core::CanonicalField;

/// Fatal ingestion failure. No rows are produced when one of these occurs.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestError {
    /// Extension is not `.csv` or `.xlsx`.
    UnsupportedFileType(String),
    /// The codec could not decode the bytes.
    Unreadable(String),
    /// Workbook without any sheet.
    NoSheets,
    /// No rows at all, not even a header.
    EmptyFile,
    /// A header row but zero data rows.
    NoDataRows,
    /// Data row count above the configured ceiling.
    TooManyRows { count: usize, max: usize },
    /// Required canonical fields with no matching column.
    MissingColumns(Vec<CanonicalField>),
    /// Two headers assert opposite units for the same field.
    UnitConflict { field: CanonicalField, first: String, second: String },
    /// Neither a header hint nor the value ranges settle the unit.
    AmbiguousUnits(Vec<CanonicalField>),
    /// Every data row lacked at least one field.
    NoCompleteRows,
    /// Reading the file from disk failed.
    Io(String),
}

impl IngestError {
    /// Extra guidance shown after the message, when there is any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::MissingColumns(_) => Some(
                "expected headers like m_molar (or [M]), s_molar (or [S]), i_molar (or [I]), \
                 temperature_k or temperature_c, time_s or time_min",
            ),
            Self::UnitConflict { .. } | Self::AmbiguousUnits(_) => Some(
                "name the column with its unit: temperature_k / temperature_c, time_s / time_min",
            ),
            Self::UnsupportedFileType(_) | Self::Unreadable(_) => {
                Some("upload a single-sheet .csv or .xlsx file")
            }
            _ => None,
        }
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFileType(ext) if ext.is_empty() => {
                write!(f, "Unsupported file type. Please upload a .csv or .xlsx file.")
            }
            Self::UnsupportedFileType(ext) => {
                write!(f, "Unsupported file type '.{ext}'. Please upload a .csv or .xlsx file.")
            }
            Self::Unreadable(msg) => {
                write!(f, "Could not read file. Make sure it is a valid .csv or .xlsx file ({msg})")
            }
            Self::NoSheets => write!(f, "File contains no sheets."),
            Self::EmptyFile => write!(f, "File is empty."),
            Self::NoDataRows => write!(f, "File has a header row but no data rows."),
            Self::TooManyRows { count, max } => {
                write!(f, "File contains {count} data rows. Maximum allowed is {max}.")
            }
            Self::MissingColumns(fields) => {
                write!(f, "Missing required columns: {}.", join_fields(fields))
            }
            Self::UnitConflict { field, first, second } => write!(
                f,
                "Conflicting unit headers for {field}: '{first}' and '{second}'. Use one unit per column."
            ),
            Self::AmbiguousUnits(fields) => {
                write!(f, "Cannot determine units for: {}.", join_fields(fields))
            }
            Self::NoCompleteRows => write!(
                f,
                "No valid data rows found. Ensure rows have numeric values for all 5 input fields."
            ),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}
