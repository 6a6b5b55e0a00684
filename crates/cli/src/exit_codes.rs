//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | ingest           | File format, schema, unit and row codes  |
//! | 10-19   | service          | Prediction service codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use pcinn_client::ApiError;
use pcinn_io::IngestError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Ingest (3-9)
// =============================================================================

/// Unsupported extension or undecodable file.
pub const EXIT_INGEST_FORMAT: u8 = 3;

/// No usable rows: empty file, header only, or no complete row.
pub const EXIT_INGEST_EMPTY: u8 = 4;

/// Required columns missing or row ceiling exceeded.
pub const EXIT_INGEST_SCHEMA: u8 = 5;

/// Conflicting or undeterminable temperature/time units.
pub const EXIT_INGEST_UNITS: u8 = 6;

/// Rows (or interactive inputs) outside the validation bounds.
/// `validate` only returns this with `--strict`.
pub const EXIT_INGEST_OUT_OF_RANGE: u8 = 7;

// =============================================================================
// Service (10-19)
// =============================================================================

/// Transport failure reaching the service.
pub const EXIT_SERVICE_NETWORK: u8 = 10;

/// Service answered with an error status.
pub const EXIT_SERVICE_HTTP: u8 = 11;

/// Service answered with a body we could not read.
pub const EXIT_SERVICE_PARSE: u8 = 12;

/// No answer within the wait limit.
pub const EXIT_SERVICE_TIMEOUT: u8 = 13;

/// Map an ingestion failure to its exit code.
pub fn ingest_exit_code(err: &IngestError) -> u8 {
    match err {
        IngestError::UnsupportedFileType(_) | IngestError::Unreadable(_) | IngestError::NoSheets => {
            EXIT_INGEST_FORMAT
        }
        IngestError::EmptyFile | IngestError::NoDataRows | IngestError::NoCompleteRows => EXIT_INGEST_EMPTY,
        IngestError::MissingColumns(_) | IngestError::TooManyRows { .. } => EXIT_INGEST_SCHEMA,
        IngestError::UnitConflict { .. } | IngestError::AmbiguousUnits(_) => EXIT_INGEST_UNITS,
        IngestError::Io(_) => EXIT_USAGE,
    }
}

/// Map a service failure to its exit code.
pub fn api_exit_code(err: &ApiError) -> u8 {
    match err {
        ApiError::Network(_) => EXIT_SERVICE_NETWORK,
        ApiError::Http { .. } => EXIT_SERVICE_HTTP,
        ApiError::Parse(_) => EXIT_SERVICE_PARSE,
        ApiError::Cancelled => EXIT_ERROR,
    }
}
