//! End-to-end ingestion of CSV and XLSX uploads.

use pcinn_core::CanonicalField;
use pcinn_io::{
    canonicalize, ingest, ingest_path, Basis, Cell, IngestError, IngestOptions, TemperatureUnit,
    TimeUnit,
};
use proptest::prelude::*;
use rust_xlsxwriter::Workbook;

fn ingest_csv(content: &str) -> Result<pcinn_io::IngestResult, IngestError> {
    ingest("upload.csv", content.as_bytes(), &IngestOptions::default())
}

#[test]
fn celsius_header_converts_to_kelvin() {
    let result = ingest_csv("[M],[S],[I],Temperature (°C),time_s\n3.326,6.674,0.0246,60,7200\n").unwrap();
    let row = result.valid[0];
    assert!((row.temperature_k - 333.15).abs() < 1e-9);
    assert_eq!(result.resolution.temperature.unit, TemperatureUnit::Celsius);
    assert_eq!(result.resolution.temperature.basis, Basis::Header);
}

#[test]
fn kelvin_header_passes_through() {
    let result = ingest_csv("m_molar,s_molar,i_molar,temperature_k,time_s\n3.326,6.674,0.0246,333.15,7200\n").unwrap();
    assert_eq!(result.valid[0].temperature_k, 333.15);
    assert_eq!(result.valid[0].time_s, 7200.0);
    assert!(!result.resolution.converts());
}

#[test]
fn generic_headers_use_value_ranges() {
    let csv = "monomer,solvent,initiator,temp,time\n3,7,0.02,60,3600\n2,6,0.01,70,7200\n";
    let result = ingest_csv(csv).unwrap();
    assert_eq!(result.resolution.temperature.unit, TemperatureUnit::Celsius);
    assert_eq!(result.resolution.temperature.basis, Basis::Heuristic);
    assert_eq!(result.resolution.time.unit, TimeUnit::Seconds);
    assert!((result.rows[1].temperature_k - 343.15).abs() < 1e-9);
    assert_eq!(result.rows[1].time_s, 7200.0);
}

#[test]
fn short_generic_time_is_ambiguous() {
    let err = ingest_csv("m,s,i,temp_k,time\n3,7,0.02,333,120\n").unwrap_err();
    assert_eq!(err, IngestError::AmbiguousUnits(vec![CanonicalField::TimeS]));
}

#[test]
fn seconds_and_minutes_headers_conflict() {
    let err = ingest_csv("m,s,i,temp_k,time_s,time_min\n3,7,0.02,333,7200,120\n").unwrap_err();
    assert!(matches!(err, IngestError::UnitConflict { field: CanonicalField::TimeS, .. }));
    let msg = err.to_string();
    assert!(msg.contains("time_s") && msg.contains("time_min"));
}

#[test]
fn missing_columns_named_exactly() {
    let err = ingest_csv("m_molar,s_molar,i_molar,temperature_k\n3,7,0.02,333\n").unwrap_err();
    assert_eq!(err, IngestError::MissingColumns(vec![CanonicalField::TimeS]));
}

#[test]
fn out_of_range_initiator_keeps_siblings_valid() {
    let csv = "m_molar,s_molar,i_molar,temperature_k,time_s\n\
               3,7,0.02,333.15,7200\n\
               3,7,0.2,333.15,7200\n\
               2,6,0.01,343.15,3600\n";
    let result = ingest_csv(csv).unwrap();
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.valid.iter().map(|r| r.row_index).collect::<Vec<_>>(), vec![2, 4]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row_index, 3);
    assert_eq!(result.errors[0].field, CanonicalField::IMolar);
}

#[test]
fn header_only_differs_from_empty() {
    assert_eq!(ingest_csv("").unwrap_err(), IngestError::EmptyFile);
    assert_eq!(
        ingest_csv("m_molar,s_molar,i_molar,temperature_k,time_s\n").unwrap_err(),
        IngestError::NoDataRows
    );
}

#[test]
fn more_than_a_thousand_rows_rejected() {
    let mut csv = String::from("m_molar,s_molar,i_molar,temperature_k,time_s\n");
    for _ in 0..1001 {
        csv.push_str("3,7,0.02,333.15,7200\n");
    }
    let err = ingest_csv(&csv).unwrap_err();
    assert_eq!(err, IngestError::TooManyRows { count: 1001, max: 1000 });
    assert_eq!(err.to_string(), "File contains 1001 data rows. Maximum allowed is 1000.");
}

#[test]
fn unsupported_extension_rejected() {
    let err = ingest("runs.json", b"{}", &IngestOptions::default()).unwrap_err();
    assert_eq!(err, IngestError::UnsupportedFileType("json".into()));
}

#[test]
fn semicolon_csv_with_windows_1252_header() {
    let bytes = b"[M];[S];[I];Temp (\xb0C);Time (min)\n3;7;0.02;60;120\n";
    let result = ingest("excel.CSV", bytes, &IngestOptions::default()).unwrap();
    assert_eq!(result.valid.len(), 1);
    assert_eq!(result.valid[0].time_s, 7200.0);
}

#[test]
fn xlsx_file_from_disk() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, header) in ["m_molar", "s_molar", "i_molar", "temperature_c", "time_min"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (col, value) in [3.326, 6.674, 0.0246, 60.0, 120.0].iter().enumerate() {
        sheet.write_number(1, col as u16, *value).unwrap();
    }
    // Text numbers are accepted too
    sheet.write_string(2, 0, "2.0").unwrap();
    for (col, value) in [6.0, 0.01, 70.0, 60.0].iter().enumerate() {
        sheet.write_number(2, col as u16 + 1, *value).unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.xlsx");
    workbook.save(&path).unwrap();

    let result = ingest_path(&path, &IngestOptions::default()).unwrap();
    assert_eq!(result.valid.len(), 2);
    assert!((result.valid[0].temperature_k - 333.15).abs() < 1e-9);
    assert_eq!(result.valid[1].m_molar, 2.0);
    assert_eq!(result.valid[1].time_s, 3600.0);
}

#[test]
fn xlsx_row_numbers_follow_the_sheet() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    // Title block above the table; header on sheet row 3.
    for (col, header) in ["m_molar", "s_molar", "i_molar", "temperature_k", "time_s"].iter().enumerate() {
        sheet.write_string(2, col as u16, *header).unwrap();
    }
    for (col, value) in [3.0, 7.0, 0.02, 333.15, 7200.0].iter().enumerate() {
        sheet.write_number(3, col as u16, *value).unwrap();
    }
    for (col, value) in [3.0, 7.0, 0.2, 333.15, 7200.0].iter().enumerate() {
        sheet.write_number(4, col as u16, *value).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let result = ingest("runs.xlsx", &bytes, &IngestOptions::default()).unwrap();
    assert_eq!(result.rows[0].row_index, 4);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].row_index, 5);
    assert_eq!(result.errors[0].field, CanonicalField::IMolar);
}

fn mangle(spelling: &str, upper: Vec<bool>, pad_left: usize, pad_right: usize) -> String {
    let cased: String = spelling
        .chars()
        .zip(upper.into_iter().chain(std::iter::repeat(false)))
        .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
        .collect();
    format!("{}{}{}", " ".repeat(pad_left), cased, " ".repeat(pad_right))
}

proptest! {
    #[test]
    fn concentration_spellings_canonicalize(
        idx in 0usize..4,
        upper in proptest::collection::vec(any::<bool>(), 0..12),
        pad_left in 0usize..3,
        pad_right in 0usize..3,
    ) {
        let spellings = [
            ("m_molar", CanonicalField::MMolar),
            ("[m]", CanonicalField::MMolar),
            ("solvent", CanonicalField::SMolar),
            ("initiator", CanonicalField::IMolar),
        ];
        let (spelling, field) = spellings[idx];
        let header = vec![Cell::Text(mangle(spelling, upper, pad_left, pad_right))];
        let map = canonicalize(&header).unwrap();
        prop_assert_eq!(map.column_for(field), Some(0));
    }
}
