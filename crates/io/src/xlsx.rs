// Excel workbook decoding (xlsx). Only the first sheet is read.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::codec::{Cell, Table};
use crate::error::IngestError;

pub(crate) fn decode(bytes: &[u8]) -> Result<Table, IngestError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Unreadable(format!("failed to open Excel file: {}", e)))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(IngestError::NoSheets);
    };

    let range = workbook
        .worksheet_range(sheet_name)
        .map_err(|e| IngestError::Unreadable(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    let (height, width) = range.get_size();
    let Some((start_row, _)) = range.start().filter(|_| height > 0 && width > 0) else {
        return Ok(Table::default());
    };

    // The used range may start below row 1 and may open with formatted but
    // empty rows; number rows from the top of the sheet either way.
    let mut first_row = start_row as usize + 1;
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(height);
    for row in range.rows() {
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if rows.is_empty() && cells.iter().all(Cell::is_empty) {
            first_row += 1;
            continue;
        }
        rows.push(cells);
    }

    Ok(Table { rows, first_row })
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(trimmed.to_string())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        // Serial number, same as Excel shows in General format
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}
