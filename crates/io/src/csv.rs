// CSV/TSV decoding into rows of cells

use encoding_rs::Encoding;

use crate::codec::{Cell, Table};
use crate::error::IngestError;

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate, count fields per line. The delimiter that produces the most
/// consistent field count (>1 field) wins. Falls back to comma.
pub(crate) fn sniff_delimiter(content: &str, candidates: &[u8], sample: usize) -> u8 {
    let sample_lines: Vec<&str> = content.lines().take(sample).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: lines agreeing with line 1, weighted by field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode bytes as UTF-8, falling back to a legacy encoding (Excel-exported CSVs).
pub(crate) fn to_utf8(bytes: &[u8], fallback: &'static Encoding) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = fallback.decode(bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

pub(crate) fn decode(
    bytes: &[u8],
    candidates: &[u8],
    sample: usize,
    fallback: &'static Encoding,
) -> Result<Table, IngestError> {
    let content = to_utf8(bytes, fallback);
    let delimiter = sniff_delimiter(&content, candidates, sample);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IngestError::Unreadable(e.to_string()))?;
        let row = record
            .iter()
            .map(|field| {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(trimmed.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Table { rows, first_row: 1 })
}
