// Plain-text rendering for command output

use std::path::Path;

use serde::Serialize;

use pcinn_client::PredictOutcome;
use pcinn_core::{
    BatchStats, CompareSummary, ModelBatchResult, ModelInfo, ModelName, OutputField, RowError,
};
use pcinn_io::{Basis, IngestResult, TemperatureUnit, TimeUnit, UnitResolution};

/// Errors listed before the rest are summarized.
const MAX_LISTED_ERRORS: usize = 20;

/// `pcinn run --json` payload.
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub total_rows: usize,
    pub row_errors: &'a [RowError],
    pub results: &'a [ModelBatchResult],
    pub stats: Vec<BatchStats>,
}

impl<'a> RunReport<'a> {
    pub fn new(total_rows: usize, row_errors: &'a [RowError], results: &'a [ModelBatchResult]) -> Self {
        Self {
            total_rows,
            row_errors,
            results,
            stats: results.iter().filter_map(BatchStats::compute).collect(),
        }
    }
}

fn basis_label(basis: Basis) -> &'static str {
    match basis {
        Basis::Header => "from header",
        Basis::Heuristic => "detected from values",
        Basis::Empty => "no values",
    }
}

fn unit_notes(resolution: &UnitResolution) -> Vec<String> {
    let mut notes = Vec::new();
    let temp = resolution.temperature;
    match temp.unit {
        TemperatureUnit::Celsius => notes.push(format!(
            "temperature: °C converted to K ({})",
            basis_label(temp.basis)
        )),
        TemperatureUnit::Kelvin => notes.push(format!("temperature: K ({})", basis_label(temp.basis))),
    }
    let time = resolution.time;
    match time.unit {
        TimeUnit::Minutes => notes.push(format!(
            "time: min converted to s ({})",
            basis_label(time.basis)
        )),
        TimeUnit::Seconds => notes.push(format!("time: s ({})", basis_label(time.basis))),
    }
    notes
}

pub fn print_ingest(file: &Path, result: &IngestResult) {
    println!(
        "{}: {} rows, {} valid, {} with errors",
        file.display(),
        result.rows.len(),
        result.valid.len(),
        result.rows.len() - result.valid.len()
    );
    for note in unit_notes(&result.resolution) {
        println!("  {}", note);
    }
    if result.skipped_incomplete > 0 {
        println!("  skipped {} incomplete row(s)", result.skipped_incomplete);
    }

    for err in result.errors.iter().take(MAX_LISTED_ERRORS) {
        println!("  {}", err);
    }
    if result.errors.len() > MAX_LISTED_ERRORS {
        println!("  ... and {} more", result.errors.len() - MAX_LISTED_ERRORS);
    }
}

fn print_stats(stats: &BatchStats) {
    println!("{} ({} rows)", stats.model.display_name(), stats.count);
    println!("  {:<12} {:>14} {:>14} {:>14}", "field", "min", "mean", "max");
    for (field, s) in &stats.fields {
        println!(
            "  {:<12} {:>14} {:>14} {:>14}",
            field.name(),
            format_value(*field, s.min),
            format_value(*field, s.mean),
            format_value(*field, s.max)
        );
    }
}

fn format_value(field: OutputField, value: f64) -> String {
    match field {
        OutputField::Conversion | OutputField::Dispersity => format!("{:.4}", value),
        _ => format!("{:.0}", value),
    }
}

pub fn print_batch(results: &[ModelBatchResult]) {
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match BatchStats::compute(result) {
            Some(stats) => print_stats(&stats),
            None => println!("{}: no rows", result.model.display_name()),
        }
    }
}

pub fn print_prediction(model: ModelName, outcome: &PredictOutcome) {
    let p = &outcome.point;
    println!("{}", model.display_name());
    println!("  conversion  {:.4}", p.conversion);
    println!("  Mn          {:.0} g/mol", p.mn);
    println!("  Mw          {:.0} g/mol", p.mw);
    println!("  Mz          {:.0} g/mol", p.mz);
    println!("  Mv          {:.0} g/mol", p.mv);
    println!("  dispersity  {:.4}", p.dispersity);

    let times = &outcome.timeseries.times;
    if let (Some(first), Some(last)) = (times.first(), times.last()) {
        println!(
            "  time series: {} points, {:.0} s to {:.0} s",
            times.len(),
            first,
            last
        );
    }
}

pub fn print_compare(summary: &[CompareSummary]) {
    println!("{:<12} {:>10} {:>12} {:>12} {:>10}", "model", "conversion", "Mn", "Mw", "Đ");
    for s in summary {
        println!(
            "{:<12} {:>10.4} {:>12.0} {:>12.0} {:>10.4}",
            s.model.display_name(),
            s.conversion,
            s.mn,
            s.mw,
            s.dispersity
        );
    }
}

pub fn print_models(models: &[ModelInfo]) {
    for m in models {
        let marker = if m.is_default { " (default)" } else { "" };
        println!("{:<12} {}{}", m.name, m.display_name, marker);
        if !m.description.is_empty() {
            println!("             {}", m.description);
        }
    }
}
