// pcinn CLI - batch and interactive predictions against the PCINN service

mod exit_codes;
mod report;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use pcinn_client::{
    ApiClient, ApiError, CompareSurface, PredictSurface, RunMode, Submission, UploadSession,
};
use pcinn_config::{Settings, API_URL_ENV};
use pcinn_core::{FormValues, ModelName, ParsedRow, PredictionInput, TimeSeriesInput};
use pcinn_io::{ingest_path, validate_row, IngestError, IngestOptions};

use exit_codes::{
    api_exit_code, ingest_exit_code, EXIT_ERROR, EXIT_INGEST_OUT_OF_RANGE, EXIT_SERVICE_TIMEOUT,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "pcinn")]
#[command(about = "Polymerization outcome predictions from reaction conditions")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Prediction service root, e.g. http://localhost:8000 (overrides PCINN_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Settings file (default: <config dir>/pcinn/settings.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug events to stderr (RUST_LOG still wins when set)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an upload file without contacting the service
    #[command(after_help = "\
Examples:
  pcinn validate runs.csv
  pcinn validate runs.xlsx --json
  pcinn validate runs.csv --strict   # exit 7 if any row is out of range")]
    Validate {
        /// CSV or XLSX file, one header row then data rows
        file: PathBuf,

        /// Print the full ingestion result as JSON
        #[arg(long)]
        json: bool,

        /// Fail when any row is outside the validation bounds
        #[arg(long)]
        strict: bool,
    },

    /// Predict every valid row of a file with one model or all of them
    #[command(after_help = "\
Examples:
  pcinn run runs.csv
  pcinn run runs.csv --model pcinn
  pcinn run runs.xlsx --compare --json")]
    Run {
        file: PathBuf,

        /// Model to run (default: model.default from settings)
        #[arg(long, short = 'm')]
        model: Option<ModelName>,

        /// Run every model
        #[arg(long, conflicts_with = "model")]
        compare: bool,

        #[arg(long)]
        json: bool,

        /// Give up after this many seconds
        #[arg(long, default_value_t = 300)]
        wait_secs: u64,
    },

    /// Point prediction and its time series for one set of conditions
    Predict {
        #[command(flatten)]
        form: FormArgs,

        #[arg(long, short = 'm')]
        model: Option<ModelName>,

        #[arg(long)]
        json: bool,

        #[arg(long, default_value_t = 60)]
        wait_secs: u64,
    },

    /// Final values of every model for one set of conditions
    Compare {
        #[command(flatten)]
        form: FormArgs,

        #[arg(long)]
        json: bool,

        #[arg(long, default_value_t = 60)]
        wait_secs: u64,
    },

    /// Read conditions from stdin, one line per edit, and predict as they change
    #[command(after_help = "\
Each line holds five numbers: m_molar s_molar i_molar temperature_c time_min
(spaces or commas). A line `model NAME` switches models. Repeated lines while
a request is pending are ignored; a changed line cancels the pending request.

Example:
  printf '3.3 6.7 0.025 60 120\\n3.3 6.7 0.025 70 120\\n' | pcinn watch")]
    Watch {
        #[arg(long, short = 'm')]
        model: Option<ModelName>,

        #[arg(long, default_value_t = 60)]
        wait_secs: u64,
    },

    /// List the models the service offers
    Models {
        #[arg(long)]
        json: bool,
    },

    /// Check that the service is up
    Health {
        #[arg(long)]
        json: bool,
    },
}

/// Reaction conditions in form units (°C and minutes).
#[derive(Args, Debug, Clone, Copy)]
struct FormArgs {
    /// Monomer concentration [mol/L]
    #[arg(long, default_value_t = FormValues::default().m_molar)]
    m_molar: f64,

    /// Solvent concentration [mol/L]
    #[arg(long, default_value_t = FormValues::default().s_molar)]
    s_molar: f64,

    /// Initiator concentration [mol/L]
    #[arg(long, default_value_t = FormValues::default().i_molar)]
    i_molar: f64,

    /// Temperature [°C]
    #[arg(long, default_value_t = FormValues::default().temperature_c, allow_negative_numbers = true)]
    temperature_c: f64,

    /// Reaction time [min]
    #[arg(long, default_value_t = FormValues::default().time_min)]
    time_min: f64,
}

impl FormArgs {
    fn values(&self) -> FormValues {
        FormValues {
            m_molar: self.m_molar,
            s_molar: self.s_molar,
            i_molar: self.i_molar,
            temperature_c: self.temperature_c,
            time_min: self.time_min,
        }
    }
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
            "\napi:     /api/v1",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
            "\napi:     /api/v1",
        )
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(cli.config.as_deref(), cli.api_url);

    let result = match cli.command {
        Commands::Validate { file, json, strict } => cmd_validate(&settings, file, json, strict),
        Commands::Run { file, model, compare, json, wait_secs } => {
            let mode = if compare {
                RunMode::CompareAll
            } else {
                RunMode::Single(model.unwrap_or(settings.default_model))
            };
            cmd_run(&settings, file, mode, json, wait_secs)
        }
        Commands::Predict { form, model, json, wait_secs } => {
            cmd_predict(&settings, form.values(), model.unwrap_or(settings.default_model), json, wait_secs)
        }
        Commands::Compare { form, json, wait_secs } => cmd_compare(&settings, form.values(), json, wait_secs),
        Commands::Watch { model, wait_secs } => {
            cmd_watch(&settings, model.unwrap_or(settings.default_model), wait_secs)
        }
        Commands::Models { json } => cmd_models(&settings, json),
        Commands::Health { json } => cmd_health(&settings, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Settings file, then PCINN_API_URL, then `--api-url`.
fn load_settings(config: Option<&Path>, api_url: Option<String>) -> Settings {
    let mut settings = match config {
        Some(path) => {
            let mut s = Settings::load_from(path);
            s.apply_env_override(std::env::var(API_URL_ENV).ok());
            s
        }
        None => Settings::load(),
    };
    settings.apply_env_override(api_url);
    log::debug!("using prediction service at {}", settings.api.api_root());
    settings
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn timeout(secs: u64) -> Self {
        Self::new(EXIT_SERVICE_TIMEOUT, format!("no response within {}s", secs))
            .with_hint("raise --wait-secs or check the service with `pcinn health`")
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<IngestError> for CliError {
    fn from(err: IngestError) -> Self {
        Self {
            code: ingest_exit_code(&err),
            message: err.to_string(),
            hint: err.hint().map(String::from),
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        let hint = match &err {
            ApiError::Network(_) => Some(format!(
                "is the service running? set {} or pass --api-url",
                API_URL_ENV
            )),
            _ => None,
        };
        Self {
            code: api_exit_code(&err),
            message: err.user_message(),
            hint,
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::new(EXIT_ERROR, format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// Reject form inputs outside the bounds the models were trained on.
fn check_input(input: &PredictionInput, settings: &Settings) -> Result<(), CliError> {
    let row = ParsedRow::from_values(
        1,
        [input.m_molar, input.s_molar, input.i_molar, input.temperature_k, input.time_s],
    );
    let errors = validate_row(&row, &settings.bounds);
    if errors.is_empty() {
        return Ok(());
    }

    let detail: Vec<String> = errors.iter().map(|e| format!("{}: {}", e.field, e.message)).collect();
    Err(CliError::new(EXIT_INGEST_OUT_OF_RANGE, format!("input out of range ({})", detail.join("; ")))
        .with_hint("temperature and time are given in °C and minutes; bounds apply after conversion"))
}

// ============================================================================
// validate
// ============================================================================

fn cmd_validate(settings: &Settings, file: PathBuf, json: bool, strict: bool) -> Result<(), CliError> {
    let opts = IngestOptions::from_settings(settings);
    let result = ingest_path(&file, &opts)?;

    if json {
        print_json(&result)?;
    } else {
        report::print_ingest(&file, &result);
    }

    if strict && !result.errors.is_empty() {
        return Err(CliError::new(
            EXIT_INGEST_OUT_OF_RANGE,
            format!("{} row(s) failed validation", result.rows.len() - result.valid.len()),
        ));
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(settings: &Settings, file: PathBuf, mode: RunMode, json: bool, wait_secs: u64) -> Result<(), CliError> {
    let opts = IngestOptions::from_settings(settings);
    let ingested = ingest_path(&file, &opts)?;

    if !json {
        report::print_ingest(&file, &ingested);
    }
    if ingested.valid.is_empty() {
        return Err(CliError::new(EXIT_INGEST_OUT_OF_RANGE, "no rows passed validation")
            .with_hint(format!("run `pcinn validate {}` to see row errors", file.display())));
    }
    let row_errors = ingested.errors.clone();
    let total_rows = ingested.rows.len();

    let mut session = UploadSession::new(ApiClient::new(&settings.api)?);
    session.load(ingested);
    session.run(mode);

    if !session.wait_idle(Duration::from_secs(wait_secs)) {
        session.reset();
        return Err(CliError::timeout(wait_secs));
    }
    if let Some(err) = session.take_error() {
        return Err(err.into());
    }
    let results = session
        .results()
        .ok_or_else(|| CliError::new(EXIT_ERROR, "batch finished without results"))?;

    if json {
        print_json(&report::RunReport::new(total_rows, &row_errors, &results))
    } else {
        report::print_batch(&results);
        Ok(())
    }
}

// ============================================================================
// predict / compare / watch
// ============================================================================

fn cmd_predict(
    settings: &Settings,
    form: FormValues,
    model: ModelName,
    json: bool,
    wait_secs: u64,
) -> Result<(), CliError> {
    let input = form.to_input();
    check_input(&input, settings)?;

    let surface = PredictSurface::new(ApiClient::new(&settings.api)?, model);
    surface.submit(input);
    if !surface.surface().wait_idle(Duration::from_secs(wait_secs)) {
        return Err(CliError::timeout(wait_secs));
    }
    if let Some(err) = surface.surface().take_error() {
        return Err(err.into());
    }
    let outcome = surface
        .surface()
        .take_result()
        .ok_or_else(|| CliError::new(EXIT_ERROR, "prediction finished without a result"))?;

    if json {
        print_json(&outcome)
    } else {
        report::print_prediction(model, &outcome);
        Ok(())
    }
}

fn cmd_compare(settings: &Settings, form: FormValues, json: bool, wait_secs: u64) -> Result<(), CliError> {
    let input = form.to_input();
    check_input(&input, settings)?;

    let surface = CompareSurface::new(ApiClient::new(&settings.api)?);
    surface.submit(TimeSeriesInput::for_point(&input));
    if !surface.surface().wait_idle(Duration::from_secs(wait_secs)) {
        return Err(CliError::timeout(wait_secs));
    }
    if let Some(err) = surface.surface().take_error() {
        return Err(err.into());
    }
    let result = surface
        .surface()
        .take_result()
        .ok_or_else(|| CliError::new(EXIT_ERROR, "comparison finished without a result"))?;

    let summary = pcinn_core::CompareSummary::from_result(&result);
    if json {
        print_json(&summary)
    } else {
        report::print_compare(&summary);
        Ok(())
    }
}

/// Parse one watch line: five numbers in form units.
fn parse_watch_line(line: &str) -> Result<FormValues, String> {
    let numbers: Vec<f64> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| format!("not a number: '{}'", s)))
        .collect::<Result<_, _>>()?;

    match numbers[..] {
        [m_molar, s_molar, i_molar, temperature_c, time_min] => Ok(FormValues {
            m_molar,
            s_molar,
            i_molar,
            temperature_c,
            time_min,
        }),
        _ => Err(format!("expected 5 values, got {}", numbers.len())),
    }
}

fn cmd_watch(settings: &Settings, model: ModelName, wait_secs: u64) -> Result<(), CliError> {
    let mut surface = PredictSurface::new(ApiClient::new(&settings.api)?, model);

    let drain = |surface: &PredictSurface| {
        if let Some(err) = surface.surface().take_error() {
            eprintln!("error: {}", err.user_message());
        }
        if let Some(outcome) = surface.surface().take_result() {
            report::print_prediction(surface.model(), &outcome);
        }
    };

    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = line.map_err(|e| CliError::args(format!("failed to read stdin: {}", e)))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix("model ") {
            match name.parse::<ModelName>() {
                Ok(m) => surface.set_model(m),
                Err(e) => eprintln!("line {}: {}", n + 1, e),
            }
            continue;
        }

        let input = match parse_watch_line(line) {
            Ok(form) => form.to_input(),
            Err(e) => {
                eprintln!("line {}: {}", n + 1, e);
                continue;
            }
        };
        if let Err(e) = check_input(&input, settings) {
            eprintln!("line {}: {}", n + 1, e.message);
            continue;
        }

        if surface.submit(input) == Submission::Duplicate {
            log::debug!("line {}: same conditions already pending", n + 1);
        }
        drain(&surface);
    }

    if !surface.surface().wait_idle(Duration::from_secs(wait_secs)) {
        return Err(CliError::timeout(wait_secs));
    }
    drain(&surface);
    Ok(())
}

// ============================================================================
// models / health
// ============================================================================

fn cmd_models(settings: &Settings, json: bool) -> Result<(), CliError> {
    let models = ApiClient::new(&settings.api)?.models()?;
    if json {
        print_json(&models)
    } else {
        report::print_models(&models);
        Ok(())
    }
}

fn cmd_health(settings: &Settings, json: bool) -> Result<(), CliError> {
    let health = ApiClient::new(&settings.api)?.health()?;
    if json {
        print_json(&health)
    } else {
        println!("{} ({} models loaded)", health.status, health.models_loaded);
        if !health.default_model.is_empty() {
            println!("default model: {}", health.default_model);
        }
        Ok(())
    }
}
