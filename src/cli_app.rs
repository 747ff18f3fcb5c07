//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::{Colorize, control};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use fleetdesk::core::config::Config;
use fleetdesk::core::paths::resolve_data_path;
use fleetdesk::domain::{Customer, Vehicle, load_records};
use fleetdesk::list::{FilterState, ListProcessor, ListView, Record, SortState};
use fleetdesk::logger::activity::{ActivityEvent, ActivityLoggerHandle, spawn_logger};
use fleetdesk::wizard::{
    CustomerDraft, CustomerValidator, FormDraft, ValidationErrors, Validator, VehicleDraft,
    review, vehicle_validator,
};

/// List and check fleet records from the command line.
#[derive(Debug, Parser)]
#[command(
    name = "fleetctl",
    author,
    version,
    about = "Fleet administration toolkit",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Filter, sort and page a record collection.
    List(ListArgs),
    /// Validate a draft and print its submission payload.
    Check(CheckArgs),
    /// View configuration state.
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecordKind {
    Vehicles,
    Customers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormKind {
    Customer,
    Vehicle,
}

#[derive(Debug, Clone, Args)]
struct ListArgs {
    /// Record collection to list.
    #[arg(value_enum)]
    kind: RecordKind,
    /// JSON file holding an array of records.
    #[arg(long, value_name = "FILE")]
    data: PathBuf,
    /// Free-text search across the searchable columns.
    #[arg(long, value_name = "TEXT")]
    search: Option<String>,
    /// Column filter, repeatable.
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,
    /// Sort column, optionally suffixed with `:asc` or `:desc`.
    #[arg(long, value_name = "KEY[:DIR]")]
    sort: Option<String>,
    /// Zero-based page index.
    #[arg(long, default_value_t = 0, value_name = "N")]
    page: usize,
    /// Rows per page (defaults to the configured page size).
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct CheckArgs {
    /// Wizard whose rules apply.
    #[arg(value_enum)]
    form: FormKind,
    /// JSON file holding the draft.
    #[arg(long, value_name = "FILE")]
    draft: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the configuration file.
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("{0}")]
    User(String),
    /// A draft failed validation; details were already printed.
    #[error("draft has {0} invalid field(s)")]
    Invalid(usize),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) | Self::Invalid(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<fleetdesk::core::errors::FleetError> for CliError {
    fn from(err: fleetdesk::core::errors::FleetError) -> Self {
        use fleetdesk::core::errors::FleetError;
        match err {
            FleetError::UnknownField { .. }
            | FleetError::UnknownRecordField { .. }
            | FleetError::InvalidExpression { .. }
            | FleetError::DiscriminantField { .. }
            | FleetError::MissingConfig { .. }
            | FleetError::InvalidConfig { .. }
            | FleetError::ConfigParse { .. } => Self::User(err.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::List(args) => run_list(cli, args),
        Command::Check(args) => run_check(cli, args),
        Command::Config(args) => run_config(cli, args),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn run_list(cli: &Cli, args: &ListArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let logger = start_logger(&config)?;

    let result = match args.kind {
        RecordKind::Vehicles => {
            list_records::<Vehicle>(cli, args, &config, logger.as_ref(), vehicle_row)
        }
        RecordKind::Customers => {
            list_records::<Customer>(cli, args, &config, logger.as_ref(), customer_row)
        }
    };

    if let Some((handle, join)) = logger {
        handle.shutdown()?;
        let _ = join.join();
    }
    result
}

fn list_records<R>(
    cli: &Cli,
    args: &ListArgs,
    config: &Config,
    logger: Option<&LoggerParts>,
    render: fn(&R) -> String,
) -> Result<(), CliError>
where
    R: Record + Serialize + DeserializeOwned,
{
    let records: Vec<R> = load_records(&resolve_data_path(&args.data))?;
    let mut processor = ListProcessor::new(records, &config.list);
    if let Some((handle, _)) = logger {
        processor = processor.with_logger(handle.clone());
    }

    processor.set_filter(build_filter(args)?)?;
    if let Some(raw) = &args.sort {
        processor.set_sort(Some(raw.parse::<SortState>()?))?;
    }
    if let Some(size) = args.page_size {
        if size == 0 {
            return Err(CliError::User("--page-size must be at least 1".to_string()));
        }
        processor.set_page_size(size);
    }
    processor.set_page(args.page);

    let view = processor.view();
    match output_mode(cli) {
        OutputMode::Human => print_view_human(&view, processor.filter_state(), render),
        OutputMode::Json => {
            let payload = json!({
                "command": "list",
                "record": R::KIND,
                "filter": processor.filter_state().to_string(),
                "sort": processor.sort_state().map(ToString::to_string),
                "page_index": view.page.page_index(),
                "page_size": view.page.page_size(),
                "page_count": view.page_count,
                "total": view.filtered_len,
                "rows": serde_json::to_value(&view.rows)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn build_filter(args: &ListArgs) -> Result<FilterState, CliError> {
    let mut state = args
        .search
        .as_ref()
        .map_or_else(FilterState::new, FilterState::search);
    for raw in &args.filters {
        let (key, value) = FilterState::parse_pair(raw)?;
        state = state.with(key, value);
    }
    Ok(state)
}

fn print_view_human<R>(view: &ListView<'_, R>, filter: &FilterState, render: fn(&R) -> String) {
    if view.is_empty() {
        println!("{}", "No matching records.".dimmed());
    }
    for row in &view.rows {
        println!("{}", render(row));
    }
    println!();
    let filter_label = if filter.is_unconstrained() {
        String::new()
    } else {
        format!("  filter: {filter}")
    };
    println!(
        "{} {} of {}  ({} matching){}",
        "Page".bold(),
        view.page.page_index() + 1,
        view.page_count.max(1),
        view.total().label(),
        filter_label.dimmed()
    );
}

fn vehicle_row(vehicle: &Vehicle) -> String {
    let year = vehicle.year.map_or_else(|| "----".to_string(), |y| y.to_string());
    format!(
        "{:>5}  {:<10} {:<12} {}  {:<10} {}",
        vehicle.id,
        vehicle.brand,
        vehicle.model,
        year,
        vehicle.plate.bold(),
        vehicle.status.as_str().cyan()
    )
}

fn customer_row(customer: &Customer) -> String {
    let status = if customer.active {
        "active".green()
    } else {
        "inactive".red()
    };
    format!(
        "{:>5}  {:<10} {:<28} {:<28} {}",
        customer.id,
        customer.kind.as_str(),
        customer.display_name.bold(),
        customer.email.as_deref().unwrap_or("-"),
        status
    )
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<(), CliError> {
    match args.form {
        FormKind::Customer => {
            let validator = CustomerValidator::new()?;
            check_draft::<CustomerDraft, _>(cli, args, &validator)
        }
        FormKind::Vehicle => {
            let validator = vehicle_validator()?;
            check_draft::<VehicleDraft, _>(cli, args, &validator)
        }
    }
}

fn check_draft<D, V>(cli: &Cli, args: &CheckArgs, validator: &V) -> Result<(), CliError>
where
    D: FormDraft + DeserializeOwned,
    V: Validator<D>,
{
    let path = resolve_data_path(&args.draft);
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| CliError::User(format!("read draft {}: {e}", path.display())))?;
    let draft: D = serde_json::from_str(&raw)
        .map_err(|e| CliError::User(format!("parse draft {}: {e}", path.display())))?;

    match review(validator, &draft) {
        Ok(dto) => {
            let payload = serde_json::to_value(&dto)?;
            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{} {} draft is valid.", "OK".green().bold(), D::FORM);
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "check",
                    "form": D::FORM,
                    "valid": true,
                    "dto": payload,
                }))?,
            }
            Ok(())
        }
        Err(errors) => {
            match output_mode(cli) {
                OutputMode::Human => print_errors_human(D::FORM, &errors),
                OutputMode::Json => write_json_line(&json!({
                    "command": "check",
                    "form": D::FORM,
                    "valid": false,
                    "errors": serde_json::to_value(&errors)?,
                }))?,
            }
            Err(CliError::Invalid(errors.len()))
        }
    }
}

fn print_errors_human(form: &str, errors: &ValidationErrors) {
    eprintln!("{} {form} draft is invalid:", "FAIL".red().bold());
    for (field, message) in errors.iter() {
        eprintln!("  {:<16} {message}", field.yellow());
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    }))?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    }))?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("{}", "Configuration is valid.".green());
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        write_json_line(&json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        }))?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("{} {e}", "Configuration is INVALID:".red());
                    }
                    OutputMode::Json => {
                        write_json_line(&json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                        }))?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

// ---------------------------------------------------------------------------
// shared helpers
// ---------------------------------------------------------------------------

type LoggerParts = (ActivityLoggerHandle, std::thread::JoinHandle<()>);

fn start_logger(config: &Config) -> Result<Option<LoggerParts>, CliError> {
    if !config.logging.enabled {
        return Ok(None);
    }
    let (handle, join) = spawn_logger((&config.logging).into())?;
    handle.send(ActivityEvent::ConfigLoaded {
        config_hash: config.stable_hash()?,
    });
    Ok(Some((handle, join)))
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("FLEET_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
