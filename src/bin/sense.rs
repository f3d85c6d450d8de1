//! Sense CLI - Command-line interface for Activity Sense
//!
//! Commands:
//! - predict: Predict one activity label for a batch of sensor records
//! - encode: Print the feature vectors the classifier would receive
//! - schema: Print the feature schema table
//! - doctor: Diagnose model and configuration health

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use activity_sense::config::{ModelConfig, ModelKind, PredictorConfig};
use activity_sense::features::FeatureVectorBuilder;
use activity_sense::schema::{self, PredictRequest, PredictResponse, SensorRecord, FEATURE_COUNT};
use activity_sense::{
    ActivityPredictor, ErrorKind, PredictError, LABEL_COUNT, PRODUCER_NAME, VERSION,
};

/// Sense - Smartphone activity recognition from sensor feature batches
#[derive(Parser)]
#[command(name = "sense")]
#[command(version = VERSION)]
#[command(about = "Predict activities from smartphone sensor batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the classifier comes from
#[derive(clap::Args)]
struct ModelArgs {
    /// TOML configuration file
    #[arg(short, long, env = "ACTIVITY_CONFIG")]
    config: Option<PathBuf>,

    /// Softmax weights JSON (overrides the config file)
    #[arg(short, long, env = "ACTIVITY_MODEL")]
    model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict one activity label for a batch of records
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "request")]
        input_format: InputFormat,

        #[command(flatten)]
        model: ModelArgs,

        /// Print per-record labels and vote counts
        #[arg(long)]
        detail: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the encoded feature vector of every record
    Encode {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "request")]
        input_format: InputFormat,

        /// Emit `{field: value}` objects instead of bare arrays
        #[arg(long)]
        named: bool,
    },

    /// Print the feature schema table
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose model and configuration health
    Doctor {
        #[command(flatten)]
        model: ModelArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// `{"data": [record, ...]}` request body
    Request,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SenseCliError> {
    match cli.command {
        Commands::Predict {
            input,
            input_format,
            model,
            detail,
            pretty,
        } => cmd_predict(&input, input_format, &model, detail, pretty),

        Commands::Encode {
            input,
            input_format,
            named,
        } => cmd_encode(&input, input_format, named),

        Commands::Schema { json } => cmd_schema(json),

        Commands::Doctor { model, json } => cmd_doctor(&model, json),
    }
}

fn cmd_predict(
    input: &Path,
    input_format: InputFormat,
    model: &ModelArgs,
    detail: bool,
    pretty: bool,
) -> Result<(), SenseCliError> {
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(SenseCliError::NoRecords);
    }

    let config = resolve_config(model)?;
    let predictor = ActivityPredictor::from_config(&config)?;

    let output = if detail {
        let summary = predictor.predict_detailed(&records)?;
        to_json(&summary, pretty)?
    } else {
        let prediction = predictor.predict(&records)?;
        to_json(&PredictResponse { prediction }, pretty)?
    };

    println!("{}", output);
    Ok(())
}

fn cmd_encode(input: &Path, input_format: InputFormat, named: bool) -> Result<(), SenseCliError> {
    let records = read_records(input, &input_format)?;
    if records.is_empty() {
        return Err(SenseCliError::NoRecords);
    }

    for record in &records {
        let vector = FeatureVectorBuilder::build(record);
        let line = if named {
            let object: serde_json::Map<String, serde_json::Value> = vector
                .named()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect();
            serde_json::to_string(&object)?
        } else {
            serde_json::to_string(&vector)?
        };
        println!("{}", line);
    }

    Ok(())
}

fn cmd_schema(json: bool) -> Result<(), SenseCliError> {
    let entries = schema::describe();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("Feature schema ({} columns)", FEATURE_COUNT);
    println!();
    println!("{:>5}  {:<16} {:<10} name", "index", "group", "encoding");
    for entry in &entries {
        println!(
            "{:>5}  {:<16} {:<10} {}",
            entry.index,
            entry.group.as_str(),
            entry.encoding,
            entry.name
        );
    }
    println!();
    println!("Unset fields encode as {}.", schema::MISSING_DEFAULT);
    println!("Flags encode true as 1 and false as 0.");
    println!("activityType sets at most one of the five indicator columns.");

    Ok(())
}

fn cmd_doctor(model: &ModelArgs, json: bool) -> Result<(), SenseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} feature columns, {} labels", FEATURE_COUNT, LABEL_COUNT),
    });

    match resolve_config(model) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: describe_model(&config.model),
            });

            match ActivityPredictor::from_config(&config) {
                Ok(predictor) => {
                    checks.push(DoctorCheck {
                        name: "model".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Model loaded ({} input features)",
                            predictor.input_width()
                        ),
                    });

                    let smoke = predictor.predict(&[SensorRecord::default()]);
                    checks.push(match smoke {
                        Ok(label) => DoctorCheck {
                            name: "inference".to_string(),
                            status: CheckStatus::Ok,
                            message: format!("Empty record classified as {}", label),
                        },
                        Err(e) => DoctorCheck {
                            name: "inference".to_string(),
                            status: CheckStatus::Error,
                            message: e.to_string(),
                        },
                    });
                }
                Err(e) => checks.push(DoctorCheck {
                    name: "model".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                }),
            }
        }
        Err(e) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a TTY, pass --input to read a file".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sense Doctor Report");
        println!("===================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(SenseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, SenseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_records(input: &Path, format: &InputFormat) -> Result<Vec<SensorRecord>, SenseCliError> {
    let data = read_input(input)?;

    match format {
        InputFormat::Request => {
            let request: PredictRequest = serde_json::from_str(&data)?;
            Ok(request.data)
        }
        InputFormat::Ndjson => data
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(number, line)| {
                serde_json::from_str(line).map_err(|e| {
                    SenseCliError::ParseError(format!("line {}: {}", number + 1, e))
                })
            })
            .collect(),
    }
}

/// Config file first, then `--model` on top of it
fn resolve_config(args: &ModelArgs) -> Result<PredictorConfig, SenseCliError> {
    if args.config.is_none() && args.model.is_none() {
        return Err(SenseCliError::NoModel);
    }

    let mut config = match &args.config {
        Some(path) => PredictorConfig::load(path)?,
        None => PredictorConfig::default(),
    };

    if let Some(model) = &args.model {
        config.model = ModelConfig {
            kind: ModelKind::Softmax,
            path: Some(model.clone()),
            ..config.model
        };
    }

    config.validate()?;
    Ok(config)
}

fn describe_model(model: &ModelConfig) -> String {
    match model.kind {
        ModelKind::Softmax => format!(
            "softmax model at {}",
            model
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ),
        ModelKind::Fixed => "fixed distribution model".to_string(),
    }
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String, SenseCliError> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

// Error types

#[derive(Debug)]
enum SenseCliError {
    Io(io::Error),
    Predict(PredictError),
    Json(serde_json::Error),
    NoRecords,
    NoModel,
    DoctorFailed,
    ParseError(String),
}

impl std::fmt::Display for SenseCliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SenseCliError::Io(e) => write!(f, "{}", e),
            SenseCliError::Predict(e) => write!(f, "{}", e),
            SenseCliError::Json(e) => write!(f, "{}", e),
            SenseCliError::NoRecords => f.write_str("no records found in input"),
            SenseCliError::NoModel => f.write_str("no classifier configured"),
            SenseCliError::DoctorFailed => f.write_str("one or more health checks failed"),
            SenseCliError::ParseError(msg) => f.write_str(msg),
        }
    }
}

impl From<io::Error> for SenseCliError {
    fn from(e: io::Error) -> Self {
        SenseCliError::Io(e)
    }
}

impl From<PredictError> for SenseCliError {
    fn from(e: PredictError) -> Self {
        SenseCliError::Predict(e)
    }
}

impl From<serde_json::Error> for SenseCliError {
    fn from(e: serde_json::Error) -> Self {
        SenseCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<SenseCliError> for CliError {
    fn from(e: SenseCliError) -> Self {
        match e {
            SenseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            SenseCliError::Predict(e) => {
                let hint = match e.kind() {
                    ErrorKind::Structural => "Ensure the batch contains at least one record",
                    ErrorKind::ShapeValidation => "Model width does not match the feature schema",
                    ErrorKind::InferenceFailure => "Classifier failed or returned malformed output",
                    ErrorKind::Input => "Check the request JSON",
                    ErrorKind::Setup => "Run 'sense doctor' for details",
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            SenseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            SenseCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure the input contains a non-empty data array".to_string()),
            },
            SenseCliError::NoModel => CliError {
                code: "NO_MODEL".to_string(),
                message: "No classifier configured".to_string(),
                hint: Some("Pass --model, --config, or set ACTIVITY_MODEL".to_string()),
            },
            SenseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            SenseCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be one JSON sensor record".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
