//! HEP schemas CLI
//!
//! Command-line interface for building literature records from submissions
//! and validating records against the schema store.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hep_schemas::{
    load_schema_file, validate, SchemaStore, Submission, ValidateError, DEFAULT_SCHEMAS_PATH,
    SCHEMAS_PATH_ENV,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hep-schemas")]
#[command(about = "Build and validate HEP literature records")]
#[command(version)]
struct Cli {
    /// Directory holding the schema documents
    #[arg(long, global = true, env = SCHEMAS_PATH_ENV, default_value = DEFAULT_SCHEMAS_PATH)]
    schemas_dir: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a literature record from a submission form
    Build {
        /// Submission file (JSON)
        submission: PathBuf,

        /// Default source credited for the submitted data
        #[arg(long, default_value = "submitter")]
        source: String,

        /// Validate the built record against the hep schema
        #[arg(long)]
        validate: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a record against a schema
    Validate {
        /// Record file to validate
        record: PathBuf,

        /// Schema name (default: the record's "$schema" key)
        #[arg(long)]
        schema: Option<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = SchemaStore::new(cli.schemas_dir);

    let result = match cli.command {
        Commands::Build {
            submission,
            source,
            validate,
            output,
            pretty,
        } => run_build(&store, BuildArgs {
            submission,
            source,
            validate,
            output,
            pretty,
        }),

        Commands::Validate {
            record,
            schema,
            json,
        } => run_validate(&store, record, schema.as_deref(), json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Log to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hep_schemas={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct BuildArgs {
    submission: PathBuf,
    source: String,
    validate: bool,
    output: Option<PathBuf>,
    pretty: bool,
}

fn run_build(store: &SchemaStore, args: BuildArgs) -> Result<(), u8> {
    let BuildArgs {
        submission: submission_path,
        source,
        validate,
        output,
        pretty,
    } = args;

    let raw = load_schema_file(&submission_path).map_err(|e| {
        eprintln!("Error loading submission: {}", e);
        e.exit_code() as u8
    })?;
    let submission = Submission::from_value(raw).map_err(|e| {
        eprintln!("Error: invalid submission: {}", e);
        2u8
    })?;

    let builder = submission.build(&source);
    tracing::info!(
        fields = builder.record().len(),
        citeable = builder.is_citeable(),
        "record built"
    );

    if validate {
        builder.validate_object(store).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    }

    let record = builder.into_record();
    let json_output = if pretty {
        serde_json::to_string_pretty(&record)
    } else {
        serde_json::to_string(&record)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

fn run_validate(
    store: &SchemaStore,
    record_path: PathBuf,
    schema: Option<&str>,
    json_output: bool,
) -> Result<(), u8> {
    let record = load_schema_file(&record_path).map_err(|e| {
        report_error(json_output, &format!("loading record: {}", e));
        e.exit_code() as u8
    })?;

    match validate(store, &record, schema) {
        Ok(()) => {
            if json_output {
                println!("{}", json!({ "valid": true }));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid(violation)) => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "errors": [violation]
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                eprintln!("  {}", violation);
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        let output: Value = json!({ "valid": false, "error": msg });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}
