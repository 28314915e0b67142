//! API Validator CLI
//!
//! Command-line interface for registering endpoint schemas and validating
//! requests against them.

use std::process::ExitCode;
use std::sync::Arc;

use api_validator::{
    load_registrations, load_request, Outcome, SchemaRegistry, SectionKind, UnknownTypePolicy,
    ValidateOptions, ValidationEngine, ValidationReport, ValidatorTable,
};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "api-validator")]
#[command(about = "Register API endpoint schemas and validate requests against them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a request against a batch of schemas
    Validate {
        /// Validate-request payload: file path or URL (http:// or https://)
        request: String,

        /// Registration payload: file path or URL (http:// or https://)
        #[arg(long)]
        schemas: String,

        /// Output the report as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Log a warning for each type tag that has no validator
        #[arg(long)]
        warn_unknown_types: bool,
    },

    /// Check that a registration payload decodes and registers cleanly
    Check {
        /// Registration payload: file path or URL (http:// or https://)
        schemas: String,
    },

    /// Serve the registration and validation endpoints over HTTP
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on
        #[arg(long, env = "API_VALIDATOR_ADDR", default_value = "0.0.0.0:5000")]
        addr: std::net::SocketAddr,

        /// Log a warning for each type tag that has no validator
        #[arg(long)]
        warn_unknown_types: bool,
    },
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            request,
            schemas,
            json,
            warn_unknown_types,
        } => run_validate(&request, &schemas, json, options(warn_unknown_types)),

        Commands::Check { schemas } => run_check(&schemas),

        #[cfg(feature = "server")]
        Commands::Serve {
            addr,
            warn_unknown_types,
        } => run_serve(addr, options(warn_unknown_types)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn options(warn_unknown_types: bool) -> ValidateOptions {
    let policy = if warn_unknown_types {
        UnknownTypePolicy::Warn
    } else {
        UnknownTypePolicy::Ignore
    };
    ValidateOptions::new().unknown_types(policy)
}

/// Load a batch into a fresh in-memory registry.
fn load_registry(source: &str) -> Result<(Arc<SchemaRegistry>, usize), u8> {
    let definitions = load_registrations(source).map_err(|e| {
        eprintln!("Error: loading schemas: {}", e);
        e.exit_code() as u8
    })?;

    let registry = Arc::new(SchemaRegistry::in_memory());
    let count = registry.register_all(definitions).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    Ok((registry, count))
}

fn run_validate(
    request_source: &str,
    schemas: &str,
    json_output: bool,
    options: ValidateOptions,
) -> Result<(), u8> {
    let (registry, _) = load_registry(schemas)?;

    let request = load_request(request_source).map_err(|e| {
        eprintln!("Error: loading request: {}", e);
        e.exit_code() as u8
    })?;

    let engine = ValidationEngine::with_table(registry, ValidatorTable::builtin(), options);
    let outcome = engine.validate(&request);

    if json_output {
        let output = serde_json::to_string(&outcome).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        match &outcome {
            Outcome::NotConfigured => println!(
                "no schema registered for {} {}",
                request.path, request.method
            ),
            Outcome::Report(report) => print_report(report),
        }
    }

    if outcome.is_valid() {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_report(report: &ValidationReport) {
    if report.is_valid() {
        println!("Valid");
        return;
    }

    println!(
        "{} {}: {} error(s)",
        report.method(),
        report.path(),
        report.error_count()
    );
    for kind in SectionKind::ALL {
        for error in report.section(kind) {
            println!("  [{}] {}", kind, error);
        }
    }
}

fn run_check(schemas: &str) -> Result<(), u8> {
    let (_, count) = load_registry(schemas)?;
    println!("{} schema(s) registered", count);
    Ok(())
}

#[cfg(feature = "server")]
fn run_serve(addr: std::net::SocketAddr, options: ValidateOptions) -> Result<(), u8> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| {
        eprintln!("Error: starting runtime: {}", e);
        3u8
    })?;

    let state = api_validator::server::AppState::in_memory(options);
    runtime
        .block_on(api_validator::server::serve(addr, state))
        .map_err(|e| {
            eprintln!("Error: {}", e);
            3u8
        })
}
