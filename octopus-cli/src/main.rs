//! Octopus CLI

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use octopus_filter::{list_functions, FilterExpression, Subject, ToolType};
use octopus_scripting::{RequestContext, ResponseContext, ScriptsConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "octopus")]
#[command(about = "Octopus filter expressions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse filters and report errors
    Check {
        /// Filter expressions
        #[arg(required = true)]
        expressions: Vec<String>,
    },

    /// Print the filter function reference
    Docs {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Evaluate a filter against a message described on the command line
    Eval {
        /// Filter expression
        expression: String,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Absolute request URL
        #[arg(short, long)]
        url: String,

        /// Request header as `Name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        body: Option<String>,

        /// Tool that produced the request
        #[arg(long, default_value = "proxy")]
        tool: ToolType,

        /// Mark the request as in scope
        #[arg(long)]
        in_scope: bool,

        /// Evaluate against a response with this status code
        #[arg(short, long)]
        status: Option<u16>,

        /// Response header as `Name: value` (repeatable)
        #[arg(long = "response-header")]
        response_headers: Vec<String>,

        /// Response body
        #[arg(long)]
        response_body: Option<String>,
    },

    /// Validate an addon configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "addons.yaml")]
        config: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },

    /// Show version information
    Version,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    match cli.command {
        Commands::Check { expressions } => {
            let mut failed = 0;
            for source in &expressions {
                match FilterExpression::parse(source) {
                    Ok(_) => println!("ok    {source}"),
                    Err(e) => {
                        failed += 1;
                        println!("error {source}\n      {e}");
                    }
                }
            }
            Ok(if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Docs { json } => {
            let functions = list_functions();
            if json {
                println!("{}", serde_json::to_string_pretty(&functions)?);
            } else {
                for doc in &functions {
                    println!("{}", doc.signature());
                    if let Some(short_doc) = doc.short_doc {
                        println!("    {short_doc}");
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Eval {
            expression,
            method,
            url,
            headers,
            body,
            tool,
            in_scope,
            status,
            response_headers,
            response_body,
        } => {
            let filter = FilterExpression::parse(&expression)?;

            let mut request = RequestContext::new(method, &url)?
                .with_tool_source(tool)
                .with_in_scope(in_scope);
            for header in &headers {
                let (name, value) = split_header(header)?;
                request = request.with_header(name, value)?;
            }
            if let Some(body) = body {
                request = request.with_body(body);
            }

            let matched = match status {
                Some(status) => {
                    let mut response = ResponseContext::new(request, status);
                    for header in &response_headers {
                        let (name, value) = split_header(header)?;
                        response = response.with_header(name, value)?;
                    }
                    if let Some(body) = response_body {
                        response = response.with_body(body);
                    }
                    report(&filter, Subject::Response(&response))
                }
                None => {
                    if !response_headers.is_empty() || response_body.is_some() {
                        bail!("--response-header and --response-body need --status");
                    }
                    report(&filter, Subject::Request(&request))
                }
            };

            Ok(if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Validate { config } => {
            tracing::info!("Validating addon configuration: {}", config.display());

            let scripts = ScriptsConfig::load_from_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;

            match scripts.validate() {
                Ok(()) => {
                    println!("✓ Configuration is valid");
                    for addon in &scripts.addons {
                        println!(
                            "  {}: REQ_FILTER={} RES_FILTER={}",
                            addon.name,
                            addon.req_filter.as_deref().unwrap_or("-"),
                            addon.res_filter.as_deref().unwrap_or("-"),
                        );
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("✗ Configuration validation failed: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "octopus", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Version => {
            println!("Octopus filter expressions");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print the engine result and the fail-closed result, returning the latter
fn report(filter: &FilterExpression, subject: Subject<'_>) -> bool {
    match filter.evaluate(subject) {
        Ok(matched) => println!("evaluate: {matched}"),
        Err(e) => println!("evaluate: error: {e}"),
    }
    let matched = filter.matches(subject);
    println!("matches:  {matched}");
    matched
}

fn split_header(header: &str) -> Result<(&str, &str)> {
    let Some((name, value)) = header.split_once(':') else {
        bail!("invalid header `{header}`, expected `Name: value`");
    };
    Ok((name.trim(), value.trim()))
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(filter.into()))
        .init();

    Ok(())
}
