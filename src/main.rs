//! Binary entry point for vector-observer.
//!
//! This binary runs the MCP server and inspects its configuration.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use vector_observer::mcp::{McpServer, Transport};
use vector_observer::{ObserverConfig, ServiceContainer, observability};

/// Vector Observer - an observation store for multi-agent systems.
#[derive(Parser)]
#[command(name = "vector-observer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Start MCP server.
    Serve {
        /// Transport type: stdio or http.
        #[arg(short, long, default_value = "stdio", value_parser = ["stdio", "http"])]
        transport: String,

        /// Port for HTTP transport.
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// List the tools the server exposes.
    Tools,

    /// Show the effective configuration.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ObserverConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_logging(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: ObserverConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Serve { transport, port } => cmd_serve(config, &transport, port),
        Commands::Tools => cmd_tools(config),
        Commands::Config => cmd_config(&config),
    }
}

/// Serve command.
fn cmd_serve(
    config: ObserverConfig,
    transport: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let transport = match transport {
        "http" => Transport::Http,
        _ => Transport::Stdio,
    };

    observability::install_prometheus(&config.metrics, true)?;

    let services = Arc::new(ServiceContainer::new(config));
    tracing::info!(
        documents = services.documentation().len(),
        demo_documents = services.documentation().is_demo(),
        "Services ready"
    );

    McpServer::new(services)
        .with_transport(transport)
        .with_port(port)
        .start()?;

    Ok(())
}

/// Tools command.
fn cmd_tools(config: ObserverConfig) -> Result<(), Box<dyn std::error::Error>> {
    let server = McpServer::new(Arc::new(ServiceContainer::new(config)));
    for tool in server.tools().list_tools() {
        println!("{:<32} {}", tool.name, tool.description);
    }
    Ok(())
}

/// Config command.
fn cmd_config(config: &ObserverConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
