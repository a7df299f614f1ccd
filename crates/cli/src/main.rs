//! Kubernetes Service Topology CLI
//!
//! Infers which workloads talk to which services from the addresses
//! found in container specs and configuration stores, and reports
//! workload health alongside.

mod client;
mod commands;
mod config;
mod output;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{extract, graph, health};
use std::path::PathBuf;
use topology_lib::{InferenceEngine, UrlExtractor};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::client::ClusterOptions;

/// Kubernetes Service Topology CLI
#[derive(Parser)]
#[command(name = "kubetopo")]
#[command(author, version, about = "Kubernetes Service Topology: infer service dependencies", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses default if not specified)
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, env = "KUBETOPO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the configured format, then table)
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer and print the service topology graph
    Graph {
        /// Restrict to one namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Read a `kubectl get ... -o json` dump instead of the cluster
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Do not scan ConfigMaps and Secrets
        #[arg(long)]
        skip_config_stores: bool,

        /// List addresses that name no known service
        #[arg(long)]
        report_unresolved: bool,

        /// Output file path
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show workload health
    Health {
        /// Restrict to one namespace
        #[arg(long, short)]
        namespace: Option<String>,

        /// Read a `kubectl get ... -o json` dump instead of the cluster
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Include healthy workloads
        #[arg(long)]
        all: bool,
    },

    /// Extract in-cluster service addresses from text (stdin if none given)
    Extract {
        /// Text values to scan
        text: Vec<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let settings = config::Config::load(cli.config.as_deref())?;
    let format = cli.format.or(settings.default_format).unwrap_or_default();

    let cluster = |namespace: Option<String>| ClusterOptions {
        kubeconfig: cli.kubeconfig.clone(),
        context: cli.context.clone(),
        namespace: namespace.or_else(|| settings.default_namespace.clone()),
    };

    match cli.command {
        Commands::Graph {
            ref namespace,
            ref from_file,
            skip_config_stores,
            report_unresolved,
            ref output,
        } => {
            let mut policy = settings.policy.clone();
            if skip_config_stores {
                policy.scan_config_stores = false;
            }
            if report_unresolved {
                policy.report_unresolved = true;
            }

            let options = cluster(namespace.clone());
            let source =
                client::open_source(&options, from_file.clone(), policy.scan_config_stores).await?;
            graph::show_graph(
                source.as_ref(),
                policy,
                graph::GraphOptions {
                    output: output.clone(),
                    format,
                },
            )
            .await?;
        }
        Commands::Health {
            ref namespace,
            ref from_file,
            all,
        } => {
            let options = cluster(namespace.clone());
            let source = client::open_source(&options, from_file.clone(), false).await?;
            let engine = InferenceEngine::new(settings.policy.clone());
            health::show_health(source.as_ref(), &engine, all, format).await?;
        }
        Commands::Extract { ref text } => {
            let extractor = UrlExtractor::with_default_port(settings.policy.default_destination_port);
            extract::extract_references(&extractor, text.clone(), format)?;
        }
    }

    Ok(())
}
