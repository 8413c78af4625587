//! Command-line front end for the service client.
//!
//! Loads a TOML config, registers its endpoints and issues HTTP calls by
//! service name, printing results and stats as JSON.

use clap::{Parser, Subcommand};
use reqwest::Method;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use service_client::config::{load_config, ClientConfig};
use service_client::observability::{logging, metrics};
use service_client::transport::{HttpRequest, HttpTransport};
use service_client::{CallOptions, EndpointRegistry, ServiceClient};

#[derive(Parser)]
#[command(name = "service-client")]
#[command(about = "Call services by name with load balancing, retries and circuit breaking", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "service-client.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration file and exit
    Check,
    /// List registered endpoints
    Endpoints {
        /// Only this service
        #[arg(short, long)]
        service: Option<String>,
    },
    /// Call a service over HTTP and print per-call results and stats
    Call {
        /// Logical service name
        service: String,
        /// Request path, e.g. /health
        #[arg(default_value = "/")]
        path: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
        /// Number of calls to issue
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
        /// Overall deadline per call in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level)?;
    tracing::info!(config = ?cli.config, endpoints = config.endpoints.len(), "Configuration loaded");

    match cli.command {
        Commands::Check => {
            println!("{}: ok", cli.config.display());
        }
        Commands::Endpoints { service } => {
            let registry = EndpointRegistry::from_config(&config.endpoints);
            let services = match service {
                Some(name) => vec![name],
                None => registry.services(),
            };
            let listing: Vec<_> = services
                .iter()
                .flat_map(|name| registry.endpoints(name))
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Call {
            service,
            path,
            method,
            data,
            count,
            deadline_ms,
        } => {
            run_calls(&config, &service, path, &method, data, count, deadline_ms).await?;
        }
    }

    Ok(())
}

async fn run_calls(
    config: &ClientConfig,
    service: &str,
    path: String,
    method: &str,
    body: Option<String>,
    count: u32,
    deadline_ms: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let registry = Arc::new(EndpointRegistry::from_config(&config.endpoints));
    let client = ServiceClient::with_options(registry, HttpTransport::new(), config.client_options());

    let request = HttpRequest {
        method: Method::from_bytes(method.to_uppercase().as_bytes())?,
        path,
        body,
    };

    for _ in 0..count {
        let mut options = CallOptions::new().method(format!("{} {}", request.method, request.path));
        if let Some(ms) = deadline_ms {
            options = options.deadline_in(Duration::from_millis(ms));
        }

        match client.call(service, &request, &options).await {
            Ok(response) => println!("{}", serde_json::to_string(&response)?),
            Err(e) => eprintln!("Error ({:?}): {}", e.kind(), e),
        }
    }

    println!("{}", serde_json::to_string_pretty(&client.stats(service))?);
    Ok(())
}
