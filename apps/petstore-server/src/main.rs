use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use api_docs::{ApiDocs, ApiDocsConfig};
use apidoc::{Contact, Info};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs};
use tokio_util::sync::CancellationToken;

mod pets;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Petstore demo server with a generated OpenAPI document
#[derive(Parser)]
#[command(name = "petstore-server")]
#[command(about = "Petstore demo server with a generated OpenAPI document")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration and the generated document
    Check,
    /// Print the OpenAPI document and exit
    DumpOpenapi {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let command = cli.command.unwrap_or(Commands::Run);

    // Keep stdout clean for the document dump.
    if !matches!(command, Commands::DumpOpenapi { .. }) {
        let logging_config = config.logging.clone().unwrap_or_default();
        runtime::init_logging_from_config(&logging_config, config.home_dir());
        tracing::info!("Petstore server starting");
    }

    let api = build_api(&config, &args)?;

    match command {
        Commands::Run => run_server(api).await,
        Commands::Check => check(&config, &api),
        Commands::DumpOpenapi { pretty } => dump_openapi(&api, pretty),
    }
}

fn build_api(config: &AppConfig, args: &CliArgs) -> Result<Arc<ApiDocs>> {
    let mut docs_config = ApiDocsConfig::from_app_config(config)?;
    if let Some(port) = args.port {
        let mut addr: SocketAddr = docs_config
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", docs_config.bind_addr))?;
        addr.set_port(port);
        docs_config.bind_addr = addr.to_string();
    }

    let info = Info::new("Petstore", env!("CARGO_PKG_VERSION"))
        .description("A sample pets API whose document is generated from its routes")
        .contact(Contact::email("apiteam@example.com"))
        .license("Apache 2.0", Some("https://www.apache.org/licenses/LICENSE-2.0".into()));

    let api = ApiDocs::new(docs_config, info);
    pets::install(
        &api,
        Arc::new(pets::PetStore::with_samples()),
        pets::DemoSecrets::default(),
    )?;
    Ok(Arc::new(api))
}

async fn run_server(api: Arc<ApiDocs>) -> Result<()> {
    let cancel = CancellationToken::new();

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown signal received");
            cancel.cancel();
        }
    });

    api.serve(cancel).await
}

fn check(config: &AppConfig, api: &ApiDocs) -> Result<()> {
    tracing::info!("Checking configuration...");
    let doc = api
        .openapi_json()
        .context("OpenAPI document could not be built")?;

    println!("Configuration check passed");
    println!("OpenAPI document: {} bytes", doc.json.len());
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn dump_openapi(api: &ApiDocs, pretty: bool) -> Result<()> {
    let doc = api.openapi_json()?;
    if pretty {
        let value: serde_json::Value = serde_json::from_slice(&doc.json)?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", String::from_utf8_lossy(&doc.json));
    }
    Ok(())
}
