//! Ringside probe entry point
//!
//! Runs integration probes against the catalog API and the webhook server,
//! or serves the webhook endpoints locally.

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ringside_config::{
    ConfigResolver, ConnectionConfig, ProviderCoverage, SchemaDescriptor, SchemaObjectKind,
};
use ringside_probe::client::{CatalogClient, MediaStreamClient, WebhookClient};
use ringside_probe::contracts::*;
use ringside_probe::engine::{CatalogProbe, HealthProbe, Probe, ProbeEngine, SmsProbe, StreamProbe};
use ringside_probe::handler::{create_router, AppState};
use ringside_probe::output::{render_report, render_structured, render_summary, OutputFormat};
use ringside_probe::plan::{ProbePlan, DEFAULT_CATALOG_URL};
use ringside_probe::telemetry::{init_tracing, LogFormat};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ringside-probe")]
#[command(about = "Ringside integration probes - catalog API, SMS webhook and media stream checks")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    format: OutputFormat,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Optional .env file consulted after the environment
        #[arg(long)]
        env_file: Option<PathBuf>,
    },

    /// Check webhook server liveness
    Health {
        /// Webhook server base URL
        #[arg(short, long, default_value = "http://localhost:8080", env = "RINGSIDE_WEBHOOK_URL")]
        url: String,

        /// Request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,
    },

    /// Post a simulated SMS webhook and verify the acknowledgement
    Sms {
        /// Webhook server base URL
        #[arg(short, long, default_value = "http://localhost:8080", env = "RINGSIDE_WEBHOOK_URL")]
        url: String,

        /// Sender number
        #[arg(long)]
        from: String,

        /// Recipient number
        #[arg(long)]
        to: Option<String>,

        /// Message text
        #[arg(long, default_value = "")]
        body: String,

        /// Provider field naming
        #[arg(long, value_enum, default_value_t = DialectArg::Twilio)]
        dialect: DialectArg,

        /// Request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,
    },

    /// Open a media stream and send start, media frames and stop
    Stream {
        /// Webhook server base URL (http(s) is mapped to ws(s))
        #[arg(short, long, default_value = "ws://localhost:8080", env = "RINGSIDE_WEBHOOK_URL")]
        url: String,

        /// Call identifier; generated when omitted
        #[arg(long)]
        call_sid: Option<String>,

        /// Number of media frames
        #[arg(long, default_value = "3")]
        frames: u32,

        /// Audio bytes per media frame
        #[arg(long, default_value_t = DEFAULT_CHUNK_BYTES)]
        chunk_bytes: usize,

        /// Delay between frames in milliseconds
        #[arg(long, default_value = "20")]
        pacing_ms: u64,

        /// Connect timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,
    },

    /// Create a catalog category, then an item inside it
    Catalog {
        /// Catalog API base URL
        #[arg(short, long, default_value = DEFAULT_CATALOG_URL, env = "CATALOG_BASE_URL")]
        url: String,

        /// Access token
        #[arg(long, env = "CATALOG_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Category name
        #[arg(long, default_value = "Ringside Probe Services")]
        category: String,

        /// Item name
        #[arg(long, default_value = "Ringside Probe Item")]
        item: String,

        /// Item description
        #[arg(long, default_value = "Created by ringside-probe")]
        description: String,

        /// Request timeout in milliseconds
        #[arg(long, default_value = "10000")]
        timeout: u64,
    },

    /// Run every probe listed in a plan file (JSON/YAML)
    Run {
        /// Path to the plan file
        #[arg(short, long)]
        plan: PathBuf,

        /// Stop after the first failed probe
        #[arg(long)]
        fail_fast: bool,
    },

    /// Show resolved data store connection settings
    Config {
        /// Optional .env file consulted after the environment
        #[arg(long)]
        env_file: Option<PathBuf>,

        /// Variable prefix (PREFIX_SUPABASE_URL)
        #[arg(long)]
        env_prefix: Option<String>,
    },

    /// Describe data store tables and functions
    Schema {
        /// Describe a single table or function
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Copy, Clone, ValueEnum)]
enum DialectArg {
    /// From / To / Body
    Twilio,
    /// from / originalsenderid / message
    Relay,
}

impl From<DialectArg> for SmsDialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Twilio => SmsDialect::Twilio,
            DialectArg::Relay => SmsDialect::Relay,
        }
    }
}

#[derive(Serialize)]
struct ConfigRow {
    key: String,
    variable: String,
    value: String,
    source: String,
}

#[derive(Serialize)]
struct ConfigView {
    settings: Vec<ConfigRow>,
    sources: Vec<ProviderCoverage>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = match cli.command {
        Commands::Serve { .. } => LogFormat::Json,
        _ => LogFormat::Compact,
    };
    init_tracing(log_format, &cli.log_level);

    let format = cli.format;

    match cli.command {
        Commands::Serve {
            port,
            host,
            env_file,
        } => {
            let connection = match env_file {
                Some(path) => {
                    ConnectionConfig::resolve(&ConfigResolver::builder().dotenv(path)?.build()).await
                }
                None => ConnectionConfig::from_env().await,
            };
            let endpoint = connection.endpoint.clone();

            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let state = Arc::new(AppState::new(connection)?);
            let router = create_router(state);

            tracing::info!(endpoint = %endpoint, "Starting Ringside webhook server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        Commands::Health { url, timeout } => {
            let client = WebhookClient::new(url).with_timeout(Duration::from_millis(timeout));
            run_single(HealthProbe::new(client), format).await?;
        }

        Commands::Sms {
            url,
            from,
            to,
            body,
            dialect,
            timeout,
        } => {
            let client = WebhookClient::new(url).with_timeout(Duration::from_millis(timeout));
            let message = SmsMessage {
                from: Some(from),
                to,
                body,
            };
            run_single(SmsProbe::new(client, message, dialect.into()), format).await?;
        }

        Commands::Stream {
            url,
            call_sid,
            frames,
            chunk_bytes,
            pacing_ms,
            timeout,
        } => {
            let call_sid = call_sid.unwrap_or_else(|| format!("CA{}", uuid::Uuid::new_v4().simple()));
            let client = MediaStreamClient::new(url).with_timeout(Duration::from_millis(timeout));
            let probe = StreamProbe::new(client, call_sid)
                .with_frames(frames)
                .with_chunk_bytes(chunk_bytes)
                .with_pacing(Duration::from_millis(pacing_ms));
            run_single(probe, format).await?;
        }

        Commands::Catalog {
            url,
            token,
            category,
            item,
            description,
            timeout,
        } => {
            let client = CatalogClient::new(url, token).with_timeout(Duration::from_millis(timeout));
            run_single(CatalogProbe::new(client, category, item, description), format).await?;
        }

        Commands::Run { plan, fail_fast } => {
            let plan = ProbePlan::from_file(&plan)?;
            let engine = plan.build_engine()?.with_fail_fast(plan.fail_fast || fail_fast);
            run_engine(engine, format).await?;
        }

        Commands::Config {
            env_file,
            env_prefix,
        } => {
            let mut builder = ConfigResolver::builder();
            if let Some(prefix) = env_prefix {
                builder = builder.env_prefix(prefix);
            }
            if let Some(path) = env_file {
                builder = builder.dotenv(path)?;
            }
            let resolver = builder.build();

            let rows: Vec<ConfigRow> = resolver
                .resolve_all()
                .await
                .into_iter()
                .map(|v| ConfigRow {
                    key: v.key.to_string(),
                    variable: resolver.naming().var_name(v.key),
                    value: v.display_value(),
                    source: v.source.clone(),
                })
                .collect();
            let sources = resolver.provider_coverage().await;

            match format {
                OutputFormat::Table => {
                    println!("{}", "Connection Settings".cyan().bold());
                    println!("{}", "=".repeat(60));
                    for row in &rows {
                        println!(
                            "{:<24} {:<40} {}",
                            row.variable.bold(),
                            row.value,
                            format!("({})", row.source).dimmed()
                        );
                    }

                    println!();
                    println!("{}", "Sources".cyan().bold());
                    for source in &sources {
                        let label = match &source.origin {
                            Some(origin) => format!("{} ({})", source.provider, origin),
                            None => source.provider.clone(),
                        };
                        let keys: Vec<String> = source
                            .provided
                            .iter()
                            .map(|k| resolver.naming().var_name(*k))
                            .collect();
                        let keys = if keys.is_empty() {
                            "-".dimmed().to_string()
                        } else {
                            keys.join(", ")
                        };
                        println!("  {:<40} {}", label.bold(), keys);
                        for error in &source.errors {
                            println!("    {} {}", "[WARN]".yellow(), error);
                        }
                    }
                }
                _ => {
                    let view = ConfigView {
                        settings: rows,
                        sources,
                    };
                    println!("{}", render_structured(&view, format)?);
                }
            }
        }

        Commands::Schema { name } => {
            let schema = SchemaDescriptor::builtin();
            match name {
                Some(name) => match schema.describe(&name) {
                    Some(description) => println!("{}: {}", name.bold(), description),
                    None => {
                        eprintln!("{} unknown table or function: {}", "[ERROR]".red().bold(), name);
                        std::process::exit(1);
                    }
                },
                None => match format {
                    OutputFormat::Table => {
                        for (title, kind) in [
                            ("Tables", SchemaObjectKind::Table),
                            ("Functions", SchemaObjectKind::Function),
                        ] {
                            println!("{}", title.cyan().bold());
                            for entry in schema.entries().iter().filter(|e| e.kind == kind) {
                                println!("  {:<24} {}", entry.name, entry.description);
                            }
                            println!();
                        }
                    }
                    _ => println!("{}", render_structured(&schema.entries(), format)?),
                },
            }
        }
    }

    Ok(())
}

async fn run_single<P: Probe + 'static>(probe: P, format: OutputFormat) -> anyhow::Result<()> {
    let report = probe.run().await;
    println!("{}", render_report(&report, format)?);

    if !report.passed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_engine(engine: ProbeEngine, format: OutputFormat) -> anyhow::Result<()> {
    let summary = engine.run().await;
    println!("{}", render_summary(&summary, format)?);

    if !summary.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
