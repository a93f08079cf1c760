use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use cart_recovery::app::{DispatchUseCase, QualifyOutcome, QualifyUseCase};
use cart_recovery::config::Config;
use cart_recovery::error::LeadError;
use cart_recovery::infra::http_client::ReqwestWebhook;
use cart_recovery::payload::build_payload;
use cart_recovery::report::render_preview;
use cart_recovery::server::{start_server, AppState};
use cart_recovery::{export, logging, metrics};

#[derive(Parser)]
#[command(name = "cart_recovery")]
#[command(about = "Finds first-time customers with saved orders and forwards them to a webhook")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./cart_recovery.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter a sales report and show the qualified leads
    Qualify {
        /// Report file (.csv, .xlsx or .xls)
        file: PathBuf,
        /// Also write the qualified rows to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Number of rows to show in the preview
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Filter a sales report and send the qualified leads to the webhook
    Dispatch {
        /// Report file (.csv, .xlsx or .xls)
        file: PathBuf,
        /// Webhook URL (overrides config and CART_RECOVERY_WEBHOOK_URL)
        #[arg(long)]
        webhook_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout_seconds: Option<u64>,
    },
    /// Serve the upload endpoints over HTTP
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Address for the Prometheus metrics listener
        #[arg(long)]
        metrics_addr: Option<SocketAddr>,
    },
}

fn print_summary(outcome: &QualifyOutcome, config: &Config, limit: usize) {
    println!("\n📊 Filter results:");
    println!("   Rows in file: {}", outcome.summary.total_rows);
    println!("   Qualified leads: {}", outcome.summary.qualified_rows);

    if outcome.qualified.is_empty() {
        println!("\nℹ️  No qualified leads found (0 previous orders + '{}').", config.qualifier.qualifying_status);
    } else {
        println!();
        print!("{}", render_preview(&outcome.qualified, &config.columns.display(), limit));
    }
}

fn operator_message(err: &LeadError) -> String {
    match err {
        LeadError::MissingColumns { .. } => format!("❌ {}", err),
        LeadError::Config(_) => format!("⚠️  {}", err),
        LeadError::WebhookStatus { status, body } => {
            format!("❌ Webhook error: status {}\n{}", status, body)
        }
        LeadError::Transport(e) => format!("❌ Connection failure: {}", e),
        other => format!("❌ Error processing file: {}", other),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Qualify { file, export: export_path, limit } => {
            let use_case = QualifyUseCase::from_config(config.clone());
            let outcome = use_case.run_path(&file)?;
            print_summary(&outcome, &config, limit);

            if let Some(path) = export_path {
                export::export_csv(&outcome.qualified, &path)?;
                println!("\n💾 Exported {} row(s) to {}", outcome.qualified.len(), path.display());
            }
        }
        Commands::Dispatch { file, webhook_url, timeout_seconds } => {
            let mut dispatch_config = config.dispatch.clone();
            if let Some(url) = webhook_url {
                dispatch_config.destination_url = url;
            }
            if let Some(t) = timeout_seconds {
                dispatch_config.timeout_seconds = t;
            }

            let use_case = QualifyUseCase::from_config(config.clone());
            let outcome = use_case.run_path(&file)?;
            print_summary(&outcome, &config, 20);

            if outcome.qualified.is_empty() {
                return Ok(());
            }

            let items = build_payload(&outcome.qualified, &config.payload)?;
            println!("\n🚀 Sending {} lead(s) to the webhook...", items.len());
            let dispatcher = DispatchUseCase::new(Arc::new(ReqwestWebhook::new()), dispatch_config);
            let report = dispatcher.dispatch(&items).await?;
            println!("✅ Success! {} lead(s) sent (status {}).", report.records_sent, report.status);
        }
        Commands::Serve { port, metrics_addr } => {
            if let Some(addr) = metrics_addr {
                metrics::init_metrics(addr);
            }
            let state = Arc::new(AppState {
                qualify: QualifyUseCase::from_config(config),
                webhook: Arc::new(ReqwestWebhook::new()),
            });
            start_server(state, port).await.context("HTTP server stopped")?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "Command failed");
        match e.downcast_ref::<LeadError>() {
            Some(lead) => eprintln!("{}", operator_message(lead)),
            None => eprintln!("❌ {:#}", e),
        }
        std::process::exit(1);
    }
    info!("Done");
}
