//! `stockbook` command-line entry point.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use stockbook_app::report::report_status;
use stockbook_app::settings::{AppSettings, load_catalog};
use stockbook_app::{AppState, HttpSyncGateway, LocalStore, RecordInput};
use stockbook_inventory::StockSource;
use stockbook_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "stockbook", version, about = "Daily inventory entry with spreadsheet sync")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Directory holding the local database.
    #[arg(long, global = true, env = "STOCKBOOK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Catalog JSON file (defaults to catalog.json in the data directory).
    #[arg(long, global = true, env = "STOCKBOOK_CATALOG")]
    catalog: Option<PathBuf>,

    /// Recipient named in the report confirmation.
    #[arg(long, global = true, env = "STOCKBOOK_REPORT_RECIPIENT")]
    report_recipient: Option<String>,

    /// Host that endpoint URLs must point at.
    #[arg(long, global = true, env = "STOCKBOOK_PROVIDER_HOST", hide = true)]
    provider_host: Option<String>,

    /// Log output format: compact or json.
    #[arg(long, global = true, env = "STOCKBOOK_LOG_FORMAT", default_value = "compact")]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List catalog items.
    Items,
    /// Show the previous-day stock of an item.
    PreviousStock {
        #[arg(long)]
        item: String,
        /// YYYY-MM-DD, defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Record usage, incoming and ending stock for an item.
    Submit {
        #[arg(long)]
        item: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        usage: Option<String>,
        #[arg(long)]
        incoming: Option<String>,
        #[arg(long)]
        stock: Option<String>,
        #[arg(long, default_value = "")]
        operator: String,
    },
    /// List stored records.
    Records {
        #[arg(long)]
        item: Option<String>,
    },
    /// Ask the spreadsheet to email the cumulative report.
    Report {
        #[arg(long, default_value = "")]
        operator: String,
        /// Confirm the report on the command line instead of at the prompt.
        /// The email cannot be recalled.
        #[arg(long)]
        yes: bool,
    },
    /// Endpoint configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Validate and save the spreadsheet endpoint URL.
    SetEndpoint { url: String },
    /// Show the active configuration.
    Show,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    stockbook_observability::init_with(cli.global.log_format);

    let settings = AppSettings::resolve(
        cli.global.data_dir,
        cli.global.catalog,
        cli.global.report_recipient,
        cli.global.provider_host,
    )?;

    let store = LocalStore::open_in(&settings.data_dir)
        .await
        .with_context(|| format!("failed to open local store in {}", settings.data_dir.display()))?;
    let catalog = Arc::new(load_catalog(&settings.catalog_path)?);

    let mut state = AppState::load(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        catalog,
        Arc::new(HttpSyncGateway::new()),
        settings.endpoint_policy.clone(),
        settings.report_recipient.clone(),
    )
    .await
    .context("failed to load settings")?;

    let result = run(cli.command, &mut state).await;
    store.close().await;
    result
}

async fn run(command: Command, state: &mut AppState) -> anyhow::Result<()> {
    match command {
        Command::Items => {
            let catalog = state.catalog();
            println!("{} items", catalog.len());
            for item in catalog.items() {
                println!("{}\t(initial stock {})", item.label(), item.initial_stock);
            }
        }
        Command::PreviousStock { item, date } => {
            let resolved = state.previous_stock(&item, date.as_deref()).await?;
            let source = match resolved.source {
                StockSource::Record(id) => format!("record {id}"),
                StockSource::Catalog => "catalog baseline".to_string(),
                StockSource::Unknown => "unknown item".to_string(),
            };
            println!("{}\t({source})", resolved.value);
        }
        Command::Submit {
            item,
            date,
            usage,
            incoming,
            stock,
            operator,
        } => {
            let submission = state
                .submit(RecordInput {
                    date,
                    item,
                    usage,
                    incoming,
                    stock,
                    operator,
                })
                .await?;
            let r = &submission.record;
            println!(
                "{} {} previous={} usage={} incoming={} stock={}",
                r.date, r.item, r.previous_stock, r.usage, r.incoming, r.stock
            );
            println!("{}", submission.status());
        }
        Command::Records { item } => {
            for r in state.records(item.as_deref()).await? {
                println!(
                    "{}\t{}\t{}\tprev={}\tuse={}\tin={}\tstock={}\t{}\t{}",
                    r.id, r.date, r.item, r.previous_stock, r.usage, r.incoming, r.stock, r.operator, r.timestamp
                );
            }
        }
        Command::Report { operator, yes } => {
            let prompt = state.request_report(&operator)?;
            if yes {
                tracing::info!(operator = %prompt.operator, "report confirmed with --yes");
            } else if !ask(&format!("{prompt} [y/N] ")).await? {
                state.decline_report()?;
                println!("report not sent");
                return Ok(());
            }
            let outcome = state.confirm_report().await?;
            println!("{}", report_status(&outcome));
        }
        Command::Config(ConfigCommand::SetEndpoint { url }) => {
            let config = state.save_endpoint(&url).await?;
            if let Some(endpoint) = config.endpoint() {
                println!("endpoint saved: {endpoint}");
            }
        }
        Command::Config(ConfigCommand::Show) => match state.config().endpoint() {
            Some(endpoint) => println!("endpoint: {endpoint}"),
            None => println!("endpoint: (not configured, records stay local)"),
        },
    }
    Ok(())
}

/// Yes/no question on stdin; anything but y/yes is a no.
async fn ask(question: &str) -> anyhow::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut answer).await?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
