use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use log::error;

use mail_date_report::auth::token_manager::TokenManager;
use mail_date_report::graph::GRAPH_BASE;
use mail_date_report::graph::http::HttpRetryClient;
use mail_date_report::{
    AuthConfig, LogReporter, ReportFormat, RunConfig, StaticToken, TokenProvider, run_report,
};

#[derive(Parser)]
#[command(name = "mail_date_report")]
#[command(about = "Export recent Outlook messages and the dates they mention to Excel or CSV", long_about = None)]
struct Cli {
    /// Application (client) id of the app registration
    #[arg(long, env = "CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "TENANT", default_value = "common")]
    tenant: String,

    /// Slash-separated folder path, e.g. "Inbox/Invoices"
    #[arg(long, env = "FOLDER_PATH", default_value = "Inbox")]
    folder: String,

    /// Single keyword matched against subject, body and sender
    #[arg(long, env = "KEYWORDS")]
    keywords: Option<String>,

    #[arg(long, env = "DAYS", default_value_t = 7)]
    days: u32,

    /// Report file; a `.csv` extension writes CSV, anything else an Excel workbook
    #[arg(long, env = "OUTPUT_PATH", default_value = "outlook_last7days.xlsx")]
    out: PathBuf,

    /// IANA timezone for the Received column
    #[arg(long, env = "TIMEZONE", default_value = "Asia/Kolkata")]
    timezone: String,

    #[arg(long, env = "GRAPH_BASE", default_value = GRAPH_BASE)]
    graph_base: String,

    /// Use this bearer token instead of signing in
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

fn main() -> Result<()> {
    // .env first so clap sees its values as environment
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let config = RunConfig::builder()
        .folder_path(&cli.folder)
        .lookback_days(cli.days)
        .keyword(cli.keywords.as_deref())
        .output_path(&cli.out)
        .timezone(&cli.timezone)
        .graph_base(&cli.graph_base)
        .build()?;

    let tokens: Box<dyn TokenProvider> = match cli.access_token {
        Some(token) => Box::new(StaticToken(token)),
        None => Box::new(TokenManager::new(AuthConfig::new(
            cli.client_id.as_deref(),
            Some(&cli.tenant),
        )?)),
    };

    let http = HttpRetryClient::from_env()?;
    let writer = ReportFormat::from_path(&config.output_path).writer(config.timezone);

    let summary = run_report(&config, tokens.as_ref(), &http, writer.as_ref(), &LogReporter, Utc::now())
        .inspect_err(|e| error!("{} error: {e}", e.category()))
        .context("report run failed")?;

    println!(
        "Fetched {} messages (since last {} days).",
        summary.scanned, config.lookback_days
    );
    match &config.keyword {
        Some(k) => println!("Keyword filter: '{k}' -> {} matching messages saved.", summary.kept),
        None => println!("No keyword provided -> {} messages saved.", summary.kept),
    }
    println!("Wrote {} rows to {}", summary.kept, config.output_path.display());
    Ok(())
}
