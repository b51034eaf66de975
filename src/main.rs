use clap::{Parser, Subcommand};
use preservationnc_crawler::presnc::{PresncCrawler, PresncData, INDEX_URL};
use preservationnc_crawler::{run_crawler, CrawlPolicy, HttpFetcher, Storage, Table};
use std::time::Duration;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "preservationnc-crawler", version, about = "Crawl Preservation NC property listings")]
struct Cli {
    /// Name of the SQLite database, stored as <NAME>.db
    #[arg(long, global = true, default_value = "presnc")]
    database: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl every listed property and store it
    Crawl {
        /// Page listing all properties
        #[arg(long, default_value = INDEX_URL)]
        index_url: String,
        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
        /// Skip properties that fail to parse instead of aborting
        #[arg(long)]
        lenient: bool,
        /// Search detail fields past the end of the property info block
        #[arg(long)]
        unbounded_scope: bool,
        /// Print the properties without storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Print stored properties as JSON
    List,
    /// Delete all stored properties
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            index_url,
            timeout,
            lenient,
            unbounded_scope,
            dry_run,
        } => {
            let mut crawler = PresncCrawler::new(&index_url);
            if unbounded_scope {
                crawler = crawler.unbounded();
            }
            let policy = if lenient {
                CrawlPolicy::Lenient
            } else {
                CrawlPolicy::Strict
            };
            let fetcher = HttpFetcher::new(Duration::from_secs(timeout))?;

            let outcome = run_crawler(&crawler, &fetcher, policy).await?;
            for prop in &outcome.documents {
                println!("{}", prop);
            }
            for skipped in &outcome.skipped {
                println!(
                    "Skipped {}: {}",
                    skipped.id.as_deref().unwrap_or("<unknown>"),
                    skipped.error
                );
            }

            if dry_run {
                info!("Dry run, {} properties not stored", outcome.documents.len());
            } else {
                let p = PresncData::new(&cli.database).await?;
                let saved = p.save(&outcome.documents).await?;
                info!(
                    "Stored {} of {} properties, {} in {}",
                    saved,
                    outcome.documents.len(),
                    p.properties.count().await?,
                    p.name
                );
            }
        }
        Commands::List => {
            let p = PresncData::new(&cli.database).await?;
            println!("{}", serde_json::to_string_pretty(&p.load().await?)?);
        }
        Commands::Clear => {
            let p = PresncData::new(&cli.database).await?;
            println!("Deleted {} properties", p.clear().await?);
        }
    }

    Ok(())
}
