mod api;
mod config;
mod error;
mod limits;
mod models;
mod resolver;
mod store;
mod sync;
#[cfg(test)]
mod testutil;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use api::NbrbClient;
use config::Config;
use resolver::Resolver;
use store::SqliteStore;

#[derive(Parser)]
#[command(version, about = "Mirror the NBRB exchange-rate catalog into a local database")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the local mirror from the remote catalog
    Sync,
    /// Print the rate for a currency
    Rate {
        /// Currency abbreviation, e.g. USD
        abbreviation: String,
        /// Date of the quote (YYYY-MM-DD); today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check the tracked currencies for day-over-day limit breaches
    Report,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "exrates=debug" } else { "exrates=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let store = SqliteStore::connect(&config.database_url).await?;
    let client = NbrbClient::new(&config.api_base_url);

    match cli.command {
        Commands::Sync => sync::refresh(&client, &store).await?,
        Commands::Rate { abbreviation, date } => {
            print_rate(&client, &store, &abbreviation, date).await?
        }
        Commands::Report => report(&client, &store, &config.tracked).await?,
    }

    store.close().await;
    Ok(())
}

async fn print_rate(
    client: &NbrbClient,
    store: &SqliteStore,
    abbreviation: &str,
    date: Option<NaiveDate>,
) -> Result<()> {
    let resolver = Resolver::new(client, store);
    let Some(currency) = resolver.resolve_currency(abbreviation).await? else {
        println!("Unknown currency: {abbreviation}");
        return Ok(());
    };
    let on_date = date.unwrap_or_else(|| Local::now().date_naive());
    match resolver.resolve_rate(&currency, on_date).await? {
        Some(rate) => println!("{}", rate.rate),
        None => println!(
            "No rate for {} on {on_date}",
            currency.abbreviation
        ),
    }
    Ok(())
}

async fn report(client: &NbrbClient, store: &SqliteStore, tracked: &[String]) -> Result<()> {
    let resolver = Resolver::new(client, store);
    let today = Local::now().date_naive();

    for abbreviation in tracked {
        let Some(currency) = resolver.resolve_currency(abbreviation).await? else {
            println!("Unknown currency: {abbreviation}");
            continue;
        };
        match limits::rate_changed(&resolver, &currency, today).await? {
            Some(true) => println!("{} passed the limit!", currency.name),
            Some(false) => println!("{} has not passed the limit", currency.name),
            None => println!("Limit status for {} could not be determined", currency.name),
        }
    }
    Ok(())
}
