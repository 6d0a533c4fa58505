#[macro_use]
extern crate diesel;

mod cli;
mod config;
mod crawler;
mod db;
mod error;
mod explorer;
mod qrl;
mod schema;

use std::sync::Arc;

use tracing::info;

use crate::crawler::Crawler;
use crate::db::repo::PostgresRepo;
use crate::error::Error;
use crate::explorer::HttpExplorerClient;

fn main() -> Result<(), Error> {
    let args = <cli::Cli as clap::Parser>::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let result = rt.block_on(tokio_main(args));
    rt.shutdown_timeout(std::time::Duration::from_millis(1));
    result
}

async fn tokio_main(args: cli::Cli) -> Result<(), Error> {
    let postgres_config = config::load_postgres()?;
    let scraper_config = config::load_scraper()?;

    let pool = db::pool::new(&postgres_config)?;
    let repo = Arc::new(PostgresRepo::new(pool));
    let client = HttpExplorerClient::new(&scraper_config)?;

    let crawler = Crawler::new(client, repo, scraper_config);

    match args.mode() {
        cli::Mode::Normal => {
            info!("normal mode: crawling from the current store state");
            crawler.run_normal().await
        }
        cli::Mode::SingleBlock(number) => {
            info!("single block mode: re-fetching block {}", number);
            crawler.run_single_block(number).await
        }
        cli::Mode::FullRescrape => {
            info!("full rescrape mode: re-fetching every stored block number");
            crawler.run_full_rescrape().await
        }
        cli::Mode::WalletOnly(address) => {
            info!("wallet mode: fetching state of {}", address);
            crawler.run_wallet_only(address).await
        }
        cli::Mode::RetryTransactions => {
            info!("retry mode: fetching failed transactions");
            crawler.run_transaction_retries().await
        }
        cli::Mode::CheckBlocks => {
            info!("audit mode: checking older blocks missing transactions");
            crawler.run_stale_block_audit().await
        }
    }
}
