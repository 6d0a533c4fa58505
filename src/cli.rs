use clap::{ArgGroup, Parser};

/// Operator surface. Exactly one mode per invocation; no flags means a
/// normal crawl from the current store state.
#[derive(Parser, Debug)]
#[command(version, about = "QRL block explorer crawler", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .args(["block", "all", "wallet", "retry_transactions", "check_blocks"])
        .multiple(false)
))]
pub struct Cli {
    /// Re-fetch a single block number and its transactions
    #[arg(long, value_name = "N")]
    pub block: Option<i64>,

    /// Re-scrape every block from 0 through the highest stored number
    #[arg(long)]
    pub all: bool,

    /// Fetch and store the current state of one wallet address
    #[arg(long, value_name = "ADDRESS")]
    pub wallet: Option<String>,

    /// Re-fetch every transaction url previously logged as failed
    #[arg(long)]
    pub retry_transactions: bool,

    /// Verify old incomplete blocks against their stored transactions
    #[arg(long)]
    pub check_blocks: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Mode {
    Normal,
    SingleBlock(i64),
    FullRescrape,
    WalletOnly(String),
    RetryTransactions,
    CheckBlocks,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if let Some(number) = self.block {
            Mode::SingleBlock(number)
        } else if self.all {
            Mode::FullRescrape
        } else if let Some(address) = &self.wallet {
            Mode::WalletOnly(address.clone())
        } else if self.retry_transactions {
            Mode::RetryTransactions
        } else if self.check_blocks {
            Mode::CheckBlocks
        } else {
            Mode::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_normal_mode() {
        let cli = Cli::try_parse_from(["scraper"]).unwrap();
        assert_eq!(cli.mode(), Mode::Normal);
    }

    #[test]
    fn each_flag_selects_its_mode() {
        let cli = Cli::try_parse_from(["scraper", "--block", "12345"]).unwrap();
        assert_eq!(cli.mode(), Mode::SingleBlock(12345));

        let cli = Cli::try_parse_from(["scraper", "--all"]).unwrap();
        assert_eq!(cli.mode(), Mode::FullRescrape);

        let cli = Cli::try_parse_from(["scraper", "--wallet", "Qdead"]).unwrap();
        assert_eq!(cli.mode(), Mode::WalletOnly("Qdead".to_string()));

        let cli = Cli::try_parse_from(["scraper", "--retry-transactions"]).unwrap();
        assert_eq!(cli.mode(), Mode::RetryTransactions);

        let cli = Cli::try_parse_from(["scraper", "--check-blocks"]).unwrap();
        assert_eq!(cli.mode(), Mode::CheckBlocks);
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        assert!(Cli::try_parse_from(["scraper", "--all", "--block", "1"]).is_err());
        assert!(Cli::try_parse_from(["scraper", "--check-blocks", "--retry-transactions"]).is_err());
    }
}
