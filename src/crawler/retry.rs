//! Replay of previously failed transaction fetches.

use tracing::{info, warn};

use super::{Crawler, Task};
use crate::db::repo::Repo;
use crate::error::Result;
use crate::explorer::ExplorerApi;

impl<E, R> Crawler<E, R>
where
    E: ExplorerApi,
    R: Repo,
{
    /// Re-issues every missed-item url that looks like a transaction fetch.
    /// A url whose replay makes it through classification and persistence
    /// has its failure rows deleted; anything else stays for the next pass.
    /// Retries are unbounded by design — the operator re-runs this mode.
    pub async fn run_transaction_retries(&self) -> Result<()> {
        let urls = self.repo.failed_transaction_urls().await?;
        if urls.is_empty() {
            info!("no failed transactions found");
            return Ok(());
        }
        info!("found {} failed transaction urls", urls.len());

        let tasks = urls
            .into_iter()
            .filter_map(|url| match transaction_hash_from_url(&url) {
                Some(hash) => Some(Task::Transaction {
                    hash,
                    retry_url: Some(url),
                }),
                None => {
                    warn!("cannot extract a transaction hash from {}", url);
                    None
                }
            })
            .collect();

        self.drive(tasks).await
    }
}

fn transaction_hash_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/tx/")?;
    let hash = rest
        .split(|c| c == '/' || c == '?')
        .next()
        .unwrap_or_default();
    if hash.is_empty() {
        None
    } else {
        Some(hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::super::testing::{transaction_fixture, TestExplorer, TestRepo};
    use super::super::Crawler;
    use super::transaction_hash_from_url;
    use crate::config::ScraperConfig;

    fn test_config() -> ScraperConfig {
        ScraperConfig {
            explorer_url: "http://explorer.test".to_string(),
            node_state_url: "http://node.test/GetNodeState".to_string(),
            max_concurrent_requests: 4,
            gap_threshold: 0,
            staleness: Duration::from_secs(2 * 24 * 3600),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn hash_extraction() {
        assert_eq!(
            transaction_hash_from_url("https://explorer.theqrl.org/api/tx/abcd12").as_deref(),
            Some("abcd12")
        );
        assert_eq!(
            transaction_hash_from_url("http://explorer.test/api/tx/abcd12/").as_deref(),
            Some("abcd12")
        );
        assert_eq!(transaction_hash_from_url("http://explorer.test/api/tx/"), None);
        assert_eq!(
            transaction_hash_from_url("http://explorer.test/api/block/5"),
            None
        );
    }

    #[tokio::test]
    async fn successful_replay_deletes_the_missed_item() {
        let repo = Arc::new(TestRepo::default());
        repo.seed_missed_item("http://explorer.test/api/tx/aa11");

        let explorer = TestExplorer::with_height(0);
        explorer.put_transaction(
            "aa11",
            transaction_fixture(3, "aa11", "0101", &[("0202", 9)]),
        );

        let crawler = Crawler::new(explorer, repo.clone(), test_config());
        crawler.run_transaction_retries().await.unwrap();

        assert_eq!(repo.transaction_rows(), 1);
        assert_eq!(repo.missed_rows(), 0);
    }

    #[tokio::test]
    async fn failed_replay_keeps_the_missed_item() {
        let repo = Arc::new(TestRepo::default());
        repo.seed_missed_item("http://explorer.test/api/tx/aa11");

        let explorer = TestExplorer::with_height(0);
        explorer.fail_transaction("aa11");

        let crawler = Crawler::new(explorer, repo.clone(), test_config());
        crawler.run_transaction_retries().await.unwrap();

        assert_eq!(repo.transaction_rows(), 0);
        // the original row survives and the failed replay logs another one
        assert_eq!(repo.missed_rows(), 2);
        assert!(repo
            .missed_urls()
            .iter()
            .all(|url| url.contains("/tx/aa11")));
    }

    #[tokio::test]
    async fn replay_succeeds_after_the_failure_clears() {
        let repo = Arc::new(TestRepo::default());
        repo.seed_missed_item("http://explorer.test/api/tx/aa11");

        let explorer = TestExplorer::with_height(0);
        explorer.fail_transaction("aa11");
        explorer.put_transaction(
            "aa11",
            transaction_fixture(3, "aa11", "0101", &[("0202", 9)]),
        );

        let crawler = Crawler::new(explorer, repo.clone(), test_config());
        crawler.run_transaction_retries().await.unwrap();
        assert_eq!(repo.missed_rows(), 2);

        crawler.client.unfail_transaction("aa11");
        crawler.run_transaction_retries().await.unwrap();

        assert_eq!(repo.transaction_rows(), 1);
        assert_eq!(repo.missed_rows(), 0);
    }
}
