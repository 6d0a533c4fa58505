//! Staleness audit: reconcile "the block said it had N transactions"
//! against "the store actually has N transactions".

use chrono::Utc;
use tracing::info;

use super::{Crawler, Task};
use crate::db::repo::Repo;
use crate::error::Result;
use crate::explorer::ExplorerApi;

impl<E, R> Crawler<E, R>
where
    E: ExplorerApi,
    R: Repo,
{
    /// Checks every block older than the staleness threshold that is not yet
    /// marked complete. A block whose stored distinct transaction count
    /// matches its reported count is marked complete without a re-fetch;
    /// anything else goes back through the normal fetch path, where
    /// already-present rows drop out as duplicates.
    pub async fn run_stale_block_audit(&self) -> Result<()> {
        let cutoff =
            Utc::now() - chrono::Duration::seconds(self.config.staleness.as_secs() as i64);
        let stale_blocks = self.repo.stale_incomplete_blocks(cutoff).await?;
        info!("found {} blocks to verify", stale_blocks.len());

        let mut to_refetch = Vec::new();
        for block in stale_blocks {
            let reported = block.block_number_of_transactions.unwrap_or(0);
            let url = self.client.block_url(block.block_number);

            let actual = match self
                .repo
                .distinct_transaction_count(block.block_number)
                .await
            {
                Ok(count) => count,
                Err(error) => {
                    self.recorder
                        .record(&error, "crawler::run_stale_block_audit", &url)
                        .await;
                    continue;
                }
            };

            if actual == reported {
                info!(
                    "block {} has correct number of transactions ({}), marking as completed",
                    block.block_number, actual
                );
                if let Err(error) = self.repo.mark_block_complete(block.block_number).await {
                    self.recorder
                        .record(&error, "crawler::run_stale_block_audit", &url)
                        .await;
                }
            } else {
                info!(
                    "block {} expected {} transactions but got {}, re-scraping",
                    block.block_number, reported, actual
                );
                to_refetch.push(Task::Block(block.block_number));
            }
        }

        self.drive(to_refetch).await
    }
}
