//! Scraper's database view (idempotent writes + audit queries).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{NewBlock, NewMissedItem, NewTransaction, NewWalletAddress, StaleBlock, UpsertOutcome};
use crate::error::Result;

pub use self::repo_impl::PostgresRepo;

#[async_trait]
pub trait Repo: Send + Sync {
    async fn insert_block(&self, block: NewBlock) -> Result<UpsertOutcome>;

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<UpsertOutcome>;

    async fn upsert_wallet_address(&self, wallet: NewWalletAddress) -> Result<UpsertOutcome>;

    async fn insert_missed_item(&self, item: NewMissedItem) -> Result<()>;

    async fn upsert_emission(&self, emission: String) -> Result<()>;

    async fn highest_block_number(&self) -> Result<Option<i64>>;

    async fn block_count(&self) -> Result<i64>;

    async fn stored_block_numbers(&self) -> Result<Vec<i64>>;

    async fn stale_incomplete_blocks(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleBlock>>;

    async fn distinct_transaction_count(&self, block_number: i64) -> Result<i64>;

    async fn mark_block_complete(&self, block_number: i64) -> Result<()>;

    async fn failed_transaction_urls(&self) -> Result<Vec<String>>;

    async fn delete_missed_items_for_url(&self, url: String) -> Result<()>;
}

/// Synchronous operations executed on a pooled connection. Every method is a
/// single statement, so each one commits or rolls back on its own and a
/// failing item cannot take another item's write down with it.
pub trait RepoOperations {
    fn insert_block(&mut self, block: &NewBlock) -> Result<UpsertOutcome>;

    fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<UpsertOutcome>;

    fn upsert_wallet_address(&mut self, wallet: &NewWalletAddress) -> Result<UpsertOutcome>;

    fn insert_missed_item(&mut self, item: &NewMissedItem) -> Result<()>;

    fn upsert_emission(&mut self, emission: &str, now: DateTime<Utc>) -> Result<()>;

    fn highest_block_number(&mut self) -> Result<Option<i64>>;

    fn block_count(&mut self) -> Result<i64>;

    fn stored_block_numbers(&mut self) -> Result<Vec<i64>>;

    fn stale_incomplete_blocks(&mut self, cutoff: DateTime<Utc>) -> Result<Vec<StaleBlock>>;

    fn distinct_transaction_count(&mut self, block_number: i64) -> Result<i64>;

    fn mark_block_complete(&mut self, block_number: i64) -> Result<()>;

    fn failed_transaction_urls(&mut self) -> Result<Vec<String>>;

    fn delete_missed_items_for_url(&mut self, url: &str) -> Result<()>;
}

mod repo_impl {
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use diesel::prelude::*;
    use diesel::upsert::excluded;

    use super::{Repo, RepoOperations};
    use crate::db::pool::PgPool;
    use crate::db::{
        NewBlock, NewMissedItem, NewTransaction, NewWalletAddress, StaleBlock, UpsertOutcome,
        WalletStateUpdate,
    };
    use crate::error::Result;
    use crate::schema::{
        qrl_blockchain_blocks, qrl_blockchain_emission, qrl_blockchain_missed_items,
        qrl_blockchain_transactions, qrl_wallet_address,
    };

    /// Repo implementation backed by a PostgreSQL pool.
    ///
    /// Can be cloned freely, no need to wrap in `Arc`.
    #[derive(Clone)]
    pub struct PostgresRepo {
        pool: PgPool,
    }

    impl PostgresRepo {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        async fn execute<F, R>(&self, f: F) -> Result<R>
        where
            F: FnOnce(&mut PgConnection) -> Result<R> + Send + 'static,
            R: Send + 'static,
        {
            let conn = self.pool.get().await?;
            conn.interact(|conn| f(conn)).await?
        }
    }

    #[async_trait]
    impl Repo for PostgresRepo {
        async fn insert_block(&self, block: NewBlock) -> Result<UpsertOutcome> {
            self.execute(move |conn| conn.insert_block(&block)).await
        }

        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<UpsertOutcome> {
            self.execute(move |conn| conn.insert_transaction(&transaction))
                .await
        }

        async fn upsert_wallet_address(&self, wallet: NewWalletAddress) -> Result<UpsertOutcome> {
            self.execute(move |conn| conn.upsert_wallet_address(&wallet))
                .await
        }

        async fn insert_missed_item(&self, item: NewMissedItem) -> Result<()> {
            self.execute(move |conn| conn.insert_missed_item(&item))
                .await
        }

        async fn upsert_emission(&self, emission: String) -> Result<()> {
            self.execute(move |conn| conn.upsert_emission(&emission, Utc::now()))
                .await
        }

        async fn highest_block_number(&self) -> Result<Option<i64>> {
            self.execute(|conn| conn.highest_block_number()).await
        }

        async fn block_count(&self) -> Result<i64> {
            self.execute(|conn| conn.block_count()).await
        }

        async fn stored_block_numbers(&self) -> Result<Vec<i64>> {
            self.execute(|conn| conn.stored_block_numbers()).await
        }

        async fn stale_incomplete_blocks(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<Vec<StaleBlock>> {
            self.execute(move |conn| conn.stale_incomplete_blocks(cutoff))
                .await
        }

        async fn distinct_transaction_count(&self, block_number: i64) -> Result<i64> {
            self.execute(move |conn| conn.distinct_transaction_count(block_number))
                .await
        }

        async fn mark_block_complete(&self, block_number: i64) -> Result<()> {
            self.execute(move |conn| conn.mark_block_complete(block_number))
                .await
        }

        async fn failed_transaction_urls(&self) -> Result<Vec<String>> {
            self.execute(|conn| conn.failed_transaction_urls()).await
        }

        async fn delete_missed_items_for_url(&self, url: String) -> Result<()> {
            self.execute(move |conn| conn.delete_missed_items_for_url(&url))
                .await
        }
    }

    impl RepoOperations for PgConnection {
        fn insert_block(&mut self, block: &NewBlock) -> Result<UpsertOutcome> {
            let inserted = diesel::insert_into(qrl_blockchain_blocks::table)
                .values(block)
                .on_conflict_do_nothing()
                .execute(self)?;

            Ok(if inserted == 0 {
                UpsertOutcome::Duplicate
            } else {
                UpsertOutcome::Inserted
            })
        }

        fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<UpsertOutcome> {
            let inserted = diesel::insert_into(qrl_blockchain_transactions::table)
                .values(transaction)
                .on_conflict_do_nothing()
                .execute(self)?;

            Ok(if inserted == 0 {
                UpsertOutcome::Duplicate
            } else {
                UpsertOutcome::Inserted
            })
        }

        fn upsert_wallet_address(&mut self, wallet: &NewWalletAddress) -> Result<UpsertOutcome> {
            let known: bool = diesel::select(diesel::dsl::exists(
                qrl_wallet_address::table
                    .filter(qrl_wallet_address::wallet_address.eq(&wallet.wallet_address)),
            ))
            .get_result(self)?;

            // A concurrent first observation of the same address resolves
            // through the conflict target; first-seen columns are not part
            // of the update set and survive either way.
            diesel::insert_into(qrl_wallet_address::table)
                .values(wallet)
                .on_conflict(qrl_wallet_address::wallet_address)
                .do_update()
                .set(WalletStateUpdate::from(wallet))
                .execute(self)?;

            Ok(if known {
                UpsertOutcome::Duplicate
            } else {
                UpsertOutcome::Inserted
            })
        }

        fn insert_missed_item(&mut self, item: &NewMissedItem) -> Result<()> {
            diesel::insert_into(qrl_blockchain_missed_items::table)
                .values(item)
                .execute(self)?;

            Ok(())
        }

        fn upsert_emission(&mut self, emission: &str, now: DateTime<Utc>) -> Result<()> {
            diesel::insert_into(qrl_blockchain_emission::table)
                .values((
                    qrl_blockchain_emission::id.eq(1),
                    qrl_blockchain_emission::emission.eq(emission),
                    qrl_blockchain_emission::updated_at.eq(now),
                ))
                .on_conflict(qrl_blockchain_emission::id)
                .do_update()
                .set((
                    qrl_blockchain_emission::emission
                        .eq(excluded(qrl_blockchain_emission::emission)),
                    qrl_blockchain_emission::updated_at
                        .eq(excluded(qrl_blockchain_emission::updated_at)),
                ))
                .execute(self)?;

            Ok(())
        }

        fn highest_block_number(&mut self) -> Result<Option<i64>> {
            Ok(qrl_blockchain_blocks::table
                .select(diesel::dsl::max(qrl_blockchain_blocks::block_number))
                .get_result(self)?)
        }

        fn block_count(&mut self) -> Result<i64> {
            Ok(qrl_blockchain_blocks::table.count().get_result(self)?)
        }

        fn stored_block_numbers(&mut self) -> Result<Vec<i64>> {
            Ok(qrl_blockchain_blocks::table
                .select(qrl_blockchain_blocks::block_number)
                .order(qrl_blockchain_blocks::block_number.asc())
                .load(self)?)
        }

        fn stale_incomplete_blocks(&mut self, cutoff: DateTime<Utc>) -> Result<Vec<StaleBlock>> {
            Ok(qrl_blockchain_blocks::table
                .select((
                    qrl_blockchain_blocks::block_number,
                    qrl_blockchain_blocks::block_found_datetime,
                    qrl_blockchain_blocks::block_number_of_transactions,
                ))
                .filter(qrl_blockchain_blocks::got_all_transactions.is_distinct_from(true))
                .filter(qrl_blockchain_blocks::block_found_datetime.lt(cutoff))
                .order(qrl_blockchain_blocks::block_number.asc())
                .load(self)?)
        }

        fn distinct_transaction_count(&mut self, block_number: i64) -> Result<i64> {
            Ok(qrl_blockchain_transactions::table
                .filter(qrl_blockchain_transactions::transaction_block_number.eq(block_number))
                .select(diesel::dsl::count_distinct(
                    qrl_blockchain_transactions::transaction_hash,
                ))
                .get_result(self)?)
        }

        fn mark_block_complete(&mut self, block_number: i64) -> Result<()> {
            diesel::update(qrl_blockchain_blocks::table)
                .set(qrl_blockchain_blocks::got_all_transactions.eq(true))
                .filter(qrl_blockchain_blocks::block_number.eq(block_number))
                .execute(self)?;

            Ok(())
        }

        fn failed_transaction_urls(&mut self) -> Result<Vec<String>> {
            Ok(qrl_blockchain_missed_items::table
                .select(qrl_blockchain_missed_items::item_url)
                .filter(qrl_blockchain_missed_items::item_url.like("%/tx/%"))
                .distinct()
                .load(self)?)
        }

        fn delete_missed_items_for_url(&mut self, url: &str) -> Result<()> {
            diesel::delete(qrl_blockchain_missed_items::table)
                .filter(qrl_blockchain_missed_items::item_url.eq(url))
                .execute(self)?;

            Ok(())
        }
    }
}
