use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::db::repo::Repo;
use crate::db::{NewBlock, NewTransaction, NewWalletAddress, UpsertOutcome};
use crate::error::{Error, Result};
use crate::explorer::dto::{AddressState, BlockResponse, BytesField};
use crate::explorer::ExplorerApi;
use crate::qrl::transactions::{classify_transaction, ClassifiedTransaction, TransactionRecord};
use crate::qrl::{datetime_from_timestamp_seconds, Address};

pub mod audit;
pub mod recorder;
pub mod retry;
#[cfg(test)]
pub mod testing;

use recorder::Recorder;

pub const SPIDER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SPIDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A unit of crawl work. Completing a task may enqueue follow-on tasks; the
/// run is over when the queue drains, not at any fixed call depth.
#[derive(Debug, Clone)]
pub enum Task {
    Block(i64),
    Transaction {
        hash: String,
        /// Set in retry mode: the missed-item url to delete once the whole
        /// classify+persist pipeline succeeds.
        retry_url: Option<String>,
    },
    Address {
        address: Address,
        first_seen_block: Option<i64>,
    },
}

pub struct Crawler<E, R> {
    pub(crate) client: E,
    pub(crate) repo: Arc<R>,
    pub(crate) recorder: Recorder<R>,
    pub(crate) config: ScraperConfig,
}

impl<E, R> Crawler<E, R>
where
    E: ExplorerApi,
    R: Repo,
{
    pub fn new(client: E, repo: Arc<R>, config: ScraperConfig) -> Self {
        let recorder = Recorder::new(repo.clone());
        Self {
            client,
            repo,
            recorder,
            config,
        }
    }

    /// Normal mode: refresh the emission figure, then schedule whatever the
    /// store is missing — historical gaps when the row count disagrees with
    /// the highest stored number, and always the contiguous tail up to the
    /// node's current height.
    pub async fn run_normal(&self) -> Result<()> {
        self.refresh_emission().await;

        let height = match self.client.node_state().await {
            Ok(state) => state.info.block_height,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::run_normal", &self.client.node_state_url())
                    .await;
                return Ok(());
            }
        };

        let highest = self.repo.highest_block_number().await?;
        let row_count = self.repo.block_count().await?;
        info!(
            "current block height: {}, highest block in db: {:?}, rows in db: {}",
            height, highest, row_count
        );

        let mut tasks: Vec<Task> = Vec::new();
        if let Some(highest) = highest {
            if gap_signal(highest, row_count, self.config.gap_threshold as i64) {
                let stored: HashSet<i64> =
                    self.repo.stored_block_numbers().await?.into_iter().collect();
                let missing = missing_block_numbers(highest, &stored);
                info!("gaps identified: {} missing blocks", missing.len());
                tasks.extend(missing.into_iter().map(Task::Block));
            }
        }

        let tail_start = highest.map(|h| h + 1).unwrap_or(0);
        tasks.extend((tail_start..=height).map(Task::Block));

        self.drive(tasks).await
    }

    /// Manual repair: re-fetch exactly one block regardless of store state.
    pub async fn run_single_block(&self, block_number: i64) -> Result<()> {
        self.drive(vec![Task::Block(block_number)]).await
    }

    /// Re-fetch every block from 0 through the highest stored number.
    pub async fn run_full_rescrape(&self) -> Result<()> {
        match self.repo.highest_block_number().await? {
            Some(highest) => self.drive((0..=highest).map(Task::Block).collect()).await,
            None => {
                info!("store is empty, nothing to rescrape");
                Ok(())
            }
        }
    }

    /// Fetch and upsert a single wallet address; no block traversal.
    pub async fn run_wallet_only(&self, address: String) -> Result<()> {
        self.drive(vec![Task::Address {
            address: Address(address),
            first_seen_block: None,
        }])
        .await
    }

    /// The crawl loop: a single task owning the queue and the address dedup
    /// set, with up to `max_concurrent_requests` fetches in flight. Tasks
    /// are scheduled in order but complete in any order; every write is
    /// keyed by natural identity, so completion order does not matter.
    pub(crate) async fn drive(&self, seeds: Vec<Task>) -> Result<()> {
        let start = Instant::now();
        let mut pending: VecDeque<Task> = VecDeque::new();
        let mut requested_addresses: HashSet<Address> = HashSet::new();
        for task in seeds {
            admit(task, &mut pending, &mut requested_addresses);
        }

        let mut in_flight = FuturesUnordered::new();
        let mut completed = 0usize;
        let max_in_flight = self.config.max_concurrent_requests.max(1);

        loop {
            while in_flight.len() < max_in_flight {
                match pending.pop_front() {
                    Some(task) => in_flight.push(self.run_task(task)),
                    None => break,
                }
            }

            match in_flight.next().await {
                Some(follow_ups) => {
                    completed += 1;
                    for task in follow_ups {
                        admit(task, &mut pending, &mut requested_addresses);
                    }
                }
                None => break,
            }
        }

        info!(
            "{} tasks were handled in {} ms",
            completed,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    async fn run_task(&self, task: Task) -> Vec<Task> {
        match task {
            Task::Block(number) => self.process_block(number).await,
            Task::Transaction { hash, retry_url } => {
                self.process_transaction(hash, retry_url).await
            }
            Task::Address {
                address,
                first_seen_block,
            } => {
                self.process_address(address, first_seen_block).await;
                vec![]
            }
        }
    }

    async fn process_block(&self, number: i64) -> Vec<Task> {
        let url = self.client.block_url(number);
        let response = match self.client.block(number).await {
            Ok(response) => response,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::process_block", &url)
                    .await;
                return vec![];
            }
        };

        if !response.found {
            info!("block {} not found yet by the blockchain", number);
            return vec![];
        }

        let block = match new_block(&response, Utc::now()) {
            Ok(block) => block,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::process_block", &url)
                    .await;
                return vec![];
            }
        };

        match self.repo.insert_block(block.clone()).await {
            Ok(UpsertOutcome::Inserted) => info!("got new block, number: {}", block.block_number),
            Ok(UpsertOutcome::Duplicate) => {
                debug!("already got block number: {}", block.block_number)
            }
            Err(error) => {
                self.recorder
                    .record_with_item(&error, "crawler::process_block", &url, &block)
                    .await;
            }
        }

        // Fan out to the block's transactions even when the block row was
        // already present: a re-fetch exists to repair their absence.
        response
            .block_extended
            .as_ref()
            .map(|extended| {
                extended
                    .extended_transactions
                    .iter()
                    .filter_map(|ext| ext.tx.as_ref())
                    .filter_map(|tx| tx.transaction_hash.as_ref())
                    .map(|hash| Task::Transaction {
                        hash: hash.to_hex(),
                        retry_url: None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn process_transaction(&self, hash: String, retry_url: Option<String>) -> Vec<Task> {
        let url = retry_url
            .clone()
            .unwrap_or_else(|| self.client.transaction_url(&hash));

        let response = match self.client.transaction(&hash).await {
            Ok(response) => response,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::process_transaction", &url)
                    .await;
                return vec![];
            }
        };

        let classified = match classify_transaction(&response) {
            Ok(classified) => classified,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::process_transaction", &url)
                    .await;
                return vec![];
            }
        };

        let mut persisted = true;
        for record in &classified.records {
            let transaction = new_transaction(&classified, record, Utc::now());
            match self.repo.insert_transaction(transaction.clone()).await {
                Ok(UpsertOutcome::Inserted) => {
                    info!("got new transaction, hash: {}", transaction.transaction_hash)
                }
                Ok(UpsertOutcome::Duplicate) => debug!(
                    "already got transaction: {} -> {}",
                    transaction.transaction_hash, transaction.transaction_receiving_wallet_address
                ),
                Err(error) => {
                    persisted = false;
                    self.recorder
                        .record_with_item(&error, "crawler::process_transaction", &url, &transaction)
                        .await;
                }
            }
        }

        if persisted {
            if let Some(retry_url) = retry_url {
                match self.repo.delete_missed_items_for_url(retry_url.clone()).await {
                    Ok(()) => info!("removed error for url: {}", retry_url),
                    Err(error) => {
                        self.recorder
                            .record(&error, "crawler::process_transaction", &retry_url)
                            .await;
                    }
                }
            }
        }

        classified
            .referenced_addresses
            .iter()
            .map(|address| Task::Address {
                address: address.clone(),
                first_seen_block: Some(classified.block_number),
            })
            .collect()
    }

    async fn process_address(&self, address: Address, first_seen_block: Option<i64>) {
        if address.is_sentinel() {
            debug!("skipping sentinel address: {}", address);
            return;
        }

        let url = self.client.address_url(&address.0);
        let response = match self.client.address(&address.0).await {
            Ok(response) => response,
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::process_address", &url)
                    .await;
                return;
            }
        };

        let state = match response.state {
            Some(state) => state,
            None => {
                let error = Error::NotFound(format!("no state for address {}", address));
                self.recorder
                    .record(&error, "crawler::process_address", &url)
                    .await;
                return;
            }
        };

        let wallet = new_wallet_address(&state, &address, first_seen_block, Utc::now());
        match self.repo.upsert_wallet_address(wallet.clone()).await {
            Ok(UpsertOutcome::Inserted) => {
                info!("got new wallet address: {}", wallet.wallet_address)
            }
            Ok(UpsertOutcome::Duplicate) => {
                info!("updated wallet address: {}", wallet.wallet_address)
            }
            Err(error) => {
                self.recorder
                    .record_with_item(&error, "crawler::process_address", &url, &wallet)
                    .await;
            }
        }
    }

    async fn refresh_emission(&self) {
        let url = self.client.emission_url();
        match self.client.emission().await {
            Ok(value) => match self.repo.upsert_emission(value.clone()).await {
                Ok(()) => info!("stored emission: {}", value),
                Err(error) => {
                    self.recorder
                        .record(&error, "crawler::refresh_emission", &url)
                        .await;
                }
            },
            Err(error) => {
                self.recorder
                    .record(&error, "crawler::refresh_emission", &url)
                    .await;
            }
        }
    }
}

/// Sentinel and duplicate addresses are dropped at admission so one run
/// never fetches the same wallet twice. The set lives on the driver's stack
/// and is only touched from there.
fn admit(task: Task, pending: &mut VecDeque<Task>, requested_addresses: &mut HashSet<Address>) {
    if let Task::Address { address, .. } = &task {
        if address.is_sentinel() {
            debug!("skipping sentinel address: {}", address);
            return;
        }
        if !requested_addresses.insert(address.clone()) {
            return;
        }
    }
    pending.push_back(task);
}

/// True when the stored row count falls short of full coverage of
/// `{0..=highest}` by more than the configured threshold.
fn gap_signal(highest: i64, row_count: i64, threshold: i64) -> bool {
    (highest + 1).saturating_sub(row_count) > threshold
}

fn missing_block_numbers(highest: i64, stored: &HashSet<i64>) -> Vec<i64> {
    (0..=highest).filter(|n| !stored.contains(n)).collect()
}

fn new_block(response: &BlockResponse, now: DateTime<Utc>) -> Result<NewBlock> {
    let extended = response
        .block_extended
        .as_ref()
        .ok_or_else(|| Error::InvalidResponse("block_extended missing".to_string()))?;
    let header = &extended.header;

    Ok(NewBlock {
        block_number: header.block_number,
        block_found: response.found,
        block_result: response.result.clone(),
        block_size: extended.size,
        block_found_datetime: Some(datetime_from_timestamp_seconds(header.timestamp_seconds)),
        block_found_timestamp_seconds: header.timestamp_seconds,
        block_reward_block: header.reward_block,
        block_reward_fee: header.reward_fee,
        block_mining_nonce: header.mining_nonce,
        block_extra_nonce: header.extra_nonce.clone(),
        block_number_of_transactions: Some(extended.extended_transactions.len() as i64),
        block_hash_header_type: header.hash_header.as_ref().and_then(|f| f.kind.clone()),
        block_hash_header_data: header.hash_header.as_ref().map(BytesField::to_hex),
        block_hash_header_type_prev: header.hash_header_prev.as_ref().and_then(|f| f.kind.clone()),
        block_hash_header_data_prev: header.hash_header_prev.as_ref().map(BytesField::to_hex),
        block_merkle_root_type: header.merkle_root.as_ref().and_then(|f| f.kind.clone()),
        block_merkle_root_data: header.merkle_root.as_ref().map(BytesField::to_hex),
        spider_name: Some(SPIDER_NAME.to_string()),
        spider_version: Some(SPIDER_VERSION.to_string()),
        block_added_timestamp: now,
    })
}

fn new_transaction(
    classified: &ClassifiedTransaction,
    record: &TransactionRecord,
    now: DateTime<Utc>,
) -> NewTransaction {
    NewTransaction {
        transaction_hash: record.hash.clone(),
        transaction_sending_wallet_address: record.sender.0.clone(),
        transaction_receiving_wallet_address: record.recipient.0.clone(),
        transaction_amount_send: record.amount,
        transaction_type: record.kind.as_str().to_string(),
        transaction_block_number: classified.block_number,
        transaction_found: classified.found,
        transaction_result: classified.result.clone(),
        spider_name: SPIDER_NAME.to_string(),
        spider_version: SPIDER_VERSION.to_string(),
        master_addr_type: classified.master_addr_type.clone(),
        master_addr_data: classified.master_addr_data.clone(),
        master_addr_fee: classified.fee,
        public_key_type: classified.public_key_type.clone(),
        public_key_data: classified.public_key_data.clone(),
        signature_type: classified.signature_type.clone(),
        signature_data: classified.signature_data.clone(),
        transaction_nonce: classified.nonce,
        transaction_addrs_to_type: record.addrs_to_type.clone(),
        block_found_datetime: datetime_from_timestamp_seconds(classified.block_timestamp_seconds),
        transaction_added_datetime: now,
        token_symbol: record.token.as_ref().map(|t| t.symbol.clone()),
        token_name: record.token.as_ref().map(|t| t.name.clone()),
        token_owner: record.token.as_ref().map(|t| t.owner.0.clone()),
        token_decimals: record.token.as_ref().map(|t| t.decimals),
    }
}

fn new_wallet_address(
    state: &AddressState,
    requested: &Address,
    first_seen_block: Option<i64>,
    now: DateTime<Utc>,
) -> NewWalletAddress {
    NewWalletAddress {
        wallet_address: state
            .address
            .clone()
            .unwrap_or_else(|| requested.0.clone()),
        address_balance: state.balance,
        address_nonce: state.nonce,
        address_ots_bitfield_used_page: state.ots_bitfield_used_page.unwrap_or(0),
        address_used_ots_key_count: state.used_ots_key_count,
        address_transaction_hash_count: state.transaction_hash_count,
        address_tokens_count: state.tokens_count,
        address_slaves_count: state.slaves_count,
        address_lattice_pk_count: state.lattice_pk_count,
        address_multi_sig_address_count: state.multi_sig_address_count,
        address_multi_sig_spend_count: state.multi_sig_spend_count,
        address_inbox_message_count: state.inbox_message_count,
        address_foundation_multi_sig_spend_txn_hash: crate::explorer::dto::hex_from_value(
            state.foundation_multi_sig_spend_txn_hash.as_ref(),
        ),
        address_foundation_multi_sig_vote_txn_hash: crate::explorer::dto::hex_from_value(
            state.foundation_multi_sig_vote_txn_hash.as_ref(),
        ),
        address_unvotes: crate::explorer::dto::hex_from_value(state.unvotes.as_ref()),
        address_proposal_vote_stats: crate::explorer::dto::hex_from_value(
            state.proposal_vote_stats.as_ref(),
        ),
        address_first_found: Some(now),
        address_first_found_block_num: first_seen_block,
        address_added_datetime: now,
        spider_name: Some(SPIDER_NAME.to_string()),
        spider_version: Some(SPIDER_VERSION.to_string()),
    }
}
