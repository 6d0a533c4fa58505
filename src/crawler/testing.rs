//! In-memory fakes for driver-level tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::db::repo::Repo;
use crate::db::{
    NewBlock, NewMissedItem, NewTransaction, NewWalletAddress, StaleBlock, UpsertOutcome,
};
use crate::error::{Error, Result};
use crate::explorer::dto::{
    AddressResponse, AddressState, BlockResponse, NodeInfo, NodeStateResponse, TransactionResponse,
};
use crate::explorer::ExplorerApi;
use crate::qrl::datetime_from_timestamp_seconds;

pub fn block_fixture(number: i64, tx_hashes: &[&str]) -> BlockResponse {
    let transactions: Vec<serde_json::Value> = tx_hashes
        .iter()
        .map(|hash| json!({"tx": {"transaction_hash": {"data": hex::decode(hash).unwrap()}}}))
        .collect();

    serde_json::from_value(json!({
        "found": true,
        "result": null,
        "block_extended": {
            "size": 431,
            "header": {
                "hash_header": {"type": "Buffer", "data": [1]},
                "hash_header_prev": {"type": "Buffer", "data": [2]},
                "merkle_root": {"type": "Buffer", "data": [3]},
                "block_number": number,
                "timestamp_seconds": 1601000000,
                "reward_block": 6656953806i64,
                "reward_fee": 0,
                "mining_nonce": 330
            },
            "extended_transactions": transactions
        }
    }))
    .unwrap()
}

pub fn transaction_fixture(
    block_number: i64,
    hash: &str,
    sender_hex: &str,
    recipients: &[(&str, i64)],
) -> TransactionResponse {
    let addrs_to: Vec<serde_json::Value> = recipients
        .iter()
        .map(|(addr, _)| json!({"type": "Buffer", "data": hex::decode(addr).unwrap()}))
        .collect();
    let amounts: Vec<i64> = recipients.iter().map(|&(_, amount)| amount).collect();

    serde_json::from_value(json!({
        "found": true,
        "result": null,
        "transaction": {
            "header": {"block_number": block_number, "timestamp_seconds": 1601000000},
            "addr_from": {"type": "Buffer", "data": hex::decode(sender_hex).unwrap()},
            "tx": {
                "transactionType": "transfer",
                "nonce": 1,
                "fee": 1000,
                "transaction_hash": {"data": hex::decode(hash).unwrap()},
                "transfer": {"addrs_to": addrs_to, "amounts": amounts}
            }
        }
    }))
    .unwrap()
}

#[derive(Default)]
struct ExplorerState {
    blocks: HashMap<i64, BlockResponse>,
    transactions: HashMap<String, TransactionResponse>,
    failing_transactions: HashSet<String>,
    fetched_blocks: Vec<i64>,
    fetched_transactions: Vec<String>,
    fetched_addresses: Vec<String>,
}

pub struct TestExplorer {
    height: i64,
    state: Mutex<ExplorerState>,
}

impl TestExplorer {
    pub fn with_height(height: i64) -> Self {
        Self {
            height,
            state: Mutex::new(ExplorerState::default()),
        }
    }

    pub fn put_block(&self, number: i64, response: BlockResponse) {
        self.state.lock().unwrap().blocks.insert(number, response);
    }

    pub fn put_transaction(&self, hash: &str, response: TransactionResponse) {
        self.state
            .lock()
            .unwrap()
            .transactions
            .insert(hash.to_string(), response);
    }

    pub fn fail_transaction(&self, hash: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_transactions
            .insert(hash.to_string());
    }

    pub fn unfail_transaction(&self, hash: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_transactions
            .remove(hash);
    }

    pub fn fetched_blocks(&self) -> Vec<i64> {
        self.state.lock().unwrap().fetched_blocks.clone()
    }

    pub fn fetched_transactions(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched_transactions.clone()
    }

    pub fn fetched_addresses(&self) -> Vec<String> {
        self.state.lock().unwrap().fetched_addresses.clone()
    }
}

#[async_trait]
impl ExplorerApi for TestExplorer {
    async fn node_state(&self) -> Result<NodeStateResponse> {
        Ok(NodeStateResponse {
            info: NodeInfo {
                block_height: self.height,
            },
        })
    }

    async fn block(&self, number: i64) -> Result<BlockResponse> {
        let mut state = self.state.lock().unwrap();
        state.fetched_blocks.push(number);
        Ok(state.blocks.get(&number).cloned().unwrap_or(BlockResponse {
            found: false,
            result: None,
            block_extended: None,
        }))
    }

    async fn transaction(&self, hash: &str) -> Result<TransactionResponse> {
        let mut state = self.state.lock().unwrap();
        state.fetched_transactions.push(hash.to_string());
        if state.failing_transactions.contains(hash) {
            return Err(Error::HttpStatusError(self.transaction_url(hash), 500));
        }
        Ok(state
            .transactions
            .get(hash)
            .cloned()
            .unwrap_or(TransactionResponse {
                found: false,
                result: None,
                transaction: None,
            }))
    }

    async fn address(&self, address: &str) -> Result<AddressResponse> {
        let mut state = self.state.lock().unwrap();
        state.fetched_addresses.push(address.to_string());
        Ok(AddressResponse {
            found: true,
            state: Some(AddressState {
                address: Some(address.to_string()),
                balance: 42,
                nonce: 1,
                ots_bitfield_used_page: Some(0),
                used_ots_key_count: 1,
                transaction_hash_count: 1,
                tokens_count: 0,
                slaves_count: 0,
                lattice_pk_count: 0,
                multi_sig_address_count: 0,
                multi_sig_spend_count: 0,
                inbox_message_count: 0,
                foundation_multi_sig_spend_txn_hash: None,
                foundation_multi_sig_vote_txn_hash: None,
                unvotes: None,
                proposal_vote_stats: None,
            }),
        })
    }

    async fn emission(&self) -> Result<String> {
        Ok("105469066.187392".to_string())
    }

    fn node_state_url(&self) -> String {
        "http://node.test/GetNodeState".to_string()
    }

    fn emission_url(&self) -> String {
        "http://explorer.test/api/emission".to_string()
    }

    fn block_url(&self, number: i64) -> String {
        format!("http://explorer.test/api/block/{}", number)
    }

    fn transaction_url(&self, hash: &str) -> String {
        format!("http://explorer.test/api/tx/{}", hash)
    }

    fn address_url(&self, address: &str) -> String {
        format!("http://explorer.test/api/a/{}", address)
    }
}

#[derive(Default)]
struct RepoState {
    blocks: BTreeMap<i64, NewBlock>,
    completed_blocks: HashSet<i64>,
    transactions: HashMap<(String, String), NewTransaction>,
    wallets: HashMap<String, NewWalletAddress>,
    missed: Vec<NewMissedItem>,
    emission: Option<String>,
}

#[derive(Default)]
pub struct TestRepo {
    state: Mutex<RepoState>,
}

impl TestRepo {
    /// Seed a stored block directly, bypassing the crawl path. The found
    /// datetime is set well in the past so staleness checks see it.
    pub fn seed_block(&self, number: i64, tx_count: i64) {
        let block = NewBlock {
            block_number: number,
            block_found: true,
            block_result: None,
            block_size: 0,
            block_found_datetime: Some(datetime_from_timestamp_seconds(1_500_000_000)),
            block_found_timestamp_seconds: 1_500_000_000,
            block_reward_block: 0,
            block_reward_fee: 0,
            block_mining_nonce: 0,
            block_extra_nonce: None,
            block_number_of_transactions: Some(tx_count),
            block_hash_header_type: None,
            block_hash_header_data: None,
            block_hash_header_type_prev: None,
            block_hash_header_data_prev: None,
            block_merkle_root_type: None,
            block_merkle_root_data: None,
            spider_name: None,
            spider_version: None,
            block_added_timestamp: Utc::now(),
        };
        self.state.lock().unwrap().blocks.insert(number, block);
    }

    pub fn seed_missed_item(&self, url: &str) {
        let item = NewMissedItem {
            spider_name: "seed".to_string(),
            spider_version: "0".to_string(),
            location_script_file: "seed".to_string(),
            location_script_function: "seed".to_string(),
            trace_back: None,
            error_type: "HttpStatusError".to_string(),
            error_name: "seeded failure".to_string(),
            item_url: url.to_string(),
            error_timestamp: Utc::now(),
            failed_data: None,
        };
        self.state.lock().unwrap().missed.push(item);
    }

    pub fn block_count_sync(&self) -> usize {
        self.state.lock().unwrap().blocks.len()
    }

    pub fn transaction_rows(&self) -> usize {
        self.state.lock().unwrap().transactions.len()
    }

    pub fn wallet_rows(&self) -> usize {
        self.state.lock().unwrap().wallets.len()
    }

    pub fn missed_rows(&self) -> usize {
        self.state.lock().unwrap().missed.len()
    }

    pub fn missed_urls(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .missed
            .iter()
            .map(|item| item.item_url.clone())
            .collect()
    }

    pub fn completed_blocks(&self) -> Vec<i64> {
        let mut completed: Vec<i64> = self
            .state
            .lock()
            .unwrap()
            .completed_blocks
            .iter()
            .copied()
            .collect();
        completed.sort();
        completed
    }

    pub fn wallet(&self, address: &str) -> Option<NewWalletAddress> {
        self.state.lock().unwrap().wallets.get(address).cloned()
    }
}

#[async_trait]
impl Repo for TestRepo {
    async fn insert_block(&self, block: NewBlock) -> Result<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.blocks.contains_key(&block.block_number) {
            Ok(UpsertOutcome::Duplicate)
        } else {
            state.blocks.insert(block.block_number, block);
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        let key = (
            transaction.transaction_hash.clone(),
            transaction.transaction_receiving_wallet_address.clone(),
        );
        if state.transactions.contains_key(&key) {
            Ok(UpsertOutcome::Duplicate)
        } else {
            state.transactions.insert(key, transaction);
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn upsert_wallet_address(&self, wallet: NewWalletAddress) -> Result<UpsertOutcome> {
        let mut state = self.state.lock().unwrap();
        if state.wallets.contains_key(&wallet.wallet_address) {
            let existing = state.wallets.get_mut(&wallet.wallet_address).unwrap();
            let first_found = existing.address_first_found;
            let first_found_block = existing.address_first_found_block_num;
            let added = existing.address_added_datetime;
            *existing = wallet;
            existing.address_first_found = first_found;
            existing.address_first_found_block_num = first_found_block;
            existing.address_added_datetime = added;
            Ok(UpsertOutcome::Duplicate)
        } else {
            state
                .wallets
                .insert(wallet.wallet_address.clone(), wallet);
            Ok(UpsertOutcome::Inserted)
        }
    }

    async fn insert_missed_item(&self, item: NewMissedItem) -> Result<()> {
        self.state.lock().unwrap().missed.push(item);
        Ok(())
    }

    async fn upsert_emission(&self, emission: String) -> Result<()> {
        self.state.lock().unwrap().emission = Some(emission);
        Ok(())
    }

    async fn highest_block_number(&self) -> Result<Option<i64>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .blocks
            .keys()
            .next_back()
            .copied())
    }

    async fn block_count(&self) -> Result<i64> {
        Ok(self.state.lock().unwrap().blocks.len() as i64)
    }

    async fn stored_block_numbers(&self) -> Result<Vec<i64>> {
        Ok(self.state.lock().unwrap().blocks.keys().copied().collect())
    }

    async fn stale_incomplete_blocks(&self, cutoff: DateTime<Utc>) -> Result<Vec<StaleBlock>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .blocks
            .values()
            .filter(|block| !state.completed_blocks.contains(&block.block_number))
            .filter(|block| {
                block
                    .block_found_datetime
                    .map(|found| found < cutoff)
                    .unwrap_or(false)
            })
            .map(|block| StaleBlock {
                block_number: block.block_number,
                block_found_datetime: block.block_found_datetime,
                block_number_of_transactions: block.block_number_of_transactions,
            })
            .collect())
    }

    async fn distinct_transaction_count(&self, block_number: i64) -> Result<i64> {
        let state = self.state.lock().unwrap();
        let distinct: HashSet<&String> = state
            .transactions
            .values()
            .filter(|tx| tx.transaction_block_number == block_number)
            .map(|tx| &tx.transaction_hash)
            .collect();
        Ok(distinct.len() as i64)
    }

    async fn mark_block_complete(&self, block_number: i64) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .completed_blocks
            .insert(block_number);
        Ok(())
    }

    async fn failed_transaction_urls(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut seen = HashSet::new();
        Ok(state
            .missed
            .iter()
            .map(|item| item.item_url.clone())
            .filter(|url| url.contains("/tx/"))
            .filter(|url| seen.insert(url.clone()))
            .collect())
    }

    async fn delete_missed_items_for_url(&self, url: String) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .missed
            .retain(|item| item.item_url != url);
        Ok(())
    }
}
