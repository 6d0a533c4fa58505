use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable};
use serde::Serialize;

use crate::schema::{
    qrl_blockchain_blocks, qrl_blockchain_missed_items, qrl_blockchain_transactions,
    qrl_wallet_address,
};

pub mod pool;
pub mod repo;

/// Result of an idempotent write. A duplicate key is an expected condition,
/// not an error; failures surface through `crate::error::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Clone, Debug, Serialize, Insertable)]
#[diesel(table_name = qrl_blockchain_blocks)]
pub struct NewBlock {
    pub block_number: i64,
    pub block_found: bool,
    pub block_result: Option<String>,
    pub block_size: i64,
    pub block_found_datetime: Option<DateTime<Utc>>,
    pub block_found_timestamp_seconds: i64,
    pub block_reward_block: i64,
    pub block_reward_fee: i64,
    pub block_mining_nonce: i64,
    pub block_extra_nonce: Option<String>,
    pub block_number_of_transactions: Option<i64>,
    pub block_hash_header_type: Option<String>,
    pub block_hash_header_data: Option<String>,
    pub block_hash_header_type_prev: Option<String>,
    pub block_hash_header_data_prev: Option<String>,
    pub block_merkle_root_type: Option<String>,
    pub block_merkle_root_data: Option<String>,
    pub spider_name: Option<String>,
    pub spider_version: Option<String>,
    pub block_added_timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Insertable)]
#[diesel(table_name = qrl_blockchain_transactions)]
pub struct NewTransaction {
    pub transaction_hash: String,
    pub transaction_sending_wallet_address: String,
    pub transaction_receiving_wallet_address: String,
    pub transaction_amount_send: i64,
    pub transaction_type: String,
    pub transaction_block_number: i64,
    pub transaction_found: bool,
    pub transaction_result: Option<String>,
    pub spider_name: String,
    pub spider_version: String,
    pub master_addr_type: Option<String>,
    pub master_addr_data: Option<String>,
    pub master_addr_fee: i64,
    pub public_key_type: Option<String>,
    pub public_key_data: Option<String>,
    pub signature_type: Option<String>,
    pub signature_data: Option<String>,
    pub transaction_nonce: i64,
    pub transaction_addrs_to_type: Option<String>,
    pub block_found_datetime: DateTime<Utc>,
    pub transaction_added_datetime: DateTime<Utc>,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    pub token_owner: Option<String>,
    pub token_decimals: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Insertable)]
#[diesel(table_name = qrl_wallet_address)]
pub struct NewWalletAddress {
    pub wallet_address: String,
    pub address_balance: i64,
    pub address_nonce: i64,
    pub address_ots_bitfield_used_page: i64,
    pub address_used_ots_key_count: i64,
    pub address_transaction_hash_count: i64,
    pub address_tokens_count: i64,
    pub address_slaves_count: i64,
    pub address_lattice_pk_count: i64,
    pub address_multi_sig_address_count: i64,
    pub address_multi_sig_spend_count: i64,
    pub address_inbox_message_count: i64,
    pub address_foundation_multi_sig_spend_txn_hash: Option<String>,
    pub address_foundation_multi_sig_vote_txn_hash: Option<String>,
    pub address_unvotes: Option<String>,
    pub address_proposal_vote_stats: Option<String>,
    pub address_first_found: Option<DateTime<Utc>>,
    pub address_first_found_block_num: Option<i64>,
    pub address_added_datetime: DateTime<Utc>,
    pub spider_name: Option<String>,
    pub spider_version: Option<String>,
}

/// Current-state columns refreshed on every observation of a known address.
/// First-seen fields and the out-of-band `wallet_custom_name` / `wallet_type`
/// are deliberately absent.
#[derive(Clone, Debug, AsChangeset)]
#[diesel(table_name = qrl_wallet_address, treat_none_as_null = true)]
pub struct WalletStateUpdate {
    pub address_balance: i64,
    pub address_nonce: i64,
    pub address_ots_bitfield_used_page: i64,
    pub address_used_ots_key_count: i64,
    pub address_transaction_hash_count: i64,
    pub address_tokens_count: i64,
    pub address_slaves_count: i64,
    pub address_lattice_pk_count: i64,
    pub address_multi_sig_address_count: i64,
    pub address_multi_sig_spend_count: i64,
    pub address_inbox_message_count: i64,
    pub address_foundation_multi_sig_spend_txn_hash: Option<String>,
    pub address_foundation_multi_sig_vote_txn_hash: Option<String>,
    pub address_unvotes: Option<String>,
    pub address_proposal_vote_stats: Option<String>,
    pub spider_name: Option<String>,
    pub spider_version: Option<String>,
}

impl From<&NewWalletAddress> for WalletStateUpdate {
    fn from(value: &NewWalletAddress) -> Self {
        Self {
            address_balance: value.address_balance,
            address_nonce: value.address_nonce,
            address_ots_bitfield_used_page: value.address_ots_bitfield_used_page,
            address_used_ots_key_count: value.address_used_ots_key_count,
            address_transaction_hash_count: value.address_transaction_hash_count,
            address_tokens_count: value.address_tokens_count,
            address_slaves_count: value.address_slaves_count,
            address_lattice_pk_count: value.address_lattice_pk_count,
            address_multi_sig_address_count: value.address_multi_sig_address_count,
            address_multi_sig_spend_count: value.address_multi_sig_spend_count,
            address_inbox_message_count: value.address_inbox_message_count,
            address_foundation_multi_sig_spend_txn_hash: value
                .address_foundation_multi_sig_spend_txn_hash
                .clone(),
            address_foundation_multi_sig_vote_txn_hash: value
                .address_foundation_multi_sig_vote_txn_hash
                .clone(),
            address_unvotes: value.address_unvotes.clone(),
            address_proposal_vote_stats: value.address_proposal_vote_stats.clone(),
            spider_name: value.spider_name.clone(),
            spider_version: value.spider_version.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Insertable)]
#[diesel(table_name = qrl_blockchain_missed_items)]
pub struct NewMissedItem {
    pub spider_name: String,
    pub spider_version: String,
    pub location_script_file: String,
    pub location_script_function: String,
    pub trace_back: Option<String>,
    pub error_type: String,
    pub error_name: String,
    pub item_url: String,
    pub error_timestamp: DateTime<Utc>,
    pub failed_data: Option<String>,
}

/// A block the staleness audit still considers incomplete.
#[derive(Clone, Debug, Queryable)]
pub struct StaleBlock {
    pub block_number: i64,
    pub block_found_datetime: Option<DateTime<Utc>>,
    pub block_number_of_transactions: Option<i64>,
}
