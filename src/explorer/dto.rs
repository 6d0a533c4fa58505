//! Wire types for the explorer API. Byte arrays arrive as
//! `{"type": ..., "data": [ints]}` objects and numeric fields may be JSON
//! numbers or decimal strings depending on the endpoint, so everything
//! numeric goes through a tolerant deserializer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::qrl::Address;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BytesField {
    #[serde(rename = "type", default, deserialize_with = "opt_string_from_any")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl BytesField {
    pub fn to_hex(&self) -> String {
        hex::encode(&self.data)
    }

    pub fn to_address(&self) -> Address {
        Address::from_bytes(&self.data)
    }

    pub fn to_utf8_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeStateResponse {
    pub info: NodeInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeInfo {
    #[serde(deserialize_with = "i64_from_any")]
    pub block_height: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmissionResponse {
    #[serde(deserialize_with = "string_from_any")]
    pub emission: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub result: Option<String>,
    pub block_extended: Option<BlockExtended>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockExtended {
    #[serde(default, deserialize_with = "i64_from_any")]
    pub size: i64,
    pub header: BlockHeader,
    #[serde(default)]
    pub extended_transactions: Vec<ExtendedTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub hash_header: Option<BytesField>,
    pub hash_header_prev: Option<BytesField>,
    pub merkle_root: Option<BytesField>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub block_number: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub timestamp_seconds: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub reward_block: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub reward_fee: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub mining_nonce: i64,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub extra_nonce: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendedTransaction {
    pub tx: Option<TxBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub result: Option<String>,
    pub transaction: Option<TransactionEnvelope>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionEnvelope {
    pub header: Option<TxHeader>,
    pub addr_from: Option<BytesField>,
    pub tx: Option<TxBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxHeader {
    #[serde(default, deserialize_with = "i64_from_any")]
    pub block_number: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub timestamp_seconds: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxBody {
    #[serde(rename = "transactionType", default, deserialize_with = "opt_string_from_any")]
    pub transaction_type: Option<String>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub nonce: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub fee: i64,
    pub master_addr: Option<BytesField>,
    pub public_key: Option<BytesField>,
    pub signature: Option<BytesField>,
    pub transaction_hash: Option<BytesField>,
    pub transfer: Option<TransferBody>,
    pub coinbase: Option<CoinbaseBody>,
    pub slave: Option<SlaveBody>,
    pub token: Option<TokenBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferBody {
    #[serde(default)]
    pub addrs_to: Vec<BytesField>,
    #[serde(default, deserialize_with = "vec_i64_from_any")]
    pub amounts: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoinbaseBody {
    pub addr_to: Option<BytesField>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub amount: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlaveBody {
    #[serde(default)]
    pub slave_pks: Vec<BytesField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenBody {
    pub symbol: Option<BytesField>,
    pub name: Option<BytesField>,
    pub owner: Option<BytesField>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub decimals: i64,
    #[serde(default)]
    pub initial_balances: Vec<InitialBalance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitialBalance {
    pub address: Option<BytesField>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressResponse {
    #[serde(default)]
    pub found: bool,
    pub state: Option<AddressState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressState {
    #[serde(default, deserialize_with = "opt_string_from_any")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub balance: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub nonce: i64,
    #[serde(default, deserialize_with = "opt_i64_from_any")]
    pub ots_bitfield_used_page: Option<i64>,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub used_ots_key_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub transaction_hash_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub tokens_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub slaves_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub lattice_pk_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub multi_sig_address_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub multi_sig_spend_count: i64,
    #[serde(default, deserialize_with = "i64_from_any")]
    pub inbox_message_count: i64,
    #[serde(default)]
    pub foundation_multi_sig_spend_txn_hash: Option<Value>,
    #[serde(default)]
    pub foundation_multi_sig_vote_txn_hash: Option<Value>,
    #[serde(default)]
    pub unvotes: Option<Value>,
    #[serde(default)]
    pub proposal_vote_stats: Option<Value>,
}

/// Hex-encode a JSON byte-array value; anything else maps to `None`.
pub fn hex_from_value(value: Option<&Value>) -> Option<String> {
    let array = value?.as_array()?;
    let bytes = array
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect::<Option<Vec<u8>>>()?;
    Some(hex::encode(bytes))
}

fn i64_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_u64().map(|u| u as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn i64_from_any<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    i64_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected an integer, got {}", value)))
}

fn opt_i64_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(i64_from_value(&value))
}

fn vec_i64_from_any<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .iter()
        .map(|v| i64_from_value(v).unwrap_or_default())
        .collect())
}

fn string_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
