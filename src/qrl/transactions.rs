use itertools::{EitherOrBoth, Itertools};

use super::{Address, UNKNOWN};
use crate::error::{Error, Result};
use crate::explorer::dto::{BytesField, TransactionResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Transfer,
    Coinbase,
    Slave,
    Token,
    Other(String),
}

impl TransactionKind {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("transfer") => TransactionKind::Transfer,
            Some("coinbase") => TransactionKind::Coinbase,
            Some("slave") => TransactionKind::Slave,
            Some("token") => TransactionKind::Token,
            Some(other) => TransactionKind::Other(other.to_string()),
            None => TransactionKind::Other(UNKNOWN.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Coinbase => "coinbase",
            TransactionKind::Slave => "slave",
            TransactionKind::Token => "token",
            TransactionKind::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub owner: Address,
    pub decimals: i64,
}

/// One (recipient, amount) leg of a classified transaction. A transfer with
/// N recipients produces N of these sharing the same hash and sender.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub kind: TransactionKind,
    pub hash: String,
    pub sender: Address,
    pub recipient: Address,
    pub amount: i64,
    pub addrs_to_type: Option<String>,
    pub token: Option<TokenInfo>,
}

#[derive(Debug, Clone)]
pub struct ClassifiedTransaction {
    pub block_number: i64,
    pub block_timestamp_seconds: i64,
    pub found: bool,
    pub result: Option<String>,
    pub nonce: i64,
    pub fee: i64,
    pub master_addr_type: Option<String>,
    pub master_addr_data: Option<String>,
    pub public_key_type: Option<String>,
    pub public_key_data: Option<String>,
    pub signature_type: Option<String>,
    pub signature_data: Option<String>,
    pub records: Vec<TransactionRecord>,
    pub referenced_addresses: Vec<Address>,
}

/// Normalizes a transaction envelope into insertable records plus the wallet
/// addresses it references. Missing or malformed sub-fields degrade to
/// `UNKNOWN` / zero so a single mangled transaction cannot take the crawl
/// down with it; only an envelope with no transaction body at all is an
/// error.
pub fn classify_transaction(response: &TransactionResponse) -> Result<ClassifiedTransaction> {
    let envelope = response
        .transaction
        .as_ref()
        .ok_or_else(|| Error::InvalidResponse("transaction envelope missing".to_string()))?;
    let tx = envelope
        .tx
        .as_ref()
        .ok_or_else(|| Error::InvalidResponse("transaction body missing".to_string()))?;

    let (block_number, block_timestamp_seconds) = envelope
        .header
        .as_ref()
        .map(|header| (header.block_number, header.timestamp_seconds))
        .unwrap_or((0, 0));

    let sender = envelope
        .addr_from
        .as_ref()
        .map(BytesField::to_address)
        .unwrap_or_else(Address::unknown);
    let hash = tx
        .transaction_hash
        .as_ref()
        .map(BytesField::to_hex)
        .unwrap_or_else(|| UNKNOWN.to_string());
    let kind = TransactionKind::from_raw(tx.transaction_type.as_deref());

    let mut records = Vec::new();
    let mut referenced_addresses = vec![sender.clone()];

    let record = |recipient: Address,
                  amount: i64,
                  addrs_to_type: Option<String>,
                  token: Option<TokenInfo>| {
        TransactionRecord {
            kind: kind.clone(),
            hash: hash.clone(),
            sender: sender.clone(),
            recipient,
            amount,
            addrs_to_type,
            token,
        }
    };

    match &kind {
        TransactionKind::Transfer => {
            let transfer = tx.transfer.clone().unwrap_or_default();
            for pair in transfer.addrs_to.iter().zip_longest(transfer.amounts.iter()) {
                let (addr_field, amount) = match pair {
                    EitherOrBoth::Both(field, &amount) => (field, amount),
                    EitherOrBoth::Left(field) => (field, 0),
                    // an amount without a recipient has nowhere to go
                    EitherOrBoth::Right(_) => continue,
                };
                let recipient = addr_field.to_address();
                referenced_addresses.push(recipient.clone());
                records.push(record(recipient, amount, addr_field.kind.clone(), None));
            }
        }
        TransactionKind::Coinbase => {
            let coinbase = tx.coinbase.clone().unwrap_or_default();
            let recipient = coinbase
                .addr_to
                .as_ref()
                .map(BytesField::to_address)
                .unwrap_or_else(Address::unknown);
            let addrs_to_type = coinbase.addr_to.as_ref().and_then(|f| f.kind.clone());
            referenced_addresses.push(recipient.clone());
            records.push(record(recipient, coinbase.amount, addrs_to_type, None));
        }
        TransactionKind::Slave => {
            let slave = tx.slave.clone().unwrap_or_default();
            for slave_pk in &slave.slave_pks {
                // no value moves; the key bytes stand in for the address
                let recipient = slave_pk.to_address();
                referenced_addresses.push(recipient.clone());
                records.push(record(recipient, 0, None, None));
            }
        }
        TransactionKind::Token => {
            let token = tx.token.clone().unwrap_or_default();
            let owner = token
                .owner
                .as_ref()
                .map(BytesField::to_address)
                .unwrap_or_else(Address::unknown);
            let info = TokenInfo {
                symbol: token
                    .symbol
                    .as_ref()
                    .map(BytesField::to_utf8_lossy)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                name: token
                    .name
                    .as_ref()
                    .map(BytesField::to_utf8_lossy)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
                owner: owner.clone(),
                decimals: token.decimals,
            };
            referenced_addresses.push(owner);
            for balance in &token.initial_balances {
                let recipient = balance
                    .address
                    .as_ref()
                    .map(BytesField::to_address)
                    .unwrap_or_else(Address::unknown);
                referenced_addresses.push(recipient.clone());
                records.push(record(recipient, balance.amount, None, Some(info.clone())));
            }
        }
        TransactionKind::Other(_) => {}
    }

    // a malformed body still yields one inspectable row
    if records.is_empty() {
        records.push(record(Address::unknown(), 0, None, None));
    }

    let referenced_addresses = referenced_addresses
        .into_iter()
        .filter(|address| address.0 != UNKNOWN)
        .unique()
        .collect();

    Ok(ClassifiedTransaction {
        block_number,
        block_timestamp_seconds,
        found: response.found,
        result: response.result.clone(),
        nonce: tx.nonce,
        fee: tx.fee,
        master_addr_type: tx.master_addr.as_ref().and_then(|f| f.kind.clone()),
        master_addr_data: tx.master_addr.as_ref().map(BytesField::to_hex),
        public_key_type: tx.public_key.as_ref().and_then(|f| f.kind.clone()),
        public_key_data: tx.public_key.as_ref().map(BytesField::to_hex),
        signature_type: tx.signature.as_ref().and_then(|f| f.kind.clone()),
        signature_data: tx.signature.as_ref().map(BytesField::to_hex),
        records,
        referenced_addresses,
    })
}
