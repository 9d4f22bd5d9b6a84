//! Transaction accessor
//!
//! A decoded view of a transaction with exactly the fields fee
//! computation and charging need. Wire-format decoding happens upstream.

use crate::txn::functionality::{Operation, SubType};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default validity window of a transaction, in seconds
pub const DEFAULT_VALID_DURATION_SECS: i64 = 120;

/// Longest validity window honoured when checking expiry
const MAX_VALID_DURATION_SECS: i64 = 180;

// =============================================================================
// Account ID
// =============================================================================

/// Ledger account identifier (`shard.realm.num`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    pub shard: u64,
    pub realm: u64,
    pub num: u64,
}

impl AccountId {
    /// Account `shard.realm.num`
    pub const fn new(shard: u64, realm: u64, num: u64) -> Self {
        Self { shard, realm, num }
    }

    /// Account in shard 0, realm 0
    pub const fn num(num: u64) -> Self {
        Self::new(0, 0, num)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for AccountId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(format!("invalid account id: {}", s));
        }
        let parse = |part: &str| {
            part.parse::<u64>()
                .map_err(|_| format!("invalid account id: {}", s))
        };
        Ok(Self::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?))
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_string()
    }
}

// =============================================================================
// Transaction ID
// =============================================================================

/// Transaction identifier: payer plus valid start time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId {
    pub payer: AccountId,
    pub valid_start: DateTime<Utc>,
}

impl TransactionId {
    /// Id of a transaction paid by `payer` and valid from `valid_start`
    pub fn new(payer: AccountId, valid_start: DateTime<Utc>) -> Self {
        Self { payer, valid_start }
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}.{:09}",
            self.payer,
            self.valid_start.timestamp(),
            self.valid_start.timestamp_subsec_nanos()
        )
    }
}

// =============================================================================
// Keys and signatures
// =============================================================================

/// A (possibly composite) key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Ed25519(#[serde(with = "hex_bytes")] Vec<u8>),
    Secp256k1(#[serde(with = "hex_bytes")] Vec<u8>),
    KeyList(Vec<Key>),
    Threshold { threshold: u32, keys: Vec<Key> },
}

impl Key {
    /// Number of primitive keys reachable from this key
    pub fn num_simple_keys(&self) -> u64 {
        match self {
            Key::Ed25519(_) | Key::Secp256k1(_) => 1,
            Key::KeyList(keys) | Key::Threshold { keys, .. } => {
                keys.iter().map(Key::num_simple_keys).sum()
            }
        }
    }
}

/// One entry of a signature map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigPair {
    #[serde(with = "hex_bytes")]
    pub pub_key_prefix: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

impl SigPair {
    /// Bytes of prefix plus signature
    pub fn size(&self) -> u64 {
        (self.pub_key_prefix.len() + self.signature.len()) as u64
    }
}

// =============================================================================
// Operation metadata
// =============================================================================

/// Operation-specific facts the usage assessors need
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpMeta {
    #[default]
    None,
    SubmitMessage {
        num_msg_bytes: u64,
    },
    CryptoTransfer {
        #[serde(default)]
        tokens_involved: u32,
        #[serde(default)]
        token_transfers: u32,
        #[serde(default)]
        nft_transfers: u32,
    },
}

// =============================================================================
// Transaction Accessor
// =============================================================================

/// Decoded transaction as seen by the fee subsystem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxnAccessor {
    pub txn_id: TransactionId,
    #[serde(default = "default_valid_duration")]
    pub valid_duration_secs: i64,
    /// Node the client addressed the transaction to
    pub node_account: AccountId,
    pub function: Operation,
    #[serde(default)]
    pub subtype: SubType,
    #[serde(default)]
    pub memo: String,
    /// Maximum fee the payer is willing to pay, in tinybars
    pub offered_fee: u64,
    #[serde(default)]
    pub num_explicit_transfers: u32,
    #[serde(default)]
    pub sig_map: Vec<SigPair>,
    pub payer_key: Key,
    #[serde(default)]
    pub op_meta: OpMeta,
}

fn default_valid_duration() -> i64 {
    DEFAULT_VALID_DURATION_SECS
}

impl TxnAccessor {
    /// Account paying the fees
    pub fn payer(&self) -> AccountId {
        self.txn_id.payer
    }

    /// Number of signatures in the signature map
    pub fn num_sig_pairs(&self) -> u64 {
        self.sig_map.len() as u64
    }

    /// Total bytes of the signature map
    pub fn sig_map_size(&self) -> u64 {
        self.sig_map.iter().map(SigPair::size).sum()
    }

    /// Length of the memo in UTF-8 bytes
    pub fn memo_utf8_bytes(&self) -> u64 {
        self.memo.len() as u64
    }

    /// Last instant at which the transaction may reach consensus
    pub fn valid_until(&self) -> DateTime<Utc> {
        let duration = Duration::seconds(self.valid_duration_secs.clamp(0, MAX_VALID_DURATION_SECS));
        self.txn_id
            .valid_start
            .checked_add_signed(duration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Serde adapter encoding byte vectors as hex strings
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
