//! Core type definitions for tokenbook.
//!
//! Account identifiers, token amounts, the two event records kept by the
//! ledger, and the token configuration object.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Placeholder identity for "no account", the origin of minted supply.
pub const ZERO_ADDRESS: &str = "0x0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("Cannot parse amount: {0}")]
    Parse(String),
}

/// Identity of an account (or contract) as the runtime names it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        AccountId(id.into())
    }

    pub fn zero() -> Self {
        AccountId(ZERO_ADDRESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty identity cannot act as a sender.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        AccountId::new(id)
    }
}

impl From<String> for AccountId {
    fn from(id: String) -> Self {
        AccountId(id)
    }
}

/// Unsigned token amount.
///
/// Arithmetic is checked: subtraction that would go below zero and addition
/// past `u128::MAX` return `None` instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn new(raw: u128) -> Self {
        Amount(raw)
    }

    pub const fn raw(&self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl From<u128> for Amount {
    fn from(raw: u128) -> Self {
        Amount(raw)
    }
}

impl From<u64> for Amount {
    fn from(raw: u64) -> Self {
        Amount(raw as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Amount)
            .map_err(|_| AmountError::Parse(s.to_string()))
    }
}

// JSON clients lose precision above 2^53, so human-readable formats carry the
// amount as a decimal string. Binary formats keep the raw u128.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(&self.0)
        } else {
            serializer.serialize_u128(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = Amount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
                Ok(Amount(v as u128))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Amount, E> {
                Ok(Amount(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
                u128::try_from(v)
                    .map(Amount)
                    .map_err(|_| E::custom("amount cannot be negative"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
                v.parse().map_err(E::custom)
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_any(AmountVisitor)
        } else {
            deserializer.deserialize_u128(AmountVisitor)
        }
    }
}

/// A movement of tokens, including mints and zero-value transfers.
///
/// `spender` is whoever executed the transfer: the holder itself for a direct
/// transfer, the delegate for a delegated one, and the zero address for a mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub spender: AccountId,
    pub from: AccountId,
    pub to: AccountId,
    pub value: Amount,
}

/// A change to the allowance `owner` grants `spender`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: AccountId,
    pub spender: AccountId,
    pub old_value: Amount,
    pub value: Amount,
}

/// Token customization accepted by `customize`.
///
/// Every field is optional in serialized form and falls back to the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Display name, default "Solidus Wonder Token".
    pub name: String,
    /// Ticker, default "SWT".
    pub symbol: String,
    /// Decimal places used when rendering amounts, default 2.
    pub decimals: u8,
    /// Supply minted to the bank by `initialize`, default 100_000_000.
    pub supply: Amount,
    /// Tokens per native coin, default 100.
    pub exchange_rate: u8,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Solidus Wonder Token".to_string(),
            symbol: "SWT".to_string(),
            decimals: 2,
            supply: Amount::new(100_000_000),
            exchange_rate: 100,
        }
    }
}
