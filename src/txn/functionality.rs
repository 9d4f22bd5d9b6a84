//! Operations and operation subtypes
//!
//! Every fee schedule entry is keyed by an (operation, subtype) pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Operation
// =============================================================================

/// A network operation that can be priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Operation {
    CryptoCreate,
    CryptoTransfer,
    CryptoUpdate,
    CryptoDelete,
    ConsensusCreateTopic,
    ConsensusUpdateTopic,
    ConsensusDeleteTopic,
    ConsensusSubmitMessage,
    TokenCreate,
    TokenMint,
    TokenBurn,
    TokenFeeScheduleUpdate,
    FileCreate,
    FileAppend,
    ContractCall,
}

impl Operation {
    pub const ALL: [Operation; 15] = [
        Operation::CryptoCreate,
        Operation::CryptoTransfer,
        Operation::CryptoUpdate,
        Operation::CryptoDelete,
        Operation::ConsensusCreateTopic,
        Operation::ConsensusUpdateTopic,
        Operation::ConsensusDeleteTopic,
        Operation::ConsensusSubmitMessage,
        Operation::TokenCreate,
        Operation::TokenMint,
        Operation::TokenBurn,
        Operation::TokenFeeScheduleUpdate,
        Operation::FileCreate,
        Operation::FileAppend,
        Operation::ContractCall,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .find(|op| op.to_string() == s)
            .copied()
            .ok_or_else(|| format!("unknown operation: {}", s))
    }
}

// =============================================================================
// Subtype
// =============================================================================

/// Variant of an operation that is priced separately
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubType {
    #[default]
    Default,
    TokenFungibleCommon,
    TokenNonFungibleUnique,
}

impl SubType {
    pub const ALL: [SubType; 3] = [
        SubType::Default,
        SubType::TokenFungibleCommon,
        SubType::TokenNonFungibleUnique,
    ];

    /// Name used in schedules and calibration files
    pub fn as_str(&self) -> &'static str {
        match self {
            SubType::Default => "DEFAULT",
            SubType::TokenFungibleCommon => "TOKEN_FUNGIBLE_COMMON",
            SubType::TokenNonFungibleUnique => "TOKEN_NON_FUNGIBLE_UNIQUE",
        }
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubType::ALL
            .iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown subtype: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_round_trips_through_str() {
        for op in Operation::ALL {
            assert_eq!(op.to_string().parse::<Operation>().unwrap(), op);
        }
        assert!("CryptoTeleport".parse::<Operation>().is_err());
    }

    #[test]
    fn test_subtype_parsing_is_case_insensitive() {
        assert_eq!("default".parse::<SubType>().unwrap(), SubType::Default);
        assert_eq!(
            "TOKEN_FUNGIBLE_COMMON".parse::<SubType>().unwrap(),
            SubType::TokenFungibleCommon
        );
        assert_eq!(
            serde_json::to_string(&SubType::TokenNonFungibleUnique).unwrap(),
            "\"TOKEN_NON_FUNGIBLE_UNIQUE\""
        );
    }
}
