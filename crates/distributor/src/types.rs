//! Core types for rate-based epoch distribution

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Token amount in the smallest unit.
pub type Amount = u128;

/// Emission rate in parts-per-million of total supply per epoch.
pub type Rate = u64;

/// Epoch counter, incremented on every successful distribution.
pub type EpochIndex = u64;

/// One million ppm == the whole supply.
pub const RATE_DENOMINATOR: u128 = 1_000_000;

/// Guardian adjustments are limited to `rate * 25 / 1000` (2.5%) per step.
pub const GUARDIAN_STEP_NUMER: u128 = 25;
pub const GUARDIAN_STEP_DENOM: u128 = 1000;

/// Largest bounty the governor may configure.
pub const MAX_BOUNTY: Amount = 2_000_000_000;

/// Number of raw bytes in an identity.
pub const IDENTITY_BYTES: usize = 32;
/// Encoded identity length (prefix + 64 hex chars).
pub const IDENTITY_STRING_LENGTH: usize = 1 + IDENTITY_BYTES * 2;

/// Errors that can occur when parsing an identity string.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity must start with 'i'")]
    InvalidPrefix,
    #[error("identity must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("identity payload is not valid hexadecimal")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Opaque principal identifier (account address).
///
/// Encoded as `i` followed by the hex form of the raw bytes. The all-zero
/// identity is the null principal and marks logically removed registry slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(pub [u8; IDENTITY_BYTES]);

impl Identity {
    pub const ZERO: Identity = Identity([0u8; IDENTITY_BYTES]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; IDENTITY_BYTES]
    }

    /// Deterministically derive an identity from a human readable label.
    pub fn derive(label: &str) -> Self {
        Identity(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Whether `value` has the shape of an encoded identity (prefix and length).
    pub fn looks_encoded(value: &str) -> bool {
        value.starts_with('i') && value.len() == IDENTITY_STRING_LENGTH
    }

    /// Accept either an encoded identity or a label to derive one from.
    ///
    /// Values shaped like an encoded identity must decode; a malformed payload
    /// is an error rather than a label.
    pub fn parse_or_derive(value: &str) -> Result<Self, IdentityError> {
        if Self::looks_encoded(value) {
            value.parse()
        } else {
            Ok(Self::derive(value))
        }
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> String {
        format!("i{}…", hex::encode(&self.0[..4]))
    }
}

impl From<[u8; IDENTITY_BYTES]> for Identity {
    fn from(value: [u8; IDENTITY_BYTES]) -> Self {
        Identity(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", hex::encode(self.0))
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('i') {
            return Err(IdentityError::InvalidPrefix);
        }
        if s.len() != IDENTITY_STRING_LENGTH {
            return Err(IdentityError::InvalidLength {
                expected: IDENTITY_STRING_LENGTH,
                actual: s.len(),
            });
        }
        let mut bytes = [0u8; IDENTITY_BYTES];
        hex::decode_to_slice(&s[1..], &mut bytes)?;
        Ok(Identity(bytes))
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A registered reward recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientRecord {
    pub recipient: Identity,
    /// ppm of total supply minted to the recipient per epoch
    pub rate: Rate,
}

impl RecipientRecord {
    pub fn new(recipient: Identity, rate: Rate) -> Self {
        Self { recipient, rate }
    }

    /// Slots with a zero rate receive nothing and are never adjusted.
    pub fn is_active(&self) -> bool {
        self.rate > 0
    }

    pub fn is_removed(&self) -> bool {
        self.recipient.is_zero() && self.rate == 0
    }
}

/// Direction of a scheduled rate change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Increase,
    Decrease,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "increase" | "add" | "up" => Ok(Direction::Increase),
            "decrease" | "sub" | "down" => Ok(Direction::Decrease),
            other => Err(format!("unknown adjustment direction: {other}")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increase => f.write_str("increase"),
            Direction::Decrease => f.write_str("decrease"),
        }
    }
}

/// Pending per-index rate change, applied one step per epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub direction: Direction,
    /// ppm added or removed per epoch; zero means inactive
    pub step: Rate,
    pub target: Rate,
}

impl AdjustmentRecord {
    pub fn new(direction: Direction, step: Rate, target: Rate) -> Self {
        Self {
            direction,
            step,
            target,
        }
    }

    pub fn is_active(&self) -> bool {
        self.step > 0
    }
}

/// Reward minted to one recipient during an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub index: usize,
    pub recipient: Identity,
    pub rate: Rate,
    pub reward: Amount,
}

/// One applied adjustment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentStep {
    pub index: usize,
    pub from: Rate,
    pub to: Rate,
    /// The adjustment reached its target and was disabled.
    pub converged: bool,
}

/// Outcome of a single `distribute` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: EpochIndex,
    pub payouts: Vec<Payout>,
    pub adjustments: Vec<AdjustmentStep>,
    pub total_minted: Amount,
}

/// Summary statistics about the distributor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorStatistics {
    pub epochs_distributed: EpochIndex,
    pub total_minted: Amount,
    pub total_bounties: Amount,
    pub registry_len: usize,
    pub active_recipients: usize,
    pub pending_adjustments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_display_parses_back() {
        let id = Identity::derive("staking");
        let encoded = id.to_string();
        assert!(encoded.starts_with('i'));
        assert_eq!(encoded.len(), IDENTITY_STRING_LENGTH);
        assert_eq!(encoded.parse::<Identity>().unwrap(), id);
    }

    #[test]
    fn identity_parse_rejects_malformed_input() {
        let bad_prefix = "x".to_string() + &"00".repeat(IDENTITY_BYTES);
        assert!(matches!(
            bad_prefix.parse::<Identity>(),
            Err(IdentityError::InvalidPrefix)
        ));

        let short = "i".to_string() + &"00".repeat(IDENTITY_BYTES - 1);
        assert!(matches!(
            short.parse::<Identity>(),
            Err(IdentityError::InvalidLength { .. })
        ));

        let not_hex = format!("i{}", "zz".repeat(IDENTITY_BYTES));
        assert!(matches!(
            not_hex.parse::<Identity>(),
            Err(IdentityError::InvalidHex(_))
        ));
    }

    #[test]
    fn parse_or_derive_falls_back_to_label() {
        assert_eq!(Identity::parse_or_derive("dao").unwrap(), Identity::derive("dao"));
        let id = Identity::derive("dao");
        assert_eq!(Identity::parse_or_derive(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn parse_or_derive_rejects_mistyped_encoding() {
        let mut encoded = Identity::derive("pool").to_string();
        encoded.pop();
        encoded.push('g');

        assert!(Identity::looks_encoded(&encoded));
        assert!(matches!(
            Identity::parse_or_derive(&encoded),
            Err(IdentityError::InvalidHex(_))
        ));

        // Wrong length is still treated as a label.
        encoded.pop();
        assert_eq!(
            Identity::parse_or_derive(&encoded).unwrap(),
            Identity::derive(&encoded)
        );
    }

    #[test]
    fn identity_serializes_as_string() {
        let id = Identity::derive("treasury");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn zero_identity_and_inactive_records() {
        assert!(Identity::ZERO.is_zero());
        assert!(!Identity::derive("x").is_zero());
        assert!(!AdjustmentRecord::default().is_active());
        assert!(RecipientRecord::new(Identity::ZERO, 0).is_removed());
        assert!(!RecipientRecord::new(Identity::derive("x"), 0).is_active());
    }

    #[test]
    fn direction_parses_aliases() {
        assert_eq!("Increase".parse::<Direction>().unwrap(), Direction::Increase);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Decrease);
        assert!("sideways".parse::<Direction>().is_err());
    }
}
