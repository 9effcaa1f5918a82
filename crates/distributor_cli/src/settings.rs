//! Simulation configuration
//!
//! Loaded from an optional TOML file layered under `IPPAN_DISTRIBUTOR_*`
//! environment overrides (nested keys separated by `__`).

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File as ConfigFile};
use ippan_distributor::{Amount, Direction, Identity};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const ENV_PREFIX: &str = "IPPAN_DISTRIBUTOR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub log_level: String,
    /// `pretty` or `plain`
    pub log_format: String,
    pub epochs: u64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub initial_supply: Amount,
    /// Minted to the staking principal ahead of each epoch
    #[serde(deserialize_with = "deserialize_amount")]
    pub bounty: Amount,
    pub principals: PrincipalsConfig,
    pub recipients: Vec<RecipientConfig>,
    pub adjustments: Vec<AdjustmentConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            epochs: 10,
            initial_supply: 1_000_000_000,
            bounty: 0,
            principals: PrincipalsConfig::default(),
            recipients: Vec::new(),
            adjustments: Vec::new(),
        }
    }
}

/// Identities are either encoded (`i` + 64 hex) or labels to derive from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalsConfig {
    pub treasury: String,
    pub token: String,
    pub staking: String,
    pub governor: String,
    pub guardian: String,
}

impl Default for PrincipalsConfig {
    fn default() -> Self {
        Self {
            treasury: "treasury".to_string(),
            token: "token".to_string(),
            staking: "staking".to_string(),
            governor: "governor".to_string(),
            guardian: "guardian".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientConfig {
    pub identity: String,
    pub rate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    pub index: usize,
    pub direction: String,
    pub step: u64,
    pub target: u64,
    /// `governor` or `guardian`
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_issuer() -> String {
    "governor".to_string()
}

/// Amounts may exceed what a TOML integer holds, so decimal strings are
/// accepted alongside integers.
fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Amount;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integer or decimal string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Amount, E> {
            Ok(Amount::from(value))
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> std::result::Result<Amount, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Amount, E> {
            Amount::try_from(value).map_err(|_| E::custom(format!("amount {value} is negative")))
        }

        fn visit_i128<E: de::Error>(self, value: i128) -> std::result::Result<Amount, E> {
            Amount::try_from(value).map_err(|_| E::custom(format!("amount {value} is negative")))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Amount, E> {
            value
                .trim()
                .replace('_', "")
                .parse()
                .map_err(|_| E::custom(format!("invalid amount '{value}'")))
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

impl AdjustmentConfig {
    pub fn direction(&self) -> Result<Direction> {
        self.direction
            .parse()
            .map_err(|err: String| anyhow::anyhow!(err))
    }
}

impl SimulationConfig {
    /// Load configuration from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                bail!("Configuration file {} not found", path.display());
            }
            builder = builder.add_source(ConfigFile::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: SimulationConfig = builder
            .build()
            .context("failed to read distributor configuration")?
            .try_deserialize()
            .context("failed to parse distributor configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !matches!(self.log_format.as_str(), "pretty" | "plain") {
            bail!("log_format must be 'pretty' or 'plain', got '{}'", self.log_format);
        }

        for (name, value) in [
            ("treasury", &self.principals.treasury),
            ("token", &self.principals.token),
            ("staking", &self.principals.staking),
            ("governor", &self.principals.governor),
            ("guardian", &self.principals.guardian),
        ] {
            if value.trim().is_empty() {
                bail!("principal '{name}' must not be empty");
            }
            Self::identity(value).with_context(|| format!("principal '{name}'"))?;
        }

        for (i, recipient) in self.recipients.iter().enumerate() {
            if recipient.identity.trim().is_empty() {
                bail!("recipient #{i} has an empty identity");
            }
            Self::identity(&recipient.identity).with_context(|| format!("recipient #{i}"))?;
        }

        for adjustment in &self.adjustments {
            adjustment
                .direction()
                .with_context(|| format!("adjustment for index {}", adjustment.index))?;
            if !matches!(adjustment.issuer.as_str(), "governor" | "guardian") {
                bail!(
                    "adjustment issuer must be 'governor' or 'guardian', got '{}'",
                    adjustment.issuer
                );
            }
        }

        Ok(())
    }

    pub fn identity(value: &str) -> Result<Identity> {
        let value = value.trim();
        Identity::parse_or_derive(value)
            .with_context(|| format!("malformed encoded identity '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_toml_file() {
        let file = write_config(
            r#"
epochs = 3
initial_supply = 5000000
bounty = 7

[principals]
governor = "dao"

[[recipients]]
identity = "staking-pool"
rate = 4000

[[adjustments]]
index = 0
direction = "decrease"
step = 100
target = 3500
issuer = "guardian"
"#,
        );

        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.epochs, 3);
        assert_eq!(config.initial_supply, 5_000_000);
        assert_eq!(config.bounty, 7);
        assert_eq!(config.principals.governor, "dao");
        assert_eq!(config.principals.staking, "staking");
        assert_eq!(config.recipients[0].rate, 4_000);
        assert_eq!(config.adjustments[0].direction().unwrap(), Direction::Decrease);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = SimulationConfig::load(Some(Path::new("/nonexistent/distributor.toml")))
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn adjustment_issuer_defaults_to_governor() {
        let file = write_config(
            r#"
[[adjustments]]
index = 0
direction = "increase"
step = 1
target = 2
"#,
        );
        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.adjustments[0].issuer, "governor");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.log_format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.adjustments.push(AdjustmentConfig {
            index: 0,
            direction: "sideways".to_string(),
            step: 1,
            target: 1,
            issuer: default_issuer(),
        });
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.principals.staking = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn identity_accepts_labels_and_encoded() {
        let encoded = Identity::derive("pool").to_string();
        assert_eq!(SimulationConfig::identity(&encoded).unwrap(), Identity::derive("pool"));
        assert_eq!(SimulationConfig::identity(" pool ").unwrap(), Identity::derive("pool"));
    }

    #[test]
    fn validate_rejects_mistyped_encoded_identity() {
        let mut mistyped = Identity::derive("pool").to_string();
        mistyped.pop();
        mistyped.push('g');

        let mut config = SimulationConfig::default();
        config.recipients.push(RecipientConfig {
            identity: mistyped.clone(),
            rate: 1_000,
        });
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("recipient #0"));

        let mut config = SimulationConfig::default();
        config.principals.staking = mistyped;
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("principal 'staking'"));
    }

    #[test]
    fn amounts_accept_values_beyond_u64() {
        let file = write_config(
            r#"
initial_supply = "20_000_000_000_000_000_000_000"
bounty = 7
"#,
        );
        let config = SimulationConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.initial_supply, 20_000_000_000_000_000_000_000u128);
        assert!(config.initial_supply > Amount::from(u64::MAX));
        assert_eq!(config.bounty, 7);

        let file = write_config("bounty = -1\n");
        assert!(SimulationConfig::load(Some(file.path())).is_err());
    }
}
