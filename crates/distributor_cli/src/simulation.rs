//! Drives a [`Distributor`] over an in-memory treasury for a number of epochs.

use crate::settings::SimulationConfig;
use anyhow::{Context, Result};
use ippan_distributor::{
    Amount, Distributor, DistributorConfig, DistributorStatistics, EpochReport, Identity,
    InMemoryTreasury, StaticAuthority, SupplyOracle,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Resolved principals for a simulation run.
#[derive(Debug, Clone, Copy)]
struct Principals {
    staking: Identity,
    governor: Identity,
    guardian: Identity,
}

/// Balance held by one recipient at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientBalance {
    pub index: usize,
    pub recipient: Identity,
    pub final_rate: u64,
    pub balance: Amount,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub initial_supply: Amount,
    pub final_supply: Amount,
    pub bounties: Amount,
    pub epochs: Vec<EpochReport>,
    pub balances: Vec<RecipientBalance>,
    pub statistics: DistributorStatistics,
}

pub struct Simulation {
    distributor: Distributor,
    treasury: Arc<InMemoryTreasury>,
    principals: Principals,
    initial_supply: Amount,
}

impl Simulation {
    /// Build a distributor from `config`, registering recipients, bounty, and
    /// adjustments exactly as the configured governor and guardian would.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let principals = Principals {
            staking: SimulationConfig::identity(&config.principals.staking)?,
            governor: SimulationConfig::identity(&config.principals.governor)?,
            guardian: SimulationConfig::identity(&config.principals.guardian)?,
        };
        let initial_supply = config.initial_supply;
        let treasury = Arc::new(InMemoryTreasury::with_supply(initial_supply));

        let distributor = Distributor::with_treasury(
            DistributorConfig {
                treasury: SimulationConfig::identity(&config.principals.treasury)?,
                token: SimulationConfig::identity(&config.principals.token)?,
                staking: principals.staking,
            },
            treasury.clone(),
            Arc::new(StaticAuthority::new(principals.governor, principals.guardian)),
        )?;

        for recipient in &config.recipients {
            let identity = SimulationConfig::identity(&recipient.identity)?;
            distributor
                .add_recipient(&principals.governor, identity, recipient.rate)
                .with_context(|| format!("adding recipient {}", recipient.identity))?;
        }

        if config.bounty > 0 {
            distributor.set_bounty(&principals.governor, config.bounty)?;
        }

        for adjustment in &config.adjustments {
            let issuer = if adjustment.issuer == "guardian" {
                principals.guardian
            } else {
                principals.governor
            };
            distributor
                .set_adjustment(
                    &issuer,
                    adjustment.index,
                    adjustment.direction()?,
                    adjustment.step,
                    adjustment.target,
                )
                .with_context(|| format!("scheduling adjustment for index {}", adjustment.index))?;
        }

        Ok(Self {
            distributor,
            treasury,
            principals,
            initial_supply,
        })
    }

    pub fn distributor(&self) -> &Distributor {
        &self.distributor
    }

    pub fn treasury(&self) -> &InMemoryTreasury {
        &self.treasury
    }

    /// Run `epochs` epochs, retrieving the bounty before each distribution.
    pub fn run(&self, epochs: u64) -> Result<SimulationReport> {
        let mut reports = Vec::new();
        let mut bounties: Amount = 0;

        for _ in 0..epochs {
            bounties += self.distributor.retrieve_bounty(&self.principals.staking)?;
            let report = self.distributor.distribute(&self.principals.staking)?;
            reports.push(report);
        }

        let final_supply = self.treasury.total_supply()?;
        info!(
            target: "distributor",
            "Simulation finished: {} epochs, supply {} -> {}",
            epochs,
            self.initial_supply,
            final_supply
        );

        let balances = self
            .distributor
            .recipients()
            .into_iter()
            .enumerate()
            .map(|(index, record)| RecipientBalance {
                index,
                recipient: record.recipient,
                final_rate: record.rate,
                balance: self.treasury.balance_of(&record.recipient),
            })
            .collect();

        Ok(SimulationReport {
            initial_supply: self.initial_supply,
            final_supply,
            bounties,
            epochs: reports,
            balances,
            statistics: self.distributor.statistics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AdjustmentConfig, RecipientConfig};

    fn config() -> SimulationConfig {
        SimulationConfig {
            initial_supply: 1_000_000,
            recipients: vec![
                RecipientConfig {
                    identity: "pool-a".to_string(),
                    rate: 1_000,
                },
                RecipientConfig {
                    identity: "pool-b".to_string(),
                    rate: 2_000,
                },
            ],
            adjustments: vec![AdjustmentConfig {
                index: 1,
                direction: "decrease".to_string(),
                step: 50,
                target: 1_900,
                issuer: "guardian".to_string(),
            }],
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn runs_configured_epochs() {
        let simulation = Simulation::from_config(&config()).unwrap();
        let report = simulation.run(3).unwrap();

        assert_eq!(report.epochs.len(), 3);
        assert_eq!(report.statistics.epochs_distributed, 3);
        assert_eq!(report.balances[1].final_rate, 1_900);
        assert_eq!(
            report.final_supply,
            report.initial_supply + report.statistics.total_minted
        );
        assert!(report.balances[0].balance > 0);
    }

    #[test]
    fn guardian_overreach_fails_setup() {
        let mut config = config();
        config.adjustments[0].step = 51;
        let err = Simulation::from_config(&config).err().unwrap();
        assert!(format!("{err:#}").contains("guardian limit"));
    }

    #[test]
    fn unbounded_epoch_count_stops_at_first_failure() {
        let mut config = config();
        config.initial_supply = Amount::MAX;
        let simulation = Simulation::from_config(&config).unwrap();

        let err = simulation.run(u64::MAX).unwrap_err();
        assert!(format!("{err:#}").contains("overflow"));
        assert_eq!(simulation.distributor().epochs_distributed(), 0);
    }

    #[test]
    fn mistyped_identity_fails_setup() {
        let mut config = config();
        let mut mistyped = Identity::derive("pool-a").to_string();
        mistyped.pop();
        mistyped.push('g');
        config.recipients[0].identity = mistyped;

        assert!(Simulation::from_config(&config).is_err());
    }

    #[test]
    fn bounty_is_minted_to_staking() {
        let mut config = config();
        config.bounty = 10;
        let simulation = Simulation::from_config(&config).unwrap();
        let report = simulation.run(2).unwrap();

        assert_eq!(report.bounties, 20);
        assert_eq!(
            simulation
                .treasury()
                .balance_of(&SimulationConfig::identity("staking").unwrap()),
            20
        );
    }
}
