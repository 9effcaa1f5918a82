//! Distribution engine
//!
//! Mints each active recipient's per-epoch reward and steps its rate toward
//! any pending adjustment target. The registry, adjustment slots, and running
//! totals sit behind one mutex that every operation holds for its whole
//! duration, so a `distribute` traversal is observed as a single unit.

use crate::authority::{authorize, Action, AuthorizationProvider, Role};
use crate::errors::{DistributorError, Result};
use crate::registry::{guardian_step_limit, RecipientRegistry, SlotSnapshot};
use crate::treasury::{MintAuthority, SupplyOracle};
use crate::types::{
    AdjustmentRecord, Amount, Direction, DistributorStatistics, EpochIndex, EpochReport, Identity,
    Payout, Rate, RecipientRecord, MAX_BOUNTY, RATE_DENOMINATOR,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reward for `rate` ppm of `supply`, truncated. `None` on overflow.
pub fn reward_from_supply(supply: Amount, rate: Rate) -> Option<Amount> {
    supply
        .checked_mul(rate as u128)
        .map(|scaled| scaled / RATE_DENOMINATOR)
}

/// Principals fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// Supply and mint authority
    pub treasury: Identity,
    /// Token whose supply rewards are measured against
    pub token: Identity,
    /// Sole caller allowed to trigger epochs and retrieve the bounty
    pub staking: Identity,
}

impl DistributorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.treasury.is_zero() {
            return Err(DistributorError::InvalidConfiguration("treasury identity is zero"));
        }
        if self.token.is_zero() {
            return Err(DistributorError::InvalidConfiguration("token identity is zero"));
        }
        if self.staking.is_zero() {
            return Err(DistributorError::InvalidConfiguration("staking identity is zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DistributorState {
    registry: RecipientRegistry,
    epochs_distributed: EpochIndex,
    total_minted: Amount,
    total_bounties: Amount,
    bounty: Amount,
}

/// Serializable point-in-time view of the distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorSnapshot {
    pub config: DistributorConfig,
    pub epochs_distributed: EpochIndex,
    pub bounty: Amount,
    pub slots: Vec<SlotSnapshot>,
}

pub struct Distributor {
    config: DistributorConfig,
    supply: Arc<dyn SupplyOracle>,
    minter: Arc<dyn MintAuthority>,
    authority: Arc<dyn AuthorizationProvider>,
    state: Mutex<DistributorState>,
}

impl Distributor {
    pub fn new(
        config: DistributorConfig,
        supply: Arc<dyn SupplyOracle>,
        minter: Arc<dyn MintAuthority>,
        authority: Arc<dyn AuthorizationProvider>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            target: "distributor",
            treasury = %config.treasury.short(),
            token = %config.token.short(),
            staking = %config.staking.short(),
            "Distributor initialised"
        );
        Ok(Self {
            config,
            supply,
            minter,
            authority,
            state: Mutex::new(DistributorState::default()),
        })
    }

    /// Convenience constructor for a treasury acting as both supply oracle and minter.
    pub fn with_treasury<T>(
        config: DistributorConfig,
        treasury: Arc<T>,
        authority: Arc<dyn AuthorizationProvider>,
    ) -> Result<Self>
    where
        T: SupplyOracle + MintAuthority + 'static,
    {
        Self::new(config, treasury.clone(), treasury, authority)
    }

    pub fn config(&self) -> &DistributorConfig {
        &self.config
    }

    fn authorize(&self, caller: &Identity, action: Action) -> Result<Role> {
        authorize(
            self.authority.as_ref(),
            &self.config.staking,
            caller,
            action,
        )
    }

    // -------------------------------------------------------------------------
    // Epoch processing
    // -------------------------------------------------------------------------

    /// Run one epoch: mint every active recipient's reward, then step its rate.
    ///
    /// Slots with a zero rate are skipped without minting or adjusting. A
    /// collaborator failure aborts the remaining traversal; recipients already
    /// paid this epoch keep their reward and their applied adjustment step.
    pub fn distribute(&self, caller: &Identity) -> Result<EpochReport> {
        self.authorize(caller, Action::Distribute)?;

        let mut state = self.state.lock();
        let epoch = state.epochs_distributed + 1;
        let mut report = EpochReport {
            epoch,
            ..EpochReport::default()
        };

        for index in 0..state.registry.len() {
            let record = *state.registry.get(index)?;
            if !record.is_active() {
                continue;
            }

            let reward = self.reward_at(record.rate).map_err(|err| {
                error!(target: "distributor", epoch, index, "Reward computation failed: {}", err);
                err
            })?;

            self.minter
                .mint_to(&record.recipient, reward)
                .map_err(|err| {
                    error!(
                        target: "distributor",
                        epoch,
                        index,
                        recipient = %record.recipient.short(),
                        "Mint failed, aborting epoch: {:#}",
                        err
                    );
                    DistributorError::external("mint", err)
                })?;

            state.total_minted = state.total_minted.saturating_add(reward);
            report.total_minted = report.total_minted.saturating_add(reward);
            report.payouts.push(Payout {
                index,
                recipient: record.recipient,
                rate: record.rate,
                reward,
            });
            debug!(
                target: "distributor",
                epoch,
                index,
                "Minted {} to {} at {} ppm",
                reward,
                record.recipient.short(),
                record.rate
            );

            if let Some(step) = state.registry.adjust(index) {
                debug!(
                    target: "distributor",
                    epoch,
                    index,
                    converged = step.converged,
                    "Adjusted rate {} -> {}",
                    step.from,
                    step.to
                );
                report.adjustments.push(step);
            }
        }

        state.epochs_distributed = epoch;
        info!(
            target: "distributor",
            "Epoch {}: minted {} across {} recipients ({} adjustments)",
            epoch,
            report.total_minted,
            report.payouts.len(),
            report.adjustments.len()
        );

        Ok(report)
    }

    fn reward_at(&self, rate: Rate) -> Result<Amount> {
        let supply = self
            .supply
            .total_supply()
            .map_err(|err| DistributorError::external("total supply query", err))?;
        reward_from_supply(supply, rate).ok_or(DistributorError::CalculationOverflow("next reward"))
    }

    /// Reward minted for `rate` ppm against the current total supply.
    pub fn next_reward_at(&self, rate: Rate) -> Result<Amount> {
        self.reward_at(rate)
    }

    /// Next reward for the last registry entry held by `identity`, zero if none.
    pub fn next_reward_for(&self, identity: &Identity) -> Result<Amount> {
        let rate = self.state.lock().registry.last_rate_for(identity);
        match rate {
            Some(rate) => self.reward_at(rate),
            None => Ok(0),
        }
    }

    /// Mint the configured bounty to the staking principal.
    pub fn retrieve_bounty(&self, caller: &Identity) -> Result<Amount> {
        self.authorize(caller, Action::RetrieveBounty)?;

        let mut state = self.state.lock();
        let bounty = state.bounty;
        if bounty > 0 {
            self.minter
                .mint_to(&self.config.staking, bounty)
                .map_err(|err| DistributorError::external("bounty mint", err))?;
            state.total_bounties = state.total_bounties.saturating_add(bounty);
            debug!(target: "distributor", "Minted bounty {} to staking", bounty);
        }
        Ok(bounty)
    }

    // -------------------------------------------------------------------------
    // Governed mutations
    // -------------------------------------------------------------------------

    /// Append a recipient. Governor only.
    pub fn add_recipient(&self, caller: &Identity, recipient: Identity, rate: Rate) -> Result<usize> {
        self.authorize(caller, Action::AddRecipient)?;
        if recipient.is_zero() {
            return Err(DistributorError::InvalidRecipient);
        }

        let index = self
            .state
            .lock()
            .registry
            .push(RecipientRecord::new(recipient, rate));
        info!(
            target: "distributor",
            index,
            recipient = %recipient.short(),
            "Added recipient at {} ppm",
            rate
        );
        Ok(index)
    }

    /// Zero the slot at `index`. `recipient` must match the stored identity.
    pub fn remove_recipient(
        &self,
        caller: &Identity,
        index: usize,
        recipient: &Identity,
    ) -> Result<RecipientRecord> {
        let role = self.authorize(caller, Action::RemoveRecipient)?;
        let removed = self.state.lock().registry.remove(index, recipient)?;
        info!(
            target: "distributor",
            index,
            recipient = %removed.recipient.short(),
            ?role,
            "Removed recipient (was {} ppm)",
            removed.rate
        );
        Ok(removed)
    }

    /// Replace the adjustment at `index`. Guardian steps are capped at 2.5% of
    /// the current rate; governor steps are unrestricted.
    pub fn set_adjustment(
        &self,
        caller: &Identity,
        index: usize,
        direction: Direction,
        step: Rate,
        target: Rate,
    ) -> Result<()> {
        let role = self.authorize(caller, Action::SetAdjustment)?;

        let mut state = self.state.lock();
        let rate = state.registry.get(index)?.rate;
        if role == Role::Guardian {
            let limit = guardian_step_limit(rate);
            if step > limit {
                return Err(DistributorError::StepTooLarge { step, limit, rate });
            }
        }

        let adjustment = AdjustmentRecord::new(direction, step, target);
        state.registry.set_adjustment(index, adjustment)?;
        info!(
            target: "distributor",
            index,
            ?role,
            "Adjustment set: {} by {} toward {} (current {})",
            direction,
            step,
            target,
            rate
        );
        Ok(())
    }

    /// Set the per-call bounty. Governor only, capped at [`MAX_BOUNTY`].
    pub fn set_bounty(&self, caller: &Identity, bounty: Amount) -> Result<()> {
        self.authorize(caller, Action::SetBounty)?;
        if bounty > MAX_BOUNTY {
            return Err(DistributorError::BountyTooLarge {
                bounty,
                max: MAX_BOUNTY,
            });
        }
        self.state.lock().bounty = bounty;
        info!(target: "distributor", "Bounty set to {}", bounty);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn recipient(&self, index: usize) -> Result<RecipientRecord> {
        self.state.lock().registry.get(index).copied()
    }

    pub fn adjustment(&self, index: usize) -> Result<AdjustmentRecord> {
        self.state.lock().registry.adjustment(index).copied()
    }

    pub fn recipients(&self) -> Vec<RecipientRecord> {
        self.state
            .lock()
            .registry
            .iter()
            .map(|(_, record)| *record)
            .collect()
    }

    pub fn registry_len(&self) -> usize {
        self.state.lock().registry.len()
    }

    pub fn bounty(&self) -> Amount {
        self.state.lock().bounty
    }

    pub fn epochs_distributed(&self) -> EpochIndex {
        self.state.lock().epochs_distributed
    }

    pub fn snapshot(&self) -> DistributorSnapshot {
        let state = self.state.lock();
        DistributorSnapshot {
            config: self.config,
            epochs_distributed: state.epochs_distributed,
            bounty: state.bounty,
            slots: state.registry.snapshot(),
        }
    }

    pub fn statistics(&self) -> DistributorStatistics {
        let state = self.state.lock();
        DistributorStatistics {
            epochs_distributed: state.epochs_distributed,
            total_minted: state.total_minted,
            total_bounties: state.total_bounties,
            registry_len: state.registry.len(),
            active_recipients: state.registry.active_count(),
            pending_adjustments: state.registry.pending_adjustments(),
        }
    }
}
