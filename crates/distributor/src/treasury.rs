//! Supply and mint collaborators
//!
//! The distributor never moves value itself. It reads total supply from a
//! [`SupplyOracle`] and asks a [`MintAuthority`] to mint each epoch's rewards.

use crate::types::{Amount, Identity};
use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Reports circulating token supply.
pub trait SupplyOracle: Send + Sync {
    fn total_supply(&self) -> Result<Amount>;
}

/// Performs the actual minting of rewards.
pub trait MintAuthority: Send + Sync {
    fn mint_to(&self, recipient: &Identity, amount: Amount) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct Balances {
    balances: HashMap<Identity, Amount>,
    total_supply: Amount,
}

// -----------------------------------------------------------------------------
// In-memory treasury (simulation and node-local testing)
// -----------------------------------------------------------------------------

/// Treasury whose supply grows with every mint.
#[derive(Debug, Default)]
pub struct InMemoryTreasury {
    state: RwLock<Balances>,
}

impl InMemoryTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_supply(initial_supply: Amount) -> Self {
        Self {
            state: RwLock::new(Balances {
                balances: HashMap::new(),
                total_supply: initial_supply,
            }),
        }
    }

    pub fn balance_of(&self, identity: &Identity) -> Amount {
        self.state.read().balances.get(identity).copied().unwrap_or(0)
    }

    pub fn balances(&self) -> HashMap<Identity, Amount> {
        self.state.read().balances.clone()
    }
}

impl SupplyOracle for InMemoryTreasury {
    fn total_supply(&self) -> Result<Amount> {
        Ok(self.state.read().total_supply)
    }
}

impl MintAuthority for InMemoryTreasury {
    fn mint_to(&self, recipient: &Identity, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        let total_supply = state
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| anyhow!("total supply overflow"))?;
        let balance = state.balances.entry(*recipient).or_insert(0);
        *balance = balance.saturating_add(amount);
        state.total_supply = total_supply;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Mock treasury (deterministic testing)
// -----------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MockState {
    total_supply: Amount,
    mint_calls: Vec<(Identity, Amount)>,
    supply_queries: usize,
    fail_mint_for: Option<Identity>,
    fail_supply: bool,
}

/// Treasury with a fixed supply that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct MockTreasury {
    state: RwLock<MockState>,
}

impl MockTreasury {
    pub fn new(total_supply: Amount) -> Self {
        Self {
            state: RwLock::new(MockState {
                total_supply,
                ..MockState::default()
            }),
        }
    }

    pub fn set_total_supply(&self, total_supply: Amount) {
        self.state.write().total_supply = total_supply;
    }

    /// Fail every mint addressed to `recipient`.
    pub fn fail_mint_for(&self, recipient: Identity) {
        self.state.write().fail_mint_for = Some(recipient);
    }

    pub fn fail_supply_queries(&self, fail: bool) {
        self.state.write().fail_supply = fail;
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.write();
        state.fail_mint_for = None;
        state.fail_supply = false;
    }

    pub fn mint_calls(&self) -> Vec<(Identity, Amount)> {
        self.state.read().mint_calls.clone()
    }

    pub fn minted_to(&self, recipient: &Identity) -> Amount {
        self.state
            .read()
            .mint_calls
            .iter()
            .filter(|(id, _)| id == recipient)
            .map(|(_, amount)| *amount)
            .sum()
    }

    pub fn supply_queries(&self) -> usize {
        self.state.read().supply_queries
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.write();
        state.mint_calls.clear();
        state.supply_queries = 0;
    }
}

impl SupplyOracle for MockTreasury {
    fn total_supply(&self) -> Result<Amount> {
        let mut state = self.state.write();
        state.supply_queries += 1;
        if state.fail_supply {
            return Err(anyhow!("supply oracle unavailable"));
        }
        Ok(state.total_supply)
    }
}

impl MintAuthority for MockTreasury {
    fn mint_to(&self, recipient: &Identity, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        if state.fail_mint_for.as_ref() == Some(recipient) {
            return Err(anyhow!("mint rejected for {}", recipient.short()));
        }
        state.mint_calls.push((*recipient, amount));
        Ok(())
    }
}
