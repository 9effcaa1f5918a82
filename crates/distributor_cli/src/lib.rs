//! Configuration and simulation driver for the `ippan-distributor` binary.

pub mod settings;
pub mod simulation;

pub use settings::{AdjustmentConfig, PrincipalsConfig, RecipientConfig, SimulationConfig};
pub use simulation::{Simulation, SimulationReport};
