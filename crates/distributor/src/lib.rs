//! IPPAN Distributor
//!
//! Rate-based epoch emission to a small set of registered recipients:
//! - Per-epoch rewards of `rate` ppm of total supply, minted through an
//!   injected treasury
//! - Governed, stepwise adjustment of each recipient's rate toward a target
//! - Guardian adjustments rank-limited to 2.5% of the current rate
//! - Index-stable registry with logical removal

pub mod authority;
pub mod engine;
pub mod errors;
pub mod registry;
pub mod treasury;
pub mod types;

pub use authority::{authorize, Action, AuthorizationProvider, Role, StaticAuthority};
pub use engine::{reward_from_supply, Distributor, DistributorConfig, DistributorSnapshot};
pub use errors::{DistributorError, Result};
pub use registry::{guardian_step_limit, RecipientRegistry, SlotSnapshot};
pub use treasury::{InMemoryTreasury, MintAuthority, MockTreasury, SupplyOracle};
pub use types::*;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
