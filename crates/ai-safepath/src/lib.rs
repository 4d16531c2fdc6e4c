//! Safe-destination routing for a single agent.
//!
//! [`SafePathRouter`] is a resumable loop stepped once per update. Each iteration asks the
//! owning state where it wants to go, checks the direct path for danger and falls back
//! through progressively weaker candidates until it can settle on a position.

#![forbid(unsafe_code)]

mod exposure;
mod router;

pub use exposure::{avoidance_zones, is_exposed};
pub use router::{
    RouterPhase, RouterStats, SafePathEnv, SafePathInputs, SafePathRouter, Settlement,
};
