//! Engine-agnostic primitives for the crew-bot behavior engine.
//!
//! Everything here is plain data: vector math, stable identifiers, the per-update tick
//! context, the simulated day cycle and the tunable [`AiConfig`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod ids;
pub mod math;
pub mod tick;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{
    AiConfig, DirectiveConfig, EntranceConfig, ReturnConfig, SafePathConfig, StateConfig,
    ThreatConfig, ThreatEntry, TickConfig,
};
pub use error::ConfigError;
pub use ids::{AgentId, EntranceId, HostileId, InteractableId, ItemId, NodeId};
pub use math::Vec3;
pub use tick::{DayPhase, TickContext};
