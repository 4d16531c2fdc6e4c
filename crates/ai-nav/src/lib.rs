//! Spatial query facade, level data and cancellable path jobs.
//!
//! The behavior engine consumes the level through [`SpatialQuery`] and drives agents through
//! [`AgentWorld`]. Long-running path queries are represented by [`PathJob`]s that the
//! cooperative thread polls once per update.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod job;
pub mod level;
pub mod world;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use job::{
    CancelToken, DangerZone, PathFault, PathJob, PathJobSender, PathPoll, PathRequest,
    PathResult, PathSlot, PathVerdict,
};
pub use level::{
    AnchorSide, CrossingPoint, HazardKind, HazardVolume, Hostile, Lift, NavNode, Region,
    VoteTally,
};
pub use world::{AgentWorld, SpatialQuery};
