//! Per-agent behavior state machine.
//!
//! A [`StateMachine`] owns one active [`BehaviorState`] per agent. States are an open set:
//! the embedding game implements the trait for each behavior, and hands the machine a
//! [`StateCatalog`] for the two states the core itself needs to reach (return-to-base and
//! panic). Entrance discovery, entrance safety and threat lookups are shared helpers any
//! state can call.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod context;
pub mod directive;
pub mod entrance;
pub mod error;
pub mod items;
pub mod machine;
pub mod search;
pub mod state;
pub mod threat;

pub use catalog::StateCatalog;
pub use context::AgentContext;
pub use directive::{parse_directive, MessageDirective};
pub use entrance::{
    can_path_to_entrance, find_closest_entrance, is_covered_in_hazard, EntranceSafetyCache,
};
pub use error::StateError;
pub use items::{HeldItem, Interactable, InteractableKind, ItemCapability, ItemUse};
pub use machine::{update_machines, StateMachine};
pub use search::SearchRoutine;
pub use state::{
    default_message_directive, default_should_crouch, default_should_return_to_base,
    recover_from_stuck, BehaviorState, Crouch, Directive, PreviousOverride, StateCore,
    StateKind, StateSeed, Transition,
};
pub use threat::find_nearby_threat;
