use ai_core::HostileId;
use ai_nav::AgentWorld;

use crate::{BehaviorState, StateSeed};

/// Constructors for the states the machine itself falls back to.
pub trait StateCatalog<W>: 'static
where
    W: AgentWorld + 'static,
{
    fn return_to_base(&self, seed: StateSeed<W>) -> Box<dyn BehaviorState<W>>;

    /// `seed.threat` is already set to `threat`.
    fn panic(&self, seed: StateSeed<W>, threat: HostileId) -> Box<dyn BehaviorState<W>>;
}
