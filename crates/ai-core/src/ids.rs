//! Stable opaque identifiers.
//!
//! Caches and registries key on these instead of live engine handles, so a despawned object
//! can never alias a fresh one through a dangling reference.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident(pub $inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        $vis struct $name(pub $inner);

        impl $name {
            pub fn stable_id(self) -> u64 {
                self.0 as u64
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// An autonomous crew agent.
    pub struct AgentId(pub u64);
}

typed_id! {
    /// A navigable node of the level's node graph.
    pub struct NodeId(pub u32);
}

typed_id! {
    /// A crossing point between the interior and exterior regions.
    pub struct EntranceId(pub u32);
}

typed_id! {
    /// A hostile on the live roster.
    pub struct HostileId(pub u64);
}

typed_id! {
    /// An inventory item.
    pub struct ItemId(pub u64);
}

typed_id! {
    /// Any object an agent can walk up to and use.
    pub struct InteractableId(pub u64);
}
