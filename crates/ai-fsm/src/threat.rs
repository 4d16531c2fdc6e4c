use ai_core::{AgentId, Vec3};
use ai_nav::{Hostile, SpatialQuery};
use ai_threat::{FearPurpose, ThreatRegistry};

/// First live hostile of `kind` whose panic range, as seen by `agent` at `position`, covers
/// the distance between them.
pub fn find_nearby_threat<'w, W: SpatialQuery + ?Sized>(
    world: &'w W,
    threats: &ThreatRegistry,
    agent: AgentId,
    position: Vec3,
    kind: &str,
) -> Option<&'w Hostile> {
    world.hostiles().iter().find(|h| {
        h.alive
            && h.kind == kind
            && threats.within_fear_range(FearPurpose::PanicTrigger, agent, position, h)
    })
}
