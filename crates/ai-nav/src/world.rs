use ai_core::{AgentId, DayPhase, NodeId, Vec3};

use crate::{
    CrossingPoint, HazardVolume, Hostile, Lift, NavNode, PathJob, PathRequest, Region, VoteTally,
};

/// Read-only view of the level, consumed by the behavior engine.
///
/// The engine never builds node graphs or samples navmeshes itself; a host game implements
/// this on top of its own level services.
pub trait SpatialQuery {
    fn nodes(&self, region: Region) -> &[NavNode];

    /// Nearest node of `region` to `position`, skipping `exclude`.
    fn nearest_node(
        &self,
        region: Region,
        position: Vec3,
        exclude: Option<NodeId>,
    ) -> Option<NavNode> {
        self.nodes(region)
            .iter()
            .filter(|node| Some(node.id) != exclude)
            .min_by(|a, b| {
                a.position
                    .distance_squared(position)
                    .total_cmp(&b.position.distance_squared(position))
            })
            .copied()
    }

    /// Project `position` onto the navmesh within `radius`.
    fn sample_navmesh(&self, position: Vec3, radius: f32) -> Option<Vec3>;

    fn hostiles(&self) -> &[Hostile];

    fn crossing_points(&self) -> &[CrossingPoint];

    /// Currently active hazard volumes.
    fn hazards(&self) -> &[HazardVolume];

    fn lift(&self) -> Option<&Lift> {
        None
    }

    /// Travel distance along the navmesh, `None` when no path exists.
    fn path_distance(&self, from: Vec3, to: Vec3) -> Option<f32>;

    /// Start an asynchronous, danger-aware path query.
    fn request_path(&self, request: PathRequest) -> PathJob;

    /// Linecast against the level's sight-blocking collision mask.
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool;

    fn day_phase(&self) -> DayPhase;

    fn leave_votes(&self) -> VoteTally;

    fn departure_alerted(&self) -> bool;

    /// Facility meltdown state from an optional integration; `None` when it isn't present.
    fn meltdown_active(&self) -> Option<bool> {
        None
    }
}

/// The actor and navigation controller side of an agent.
pub trait AgentWorld: SpatialQuery {
    fn agent_position(&self, agent: AgentId) -> Option<Vec3>;

    fn agent_eye_position(&self, agent: AgentId) -> Option<Vec3>;

    fn is_submerged(&self, agent: AgentId) -> bool;

    fn is_on_navmesh(&self, agent: AgentId) -> bool;

    fn is_in_lift(&self, agent: AgentId) -> bool;

    fn teleport(&mut self, agent: AgentId, position: Vec3);

    fn set_destination(&mut self, agent: AgentId, position: Vec3);
}
