use ai_core::{EntranceId, HostileId, NodeId, Vec3};
use serde::{Deserialize, Serialize};

/// The two disjoint regions of a level, joined only through crossing points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Interior,
    Exterior,
}

impl Region {
    pub fn from_inside(inside: bool) -> Self {
        if inside {
            Region::Interior
        } else {
            Region::Exterior
        }
    }

    pub fn is_inside(self) -> bool {
        matches!(self, Region::Interior)
    }

    pub fn opposite(self) -> Self {
        match self {
            Region::Interior => Region::Exterior,
            Region::Exterior => Region::Interior,
        }
    }
}

/// A node of the level's pre-baked navigation graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavNode {
    pub id: NodeId,
    pub position: Vec3,
}

impl NavNode {
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id: NodeId(id),
            position,
        }
    }
}

/// A live (or recently killed) hostile on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hostile {
    pub id: HostileId,
    /// Threat-type name, the key into the threat registry.
    pub kind: String,
    pub position: Vec3,
    pub eye_position: Vec3,
    pub alive: bool,
    pub region: Region,
}

impl Hostile {
    pub fn new(id: u64, kind: impl Into<String>, position: Vec3, region: Region) -> Self {
        Self {
            id: HostileId(id),
            kind: kind.into(),
            position,
            eye_position: position,
            alive: true,
            region,
        }
    }

    pub fn with_eye_height(mut self, height: f32) -> Self {
        self.eye_position = self.position.raised(height);
        self
    }

    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

/// Which anchor of a crossing point a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnchorSide {
    /// The side the agent walks up to.
    Entrance,
    /// The side the agent comes out on.
    Exit,
}

/// A traversal link between the interior and the exterior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingPoint {
    pub id: EntranceId,
    pub entry_point: Vec3,
    /// Where the agent lands after crossing; `None` while the level hasn't linked it.
    pub exit_point: Option<Vec3>,
    /// True when crossing moves the agent from the exterior into the interior.
    pub leads_inside: bool,
    pub is_front: bool,
    /// The interior side of this crossing is only reachable through the lift.
    pub lift_served: bool,
}

impl CrossingPoint {
    pub fn new(id: u32, entry_point: Vec3, exit_point: Vec3, leads_inside: bool) -> Self {
        Self {
            id: EntranceId(id),
            entry_point,
            exit_point: Some(exit_point),
            leads_inside,
            is_front: false,
            lift_served: false,
        }
    }

    pub fn front(mut self) -> Self {
        self.is_front = true;
        self
    }

    pub fn served_by_lift(mut self) -> Self {
        self.lift_served = true;
        self
    }

    pub fn unlinked(mut self) -> Self {
        self.exit_point = None;
        self
    }

    pub fn entry_region(&self) -> Region {
        if self.leads_inside {
            Region::Exterior
        } else {
            Region::Interior
        }
    }

    pub fn exit_region(&self) -> Region {
        self.entry_region().opposite()
    }

    /// Position and region of one anchor; `None` if that anchor is unresolved.
    pub fn anchor(&self, side: AnchorSide) -> Option<(Vec3, Region)> {
        match side {
            AnchorSide::Entrance => Some((self.entry_point, self.entry_region())),
            AnchorSide::Exit => self.exit_point.map(|p| (p, self.exit_region())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    /// Walls of fire, spike traps and the like: dangerous to stand next to.
    Solid,
    /// Water, quicksand: dangerous once the head goes under.
    Liquid,
}

/// An axis-aligned hazard volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardVolume {
    pub kind: HazardKind,
    pub min: Vec3,
    pub max: Vec3,
}

impl HazardVolume {
    pub fn new(kind: HazardKind, a: Vec3, b: Vec3) -> Self {
        Self {
            kind,
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        self.closest_point(point) == point
    }
}

/// The lift that serves the interior side of some front entrances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lift {
    pub base_platform: Vec3,
}

/// Leave-early vote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub votes: u32,
    /// Votes needed for the crew to leave early; zero when voting is closed.
    pub required: u32,
}

impl VoteTally {
    pub fn quorum_reached(self) -> bool {
        self.required > 0 && self.votes >= self.required
    }
}
