//! In-memory level used by the workspace's tests and benches.

use std::cell::RefCell;
use std::collections::BTreeMap;

use ai_core::{AgentId, DayPhase, Vec3};

use crate::{
    AgentWorld, CancelToken, CrossingPoint, DangerZone, HazardVolume, Hostile, Lift, NavNode,
    PathFault, PathJob, PathJobSender, PathRequest, PathVerdict, Region, SpatialQuery,
    VoteTally,
};

const MATCH_EPSILON_SQ: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct MockAgent {
    pub position: Vec3,
    pub eye_height: f32,
    pub submerged: bool,
    pub on_navmesh: bool,
    pub in_lift: bool,
    pub destination: Option<Vec3>,
    pub teleports: Vec<Vec3>,
}

impl MockAgent {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            eye_height: 1.6,
            submerged: false,
            on_navmesh: true,
            in_lift: false,
            destination: None,
            teleports: Vec::new(),
        }
    }
}

/// Forced outcome for path requests towards one target.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedPath {
    Verdict(PathVerdict),
    Fault(String),
    /// Never resolves until [`MockWorld::resolve_pending`] is called.
    Pending,
}

/// A path request as the facade received it.
#[derive(Debug, Clone)]
pub struct IssuedPath {
    pub from: Vec3,
    pub to: Vec3,
    pub avoid: Vec<DangerZone>,
    pub cancel: CancelToken,
}

#[derive(Default)]
pub struct MockWorld {
    pub interior: Vec<NavNode>,
    pub exterior: Vec<NavNode>,
    pub hostiles: Vec<Hostile>,
    pub crossing_points: Vec<CrossingPoint>,
    pub hazards: Vec<HazardVolume>,
    pub lift: Option<Lift>,
    pub day_phase: DayPhase,
    pub votes: VoteTally,
    pub departure_alerted: bool,
    pub meltdown: Option<bool>,
    /// Sight-blocking boxes as `(min, max)` corners.
    pub blockers: Vec<(Vec3, Vec3)>,
    /// Targets no path can reach.
    pub unreachable: Vec<Vec3>,
    /// Travel distances that differ from the straight line.
    pub path_lengths: Vec<(Vec3, f32)>,
    pub scripted: Vec<(Vec3, ScriptedPath)>,
    pub agents: BTreeMap<AgentId, MockAgent>,
    issued: RefCell<Vec<IssuedPath>>,
    held: RefCell<Vec<PathJobSender>>,
}

impl MockWorld {
    pub fn new() -> Self {
        Self {
            day_phase: DayPhase::Noon,
            ..Self::default()
        }
    }

    pub fn with_agent(mut self, agent: AgentId, position: Vec3) -> Self {
        self.agents.insert(agent, MockAgent::at(position));
        self
    }

    pub fn with_nodes(mut self, region: Region, positions: &[Vec3]) -> Self {
        let list = match region {
            Region::Interior => &mut self.interior,
            Region::Exterior => &mut self.exterior,
        };
        let base = list.len() as u32;
        list.extend(
            positions
                .iter()
                .enumerate()
                .map(|(i, p)| NavNode::new(base + i as u32 + region_offset(region), *p)),
        );
        self
    }

    pub fn agent(&self, agent: AgentId) -> &MockAgent {
        &self.agents[&agent]
    }

    pub fn agent_mut(&mut self, agent: AgentId) -> &mut MockAgent {
        self.agents
            .get_mut(&agent)
            .unwrap_or_else(|| panic!("mock agent {agent} not registered"))
    }

    pub fn script(&mut self, target: Vec3, outcome: ScriptedPath) {
        self.scripted.push((target, outcome));
    }

    pub fn issued(&self) -> Vec<IssuedPath> {
        self.issued.borrow().clone()
    }

    pub fn clear_issued(&self) {
        self.issued.borrow_mut().clear();
    }

    /// Answer every request still held by a [`ScriptedPath::Pending`] script.
    pub fn resolve_pending(&self, verdict: PathVerdict) {
        for sender in self.held.borrow_mut().drain(..) {
            sender.send(Ok(verdict));
        }
    }

    fn scripted_for(&self, target: Vec3) -> Option<&ScriptedPath> {
        self.scripted
            .iter()
            .find(|(p, _)| p.distance_squared(target) < MATCH_EPSILON_SQ)
            .map(|(_, s)| s)
    }

    fn is_unreachable(&self, target: Vec3) -> bool {
        self.unreachable
            .iter()
            .any(|p| p.distance_squared(target) < MATCH_EPSILON_SQ)
    }
}

fn region_offset(region: Region) -> u32 {
    match region {
        Region::Interior => 0,
        Region::Exterior => 10_000,
    }
}

impl SpatialQuery for MockWorld {
    fn nodes(&self, region: Region) -> &[NavNode] {
        match region {
            Region::Interior => &self.interior,
            Region::Exterior => &self.exterior,
        }
    }

    fn sample_navmesh(&self, position: Vec3, _radius: f32) -> Option<Vec3> {
        Some(position)
    }

    fn hostiles(&self) -> &[Hostile] {
        &self.hostiles
    }

    fn crossing_points(&self) -> &[CrossingPoint] {
        &self.crossing_points
    }

    fn hazards(&self) -> &[HazardVolume] {
        &self.hazards
    }

    fn lift(&self) -> Option<&Lift> {
        self.lift.as_ref()
    }

    fn path_distance(&self, from: Vec3, to: Vec3) -> Option<f32> {
        if self.is_unreachable(to) {
            return None;
        }
        let custom = self
            .path_lengths
            .iter()
            .find(|(p, _)| p.distance_squared(to) < MATCH_EPSILON_SQ)
            .map(|(_, len)| *len);
        Some(custom.unwrap_or_else(|| from.distance(to)))
    }

    fn request_path(&self, request: PathRequest) -> PathJob {
        self.issued.borrow_mut().push(IssuedPath {
            from: request.from,
            to: request.to,
            avoid: request.avoid.clone(),
            cancel: request.cancel.clone(),
        });

        match self.scripted_for(request.to) {
            Some(ScriptedPath::Verdict(verdict)) => PathJob::ready(request.cancel, Ok(*verdict)),
            Some(ScriptedPath::Fault(message)) => PathJob::ready(
                request.cancel,
                Err(PathFault::Backend(message.clone())),
            ),
            Some(ScriptedPath::Pending) => {
                let (sender, job) = PathJob::channel(request.cancel);
                self.held.borrow_mut().push(sender);
                job
            }
            None if self.is_unreachable(request.to) => {
                PathJob::ready(request.cancel, Ok(PathVerdict::Unreachable))
            }
            None => {
                let verdict = request.assess_segment();
                PathJob::ready(request.cancel, Ok(verdict))
            }
        }
    }

    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self
            .blockers
            .iter()
            .any(|(min, max)| segment_hits_box(from, to, *min, *max))
    }

    fn day_phase(&self) -> DayPhase {
        self.day_phase
    }

    fn leave_votes(&self) -> VoteTally {
        self.votes
    }

    fn departure_alerted(&self) -> bool {
        self.departure_alerted
    }

    fn meltdown_active(&self) -> Option<bool> {
        self.meltdown
    }
}

impl AgentWorld for MockWorld {
    fn agent_position(&self, agent: AgentId) -> Option<Vec3> {
        self.agents.get(&agent).map(|a| a.position)
    }

    fn agent_eye_position(&self, agent: AgentId) -> Option<Vec3> {
        self.agents
            .get(&agent)
            .map(|a| a.position.raised(a.eye_height))
    }

    fn is_submerged(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|a| a.submerged)
    }

    fn is_on_navmesh(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|a| a.on_navmesh)
    }

    fn is_in_lift(&self, agent: AgentId) -> bool {
        self.agents.get(&agent).is_some_and(|a| a.in_lift)
    }

    fn teleport(&mut self, agent: AgentId, position: Vec3) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.position = position;
            a.teleports.push(position);
        }
    }

    fn set_destination(&mut self, agent: AgentId, position: Vec3) {
        if let Some(a) = self.agents.get_mut(&agent) {
            a.destination = Some(position);
        }
    }
}

/// Slab test of the segment `from → to` against an axis-aligned box.
fn segment_hits_box(from: Vec3, to: Vec3, min: Vec3, max: Vec3) -> bool {
    let dir = to - from;
    let mut t_min = 0.0f32;
    let mut t_max = 1.0f32;

    for (origin, d, lo, hi) in [
        (from.x, dir.x, min.x, max.x),
        (from.y, dir.y, min.y, max.y),
        (from.z, dir.z, min.z, max.z),
    ] {
        if d.abs() <= f32::EPSILON {
            if origin < lo || origin > hi {
                return false;
            }
            continue;
        }
        let inv = 1.0 / d;
        let (t0, t1) = {
            let a = (lo - origin) * inv;
            let b = (hi - origin) * inv;
            if a <= b {
                (a, b)
            } else {
                (b, a)
            }
        };
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return false;
        }
    }
    true
}
