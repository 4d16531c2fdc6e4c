use core::fmt;
use core::str::FromStr;

use ai_core::{AgentId, Vec3};
use ai_nav::Hostile;

use crate::ThreatError;

/// Why a caller is asking how far a threat reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FearPurpose {
    /// Close enough that the agent should drop everything and flee.
    PanicTrigger,
    /// Close enough to warn the rest of the crew over the radio.
    RemoteAlertTrigger,
    /// Radius that paths should route around.
    PathfindAvoid,
}

impl FearPurpose {
    pub const ALL: [FearPurpose; 3] = [
        FearPurpose::PanicTrigger,
        FearPurpose::RemoteAlertTrigger,
        FearPurpose::PathfindAvoid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FearPurpose::PanicTrigger => "panic_trigger",
            FearPurpose::RemoteAlertTrigger => "remote_alert_trigger",
            FearPurpose::PathfindAvoid => "pathfind_avoid",
        }
    }
}

impl fmt::Display for FearPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FearPurpose {
    type Err = ThreatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FearPurpose::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ThreatError::UnknownPurpose(s.to_string()))
    }
}

/// A single fear evaluation request.
#[derive(Debug, Clone, Copy)]
pub struct FearQuery<'a> {
    pub purpose: FearPurpose,
    pub agent: AgentId,
    pub agent_position: Vec3,
    pub threat: &'a Hostile,
    /// Straight-line distance between the agent and the threat.
    pub distance: f32,
}

impl<'a> FearQuery<'a> {
    pub fn new(
        purpose: FearPurpose,
        agent: AgentId,
        agent_position: Vec3,
        threat: &'a Hostile,
    ) -> Self {
        Self {
            purpose,
            agent,
            agent_position,
            threat,
            distance: agent_position.distance(threat.position),
        }
    }
}
