use ai_core::{AgentId, Vec3};
use ai_nav::{AgentWorld, DangerZone, Hostile, Region, SpatialQuery};
use ai_threat::{FearPurpose, ThreatRegistry};

pub(crate) fn live_hostiles<W: SpatialQuery + ?Sized>(
    world: &W,
    region: Region,
) -> impl Iterator<Item = &Hostile> {
    world
        .hostiles()
        .iter()
        .filter(move |h| h.alive && h.region == region)
}

/// Danger zones for path queries: every live hostile of `region` that wants to be avoided,
/// sized by its pathfind-avoid range as seen from `position`.
pub fn avoidance_zones<W: SpatialQuery + ?Sized>(
    world: &W,
    threats: &ThreatRegistry,
    agent: AgentId,
    position: Vec3,
    region: Region,
) -> Vec<DangerZone> {
    live_hostiles(world, region)
        .filter_map(|h| {
            let radius = threats.fear_range(FearPurpose::PathfindAvoid, agent, position, h)?;
            Some(DangerZone {
                center: h.position,
                radius,
            })
        })
        .collect()
}

/// Whether a live hostile of `region` is within its avoidance range of the agent and can
/// see the agent's eye point.
pub fn is_exposed<W: AgentWorld + ?Sized>(
    world: &W,
    threats: &ThreatRegistry,
    agent: AgentId,
    region: Region,
) -> bool {
    let (Some(position), Some(eye)) = (world.agent_position(agent), world.agent_eye_position(agent))
    else {
        return false;
    };
    live_hostiles(world, region).any(|h| {
        threats.within_fear_range(FearPurpose::PathfindAvoid, agent, position, h)
            && world.line_of_sight(h.eye_position, eye)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_nav::testing::MockWorld;
    use ai_threat::ThreatDescriptor;

    const AGENT: AgentId = AgentId(3);

    fn registry() -> ThreatRegistry {
        ThreatRegistry::new()
            .with(ThreatDescriptor::new("bracken").with_range(FearPurpose::PathfindAvoid, 6.0))
            .expect("register")
    }

    #[test]
    fn zones_skip_dead_and_other_region_hostiles() {
        let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
        world.hostiles = vec![
            Hostile::new(1, "bracken", Vec3::new(4.0, 0.0, 0.0), Region::Interior),
            Hostile::new(2, "bracken", Vec3::new(5.0, 0.0, 0.0), Region::Interior).dead(),
            Hostile::new(3, "bracken", Vec3::new(6.0, 0.0, 0.0), Region::Exterior),
            Hostile::new(4, "hoarder", Vec3::new(7.0, 0.0, 0.0), Region::Interior),
        ];

        let zones = avoidance_zones(&world, &registry(), AGENT, Vec3::ZERO, Region::Interior);
        assert_eq!(
            zones,
            vec![DangerZone {
                center: Vec3::new(4.0, 0.0, 0.0),
                radius: 6.0
            }]
        );
    }

    #[test]
    fn exposure_needs_range_and_sight() {
        let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
        world.hostiles = vec![Hostile::new(
            1,
            "bracken",
            Vec3::new(8.0, 0.0, 0.0),
            Region::Interior,
        )];
        assert!(!is_exposed(&world, &registry(), AGENT, Region::Interior));

        world.hostiles[0].position = Vec3::new(4.0, 0.0, 0.0);
        world.hostiles[0].eye_position = Vec3::new(4.0, 1.0, 0.0);
        assert!(is_exposed(&world, &registry(), AGENT, Region::Interior));

        world
            .blockers
            .push((Vec3::new(1.5, -1.0, -1.0), Vec3::new(2.5, 4.0, 1.0)));
        assert!(!is_exposed(&world, &registry(), AGENT, Region::Interior));
    }
}
