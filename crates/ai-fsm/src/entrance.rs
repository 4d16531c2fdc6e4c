//! Crossing-point discovery and safety.

use std::collections::HashMap;

use ai_core::{DayPhase, EntranceId, TickContext, Vec3};
use ai_nav::{AgentWorld, AnchorSide, CrossingPoint, HazardKind, HazardVolume, SpatialQuery};
use tracing::debug;

use crate::{find_nearby_threat, AgentContext};

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedVerdict {
    safe: bool,
    computed_at: f32,
}

/// Short-lived memo of per-crossing safety verdicts.
///
/// Entries are keyed by crossing point and anchor side, overwritten in place and never
/// removed; an entry older than `entrances.safety_ttl_seconds` is recomputed on access.
#[derive(Debug, Default, Clone)]
pub struct EntranceSafetyCache {
    entries: HashMap<(EntranceId, AnchorSide), CachedVerdict>,
    hits: u64,
    misses: u64,
}

impl EntranceSafetyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the anchor on the chosen side of `crossing` is clear of hostiles.
    ///
    /// A crossing whose exit anchor hasn't been linked is never safe, and neither is any
    /// crossing while the panic threat is close to the agent.
    pub fn is_safe<W: AgentWorld + ?Sized>(
        &mut self,
        crossing: &CrossingPoint,
        use_entrance_side: bool,
        ctx: &TickContext,
        agent: &AgentContext,
        world: &W,
    ) -> bool {
        let side = if use_entrance_side {
            AnchorSide::Entrance
        } else {
            AnchorSide::Exit
        };
        if crossing.anchor(AnchorSide::Exit).is_none() {
            return false;
        }
        let Some((anchor, _)) = crossing.anchor(side) else {
            return false;
        };

        if let Some(position) = world.agent_position(agent.id) {
            let panic_kind = &agent.config.threats.panic_kind;
            if find_nearby_threat(world, &agent.threats, agent.id, position, panic_kind).is_some() {
                return false;
            }
        }

        let cfg = &agent.config.entrances;
        let key = (crossing.id, side);
        if let Some(cached) = self.entries.get(&key) {
            if ctx.time - cached.computed_at < cfg.safety_ttl_seconds {
                self.hits += 1;
                return cached.safe;
            }
        }

        self.misses += 1;
        let safe = !world
            .hostiles()
            .iter()
            .any(|h| h.alive && h.position.distance_squared(anchor) < cfg.danger_distance_sq);
        debug!(
            agent = ?agent.id,
            entrance = ?crossing.id,
            ?side,
            safe,
            "entrance safety recomputed",
        );
        self.entries.insert(
            key,
            CachedVerdict {
                safe,
                computed_at: ctx.time,
            },
        );
        safe
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether the anchor on `side`, or the walkable node next to it, sits in an active hazard.
///
/// A missing anchor counts as covered.
pub fn is_covered_in_hazard<W: SpatialQuery + ?Sized>(
    crossing: &CrossingPoint,
    side: AnchorSide,
    agent: &AgentContext,
    world: &W,
) -> bool {
    let Some((anchor, region)) = crossing.anchor(side) else {
        return true;
    };
    let hazards = world.hazards();
    if hazards.is_empty() {
        return false;
    }

    let cfg = &agent.config;
    let snapped = world
        .sample_navmesh(anchor, cfg.safe_path.navmesh_sample_radius)
        .unwrap_or(anchor);
    let node = world.nearest_node(region, snapped, None).map(|n| n.position);

    std::iter::once(snapped).chain(node).any(|point| {
        hazards.iter().any(|hazard| {
            covers(
                hazard,
                point,
                cfg.entrances.solid_hazard_buffer,
                cfg.safe_path.eye_height,
            )
        })
    })
}

fn covers(hazard: &HazardVolume, point: Vec3, solid_buffer: f32, eye_height: f32) -> bool {
    match hazard.kind {
        HazardKind::Solid => hazard.closest_point(point).distance(point) <= solid_buffer,
        HazardKind::Liquid => hazard.contains(point.raised(eye_height)),
    }
}

/// Travel distance from the agent to the walk-up side of `crossing`, `None` if unreachable.
///
/// A lift-served front crossing is also reachable through the lift: either the agent can
/// path to the lift's base platform, or it is already riding the lift.
pub fn can_path_to_entrance<W: AgentWorld + ?Sized>(
    crossing: &CrossingPoint,
    agent: &AgentContext,
    world: &W,
) -> Option<f32> {
    let position = world.agent_position(agent.id)?;
    if let Some(distance) = world.path_distance(position, crossing.entry_point) {
        return Some(distance);
    }
    if !(crossing.is_front && crossing.lift_served) {
        return None;
    }

    let lift = world.lift()?;
    if world.is_in_lift(agent.id) {
        return Some(position.distance(crossing.entry_point));
    }
    let to_base = world.path_distance(position, lift.base_platform)?;
    Some(to_base + lift.base_platform.distance(crossing.entry_point))
}

/// Nearest usable crossing point out of the agent's current region.
///
/// While outside at dawn (when `entrances.front_only_at_dawn` is set) a front crossing
/// always wins over a non-front one, and once a front crossing has been accepted the
/// non-front ones are skipped without evaluation.
pub fn find_closest_entrance<'w, W: AgentWorld + ?Sized>(
    agent: &AgentContext,
    world: &'w W,
) -> Option<&'w CrossingPoint> {
    let leads_inside = !agent.inside;
    let prefer_front = !agent.inside
        && agent.config.entrances.front_only_at_dawn
        && world.day_phase() == DayPhase::Dawn;

    let mut best: Option<(&CrossingPoint, f32)> = None;
    for crossing in world
        .crossing_points()
        .iter()
        .filter(|c| c.leads_inside == leads_inside)
    {
        let best_is_front = best.is_some_and(|(b, _)| b.is_front);
        if prefer_front && !crossing.is_front && best_is_front {
            continue;
        }
        if crossing.anchor(AnchorSide::Exit).is_none()
            || is_covered_in_hazard(crossing, AnchorSide::Entrance, agent, world)
        {
            continue;
        }
        let Some(distance) = can_path_to_entrance(crossing, agent, world) else {
            continue;
        };

        let better = match best {
            None => true,
            Some((_, _)) if prefer_front && crossing.is_front && !best_is_front => true,
            Some((_, best_distance)) => distance < best_distance,
        };
        if better {
            best = Some((crossing, distance));
        }
    }

    if let Some((crossing, distance)) = best {
        debug!(agent = ?agent.id, entrance = ?crossing.id, distance, "closest entrance");
    }
    best.map(|(crossing, _)| crossing)
}
