use std::mem;

use ai_core::{AgentId, AiConfig, HostileId, TickContext, Vec3};
use ai_nav::{
    AgentWorld, DangerZone, NavNode, PathPoll, PathRequest, PathSlot, PathVerdict, Region,
};
use ai_threat::{FearPurpose, ThreatRegistry};
use tracing::{debug, error, warn};

use crate::exposure::{avoidance_zones, is_exposed, live_hostiles};

/// Everything the router reads but does not own.
#[derive(Debug, Clone, Copy)]
pub struct SafePathEnv<'a> {
    pub agent: AgentId,
    pub inside: bool,
    pub threats: &'a ThreatRegistry,
    pub config: &'a AiConfig,
}

impl SafePathEnv<'_> {
    pub fn region(&self) -> Region {
        Region::from_inside(self.inside)
    }
}

/// What the owning state wants from the current iteration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafePathInputs {
    pub desired: Option<Vec3>,
    /// Adopt the desired target even when its direct path is flagged dangerous.
    pub ignore_initial_danger: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPhase {
    Idle,
    Direct,
    FallbackScan,
    RelaxedScan,
    Hold,
}

/// How the last iteration settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Settlement {
    Direct(Vec3),
    /// First fallback node with a non-dangerous path.
    Fallback(NavNode),
    /// Reachable node no nearby hostile can see.
    Concealed(NavNode),
    /// Nearest node, used when the agent is submerged or off the navmesh.
    Recovery(NavNode),
    HoldInPlace(Vec3),
}

impl Settlement {
    pub fn position(&self) -> Vec3 {
        match self {
            Settlement::Direct(p) | Settlement::HoldInPlace(p) => *p,
            Settlement::Fallback(node)
            | Settlement::Concealed(node)
            | Settlement::Recovery(node) => node.position,
        }
    }
}

/// Counters since the router was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub iterations: u64,
    pub fallback_probes: u64,
    pub relaxed_probes: u64,
    pub sight_checks: u64,
    pub yields: u64,
    pub cancellations: u64,
    pub faults: u64,
}

#[derive(Debug)]
struct Probe {
    ranked: Vec<NavNode>,
    next: usize,
    pending: Option<NavNode>,
}

impl Probe {
    fn ranked_by_distance(nodes: &[NavNode], origin: Vec3) -> Self {
        let mut ranked = nodes.to_vec();
        ranked.sort_by(|a, b| {
            a.position
                .distance_squared(origin)
                .total_cmp(&b.position.distance_squared(origin))
        });
        Self {
            ranked,
            next: 0,
            pending: None,
        }
    }

    fn take_next(&mut self) -> Option<NavNode> {
        let node = self.ranked.get(self.next).copied()?;
        self.next += 1;
        Some(node)
    }
}

/// Line-of-sight sweep over the hostiles that were live when the node was reached.
#[derive(Debug, Clone)]
struct Sweep {
    node: NavNode,
    hostiles: Vec<HostileId>,
    next: usize,
}

impl Sweep {
    fn new<W: AgentWorld>(node: NavNode, world: &W, region: Region) -> Self {
        Self {
            node,
            hostiles: live_hostiles(world, region).map(|h| h.id).collect(),
            next: 0,
        }
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Direct { target: Vec3 },
    FallbackScan { probe: Probe },
    RelaxedScan { probe: Probe, sweep: Option<Sweep> },
    Hold { until: f32 },
}

enum Flow {
    Continue(Phase),
    Yield(Phase),
    Stop,
}

struct Budget {
    nodes: usize,
    hostiles: usize,
}

enum SweepOutcome {
    Visible,
    Clear,
    Paused(Sweep),
}

/// Resumable safe-destination loop.
///
/// Each [`SafePathRouter::step`] resumes where the previous one yielded. One iteration:
///
/// 1. query the direct path to the desired target, adopting it unless it is dangerous;
/// 2. probe the region's nodes in order of distance to the target for a non-dangerous path;
/// 3. when the agent is exposed, accept the nearest reachable node no nearby hostile can see;
/// 4. otherwise snap to the nearest node (submerged or off the navmesh) or hold in place.
///
/// The settled position becomes the agent's destination and the loop holds for one AI
/// interval before the next iteration.
#[derive(Debug, Default)]
pub struct SafePathRouter {
    active: bool,
    phase: Phase,
    slot: PathSlot,
    avoid: Vec<DangerZone>,
    safe_position: Option<Vec3>,
    last_settlement: Option<Settlement>,
    stats: RouterStats,
}

impl SafePathRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin routing. Returns `false` when the router was already running.
    pub fn start(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.phase = Phase::Idle;
        true
    }

    /// Cancel the outstanding path query and halt the loop. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.slot.cancel();
        self.active = false;
        self.phase = Phase::Idle;
        self.avoid.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> RouterPhase {
        match self.phase {
            Phase::Idle => RouterPhase::Idle,
            Phase::Direct { .. } => RouterPhase::Direct,
            Phase::FallbackScan { .. } => RouterPhase::FallbackScan,
            Phase::RelaxedScan { .. } => RouterPhase::RelaxedScan,
            Phase::Hold { .. } => RouterPhase::Hold,
        }
    }

    /// Last position the router settled on.
    pub fn safe_position(&self) -> Option<Vec3> {
        self.safe_position
    }

    pub fn last_settlement(&self) -> Option<Settlement> {
        self.last_settlement
    }

    pub fn stats(&self) -> RouterStats {
        self.stats
    }

    pub fn has_pending_path(&self) -> bool {
        self.slot.is_pending()
    }

    /// Resume the loop until it yields, settles or stops.
    pub fn step<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
        inputs: SafePathInputs,
    ) {
        if !self.active {
            return;
        }
        let cfg = &env.config.safe_path;
        let mut budget = Budget {
            nodes: cfg.nodes_per_yield.max(1),
            hostiles: cfg.hostiles_per_yield.max(1),
        };

        loop {
            let flow = match mem::take(&mut self.phase) {
                Phase::Idle => self.begin_iteration(env, world, inputs),
                Phase::Direct { target } => self.resume_direct(ctx, env, world, inputs, target),
                Phase::FallbackScan { probe } => {
                    self.resume_fallback(ctx, env, world, &mut budget, probe)
                }
                Phase::RelaxedScan { probe, sweep } => {
                    self.resume_relaxed(ctx, env, world, &mut budget, probe, sweep)
                }
                Phase::Hold { until } if ctx.time < until => Flow::Yield(Phase::Hold { until }),
                Phase::Hold { .. } => Flow::Continue(Phase::Idle),
            };

            match flow {
                Flow::Continue(phase) => self.phase = phase,
                Flow::Yield(phase) => {
                    self.phase = phase;
                    return;
                }
                Flow::Stop => {
                    self.stop();
                    return;
                }
            }
        }
    }

    fn begin_iteration<W: AgentWorld>(
        &mut self,
        env: &SafePathEnv<'_>,
        world: &W,
        inputs: SafePathInputs,
    ) -> Flow {
        let Some(target) = inputs.desired else {
            debug!(agent = ?env.agent, "no desired position, safe-path loop stops");
            return Flow::Stop;
        };
        let Some(position) = world.agent_position(env.agent) else {
            warn!(agent = ?env.agent, "agent has no position, safe-path loop stops");
            return Flow::Stop;
        };

        self.stats.iterations += 1;
        self.avoid = avoidance_zones(world, env.threats, env.agent, position, env.region());
        self.issue(env.agent, position, target, world);
        Flow::Continue(Phase::Direct { target })
    }

    fn resume_direct<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
        inputs: SafePathInputs,
        target: Vec3,
    ) -> Flow {
        let verdict = match self.slot.poll() {
            Some(PathPoll::Pending) => return Flow::Yield(Phase::Direct { target }),
            Some(PathPoll::Ready(Ok(verdict))) => verdict,
            Some(PathPoll::Ready(Err(fault))) => {
                self.stats.faults += 1;
                error!(agent = ?env.agent, %fault, "safe-path query failed");
                return Flow::Stop;
            }
            Some(PathPoll::Canceled) | None => {
                self.stats.cancellations += 1;
                warn!(agent = ?env.agent, "safe-path query was cancelled, retrying");
                return Flow::Yield(Phase::Idle);
            }
        };

        let adopt = match verdict {
            PathVerdict::Safe { .. } => true,
            PathVerdict::Dangerous => inputs.ignore_initial_danger,
            PathVerdict::Unreachable => false,
        };
        if adopt {
            return self.settle(ctx, env, world, Settlement::Direct(target));
        }

        debug!(agent = ?env.agent, ?verdict, "direct path rejected, scanning fallback nodes");
        let probe = Probe::ranked_by_distance(world.nodes(env.region()), target);
        Flow::Continue(Phase::FallbackScan { probe })
    }

    fn resume_fallback<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
        budget: &mut Budget,
        mut probe: Probe,
    ) -> Flow {
        if let Some(node) = probe.pending {
            match self.slot.poll() {
                Some(PathPoll::Pending) => return Flow::Yield(Phase::FallbackScan { probe }),
                Some(PathPoll::Ready(Ok(verdict))) if verdict.is_safe() => {
                    return self.settle(ctx, env, world, Settlement::Fallback(node));
                }
                Some(PathPoll::Ready(Ok(_))) => {}
                Some(PathPoll::Ready(Err(fault))) => {
                    self.stats.faults += 1;
                    error!(agent = ?env.agent, node = ?node.id, %fault, "fallback query failed");
                    return Flow::Stop;
                }
                Some(PathPoll::Canceled) | None => {
                    self.stats.cancellations += 1;
                    warn!(
                        agent = ?env.agent,
                        node = ?node.id,
                        "fallback query was cancelled, skipping node",
                    );
                }
            }
            probe.pending = None;
        }

        if budget.nodes == 0 {
            self.stats.yields += 1;
            return Flow::Yield(Phase::FallbackScan { probe });
        }

        let Some(node) = probe.take_next() else {
            return self.after_fallback(ctx, env, world);
        };
        let Some(position) = world.agent_position(env.agent) else {
            return Flow::Stop;
        };
        budget.nodes -= 1;
        self.stats.fallback_probes += 1;
        probe.pending = Some(node);
        self.issue(env.agent, position, node.position, world);
        Flow::Continue(Phase::FallbackScan { probe })
    }

    fn after_fallback<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
    ) -> Flow {
        if !is_exposed(world, env.threats, env.agent, env.region()) {
            return self.recover_or_hold(ctx, env, world);
        }
        let Some(position) = world.agent_position(env.agent) else {
            return Flow::Stop;
        };
        debug!(agent = ?env.agent, "agent exposed, looking for a node out of sight");
        let probe = Probe::ranked_by_distance(world.nodes(env.region()), position);
        Flow::Continue(Phase::RelaxedScan { probe, sweep: None })
    }

    fn resume_relaxed<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
        budget: &mut Budget,
        mut probe: Probe,
        sweep: Option<Sweep>,
    ) -> Flow {
        if let Some(sweep) = sweep {
            let node = sweep.node;
            return match self.sweep_sight(env, world, budget, sweep) {
                SweepOutcome::Clear => self.settle(ctx, env, world, Settlement::Concealed(node)),
                SweepOutcome::Visible => Flow::Continue(Phase::RelaxedScan { probe, sweep: None }),
                SweepOutcome::Paused(sweep) => {
                    self.stats.yields += 1;
                    Flow::Yield(Phase::RelaxedScan {
                        probe,
                        sweep: Some(sweep),
                    })
                }
            };
        }

        if let Some(node) = probe.pending {
            match self.slot.poll() {
                Some(PathPoll::Pending) => {
                    return Flow::Yield(Phase::RelaxedScan { probe, sweep: None })
                }
                Some(PathPoll::Ready(Ok(verdict))) if verdict.is_reachable() => {
                    probe.pending = None;
                    let sweep = Sweep::new(node, world, env.region());
                    return Flow::Continue(Phase::RelaxedScan {
                        probe,
                        sweep: Some(sweep),
                    });
                }
                Some(PathPoll::Ready(Ok(_))) => {}
                Some(PathPoll::Ready(Err(fault))) => {
                    self.stats.faults += 1;
                    error!(
                        agent = ?env.agent,
                        node = ?node.id,
                        %fault,
                        "reachability query failed",
                    );
                    return Flow::Stop;
                }
                Some(PathPoll::Canceled) | None => {
                    self.stats.cancellations += 1;
                    warn!(
                        agent = ?env.agent,
                        node = ?node.id,
                        "reachability query was cancelled, skipping node",
                    );
                }
            }
            probe.pending = None;
        }

        if budget.nodes == 0 {
            self.stats.yields += 1;
            return Flow::Yield(Phase::RelaxedScan { probe, sweep: None });
        }

        let Some(node) = probe.take_next() else {
            return self.recover_or_hold(ctx, env, world);
        };
        let Some(position) = world.agent_position(env.agent) else {
            return Flow::Stop;
        };
        budget.nodes -= 1;
        self.stats.relaxed_probes += 1;
        probe.pending = Some(node);
        self.issue(env.agent, position, node.position, world);
        Flow::Continue(Phase::RelaxedScan { probe, sweep: None })
    }

    /// Check hostiles near `sweep.node` for a line of sight to its eye point.
    fn sweep_sight<W: AgentWorld>(
        &mut self,
        env: &SafePathEnv<'_>,
        world: &W,
        budget: &mut Budget,
        mut sweep: Sweep,
    ) -> SweepOutcome {
        let node = sweep.node.position;
        let eye = node.raised(env.config.safe_path.eye_height);

        while let Some(&id) = sweep.hostiles.get(sweep.next) {
            if budget.hostiles == 0 {
                return SweepOutcome::Paused(sweep);
            }
            sweep.next += 1;
            // Gone or moved to another region since the sweep began.
            let Some(hostile) = live_hostiles(world, env.region()).find(|h| h.id == id) else {
                continue;
            };
            if !env
                .threats
                .within_fear_range(FearPurpose::PathfindAvoid, env.agent, node, hostile)
            {
                continue;
            }
            budget.hostiles -= 1;
            self.stats.sight_checks += 1;
            if world.line_of_sight(hostile.eye_position, eye) {
                debug!(
                    agent = ?env.agent,
                    node = ?sweep.node.id,
                    hostile = ?hostile.id,
                    "candidate node is watched",
                );
                return SweepOutcome::Visible;
            }
        }
        SweepOutcome::Clear
    }

    fn recover_or_hold<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
    ) -> Flow {
        let Some(position) = world.agent_position(env.agent) else {
            return Flow::Stop;
        };
        if world.is_submerged(env.agent) || !world.is_on_navmesh(env.agent) {
            if let Some(node) = world.nearest_node(env.region(), position, None) {
                warn!(
                    agent = ?env.agent,
                    node = ?node.id,
                    "no safe node, snapping to nearest node",
                );
                return self.settle(ctx, env, world, Settlement::Recovery(node));
            }
        }
        debug!(agent = ?env.agent, "no safe node, holding position");
        self.settle(ctx, env, world, Settlement::HoldInPlace(position))
    }

    fn settle<W: AgentWorld>(
        &mut self,
        ctx: &TickContext,
        env: &SafePathEnv<'_>,
        world: &mut W,
        settlement: Settlement,
    ) -> Flow {
        let position = settlement.position();
        world.set_destination(env.agent, position);
        self.safe_position = Some(position);
        self.last_settlement = Some(settlement);
        debug!(agent = ?env.agent, ?settlement, "safe position settled");
        Flow::Yield(Phase::Hold {
            until: ctx.time + env.config.tick.ai_interval_seconds,
        })
    }

    fn issue<W: AgentWorld>(&mut self, agent: AgentId, from: Vec3, to: Vec3, world: &W) {
        let avoid = self.avoid.clone();
        self.slot.issue(|cancel| {
            world.request_path(PathRequest {
                agent,
                from,
                to,
                avoid,
                cancel,
            })
        });
    }
}
