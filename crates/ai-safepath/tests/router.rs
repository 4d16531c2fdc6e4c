use ai_core::{AgentId, AiConfig, TickContext, Vec3};
use ai_nav::testing::{MockWorld, ScriptedPath};
use ai_nav::{DangerZone, Hostile, NavNode, PathVerdict, Region};
use ai_safepath::{RouterPhase, SafePathEnv, SafePathInputs, SafePathRouter, Settlement};
use ai_threat::{FearPurpose, ThreatDescriptor, ThreatRegistry};

const AGENT: AgentId = AgentId(1);

fn threats() -> ThreatRegistry {
    ThreatRegistry::new()
        .with(ThreatDescriptor::new("bracken").with_range(FearPurpose::PathfindAvoid, 6.0))
        .expect("register")
}

fn env<'a>(threats: &'a ThreatRegistry, config: &'a AiConfig) -> SafePathEnv<'a> {
    SafePathEnv {
        agent: AGENT,
        inside: true,
        threats,
        config,
    }
}

fn at(time: f32) -> TickContext {
    TickContext::new(0, time, 0.02)
}

fn towards(target: Vec3) -> SafePathInputs {
    SafePathInputs {
        desired: Some(target),
        ignore_initial_danger: false,
    }
}

fn started() -> SafePathRouter {
    let mut router = SafePathRouter::new();
    assert!(router.start());
    router
}

#[test]
fn safe_direct_path_is_adopted_without_scanning() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new()
        .with_agent(AGENT, Vec3::ZERO)
        .with_nodes(Region::Interior, &[Vec3::new(3.0, 0.0, 3.0)]);
    let mut router = started();

    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));

    assert_eq!(world.agent(AGENT).destination, Some(target));
    assert_eq!(router.safe_position(), Some(target));
    assert_eq!(router.last_settlement(), Some(Settlement::Direct(target)));
    assert_eq!(router.phase(), RouterPhase::Hold);
    assert_eq!(router.stats().fallback_probes, 0);
    assert_eq!(world.issued().len(), 1);
}

#[test]
fn path_queries_carry_avoidance_zones() {
    let (threats, config) = (threats(), AiConfig::default());
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.hostiles = vec![
        Hostile::new(1, "bracken", Vec3::new(0.0, 0.0, 20.0), Region::Interior),
        Hostile::new(2, "bracken", Vec3::new(0.0, 0.0, -20.0), Region::Exterior),
    ];
    let mut router = started();

    router.step(
        &at(0.0),
        &env(&threats, &config),
        &mut world,
        towards(Vec3::new(10.0, 0.0, 0.0)),
    );

    let issued = world.issued();
    assert_eq!(
        issued[0].avoid,
        vec![DangerZone {
            center: Vec3::new(0.0, 0.0, 20.0),
            radius: 6.0
        }]
    );
}

#[test]
fn ignoring_initial_danger_adopts_the_target() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.script(target, ScriptedPath::Verdict(PathVerdict::Dangerous));
    let mut router = started();

    let inputs = SafePathInputs {
        desired: Some(target),
        ignore_initial_danger: true,
    };
    router.step(&at(0.0), &env(&threats, &config), &mut world, inputs);

    assert_eq!(router.last_settlement(), Some(Settlement::Direct(target)));
}

#[test]
fn first_safe_fallback_candidate_is_adopted() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let near = Vec3::new(12.0, 0.0, 0.0);
    let middle = Vec3::new(10.0, 0.0, 5.0);
    let far = Vec3::new(0.0, 0.0, -20.0);
    let mut world = MockWorld::new()
        .with_agent(AGENT, Vec3::ZERO)
        .with_nodes(Region::Interior, &[far, middle, near]);
    world.script(target, ScriptedPath::Verdict(PathVerdict::Dangerous));
    world.script(near, ScriptedPath::Verdict(PathVerdict::Dangerous));
    world.script(middle, ScriptedPath::Verdict(PathVerdict::Safe { length: 11.0 }));
    world.script(far, ScriptedPath::Verdict(PathVerdict::Safe { length: 20.0 }));
    let mut router = started();

    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));

    assert_eq!(
        router.last_settlement(),
        Some(Settlement::Fallback(NavNode::new(1, middle)))
    );
    assert_eq!(world.agent(AGENT).destination, Some(middle));
    assert_eq!(router.stats().fallback_probes, 2);
    assert_eq!(router.stats().relaxed_probes, 0);
}

#[test]
fn path_fault_stops_the_loop() {
    ai_core::testing::init_tracing();
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.script(target, ScriptedPath::Fault("navmesh offline".to_string()));
    let mut router = started();

    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));

    assert!(!router.is_active());
    assert_eq!(router.phase(), RouterPhase::Idle);
    assert_eq!(router.stats().faults, 1);
    assert_eq!(world.agent(AGENT).destination, None);

    router.step(&at(1.0), &env(&threats, &config), &mut world, towards(target));
    assert_eq!(world.issued().len(), 1);
}

#[test]
fn cancelled_query_is_retried_next_iteration() {
    ai_core::testing::init_tracing();
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.script(target, ScriptedPath::Pending);
    let mut router = started();
    let env = env(&threats, &config);

    router.step(&at(0.0), &env, &mut world, towards(target));
    assert_eq!(router.phase(), RouterPhase::Direct);
    assert!(router.has_pending_path());

    world.issued()[0].cancel.cancel();
    router.step(&at(0.02), &env, &mut world, towards(target));
    assert!(router.is_active());
    assert_eq!(router.stats().cancellations, 1);
    assert_eq!(world.agent(AGENT).destination, None);

    world.scripted.clear();
    router.step(&at(0.04), &env, &mut world, towards(target));
    assert_eq!(world.issued().len(), 2);
    assert_eq!(world.agent(AGENT).destination, Some(target));
}

#[test]
fn pending_query_resolves_on_a_later_step() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.script(target, ScriptedPath::Pending);
    let mut router = started();
    let env = env(&threats, &config);

    router.step(&at(0.0), &env, &mut world, towards(target));
    router.step(&at(0.02), &env, &mut world, towards(target));
    assert_eq!(router.phase(), RouterPhase::Direct);

    world.resolve_pending(PathVerdict::Safe { length: 10.0 });
    router.step(&at(0.04), &env, &mut world, towards(target));
    assert_eq!(router.last_settlement(), Some(Settlement::Direct(target)));
    assert_eq!(world.issued().len(), 1);
}

/// Agent at the origin watched by a hostile three units away: every path out of the origin
/// passes through the hostile's avoidance zone.
fn exposed_world() -> MockWorld {
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO).with_nodes(
        Region::Interior,
        &[Vec3::new(0.0, 0.0, 5.0), Vec3::new(3.0, 0.0, -5.0)],
    );
    let bracken = Hostile::new(9, "bracken", Vec3::new(3.0, 0.0, 0.0), Region::Interior);
    world.hostiles = vec![bracken.with_eye_height(1.0)];
    world
}

#[test]
fn exposed_agent_takes_a_node_out_of_sight() {
    let (threats, config) = (threats(), AiConfig::default());
    let mut world = exposed_world();
    // Wall between the hostile and the second node only.
    world
        .blockers
        .push((Vec3::new(2.0, -1.0, -3.0), Vec3::new(4.0, 4.0, -2.0)));
    let mut router = started();

    router.step(
        &at(0.0),
        &env(&threats, &config),
        &mut world,
        towards(Vec3::new(10.0, 0.0, 0.0)),
    );

    let hidden = NavNode::new(1, Vec3::new(3.0, 0.0, -5.0));
    assert_eq!(router.last_settlement(), Some(Settlement::Concealed(hidden)));
    assert_eq!(router.stats().fallback_probes, 2);
    assert_eq!(router.stats().relaxed_probes, 2);
    assert_eq!(router.stats().sight_checks, 2);
    assert_eq!(world.agent(AGENT).destination, Some(hidden.position));
}

#[test]
fn exposed_agent_tries_line_of_sight_before_holding() {
    let (threats, config) = (threats(), AiConfig::default());
    let mut world = exposed_world();
    let mut router = started();

    router.step(
        &at(0.0),
        &env(&threats, &config),
        &mut world,
        towards(Vec3::new(10.0, 0.0, 0.0)),
    );

    assert_eq!(router.stats().relaxed_probes, 2);
    assert_eq!(router.stats().sight_checks, 2);
    assert_eq!(
        router.last_settlement(),
        Some(Settlement::HoldInPlace(Vec3::ZERO))
    );
    assert_eq!(world.agent(AGENT).destination, Some(Vec3::ZERO));
}

#[test]
fn paused_sight_sweep_still_checks_every_hostile_after_a_death() {
    let (threats, mut config) = (threats(), AiConfig::default());
    config.safe_path.hostiles_per_yield = 1;
    let node = Vec3::new(0.0, 0.0, 5.0);
    let mut world = MockWorld::new()
        .with_agent(AGENT, Vec3::ZERO)
        .with_nodes(Region::Interior, &[node]);
    world.hostiles = vec![
        Hostile::new(1, "bracken", Vec3::new(3.0, 0.0, 0.0), Region::Interior)
            .with_eye_height(1.0),
        Hostile::new(2, "bracken", Vec3::new(-3.0, 0.0, 3.0), Region::Interior)
            .with_eye_height(1.0),
    ];
    // Hides the node from the first hostile only.
    world
        .blockers
        .push((Vec3::new(1.0, -1.0, 2.0), Vec3::new(2.0, 4.0, 3.0)));
    let mut router = started();
    let target = towards(Vec3::new(10.0, 0.0, 0.0));

    router.step(&at(0.0), &env(&threats, &config), &mut world, target);
    assert_eq!(router.phase(), RouterPhase::RelaxedScan);
    assert_eq!(router.stats().sight_checks, 1);

    world.hostiles[0].alive = false;
    router.step(&at(0.02), &env(&threats, &config), &mut world, target);

    assert_eq!(router.stats().sight_checks, 2);
    assert_eq!(
        router.last_settlement(),
        Some(Settlement::HoldInPlace(Vec3::ZERO))
    );
}

fn stranded_world() -> MockWorld {
    let target = Vec3::new(20.0, 0.0, 0.0);
    let nodes = [Vec3::new(2.0, 0.0, 0.0), Vec3::new(15.0, 0.0, 0.0)];
    let mut world = MockWorld::new()
        .with_agent(AGENT, Vec3::new(1.0, 0.0, 0.0))
        .with_nodes(Region::Interior, &nodes);
    world.script(target, ScriptedPath::Verdict(PathVerdict::Dangerous));
    for node in nodes {
        world.script(node, ScriptedPath::Verdict(PathVerdict::Dangerous));
    }
    world
}

#[test]
fn submerged_agent_snaps_to_nearest_node() {
    let (threats, config) = (threats(), AiConfig::default());
    let mut world = stranded_world();
    world.agent_mut(AGENT).submerged = true;
    let mut router = started();

    router.step(
        &at(0.0),
        &env(&threats, &config),
        &mut world,
        towards(Vec3::new(20.0, 0.0, 0.0)),
    );

    assert_eq!(
        router.last_settlement(),
        Some(Settlement::Recovery(NavNode::new(0, Vec3::new(2.0, 0.0, 0.0))))
    );
    assert_eq!(router.stats().relaxed_probes, 0);
}

#[test]
fn off_navmesh_agent_snaps_and_grounded_agent_holds() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(20.0, 0.0, 0.0);

    let mut world = stranded_world();
    world.agent_mut(AGENT).on_navmesh = false;
    let mut router = started();
    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));
    assert_eq!(
        router.safe_position(),
        Some(Vec3::new(2.0, 0.0, 0.0))
    );

    let mut world = stranded_world();
    let mut router = started();
    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));
    assert_eq!(
        router.last_settlement(),
        Some(Settlement::HoldInPlace(Vec3::new(1.0, 0.0, 0.0)))
    );
}

#[test]
fn fallback_scan_yields_every_budgeted_batch() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(100.0, 0.0, 0.0);
    let nodes: Vec<Vec3> = (0..40).map(|i| Vec3::new(i as f32, 0.0, 10.0)).collect();
    let mut world = MockWorld::new()
        .with_agent(AGENT, Vec3::ZERO)
        .with_nodes(Region::Interior, &nodes);
    world.script(target, ScriptedPath::Verdict(PathVerdict::Dangerous));
    for node in &nodes {
        world.script(*node, ScriptedPath::Verdict(PathVerdict::Dangerous));
    }
    let mut router = started();
    let env = env(&threats, &config);

    router.step(&at(0.0), &env, &mut world, towards(target));
    assert_eq!(router.phase(), RouterPhase::FallbackScan);
    assert_eq!(router.stats().fallback_probes, 15);

    router.step(&at(0.02), &env, &mut world, towards(target));
    assert_eq!(router.stats().fallback_probes, 30);

    router.step(&at(0.04), &env, &mut world, towards(target));
    assert_eq!(router.stats().fallback_probes, 40);
    assert_eq!(router.stats().yields, 2);
    assert_eq!(
        router.last_settlement(),
        Some(Settlement::HoldInPlace(Vec3::ZERO))
    );
}

#[test]
fn hold_lasts_one_ai_interval() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    let mut router = started();
    let env = env(&threats, &config);

    router.step(&at(1.0), &env, &mut world, towards(target));
    router.step(&at(1.1), &env, &mut world, towards(target));
    assert_eq!(world.issued().len(), 1);
    assert_eq!(router.phase(), RouterPhase::Hold);

    router.step(&at(1.25), &env, &mut world, towards(target));
    assert_eq!(world.issued().len(), 2);
    assert_eq!(router.stats().iterations, 2);
}

#[test]
fn no_desired_position_stops_the_loop() {
    let (threats, config) = (threats(), AiConfig::default());
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    let mut router = started();

    router.step(
        &at(0.0),
        &env(&threats, &config),
        &mut world,
        SafePathInputs::default(),
    );

    assert!(!router.is_active());
    assert!(world.issued().is_empty());
}

#[test]
fn start_is_idempotent_and_stop_is_repeatable() {
    let (threats, config) = (threats(), AiConfig::default());
    let target = Vec3::new(10.0, 0.0, 0.0);
    let mut world = MockWorld::new().with_agent(AGENT, Vec3::ZERO);
    world.script(target, ScriptedPath::Pending);
    let mut router = started();
    assert!(!router.start());

    router.step(&at(0.0), &env(&threats, &config), &mut world, towards(target));
    assert!(router.has_pending_path());

    router.stop();
    router.stop();

    assert!(!router.is_active());
    assert!(!router.has_pending_path());
    assert!(world.issued()[0].cancel.is_canceled());

    router.step(&at(1.0), &env(&threats, &config), &mut world, towards(target));
    assert_eq!(world.issued().len(), 1);
}
