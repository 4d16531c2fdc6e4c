use core::fmt;

use ai_core::{AgentId, HostileId, NodeId, TickContext, Vec3};
use ai_nav::{AgentWorld, NavNode};
use ai_safepath::SafePathRouter;
use tracing::warn;

use crate::{
    find_nearby_threat, parse_directive, AgentContext, EntranceSafetyCache, HeldItem,
    Interactable, ItemCapability, ItemUse, MessageDirective, SearchRoutine, StateError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKind(pub &'static str);

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crouch {
    Stand,
    Crouch,
    NoPreference,
}

/// Resources every behavior state owns.
pub struct StateCore<W>
where
    W: AgentWorld + 'static,
{
    agent: AgentId,
    started: bool,
    /// The state to go back to on [`Directive::Revert`]. Owned, so dropping this state
    /// drops the whole chain. The machine caps its length at `states.max_saved_states`.
    pub previous: Option<Box<dyn BehaviorState<W>>>,
    pub last_known_target: Option<Vec3>,
    pub target_interactable: Option<Interactable>,
    pub threat: Option<HostileId>,
    pub player_search: SearchRoutine,
    pub scrap_search: SearchRoutine,
    pub safe_path: SafePathRouter,
    pub entrance_cache: EntranceSafetyCache,
    pub last_stuck_node: Option<NodeId>,
}

impl<W> StateCore<W>
where
    W: AgentWorld + 'static,
{
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Whether `enter` has run at least once for this state.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
    }

    /// Halt everything this state may have running in the background.
    pub fn stop_all(&mut self) {
        self.player_search.stop();
        self.scrap_search.stop();
        self.safe_path.stop();
    }

    /// Number of predecessor states reachable through `previous`.
    pub fn saved_depth(&self) -> usize {
        let mut depth = 0;
        let mut cursor = self.previous.as_deref();
        while let Some(state) = cursor {
            depth += 1;
            cursor = state.core().previous.as_deref();
        }
        depth
    }

    /// Cut the predecessor chain after `max` states, returning the detached remainder.
    pub(crate) fn truncate_history(&mut self, max: usize) -> Option<Box<dyn BehaviorState<W>>> {
        if max == 0 {
            return self.previous.take();
        }
        let mut depth = 1;
        let mut cursor = self.previous.as_deref_mut();
        while let Some(state) = cursor {
            if depth >= max {
                return state.core_mut().previous.take();
            }
            depth += 1;
            cursor = state.core_mut().previous.as_deref_mut();
        }
        None
    }

    /// Take over the carried-forward fields of `other`.
    pub(crate) fn adopt_context(&mut self, other: &StateCore<W>) {
        self.last_known_target = other.last_known_target;
        self.target_interactable = other.target_interactable;
        self.threat = other.threat;
        self.player_search = other.player_search.clone();
        self.scrap_search = other.scrap_search.clone();
    }
}

impl<W> Drop for StateCore<W>
where
    W: AgentWorld + 'static,
{
    // Unlink the chain one state at a time so a long history cannot exhaust the stack.
    fn drop(&mut self) {
        let mut next = self.previous.take();
        while let Some(mut state) = next {
            next = state.core_mut().previous.take();
        }
    }
}

impl<W> fmt::Debug for StateCore<W>
where
    W: AgentWorld + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCore")
            .field("agent", &self.agent)
            .field("started", &self.started)
            .field("previous", &self.previous.as_ref().map(|p| p.kind()))
            .field("last_known_target", &self.last_known_target)
            .field("target_interactable", &self.target_interactable)
            .field("threat", &self.threat)
            .field("safe_path", &self.safe_path)
            .finish_non_exhaustive()
    }
}

/// Input to a state constructor: the owning agent plus the context carried over from the
/// state being left.
pub struct StateSeed<W>
where
    W: AgentWorld + 'static,
{
    agent: AgentId,
    pub previous: Option<Box<dyn BehaviorState<W>>>,
    pub last_known_target: Option<Vec3>,
    pub target_interactable: Option<Interactable>,
    pub threat: Option<HostileId>,
    pub player_search: SearchRoutine,
    pub scrap_search: SearchRoutine,
}

impl<W> StateSeed<W>
where
    W: AgentWorld + 'static,
{
    /// A seed with nothing carried over.
    pub fn fresh(agent: Option<AgentId>) -> Result<Self, StateError> {
        let agent = agent.ok_or(StateError::MissingAgent)?;
        Ok(Self::for_agent(agent))
    }

    pub fn for_agent(agent: AgentId) -> Self {
        Self {
            agent,
            previous: None,
            last_known_target: None,
            target_interactable: None,
            threat: None,
            player_search: SearchRoutine::default(),
            scrap_search: SearchRoutine::default(),
        }
    }

    /// Carry context out of `outgoing`, which must already be stopped.
    pub(crate) fn carry(
        mut outgoing: Box<dyn BehaviorState<W>>,
        previous: PreviousOverride<W>,
    ) -> Self {
        let core = outgoing.core_mut();
        let mut seed = Self::for_agent(core.agent);
        seed.last_known_target = core.last_known_target;
        seed.target_interactable = core.target_interactable;
        seed.threat = core.threat;
        seed.player_search = core.player_search.clone();
        seed.scrap_search = core.scrap_search.clone();
        seed.previous = match previous {
            PreviousOverride::Current => Some(outgoing),
            PreviousOverride::SkipToPrevious => outgoing.core_mut().previous.take(),
            PreviousOverride::State(state) => Some(state),
            PreviousOverride::None => None,
        };
        seed
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Build a core with the carried context and fresh per-state resources.
    pub fn into_core(self) -> StateCore<W> {
        StateCore {
            agent: self.agent,
            started: false,
            previous: self.previous,
            last_known_target: self.last_known_target,
            target_interactable: self.target_interactable,
            threat: self.threat,
            player_search: self.player_search,
            scrap_search: self.scrap_search,
            safe_path: SafePathRouter::new(),
            entrance_cache: EntranceSafetyCache::new(),
            last_stuck_node: None,
        }
    }
}

/// Which state the new state will revert to.
pub enum PreviousOverride<W>
where
    W: AgentWorld + 'static,
{
    /// The state being left.
    Current,
    /// The predecessor of the state being left.
    SkipToPrevious,
    State(Box<dyn BehaviorState<W>>),
    None,
}

pub type StateBuilder<W> = Box<dyn FnOnce(StateSeed<W>) -> Box<dyn BehaviorState<W>>>;

pub struct Transition<W>
where
    W: AgentWorld + 'static,
{
    pub(crate) build: StateBuilder<W>,
    pub(crate) previous: PreviousOverride<W>,
}

impl<W> Transition<W>
where
    W: AgentWorld + 'static,
{
    pub fn to<F>(build: F) -> Self
    where
        F: FnOnce(StateSeed<W>) -> Box<dyn BehaviorState<W>> + 'static,
    {
        Self {
            build: Box::new(build),
            previous: PreviousOverride::Current,
        }
    }

    pub fn skip_to_previous(mut self) -> Self {
        self.previous = PreviousOverride::SkipToPrevious;
        self
    }

    pub fn with_previous(mut self, state: Box<dyn BehaviorState<W>>) -> Self {
        self.previous = PreviousOverride::State(state);
        self
    }

    pub fn without_previous(mut self) -> Self {
        self.previous = PreviousOverride::None;
        self
    }
}

/// What the machine should do after a hook returns.
pub enum Directive<W>
where
    W: AgentWorld + 'static,
{
    Stay,
    Switch(Transition<W>),
    /// Reactivate the predecessor state.
    Revert,
    ReturnToBase,
    Panic(HostileId),
}

impl<W> Directive<W>
where
    W: AgentWorld + 'static,
{
    pub fn switch<F>(build: F) -> Self
    where
        F: FnOnce(StateSeed<W>) -> Box<dyn BehaviorState<W>> + 'static,
    {
        Directive::Switch(Transition::to(build))
    }

    pub fn is_stay(&self) -> bool {
        matches!(self, Directive::Stay)
    }
}

impl<W> fmt::Debug for Directive<W>
where
    W: AgentWorld + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Stay => f.write_str("Stay"),
            Directive::Switch(_) => f.write_str("Switch(..)"),
            Directive::Revert => f.write_str("Revert"),
            Directive::ReturnToBase => f.write_str("ReturnToBase"),
            Directive::Panic(hostile) => f.debug_tuple("Panic").field(hostile).finish(),
        }
    }
}

/// One behavior of an agent.
///
/// Only [`kind`](BehaviorState::kind), the core accessors and [`tick`](BehaviorState::tick)
/// are required; every other hook has the crew-wide default behavior.
pub trait BehaviorState<W>: 'static
where
    W: AgentWorld + 'static,
{
    fn kind(&self) -> StateKind;

    fn core(&self) -> &StateCore<W>;

    fn core_mut(&mut self) -> &mut StateCore<W>;

    /// Called each time the state becomes active. `first_entry` is false when the state is
    /// reactivated by a revert.
    fn enter(
        &mut self,
        _first_entry: bool,
        _ctx: &TickContext,
        _agent: &AgentContext,
        _world: &mut W,
    ) {
    }

    /// Decision update, once per AI interval. Must not block.
    fn tick(&mut self, ctx: &TickContext, agent: &AgentContext, world: &mut W) -> Directive<W>;

    fn on_stuck(&mut self, agent: &AgentContext, world: &mut W) {
        recover_from_stuck(self.core_mut(), agent, world);
    }

    /// `message` is already lowercased.
    fn on_signal(&mut self, message: &str, agent: &AgentContext, world: &W) -> Directive<W> {
        default_message_directive(message, agent, world)
    }

    /// `message` is already lowercased.
    fn on_chat_message(
        &mut self,
        message: &str,
        _sender: &str,
        agent: &AgentContext,
        world: &W,
    ) -> Directive<W> {
        default_message_directive(message, agent, world)
    }

    fn should_crouch(&self, agent: &AgentContext, world: &W) -> Crouch {
        default_should_crouch(agent, world)
    }

    fn should_return_to_base(&self, agent: &AgentContext, world: &W) -> bool {
        default_should_return_to_base(agent, world)
    }

    /// Where the safe-path router should try to take the agent; `None` stops the router.
    fn desired_safe_path_position(&self, _agent: &AgentContext, _world: &W) -> Option<Vec3> {
        None
    }

    fn ignore_initial_danger_check(&self) -> bool {
        false
    }

    fn billboard_indicator(&self) -> Option<String> {
        None
    }

    fn allows_terminal_use(&self) -> bool {
        false
    }

    fn on_held_item(&mut self, item: &HeldItem, agent: &AgentContext, world: &mut W) -> ItemUse {
        match item.capability {
            ItemCapability::Weapon => self.use_weapon(item, agent, world),
            ItemCapability::Light => self.use_light(item, agent, world),
            ItemCapability::Key => self.use_key(item, agent, world),
            ItemCapability::Scrap => self.use_scrap(item, agent, world),
            ItemCapability::Utility => self.use_utility(item, agent, world),
        }
    }

    fn use_weapon(&mut self, _item: &HeldItem, _agent: &AgentContext, _world: &mut W) -> ItemUse {
        ItemUse::Ignored
    }

    fn use_light(&mut self, _item: &HeldItem, _agent: &AgentContext, _world: &mut W) -> ItemUse {
        ItemUse::Ignored
    }

    fn use_key(&mut self, _item: &HeldItem, _agent: &AgentContext, _world: &mut W) -> ItemUse {
        ItemUse::Ignored
    }

    fn use_scrap(&mut self, _item: &HeldItem, _agent: &AgentContext, _world: &mut W) -> ItemUse {
        ItemUse::Ignored
    }

    fn use_utility(&mut self, _item: &HeldItem, _agent: &AgentContext, _world: &mut W) -> ItemUse {
        ItemUse::Ignored
    }
}

/// Teleport to the nearest node of the agent's region, skipping the node used by the
/// previous recovery so repeated calls don't bounce the agent back to the same spot.
pub fn recover_from_stuck<W>(
    core: &mut StateCore<W>,
    agent: &AgentContext,
    world: &mut W,
) -> Option<NavNode>
where
    W: AgentWorld + 'static,
{
    let Some(position) = world.agent_position(agent.id) else {
        warn!(agent = ?agent.id, "stuck agent has no position");
        return None;
    };
    let Some(node) = world.nearest_node(agent.region(), position, core.last_stuck_node) else {
        warn!(agent = ?agent.id, "no node to recover a stuck agent to");
        return None;
    };
    warn!(agent = ?agent.id, node = ?node.id, "agent stuck, teleporting to nearest node");
    world.teleport(agent.id, node.position);
    core.last_stuck_node = Some(node.id);
    Some(node)
}

/// Return words always send the agent home; panic words only count indoors, and only when
/// the panic threat is actually close.
pub fn default_message_directive<W>(message: &str, agent: &AgentContext, world: &W) -> Directive<W>
where
    W: AgentWorld + 'static,
{
    match parse_directive(&agent.config.directives, message) {
        Some(MessageDirective::ReturnToBase) => Directive::ReturnToBase,
        Some(MessageDirective::Panic) if agent.inside => {
            let Some(position) = world.agent_position(agent.id) else {
                return Directive::Stay;
            };
            let panic_kind = &agent.config.threats.panic_kind;
            match find_nearby_threat(world, &agent.threats, agent.id, position, panic_kind) {
                Some(hostile) => Directive::Panic(hostile.id),
                None => Directive::Stay,
            }
        }
        _ => Directive::Stay,
    }
}

pub fn default_should_crouch<W>(agent: &AgentContext, world: &W) -> Crouch
where
    W: AgentWorld + ?Sized,
{
    if world.is_submerged(agent.id) {
        return Crouch::Stand;
    }
    let threats = &agent.config.threats;
    let (Some(kind), Some(position)) = (
        threats.crouch_kind.as_deref(),
        world.agent_position(agent.id),
    ) else {
        return Crouch::NoPreference;
    };
    let range_sq = threats.crouch_detection_range * threats.crouch_detection_range;
    let region = agent.region();
    let nearby = world.hostiles().iter().any(|h| {
        h.alive
            && h.kind == kind
            && h.region == region
            && h.position.distance_squared(position) <= range_sq
    });
    if nearby {
        Crouch::Crouch
    } else {
        Crouch::NoPreference
    }
}

pub fn default_should_return_to_base<W>(agent: &AgentContext, world: &W) -> bool
where
    W: AgentWorld + ?Sized,
{
    world.meltdown_active().unwrap_or(false)
        || world.day_phase() >= agent.config.return_to_base.late_phase
        || world.leave_votes().quorum_reached()
        || world.departure_alerted()
}
