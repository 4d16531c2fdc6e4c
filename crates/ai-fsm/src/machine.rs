use std::sync::Arc;

use ai_core::{AgentId, TickContext};
use ai_nav::AgentWorld;
use ai_safepath::SafePathInputs;
use tracing::{debug, error, warn};

use crate::{
    AgentContext, BehaviorState, Crouch, Directive, HeldItem, ItemUse, StateCatalog, StateKind,
    StateSeed, Transition,
};

/// Drives the single active behavior state of one agent.
pub struct StateMachine<W>
where
    W: AgentWorld + 'static,
{
    context: AgentContext,
    catalog: Arc<dyn StateCatalog<W>>,
    current: Option<Box<dyn BehaviorState<W>>>,
    last_think: Option<f32>,
}

impl<W> StateMachine<W>
where
    W: AgentWorld + 'static,
{
    /// The initial state is entered on the first [`StateMachine::update`].
    pub fn new<F>(context: AgentContext, catalog: Arc<dyn StateCatalog<W>>, initial: F) -> Self
    where
        F: FnOnce(StateSeed<W>) -> Box<dyn BehaviorState<W>>,
    {
        let current = initial(StateSeed::for_agent(context.id));
        Self {
            context,
            catalog,
            current: Some(current),
            last_think: None,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.context.id
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut AgentContext {
        &mut self.context
    }

    pub fn current(&self) -> Option<&dyn BehaviorState<W>> {
        self.current.as_deref()
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn BehaviorState<W> + 'static)> {
        self.current.as_deref_mut()
    }

    pub fn current_kind(&self) -> Option<StateKind> {
        self.current.as_ref().map(|s| s.kind())
    }

    /// One simulation frame: the state's decision update when the AI interval has elapsed,
    /// then one step of its safe-path router.
    pub fn update(&mut self, ctx: &TickContext, world: &mut W) {
        self.ensure_entered(ctx, world);

        if self
            .context
            .config
            .tick
            .should_think(ctx, self.last_think)
        {
            self.last_think = Some(ctx.time);
            if let Some(state) = self.current.as_mut() {
                let directive = state.tick(ctx, &self.context, world);
                self.apply(directive, ctx, world);
            }
        }

        self.step_safe_path(ctx, world);
    }

    /// Deliver a radio signal to the active state.
    pub fn signal(&mut self, message: &str, ctx: &TickContext, world: &mut W) {
        self.ensure_entered(ctx, world);
        let message = message.to_lowercase();
        let Some(state) = self.current.as_mut() else {
            return;
        };
        let directive = state.on_signal(&message, &self.context, world);
        self.apply(directive, ctx, world);
    }

    /// Deliver a chat line from `sender` to the active state.
    pub fn chat(&mut self, message: &str, sender: &str, ctx: &TickContext, world: &mut W) {
        self.ensure_entered(ctx, world);
        let message = message.to_lowercase();
        let Some(state) = self.current.as_mut() else {
            return;
        };
        let directive = state.on_chat_message(&message, sender, &self.context, world);
        self.apply(directive, ctx, world);
    }

    pub fn stuck(&mut self, world: &mut W) {
        if let Some(state) = self.current.as_mut() {
            state.on_stuck(&self.context, world);
        }
    }

    pub fn hold_item(&mut self, item: &HeldItem, world: &mut W) -> ItemUse {
        match self.current.as_mut() {
            Some(state) => state.on_held_item(item, &self.context, world),
            None => ItemUse::Ignored,
        }
    }

    pub fn billboard(&self) -> Option<String> {
        self.current.as_ref().and_then(|s| s.billboard_indicator())
    }

    pub fn should_crouch(&self, world: &W) -> Crouch {
        match self.current.as_ref() {
            Some(state) => state.should_crouch(&self.context, world),
            None => Crouch::NoPreference,
        }
    }

    pub fn should_return_to_base(&self, world: &W) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.should_return_to_base(&self.context, world))
    }

    pub fn allows_terminal_use(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.allows_terminal_use())
    }

    /// Act on a directive returned by a state hook.
    pub fn apply(&mut self, directive: Directive<W>, ctx: &TickContext, world: &mut W) {
        match directive {
            Directive::Stay => {}
            Directive::Switch(transition) => self.transition(transition, ctx, world),
            Directive::Revert => self.revert(ctx, world),
            Directive::ReturnToBase => {
                let transition = self.return_to_base();
                self.transition(transition, ctx, world);
            }
            Directive::Panic(threat) => {
                let catalog = Arc::clone(&self.catalog);
                let transition = Transition::to(move |mut seed| {
                    seed.threat = Some(threat);
                    catalog.panic(seed, threat)
                });
                self.transition(transition, ctx, world);
            }
        }
    }

    fn return_to_base(&self) -> Transition<W> {
        let catalog = Arc::clone(&self.catalog);
        Transition::to(move |seed| catalog.return_to_base(seed))
    }

    fn transition(&mut self, transition: Transition<W>, ctx: &TickContext, world: &mut W) {
        let Some(mut outgoing) = self.current.take() else {
            return;
        };
        outgoing.core_mut().stop_all();
        let from = outgoing.kind();

        let seed = StateSeed::carry(outgoing, transition.previous);
        let mut next = (transition.build)(seed);
        let max_saved = self.context.config.states.max_saved_states;
        if let Some(oldest) = next.core_mut().truncate_history(max_saved) {
            debug!(
                agent = ?self.context.id,
                dropped = %oldest.kind(),
                max_saved,
                "discarding oldest saved state"
            );
        }
        debug!(agent = ?self.context.id, from = %from, to = %next.kind(), "state transition");
        self.activate(next, ctx, world);
    }

    fn revert(&mut self, ctx: &TickContext, world: &mut W) {
        let Some(mut current) = self.current.take() else {
            return;
        };
        current.core_mut().stop_all();

        match current.core_mut().previous.take() {
            Some(mut previous) => {
                previous.core_mut().adopt_context(current.core());
                debug!(
                    agent = ?self.context.id,
                    from = %current.kind(),
                    to = %previous.kind(),
                    "reverting to previous state"
                );
                drop(current);
                self.activate(previous, ctx, world);
            }
            None => {
                error!(
                    agent = ?self.context.id,
                    state = %current.kind(),
                    "revert requested but there is no previous state"
                );
                warn!(agent = ?self.context.id, "returning to base instead");
                self.current = Some(current);
                let transition = self.return_to_base();
                self.transition(transition, ctx, world);
            }
        }
    }

    fn activate(&mut self, mut state: Box<dyn BehaviorState<W>>, ctx: &TickContext, world: &mut W) {
        let first_entry = !state.core().is_started();
        state.enter(first_entry, ctx, &self.context, world);
        state.core_mut().mark_started();
        self.current = Some(state);
    }

    fn ensure_entered(&mut self, ctx: &TickContext, world: &mut W) {
        let pending = self
            .current
            .as_ref()
            .is_some_and(|s| !s.core().is_started());
        if pending {
            if let Some(state) = self.current.take() {
                self.activate(state, ctx, world);
            }
        }
    }

    fn step_safe_path(&mut self, ctx: &TickContext, world: &mut W) {
        let Some(state) = self.current.as_mut() else {
            return;
        };
        if !state.core().safe_path.is_active() {
            return;
        }
        let inputs = SafePathInputs {
            desired: state.desired_safe_path_position(&self.context, world),
            ignore_initial_danger: state.ignore_initial_danger_check(),
        };
        let env = self.context.safe_path_env();
        state.core_mut().safe_path.step(ctx, &env, world, inputs);
    }
}

/// Update every machine in agent-id order.
pub fn update_machines<W>(ctx: &TickContext, world: &mut W, machines: &mut [StateMachine<W>])
where
    W: AgentWorld + 'static,
{
    machines.sort_by_key(|m| m.agent().stable_id());
    for machine in machines.iter_mut() {
        machine.update(ctx, world);
    }
}
