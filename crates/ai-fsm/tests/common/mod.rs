#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use ai_core::{AgentId, AiConfig, HostileId, TickContext, Vec3};
use ai_fsm::{
    AgentContext, BehaviorState, Directive, HeldItem, ItemUse, StateCatalog, StateCore,
    StateKind, StateMachine, StateSeed,
};
use ai_nav::testing::MockWorld;
use ai_threat::{FearPurpose, ThreatDescriptor, ThreatRegistry};

pub const AGENT: AgentId = AgentId(1);

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn registry() -> ThreatRegistry {
    ThreatRegistry::new()
        .with(
            ThreatDescriptor::new("jester")
                .with_range(FearPurpose::PanicTrigger, 8.0)
                .with_range(FearPurpose::PathfindAvoid, 8.0),
        )
        .and_then(|r| {
            r.with(ThreatDescriptor::new("bracken").with_range(FearPurpose::PathfindAvoid, 6.0))
        })
        .expect("registry")
}

pub fn context(inside: bool) -> AgentContext {
    AgentContext::new(AGENT, Arc::new(AiConfig::default()), Arc::new(registry())).inside(inside)
}

pub fn at(time: f32) -> TickContext {
    TickContext::new((time * 50.0) as u64, time, 0.02)
}

/// What a [`Scripted`] state returns from its next `tick`.
pub enum Step {
    Stay,
    Go(&'static str, Vec<Step>),
    GoSkipping(&'static str, Vec<Step>),
    Revert,
    Home,
    Panic(HostileId),
}

/// A behavior state that plays back a list of directives and records its lifecycle.
pub struct Scripted {
    core: StateCore<MockWorld>,
    kind: &'static str,
    log: Log,
    plan: VecDeque<Step>,
    pub desired: Option<Vec3>,
    pub billboard: Option<String>,
}

impl Scripted {
    pub fn new(seed: StateSeed<MockWorld>, kind: &'static str, log: Log, plan: Vec<Step>) -> Self {
        Self {
            core: seed.into_core(),
            kind,
            log,
            plan: plan.into(),
            desired: None,
            billboard: None,
        }
    }

    pub fn boxed(
        seed: StateSeed<MockWorld>,
        kind: &'static str,
        log: Log,
        plan: Vec<Step>,
    ) -> Box<dyn BehaviorState<MockWorld>> {
        Box::new(Self::new(seed, kind, log, plan))
    }

    /// A state that routes towards `desired` as soon as it is entered.
    pub fn routing(
        seed: StateSeed<MockWorld>,
        kind: &'static str,
        log: Log,
        plan: Vec<Step>,
        desired: Vec3,
    ) -> Box<dyn BehaviorState<MockWorld>> {
        let mut state = Self::new(seed, kind, log, plan);
        state.desired = Some(desired);
        Box::new(state)
    }

    fn record(&self, line: String) {
        self.log.borrow_mut().push(line);
    }
}

impl BehaviorState<MockWorld> for Scripted {
    fn kind(&self) -> StateKind {
        StateKind(self.kind)
    }

    fn core(&self) -> &StateCore<MockWorld> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut StateCore<MockWorld> {
        &mut self.core
    }

    fn enter(
        &mut self,
        first_entry: bool,
        _ctx: &TickContext,
        _agent: &AgentContext,
        _world: &mut MockWorld,
    ) {
        let previous = match self.core.previous.as_ref() {
            Some(prev) => format!(
                "{} router={} pending={}",
                prev.kind(),
                prev.core().safe_path.is_active(),
                prev.core().safe_path.has_pending_path()
            ),
            None => "none".to_string(),
        };
        self.record(format!(
            "enter {} first={} prev={}",
            self.kind, first_entry, previous
        ));
        if self.desired.is_some() {
            self.core.safe_path.start();
        }
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: &AgentContext,
        _world: &mut MockWorld,
    ) -> Directive<MockWorld> {
        self.record(format!("tick {}", self.kind));
        let log = Rc::clone(&self.log);
        match self.plan.pop_front().unwrap_or(Step::Stay) {
            Step::Stay => Directive::Stay,
            Step::Go(kind, plan) => {
                Directive::switch(move |seed| Scripted::boxed(seed, kind, log, plan))
            }
            Step::GoSkipping(kind, plan) => Directive::Switch(
                ai_fsm::Transition::to(move |seed| Scripted::boxed(seed, kind, log, plan))
                    .skip_to_previous(),
            ),
            Step::Revert => Directive::Revert,
            Step::Home => Directive::ReturnToBase,
            Step::Panic(hostile) => Directive::Panic(hostile),
        }
    }

    fn desired_safe_path_position(
        &self,
        _agent: &AgentContext,
        _world: &MockWorld,
    ) -> Option<Vec3> {
        self.desired
    }

    fn billboard_indicator(&self) -> Option<String> {
        self.billboard.clone()
    }

    fn use_weapon(
        &mut self,
        item: &HeldItem,
        _agent: &AgentContext,
        _world: &mut MockWorld,
    ) -> ItemUse {
        self.record(format!("weapon {}", item.name));
        ItemUse::Used
    }
}

pub struct TestCatalog {
    pub log: Log,
}

impl StateCatalog<MockWorld> for TestCatalog {
    fn return_to_base(&self, seed: StateSeed<MockWorld>) -> Box<dyn BehaviorState<MockWorld>> {
        Scripted::boxed(seed, "return_to_base", Rc::clone(&self.log), Vec::new())
    }

    fn panic(
        &self,
        seed: StateSeed<MockWorld>,
        _threat: HostileId,
    ) -> Box<dyn BehaviorState<MockWorld>> {
        Scripted::boxed(seed, "panic", Rc::clone(&self.log), Vec::new())
    }
}

pub fn catalog(log: &Log) -> Arc<dyn StateCatalog<MockWorld>> {
    Arc::new(TestCatalog {
        log: Rc::clone(log),
    })
}

pub fn machine(inside: bool, plan: Vec<Step>) -> (StateMachine<MockWorld>, Log) {
    let log: Log = Rc::default();
    let catalog = catalog(&log);
    let initial_log = Rc::clone(&log);
    let machine = StateMachine::new(context(inside), catalog, move |seed| {
        Scripted::boxed(seed, "idle", initial_log, plan)
    });
    (machine, log)
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}
