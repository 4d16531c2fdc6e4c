use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use ai_core::{AgentId, ThreatEntry, Vec3};
use ai_nav::Hostile;

use crate::{FearPurpose, FearQuery, ThreatError};

/// Effective range of a threat for one purpose, or `None` when the threat is not a concern.
pub type FearFn = Arc<dyn Fn(&FearQuery<'_>) -> Option<f32> + Send + Sync>;

#[derive(Clone)]
pub struct ThreatDescriptor {
    kind: String,
    panic_trigger: Option<FearFn>,
    remote_alert_trigger: Option<FearFn>,
    pathfind_avoid: Option<FearFn>,
}

impl ThreatDescriptor {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            panic_trigger: None,
            remote_alert_trigger: None,
            pathfind_avoid: None,
        }
    }

    pub fn with(
        mut self,
        purpose: FearPurpose,
        f: impl Fn(&FearQuery<'_>) -> Option<f32> + Send + Sync + 'static,
    ) -> Self {
        let f: FearFn = Arc::new(f);
        match purpose {
            FearPurpose::PanicTrigger => self.panic_trigger = Some(f),
            FearPurpose::RemoteAlertTrigger => self.remote_alert_trigger = Some(f),
            FearPurpose::PathfindAvoid => self.pathfind_avoid = Some(f),
        }
        self
    }

    /// Bind a constant range.
    pub fn with_range(self, purpose: FearPurpose, range: f32) -> Self {
        self.with(purpose, move |_| Some(range))
    }

    pub fn from_entry(entry: &ThreatEntry) -> Self {
        let mut descriptor = Self::new(entry.kind.clone());
        let ranges = [
            (FearPurpose::PanicTrigger, entry.panic_range),
            (FearPurpose::RemoteAlertTrigger, entry.remote_alert_range),
            (FearPurpose::PathfindAvoid, entry.pathfind_avoid_range),
        ];
        for (purpose, range) in ranges {
            if let Some(range) = range {
                descriptor = descriptor.with_range(purpose, range);
            }
        }
        descriptor
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn function(&self, purpose: FearPurpose) -> Option<&FearFn> {
        match purpose {
            FearPurpose::PanicTrigger => self.panic_trigger.as_ref(),
            FearPurpose::RemoteAlertTrigger => self.remote_alert_trigger.as_ref(),
            FearPurpose::PathfindAvoid => self.pathfind_avoid.as_ref(),
        }
    }
}

impl fmt::Debug for ThreatDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreatDescriptor")
            .field("kind", &self.kind)
            .field("panic_trigger", &self.panic_trigger.is_some())
            .field("remote_alert_trigger", &self.remote_alert_trigger.is_some())
            .field("pathfind_avoid", &self.pathfind_avoid.is_some())
            .finish()
    }
}

/// Threat kind → descriptor. Built once at startup, then shared read-only.
#[derive(Debug, Default, Clone)]
pub struct ThreatRegistry {
    descriptors: HashMap<String, ThreatDescriptor>,
}

impl ThreatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: &[ThreatEntry]) -> Result<Self, ThreatError> {
        let mut registry = Self::new();
        for entry in table {
            registry.register(ThreatDescriptor::from_entry(entry))?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ThreatDescriptor) -> Result<(), ThreatError> {
        if self.descriptors.contains_key(descriptor.kind()) {
            return Err(ThreatError::DuplicateKind(descriptor.kind.clone()));
        }
        self.descriptors.insert(descriptor.kind.clone(), descriptor);
        Ok(())
    }

    pub fn with(mut self, descriptor: ThreatDescriptor) -> Result<Self, ThreatError> {
        self.register(descriptor)?;
        Ok(self)
    }

    pub fn get(&self, kind: &str) -> Option<&ThreatDescriptor> {
        self.descriptors.get(kind)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn evaluate(&self, query: &FearQuery<'_>) -> Option<f32> {
        let descriptor = self.descriptors.get(&query.threat.kind)?;
        let f = descriptor.function(query.purpose)?;
        f(query)
    }

    /// Effective range of `threat` for `purpose` as seen from `agent_position`.
    pub fn fear_range(
        &self,
        purpose: FearPurpose,
        agent: AgentId,
        agent_position: Vec3,
        threat: &Hostile,
    ) -> Option<f32> {
        self.evaluate(&FearQuery::new(purpose, agent, agent_position, threat))
    }

    /// Like [`ThreatRegistry::fear_range`] with the purpose given by name.
    ///
    /// An unrecognized name means the caller and the registry disagree on the set of
    /// purposes; it is logged and treated as no opinion.
    pub fn fear_range_named(
        &self,
        purpose: &str,
        agent: AgentId,
        agent_position: Vec3,
        threat: &Hostile,
    ) -> Option<f32> {
        match purpose.parse::<FearPurpose>() {
            Ok(purpose) => self.fear_range(purpose, agent, agent_position, threat),
            Err(err) => {
                tracing::error!(agent = ?agent, kind = %threat.kind, "{err}");
                None
            }
        }
    }

    /// Whether `threat` has a range for `purpose` and the agent stands inside it.
    pub fn within_fear_range(
        &self,
        purpose: FearPurpose,
        agent: AgentId,
        agent_position: Vec3,
        threat: &Hostile,
    ) -> bool {
        let query = FearQuery::new(purpose, agent, agent_position, threat);
        self.evaluate(&query).is_some_and(|range| query.distance <= range)
    }
}
