use std::sync::Arc;

use ai_core::{AgentId, AiConfig};
use ai_nav::Region;
use ai_safepath::SafePathEnv;
use ai_threat::ThreatRegistry;

/// Per-agent data every state hook can read.
#[derive(Debug, Clone)]
pub struct AgentContext {
    pub id: AgentId,
    /// Whether the agent is currently in the interior.
    pub inside: bool,
    pub config: Arc<AiConfig>,
    pub threats: Arc<ThreatRegistry>,
}

impl AgentContext {
    pub fn new(id: AgentId, config: Arc<AiConfig>, threats: Arc<ThreatRegistry>) -> Self {
        Self {
            id,
            inside: false,
            config,
            threats,
        }
    }

    pub fn inside(mut self, inside: bool) -> Self {
        self.inside = inside;
        self
    }

    pub fn region(&self) -> Region {
        Region::from_inside(self.inside)
    }

    pub fn safe_path_env(&self) -> SafePathEnv<'_> {
        SafePathEnv {
            agent: self.id,
            inside: self.inside,
            threats: &self.threats,
            config: &self.config,
        }
    }
}
