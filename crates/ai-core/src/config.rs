//! Tunable behavior-engine configuration, loadable from YAML.
//!
//! Every section defaults independently, so a config file only needs to name the values it
//! overrides.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, DayPhase, TickContext};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub tick: TickConfig,
    pub states: StateConfig,
    pub safe_path: SafePathConfig,
    pub entrances: EntranceConfig,
    pub threats: ThreatConfig,
    pub return_to_base: ReturnConfig,
    pub directives: DirectiveConfig,
}

/// Cadence of the per-state decision update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    /// Seconds between two `tick` calls on the active state, and the hold time of the
    /// safe-path loop between iterations.
    pub ai_interval_seconds: f32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            ai_interval_seconds: 0.2,
        }
    }
}

impl TickConfig {
    /// Whether enough simulated time has passed since `last` for another decision update.
    pub fn should_think(&self, ctx: &TickContext, last: Option<f32>) -> bool {
        match last {
            None => true,
            Some(last) => ctx.time - last >= self.ai_interval_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Longest chain of predecessor states kept for reverting. Older ones are discarded.
    pub max_saved_states: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_saved_states: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafePathConfig {
    /// Candidate nodes examined before the router yields back to the scheduler.
    pub nodes_per_yield: usize,
    /// Hostiles swept for line of sight before the router yields.
    pub hostiles_per_yield: usize,
    /// Height of the simulated eye point above a node or anchor.
    pub eye_height: f32,
    /// Search radius for navmesh snapping.
    pub navmesh_sample_radius: f32,
}

impl Default for SafePathConfig {
    fn default() -> Self {
        Self {
            nodes_per_yield: 15,
            hostiles_per_yield: 10,
            eye_height: 1.8,
            navmesh_sample_radius: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntranceConfig {
    /// Lifetime of a cached safety verdict, in simulated seconds.
    pub safety_ttl_seconds: f32,
    /// A live hostile closer than this squared distance to an anchor makes it unsafe.
    pub danger_distance_sq: f32,
    /// Distance from a solid hazard volume that still counts as covered.
    pub solid_hazard_buffer: f32,
    /// Prefer the front entrance while the day is in its dawn phase.
    pub front_only_at_dawn: bool,
}

impl Default for EntranceConfig {
    fn default() -> Self {
        Self {
            safety_ttl_seconds: 1.0,
            danger_distance_sq: 59.3,
            solid_hazard_buffer: 0.5,
            front_only_at_dawn: true,
        }
    }
}

/// A data-driven threat registration: constant fear ranges per purpose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatEntry {
    pub kind: String,
    #[serde(default)]
    pub panic_range: Option<f32>,
    #[serde(default)]
    pub remote_alert_range: Option<f32>,
    #[serde(default)]
    pub pathfind_avoid_range: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreatConfig {
    /// Kind whose presence triggers the panic directive and vetoes entrance use.
    pub panic_kind: String,
    /// Kind that makes agents crouch when close.
    pub crouch_kind: Option<String>,
    pub crouch_detection_range: f32,
    pub table: Vec<ThreatEntry>,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            panic_kind: "jester".to_string(),
            crouch_kind: Some("eyeless_dog".to_string()),
            crouch_detection_range: 20.0,
            table: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnConfig {
    /// Day phase from which agents head back on their own.
    pub late_phase: DayPhase,
}

impl Default for ReturnConfig {
    fn default() -> Self {
        Self {
            late_phase: DayPhase::Midnight,
        }
    }
}

/// Words recognized in radio signals and chat, matched against lowercase text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveConfig {
    pub return_words: Vec<String>,
    pub panic_words: Vec<String>,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            return_words: vec!["return".to_string(), "come back".to_string()],
            panic_words: vec!["panic".to_string(), "jester".to_string()],
        }
    }
}

impl AiConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read AI config from {}", path.display()))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse AI config from {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            threats = config.threats.table.len(),
            "loaded AI config"
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("tick.ai_interval_seconds", self.tick.ai_interval_seconds)?;
        positive(
            "states.max_saved_states",
            self.states.max_saved_states as f32,
        )?;
        positive(
            "safe_path.nodes_per_yield",
            self.safe_path.nodes_per_yield as f32,
        )?;
        positive(
            "safe_path.hostiles_per_yield",
            self.safe_path.hostiles_per_yield as f32,
        )?;
        positive(
            "entrances.safety_ttl_seconds",
            self.entrances.safety_ttl_seconds,
        )?;

        let mut seen = BTreeSet::new();
        for entry in &self.threats.table {
            if !seen.insert(entry.kind.as_str()) {
                return Err(ConfigError::DuplicateThreat(entry.kind.clone()));
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}
