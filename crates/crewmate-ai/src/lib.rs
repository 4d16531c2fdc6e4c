//! Umbrella crate that re-exports the crew-bot behavior engine building blocks.
//!
//! Hosts usually enable `full`, load an [`AiConfig`](core::AiConfig), build the shared
//! [`ThreatRegistry`](threat::ThreatRegistry) with [`load_shared`], and create one
//! [`StateMachine`](fsm::StateMachine) per agent.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use ai_core as core;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use ai_nav as nav;

#[cfg(feature = "threat")]
#[cfg_attr(docsrs, doc(cfg(feature = "threat")))]
pub use ai_threat as threat;

#[cfg(feature = "safepath")]
#[cfg_attr(docsrs, doc(cfg(feature = "safepath")))]
pub use ai_safepath as safepath;

#[cfg(feature = "fsm")]
#[cfg_attr(docsrs, doc(cfg(feature = "fsm")))]
pub use ai_fsm as fsm;

/// Load the config at `path` and build the threat registry from its table.
#[cfg(feature = "threat")]
#[cfg_attr(docsrs, doc(cfg(feature = "threat")))]
pub fn load_shared(
    path: &std::path::Path,
) -> anyhow::Result<(
    std::sync::Arc<ai_core::AiConfig>,
    std::sync::Arc<ai_threat::ThreatRegistry>,
)> {
    use anyhow::Context;

    let config = ai_core::AiConfig::load(path)?;
    let registry = ai_threat::ThreatRegistry::from_table(&config.threats.table)
        .with_context(|| format!("Invalid threat table in {}", path.display()))?;
    Ok((std::sync::Arc::new(config), std::sync::Arc::new(registry)))
}
