use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::core::tts::ProviderKind;

/// Single-hop fallback routes between providers.
///
/// Built once and never mutated while jobs run. Routes from a provider to
/// itself are dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    routes: HashMap<ProviderKind, ProviderKind>,
}

impl FallbackPolicy {
    pub fn new(routes: HashMap<ProviderKind, ProviderKind>) -> Self {
        Self {
            routes: routes.into_iter().filter(|(p, f)| p != f).collect(),
        }
    }

    /// No fallback for any provider.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.fallbacks.clone())
    }

    pub fn with_route(mut self, primary: ProviderKind, fallback: ProviderKind) -> Self {
        if primary != fallback {
            self.routes.insert(primary, fallback);
        }
        self
    }

    pub fn fallback_for(&self, primary: ProviderKind) -> Option<ProviderKind> {
        self.routes.get(&primary).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_defaults() {
        let policy = FallbackPolicy::from_config(&PipelineConfig::default());
        assert_eq!(policy.fallback_for(ProviderKind::Google), Some(ProviderKind::OpenAI));
        assert_eq!(policy.fallback_for(ProviderKind::OpenAI), Some(ProviderKind::Google));
    }

    #[test]
    fn test_self_route_dropped() {
        let policy = FallbackPolicy::none()
            .with_route(ProviderKind::Google, ProviderKind::Google)
            .with_route(ProviderKind::OpenAI, ProviderKind::Google);
        assert_eq!(policy.fallback_for(ProviderKind::Google), None);
        assert_eq!(policy.fallback_for(ProviderKind::OpenAI), Some(ProviderKind::Google));

        let mut routes = HashMap::new();
        routes.insert(ProviderKind::OpenAI, ProviderKind::OpenAI);
        assert_eq!(FallbackPolicy::new(routes), FallbackPolicy::none());
    }
}
