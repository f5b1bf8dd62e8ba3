use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use driftwatch_domain::CloudProvider;

use crate::error::ProviderError;
use crate::provider::Provider;

/// Process-wide map from [`CloudProvider`] to the [`Provider`] implementation
/// that speaks to it.
///
/// Built once at daemon startup and shared behind an `Arc`; reads during a
/// reconciliation tick never block each other or a concurrent `register`.
/// Tests should build their own `ProviderRegistry` rather than touch a global
/// one — there is no global instance here, unlike some service-locator
/// patterns.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<CloudProvider, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { providers: RwLock::new(HashMap::new()) }
    }

    pub fn register(&self, provider: CloudProvider, implementation: Arc<dyn Provider>) {
        self.providers
            .write()
            .expect("provider registry lock poisoned")
            .insert(provider, implementation);
    }

    pub fn get(&self, provider: &CloudProvider) -> Result<Arc<dyn Provider>, ProviderError> {
        self.providers
            .read()
            .expect("provider registry lock poisoned")
            .get(provider)
            .cloned()
            .ok_or_else(|| ProviderError::NotRegistered(provider.to_string()))
    }

    pub fn registered(&self) -> Vec<CloudProvider> {
        self.providers
            .read()
            .expect("provider registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalProvider;

    #[test]
    fn unregistered_provider_errors() {
        let registry = ProviderRegistry::new();
        let err = registry.get(&CloudProvider::Aws).unwrap_err();
        assert!(matches!(err, ProviderError::NotRegistered(_)));
    }

    #[test]
    fn registered_provider_resolves() {
        let registry = ProviderRegistry::new();
        registry.register(CloudProvider::Local, Arc::new(LocalProvider::new(vec![])));
        assert!(registry.get(&CloudProvider::Local).is_ok());
        assert_eq!(registry.registered(), vec![CloudProvider::Local]);
    }
}
