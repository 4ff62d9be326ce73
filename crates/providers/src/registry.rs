use tracing::warn;

use crate::ProviderError;
use crate::catalog;
use crate::provider::{Provider, ProviderInfo};

/// Ordered, fixed list of providers.
///
/// Nothing mutates a registry after construction; disabling a provider is
/// done by building a new one with [`Registry::with_disabled`] at startup.
#[derive(Debug, Clone)]
pub struct Registry {
    providers: Vec<Provider>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Registry {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn builtin() -> Self {
        Self::new(catalog::builtin())
    }

    /// Copy of this registry with the named providers marked disabled.
    /// Unknown names are logged and ignored.
    pub fn with_disabled<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut providers = self.providers.clone();
        for name in names {
            let name = name.as_ref();
            match providers.iter_mut().find(|p| p.name == name) {
                Some(p) => p.disabled = true,
                None => warn!(provider = %name, "ignoring unknown provider in disable list"),
            }
        }
        Self { providers }
    }

    pub fn all(&self) -> &[Provider] {
        &self.providers
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Provider> {
        self.providers.iter().filter(|p| !p.disabled)
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name == name)
    }

    /// Look up a provider that may be selected for playback.
    pub fn get_enabled(&self, name: &str) -> Result<&Provider, ProviderError> {
        match self.get(name) {
            Some(p) if p.disabled => Err(ProviderError::Disabled(name.to_string())),
            Some(p) => Ok(p),
            None => Err(ProviderError::Unknown(name.to_string())),
        }
    }

    /// First non-disabled provider in registry order.
    pub fn default_provider(&self) -> Option<&Provider> {
        self.enabled().next()
    }

    pub fn infos(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(Provider::info).collect()
    }
}
