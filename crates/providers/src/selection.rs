use marquee_core::types::ContentRef;

use crate::ProviderError;
use crate::provider::Provider;
use crate::registry::Registry;
use crate::resolve::resolve_ref;

/// The provider chosen for one player.
///
/// Exactly one provider is selected at any time. It starts at the first
/// enabled entry and only changes through [`PlayerSelection::select`].
#[derive(Debug, Clone)]
pub struct PlayerSelection<'r> {
    registry: &'r Registry,
    index: usize,
}

impl<'r> PlayerSelection<'r> {
    pub fn new(registry: &'r Registry) -> Result<Self, ProviderError> {
        let index = registry
            .all()
            .iter()
            .position(|p| !p.disabled)
            .ok_or(ProviderError::NoneEnabled)?;
        Ok(Self { registry, index })
    }

    /// Start from `name` when given, else from the default provider.
    pub fn starting_at(registry: &'r Registry, name: Option<&str>) -> Result<Self, ProviderError> {
        let mut selection = Self::new(registry)?;
        if let Some(name) = name {
            selection.select(name)?;
        }
        Ok(selection)
    }

    pub fn provider(&self) -> &'r Provider {
        &self.registry.all()[self.index]
    }

    /// Switch to another provider. On error the current selection stays.
    pub fn select(&mut self, name: &str) -> Result<&'r Provider, ProviderError> {
        self.registry.get_enabled(name)?;
        let index = self
            .registry
            .position(name)
            .ok_or_else(|| ProviderError::Unknown(name.to_string()))?;
        self.index = index;
        Ok(self.provider())
    }

    pub fn player_url(&self, content: &ContentRef) -> Option<String> {
        resolve_ref(content, self.provider())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_enabled() {
        let registry = Registry::builtin();
        let selection = PlayerSelection::new(&registry).unwrap();
        assert_eq!(selection.provider().name, "Agent");
    }

    #[test]
    fn select_switches_and_resolves() {
        let registry = Registry::builtin();
        let mut selection = PlayerSelection::new(&registry).unwrap();
        selection.select("VidSrc").unwrap();
        assert_eq!(
            selection.player_url(&ContentRef::movie(550)).as_deref(),
            Some("https://vidsrc.net/embed/movie/550")
        );
    }

    #[test]
    fn failed_select_keeps_previous_choice() {
        let registry = Registry::builtin().with_disabled(&["EmbedSu"]);
        let mut selection = PlayerSelection::new(&registry).unwrap();
        selection.select("VidLink").unwrap();

        assert!(selection.select("EmbedSu").is_err());
        assert!(selection.select("Unknown").is_err());
        assert_eq!(selection.provider().name, "VidLink");
    }

    #[test]
    fn two_players_do_not_share_state() {
        let registry = Registry::builtin();
        let mut a = PlayerSelection::new(&registry).unwrap();
        let b = PlayerSelection::new(&registry).unwrap();
        a.select("MovieKex").unwrap();
        assert_eq!(b.provider().name, "Agent");
    }

    #[test]
    fn starting_at_rejects_disabled() {
        let registry = Registry::builtin().with_disabled(&["Agent"]);
        assert_eq!(
            PlayerSelection::starting_at(&registry, Some("Agent")).unwrap_err(),
            ProviderError::Disabled("Agent".into())
        );
        let selection = PlayerSelection::starting_at(&registry, None).unwrap();
        assert_eq!(selection.provider().name, "VidSrc");
    }
}
