//! Static catalogue of the six effects

use crate::effects::{EducationalContent, Effect, EffectId, UnknownEffectError};
use crate::params::{EffectParams, ParamSpec};
use std::sync::OnceLock;

/// Display and parameter metadata for one effect
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDefinition {
    pub id: EffectId,
    pub name: &'static str,
    pub emoji: &'static str,
    /// Accent colour as `#RRGGBB`
    pub color: &'static str,
    pub defaults: EffectParams,
    pub params: &'static [ParamSpec],
    pub educational: &'static EducationalContent,
}

impl EffectDefinition {
    fn build(id: EffectId) -> Self {
        let (emoji, color) = match id {
            EffectId::Chipmunk => ("🐿️", "#F472B6"),
            EffectId::DeepVoice => ("🎙️", "#8B5CF6"),
            EffectId::Robot => ("🤖", "#06B6D4"),
            EffectId::Telephone => ("📞", "#F59E0B"),
            EffectId::Echo => ("🏔️", "#10B981"),
            EffectId::Alien => ("👽", "#6366F1"),
        };
        let effect = Effect::from_id(id);
        Self {
            id,
            name: id.display_name(),
            emoji,
            color,
            defaults: effect.default_params(),
            params: EffectParams::specs_for(id),
            educational: effect.educational(),
        }
    }
}

/// Registry of effect definitions, built once
pub struct EffectRegistry {
    definitions: Vec<EffectDefinition>,
}

impl EffectRegistry {
    fn new() -> Self {
        Self {
            definitions: EffectId::ALL.into_iter().map(EffectDefinition::build).collect(),
        }
    }

    /// Process-wide registry
    pub fn global() -> &'static EffectRegistry {
        static REGISTRY: OnceLock<EffectRegistry> = OnceLock::new();
        REGISTRY.get_or_init(EffectRegistry::new)
    }

    /// All definitions in display order
    pub fn list(&self) -> &[EffectDefinition] {
        &self.definitions
    }

    /// Look up an effect by identifier
    pub fn get(&self, id: &str) -> Result<Effect, UnknownEffectError> {
        id.parse::<EffectId>().map(Effect::from_id)
    }

    pub fn definition(&self, id: EffectId) -> &EffectDefinition {
        // `definitions` is built from `EffectId::ALL`, in the same order
        let index = EffectId::ALL.iter().position(|e| *e == id).unwrap_or(0);
        &self.definitions[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_six_effects_in_order() {
        let registry = EffectRegistry::global();
        let ids: Vec<&str> = registry.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            ["chipmunk", "deepVoice", "robot", "telephone", "echo", "alien"]
        );
        // Stable across calls
        assert_eq!(registry.list(), EffectRegistry::global().list());
    }

    #[test]
    fn test_default_wet_dry_in_unit_range() {
        for def in EffectRegistry::global().list() {
            let wet = def.defaults.wet_dry();
            assert!((0.0..=1.0).contains(&wet), "{}: {wet}", def.name);
        }
    }

    #[test]
    fn test_get_unknown_effect() {
        let registry = EffectRegistry::global();
        assert_eq!(registry.get("echo").unwrap().id(), EffectId::Echo);
        let err = registry.get("vocoder").unwrap_err();
        assert_eq!(err, UnknownEffectError("vocoder".into()));
    }

    #[test]
    fn test_definition_matches_id() {
        let registry = EffectRegistry::global();
        for id in EffectId::ALL {
            let def = registry.definition(id);
            assert_eq!(def.id, id);
            assert_eq!(def.defaults.id(), id);
            assert!(def.color.starts_with('#'));
        }
    }
}
