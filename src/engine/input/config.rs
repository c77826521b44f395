// Input configuration: tuning settings and the textual binding table

use super::action::{ActionTable, AnyAction};
use super::context::{ContextId, ContextTable};
use super::source::Source;
use super::InputError;
use crate::core::math::{clamp, DEFAULT_DEAD_ZONE};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Binding table: context name -> action name -> source names
pub type BindingTable = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Tuning applied when reading analog sources
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Normalized magnitude below which axis readings snap to zero
    pub dead_zone: f32,

    /// Multiplier for stick and axis readings of Delta actions
    pub stick_delta_scale: f32,
}

impl InputSettings {
    /// Keep the dead zone inside `0.0..=1.0`
    pub fn sanitized(self) -> Self {
        Self {
            dead_zone: clamp(self.dead_zone, 0.0, 1.0),
            ..self
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            stick_delta_scale: 1.0,
        }
    }
}

/// Complete input configuration as stored in TOML
///
/// ```toml
/// [settings]
/// dead_zone = 0.1
///
/// [bindings.Default]
/// Quit = ["Escape"]
/// Start = ["Space", "Mouse Left"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub settings: InputSettings,
    pub bindings: BindingTable,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read input config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid bindings: {0}")]
    Bindings(#[from] InputError),
}

impl InputConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Resolved bindings for one context
pub(crate) type ContextBindings = (ContextId, Vec<(AnyAction, Source)>);

/// Resolve every name in a binding table
///
/// Nothing is returned unless the whole table is valid, so callers can commit
/// the result without leaving a half-applied table behind.
pub(crate) fn resolve_bindings(
    table: &BindingTable,
    actions: &ActionTable,
    contexts: &ContextTable,
) -> Result<Vec<ContextBindings>, InputError> {
    let mut resolved = Vec::with_capacity(table.len());

    for (context_name, entries) in table {
        let context = contexts
            .get(context_name)
            .ok_or_else(|| InputError::UnknownContext(context_name.clone()))?;

        let mut bindings = Vec::new();
        for (action_name, sources) in entries {
            let action = actions.get(action_name).ok_or_else(|| InputError::UnknownAction {
                context: context_name.clone(),
                action: action_name.clone(),
            })?;
            if !contexts.lists(context, action) {
                return Err(InputError::ActionNotInContext {
                    context: context_name.clone(),
                    action: action_name.clone(),
                });
            }

            for source_name in sources {
                let source: Source = source_name.parse().map_err(|_| InputError::UnknownSource {
                    context: context_name.clone(),
                    action: action_name.clone(),
                    name: source_name.clone(),
                })?;
                if !bindings.contains(&(action, source)) {
                    bindings.push((action, source));
                }
            }
        }

        resolved.push((context, bindings));
    }

    Ok(resolved)
}
