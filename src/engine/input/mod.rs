// Input handling system
//
// This module maps physical devices (keyboard, mouse, gamepads) onto typed
// logical actions, switches bindings with per-device contexts, and tracks
// per-tick edges for every action on every device.
//
// ## Architecture
//
// - `action`: Typed action handles and the table of declared actions
// - `source`: Physical input sources and how each one reads as an action value
// - `device`: Connected devices and their raw state
// - `context`: Named action sets and the per-device activation stacks
// - `config`: Settings and the textual binding table (TOML)
// - `state`: Per-device action state and the per-tick update
// - `manager`: `InputBuilder` (configuration) and `InputSystem` (runtime)
//
// ## Usage Example
//
// ```rust
// use rusted_input::engine::input::{DeviceId, InputBuilder, InputConfig};
//
// let mut builder = InputBuilder::new();
// let quit = builder.declare_bool("Quit")?;
// let default = builder.declare_context("Default", [quit.into()])?;
// builder.apply_config(&InputConfig::from_toml_str(r#"
//     [bindings.Default]
//     Quit = ["Escape"]
// "#)?)?;
//
// let mut input = builder.build();
// input.activate(default, DeviceId::ANY, 0);
//
// // In your event loop, feed window events
// input.process_window_event(&event);
//
// // Once per simulation step
// input.begin_tick();
// if input.just_pressed(quit, DeviceId::ANY) {
//     // Quit was pressed on some device
// }
// ```

pub mod action;
pub mod config;
pub mod context;
pub mod device;
pub mod manager;
pub mod source;
pub mod state;

use thiserror::Error;

// Re-export commonly used types
pub use action::{
    Action, ActionType, AnyAction, AxisAction, BoolAction, DeltaAction, DualAxisAction,
    HalfAxisAction,
};
pub use config::{BindingTable, ConfigError, InputConfig, InputSettings};
pub use context::ContextId;
pub use device::{DeviceId, DeviceInfo, DeviceKind, GamepadAxis, GamepadButton, RawEvent};
pub use manager::{InputBuilder, InputSystem};
pub use source::{Source, Stick};

/// Errors raised while configuring the input system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("an action named '{0}' already exists")]
    DuplicateName(String),

    #[error("too many actions (max {max})")]
    TooManyActions { max: usize },

    #[error("cannot declare '{0}' once the input system is running")]
    DeclaredAfterStart(String),

    #[error("a context named '{0}' already exists")]
    DuplicateContext(String),

    #[error("unknown context '{0}'")]
    UnknownContext(String),

    #[error("unknown action '{action}' in context '{context}'")]
    UnknownAction { context: String, action: String },

    #[error("action '{action}' is not part of context '{context}'")]
    ActionNotInContext { context: String, action: String },

    #[error("unknown source '{name}' for action '{action}' in context '{context}'")]
    UnknownSource {
        context: String,
        action: String,
        name: String,
    },

    #[error("too many devices (max {max})")]
    TooManyDevices { max: usize },
}
