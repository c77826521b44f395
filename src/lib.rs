//! Logical input layer.
//!
//! Maps physical devices (keyboard, mouse, gamepads) to typed game actions
//! through named binding contexts, and resolves every simulation tick which
//! actions are pressed, just pressed, just released or deflected.
//!
//! See [`engine::input`] for the full tour.

pub mod core;
pub mod engine;
