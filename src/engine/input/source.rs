// Binding sources: the physical signals an action can be fed from

use super::config::InputSettings;
use super::device::{DeviceInfo, GamepadAxis, GamepadButton, RawState};
use crate::core::math::{apply_dead_zone, normalize_axis, normalize_half_axis};
use glam::Vec2;
use std::fmt;
use std::str::FromStr;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// One of the two analog sticks of a gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    /// The (horizontal, vertical) axes of this stick
    pub fn axes(self) -> (GamepadAxis, GamepadAxis) {
        match self {
            Self::Left => (GamepadAxis::LeftX, GamepadAxis::LeftY),
            Self::Right => (GamepadAxis::RightX, GamepadAxis::RightY),
        }
    }
}

/// A physical input signal that can be bound to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Key(KeyCode),
    MouseButton(MouseButton),
    MouseWheel,
    MouseMotion,
    GamepadButton(GamepadButton),
    GamepadAxis(GamepadAxis),
    GamepadStick(Stick),
}

impl Source {
    /// Check if a device can produce this signal
    pub fn is_produced_by(&self, device: &DeviceInfo) -> bool {
        match self {
            Self::Key(_) | Self::MouseButton(_) | Self::MouseWheel | Self::MouseMotion => {
                device.is_keyboard()
            }
            Self::GamepadButton(_) | Self::GamepadAxis(_) | Self::GamepadStick(_) => {
                device.is_gamepad()
            }
        }
    }
}

const KEY_NAMES: &[(&str, KeyCode)] = &[
    ("A", KeyCode::KeyA),
    ("B", KeyCode::KeyB),
    ("C", KeyCode::KeyC),
    ("D", KeyCode::KeyD),
    ("E", KeyCode::KeyE),
    ("F", KeyCode::KeyF),
    ("G", KeyCode::KeyG),
    ("H", KeyCode::KeyH),
    ("I", KeyCode::KeyI),
    ("J", KeyCode::KeyJ),
    ("K", KeyCode::KeyK),
    ("L", KeyCode::KeyL),
    ("M", KeyCode::KeyM),
    ("N", KeyCode::KeyN),
    ("O", KeyCode::KeyO),
    ("P", KeyCode::KeyP),
    ("Q", KeyCode::KeyQ),
    ("R", KeyCode::KeyR),
    ("S", KeyCode::KeyS),
    ("T", KeyCode::KeyT),
    ("U", KeyCode::KeyU),
    ("V", KeyCode::KeyV),
    ("W", KeyCode::KeyW),
    ("X", KeyCode::KeyX),
    ("Y", KeyCode::KeyY),
    ("Z", KeyCode::KeyZ),
    ("0", KeyCode::Digit0),
    ("1", KeyCode::Digit1),
    ("2", KeyCode::Digit2),
    ("3", KeyCode::Digit3),
    ("4", KeyCode::Digit4),
    ("5", KeyCode::Digit5),
    ("6", KeyCode::Digit6),
    ("7", KeyCode::Digit7),
    ("8", KeyCode::Digit8),
    ("9", KeyCode::Digit9),
    ("F1", KeyCode::F1),
    ("F2", KeyCode::F2),
    ("F3", KeyCode::F3),
    ("F4", KeyCode::F4),
    ("F5", KeyCode::F5),
    ("F6", KeyCode::F6),
    ("F7", KeyCode::F7),
    ("F8", KeyCode::F8),
    ("F9", KeyCode::F9),
    ("F10", KeyCode::F10),
    ("F11", KeyCode::F11),
    ("F12", KeyCode::F12),
    ("Escape", KeyCode::Escape),
    ("Space", KeyCode::Space),
    ("Tab", KeyCode::Tab),
    ("Enter", KeyCode::Enter),
    ("Backspace", KeyCode::Backspace),
    ("Insert", KeyCode::Insert),
    ("Delete", KeyCode::Delete),
    ("Home", KeyCode::Home),
    ("End", KeyCode::End),
    ("Page Up", KeyCode::PageUp),
    ("Page Down", KeyCode::PageDown),
    ("Up", KeyCode::ArrowUp),
    ("Down", KeyCode::ArrowDown),
    ("Left", KeyCode::ArrowLeft),
    ("Right", KeyCode::ArrowRight),
    ("Left Shift", KeyCode::ShiftLeft),
    ("Right Shift", KeyCode::ShiftRight),
    ("Left Control", KeyCode::ControlLeft),
    ("Right Control", KeyCode::ControlRight),
    ("Left Alt", KeyCode::AltLeft),
    ("Right Alt", KeyCode::AltRight),
    ("Caps Lock", KeyCode::CapsLock),
    ("Minus", KeyCode::Minus),
    ("Equal", KeyCode::Equal),
    ("Comma", KeyCode::Comma),
    ("Period", KeyCode::Period),
    ("Slash", KeyCode::Slash),
    ("Semicolon", KeyCode::Semicolon),
    ("Quote", KeyCode::Quote),
    ("Backquote", KeyCode::Backquote),
    ("Backslash", KeyCode::Backslash),
    ("Left Bracket", KeyCode::BracketLeft),
    ("Right Bracket", KeyCode::BracketRight),
    ("Keypad 0", KeyCode::Numpad0),
    ("Keypad 1", KeyCode::Numpad1),
    ("Keypad 2", KeyCode::Numpad2),
    ("Keypad 3", KeyCode::Numpad3),
    ("Keypad 4", KeyCode::Numpad4),
    ("Keypad 5", KeyCode::Numpad5),
    ("Keypad 6", KeyCode::Numpad6),
    ("Keypad 7", KeyCode::Numpad7),
    ("Keypad 8", KeyCode::Numpad8),
    ("Keypad 9", KeyCode::Numpad9),
    ("Keypad Enter", KeyCode::NumpadEnter),
];

const MOUSE_BUTTON_NAMES: &[(&str, MouseButton)] = &[
    ("Mouse Left", MouseButton::Left),
    ("Mouse Right", MouseButton::Right),
    ("Mouse Middle", MouseButton::Middle),
    ("Mouse Back", MouseButton::Back),
    ("Mouse Forward", MouseButton::Forward),
];

const GAMEPAD_BUTTON_NAMES: &[(&str, GamepadButton)] = &[
    ("Button A", GamepadButton::A),
    ("Button B", GamepadButton::B),
    ("Button X", GamepadButton::X),
    ("Button Y", GamepadButton::Y),
    ("Button Back", GamepadButton::Back),
    ("Button Guide", GamepadButton::Guide),
    ("Button Start", GamepadButton::Start),
    ("Left Stick Button", GamepadButton::LeftStick),
    ("Right Stick Button", GamepadButton::RightStick),
    ("Left Shoulder", GamepadButton::LeftShoulder),
    ("Right Shoulder", GamepadButton::RightShoulder),
    ("Dpad Up", GamepadButton::DpadUp),
    ("Dpad Down", GamepadButton::DpadDown),
    ("Dpad Left", GamepadButton::DpadLeft),
    ("Dpad Right", GamepadButton::DpadRight),
];

const GAMEPAD_AXIS_NAMES: &[(&str, GamepadAxis)] = &[
    ("Left Stick X", GamepadAxis::LeftX),
    ("Left Stick Y", GamepadAxis::LeftY),
    ("Right Stick X", GamepadAxis::RightX),
    ("Right Stick Y", GamepadAxis::RightY),
    ("Left Trigger", GamepadAxis::LeftTrigger),
    ("Right Trigger", GamepadAxis::RightTrigger),
];

const STICK_NAMES: &[(&str, Stick)] = &[("Left Stick", Stick::Left), ("Right Stick", Stick::Right)];

fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

fn reverse<T: PartialEq>(table: &'static [(&'static str, T)], value: &T) -> Option<&'static str> {
    table.iter().find(|(_, v)| v == value).map(|(n, _)| *n)
}

/// Error returned when a source name is not part of the vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSourceName;

impl FromStr for Source {
    type Err = UnknownSourceName;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Mouse Wheel" => return Ok(Self::MouseWheel),
            "Mouse Motion" => return Ok(Self::MouseMotion),
            _ => {}
        }
        lookup(KEY_NAMES, name)
            .map(Self::Key)
            .or_else(|| lookup(MOUSE_BUTTON_NAMES, name).map(Self::MouseButton))
            .or_else(|| lookup(GAMEPAD_BUTTON_NAMES, name).map(Self::GamepadButton))
            .or_else(|| lookup(GAMEPAD_AXIS_NAMES, name).map(Self::GamepadAxis))
            .or_else(|| lookup(STICK_NAMES, name).map(Self::GamepadStick))
            .ok_or(UnknownSourceName)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Key(code) => reverse(KEY_NAMES, code),
            Self::MouseButton(button) => reverse(MOUSE_BUTTON_NAMES, button),
            Self::MouseWheel => Some("Mouse Wheel"),
            Self::MouseMotion => Some("Mouse Motion"),
            Self::GamepadButton(button) => reverse(GAMEPAD_BUTTON_NAMES, button),
            Self::GamepadAxis(axis) => reverse(GAMEPAD_AXIS_NAMES, axis),
            Self::GamepadStick(stick) => reverse(STICK_NAMES, stick),
        };
        match name {
            Some(name) => f.write_str(name),
            // Sources built in code may lie outside the named vocabulary
            None => write!(f, "{:?}", self),
        }
    }
}

/// A source bound to one action on one device
///
/// Remembers the last raw sample it reported so each read can tell whether
/// the signal changed since the previous tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    source: Source,
    pressed: bool,
    x: i16,
    y: i16,
    delta: Vec2,
}

impl Binding {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            pressed: false,
            x: 0,
            y: 0,
            delta: Vec2::ZERO,
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    fn sample_button(&mut self, pressed: bool) -> bool {
        let changed = pressed != self.pressed;
        self.pressed = pressed;
        changed
    }

    fn sample_axis(&mut self, raw: &RawState, axis: GamepadAxis) -> (bool, i16) {
        let v = raw.axis(axis.index());
        let changed = v != self.x;
        self.x = v;
        (changed, v)
    }

    fn sample_stick(&mut self, raw: &RawState, stick: Stick) -> (bool, i16, i16) {
        let (xaxis, yaxis) = stick.axes();
        let (vx, vy) = (raw.axis(xaxis.index()), raw.axis(yaxis.index()));
        let changed = vx != self.x || vy != self.y;
        self.x = vx;
        self.y = vy;
        (changed, vx, vy)
    }

    fn sample_delta(&mut self, delta: Vec2) -> bool {
        let changed = delta != self.delta;
        self.delta = delta;
        changed
    }

    /// Held state of a button-like source
    fn held(&self, raw: &RawState) -> Option<bool> {
        match self.source {
            Source::Key(code) => Some(raw.key(code)),
            Source::MouseButton(button) => Some(raw.mouse_button(button)),
            Source::GamepadButton(button) => Some(raw.button(button.index())),
            Source::MouseWheel
            | Source::MouseMotion
            | Source::GamepadAxis(_)
            | Source::GamepadStick(_) => None,
        }
    }

    /// Read as a digital button
    pub fn as_button(&mut self, raw: &RawState) -> (bool, bool) {
        match self.held(raw) {
            Some(pressed) => (self.sample_button(pressed), pressed),
            None => (false, false),
        }
    }

    /// Read as an unsigned analog value in `0.0..=1.0`
    pub fn as_half_axis(&mut self, raw: &RawState) -> (bool, f32) {
        if let Some(pressed) = self.held(raw) {
            let value = if pressed { 1.0 } else { 0.0 };
            return (self.sample_button(pressed), value);
        }
        match self.source {
            Source::GamepadAxis(axis) => {
                let (changed, v) = self.sample_axis(raw, axis);
                (changed, normalize_half_axis(v))
            }
            _ => (false, 0.0),
        }
    }

    /// Read as a signed analog value in `-1.0..=1.0`
    pub fn as_axis(&mut self, raw: &RawState, settings: &InputSettings) -> (bool, f32) {
        if let Some(pressed) = self.held(raw) {
            let value = if pressed { 1.0 } else { 0.0 };
            return (self.sample_button(pressed), value);
        }
        match self.source {
            Source::GamepadAxis(axis) => {
                let (changed, v) = self.sample_axis(raw, axis);
                (changed, apply_dead_zone(normalize_axis(v), settings.dead_zone))
            }
            _ => (false, 0.0),
        }
    }

    /// Read as an absolute 2D position, each component in `-1.0..=1.0`
    pub fn as_dual_axis(&mut self, raw: &RawState, settings: &InputSettings) -> (bool, Vec2) {
        match self.source {
            Source::GamepadStick(stick) => {
                let (changed, vx, vy) = self.sample_stick(raw, stick);
                (changed, stick_position(vx, vy, settings.dead_zone))
            }
            Source::GamepadAxis(axis) => {
                let (changed, v) = self.sample_axis(raw, axis);
                let x = apply_dead_zone(normalize_axis(v), settings.dead_zone);
                (changed, Vec2::new(x, 0.0))
            }
            Source::Key(_)
            | Source::MouseButton(_)
            | Source::GamepadButton(_)
            | Source::MouseWheel
            | Source::MouseMotion => (false, Vec2::ZERO),
        }
    }

    /// Read as a 2D rate of change, in device-dependent units
    pub fn as_delta(&mut self, raw: &RawState, settings: &InputSettings) -> (bool, Vec2) {
        match self.source {
            Source::MouseWheel => {
                let delta = raw.wheel();
                (self.sample_delta(delta), delta)
            }
            Source::MouseMotion => {
                let delta = raw.motion();
                (self.sample_delta(delta), delta)
            }
            Source::GamepadStick(stick) => {
                let (changed, vx, vy) = self.sample_stick(raw, stick);
                let value = stick_position(vx, vy, settings.dead_zone) * settings.stick_delta_scale;
                (changed, value)
            }
            Source::GamepadAxis(axis) => {
                let (changed, v) = self.sample_axis(raw, axis);
                let x = apply_dead_zone(normalize_axis(v), settings.dead_zone);
                (changed, Vec2::new(x * settings.stick_delta_scale, 0.0))
            }
            Source::Key(_) | Source::MouseButton(_) | Source::GamepadButton(_) => {
                (false, Vec2::ZERO)
            }
        }
    }
}

fn stick_position(vx: i16, vy: i16, dead_zone: f32) -> Vec2 {
    Vec2::new(
        apply_dead_zone(normalize_axis(vx), dead_zone),
        apply_dead_zone(normalize_axis(vy), dead_zone),
    )
}
