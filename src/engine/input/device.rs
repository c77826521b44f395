// Device registry: connected devices, their capabilities and raw state

use super::InputError;
use glam::Vec2;
use std::collections::HashSet;
use std::fmt;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Maximum number of device slots in a session (including the two built-in ones)
pub const MAX_DEVICES: usize = 16;

/// Identifies a device slot
///
/// Slot 0 is the virtual "any device" aggregate, slot 1 is the keyboard (which
/// also carries the mouse). Gamepads and joysticks get the following slots in
/// connection order; a slot is never handed out twice in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) u32);

impl DeviceId {
    /// Virtual device mirroring the last physical device that changed an action
    pub const ANY: DeviceId = DeviceId(0);

    /// The keyboard
    pub const KEYBOARD: DeviceId = DeviceId(1);

    /// The mouse shares the keyboard's slot
    pub const MOUSE: DeviceId = DeviceId(1);

    /// Get the slot index
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the virtual aggregate device
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device #{}", self.0)
    }
}

/// Broad device category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// The aggregate slot, never connected to hardware
    Virtual,
    /// Keyboard and mouse
    KeyboardMouse,
    /// Controller with the standard gamepad layout
    Gamepad,
    /// Any other joystick; no gamepad source binds to it
    Joystick,
}

/// Capability metadata reported by the device enumeration layer
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub kind: DeviceKind,
    pub axis_count: usize,
    pub button_count: usize,
}

impl DeviceInfo {
    /// Describe a controller with the standard gamepad layout
    pub fn gamepad(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeviceKind::Gamepad,
            axis_count: GamepadAxis::ALL.len(),
            button_count: GamepadButton::ALL.len(),
        }
    }

    /// Describe a generic joystick
    pub fn joystick(name: impl Into<String>, axis_count: usize, button_count: usize) -> Self {
        Self {
            name: name.into(),
            kind: DeviceKind::Joystick,
            axis_count,
            button_count,
        }
    }

    fn keyboard() -> Self {
        Self {
            name: "Keyboard".to_string(),
            kind: DeviceKind::KeyboardMouse,
            axis_count: 0,
            button_count: 0,
        }
    }

    fn any() -> Self {
        Self {
            name: "Any".to_string(),
            kind: DeviceKind::Virtual,
            axis_count: 0,
            button_count: 0,
        }
    }

    /// Whether gamepad sources can be bound to this device
    pub fn is_gamepad(&self) -> bool {
        self.kind == DeviceKind::Gamepad
    }

    /// Whether keyboard and mouse sources can be bound to this device
    pub fn is_keyboard(&self) -> bool {
        self.kind == DeviceKind::KeyboardMouse
    }
}

/// Buttons of the standard gamepad layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    A,
    B,
    X,
    Y,
    Back,
    Guide,
    Start,
    LeftStick,
    RightStick,
    LeftShoulder,
    RightShoulder,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 15] = [
        Self::A,
        Self::B,
        Self::X,
        Self::Y,
        Self::Back,
        Self::Guide,
        Self::Start,
        Self::LeftStick,
        Self::RightStick,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::DpadUp,
        Self::DpadDown,
        Self::DpadLeft,
        Self::DpadRight,
    ];

    /// Raw button index on the device
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Axes of the standard gamepad layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamepadAxis {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl GamepadAxis {
    pub const ALL: [GamepadAxis; 6] = [
        Self::LeftX,
        Self::LeftY,
        Self::RightX,
        Self::RightY,
        Self::LeftTrigger,
        Self::RightTrigger,
    ];

    /// Raw axis index on the device
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A raw input event, as delivered by the platform layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawEvent {
    Key { code: KeyCode, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    /// Wheel movement, in lines
    MouseWheel { delta: Vec2 },
    /// Relative pointer movement, in device units
    MouseMotion { delta: Vec2 },
    GamepadButton {
        device: DeviceId,
        button: GamepadButton,
        pressed: bool,
    },
    GamepadAxis {
        device: DeviceId,
        axis: GamepadAxis,
        value: i16,
    },
}

impl RawEvent {
    pub fn key_down(code: KeyCode) -> Self {
        Self::Key { code, pressed: true }
    }

    pub fn key_up(code: KeyCode) -> Self {
        Self::Key {
            code,
            pressed: false,
        }
    }

    /// The device whose raw state this event changes
    pub fn device(&self) -> DeviceId {
        match self {
            Self::Key { .. }
            | Self::MouseButton { .. }
            | Self::MouseWheel { .. }
            | Self::MouseMotion { .. } => DeviceId::KEYBOARD,
            Self::GamepadButton { device, .. } | Self::GamepadAxis { device, .. } => *device,
        }
    }
}

/// Latest raw samples of one device
#[derive(Debug, Clone, Default)]
pub struct RawState {
    keys: HashSet<KeyCode>,
    mouse_buttons: HashSet<MouseButton>,
    wheel: Vec2,
    motion: Vec2,
    axes: Vec<i16>,
    buttons: Vec<bool>,
}

impl RawState {
    fn with_capacity(info: &DeviceInfo) -> Self {
        Self {
            axes: vec![0; info.axis_count],
            buttons: vec![false; info.button_count],
            ..Self::default()
        }
    }

    /// Check if a key is held
    pub fn key(&self, code: KeyCode) -> bool {
        self.keys.contains(&code)
    }

    /// Check if a mouse button is held
    pub fn mouse_button(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }

    /// Wheel movement accumulated since the last tick
    pub fn wheel(&self) -> Vec2 {
        self.wheel
    }

    /// Pointer movement accumulated since the last tick
    pub fn motion(&self) -> Vec2 {
        self.motion
    }

    /// Latest sample of an axis (0 if the device has no such axis)
    pub fn axis(&self, index: usize) -> i16 {
        self.axes.get(index).copied().unwrap_or(0)
    }

    /// Latest state of a button (released if the device has no such button)
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    fn apply(&mut self, event: &RawEvent) {
        match *event {
            RawEvent::Key { code, pressed } => {
                if pressed {
                    self.keys.insert(code);
                } else {
                    self.keys.remove(&code);
                }
            }
            RawEvent::MouseButton { button, pressed } => {
                if pressed {
                    self.mouse_buttons.insert(button);
                } else {
                    self.mouse_buttons.remove(&button);
                }
            }
            RawEvent::MouseWheel { delta } => self.wheel += delta,
            RawEvent::MouseMotion { delta } => self.motion += delta,
            RawEvent::GamepadButton {
                button, pressed, ..
            } => {
                if let Some(state) = self.buttons.get_mut(button.index()) {
                    *state = pressed;
                }
            }
            RawEvent::GamepadAxis { axis, value, .. } => {
                if let Some(sample) = self.axes.get_mut(axis.index()) {
                    *sample = value;
                }
            }
        }
    }

    /// Release every held key and button
    pub(crate) fn release_all(&mut self) {
        self.keys.clear();
        self.mouse_buttons.clear();
        self.buttons.iter_mut().for_each(|b| *b = false);
    }

    fn end_tick(&mut self) {
        self.wheel = Vec2::ZERO;
        self.motion = Vec2::ZERO;
    }
}

/// One device slot
#[derive(Debug, Clone)]
pub struct DeviceSlot {
    info: DeviceInfo,
    connected: bool,
    raw: RawState,
}

impl DeviceSlot {
    fn new(info: DeviceInfo) -> Self {
        let raw = RawState::with_capacity(&info);
        Self {
            info,
            connected: true,
            raw,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn raw(&self) -> &RawState {
        &self.raw
    }
}

/// Registry of all device slots seen during the session
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    slots: Vec<DeviceSlot>,
}

impl DeviceRegistry {
    /// Create a registry holding the aggregate slot and the keyboard
    pub fn new() -> Self {
        Self {
            slots: vec![
                DeviceSlot::new(DeviceInfo::any()),
                DeviceSlot::new(DeviceInfo::keyboard()),
            ],
        }
    }

    /// Number of slots handed out so far (connected or not)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Get a slot, connected or not
    pub fn get(&self, device: DeviceId) -> Option<&DeviceSlot> {
        self.slots.get(device.index())
    }

    /// Get the metadata of a connected device
    pub fn info(&self, device: DeviceId) -> Option<&DeviceInfo> {
        self.get(device)
            .filter(|slot| slot.connected)
            .map(|slot| &slot.info)
    }

    /// Check if a device is currently connected
    pub fn is_connected(&self, device: DeviceId) -> bool {
        self.get(device).is_some_and(|slot| slot.connected)
    }

    /// Iterate connected physical devices (the aggregate slot is skipped)
    pub fn connected(&self) -> impl Iterator<Item = (DeviceId, &DeviceInfo)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, slot)| slot.connected)
            .map(|(index, slot)| (DeviceId(index as u32), &slot.info))
    }

    /// Raw state of a slot
    ///
    /// # Panics
    /// Panics if the slot was never handed out.
    pub fn raw(&self, device: DeviceId) -> &RawState {
        &self.slots[device.index()].raw
    }

    pub(crate) fn raw_mut(&mut self, device: DeviceId) -> &mut RawState {
        &mut self.slots[device.index()].raw
    }

    /// Register a newly connected device in the next unused slot
    pub(crate) fn connect(&mut self, info: DeviceInfo) -> Result<DeviceId, InputError> {
        if self.slots.len() >= MAX_DEVICES {
            return Err(InputError::TooManyDevices { max: MAX_DEVICES });
        }
        let id = DeviceId(self.slots.len() as u32);
        self.slots.push(DeviceSlot::new(info));
        Ok(id)
    }

    /// Mark a device as gone; returns false if it was not connected
    pub(crate) fn disconnect(&mut self, device: DeviceId) -> bool {
        if device.index() < 2 {
            return false;
        }
        match self.slots.get_mut(device.index()) {
            Some(slot) if slot.connected => {
                slot.connected = false;
                slot.raw = RawState::with_capacity(&slot.info);
                true
            }
            _ => false,
        }
    }

    /// Apply a raw event; returns false if its device is not connected
    pub(crate) fn apply(&mut self, event: &RawEvent) -> bool {
        let device = event.device();
        if device.is_any() {
            return false;
        }
        match self.slots.get_mut(device.index()) {
            Some(slot) if slot.connected => {
                slot.raw.apply(event);
                true
            }
            _ => false,
        }
    }

    /// Clear per-tick accumulators on every device
    pub(crate) fn end_tick(&mut self) {
        for slot in &mut self.slots {
            slot.raw.end_tick();
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
