// Input manager - builder for the configuration phase, system for the run phase

use super::action::{
    Action, ActionKind, ActionTable, AnyAction, Axis, AxisAction, Bool, BoolAction, Delta,
    DeltaAction, DualAxis, DualAxisAction, HalfAxis, HalfAxisAction,
};
use super::config::{resolve_bindings, BindingTable, InputConfig, InputSettings};
use super::context::{ContextId, ContextStack, ContextTable};
use super::device::{DeviceId, DeviceInfo, DeviceRegistry, RawEvent};
use super::source::{Binding, Source};
use super::state::ActionStates;
use super::InputError;
use glam::Vec2;
use log::{debug, info, warn};
use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

/// Configuration phase: declare actions and contexts, load bindings
///
/// Consumed by [`InputBuilder::build`], after which the action table is
/// sealed and bindings are fixed.
#[derive(Debug, Default)]
pub struct InputBuilder {
    actions: ActionTable,
    contexts: ContextTable,
    settings: InputSettings,
}

impl InputBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an action of any kind
    pub fn declare<K: ActionKind>(&mut self, name: &str) -> Result<Action<K>, InputError> {
        self.actions.declare(name)
    }

    pub fn declare_bool(&mut self, name: &str) -> Result<BoolAction, InputError> {
        self.declare::<Bool>(name)
    }

    pub fn declare_half_axis(&mut self, name: &str) -> Result<HalfAxisAction, InputError> {
        self.declare::<HalfAxis>(name)
    }

    pub fn declare_axis(&mut self, name: &str) -> Result<AxisAction, InputError> {
        self.declare::<Axis>(name)
    }

    pub fn declare_dual_axis(&mut self, name: &str) -> Result<DualAxisAction, InputError> {
        self.declare::<DualAxis>(name)
    }

    pub fn declare_delta(&mut self, name: &str) -> Result<DeltaAction, InputError> {
        self.declare::<Delta>(name)
    }

    /// Declare a context listing a fixed set of actions
    pub fn declare_context(
        &mut self,
        name: &str,
        actions: impl IntoIterator<Item = AnyAction>,
    ) -> Result<ContextId, InputError> {
        self.contexts.declare(name, actions)
    }

    /// Load a binding table
    ///
    /// The whole table is validated before anything is applied. Each context
    /// named in the table has its bindings replaced; other contexts keep theirs.
    pub fn load_bindings(&mut self, table: &BindingTable) -> Result<(), InputError> {
        let resolved = resolve_bindings(table, &self.actions, &self.contexts)?;
        for (context, bindings) in resolved {
            debug!(
                "Loaded {} bindings for context '{}'",
                bindings.len(),
                self.contexts.name(context)
            );
            self.contexts.replace_bindings(context, bindings);
        }
        Ok(())
    }

    pub fn set_settings(&mut self, settings: InputSettings) {
        self.settings = settings.sanitized();
    }

    /// Install the settings and bindings of a configuration
    pub fn apply_config(&mut self, config: &InputConfig) -> Result<(), InputError> {
        self.load_bindings(&config.bindings)?;
        self.set_settings(config.settings);
        Ok(())
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    /// Seal the configuration and start the run phase
    pub fn build(self) -> InputSystem {
        let mut actions = self.actions;
        actions.seal();

        let devices = DeviceRegistry::new();
        let states = ActionStates::new(&actions, devices.slot_count());
        let stacks = vec![ContextStack::new(); devices.slot_count()];

        info!(
            "Input system ready: {} actions, {} contexts",
            actions.len(),
            self.contexts.len()
        );

        InputSystem {
            actions,
            contexts: self.contexts,
            settings: self.settings,
            devices,
            stacks,
            states,
            activations: 0,
            tick: 0,
        }
    }
}

/// Run phase: raw input in, per-tick action state out
#[derive(Debug)]
pub struct InputSystem {
    actions: ActionTable,
    contexts: ContextTable,
    settings: InputSettings,
    devices: DeviceRegistry,

    /// Context stack per device slot; slot 0 remembers `ANY` activations
    stacks: Vec<ContextStack>,

    states: ActionStates,

    /// Activation counter, orders equal-priority contexts
    activations: u64,

    tick: u64,
}

impl InputSystem {
    /// Feed a raw event into the device registry
    pub fn handle_event(&mut self, event: RawEvent) {
        if !self.devices.apply(&event) {
            debug!("Ignoring event for unknown device {}: {:?}", event.device(), event);
        }
    }

    /// Process a window event from winit
    /// Returns true if the event was consumed
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                // Only physical key codes, and never key repeats
                if event.repeat {
                    return true;
                }
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.handle_event(RawEvent::Key {
                        code,
                        pressed: event.state == ElementState::Pressed,
                    });
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_event(RawEvent::MouseButton {
                    button: *button,
                    pressed: *state == ElementState::Pressed,
                });
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    // Convert pixel delta to line delta (approximate)
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32 / 100.0, pos.y as f32 / 100.0)
                    }
                };
                self.handle_event(RawEvent::MouseWheel { delta });
                true
            }
            WindowEvent::Focused(false) => {
                // Key releases are lost while unfocused
                self.devices.raw_mut(DeviceId::KEYBOARD).release_all();
                false
            }
            _ => false,
        }
    }

    /// Process a raw device event from winit
    /// Returns true if the event was consumed
    pub fn process_device_event(&mut self, event: &DeviceEvent) -> bool {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.handle_event(RawEvent::MouseMotion {
                delta: Vec2::new(delta.0 as f32, delta.1 as f32),
            });
            return true;
        }
        false
    }

    /// Register a newly connected device
    ///
    /// Contexts activated on `DeviceId::ANY` carry over to the new device.
    pub fn connect(&mut self, info: DeviceInfo) -> Result<DeviceId, InputError> {
        let name = info.name.clone();
        let device = self.devices.connect(info).map_err(|err| {
            warn!("Cannot connect '{}': {}", name, err);
            err
        })?;

        self.states.add_device();
        let seeded = self.stacks[DeviceId::ANY.index()].clone();
        self.stacks.push(seeded);
        self.rebind(device);
        self.refresh_any();

        info!("Connected '{}' as {}", name, device);
        Ok(device)
    }

    /// Drop a device; returns false if it was not connected
    pub fn disconnect(&mut self, device: DeviceId) -> bool {
        if !self.devices.disconnect(device) {
            warn!("Cannot disconnect {}: not a connected gamepad", device);
            return false;
        }

        self.states.deactivate_all(device, self.actions.order());
        self.stacks[device.index()].clear();
        self.refresh_any();

        info!("Disconnected {}", device);
        true
    }

    /// Activate a context on a device, or on every device with `DeviceId::ANY`
    ///
    /// The device's bindings switch when this makes the context foreground.
    /// A device that is not connected is left alone with a warning.
    pub fn activate(&mut self, context: ContextId, device: DeviceId, priority: i32) {
        self.activations += 1;
        let seq = self.activations;

        if device.is_any() {
            self.stacks[DeviceId::ANY.index()].push(context, priority, seq);
            for device in self.connected_devices() {
                self.push_context(device, context, priority, seq);
            }
        } else if self.devices.is_connected(device) {
            self.push_context(device, context, priority, seq);
        } else {
            warn!(
                "Cannot activate '{}' on disconnected {}",
                self.contexts.name(context),
                device
            );
            return;
        }

        self.refresh_any();
    }

    /// Deactivate a context on a device, or on every device with `DeviceId::ANY`
    ///
    /// The next context on the stack resumes.
    pub fn deactivate(&mut self, context: ContextId, device: DeviceId) {
        if device.is_any() {
            self.stacks[DeviceId::ANY.index()].remove(context);
            for device in self.connected_devices() {
                self.remove_context(device, context);
            }
        } else {
            self.remove_context(device, context);
        }

        self.refresh_any();
    }

    /// Check if a context is the foreground context of a device
    pub fn context_active(&self, context: ContextId, device: DeviceId) -> bool {
        self.stacks[device.index()].foreground() == Some(context)
    }

    /// Advance one input tick
    ///
    /// Call once per simulation step, after feeding the step's events and
    /// before game logic reads action state.
    pub fn begin_tick(&mut self) {
        self.tick += 1;
        let order = self.actions.order();

        self.states.newframe_any(order);
        let live: Vec<DeviceId> = self
            .devices
            .connected()
            .map(|(device, _)| device)
            .filter(|&device| self.states.any_active(device, order))
            .collect();

        for &device in &live {
            self.states.newframe(device, order);
        }
        for &device in &live {
            self.states
                .update(device, order, self.devices.raw(device), &self.settings);
        }

        self.devices.end_tick();
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Current value of an action of any kind
    pub fn value<K: ActionKind>(&self, action: Action<K>, device: DeviceId) -> K::Value {
        K::states(&self.states)
            .slot(device, action.index())
            .value()
    }

    /// Check if the value of an action changed during the last tick
    pub fn changed<K: ActionKind>(&self, action: Action<K>, device: DeviceId) -> bool {
        let slot = K::states(&self.states).slot(device, action.index());
        slot.value() != slot.previous()
    }

    /// Check if an action is currently pressed
    pub fn pressed(&self, action: BoolAction, device: DeviceId) -> bool {
        self.value(action, device)
    }

    /// Check if an action was just pressed this tick
    pub fn just_pressed(&self, action: BoolAction, device: DeviceId) -> bool {
        let slot = self.states.bools.slot(device, action.index());
        slot.value() && !slot.previous()
    }

    /// Check if an action was just released this tick
    pub fn just_released(&self, action: BoolAction, device: DeviceId) -> bool {
        let slot = self.states.bools.slot(device, action.index());
        !slot.value() && slot.previous()
    }

    pub fn half_axis(&self, action: HalfAxisAction, device: DeviceId) -> f32 {
        self.value(action, device)
    }

    pub fn axis(&self, action: AxisAction, device: DeviceId) -> f32 {
        self.value(action, device)
    }

    pub fn xy(&self, action: DualAxisAction, device: DeviceId) -> Vec2 {
        self.value(action, device)
    }

    pub fn delta(&self, action: DeltaAction, device: DeviceId) -> Vec2 {
        self.value(action, device)
    }

    /// Check if an action has bound sources on a device
    pub fn is_action_active(&self, action: impl Into<AnyAction>, device: DeviceId) -> bool {
        self.states.is_active(device, action.into())
    }

    /// Sources currently feeding an action on a device
    pub fn sources(&self, action: impl Into<AnyAction>, device: DeviceId) -> Vec<Source> {
        self.states.sources(device, action.into())
    }

    /// Get a list of all physical devices that just pressed an action
    pub fn devices_just_pressed(&self, action: BoolAction) -> Vec<DeviceId> {
        self.devices
            .connected()
            .map(|(device, _)| device)
            .filter(|&device| self.just_pressed(action, device))
            .collect()
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn actions(&self) -> &ActionTable {
        &self.actions
    }

    pub fn contexts(&self) -> &ContextTable {
        &self.contexts
    }

    pub fn settings(&self) -> &InputSettings {
        &self.settings
    }

    pub fn action_name(&self, action: impl Into<AnyAction>) -> &str {
        self.actions.name(action.into())
    }

    pub fn context_name(&self, context: ContextId) -> &str {
        self.contexts.name(context)
    }

    fn connected_devices(&self) -> Vec<DeviceId> {
        self.devices.connected().map(|(device, _)| device).collect()
    }

    fn push_context(&mut self, device: DeviceId, context: ContextId, priority: i32, seq: u64) {
        let stack = &mut self.stacks[device.index()];
        let before = stack.foreground();
        stack.push(context, priority, seq);
        if stack.foreground() != before {
            self.rebind(device);
        }
    }

    fn remove_context(&mut self, device: DeviceId, context: ContextId) {
        let stack = &mut self.stacks[device.index()];
        let before = stack.foreground();
        stack.remove(context);
        if stack.foreground() != before {
            self.rebind(device);
        }
    }

    /// Replace every binding on a device with those of its foreground context
    fn rebind(&mut self, device: DeviceId) {
        self.states.deactivate_all(device, self.actions.order());

        let Some(info) = self.devices.info(device) else {
            return;
        };
        match self.stacks[device.index()].foreground() {
            Some(context) => {
                let raw = self.devices.raw(device);
                for &(action, source) in self.contexts.bindings(context) {
                    if source.is_produced_by(info) {
                        let binding = Binding::new(source);
                        self.states
                            .activate(device, action, binding, raw, &self.settings);
                    }
                }
                debug!("{} now uses context '{}'", device, self.contexts.name(context));
            }
            None => debug!("{} has no active context", device),
        }
    }

    fn refresh_any(&mut self) {
        let devices = self.connected_devices();
        self.states.refresh_any(self.actions.order(), &devices);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::device::{GamepadAxis, GamepadButton, MAX_DEVICES};
    use crate::engine::input::source::Stick;
    use approx::assert_relative_eq;
    use winit::event::MouseButton;
    use winit::keyboard::KeyCode;

    fn bindings(toml: &str) -> BindingTable {
        InputConfig::from_toml_str(toml).unwrap().bindings
    }

    fn press(input: &mut InputSystem, code: KeyCode) {
        input.handle_event(RawEvent::key_down(code));
    }

    fn release(input: &mut InputSystem, code: KeyCode) {
        input.handle_event(RawEvent::key_up(code));
    }

    fn pad_button(input: &mut InputSystem, device: DeviceId, button: GamepadButton, pressed: bool) {
        input.handle_event(RawEvent::GamepadButton {
            device,
            button,
            pressed,
        });
    }

    fn pad_axis(input: &mut InputSystem, device: DeviceId, axis: GamepadAxis, value: i16) {
        input.handle_event(RawEvent::GamepadAxis {
            device,
            axis,
            value,
        });
    }

    struct Game {
        input: InputSystem,
        menu: ContextId,
        play: ContextId,
        quit: BoolAction,
        jump: BoolAction,
        throttle: HalfAxisAction,
        steer: AxisAction,
        look: DualAxisAction,
        turn: DeltaAction,
    }

    fn game() -> Game {
        let mut builder = InputBuilder::new();
        let quit = builder.declare_bool("Quit").unwrap();
        let jump = builder.declare_bool("Jump").unwrap();
        let throttle = builder.declare_half_axis("Throttle").unwrap();
        let steer = builder.declare_axis("Steer").unwrap();
        let look = builder.declare_dual_axis("Look").unwrap();
        let turn = builder.declare_delta("Turn").unwrap();

        let menu = builder.declare_context("Menu", [quit.into()]).unwrap();
        let play = builder
            .declare_context(
                "Game",
                [
                    quit.into(),
                    jump.into(),
                    throttle.into(),
                    steer.into(),
                    look.into(),
                    turn.into(),
                ],
            )
            .unwrap();

        builder
            .load_bindings(&bindings(
                r#"
                [bindings.Menu]
                Quit = ["Escape", "Button Back"]

                [bindings.Game]
                Quit = ["Escape"]
                Jump = ["Space", "Button A"]
                Throttle = ["Right Trigger"]
                Steer = ["Left Stick X"]
                Look = ["Right Stick"]
                Turn = ["Mouse Motion", "Left Stick"]
                "#,
            ))
            .unwrap();

        Game {
            input: builder.build(),
            menu,
            play,
            quit,
            jump,
            throttle,
            steer,
            look,
            turn,
        }
    }

    #[test]
    fn test_quit_scenario_on_any_device() {
        let mut builder = InputBuilder::new();
        let quit = builder.declare_bool("Quit").unwrap();
        let default = builder.declare_context("Default", [quit.into()]).unwrap();
        builder
            .load_bindings(&bindings("[bindings.Default]\nQuit = [\"Escape\"]"))
            .unwrap();
        let mut input = builder.build();
        input.activate(default, DeviceId::ANY, 0);

        press(&mut input, KeyCode::Escape);
        input.begin_tick();
        assert!(input.just_pressed(quit, DeviceId::ANY));
        assert!(input.pressed(quit, DeviceId::ANY));

        input.begin_tick();
        assert!(!input.just_pressed(quit, DeviceId::ANY));
        assert!(input.pressed(quit, DeviceId::ANY));

        release(&mut input, KeyCode::Escape);
        input.begin_tick();
        assert!(input.just_released(quit, DeviceId::ANY));
        assert!(!input.pressed(quit, DeviceId::ANY));
    }

    #[test]
    fn test_edges_on_physical_device() {
        let mut game = game();
        game.input.activate(game.play, DeviceId::KEYBOARD, 0);

        press(&mut game.input, KeyCode::Space);
        game.input.begin_tick();
        assert!(game.input.just_pressed(game.jump, DeviceId::KEYBOARD));
        assert!(game.input.changed(game.jump, DeviceId::KEYBOARD));

        game.input.begin_tick();
        assert!(!game.input.just_pressed(game.jump, DeviceId::KEYBOARD));
        assert!(!game.input.changed(game.jump, DeviceId::KEYBOARD));
        assert!(game.input.pressed(game.jump, DeviceId::KEYBOARD));
    }

    #[test]
    fn test_look_stick_scenario() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        pad_axis(&mut game.input, pad, GamepadAxis::RightX, 0x4000);
        pad_axis(&mut game.input, pad, GamepadAxis::RightY, -0x4000);
        game.input.begin_tick();

        let look = game.input.xy(game.look, pad);
        assert_relative_eq!(look.x, 0.5000153, epsilon = 1e-6);
        assert_eq!(look.y, -0.5);
        assert_eq!(game.input.xy(game.look, DeviceId::ANY), look);
    }

    #[test]
    fn test_stick_inside_dead_zone_is_zero() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, pad, 0);

        pad_axis(&mut game.input, pad, GamepadAxis::RightX, 3000);
        pad_axis(&mut game.input, pad, GamepadAxis::RightY, -3000);
        game.input.begin_tick();
        assert_eq!(game.input.xy(game.look, pad), Vec2::ZERO);
    }

    #[test]
    fn test_analog_actions() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, pad, 0);

        pad_axis(&mut game.input, pad, GamepadAxis::RightTrigger, i16::MAX);
        pad_axis(&mut game.input, pad, GamepadAxis::LeftX, i16::MIN);
        game.input.begin_tick();

        assert_eq!(game.input.half_axis(game.throttle, pad), 1.0);
        assert_eq!(game.input.axis(game.steer, pad), -1.0);
        assert_eq!(game.input.delta(game.turn, pad), Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_mouse_motion_delta() {
        let mut game = game();
        game.input.activate(game.play, DeviceId::ANY, 0);

        assert!(game
            .input
            .process_device_event(&DeviceEvent::MouseMotion { delta: (3.0, -2.0) }));
        assert!(game
            .input
            .process_device_event(&DeviceEvent::MouseMotion { delta: (1.0, 0.0) }));
        game.input.begin_tick();
        assert_eq!(game.input.delta(game.turn, DeviceId::MOUSE), Vec2::new(4.0, -2.0));
        assert_eq!(game.input.delta(game.turn, DeviceId::ANY), Vec2::new(4.0, -2.0));

        // No movement this tick: the accumulator was cleared
        game.input.begin_tick();
        assert_eq!(game.input.delta(game.turn, DeviceId::MOUSE), Vec2::ZERO);
    }

    #[test]
    fn test_higher_priority_context_takes_over() {
        let mut builder = InputBuilder::new();
        let jump = builder.declare_bool("Jump").unwrap();
        let c1 = builder.declare_context("C1", [jump.into()]).unwrap();
        let c2 = builder.declare_context("C2", [jump.into()]).unwrap();
        builder
            .load_bindings(&bindings(
                r#"
                [bindings.C1]
                Jump = ["Space"]

                [bindings.C2]
                Jump = ["W"]
                "#,
            ))
            .unwrap();
        let mut input = builder.build();
        let keyboard = DeviceId::KEYBOARD;

        input.activate(c1, keyboard, 1);
        assert!(input.context_active(c1, keyboard));
        assert_eq!(input.sources(jump, keyboard), vec![Source::Key(KeyCode::Space)]);

        input.activate(c2, keyboard, 2);
        assert!(!input.context_active(c1, keyboard));
        assert!(input.context_active(c2, keyboard));
        assert_eq!(input.sources(jump, keyboard), vec![Source::Key(KeyCode::KeyW)]);

        // Space no longer drives Jump
        press(&mut input, KeyCode::Space);
        input.begin_tick();
        assert!(!input.pressed(jump, keyboard));

        // A lower priority re-activation stays in the background
        input.activate(c1, keyboard, 1);
        assert!(input.context_active(c2, keyboard));

        input.deactivate(c2, keyboard);
        assert!(input.context_active(c1, keyboard));
        assert_eq!(input.sources(jump, keyboard), vec![Source::Key(KeyCode::Space)]);

        // Space was already held when C1 resumed: pressed, but no new edge
        assert!(input.pressed(jump, keyboard));
        input.begin_tick();
        assert!(input.pressed(jump, keyboard));
        assert!(!input.just_pressed(jump, keyboard));

        release(&mut input, KeyCode::Space);
        input.begin_tick();
        assert!(input.just_released(jump, keyboard));
    }

    #[test]
    fn test_shared_key_does_not_retrigger_after_switch() {
        let mut builder = InputBuilder::new();
        let close = builder.declare_bool("Close Menu").unwrap();
        let open = builder.declare_bool("Open Menu").unwrap();
        let menu = builder.declare_context("Menu", [close.into()]).unwrap();
        let play = builder.declare_context("Game", [open.into()]).unwrap();
        builder
            .load_bindings(&bindings(
                "[bindings.Menu]\n\"Close Menu\" = [\"Enter\"]\n\
                 [bindings.Game]\n\"Open Menu\" = [\"Enter\"]",
            ))
            .unwrap();
        let mut input = builder.build();
        let any = DeviceId::ANY;
        input.activate(menu, any, 0);

        press(&mut input, KeyCode::Enter);
        let mut switches = 0;
        for _ in 0..6 {
            input.begin_tick();
            if input.just_pressed(close, any) {
                input.activate(play, any, 0);
                switches += 1;
            } else if input.just_pressed(open, any) {
                input.activate(menu, any, 0);
                switches += 1;
            }
        }

        assert_eq!(switches, 1);
        assert!(input.context_active(play, any));
        assert!(input.pressed(open, any));
        assert!(!input.just_pressed(open, any));
    }

    #[test]
    fn test_deflected_stick_has_no_change_after_switch() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, pad, 0);

        pad_axis(&mut game.input, pad, GamepadAxis::LeftX, i16::MAX);
        game.input.begin_tick();
        assert!(game.input.changed(game.steer, pad));

        game.input.activate(game.menu, pad, 1);
        game.input.deactivate(game.menu, pad);
        assert_eq!(game.input.axis(game.steer, pad), 1.0);

        game.input.begin_tick();
        assert_eq!(game.input.axis(game.steer, pad), 1.0);
        assert!(!game.input.changed(game.steer, pad));
    }

    #[test]
    fn test_equal_priority_most_recent_wins() {
        let mut game = game();
        let keyboard = DeviceId::KEYBOARD;

        game.input.activate(game.play, keyboard, 0);
        game.input.activate(game.menu, keyboard, 0);
        assert!(game.input.context_active(game.menu, keyboard));

        game.input.activate(game.play, keyboard, 0);
        assert!(game.input.context_active(game.play, keyboard));
    }

    #[test]
    fn test_suspended_context_is_not_live() {
        let mut game = game();
        let keyboard = DeviceId::KEYBOARD;

        game.input.activate(game.play, keyboard, 0);
        assert!(game.input.is_action_active(game.jump, keyboard));

        game.input.activate(game.menu, keyboard, 1);
        assert!(!game.input.is_action_active(game.jump, keyboard));
        assert!(!game.input.is_action_active(game.jump, DeviceId::ANY));
        assert!(game.input.is_action_active(game.quit, keyboard));
    }

    #[test]
    fn test_deactivate_releases_without_edge() {
        let mut game = game();
        let keyboard = DeviceId::KEYBOARD;
        game.input.activate(game.play, keyboard, 0);

        press(&mut game.input, KeyCode::Space);
        game.input.begin_tick();
        assert!(game.input.pressed(game.jump, keyboard));

        game.input.deactivate(game.play, keyboard);
        assert!(!game.input.context_active(game.play, keyboard));
        assert!(!game.input.pressed(game.jump, keyboard));
        assert!(!game.input.just_released(game.jump, keyboard));
        assert!(!game.input.pressed(game.jump, DeviceId::ANY));
    }

    #[test]
    fn test_gamepad_connected_later_inherits_any_contexts() {
        let mut game = game();
        game.input.activate(game.play, DeviceId::ANY, 0);

        let pad = game.input.connect(DeviceInfo::gamepad("Late Pad")).unwrap();
        assert!(game.input.context_active(game.play, pad));
        assert_eq!(
            game.input.sources(game.jump, pad),
            vec![Source::GamepadButton(GamepadButton::A)]
        );
        assert_eq!(
            game.input.sources(game.look, pad),
            vec![Source::GamepadStick(Stick::Right)]
        );

        pad_button(&mut game.input, pad, GamepadButton::A, true);
        game.input.begin_tick();
        assert!(game.input.just_pressed(game.jump, pad));
        assert!(game.input.just_pressed(game.jump, DeviceId::ANY));
        assert!(!game.input.pressed(game.jump, DeviceId::KEYBOARD));
    }

    #[test]
    fn test_keyboard_sources_do_not_bind_to_gamepads() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        assert_eq!(
            game.input.sources(game.jump, DeviceId::KEYBOARD),
            vec![Source::Key(KeyCode::Space)]
        );
        assert_eq!(
            game.input.sources(game.turn, pad),
            vec![Source::GamepadStick(Stick::Left)]
        );
        // Joysticks without the gamepad layout get no gamepad sources
        let stick = game.input.connect(DeviceInfo::joystick("Stick", 2, 4)).unwrap();
        assert!(!game.input.is_action_active(game.jump, stick));
    }

    #[test]
    fn test_disconnect() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        pad_button(&mut game.input, pad, GamepadButton::A, true);
        game.input.begin_tick();
        assert!(game.input.pressed(game.jump, pad));

        assert!(game.input.disconnect(pad));
        assert!(!game.input.devices().is_connected(pad));
        assert!(!game.input.is_action_active(game.jump, pad));
        assert!(!game.input.pressed(game.jump, pad));
        assert!(!game.input.context_active(game.play, pad));

        // Events for the gone device are ignored
        pad_button(&mut game.input, pad, GamepadButton::A, false);
        game.input.begin_tick();
        assert!(!game.input.pressed(game.jump, pad));

        assert!(!game.input.disconnect(pad));
        assert!(!game.input.disconnect(DeviceId::KEYBOARD));

        // Slots are not reused
        let next = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        assert_ne!(next, pad);
        assert!(game.input.context_active(game.play, next));
    }

    #[test]
    fn test_any_does_not_keep_value_of_disconnected_pad() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        pad_button(&mut game.input, pad, GamepadButton::A, true);
        game.input.begin_tick();
        assert!(game.input.pressed(game.jump, DeviceId::ANY));

        assert!(game.input.disconnect(pad));
        for _ in 0..3 {
            game.input.begin_tick();
        }
        assert!(!game.input.pressed(game.jump, DeviceId::KEYBOARD));
        assert!(!game.input.pressed(game.jump, DeviceId::ANY));
        assert!(game.input.is_action_active(game.jump, DeviceId::ANY));

        press(&mut game.input, KeyCode::Space);
        game.input.begin_tick();
        assert!(game.input.just_pressed(game.jump, DeviceId::ANY));
    }

    #[test]
    fn test_any_follows_keyboard_when_pad_switches_context() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        press(&mut game.input, KeyCode::Space);
        game.input.begin_tick();
        release(&mut game.input, KeyCode::Space);
        pad_button(&mut game.input, pad, GamepadButton::A, true);
        game.input.begin_tick();
        assert!(game.input.pressed(game.jump, DeviceId::ANY));

        // The pad drops Jump while the keyboard still carries it
        game.input.activate(game.menu, pad, 1);
        assert!(!game.input.pressed(game.jump, DeviceId::ANY));
        game.input.begin_tick();
        assert!(!game.input.pressed(game.jump, DeviceId::ANY));
        assert!(!game.input.just_released(game.jump, DeviceId::ANY));
    }

    #[test]
    fn test_activate_on_unknown_device_is_ignored() {
        let mut game = game();
        game.input.activate(game.play, DeviceId(7), 0);
        assert!(!game.input.context_active(game.play, DeviceId::KEYBOARD));
        assert!(!game.input.is_action_active(game.jump, DeviceId::ANY));
    }

    #[test]
    fn test_too_many_devices() {
        let mut game = game();
        for i in 2..MAX_DEVICES {
            game.input
                .connect(DeviceInfo::gamepad(format!("Pad {i}")))
                .unwrap();
        }

        let result = game.input.connect(DeviceInfo::gamepad("One too many"));
        assert!(matches!(result, Err(InputError::TooManyDevices { .. })));
    }

    #[test]
    fn test_devices_just_pressed() {
        let mut game = game();
        let pad = game.input.connect(DeviceInfo::gamepad("Pad")).unwrap();
        let other = game.input.connect(DeviceInfo::gamepad("Other")).unwrap();
        game.input.activate(game.play, DeviceId::ANY, 0);

        press(&mut game.input, KeyCode::Space);
        pad_button(&mut game.input, other, GamepadButton::A, true);
        game.input.begin_tick();

        let devices = game.input.devices_just_pressed(game.jump);
        assert_eq!(devices, vec![DeviceId::KEYBOARD, other]);
        assert!(!devices.contains(&pad));
    }

    #[test]
    fn test_focus_loss_releases_keys() {
        let mut game = game();
        game.input.activate(game.play, DeviceId::ANY, 0);

        press(&mut game.input, KeyCode::Space);
        game.input.handle_event(RawEvent::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        game.input.begin_tick();
        assert!(game.input.pressed(game.jump, DeviceId::KEYBOARD));

        game.input.process_window_event(&WindowEvent::Focused(false));
        assert!(!game.input.devices().raw(DeviceId::MOUSE).mouse_button(MouseButton::Left));

        game.input.begin_tick();
        assert!(game.input.just_released(game.jump, DeviceId::KEYBOARD));
    }

    #[test]
    fn test_reloading_replaces_bindings() {
        let mut builder = InputBuilder::new();
        let quit = builder.declare_bool("Quit").unwrap();
        let menu = builder.declare_context("Menu", [quit.into()]).unwrap();
        let play = builder.declare_context("Game", [quit.into()]).unwrap();

        builder
            .load_bindings(&bindings(
                "[bindings.Menu]\nQuit = [\"Escape\"]\n[bindings.Game]\nQuit = [\"F10\"]",
            ))
            .unwrap();
        builder
            .load_bindings(&bindings("[bindings.Menu]\nQuit = [\"Q\"]"))
            .unwrap();

        let contexts = builder.contexts();
        assert_eq!(
            contexts.bindings(menu),
            &[(AnyAction::from(quit), Source::Key(KeyCode::KeyQ))]
        );
        assert_eq!(
            contexts.bindings(play),
            &[(AnyAction::from(quit), Source::Key(KeyCode::F10))]
        );
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let mut builder = InputBuilder::new();
        let quit = builder.declare_bool("Quit").unwrap();
        let menu = builder.declare_context("Menu", [quit.into()]).unwrap();
        builder
            .load_bindings(&bindings("[bindings.Menu]\nQuit = [\"Escape\"]"))
            .unwrap();

        // Menu is valid, but Pause is unknown
        let result = builder.load_bindings(&bindings(
            "[bindings.Menu]\nQuit = [\"Q\"]\n[bindings.Pause]\nQuit = [\"P\"]",
        ));
        assert!(matches!(result, Err(InputError::UnknownContext(_))));
        assert_eq!(
            builder.contexts().bindings(menu),
            &[(AnyAction::from(quit), Source::Key(KeyCode::Escape))]
        );
    }

    #[test]
    fn test_apply_config() {
        let mut builder = InputBuilder::new();
        let quit = builder.declare_bool("Quit").unwrap();
        builder.declare_context("Menu", [quit.into()]).unwrap();

        let config = InputConfig::from_toml_str(
            "[settings]\ndead_zone = 0.25\n[bindings.Menu]\nQuit = [\"Escape\"]",
        )
        .unwrap();
        builder.apply_config(&config).unwrap();

        let input = builder.build();
        assert_relative_eq!(input.settings().dead_zone, 0.25);
    }

    #[test]
    fn test_duplicate_declarations() {
        let mut builder = InputBuilder::new();
        builder.declare_bool("Move").unwrap();

        let result = builder.declare_dual_axis("Move");
        assert!(matches!(result, Err(InputError::DuplicateName(_))));
        assert_eq!(builder.actions().len(), 1);

        builder.declare_context("Game", []).unwrap();
        assert!(matches!(
            builder.declare_context("Game", []),
            Err(InputError::DuplicateContext(_))
        ));
    }

    #[test]
    fn test_build_seals_action_table() {
        let game = game();
        assert!(game.input.actions().is_sealed());
        assert_eq!(game.input.action_name(game.look), "Look");
        assert_eq!(game.input.context_name(game.menu), "Menu");
        assert_eq!(game.input.tick_count(), 0);
    }

    #[test]
    fn test_tick_count() {
        let mut game = game();
        game.input.begin_tick();
        game.input.begin_tick();
        assert_eq!(game.input.tick_count(), 2);
    }

    #[test]
    #[should_panic]
    fn test_unknown_device_panics() {
        let game = game();
        game.input.pressed(game.jump, DeviceId(7));
    }
}
