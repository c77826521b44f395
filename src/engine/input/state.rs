// Per-device action state and the per-tick update

use super::action::{
    ActionKind, ActionTable, ActionType, AnyAction, Axis, Bool, Delta, DualAxis, HalfAxis,
};
use super::config::InputSettings;
use super::device::{DeviceId, RawState};
use super::source::{Binding, Source};

/// State of one action on one device
#[derive(Debug, Clone)]
pub struct Slot<V> {
    active: bool,
    value: V,
    previous: V,
    sources: Vec<Binding>,
    // Device whose value the `ANY` slot currently mirrors
    writer: Option<DeviceId>,
}

impl<V: Copy + Default> Slot<V> {
    fn new() -> Self {
        Self {
            active: false,
            value: V::default(),
            previous: V::default(),
            sources: Vec::new(),
            writer: None,
        }
    }

    /// Whether the action is live on this device
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn value(&self) -> V {
        self.value
    }

    /// Value at the end of the previous tick
    pub fn previous(&self) -> V {
        self.previous
    }

    pub fn sources(&self) -> impl Iterator<Item = Source> + '_ {
        self.sources.iter().map(Binding::source)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// State of every action of one kind, indexed by `[device][action]`
#[derive(Debug)]
pub struct StateTable<K: ActionKind> {
    rows: Vec<Vec<Slot<K::Value>>>,
}

impl<K: ActionKind> StateTable<K> {
    fn new(actions: usize, devices: usize) -> Self {
        let mut table = Self { rows: Vec::new() };
        for _ in 0..devices {
            table.rows.push((0..actions).map(|_| Slot::new()).collect());
        }
        table
    }

    fn add_device(&mut self) {
        let actions = self.rows.first().map_or(0, Vec::len);
        self.rows.push((0..actions).map(|_| Slot::new()).collect());
    }

    /// # Panics
    /// Panics if the device or action index is out of range.
    pub fn slot(&self, device: DeviceId, index: usize) -> &Slot<K::Value> {
        &self.rows[device.index()][index]
    }

    fn slot_mut(&mut self, device: DeviceId, index: usize) -> &mut Slot<K::Value> {
        &mut self.rows[device.index()][index]
    }

    /// Read every bound source; sources that changed this tick overwrite the
    /// value, last writer wins. Changes are mirrored into the `ANY` slot.
    fn update(&mut self, device: DeviceId, index: usize, raw: &RawState, settings: &InputSettings) {
        let slot = self.slot_mut(device, index);
        let mut changed = None;
        for binding in &mut slot.sources {
            let (did_change, value) = K::read(binding, raw, settings);
            if did_change {
                changed = Some(value);
            }
        }

        if let Some(value) = changed {
            slot.value = value;
            let any = self.slot_mut(DeviceId::ANY, index);
            any.value = value;
            any.writer = Some(device);
        }
    }

    /// Bind a source to an action on a device
    ///
    /// The binding is sampled against the device's current raw state first, so
    /// an input already held or deflected becomes the value with no edge.
    fn activate(
        &mut self,
        device: DeviceId,
        index: usize,
        mut binding: Binding,
        raw: &RawState,
        settings: &InputSettings,
    ) {
        let (held, value) = K::read(&mut binding, raw, settings);
        let slot = self.slot_mut(device, index);
        slot.active = true;
        slot.sources.push(binding);
        if held {
            slot.value = value;
            slot.previous = value;
            self.mirror(device, index);
        }
    }

    fn deactivate(&mut self, device: DeviceId, index: usize) {
        self.slot_mut(device, index).reset();
        if !device.is_any() {
            let any = self.slot_mut(DeviceId::ANY, index);
            if any.writer == Some(device) {
                any.writer = None;
            }
        }
    }

    /// Copy a device's value and previous value into the `ANY` slot
    fn mirror(&mut self, device: DeviceId, index: usize) {
        let slot = self.slot(device, index);
        let (value, previous) = (slot.value, slot.previous);
        let any = self.slot_mut(DeviceId::ANY, index);
        any.value = value;
        any.previous = previous;
        any.writer = Some(device);
    }

    /// Bring the `ANY` slot in line with the devices where the action is live
    fn refresh_any(&mut self, index: usize, live: &[DeviceId]) {
        let Some(&first) = live.first() else {
            self.slot_mut(DeviceId::ANY, index).reset();
            return;
        };

        // A writer that lost the action leaves a stale value behind
        let writer = self.slot(DeviceId::ANY, index).writer;
        if !writer.is_some_and(|device| live.contains(&device)) {
            self.mirror(first, index);
        }
        self.slot_mut(DeviceId::ANY, index).active = true;
    }
}

/// Runtime state of all actions on all devices
#[derive(Debug)]
pub struct ActionStates {
    pub(crate) bools: StateTable<Bool>,
    pub(crate) half_axes: StateTable<HalfAxis>,
    pub(crate) axes: StateTable<Axis>,
    pub(crate) dual_axes: StateTable<DualAxis>,
    pub(crate) deltas: StateTable<Delta>,
}

// Run a generic per-kind function on a type-erased action
macro_rules! with_kind {
    ($action:expr, $func:ident($($arg:expr),*)) => {
        match $action.kind {
            ActionType::Bool => $func::<Bool>($($arg),*),
            ActionType::HalfAxis => $func::<HalfAxis>($($arg),*),
            ActionType::Axis => $func::<Axis>($($arg),*),
            ActionType::DualAxis => $func::<DualAxis>($($arg),*),
            ActionType::Delta => $func::<Delta>($($arg),*),
        }
    };
}

fn slot_active<K: ActionKind>(states: &ActionStates, device: DeviceId, index: usize) -> bool {
    K::states(states).slot(device, index).active
}

fn slot_sources<K: ActionKind>(
    states: &ActionStates,
    device: DeviceId,
    index: usize,
) -> Vec<Source> {
    K::states(states).slot(device, index).sources().collect()
}

fn activate_slot<K: ActionKind>(
    states: &mut ActionStates,
    device: DeviceId,
    index: usize,
    binding: Binding,
    raw: &RawState,
    settings: &InputSettings,
) {
    K::states_mut(states).activate(device, index, binding, raw, settings);
}

fn deactivate_slot<K: ActionKind>(states: &mut ActionStates, device: DeviceId, index: usize) {
    K::states_mut(states).deactivate(device, index);
}

fn refresh_any_slot<K: ActionKind>(states: &mut ActionStates, index: usize, live: &[DeviceId]) {
    K::states_mut(states).refresh_any(index, live);
}

fn newframe_slot<K: ActionKind>(states: &mut ActionStates, device: DeviceId, index: usize) {
    let slot = K::states_mut(states).slot_mut(device, index);
    slot.previous = slot.value;
}

fn update_slot<K: ActionKind>(
    states: &mut ActionStates,
    device: DeviceId,
    index: usize,
    raw: &RawState,
    settings: &InputSettings,
) {
    K::states_mut(states).update(device, index, raw, settings);
}

impl ActionStates {
    pub(crate) fn new(actions: &ActionTable, devices: usize) -> Self {
        Self {
            bools: StateTable::new(actions.count(ActionType::Bool), devices),
            half_axes: StateTable::new(actions.count(ActionType::HalfAxis), devices),
            axes: StateTable::new(actions.count(ActionType::Axis), devices),
            dual_axes: StateTable::new(actions.count(ActionType::DualAxis), devices),
            deltas: StateTable::new(actions.count(ActionType::Delta), devices),
        }
    }

    /// Append a row of inactive slots for a newly connected device
    pub(crate) fn add_device(&mut self) {
        self.bools.add_device();
        self.half_axes.add_device();
        self.axes.add_device();
        self.dual_axes.add_device();
        self.deltas.add_device();
    }

    pub fn is_active(&self, device: DeviceId, action: AnyAction) -> bool {
        with_kind!(action, slot_active(self, device, action.index()))
    }

    /// Sources currently feeding an action on a device
    pub fn sources(&self, device: DeviceId, action: AnyAction) -> Vec<Source> {
        with_kind!(action, slot_sources(self, device, action.index()))
    }

    /// Bind a source to an action on a device, making it live
    pub(crate) fn activate(
        &mut self,
        device: DeviceId,
        action: AnyAction,
        binding: Binding,
        raw: &RawState,
        settings: &InputSettings,
    ) {
        with_kind!(
            action,
            activate_slot(self, device, action.index(), binding, raw, settings)
        )
    }

    /// Drop every source of an action on a device and reset its value
    pub(crate) fn deactivate(&mut self, device: DeviceId, action: AnyAction) {
        with_kind!(action, deactivate_slot(self, device, action.index()))
    }

    pub(crate) fn deactivate_all(&mut self, device: DeviceId, order: &[AnyAction]) {
        for &action in order {
            self.deactivate(device, action);
        }
    }

    pub(crate) fn any_active(&self, device: DeviceId, order: &[AnyAction]) -> bool {
        order.iter().any(|&action| self.is_active(device, action))
    }

    /// Recompute which actions are live on the `ANY` slot
    ///
    /// An action is live there while at least one physical device carries it.
    /// When the device that last wrote the mirrored value no longer carries
    /// the action, the mirror follows the first device that still does.
    pub(crate) fn refresh_any(&mut self, order: &[AnyAction], devices: &[DeviceId]) {
        for &action in order {
            let live: Vec<DeviceId> = devices
                .iter()
                .copied()
                .filter(|&device| self.is_active(device, action))
                .collect();
            with_kind!(action, refresh_any_slot(self, action.index(), &live));
        }
    }

    /// Copy value into previous for every action on the `ANY` slot
    pub(crate) fn newframe_any(&mut self, order: &[AnyAction]) {
        for &action in order {
            with_kind!(action, newframe_slot(self, DeviceId::ANY, action.index()));
        }
    }

    /// Copy value into previous for every live action on a device
    pub(crate) fn newframe(&mut self, device: DeviceId, order: &[AnyAction]) {
        for &action in order {
            if self.is_active(device, action) {
                with_kind!(action, newframe_slot(self, device, action.index()));
            }
        }
    }

    /// Pull fresh values for every live action on a device, in declaration order
    pub(crate) fn update(
        &mut self,
        device: DeviceId,
        order: &[AnyAction],
        raw: &RawState,
        settings: &InputSettings,
    ) {
        for &action in order {
            if self.is_active(device, action) {
                with_kind!(action, update_slot(self, device, action.index(), raw, settings));
            }
        }
    }
}
