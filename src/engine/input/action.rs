// Action declarations: typed handles and the table of declared names

use super::config::InputSettings;
use super::device::RawState;
use super::source::Binding;
use super::state::{ActionStates, StateTable};
use super::InputError;
use glam::Vec2;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// Maximum number of actions, all kinds combined
pub const MAX_ACTIONS: usize = 256;

/// The value type of an action, fixed at declaration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionType {
    /// Digital button: pressed or released
    Bool,
    /// Unsigned analog value in `0.0..=1.0`
    HalfAxis,
    /// Signed analog value in `-1.0..=1.0`
    Axis,
    /// Absolute 2D position, each component in `-1.0..=1.0`
    DualAxis,
    /// 2D rate of change, in device-dependent units
    Delta,
}

impl ActionType {
    pub const ALL: [ActionType; 5] = [
        Self::Bool,
        Self::HalfAxis,
        Self::Axis,
        Self::DualAxis,
        Self::Delta,
    ];
}

// Kind markers for typed action handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bool;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HalfAxis;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Axis;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DualAxis;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Delta;

/// Behaviour shared by the five action kinds
///
/// Each kind names its value type, reads that value out of a bound source,
/// and locates its own per-device state table.
pub trait ActionKind: Debug + Clone + Copy + PartialEq + Eq + Hash + Default + 'static {
    type Value: Debug + Clone + Copy + PartialEq + Default;

    const TYPE: ActionType;

    /// Read a source through the capability matching this kind
    fn read(binding: &mut Binding, raw: &RawState, settings: &InputSettings) -> (bool, Self::Value);

    fn states(states: &ActionStates) -> &StateTable<Self>;

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self>;
}

impl ActionKind for Bool {
    type Value = bool;
    const TYPE: ActionType = ActionType::Bool;

    fn read(binding: &mut Binding, raw: &RawState, _settings: &InputSettings) -> (bool, bool) {
        binding.as_button(raw)
    }

    fn states(states: &ActionStates) -> &StateTable<Self> {
        &states.bools
    }

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self> {
        &mut states.bools
    }
}

impl ActionKind for HalfAxis {
    type Value = f32;
    const TYPE: ActionType = ActionType::HalfAxis;

    fn read(binding: &mut Binding, raw: &RawState, _settings: &InputSettings) -> (bool, f32) {
        binding.as_half_axis(raw)
    }

    fn states(states: &ActionStates) -> &StateTable<Self> {
        &states.half_axes
    }

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self> {
        &mut states.half_axes
    }
}

impl ActionKind for Axis {
    type Value = f32;
    const TYPE: ActionType = ActionType::Axis;

    fn read(binding: &mut Binding, raw: &RawState, settings: &InputSettings) -> (bool, f32) {
        binding.as_axis(raw, settings)
    }

    fn states(states: &ActionStates) -> &StateTable<Self> {
        &states.axes
    }

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self> {
        &mut states.axes
    }
}

impl ActionKind for DualAxis {
    type Value = Vec2;
    const TYPE: ActionType = ActionType::DualAxis;

    fn read(binding: &mut Binding, raw: &RawState, settings: &InputSettings) -> (bool, Vec2) {
        binding.as_dual_axis(raw, settings)
    }

    fn states(states: &ActionStates) -> &StateTable<Self> {
        &states.dual_axes
    }

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self> {
        &mut states.dual_axes
    }
}

impl ActionKind for Delta {
    type Value = Vec2;
    const TYPE: ActionType = ActionType::Delta;

    fn read(binding: &mut Binding, raw: &RawState, settings: &InputSettings) -> (bool, Vec2) {
        binding.as_delta(raw, settings)
    }

    fn states(states: &ActionStates) -> &StateTable<Self> {
        &states.deltas
    }

    fn states_mut(states: &mut ActionStates) -> &mut StateTable<Self> {
        &mut states.deltas
    }
}

/// Type-safe handle to a declared action
///
/// The `K` parameter ties the handle to the kind it was declared with, so a
/// dual-axis action can't be queried as a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Action<K> {
    index: u32,
    _kind: PhantomData<K>,
}

impl<K: ActionKind> Action<K> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index: index as u32,
            _kind: PhantomData,
        }
    }

    /// Index among the actions of the same kind
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn action_type(self) -> ActionType {
        K::TYPE
    }
}

/// Convenience type aliases
pub type BoolAction = Action<Bool>;
pub type HalfAxisAction = Action<HalfAxis>;
pub type AxisAction = Action<Axis>;
pub type DualAxisAction = Action<DualAxis>;
pub type DeltaAction = Action<Delta>;

/// An action handle with its kind erased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnyAction {
    pub(crate) kind: ActionType,
    pub(crate) index: u32,
}

impl AnyAction {
    pub fn action_type(self) -> ActionType {
        self.kind
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

impl<K: ActionKind> From<Action<K>> for AnyAction {
    fn from(action: Action<K>) -> Self {
        Self {
            kind: K::TYPE,
            index: action.index,
        }
    }
}

/// Table of all declared actions
///
/// Open for declarations until sealed, read-only afterwards.
#[derive(Debug, Default)]
pub struct ActionTable {
    /// Lookup by name, across all kinds
    by_name: HashMap<String, AnyAction>,

    /// Names per kind, indexed by `ActionType`
    names: [Vec<String>; 5],

    /// Every action in declaration order
    order: Vec<AnyAction>,

    sealed: bool,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new action
    ///
    /// Fails without touching the table if the table is sealed, if the name is
    /// taken by any action, or if the table is full.
    pub fn declare<K: ActionKind>(&mut self, name: &str) -> Result<Action<K>, InputError> {
        if self.sealed {
            return Err(InputError::DeclaredAfterStart(name.to_string()));
        }
        if self.by_name.contains_key(name) {
            return Err(InputError::DuplicateName(name.to_string()));
        }
        if self.order.len() >= MAX_ACTIONS {
            return Err(InputError::TooManyActions { max: MAX_ACTIONS });
        }

        let names = &mut self.names[K::TYPE as usize];
        let action = Action::<K>::new(names.len());
        names.push(name.to_string());
        self.by_name.insert(name.to_string(), action.into());
        self.order.push(action.into());
        Ok(action)
    }

    /// Close the table to further declarations
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Look up an action by name
    pub fn get(&self, name: &str) -> Option<AnyAction> {
        self.by_name.get(name).copied()
    }

    /// Name of a declared action
    ///
    /// # Panics
    /// Panics if the handle does not come from this table.
    pub fn name(&self, action: AnyAction) -> &str {
        &self.names[action.kind as usize][action.index()]
    }

    /// Number of declared actions of one kind
    pub fn count(&self, kind: ActionType) -> usize {
        self.names[kind as usize].len()
    }

    /// Number of declared actions, all kinds combined
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All actions in declaration order
    pub fn order(&self) -> &[AnyAction] {
        &self.order
    }
}
