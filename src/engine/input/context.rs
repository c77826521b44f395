// Contexts: named action sets and the per-device activation stacks

use super::action::AnyAction;
use super::source::Source;
use super::InputError;
use std::collections::HashMap;
use std::fmt;

/// Handle to a declared context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u32);

impl ContextId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "context #{}", self.0)
    }
}

#[derive(Debug)]
struct ContextEntry {
    name: String,
    actions: Vec<AnyAction>,

    /// Resolved (action, source) pairs, in load order
    bindings: Vec<(AnyAction, Source)>,
}

/// Table of declared contexts and their bindings
#[derive(Debug, Default)]
pub struct ContextTable {
    by_name: HashMap<String, ContextId>,
    contexts: Vec<ContextEntry>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a context listing a fixed set of actions
    pub fn declare(
        &mut self,
        name: &str,
        actions: impl IntoIterator<Item = AnyAction>,
    ) -> Result<ContextId, InputError> {
        if self.by_name.contains_key(name) {
            return Err(InputError::DuplicateContext(name.to_string()));
        }

        let mut listed: Vec<AnyAction> = Vec::new();
        for action in actions {
            if !listed.contains(&action) {
                listed.push(action);
            }
        }

        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(ContextEntry {
            name: name.to_string(),
            actions: listed,
            bindings: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, name: &str) -> Option<ContextId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, context: ContextId) -> &str {
        &self.contexts[context.index()].name
    }

    /// Actions listed by a context, in declaration order
    pub fn actions(&self, context: ContextId) -> &[AnyAction] {
        &self.contexts[context.index()].actions
    }

    pub fn lists(&self, context: ContextId, action: AnyAction) -> bool {
        self.contexts[context.index()].actions.contains(&action)
    }

    pub fn bindings(&self, context: ContextId) -> &[(AnyAction, Source)] {
        &self.contexts[context.index()].bindings
    }

    pub(crate) fn replace_bindings(
        &mut self,
        context: ContextId,
        bindings: Vec<(AnyAction, Source)>,
    ) {
        self.contexts[context.index()].bindings = bindings;
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StackEntry {
    context: ContextId,
    priority: i32,
    seq: u64,
}

/// Contexts activated on one device
///
/// The foreground context is the one with the highest priority. Equal
/// priorities resolve to the most recent activation.
#[derive(Debug, Clone, Default)]
pub struct ContextStack {
    entries: Vec<StackEntry>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a context, replacing any earlier activation of it
    pub(crate) fn push(&mut self, context: ContextId, priority: i32, seq: u64) {
        self.entries.retain(|e| e.context != context);
        self.entries.push(StackEntry {
            context,
            priority,
            seq,
        });
    }

    /// Remove a context; returns false if it was not on the stack
    pub(crate) fn remove(&mut self, context: ContextId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.context != context);
        self.entries.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn foreground(&self) -> Option<ContextId> {
        self.entries
            .iter()
            .max_by_key(|e| (e.priority, e.seq))
            .map(|e| e.context)
    }

    pub fn contains(&self, context: ContextId) -> bool {
        self.entries.iter().any(|e| e.context == context)
    }

    /// Activated contexts with their priorities, oldest activation first
    pub fn iter(&self) -> impl Iterator<Item = (ContextId, i32)> + '_ {
        self.entries.iter().map(|e| (e.context, e.priority))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
