//! Function calls announced in the current segment but not yet dispatched.

use std::collections::HashMap;

/// One in-flight function call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingCall {
    pub name: Option<String>,
    pub call_id: Option<String>,
    pub arguments: String,
}

impl PendingCall {
    /// Name and call id, once both are known.
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (self.name.as_deref(), self.call_id.as_deref()) {
            (Some(name), Some(call_id)) if !name.is_empty() && !call_id.is_empty() => {
                Some((name, call_id))
            }
            _ => None,
        }
    }
}

/// Pending calls keyed by output item id.
#[derive(Debug, Default)]
pub struct PendingCalls {
    calls: HashMap<String, PendingCall>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announced call. Deltas that arrived first are kept.
    pub fn open(
        &mut self,
        item_id: &str,
        name: Option<String>,
        call_id: Option<String>,
        arguments: Option<String>,
    ) {
        let entry = self.calls.entry(item_id.to_string()).or_default();
        entry.name = name.or(entry.name.take());
        entry.call_id = call_id.or(entry.call_id.take());
        if entry.arguments.is_empty() {
            if let Some(arguments) = arguments {
                entry.arguments = arguments;
            }
        }
    }

    /// Append an argument fragment, creating an empty entry for unseen ids.
    pub fn append(&mut self, item_id: &str, delta: &str) {
        self.calls
            .entry(item_id.to_string())
            .or_default()
            .arguments
            .push_str(delta);
    }

    pub fn take(&mut self, item_id: &str) -> Option<PendingCall> {
        self.calls.remove(item_id)
    }

    pub fn get(&self, item_id: &str) -> Option<&PendingCall> {
        self.calls.get(item_id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}
