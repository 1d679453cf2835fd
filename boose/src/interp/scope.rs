//! Variable scopes
//!
//! Exactly one scope is active at a time and lookups never fall through to
//! an outer scope: a method call replaces the caller's variables instead of
//! layering on top of them. How the caller's scope is kept while a call runs
//! depends on [`ScopeMode`].

use super::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Mapping from variable name to value
pub type Scope = HashMap<String, Value>;

/// How caller scopes are saved across method calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeMode {
    /// One saved scope per active call; re-entrant calls restore correctly
    #[default]
    Stack,
    /// A single saved slot. A call made while another call is running
    /// overwrites the saved caller scope, which is then lost.
    SingleSlot,
}

impl FromStr for ScopeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stack" => Ok(ScopeMode::Stack),
            "single-slot" => Ok(ScopeMode::SingleSlot),
            other => Err(format!(
                "unknown scope mode '{other}', expected 'stack' or 'single-slot'"
            )),
        }
    }
}

/// Saved and active scopes. The last entry is the active one.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    mode: ScopeMode,
}

impl ScopeStack {
    /// Create a stack holding one empty top-level scope
    pub fn new(mode: ScopeMode) -> Self {
        ScopeStack {
            scopes: vec![Scope::new()],
            mode,
        }
    }

    /// Number of scopes currently held, including the active one
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Make `scope` the active scope, saving the current one
    pub fn push_scope(&mut self, scope: Scope) {
        if self.mode == ScopeMode::SingleSlot && self.scopes.len() >= 2 {
            // the slot already holds a caller scope; it is overwritten
            self.scopes.remove(0);
        }
        self.scopes.push(scope);
    }

    /// Leave the active scope and return it.
    ///
    /// In single-slot mode, once the saved slot has been consumed the active
    /// scope stays in place (it is what the slot was overwritten with) and a
    /// copy is returned.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            return self.scopes.pop();
        }
        match self.mode {
            ScopeMode::Stack => None,
            ScopeMode::SingleSlot => self.scopes.last().cloned(),
        }
    }

    /// The active scope
    pub fn active(&self) -> &Scope {
        // the vector is never empty: push adds, pop keeps the last entry
        &self.scopes[self.scopes.len() - 1]
    }

    fn active_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Look up a variable in the active scope
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.active().get(name)
    }

    /// Define or overwrite a variable in the active scope
    pub fn set(&mut self, name: &str, value: Value) {
        self.active_mut().insert(name.to_string(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.active_mut().remove(name)
    }

    /// Drop every scope and start over with an empty top-level scope
    pub fn reset(&mut self) {
        self.scopes.truncate(1);
        self.scopes[0].clear();
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new(ScopeMode::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope_with(name: &str, value: i64) -> Scope {
        let mut scope = Scope::new();
        scope.insert(name.to_string(), Value::Int(value));
        scope
    }

    #[test]
    fn test_basic_set_get() {
        let mut stack = ScopeStack::default();
        stack.set("x", Value::Int(42));
        assert_eq!(stack.get("x"), Some(&Value::Int(42)));
        assert_eq!(stack.get("y"), None);
    }

    #[test]
    fn test_call_scope_hides_caller() {
        let mut stack = ScopeStack::default();
        stack.set("x", Value::Int(1));
        stack.push_scope(scope_with("a", 5));
        assert_eq!(stack.get("x"), None);
        assert_eq!(stack.get("a"), Some(&Value::Int(5)));

        let popped = stack.pop_scope().unwrap();
        assert_eq!(popped.get("a"), Some(&Value::Int(5)));
        assert_eq!(stack.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_stack_mode_nested_calls_restore() {
        let mut stack = ScopeStack::new(ScopeMode::Stack);
        stack.set("top", Value::Int(1));
        stack.push_scope(scope_with("outer", 2));
        stack.push_scope(scope_with("inner", 3));
        assert_eq!(stack.depth(), 3);

        stack.pop_scope();
        assert_eq!(stack.get("outer"), Some(&Value::Int(2)));
        stack.pop_scope();
        assert_eq!(stack.get("top"), Some(&Value::Int(1)));
        assert!(stack.pop_scope().is_none());
    }

    #[test]
    fn test_single_slot_mode_loses_top_level() {
        let mut stack = ScopeStack::new(ScopeMode::SingleSlot);
        stack.set("top", Value::Int(1));
        stack.push_scope(scope_with("outer", 2));
        stack.push_scope(scope_with("inner", 3));
        assert_eq!(stack.depth(), 2);

        stack.pop_scope();
        assert_eq!(stack.get("outer"), Some(&Value::Int(2)));

        // the top-level scope was overwritten by the nested call
        let popped = stack.pop_scope().unwrap();
        assert_eq!(popped.get("outer"), Some(&Value::Int(2)));
        assert_eq!(stack.get("top"), None);
        assert_eq!(stack.get("outer"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_reset() {
        let mut stack = ScopeStack::default();
        stack.set("x", Value::Int(1));
        stack.push_scope(Scope::new());
        stack.reset();
        assert_eq!(stack.depth(), 1);
        assert!(stack.active().is_empty());
    }

    #[test]
    fn test_scope_mode_from_str() {
        assert_eq!("single-slot".parse::<ScopeMode>(), Ok(ScopeMode::SingleSlot));
        assert_eq!("stack".parse::<ScopeMode>(), Ok(ScopeMode::Stack));
        assert!("heap".parse::<ScopeMode>().is_err());
    }
}
