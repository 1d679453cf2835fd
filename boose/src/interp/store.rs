//! Program store: variables, arrays and methods of one program run

use super::call::normalize_method_name;
use super::scope::{Scope, ScopeMode, ScopeStack};
use super::value::{ElementKind, Value};
use crate::ast::MethodDef;
use crate::error::{BoundsError, EvalError, InterpError, ParseError, ResolutionError};
use std::collections::HashMap;
use std::rc::Rc;

/// Largest element count an `array` declaration may request
pub const MAX_ARRAY_LEN: usize = 1 << 20;

/// Fixed-length array with a single element kind
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub kind: ElementKind,
    pub values: Vec<Value>,
}

impl Array {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// All mutable state of a program run
#[derive(Debug, Default)]
pub struct ProgramStore {
    scopes: ScopeStack,
    arrays: HashMap<String, Array>,
    /// Registration order matters for case-insensitive and normalized lookup
    methods: Vec<Rc<MethodDef>>,
}

impl ProgramStore {
    pub fn new(mode: ScopeMode) -> Self {
        Self {
            scopes: ScopeStack::new(mode),
            arrays: HashMap::new(),
            methods: Vec::new(),
        }
    }

    /// Clear variables, arrays and methods
    pub fn reset(&mut self) {
        self.scopes.reset();
        self.arrays.clear();
        self.methods.clear();
    }

    // ---- variables (active scope only) ----

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.scopes.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.scopes.set(name, value);
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.scopes.remove(name)
    }

    /// The active variable mapping
    pub fn variables(&self) -> &Scope {
        self.scopes.active()
    }

    pub fn enter_scope(&mut self, scope: Scope) {
        self.scopes.push_scope(scope);
    }

    pub fn exit_scope(&mut self) -> Option<Scope> {
        self.scopes.pop_scope()
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.depth()
    }

    // ---- arrays ----

    pub fn get_array(&self, name: &str) -> Option<&Array> {
        self.arrays.get(name)
    }

    pub fn arrays(&self) -> &HashMap<String, Array> {
        &self.arrays
    }

    /// Declare (or redeclare) a zero-filled array
    pub fn declare_array(&mut self, name: &str, kind: &str, size: i64) -> Result<&Array, ParseError> {
        let kind = ElementKind::parse(kind).ok_or_else(|| ParseError::InvalidKind(kind.to_string()))?;
        if size <= 0 {
            return Err(ParseError::InvalidSize(size));
        }
        let too_large = || ParseError::ArrayTooLarge {
            size,
            limit: MAX_ARRAY_LEN,
        };
        let len = usize::try_from(size).map_err(|_| too_large())?;
        if len > MAX_ARRAY_LEN {
            return Err(too_large());
        }
        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|_| too_large())?;
        values.resize(len, kind.zero());
        let array = Array { kind, values };
        self.arrays.insert(name.to_string(), array);
        Ok(&self.arrays[name])
    }

    /// Store `value` at `index`, coerced to the element kind. Returns the stored value.
    pub fn poke(&mut self, name: &str, index: i64, value: &Value) -> Result<Value, InterpError> {
        let array = self
            .arrays
            .get_mut(name)
            .ok_or_else(|| ResolutionError::UnknownArray(name.to_string()))?;
        let slot = checked_index(name, index, array.len())?;
        let stored = array
            .kind
            .coerce(value)
            .ok_or_else(|| EvalError::NotNumeric(value.to_string()))?;
        array.values[slot] = stored.clone();
        Ok(stored)
    }

    pub fn peek(&self, name: &str, index: i64) -> Result<Value, InterpError> {
        let array = self
            .arrays
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownArray(name.to_string()))?;
        let slot = checked_index(name, index, array.len())?;
        Ok(array.values[slot].clone())
    }

    // ---- methods ----

    /// Register a method, replacing any method with the same name
    pub fn register_method(&mut self, def: Rc<MethodDef>) {
        match self.methods.iter_mut().find(|m| m.name == def.name) {
            Some(existing) => *existing = def,
            None => self.methods.push(def),
        }
    }

    /// Resolve a call-site name: exact, then ignoring case, then after
    /// [`normalize_method_name`] on both sides
    pub fn lookup_method(&self, name: &str) -> Option<Rc<MethodDef>> {
        let exact = self.methods.iter().find(|m| m.name == name);
        let folded = || self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name));
        let normalized = || {
            let key = normalize_method_name(name);
            self.methods
                .iter()
                .find(|m| normalize_method_name(&m.name) == key)
        };
        exact.or_else(folded).or_else(normalized).cloned()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter().map(|m| m.as_ref())
    }
}

fn checked_index(array: &str, index: i64, len: usize) -> Result<usize, BoundsError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or_else(|| BoundsError::IndexOutOfRange {
            array: array.to_string(),
            index,
            len,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, params: &[&str]) -> Rc<MethodDef> {
        Rc::new(MethodDef {
            name: name.to_string(),
            return_kind: "int".to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            lines: Vec::new(),
            body: Vec::new(),
        })
    }

    #[test]
    fn test_declare_array_zero_filled() {
        let mut store = ProgramStore::default();
        let array = store.declare_array("nums", "int", 4).unwrap();
        assert_eq!(array.len(), 4);
        assert!(array.values.iter().all(|v| *v == Value::Int(0)));

        let array = store.declare_array("r", "real", 2).unwrap();
        assert_eq!(array.values, vec![Value::Real(0.0); 2]);
    }

    #[test]
    fn test_declare_array_size_limit() {
        let mut store = ProgramStore::default();
        assert_eq!(
            store.declare_array("a", "int", 100_000_000_000_000).unwrap_err(),
            ParseError::ArrayTooLarge {
                size: 100_000_000_000_000,
                limit: MAX_ARRAY_LEN
            }
        );
        assert!(store.arrays().get("a").is_none());

        let over = MAX_ARRAY_LEN as i64 + 1;
        assert!(matches!(
            store.declare_array("b", "real", over),
            Err(ParseError::ArrayTooLarge { .. })
        ));
        assert_eq!(store.declare_array("c", "int", 1024).unwrap().len(), 1024);
    }

    #[test]
    fn test_declare_array_errors() {
        let mut store = ProgramStore::default();
        assert_eq!(
            store.declare_array("a", "int", 0).unwrap_err(),
            ParseError::InvalidSize(0)
        );
        assert_eq!(
            store.declare_array("a", "bool", 3).unwrap_err(),
            ParseError::InvalidKind("bool".to_string())
        );
    }

    #[test]
    fn test_poke_peek_coerces() {
        let mut store = ProgramStore::default();
        store.declare_array("a", "int", 3).unwrap();
        let stored = store.poke("a", 1, &Value::Real(4.6)).unwrap();
        assert_eq!(stored, Value::Int(5));
        assert_eq!(store.peek("a", 1).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_poke_out_of_bounds() {
        let mut store = ProgramStore::default();
        store.declare_array("a", "real", 2).unwrap();
        let err = store.poke("a", 2, &Value::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            InterpError::Bounds(BoundsError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
        assert!(store.peek("a", -1).is_err());
        assert!(matches!(
            store.peek("missing", 0).unwrap_err(),
            InterpError::Resolution(ResolutionError::UnknownArray(_))
        ));
    }

    #[test]
    fn test_redeclare_replaces() {
        let mut store = ProgramStore::default();
        store.set_variable("x", Value::Int(1));
        store.set_variable("x", Value::Real(2.5));
        assert_eq!(store.get_variable("x"), Some(&Value::Real(2.5)));

        store.declare_array("a", "int", 2).unwrap();
        store.poke("a", 0, &Value::Int(9)).unwrap();
        store.declare_array("a", "int", 5).unwrap();
        assert_eq!(store.peek("a", 0).unwrap(), Value::Int(0));
        assert_eq!(store.get_array("a").map(Array::len), Some(5));
    }

    #[test]
    fn test_lookup_method_order() {
        let mut store = ProgramStore::default();
        store.register_method(method("mulMethod", &["a", "b"]));
        store.register_method(method("MulMethod", &["a"]));

        assert_eq!(store.lookup_method("MulMethod").unwrap().params.len(), 1);
        // case-insensitive match takes the first registered
        assert_eq!(store.lookup_method("MULMETHOD").unwrap().name, "mulMethod");
        assert_eq!(store.lookup_method("mullMethod").unwrap().name, "mulMethod");
        assert!(store.lookup_method("divMethod").is_none());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = ProgramStore::default();
        store.set_variable("x", Value::Int(1));
        store.declare_array("a", "int", 1).unwrap();
        store.register_method(method("m", &[]));
        store.reset();
        assert!(store.variables().is_empty());
        assert!(store.get_array("a").is_none());
        assert!(store.lookup_method("m").is_none());
    }
}
