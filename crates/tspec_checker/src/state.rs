//! Per-program decorator state.
//!
//! Decorator implementations record what they learn about a type in a state
//! map selected by a string key (`"doc"`, `"tags"`, ...). Maps keep
//! insertion order so queries over a whole map are deterministic.

use crate::numeric::Numeric;
use crate::types::{Entity, TypeId};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Flag,
    String(String),
    List(Vec<String>),
    Numeric(Numeric),
    Entity(Entity),
}

impl StateValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            StateValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&Numeric> {
        match self {
            StateValue::Numeric(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct StateMaps {
    maps: FxHashMap<String, IndexMap<TypeId, StateValue>>,
}

impl StateMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, target: TypeId) -> Option<&StateValue> {
        self.maps.get(key)?.get(&target)
    }

    pub fn set(&mut self, key: &str, target: TypeId, value: StateValue) {
        self.maps.entry(key.to_string()).or_default().insert(target, value);
    }

    /// Append to a list state, creating it when absent.
    pub fn push(&mut self, key: &str, target: TypeId, item: String) {
        let map = self.maps.entry(key.to_string()).or_default();
        match map.get_mut(&target) {
            Some(StateValue::List(items)) => items.push(item),
            _ => {
                map.insert(target, StateValue::List(vec![item]));
            }
        }
    }

    pub fn has(&self, key: &str, target: TypeId) -> bool {
        self.get(key, target).is_some()
    }

    /// Every entry recorded under `key`, in insertion order.
    pub fn entries(&self, key: &str) -> impl Iterator<Item = (TypeId, &StateValue)> {
        self.maps.get(key).into_iter().flat_map(|map| map.iter().map(|(k, v)| (*k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut state = StateMaps::new();
        state.set("doc", TypeId(3), StateValue::String("hello".into()));
        assert_eq!(state.get("doc", TypeId(3)).and_then(|v| v.as_str()), Some("hello"));
        assert!(state.get("doc", TypeId(4)).is_none());
        assert!(state.get("summary", TypeId(3)).is_none());
    }

    #[test]
    fn test_push_accumulates() {
        let mut state = StateMaps::new();
        state.push("tags", TypeId(1), "a".into());
        state.push("tags", TypeId(1), "b".into());
        let tags = state.get("tags", TypeId(1)).and_then(|v| v.as_list()).unwrap();
        assert_eq!(tags, ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_entries_in_insertion_order() {
        let mut state = StateMaps::new();
        state.set("k", TypeId(9), StateValue::Flag);
        state.set("k", TypeId(2), StateValue::Flag);
        let ids: Vec<_> = state.entries("k").map(|(id, _)| id).collect();
        assert_eq!(ids, vec![TypeId(9), TypeId(2)]);
        assert_eq!(state.entries("missing").count(), 0);
    }
}
