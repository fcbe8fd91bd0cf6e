//! HashMap-based state backend.

use std::collections::HashMap;

use anyhow::{Result, anyhow};

use super::KeyedStateBackend;
use crate::types::StreamData;

/// In-memory state backend.
///
/// Each task owns one backend, so access needs no locks. List elements are
/// serialized individually with bincode, which keeps `add` O(1).
#[derive(Debug, Default)]
pub struct HashMapStateBackend {
    /// (key, state_name) -> serialized elements
    list_states: HashMap<(Vec<u8>, String), Vec<Vec<u8>>>,
    current_key: Option<Vec<u8>>,
}

impl HashMapStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_key(&self, name: &str) -> Result<(Vec<u8>, String)> {
        let key = self
            .current_key
            .as_ref()
            .ok_or_else(|| anyhow!("No current key set"))?;
        Ok((key.clone(), name.to_string()))
    }
}

impl KeyedStateBackend for HashMapStateBackend {
    fn set_current_key(&mut self, key: Vec<u8>) {
        self.current_key = Some(key);
    }

    fn current_key(&self) -> Option<&[u8]> {
        self.current_key.as_deref()
    }

    fn get_list<V: StreamData>(&self, name: &str) -> Result<Vec<V>> {
        let state_key = self.state_key(name)?;
        match self.list_states.get(&state_key) {
            Some(elems) => elems
                .iter()
                .map(|bytes| bincode::deserialize(bytes).map_err(anyhow::Error::from))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn add_to_list<V: StreamData>(&mut self, name: &str, value: V) -> Result<()> {
        let state_key = self.state_key(name)?;
        let bytes = bincode::serialize(&value)?;
        self.list_states.entry(state_key).or_default().push(bytes);
        Ok(())
    }

    fn clear_list(&mut self, name: &str) -> Result<()> {
        let state_key = self.state_key(name)?;
        self.list_states.remove(&state_key);
        Ok(())
    }

    fn list_key_count(&self, name: &str) -> usize {
        self.list_states
            .keys()
            .filter(|(_, state_name)| state_name == name)
            .count()
    }
}

#[cfg(test)]
#[path = "tests/hashmap_tests.rs"]
mod tests;
