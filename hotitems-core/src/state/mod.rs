//! # Keyed State
//!
//! State scoped to the key currently being processed.
//!
//! State is accessed through lightweight handles (descriptor pattern): a
//! [`ListStateHandle`] only carries the state name and takes the backend as an
//! argument, so a function can hold handles while the runtime owns the
//! backend.
//!
//! ## Backends
//!
//! - [`HashMapStateBackend`]: in-memory, one instance per task

use std::marker::PhantomData;

use anyhow::Result;

use crate::types::StreamData;

pub mod hashmap;

pub use hashmap::HashMapStateBackend;

/// Keyed state backend: manages state for the current processing key.
///
/// The backend maintains a "current key" context. All state operations
/// are scoped to this key.
pub trait KeyedStateBackend: Send {
    /// Set the current processing key.
    fn set_current_key(&mut self, key: Vec<u8>);

    /// The key set by the last [`set_current_key`](Self::set_current_key).
    fn current_key(&self) -> Option<&[u8]>;

    /// Read the list stored under `name` for the current key.
    fn get_list<V: StreamData>(&self, name: &str) -> Result<Vec<V>>;

    /// Append to the list stored under `name` for the current key.
    fn add_to_list<V: StreamData>(&mut self, name: &str, value: V) -> Result<()>;

    /// Drop the list stored under `name` for the current key.
    fn clear_list(&mut self, name: &str) -> Result<()>;

    /// Number of keys holding a non-empty list under `name`.
    fn list_key_count(&self, name: &str) -> usize;
}

/// Handle to a list state. Holds no data itself.
#[derive(Debug, Clone)]
pub struct ListStateHandle<V> {
    name: String,
    _phantom: PhantomData<fn() -> V>,
}

impl<V: StreamData> ListStateHandle<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _phantom: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values for the current key, in insertion order.
    pub fn get<B: KeyedStateBackend>(&self, backend: &B) -> Result<Vec<V>> {
        backend.get_list(&self.name)
    }

    pub fn add<B: KeyedStateBackend>(&self, backend: &mut B, value: V) -> Result<()> {
        backend.add_to_list(&self.name, value)
    }

    pub fn clear<B: KeyedStateBackend>(&self, backend: &mut B) -> Result<()> {
        backend.clear_list(&self.name)
    }

    /// Number of keys currently holding values under this handle.
    pub fn key_count<B: KeyedStateBackend>(&self, backend: &B) -> usize {
        backend.list_key_count(&self.name)
    }
}
