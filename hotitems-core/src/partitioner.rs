//! Routing of records to parallel task instances.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use ahash::AHasher;

/// Chooses a target partition in `0..num_partitions` for a value.
pub trait Partitioner<T>: Send + Sync {
    fn partition(&self, value: &T, num_partitions: usize) -> usize;
}

/// Hash partitioning on a selected key.
///
/// Equal keys always map to the same partition, which is what gives keyed
/// operators exclusive ownership of their keys.
pub struct HashPartitioner<K, F> {
    key_selector: F,
    _phantom: PhantomData<fn() -> K>,
}

impl<K, F> HashPartitioner<K, F> {
    pub fn new(key_selector: F) -> Self {
        Self {
            key_selector,
            _phantom: PhantomData,
        }
    }
}

impl<K, T, F> Partitioner<T> for HashPartitioner<K, F>
where
    K: Hash,
    F: Fn(&T) -> K + Send + Sync,
{
    fn partition(&self, value: &T, num_partitions: usize) -> usize {
        if num_partitions <= 1 {
            return 0;
        }
        let mut hasher = AHasher::default();
        (self.key_selector)(value).hash(&mut hasher);
        (hasher.finish() % num_partitions as u64) as usize
    }
}

/// Sends everything to partition 0. Used for single-consumer edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardPartitioner;

impl<T> Partitioner<T> for ForwardPartitioner {
    fn partition(&self, _value: &T, _num_partitions: usize) -> usize {
        0
    }
}
