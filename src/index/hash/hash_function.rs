//! Hash functions for the extendible hash table.
//!
//! The table only ever consumes the low `global_depth` bits of the
//! returned value, so any function with reasonable bit distribution
//! works; the choice is pluggable so tests can swap in deterministic
//! hashing without affecting production behavior.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Computes a 32-bit hash of a key.
pub trait HashFunction<K> {
    fn hash(&self, key: &K) -> u32;
}

/// Hashes via `std::hash::Hash` + `DefaultHasher`, truncating the 64-bit
/// output to 32 bits. Good general-purpose distribution, not suitable
/// where a stable cross-process hash is required (SipHash is seeded).
pub struct DefaultHashFunction<K> {
    _marker: PhantomData<K>,
}

impl<K> DefaultHashFunction<K> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<K> Default for DefaultHashFunction<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash> HashFunction<K> for DefaultHashFunction<K> {
    fn hash(&self, key: &K) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish() as u32
    }
}

/// Returns the key's own integer value as its hash.
///
/// Exists so tests can place keys into specific buckets/slots
/// deterministically (e.g. "a key that hashes to 4") without depending
/// on an opaque hash implementation.
pub struct IdentityHashFunction;

impl HashFunction<i32> for IdentityHashFunction {
    fn hash(&self, key: &i32) -> u32 {
        *key as u32
    }
}

impl HashFunction<u32> for IdentityHashFunction {
    fn hash(&self, key: &u32) -> u32 {
        *key
    }
}
