//! Hash table bucket page.
//!
//! A bucket page holds the actual key/value pairs for one equivalence
//! class under the directory's local-depth mask. Like
//! [`HashTableDirectoryPage`](super::HashTableDirectoryPage), it is an
//! owned view reconstructed from raw page bytes and written back before
//! the owning guard drops.
//!
//! Capacity is a compile-time const generic (`CAP`) rather than derived
//! implicitly from the page size, so call sites can size buckets to
//! whatever fits their key/value types (production code) or to a small
//! fixed number (tests exercising split/merge deterministically).
//!
//! # On-disk layout
//! ```text
//! [occupied bitmap: ceil(CAP/8) bytes][readable bitmap: ceil(CAP/8) bytes][CAP entries]
//! ```
//! Each entry is `K::SIZE + V::SIZE` bytes, encoded via [`FixedSizeEncode`].

use crate::index::hash::comparator::KeyComparator;

/// Manual fixed-width (de)serialization for bucket entries, in the same
/// spirit as `PageHeader::from_bytes`/`write_to` — no transmute, no
/// zero-copy crate, just explicit little-endian byte ranges.
pub trait FixedSizeEncode: Sized + Clone {
    const SIZE: usize;

    fn encode(&self, buf: &mut [u8]);
    fn decode(buf: &[u8]) -> Self;
}

macro_rules! impl_fixed_size_encode_int {
    ($ty:ty) => {
        impl FixedSizeEncode for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            fn encode(&self, buf: &mut [u8]) {
                buf[..Self::SIZE].copy_from_slice(&self.to_le_bytes());
            }

            fn decode(buf: &[u8]) -> Self {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(&buf[..Self::SIZE]);
                Self::from_le_bytes(bytes)
            }
        }
    };
}

impl_fixed_size_encode_int!(i32);
impl_fixed_size_encode_int!(u32);
impl_fixed_size_encode_int!(i64);
impl_fixed_size_encode_int!(u64);

fn bitmap_bytes(cap: usize) -> usize {
    cap.div_ceil(8)
}

/// Owned, in-memory view of a bucket page holding up to `CAP` entries.
#[derive(Debug, Clone)]
pub struct HashTableBucketPage<K, V, const CAP: usize> {
    /// Slot was ever written to (distinguishes "never used" from
    /// "used then removed", matching the original's tombstone-aware scan).
    occupied: Vec<bool>,
    /// Slot currently holds a live entry.
    readable: Vec<bool>,
    entries: Vec<Option<(K, V)>>,
}

impl<K, V, const CAP: usize> HashTableBucketPage<K, V, CAP>
where
    K: FixedSizeEncode,
    V: FixedSizeEncode,
{
    /// Number of bytes one (de)serialized bucket page occupies.
    pub const ENCODED_SIZE: usize = 2 * Self::bitmap_len() + CAP * (K::SIZE + V::SIZE);

    const fn bitmap_len() -> usize {
        CAP.div_ceil(8)
    }

    /// Create a new, empty bucket page.
    pub fn new() -> Self {
        Self {
            occupied: vec![false; CAP],
            readable: vec![false; CAP],
            entries: vec![None; CAP],
        }
    }

    /// Reconstruct a bucket page from raw page bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < Self::ENCODED_SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(
            data.len() >= Self::ENCODED_SIZE,
            "buffer too small for HashTableBucketPage"
        );

        let bitmap_len = bitmap_bytes(CAP);
        let occupied = unpack_bitmap(&data[0..bitmap_len], CAP);
        let readable = unpack_bitmap(&data[bitmap_len..2 * bitmap_len], CAP);

        let entry_width = K::SIZE + V::SIZE;
        let entries_offset = 2 * bitmap_len;

        let mut entries = vec![None; CAP];
        for i in 0..CAP {
            if readable[i] {
                let offset = entries_offset + i * entry_width;
                let key = K::decode(&data[offset..offset + K::SIZE]);
                let value = V::decode(&data[offset + K::SIZE..offset + entry_width]);
                entries[i] = Some((key, value));
            }
        }

        Self {
            occupied,
            readable,
            entries,
        }
    }

    /// Serialize this bucket back into raw page bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < Self::ENCODED_SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(
            data.len() >= Self::ENCODED_SIZE,
            "buffer too small for HashTableBucketPage"
        );

        let bitmap_len = bitmap_bytes(CAP);
        pack_bitmap(&self.occupied, &mut data[0..bitmap_len]);
        pack_bitmap(&self.readable, &mut data[bitmap_len..2 * bitmap_len]);

        let entry_width = K::SIZE + V::SIZE;
        let entries_offset = 2 * bitmap_len;

        for (i, slot) in data[entries_offset..entries_offset + CAP * entry_width]
            .chunks_mut(entry_width)
            .enumerate()
        {
            if let Some((key, value)) = &self.entries[i] {
                key.encode(&mut slot[..K::SIZE]);
                value.encode(&mut slot[K::SIZE..]);
            } else {
                slot.fill(0);
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All values stored under a key comparing equal to `key`.
    pub fn get_value<C: KeyComparator<K>>(&self, key: &K, comparator: &C) -> Vec<V> {
        self.entries
            .iter()
            .filter_map(|slot| slot.as_ref())
            .filter(|(k, _)| comparator.equal(k, key))
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Insert `(key, value)` into the first free slot.
    ///
    /// Returns `false` without modifying anything if the bucket is full
    /// or the exact pair already exists.
    pub fn insert<C: KeyComparator<K>>(&mut self, key: K, value: V, comparator: &C) -> bool
    where
        V: PartialEq,
    {
        for slot in self.entries.iter().flatten() {
            if comparator.equal(&slot.0, &key) && slot.1 == value {
                return false;
            }
        }

        let Some(idx) = self.readable.iter().position(|&r| !r) else {
            return false;
        };

        self.occupied[idx] = true;
        self.readable[idx] = true;
        self.entries[idx] = Some((key, value));
        true
    }

    /// Remove the entry matching both `key` and `value` exactly.
    pub fn remove<C: KeyComparator<K>>(&mut self, key: &K, value: &V, comparator: &C) -> bool
    where
        V: PartialEq,
    {
        for idx in 0..CAP {
            if !self.readable[idx] {
                continue;
            }
            if let Some((k, v)) = &self.entries[idx] {
                if comparator.equal(k, key) && v == value {
                    self.readable[idx] = false;
                    self.entries[idx] = None;
                    return true;
                }
            }
        }
        false
    }

    pub fn key_at(&self, idx: usize) -> Option<&K> {
        self.entries[idx].as_ref().map(|(k, _)| k)
    }

    pub fn value_at(&self, idx: usize) -> Option<&V> {
        self.entries[idx].as_ref().map(|(_, v)| v)
    }

    pub fn is_occupied(&self, idx: usize) -> bool {
        self.occupied[idx]
    }

    pub fn is_readable(&self, idx: usize) -> bool {
        self.readable[idx]
    }

    pub fn num_readable(&self) -> usize {
        self.readable.iter().filter(|&&r| r).count()
    }

    pub fn is_full(&self) -> bool {
        self.num_readable() == CAP
    }

    pub fn is_empty(&self) -> bool {
        self.num_readable() == 0
    }

    /// All readable `(key, value)` pairs, in slot order.
    pub fn all_entries(&self) -> Vec<(K, V)> {
        self.entries.iter().filter_map(|s| s.clone()).collect()
    }

    /// Clear every slot. Used after a split has drained a bucket's
    /// entries into itself and its new sibling.
    pub fn clear(&mut self) {
        self.occupied.fill(false);
        self.readable.fill(false);
        self.entries.fill(None);
    }
}

impl<K, V, const CAP: usize> Default for HashTableBucketPage<K, V, CAP>
where
    K: FixedSizeEncode,
    V: FixedSizeEncode,
{
    fn default() -> Self {
        Self::new()
    }
}

fn pack_bitmap(bits: &[bool], out: &mut [u8]) {
    out.fill(0);
    for (i, &bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 1 << (i % 8);
        }
    }
}

fn unpack_bitmap(data: &[u8], len: usize) -> Vec<bool> {
    (0..len).map(|i| data[i / 8] & (1 << (i % 8)) != 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hash::comparator::DefaultComparator;

    #[test]
    fn test_insert_and_get_value() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();

        assert!(bucket.insert(1, 100, &cmp));
        assert!(bucket.insert(2, 200, &cmp));
        assert_eq!(bucket.get_value(&1, &cmp), vec![100]);
        assert_eq!(bucket.get_value(&2, &cmp), vec![200]);
        assert!(bucket.get_value(&3, &cmp).is_empty());
    }

    #[test]
    fn test_insert_rejects_exact_duplicate() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();

        assert!(bucket.insert(1, 100, &cmp));
        assert!(!bucket.insert(1, 100, &cmp));
        // Same key, different value is allowed (multimap semantics).
        assert!(bucket.insert(1, 200, &cmp));

        let mut values = bucket.get_value(&1, &cmp);
        values.sort();
        assert_eq!(values, vec![100, 200]);
    }

    #[test]
    fn test_bucket_full() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();

        for i in 0..4 {
            assert!(bucket.insert(i, i * 10, &cmp));
        }
        assert!(bucket.is_full());
        assert!(!bucket.insert(99, 990, &cmp));
    }

    #[test]
    fn test_remove() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();

        bucket.insert(1, 100, &cmp);
        assert!(bucket.remove(&1, &100, &cmp));
        assert!(bucket.is_empty());
        assert!(!bucket.remove(&1, &100, &cmp));
    }

    #[test]
    fn test_occupied_survives_removal_but_readable_does_not() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();

        bucket.insert(1, 100, &cmp);
        bucket.remove(&1, &100, &cmp);

        assert!(bucket.is_occupied(0));
        assert!(!bucket.is_readable(0));
    }

    #[test]
    fn test_roundtrip() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();
        bucket.insert(1, 100, &cmp);
        bucket.insert(2, 200, &cmp);

        let mut buf = [0u8; HashTableBucketPage::<i32, i32, 4>::ENCODED_SIZE];
        bucket.write_to(&mut buf);

        let recovered = HashTableBucketPage::<i32, i32, 4>::from_bytes(&buf);
        assert_eq!(recovered.get_value(&1, &cmp), vec![100]);
        assert_eq!(recovered.get_value(&2, &cmp), vec![200]);
        assert_eq!(recovered.num_readable(), 2);
    }

    #[test]
    fn test_roundtrip_preserves_tombstones() {
        let mut bucket = HashTableBucketPage::<i32, i32, 4>::new();
        let cmp = DefaultComparator::<i32>::new();
        bucket.insert(1, 100, &cmp);
        bucket.remove(&1, &100, &cmp);

        let mut buf = [0u8; HashTableBucketPage::<i32, i32, 4>::ENCODED_SIZE];
        bucket.write_to(&mut buf);

        let recovered = HashTableBucketPage::<i32, i32, 4>::from_bytes(&buf);
        assert!(recovered.is_occupied(0));
        assert!(!recovered.is_readable(0));
    }
}
