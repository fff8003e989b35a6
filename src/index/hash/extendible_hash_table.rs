//! Extendible hash table: the container tying directory and bucket pages
//! to a buffer pool.
//!
//! # Latching discipline
//! `table_latch` guards structural changes to the directory (growth,
//! bucket split/merge). `get_value`, and the common non-splitting path
//! of `insert`/`remove`, take it shared — ordinary traffic against
//! different buckets never blocks itself on this latch. Only
//! `split_insert`/`try_merge` escalate to the exclusive lock, and only
//! for the structural change itself. Page content is latched per-page
//! by the buffer pool's own `fetch_page_read`/`fetch_page_write` (each
//! frame wraps its `Page` in an `RwLock`).
//!
//! This mirrors the coarser of the two designs the original container
//! supports — a single table-wide latch rather than latch-crabbing down
//! the directory — traded for simplicity since this crate has no query
//! planner driving highly concurrent index traffic.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::buffer::BufferPoolManager;
use crate::common::{PageId, Result};
use crate::index::hash::{
    FixedSizeEncode, HashFunction, HashTableBucketPage, HashTableDirectoryPage, KeyComparator,
};

/// An on-disk extendible hash table over keys `K` mapping to values `V`.
///
/// `CAP` is the maximum number of entries one bucket page holds; callers
/// choose it to fit `K`/`V` within one page (`HashTableBucketPage`'s
/// `ENCODED_SIZE` must not exceed the page size).
pub struct ExtendibleHashTable<K, V, const CAP: usize, C, H> {
    bpm: Arc<BufferPoolManager>,
    directory_page_id: PageId,
    comparator: C,
    hash_function: H,
    table_latch: RwLock<()>,
    _marker: PhantomData<(K, V)>,
}

impl<K, V, const CAP: usize, C, H> ExtendibleHashTable<K, V, CAP, C, H>
where
    K: FixedSizeEncode + Clone + Send + Sync,
    V: FixedSizeEncode + Clone + PartialEq + Send + Sync,
    C: KeyComparator<K> + Send + Sync,
    H: HashFunction<K> + Send + Sync,
{
    /// Create a new, empty hash table: one directory page at global
    /// depth 0 pointing at one empty bucket page.
    pub fn new(bpm: Arc<BufferPoolManager>, comparator: C, hash_function: H) -> Result<Self> {
        let bucket_guard = bpm.new_page()?;
        let bucket_page_id = bucket_guard.page_id();
        drop(bucket_guard); // already zeroed, which `HashTableBucketPage::from_bytes` reads as empty

        let mut dir_guard = bpm.new_page()?;
        let directory_page_id = dir_guard.page_id();
        let dir = HashTableDirectoryPage::new(directory_page_id, bucket_page_id);
        dir.write_to(dir_guard.as_mut_slice());

        Ok(Self {
            bpm,
            directory_page_id,
            comparator,
            hash_function,
            table_latch: RwLock::new(()),
            _marker: PhantomData,
        })
    }

    /// The page id of the directory root. Exists so callers can reopen
    /// an existing table after a restart without re-running `new`.
    pub fn directory_page_id(&self) -> PageId {
        self.directory_page_id
    }

    /// All values stored under a key comparing equal to `key`.
    pub fn get_value(&self, key: &K) -> Result<Vec<V>> {
        let _table_guard = self.table_latch.read();

        let dir_guard = self.bpm.fetch_page_read(self.directory_page_id)?;
        let dir = HashTableDirectoryPage::from_bytes(dir_guard.as_slice());
        drop(dir_guard);

        let bucket_page_id = self.bucket_for(&dir, key);

        let bucket_guard = self.bpm.fetch_page_read(bucket_page_id)?;
        let bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(bucket_guard.as_slice());

        Ok(bucket.get_value(key, &self.comparator))
    }

    /// Insert `(key, value)`, splitting buckets (and growing the
    /// directory if needed) as many times as required to make room.
    ///
    /// Returns `false` if the exact pair already exists.
    pub fn insert(&self, key: K, value: V) -> Result<bool> {
        loop {
            let _table_guard = self.table_latch.read();

            let dir_guard = self.bpm.fetch_page_read(self.directory_page_id)?;
            let dir = HashTableDirectoryPage::from_bytes(dir_guard.as_slice());
            drop(dir_guard);

            let bucket_idx = dir.hash_to_bucket_index(self.hash_function.hash(&key));
            let bucket_page_id = dir.bucket_page_id(bucket_idx);

            let mut bucket_guard = self.bpm.fetch_page_write(bucket_page_id)?;
            let mut bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(bucket_guard.as_slice());

            if bucket.get_value(&key, &self.comparator).contains(&value) {
                // Exact (key, value) duplicate: unconditionally rejected,
                // even if the bucket happens to be full.
                return Ok(false);
            }

            if bucket.insert(key.clone(), value.clone(), &self.comparator) {
                bucket.write_to(bucket_guard.as_mut_slice());
                return Ok(true);
            }

            // Bucket is full and holds no duplicate: drop both locks
            // before splitting, which re-acquires the table latch
            // exclusively.
            drop(bucket_guard);
            drop(_table_guard);
            self.split_insert(bucket_idx)?;
            // Retry: the bucket this key maps to may have changed.
        }
    }

    /// Remove the entry matching both `key` and `value` exactly.
    pub fn remove(&self, key: &K, value: &V) -> Result<bool> {
        let (removed, bucket_idx) = {
            let _table_guard = self.table_latch.read();

            let dir_guard = self.bpm.fetch_page_read(self.directory_page_id)?;
            let dir = HashTableDirectoryPage::from_bytes(dir_guard.as_slice());
            drop(dir_guard);

            let bucket_idx = dir.hash_to_bucket_index(self.hash_function.hash(key));
            let bucket_page_id = dir.bucket_page_id(bucket_idx);

            let mut bucket_guard = self.bpm.fetch_page_write(bucket_page_id)?;
            let mut bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(bucket_guard.as_slice());

            let removed = bucket.remove(key, value, &self.comparator);
            if removed {
                bucket.write_to(bucket_guard.as_mut_slice());
            }
            (removed, bucket_idx)
        };
        // Table latch (and the bucket's write latch) are dropped before
        // try_merge, which re-acquires the table latch exclusively.

        if removed {
            self.try_merge(bucket_idx)?;
        }

        Ok(removed)
    }

    /// Current global depth of the directory.
    pub fn get_global_depth(&self) -> Result<u32> {
        let _table_guard = self.table_latch.read();
        let dir_guard = self.bpm.fetch_page_read(self.directory_page_id)?;
        Ok(HashTableDirectoryPage::from_bytes(dir_guard.as_slice()).global_depth())
    }

    /// Debug-only consistency check of the directory structure.
    pub fn verify_integrity(&self) -> Result<()> {
        let _table_guard = self.table_latch.read();
        let dir_guard = self.bpm.fetch_page_read(self.directory_page_id)?;
        HashTableDirectoryPage::from_bytes(dir_guard.as_slice()).verify_integrity();
        Ok(())
    }

    fn bucket_for(&self, dir: &HashTableDirectoryPage, key: &K) -> PageId {
        let bucket_idx = dir.hash_to_bucket_index(self.hash_function.hash(key));
        dir.bucket_page_id(bucket_idx)
    }

    /// Split the bucket at directory slot `bucket_idx`, growing the
    /// directory first if every slot pointing at it is already at the
    /// directory's global depth. Redistributes entries between the old
    /// bucket and a freshly allocated sibling by the newly-significant
    /// hash bit.
    fn split_insert(&self, bucket_idx: usize) -> Result<()> {
        let _table_guard = self.table_latch.write();

        let mut dir_guard = self.bpm.fetch_page_write(self.directory_page_id)?;
        let mut dir = HashTableDirectoryPage::from_bytes(dir_guard.as_slice());

        let old_bucket_page_id = dir.bucket_page_id(bucket_idx);
        {
            // Another thread may have already split this bucket (or grown
            // the directory) between the caller's shared lookup and this
            // exclusive lock; re-check before splitting again.
            let bucket_guard = self.bpm.fetch_page_read(old_bucket_page_id)?;
            let bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(bucket_guard.as_slice());
            if !bucket.is_full() {
                return Ok(());
            }
        }

        let local_depth = dir.local_depth(bucket_idx);
        if local_depth as u32 == dir.global_depth() {
            dir.incr_global_depth();
        }
        let new_local_depth = local_depth + 1;
        let split_bit = 1u32 << local_depth;

        let new_bucket_guard = self.bpm.new_page()?;
        let new_bucket_page_id = new_bucket_guard.page_id();

        let size = dir.size();
        for idx in 0..size {
            if dir.bucket_page_id(idx) == old_bucket_page_id {
                dir.set_local_depth(idx, new_local_depth);
                if idx as u32 & split_bit != 0 {
                    dir.set_bucket_page_id(idx, new_bucket_page_id);
                }
            }
        }

        dir.write_to(dir_guard.as_mut_slice());
        drop(dir_guard);
        drop(new_bucket_guard);

        let mut old_bucket_guard = self.bpm.fetch_page_write(old_bucket_page_id)?;
        let mut old_bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(old_bucket_guard.as_slice());
        let mut new_bucket_guard = self.bpm.fetch_page_write(new_bucket_page_id)?;
        let mut new_bucket = HashTableBucketPage::<K, V, CAP>::new();

        let entries = old_bucket.all_entries();
        old_bucket.clear();
        for (k, v) in entries {
            if self.hash_function.hash(&k) & split_bit != 0 {
                new_bucket.insert(k, v, &self.comparator);
            } else {
                old_bucket.insert(k, v, &self.comparator);
            }
        }

        old_bucket.write_to(old_bucket_guard.as_mut_slice());
        new_bucket.write_to(new_bucket_guard.as_mut_slice());

        Ok(())
    }

    /// Merge the (now possibly empty) bucket at `bucket_idx` with its
    /// buddy if the buddy is at the same local depth, one level only —
    /// this does not cascade into further merges even if the buddy is
    /// also empty.
    fn try_merge(&self, bucket_idx: usize) -> Result<()> {
        let _table_guard = self.table_latch.write();

        let mut dir_guard = self.bpm.fetch_page_write(self.directory_page_id)?;
        let mut dir = HashTableDirectoryPage::from_bytes(dir_guard.as_slice());

        let local_depth = dir.local_depth(bucket_idx);
        if local_depth == 0 {
            return Ok(());
        }

        let split_bit = 1usize << (local_depth - 1);
        let buddy_idx = bucket_idx ^ split_bit;
        if buddy_idx >= dir.size() || dir.local_depth(buddy_idx) != local_depth {
            return Ok(());
        }

        let bucket_page_id = dir.bucket_page_id(bucket_idx);
        let buddy_page_id = dir.bucket_page_id(buddy_idx);
        if bucket_page_id == buddy_page_id {
            return Ok(()); // already merged by a prior remove
        }

        {
            let bucket_guard = self.bpm.fetch_page_read(bucket_page_id)?;
            let bucket = HashTableBucketPage::<K, V, CAP>::from_bytes(bucket_guard.as_slice());
            if !bucket.is_empty() {
                return Ok(());
            }
        }

        let size = dir.size();
        for idx in 0..size {
            let pid = dir.bucket_page_id(idx);
            if pid == bucket_page_id || pid == buddy_page_id {
                dir.set_bucket_page_id(idx, buddy_page_id);
                dir.set_local_depth(idx, local_depth - 1);
            }
        }

        if dir.can_shrink() {
            dir.decr_global_depth();
        }

        dir.write_to(dir_guard.as_mut_slice());
        drop(dir_guard);

        self.bpm.delete_page(bucket_page_id)?;

        Ok(())
    }
}
