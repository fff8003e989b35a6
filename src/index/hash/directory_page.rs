//! Hash table directory page.
//!
//! The directory is the root of the extendible hash table: it maps the
//! low `global_depth` bits of a key's hash to the bucket page holding
//! that key. It lives entirely within one [`Page`](crate::storage::page::Page)
//! and is (de)serialized the same way [`PageHeader`](crate::storage::page::PageHeader)
//! is — an owned struct reconstructed from raw bytes on fetch, written
//! back before the owning guard drops.
//!
//! # Layout (fits within one 4KB page)
//! ```text
//! Offset  Size    Field
//! ------  ----    -----
//! 0       4       page_id (u32, little-endian)
//! 4       4       global_depth (u32, little-endian)
//! 8       512     local_depths (one byte per slot; depths never exceed 9)
//! 520     2048    bucket_page_ids (u32 each, little-endian)
//! ```

use crate::common::config::DIRECTORY_ARRAY_SIZE;
use crate::common::PageId;

const OFFSET_PAGE_ID: usize = 0;
const OFFSET_GLOBAL_DEPTH: usize = 4;
const OFFSET_LOCAL_DEPTHS: usize = 8;
const OFFSET_BUCKET_PAGE_IDS: usize = OFFSET_LOCAL_DEPTHS + DIRECTORY_ARRAY_SIZE;
const ENCODED_SIZE: usize = OFFSET_BUCKET_PAGE_IDS + DIRECTORY_ARRAY_SIZE * 4;

/// Owned, in-memory view of a directory page.
#[derive(Debug, Clone)]
pub struct HashTableDirectoryPage {
    page_id: PageId,
    global_depth: u32,
    local_depths: [u8; DIRECTORY_ARRAY_SIZE],
    bucket_page_ids: [u32; DIRECTORY_ARRAY_SIZE],
}

impl HashTableDirectoryPage {
    /// Build a fresh directory for a brand-new hash table: global depth 0,
    /// a single slot pointing at `initial_bucket_page_id`.
    pub fn new(page_id: PageId, initial_bucket_page_id: PageId) -> Self {
        let mut bucket_page_ids = [PageId::INVALID.0; DIRECTORY_ARRAY_SIZE];
        bucket_page_ids[0] = initial_bucket_page_id.0;

        Self {
            page_id,
            global_depth: 0,
            local_depths: [0; DIRECTORY_ARRAY_SIZE],
            bucket_page_ids,
        }
    }

    /// Reconstruct a directory page from raw page bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < ENCODED_SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(
            data.len() >= ENCODED_SIZE,
            "buffer too small for HashTableDirectoryPage"
        );

        let page_id = u32::from_le_bytes(data[OFFSET_PAGE_ID..OFFSET_PAGE_ID + 4].try_into().unwrap());
        let global_depth = u32::from_le_bytes(
            data[OFFSET_GLOBAL_DEPTH..OFFSET_GLOBAL_DEPTH + 4]
                .try_into()
                .unwrap(),
        );

        let mut local_depths = [0u8; DIRECTORY_ARRAY_SIZE];
        local_depths.copy_from_slice(&data[OFFSET_LOCAL_DEPTHS..OFFSET_LOCAL_DEPTHS + DIRECTORY_ARRAY_SIZE]);

        let mut bucket_page_ids = [0u32; DIRECTORY_ARRAY_SIZE];
        for (i, slot) in bucket_page_ids.iter_mut().enumerate() {
            let offset = OFFSET_BUCKET_PAGE_IDS + i * 4;
            *slot = u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap());
        }

        Self {
            page_id: PageId::new(page_id),
            global_depth,
            local_depths,
            bucket_page_ids,
        }
    }

    /// Serialize this directory back into raw page bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < ENCODED_SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(
            data.len() >= ENCODED_SIZE,
            "buffer too small for HashTableDirectoryPage"
        );

        data[OFFSET_PAGE_ID..OFFSET_PAGE_ID + 4].copy_from_slice(&self.page_id.0.to_le_bytes());
        data[OFFSET_GLOBAL_DEPTH..OFFSET_GLOBAL_DEPTH + 4]
            .copy_from_slice(&self.global_depth.to_le_bytes());
        data[OFFSET_LOCAL_DEPTHS..OFFSET_LOCAL_DEPTHS + DIRECTORY_ARRAY_SIZE]
            .copy_from_slice(&self.local_depths);

        for (i, &bucket_page_id) in self.bucket_page_ids.iter().enumerate() {
            let offset = OFFSET_BUCKET_PAGE_IDS + i * 4;
            data[offset..offset + 4].copy_from_slice(&bucket_page_id.to_le_bytes());
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    /// Number of directory slots currently in use: `2^global_depth`.
    pub fn size(&self) -> usize {
        1usize << self.global_depth
    }

    /// Mask selecting the low `global_depth` bits of a hash.
    pub fn global_depth_mask(&self) -> u32 {
        self.size() as u32 - 1
    }

    /// Mask selecting the low `local_depths[bucket_idx]` bits of a hash.
    pub fn local_depth_mask(&self, bucket_idx: usize) -> u32 {
        (1u32 << self.local_depths[bucket_idx]) - 1
    }

    pub fn local_depth(&self, bucket_idx: usize) -> u8 {
        self.local_depths[bucket_idx]
    }

    pub fn set_local_depth(&mut self, bucket_idx: usize, depth: u8) {
        self.local_depths[bucket_idx] = depth;
    }

    pub fn bucket_page_id(&self, bucket_idx: usize) -> PageId {
        PageId::new(self.bucket_page_ids[bucket_idx])
    }

    pub fn set_bucket_page_id(&mut self, bucket_idx: usize, page_id: PageId) {
        self.bucket_page_ids[bucket_idx] = page_id.0;
    }

    /// Index of `key`'s hash into this directory.
    pub fn hash_to_bucket_index(&self, hash: u32) -> usize {
        (hash & self.global_depth_mask()) as usize
    }

    /// Whether every slot's local depth is below the global depth — if
    /// so, the directory can shrink (halve) without losing information.
    pub fn can_shrink(&self) -> bool {
        self.local_depths[..self.size()]
            .iter()
            .all(|&d| (d as u32) < self.global_depth)
    }

    /// Double the directory, copying each slot `i` into the
    /// newly-exposed slot `i + old_size` so every slot still resolves to
    /// a valid bucket until the caller redirects the ones that split.
    pub fn incr_global_depth(&mut self) {
        assert!(
            self.global_depth < crate::common::config::MAX_DIRECTORY_DEPTH,
            "directory already at maximum depth"
        );
        let old_size = self.size();
        self.global_depth += 1;
        for i in 0..old_size {
            self.bucket_page_ids[i + old_size] = self.bucket_page_ids[i];
            self.local_depths[i + old_size] = self.local_depths[i];
        }
    }

    pub fn decr_global_depth(&mut self) {
        assert!(self.global_depth > 0, "global depth already zero");
        self.global_depth -= 1;
    }

    /// Debug-only consistency checker: every slot's local depth is at
    /// most the global depth, and slots sharing a bucket id agree on
    /// local depth and on their low bits.
    pub fn verify_integrity(&self) {
        let size = self.size();
        for i in 0..size {
            let local_depth = self.local_depths[i];
            assert!(
                (local_depth as u32) <= self.global_depth,
                "slot {i} local depth {local_depth} exceeds global depth {}",
                self.global_depth
            );

            let bucket_page_id = self.bucket_page_ids[i];
            let mask = self.local_depth_mask(i);
            for j in (i + 1)..size {
                if self.bucket_page_ids[j] == bucket_page_id {
                    assert_eq!(
                        self.local_depths[j], local_depth,
                        "slots {i} and {j} share bucket {bucket_page_id} but disagree on local depth"
                    );
                    assert_eq!(
                        i as u32 & mask,
                        j as u32 & mask,
                        "slots {i} and {j} share bucket {bucket_page_id} but disagree on low bits"
                    );
                }
            }
        }
    }
}
