//! Parallel (sharded) buffer pool manager.
//!
//! Wraps `N` independent [`BufferPoolManager`] instances, routing every
//! operation by `page_id % N`. Because each shard owns its own locks,
//! operations on pages in different shards never contend with each other.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::buffer::replacer::LruReplacer;
use crate::buffer::{BufferPoolManager, PageReadGuard, PageWriteGuard};
use crate::common::{Error, PageId, Result};
use crate::storage::DiskManager;

/// A buffer pool split across `N` independently-locked instances.
///
/// Each instance mints page ids on its own shard-stepped counter
/// (`id % N == shard_index`), so routing a page id to its owning
/// instance is a single modulo.
pub struct ParallelBufferPoolManager {
    instances: Vec<BufferPoolManager>,
    /// Rotates across shards for `new_page`, so allocation pressure is
    /// spread evenly rather than always hitting shard 0 first.
    next_instance: AtomicUsize,
}

impl ParallelBufferPoolManager {
    /// Create `num_instances` shards, each with `pool_size_per_instance`
    /// frames and its own on-disk file at `<base_path>.<shard_index>`.
    ///
    /// # Panics
    /// Panics if `num_instances` is 0.
    pub fn new<P: AsRef<Path>>(
        num_instances: usize,
        pool_size_per_instance: usize,
        base_path: P,
    ) -> Result<Self> {
        assert!(num_instances > 0, "num_instances must be > 0");

        let mut instances = Vec::with_capacity(num_instances);
        for shard_index in 0..num_instances {
            let shard_path = shard_file_path(base_path.as_ref(), shard_index);
            let dm = DiskManager::open_or_create(&shard_path)?;
            instances.push(BufferPoolManager::new_sharded(
                pool_size_per_instance,
                dm,
                Box::new(LruReplacer::new()),
                shard_index as u32,
                num_instances as u32,
            ));
        }

        Ok(Self {
            instances,
            next_instance: AtomicUsize::new(0),
        })
    }

    /// Number of shard instances.
    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    fn instance_for(&self, page_id: PageId) -> &BufferPoolManager {
        let shard = (page_id.0 as usize) % self.instances.len();
        &self.instances[shard]
    }

    /// Fetch a page for reading, routed to its owning shard.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        self.instance_for(page_id).fetch_page_read(page_id)
    }

    /// Fetch a page for writing, routed to its owning shard.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        self.instance_for(page_id).fetch_page_write(page_id)
    }

    /// Allocate a new page, round-robining across shards. Tries every
    /// shard once before reporting the whole pool exhausted.
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let n = self.instances.len();
        let start = self.next_instance.fetch_add(1, Ordering::Relaxed) % n;

        for offset in 0..n {
            let idx = (start + offset) % n;
            match self.instances[idx].new_page() {
                Ok(guard) => return Ok(guard),
                Err(Error::PoolExhausted) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::PoolExhausted)
    }

    /// Delete a page, routed to its owning shard.
    pub fn delete_page(&self, page_id: PageId) -> Result<()> {
        self.instance_for(page_id).delete_page(page_id)
    }

    /// Unpin a page the caller holds by id, routed to its owning shard.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        self.instance_for(page_id).unpin_page(page_id, is_dirty)
    }

    /// Flush a single page, routed to its owning shard.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        self.instance_for(page_id).flush_page(page_id)
    }

    /// Flush every shard.
    pub fn flush_all_pages(&self) -> Result<()> {
        for instance in &self.instances {
            instance.flush_all_pages()?;
        }
        Ok(())
    }
}

fn shard_file_path(base_path: &Path, shard_index: usize) -> std::path::PathBuf {
    let mut name = base_path.as_os_str().to_owned();
    name.push(format!(".{shard_index}"));
    std::path::PathBuf::from(name)
}
