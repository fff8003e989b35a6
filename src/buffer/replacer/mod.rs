//! Eviction policy implementations (replacers).
//!
//! A replacer tracks which frames are currently eligible for eviction and
//! picks a victim among them. The buffer pool depends only on the
//! [`Replacer`] trait, not on any one policy, so the eviction strategy can
//! be swapped at runtime (see `BufferPoolManager::with_replacer`).
//!
//! Implementations:
//! - [`LruReplacer`] - Least Recently Used (the default policy)
//! - [`FifoReplacer`] - Simple FIFO, kept as a second reference policy

mod fifo;
mod lru;

pub use fifo::FifoReplacer;
pub use lru::LruReplacer;

use crate::common::FrameId;

/// Capability for selecting which frame to evict next.
///
/// A replacer only tracks *evictable* frames — frames with pin count zero.
/// The buffer pool is responsible for calling `pin`/`unpin` to keep this
/// set in sync with actual pin counts.
pub trait Replacer: Send {
    /// Remove and return the next victim frame, or `None` if no frame is
    /// currently evictable.
    fn victim(&mut self) -> Option<FrameId>;

    /// Mark `frame_id` as no longer evictable (e.g. it was just pinned).
    /// A no-op if the frame isn't currently tracked.
    fn pin(&mut self, frame_id: FrameId);

    /// Mark `frame_id` as evictable (its pin count reached zero).
    /// A no-op if the frame is already tracked.
    fn unpin(&mut self, frame_id: FrameId);

    /// Number of frames currently evictable.
    fn size(&self) -> usize;
}
