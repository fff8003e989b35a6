//! Configuration constants for InterchangeDB.

/// Size of a page in bytes (4KB).
///
/// This value is chosen to match:
/// - OS page size on most systems (4096 bytes)
/// - Common database page sizes (PostgreSQL uses 8KB, but 4KB is also standard)
/// - BusTub's page size
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 = 4,294,967,296 pages
/// - Max database size: 4,294,967,296 × 4KB = 16TB
///
/// # Alignment
/// Pages are aligned to 4096 bytes for efficient Direct I/O (O_DIRECT).
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages with u32 PageId.
pub const MAX_PAGES: u64 = (u32::MAX as u64) + 1;

/// Maximum theoretical database size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;

/// Maximum global/local depth for the extendible hash table directory.
///
/// At depth 9 the directory holds `2^9 = 512` slots, which is also
/// `DIRECTORY_ARRAY_SIZE`. A directory is never allowed to grow past this.
pub const MAX_DIRECTORY_DEPTH: u32 = 9;

/// Number of slots in a fully-expanded hash table directory page
/// (`2^MAX_DIRECTORY_DEPTH`).
pub const DIRECTORY_ARRAY_SIZE: usize = 512;
