//! Error types for InterchangeDB.

use thiserror::Error as ThisError;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in InterchangeDB.
///
/// This enum represents every error that can occur in the storage engine.
/// By having a single error type, we make error handling consistent
/// across all crates.
#[derive(Debug, ThisError)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist on disk.
    #[error("page {0} not found")]
    PageNotFound(u32),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("buffer pool is exhausted: no evictable frames")]
    PoolExhausted,

    /// The provided page ID is invalid (e.g., exceeds max pages).
    #[error("invalid page ID: {0}")]
    InvalidPageId(u32),

    /// Attempted to delete a page that is still pinned.
    #[error("page {0} is pinned and cannot be deleted")]
    PageBusy(u32),

    /// A bucket split was required but the directory is already at its
    /// maximum depth. Treated as fatal by callers (see `ExtendibleHashTable`).
    #[error("hash table directory overflow: already at maximum depth")]
    DirectoryOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "page 42 not found");

        let err = Error::PoolExhausted;
        assert_eq!(format!("{}", err), "buffer pool is exhausted: no evictable frames");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
