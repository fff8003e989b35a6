//! Extendible hash table integration tests.
//!
//! Uses a small bucket capacity and the identity hash function so splits
//! and directory growth happen deterministically and on a predictable
//! schedule, the way the underlying container's own reference tests do.

use interchangedb::buffer::BufferPoolManager;
use interchangedb::storage::DiskManager;
use interchangedb::{DefaultComparator, DefaultHashFunction, ExtendibleHashTable, IdentityHashFunction};
use std::sync::Arc;
use tempfile::tempdir;

type SmallTable =
    ExtendibleHashTable<i32, i32, 4, DefaultComparator<i32>, IdentityHashFunction>;

fn create_table(pool_size: usize) -> (SmallTable, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hash.db");
    let dm = DiskManager::create(&path).unwrap();
    let bpm = Arc::new(BufferPoolManager::new(pool_size, dm));
    let table =
        ExtendibleHashTable::new(bpm, DefaultComparator::new(), IdentityHashFunction).unwrap();
    (table, dir)
}

#[test]
fn test_starts_empty() {
    let (table, _dir) = create_table(16);
    assert_eq!(table.get_global_depth().unwrap(), 0);
    assert!(table.get_value(&1).unwrap().is_empty());
}

#[test]
fn test_insert_fills_one_bucket_without_growing() {
    let (table, _dir) = create_table(16);

    for i in 0..4 {
        assert!(table.insert(i, i * 10).unwrap());
    }
    // Four entries exactly fill one bucket of capacity 4; no split needed yet.
    assert_eq!(table.get_global_depth().unwrap(), 0);

    for i in 0..4 {
        assert_eq!(table.get_value(&i).unwrap(), vec![i * 10]);
    }
}

#[test]
fn test_overflow_triggers_split_and_directory_growth() {
    let (table, _dir) = create_table(16);

    for i in 0..4 {
        table.insert(i, i * 10).unwrap();
    }
    assert_eq!(table.get_global_depth().unwrap(), 0);

    // A fifth insert must split the single bucket and grow the directory.
    table.insert(4, 40).unwrap();
    assert!(table.get_global_depth().unwrap() >= 1);

    for i in 0..=4 {
        assert_eq!(table.get_value(&i).unwrap(), vec![i * 10]);
    }
    table.verify_integrity().unwrap();
}

#[test]
fn test_duplicate_pair_rejected_distinct_value_accepted() {
    let (table, _dir) = create_table(16);

    assert!(table.insert(1, 100).unwrap());
    assert!(!table.insert(1, 100).unwrap());
    assert!(table.insert(1, 200).unwrap());

    let mut values = table.get_value(&1).unwrap();
    values.sort();
    assert_eq!(values, vec![100, 200]);
}

#[test]
fn test_remove_then_reinsert() {
    let (table, _dir) = create_table(16);

    table.insert(1, 100).unwrap();
    assert!(table.remove(&1, &100).unwrap());
    assert!(table.get_value(&1).unwrap().is_empty());

    assert!(table.insert(1, 100).unwrap());
    assert_eq!(table.get_value(&1).unwrap(), vec![100]);
}

#[test]
fn test_bucket_empties_after_full_removal_and_merges() {
    let (table, _dir) = create_table(16);

    for i in 0..5 {
        table.insert(i, i * 10).unwrap();
    }
    let depth_after_split = table.get_global_depth().unwrap();
    assert!(depth_after_split >= 1);

    for i in 0..5 {
        table.remove(&i, &(i * 10)).unwrap();
    }

    for i in 0..5 {
        assert!(table.get_value(&i).unwrap().is_empty());
    }
    table.verify_integrity().unwrap();
}

#[test]
fn test_many_keys_with_default_hash_function() {
    type BigTable =
        ExtendibleHashTable<i32, i32, 8, DefaultComparator<i32>, DefaultHashFunction<i32>>;

    let dir = tempdir().unwrap();
    let path = dir.path().join("hash_big.db");
    let dm = DiskManager::create(&path).unwrap();
    let bpm = Arc::new(BufferPoolManager::new(64, dm));
    let table: BigTable =
        ExtendibleHashTable::new(bpm, DefaultComparator::new(), DefaultHashFunction::new()).unwrap();

    for i in 0..200 {
        assert!(table.insert(i, i * 7).unwrap());
    }
    for i in 0..200 {
        assert_eq!(table.get_value(&i).unwrap(), vec![i * 7]);
    }
    table.verify_integrity().unwrap();
}

#[test]
fn test_concurrent_insert_and_lookup() {
    use std::thread;

    let (table, _dir) = create_table(64);
    let table = Arc::new(table);

    let mut handles = vec![];
    for t in 0..4 {
        let table = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for i in 0..16 {
                let key = t * 16 + i;
                table.insert(key, key * 2).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    for key in 0..64 {
        assert_eq!(table.get_value(&key).unwrap(), vec![key * 2]);
    }
    table.verify_integrity().unwrap();
}
