//! Mutation Tests
//!
//! Tests verify:
//! - Column upsert within a mutation
//! - Merge rules between buffered and incoming writes
//! - Heap size estimation
//! - Cell validation while scanning
//! - Wire form

use region_memstore::mutation::{Cell, CELL_OVERHEAD, LATEST_TIMESTAMP, MUTATION_OVERHEAD};
use region_memstore::{MemStoreError, Mutation, MutationKind};

// =============================================================================
// Helper Functions
// =============================================================================

fn person(row: &'static str, name: &'static str, age: &'static str) -> Mutation {
    Mutation::put(row)
        .with_column("cf", "name", name)
        .with_column("cf", "age", age)
}

fn values(m: &Mutation) -> Vec<(Vec<u8>, Vec<u8>)> {
    m.cells()
        .map(|c| (c.qualifier().to_vec(), c.value().to_vec()))
        .collect()
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_new_put_is_empty() {
    let m = Mutation::put("row1");
    assert_eq!(m.row(), b"row1");
    assert_eq!(m.kind(), MutationKind::Put);
    assert_eq!(m.timestamp(), LATEST_TIMESTAMP);
    assert!(m.is_empty());
}

#[test]
fn test_add_column_replaces_same_column() {
    let mut m = Mutation::put("row1");
    m.add_column("cf", "age", "30");
    m.add_column("cf", "age", "31");

    assert_eq!(m.len(), 1);
    assert_eq!(m.cell(b"cf", b"age").unwrap().value(), b"31");
}

#[test]
fn test_same_qualifier_different_family_are_distinct() {
    let m = Mutation::put("row1")
        .with_column("cf1", "q", "a")
        .with_column("cf2", "q", "b");

    assert_eq!(m.len(), 2);
    assert_eq!(m.cell(b"cf1", b"q").unwrap().value(), b"a");
    assert_eq!(m.cell(b"cf2", b"q").unwrap().value(), b"b");
    assert!(m.cell(b"cf3", b"q").is_none());
    assert!(m.cell(b"cf1", b"r").is_none());
}

#[test]
fn test_cells_are_column_ordered() {
    let m = Mutation::put("row1")
        .with_column("cf", "job", "x")
        .with_column("cf", "age", "30")
        .with_column("cf", "name", "a");

    let qualifiers: Vec<&[u8]> = m.cells().map(Cell::qualifier).collect();
    assert_eq!(qualifiers, vec![&b"age"[..], &b"job"[..], &b"name"[..]]);
}

#[test]
fn test_cells_carry_row_and_timestamp() {
    let mut m = Mutation::new("row1", MutationKind::Put, 42);
    m.add_column("cf", "age", "30");
    m.add_column_at("cf", "name", 7, "a");

    let age = m.cell(b"cf", b"age").unwrap();
    assert_eq!(age.row(), b"row1");
    assert_eq!(age.timestamp(), 42);
    assert_eq!(m.cell(b"cf", b"name").unwrap().timestamp(), 7);
}

// =============================================================================
// Merge Tests
// =============================================================================

#[test]
fn test_merge_put_overwrites_and_preserves() {
    let mut buffered = person("row1", "alice", "30");
    let incoming = Mutation::put("row1")
        .with_column("cf", "age", "31")
        .with_column("cf", "job", "engineer");

    buffered.merge(incoming).unwrap();

    assert_eq!(
        values(&buffered),
        vec![
            (b"age".to_vec(), b"31".to_vec()),
            (b"job".to_vec(), b"engineer".to_vec()),
            (b"name".to_vec(), b"alice".to_vec()),
        ]
    );
}

#[test]
fn test_merge_delete_onto_put_fails() {
    let mut buffered = person("row1", "alice", "30");
    let err = buffered.merge(Mutation::delete("row1")).unwrap_err();

    assert!(matches!(
        err,
        MemStoreError::UnsupportedMerge {
            existing: MutationKind::Put,
            incoming: MutationKind::Delete,
        }
    ));
    // buffered mutation untouched
    assert_eq!(buffered.len(), 2);
}

#[test]
fn test_merge_put_onto_delete_fails() {
    let mut buffered = Mutation::delete("row1");
    let err = buffered.merge(person("row1", "bob", "40")).unwrap_err();

    assert!(matches!(
        err,
        MemStoreError::UnsupportedMerge {
            existing: MutationKind::Delete,
            incoming: MutationKind::Put,
        }
    ));
    assert!(buffered.is_empty());
}

// =============================================================================
// Heap Size Tests
// =============================================================================

#[test]
fn test_heap_size_of_empty_mutation() {
    let m = Mutation::put("row1");
    assert_eq!(m.heap_size(), MUTATION_OVERHEAD + 4);
}

#[test]
fn test_heap_size_counts_cells() {
    let m = Mutation::put("r").with_column("cf", "age", "30");

    let cell = CELL_OVERHEAD + (1 + 2 + 3 + 2) as u64;
    assert_eq!(m.cell(b"cf", b"age").unwrap().heap_size(), cell);
    assert_eq!(m.heap_size(), MUTATION_OVERHEAD + 1 + cell);
}

#[test]
fn test_heap_size_grows_with_value() {
    let short = Mutation::put("r").with_column("cf", "q", "v");
    let long = Mutation::put("r").with_column("cf", "q", "a much longer value");
    assert!(long.heap_size() > short.heap_size());
}

// =============================================================================
// Cell Scanner Tests
// =============================================================================

#[test]
fn test_cell_scanner_yields_all_valid_cells() {
    let m = person("row1", "alice", "30");
    let cells: Vec<_> = m.cell_scanner().collect::<Result<_, _>>().unwrap();
    assert_eq!(cells.len(), 2);
}

#[test]
fn test_cell_scanner_rejects_missing_family() {
    let m = Mutation::put("row1").with_column("", "age", "30");

    let first = m.cell_scanner().next().unwrap();
    assert!(matches!(first, Err(MemStoreError::MalformedCell(_))));
}

// =============================================================================
// Wire Form Tests
// =============================================================================

#[test]
fn test_encode_decode_preserves_mutation() {
    let m = person("row1", "alice", "30");
    let decoded = Mutation::decode(&m.encode().unwrap()).unwrap();
    assert_eq!(decoded, m);
    assert_eq!(decoded.heap_size(), m.heap_size());
}

#[test]
fn test_decode_garbage_fails() {
    let err = Mutation::decode(&[0xff, 0x01]).unwrap_err();
    assert!(matches!(err, MemStoreError::Serialization(_)));
}
