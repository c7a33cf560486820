//! Exercises the full `File::open` -> `open_block` loop against hand-built
//! CBOR buffers, the same way `dns/tests/wire_parsing_tests.rs` hand-builds
//! wire buffers instead of reading a fixture file (no binary C-DNS fixtures
//! are available to this workspace).

use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use cdns::File;

/// Minimal definite-length CBOR encoder: everything this test suite builds
/// fits the "major type + count/argument, recurse" shape, with no need for
/// indefinite-length containers (those are covered at the `cbor` module's
/// own unit-test level).
fn encode_arg(major: u8, n: u64) -> Vec<u8> {
    let mut out = Vec::new();
    if n < 24 {
        out.push((major << 5) | (n as u8));
    } else if n <= 0xFF {
        out.push((major << 5) | 24);
        out.push(n as u8);
    } else if n <= 0xFFFF {
        out.push((major << 5) | 25);
        out.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xFFFF_FFFF {
        out.push((major << 5) | 26);
        out.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        out.push((major << 5) | 27);
        out.extend_from_slice(&n.to_be_bytes());
    }
    out
}

fn cbor_uint(n: u64) -> Vec<u8> {
    encode_arg(0, n)
}

fn cbor_bytes(b: &[u8]) -> Vec<u8> {
    let mut out = encode_arg(2, b.len() as u64);
    out.extend_from_slice(b);
    out
}

fn cbor_text(s: &str) -> Vec<u8> {
    let mut out = encode_arg(3, s.len() as u64);
    out.extend_from_slice(s.as_bytes());
    out
}

fn cbor_array(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = encode_arg(4, items.len() as u64);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn cbor_map(pairs: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut out = encode_arg(5, pairs.len() as u64);
    for (key, value) in pairs {
        out.extend_from_slice(&cbor_uint(*key));
        out.extend_from_slice(value);
    }
    out
}

fn write_temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("cdns-file-driver-test-{name}-{}.cdns", std::process::id()));
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(bytes).unwrap();
    path
}

/// Builds a two-block RFC 8618 file: one non-default `ticks_per_second`,
/// one address table entry, one query referencing it by 1-based index.
fn build_rfc_file() -> Vec<u8> {
    let storage = cbor_map(&[(0, cbor_uint(1_000_000))]);
    let collection = cbor_map(&[]);
    let block_parameter = cbor_map(&[(0, storage), (1, collection)]);
    let preamble = cbor_map(&[
        (0, cbor_uint(1)), // version_major
        (1, cbor_uint(0)), // version_minor
        (2, cbor_uint(0)), // version_private
        (3, cbor_array(&[block_parameter])),
    ]);

    let block_preamble_1 = cbor_map(&[
        (0, cbor_array(&[cbor_uint(1_700_000_000), cbor_uint(500_000)])),
        (1, cbor_uint(1)), // block_parameter_index, 1-based -> index 0
    ]);
    let statistics_1 = cbor_map(&[(0, cbor_uint(1))]); // processed_messages = 1
    let tables_1 = cbor_map(&[(0, cbor_array(&[cbor_bytes(&[127, 0, 0, 1])]))]);
    let query_1 = cbor_map(&[
        (0, cbor_uint(0)),   // time_offset_usec ticks
        (1, cbor_uint(1)),   // client_address_index -> addresses[0]
        (2, cbor_uint(53)),  // client_port
        (3, cbor_uint(0x1234)), // transaction_id
    ]);
    let block_1 = cbor_map(&[
        (0, block_preamble_1),
        (1, statistics_1),
        (2, tables_1),
        (3, cbor_array(&[query_1])),
        (4, cbor_array(&[])),
    ]);

    let block_preamble_2 = cbor_map(&[
        (0, cbor_array(&[cbor_uint(1_700_000_005), cbor_uint(0)])),
        (1, cbor_uint(1)),
    ]);
    let block_2 = cbor_map(&[(0, block_preamble_2)]);

    cbor_array(&[
        cbor_text("C-DNS"),
        preamble,
        cbor_array(&[block_1, block_2]),
    ])
}

#[test]
fn rfc_file_iterates_two_blocks_in_order() {
    let path = write_temp_file("rfc", &build_rfc_file());
    let mut file = File::open(&path).unwrap();
    assert!(!file.is_old_version());

    let block = file.open_block().unwrap().expect("first block");
    assert!(file.is_first_block());
    assert_eq!(block.preamble.earliest_time_sec, 1_700_000_000);
    assert_eq!(block.block_start_us, 1_700_000_000_000_000 + 500_000);
    assert_eq!(block.tables.addresses.len(), 1);
    assert_eq!(block.tables.addresses[0].as_ref(), &[127, 0, 0, 1]);
    assert_eq!(block.queries.len(), 1);
    assert_eq!(block.queries[0].client_address_index.get(), Some(0));
    assert_eq!(block.queries[0].client_port, Some(53));
    drop(block);

    assert_eq!(file.first_block_start_us(), Some(1_700_000_000_000_000 + 500_000));

    let block2 = file.open_block().unwrap().expect("second block");
    assert!(!file.is_first_block());
    assert_eq!(block2.preamble.earliest_time_sec, 1_700_000_005);
    assert!(block2.queries.is_empty());
    drop(block2);

    assert!(file.open_block().unwrap().is_none());
    assert!(file.is_last_block());

    let _ = fs::remove_file(&path);
}

/// draft-04 schema dispatch: the same query-field values land at different
/// wire key numbers, and the decoder must pick the right map based on
/// `version_major` alone.
fn build_draft04_file() -> Vec<u8> {
    let old_params = cbor_map(&[]); // BlockParameterOld, all fields left at default
    let preamble = cbor_map(&[(0, cbor_uint(0)), (3, old_params)]);

    let block_preamble = cbor_map(&[(1, cbor_array(&[cbor_uint(1_600_000_000), cbor_uint(250_000)]))]);
    let query = cbor_map(&[
        (2, cbor_uint(1)), // client_address_index (draft-04 key 2)
        (3, cbor_uint(53)), // client_port (draft-04 key 3)
    ]);
    let tables = cbor_map(&[(0, cbor_array(&[cbor_bytes(&[10, 0, 0, 1])]))]);
    let block = cbor_map(&[
        (0, block_preamble),
        (2, tables),
        (3, cbor_array(&[query])),
    ]);

    cbor_array(&[cbor_text("C-DNS"), preamble, cbor_array(&[block])])
}

#[test]
fn draft04_file_remaps_query_keys() {
    let path = write_temp_file("draft04", &build_draft04_file());
    let mut file = File::open(&path).unwrap();
    assert!(file.is_old_version());

    let block = file.open_block().unwrap().expect("one block");
    assert_eq!(block.preamble.earliest_time_sec, 1_600_000_000);
    // draft-04 timestamps are already microseconds: no tick normalization.
    assert_eq!(block.preamble.earliest_time_usec, 250_000);
    assert_eq!(block.queries.len(), 1);
    assert_eq!(block.queries[0].client_address_index.get(), Some(0));
    assert_eq!(block.queries[0].client_port, Some(53));

    let _ = fs::remove_file(&path);
}

/// An indefinite-length block list (`0xFF`-terminated) is just as legal as
/// a definite-length one, and must iterate to the same end state.
#[test]
fn indefinite_block_list_terminates_on_break() {
    let preamble = cbor_map(&[(0, cbor_uint(1))]);

    let mut bytes = encode_arg(4, 3); // outer array header, 3 items
    bytes.extend_from_slice(&cbor_text("C-DNS"));
    bytes.extend_from_slice(&preamble);
    bytes.push(0x9F); // indefinite-length array
    bytes.push(0xFF); // immediately terminated: empty block list

    let path = write_temp_file("indefinite", &bytes);
    let mut file = File::open(&path).unwrap();
    assert!(file.open_block().unwrap().is_none());
    let _ = fs::remove_file(&path);
}
