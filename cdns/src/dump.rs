//! L5 pretty-printer: a second, independent pass over the file's bytes
//! that produces an annotated textual form. Unlike the typed decoder in
//! `decode`, this never holds parsed state — it walks the raw CBOR
//! structurally and decorates integer map keys with the field name they'd
//! have at that position: preamble keys, block keys, and a block's `tables`
//! map one level down. Anything below that (queries, query signatures,
//! table contents) falls back to the un-annotated structural dump
//! (`cbor::Reader::to_text`).

use std::io::{self, Write};

use crate::cbor::{Major, Reader, END_OF_ARRAY};
use crate::error::CborError;
use crate::keys;

const MAX_LISTED_BLOCKS: usize = 10;

pub(crate) fn dump<W: Write>(buf: &[u8], out: &mut W) -> io::Result<()> {
    let mut r = Reader::new(buf);
    let mut text = String::new();
    if let Err(err) = dump_body(&mut r, &mut text) {
        text.push_str(&format!("\n;; dump stopped: {err}\n"));
    }
    out.write_all(text.as_bytes())
}

fn dump_body(r: &mut Reader<'_>, out: &mut String) -> Result<(), CborError> {
    let header = r.header()?;
    if header.major != Major::Array {
        return Err(CborError::Malformed);
    }

    out.push_str("[\n");

    let file_type = r.read_text()?;
    out.push_str(&format!("  \"{file_type}\", // file type\n"));

    out.push_str("  ");
    annotated_map(r, out, keys::preamble_key_name, no_nesting)?;
    out.push('\n');

    let list_header = r.header()?;
    if list_header.major != Major::Array {
        return Err(CborError::Malformed);
    }
    out.push_str("  [\n");

    let mut seen = 0usize;
    let mut emit_block = |r: &mut Reader<'_>, out: &mut String| -> Result<(), CborError> {
        seen += 1;
        if seen > MAX_LISTED_BLOCKS {
            r.skip()
        } else {
            out.push_str(&format!("    // block {seen}\n    "));
            annotated_map(r, out, keys::block_key_name, block_nesting)?;
            out.push('\n');
            Ok(())
        }
    };

    if list_header.value == END_OF_ARRAY {
        while !r.at_break() {
            emit_block(r, out)?;
        }
        r.consume_break()?;
    } else {
        let count = usize::try_from(list_header.value).map_err(|_| CborError::Malformed)?;
        for _ in 0..count {
            emit_block(r, out)?;
        }
        if count > MAX_LISTED_BLOCKS {
            out.push_str(&format!("    // ... and {} more blocks\n", count - MAX_LISTED_BLOCKS));
        }
    }

    out.push_str("  ]\n]\n");
    Ok(())
}

/// A key whose value is itself a map this module has a name table for (so
/// far: a block's `tables` key). Returned by a level's `nested_of` callback.
type NestedNames = fn(i64) -> Option<&'static str>;

fn no_nesting(_key: i64) -> Option<NestedNames> {
    None
}

/// Block-scope nesting: key 2 (`tables`) is itself a map whose keys are
/// named by [`keys::block_tables_key_name`]; every other block key renders
/// through the generic structural dump.
fn block_nesting(key: i64) -> Option<NestedNames> {
    match key {
        2 => Some(keys::block_tables_key_name),
        _ => None,
    }
}

/// Reads one map, annotating each integer key with `name_of(key)` (or `?`
/// for a key this level doesn't recognize) and rendering its value. A value
/// whose key `nested_of` maps to a name table is itself rendered as an
/// annotated map (one level, no further nesting); everything else falls
/// back to the generic structural dump.
fn annotated_map(
    r: &mut Reader<'_>,
    out: &mut String,
    name_of: fn(i64) -> Option<&'static str>,
    nested_of: fn(i64) -> Option<NestedNames>,
) -> Result<(), CborError> {
    let header = r.header()?;
    if header.major != Major::Map {
        return Err(CborError::Malformed);
    }

    out.push_str("{\n");

    let mut emit_entry = |r: &mut Reader<'_>, out: &mut String| -> Result<(), CborError> {
        let key = r.parse_int()?;
        let name = name_of(key).unwrap_or("?");
        out.push_str(&format!("    {key} /* {name} */: "));
        match nested_of(key) {
            Some(nested_name_of) => annotated_map(r, out, nested_name_of, no_nesting)?,
            None => r.to_text(out)?,
        }
        out.push_str(",\n");
        Ok(())
    };

    if header.value == END_OF_ARRAY {
        while !r.at_break() {
            emit_entry(r, out)?;
        }
        r.consume_break()?;
    } else {
        let count = usize::try_from(header.value).map_err(|_| CborError::Malformed)?;
        for _ in 0..count {
            emit_entry(r, out)?;
        }
    }

    out.push('}');
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dumps_minimal_file() {
        let buf: Vec<u8> = vec![
            0x83, // array, 3 items
            0x65, b'C', b'-', b'D', b'N', b'S', // "C-DNS"
            0xa1, 0x00, 0x01, // {0: 1}
            0x80, // []
        ];
        let mut out = Vec::new();
        dump(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("C-DNS"));
        assert!(text.contains("version_major"));
    }

    #[test]
    fn annotates_block_tables_key_names() {
        // block map { 2: { 0: [] } } -- tables.addresses = []
        let buf: Vec<u8> = vec![
            0x83, 0x65, b'C', b'-', b'D', b'N', b'S', 0xa1, 0x00, 0x01, 0x81,
            0xa1, 0x02, 0xa1, 0x00, 0x80,
        ];
        let mut out = Vec::new();
        dump(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("/* tables */"));
        assert!(text.contains("/* addresses */"));
    }

    #[test]
    fn truncates_after_ten_blocks() {
        let mut buf: Vec<u8> = vec![0x83, 0x65, b'C', b'-', b'D', b'N', b'S', 0xa1, 0x00, 0x01];
        buf.push(0x8c); // array, 12 items
        for _ in 0..12 {
            buf.push(0xa0); // {} empty block map (malformed as a real block, fine for this dump-only test)
        }
        let mut out = Vec::new();
        dump(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2 more blocks"));
    }
}
