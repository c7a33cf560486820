//! `Block` decoding: the one entity whose wire key order is genuinely not
//! fixed, so unlike every other L2 decoder this one runs in two passes —
//! first a cheap scan recording where each key's value starts, then a
//! second pass that decodes `preamble` first (it's needed to build the
//! `DecodeContext` the rest of the block decodes with).

use log::{debug, error};

use crate::cbor::Reader;
use crate::error::{CborError, CdnsError};
use crate::schema::{DecodeContext, Schema, TableIndex};
use crate::types::{Block, BlockPreamble, BlockStatistics, Preamble};

use super::address_event::decode_address_event_count;
use super::query::decode_query;
use super::skip_unknown_key;
use super::tables::decode_block_tables;

pub(crate) fn decode_block<'a>(r: &mut Reader<'a>, preamble: &Preamble) -> Result<Block<'a>, CdnsError> {
    let schema = Schema::from_version_major(preamble.version_major);
    let spans = r.scan_map::<CdnsError>()?;

    let find = |wanted: i64| spans.iter().find(|(k, _)| *k == wanted).map(|(_, pos)| *pos);

    let (earliest_time_sec, earliest_time_raw_sub, block_parameter_index) = match find(0) {
        Some(pos) => decode_block_preamble_raw(&mut r.reader_at(pos), schema)?,
        None => {
            error!("block has no preamble (key 0)");
            return Err(CdnsError::Truncated);
        }
    };

    let ticks_per_second = preamble
        .block_parameters
        .ticks_per_second(block_parameter_index.get());
    let ctx = DecodeContext::new(schema, ticks_per_second);

    let earliest_time_usec = match schema {
        Schema::Rfc8618 => ctx.ticks_to_microseconds(earliest_time_raw_sub),
        Schema::Draft04 => earliest_time_raw_sub,
    };
    let block_preamble = BlockPreamble {
        earliest_time_sec,
        earliest_time_usec,
        block_parameter_index,
    };
    let block_start_us = (earliest_time_sec as u64) * 1_000_000 + earliest_time_usec as u64;

    let statistics = match find(1) {
        Some(pos) => decode_block_statistics(&mut r.reader_at(pos), schema)?,
        None => BlockStatistics::default(),
    };

    let tables = match find(2) {
        Some(pos) => decode_block_tables(&mut r.reader_at(pos), &ctx)?,
        None => Default::default(),
    };

    let queries = match find(3) {
        Some(pos) => r.reader_at(pos).ctx_array_parse(&ctx, decode_query)?,
        None => Vec::new(),
    };

    let address_events = match find(4) {
        Some(pos) => r
            .reader_at(pos)
            .ctx_array_parse(&ctx, decode_address_event_count)?,
        None => Vec::new(),
    };

    debug!(
        "block decoded: {} queries, {} address events, start_us={block_start_us}",
        queries.len(),
        address_events.len()
    );

    Ok(Block {
        preamble: block_preamble,
        statistics,
        tables,
        queries,
        address_events,
        block_start_us,
    })
}

/// Returns `(earliest_time_sec, raw_sub_field, block_parameter_index)`.
/// RFC form reads the timestamp at key 0 and `block_parameter_index` at
/// key 1; draft-04 reads the (only) timestamp at key 1 and never encodes a
/// `block_parameter_index` (there's exactly one parameter set in that
/// schema, so it defaults to absent/index 0). The timestamp array must have
/// exactly two elements, matching `cdns_block_preamble::parse_time_stamp`/
/// `cdns_block_preamble_old::parse_map_item`'s case 1 — either one is a
/// malformed value, not a field to default.
fn decode_block_preamble_raw(
    r: &mut Reader<'_>,
    schema: Schema,
) -> Result<(i64, i64, TableIndex), CdnsError> {
    let mut sec = 0i64;
    let mut sub = 0i64;
    let mut block_parameter_index = TableIndex::default();

    let timestamp_key = match schema {
        Schema::Rfc8618 => 0,
        Schema::Draft04 => 1,
    };

    r.map_parse(|r, key| -> Result<(), CdnsError> {
        if key == timestamp_key {
            let parts = r.array_parse(Reader::parse_int)?;
            match parts.as_slice() {
                [s, u] => {
                    sec = *s;
                    sub = *u;
                }
                _ => return Err(CborError::Malformed.into()),
            }
        } else if key == 1 && schema == Schema::Rfc8618 {
            block_parameter_index = TableIndex::from_wire(r.parse_int()?);
        } else {
            skip_unknown_key(r, key, "BlockPreamble")?;
        }
        Ok(())
    })?;

    Ok((sec, sub, block_parameter_index))
}

/// Key 4/5 coalescing: RFC key 4 is `discarded_opcode` and key 5 is
/// unused; draft-04 key 4 is `malformed_items` and key 5
/// (`partially_malformed_items`) is folded into the same field by summing.
fn decode_block_statistics(r: &mut Reader<'_>, schema: Schema) -> Result<BlockStatistics, CdnsError> {
    let mut s = BlockStatistics::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => s.processed_messages = Some(r.parse_int()?),
            1 => s.qr_data_items = Some(r.parse_int()?),
            2 => s.unmatched_queries = Some(r.parse_int()?),
            3 => s.unmatched_responses = Some(r.parse_int()?),
            4 => match schema {
                Schema::Rfc8618 => s.discarded_opcode = Some(r.parse_int()?),
                Schema::Draft04 => s.malformed_items = Some(r.parse_int()?),
            },
            5 => match schema {
                Schema::Rfc8618 => skip_unknown_key(r, key, "BlockStatistics")?,
                Schema::Draft04 => {
                    let partially_malformed = r.parse_int()?;
                    s.malformed_items =
                        Some(s.malformed_items.unwrap_or(0) + partially_malformed);
                }
            },
            _ => skip_unknown_key(r, key, "BlockStatistics")?,
        }
        Ok(())
    })?;
    Ok(s)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::BlockParameters;

    fn empty_preamble(version_major: i64) -> Preamble {
        Preamble {
            version_major,
            version_minor: 0,
            version_private: 0,
            block_parameters: BlockParameters::Rfc(Vec::new()),
            legacy_generator_id: None,
            legacy_host_id: None,
        }
    }

    #[test]
    fn block_requires_preamble() {
        let buf = [0xa0]; // {}
        let mut r = Reader::new(&buf);
        let preamble = empty_preamble(1);
        let err = decode_block(&mut r, &preamble).unwrap_err();
        assert_eq!(err, CdnsError::Truncated);
    }

    #[test]
    fn block_start_us_combines_sec_and_usec() {
        // {0: {0: [2, 500000]}} -- block preamble key0 timestamp [2,500000]
        // at 1e6 ticks/sec (identity normalization).
        let buf = [
            0xa1, 0x00, 0xa1, 0x00, 0x82, 0x02, 0x1a, 0x00, 0x07, 0xa1, 0x20,
        ];
        let mut r = Reader::new(&buf);
        let preamble = empty_preamble(1);
        let block = decode_block(&mut r, &preamble).unwrap();
        assert_eq!(block.preamble.earliest_time_sec, 2);
        assert_eq!(block.block_start_us, 2_000_000 + 500_000);
    }

    #[test]
    fn block_rejects_one_element_timestamp() {
        // {0: {0: [2]}} -- a timestamp array missing its usec half is
        // malformed, not defaulted.
        let buf = [0xa1, 0x00, 0xa1, 0x00, 0x81, 0x02];
        let mut r = Reader::new(&buf);
        let preamble = empty_preamble(1);
        let err = decode_block(&mut r, &preamble).unwrap_err();
        assert_eq!(err, CdnsError::Cbor(CborError::Malformed));
    }

    #[test]
    fn block_rejects_three_element_timestamp() {
        // {0: {0: [2, 500000, 0]}} -- an extra third element is just as
        // malformed as a missing one.
        let buf = [
            0xa1, 0x00, 0xa1, 0x00, 0x83, 0x02, 0x1a, 0x00, 0x07, 0xa1, 0x20, 0x00,
        ];
        let mut r = Reader::new(&buf);
        let preamble = empty_preamble(1);
        let err = decode_block(&mut r, &preamble).unwrap_err();
        assert_eq!(err, CdnsError::Cbor(CborError::Malformed));
    }
}
