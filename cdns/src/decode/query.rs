//! `Query` decoding: the busiest field-remap site in the format. RFC and
//! draft-04 share most fields but disagree on key numbering from
//! `client_address_index` onward, and only the RFC form's `time_offset_usec`
//! goes through tick normalization — `delay_usec` never does, in either
//! schema version. draft-04 additionally splits each time field into a
//! whole-microsecond key and an optional higher-precision picosecond key
//! that overrides it.

use crate::cbor::Reader;
use crate::error::CdnsError;
use crate::schema::{DecodeContext, Schema, TableIndex};
use crate::types::{QrExtended, Query, ResponseProcessingData};

use super::skip_unknown_key;

pub(crate) fn decode_query(r: &mut Reader<'_>, ctx: &DecodeContext) -> Result<Query, CdnsError> {
    match ctx.schema {
        Schema::Rfc8618 => decode_rfc(r, ctx),
        Schema::Draft04 => decode_old(r, ctx),
    }
}

fn decode_rfc(r: &mut Reader<'_>, ctx: &DecodeContext) -> Result<Query, CdnsError> {
    let mut q = Query::default();
    let mut time_offset_raw = 0i64;
    let mut delay_raw = 0i64;

    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => time_offset_raw = r.parse_int64()?,
            1 => q.client_address_index = TableIndex::from_wire(r.parse_int()?),
            2 => q.client_port = Some(r.parse_int()?),
            3 => q.transaction_id = Some(r.parse_int()?),
            4 => q.query_signature_index = TableIndex::from_wire(r.parse_int()?),
            5 => q.client_hoplimit = Some(r.parse_int()?),
            6 => delay_raw = r.parse_int64()?,
            7 => q.query_name_index = TableIndex::from_wire(r.parse_int()?),
            8 => q.query_size = Some(r.parse_int()?),
            9 => q.response_size = Some(r.parse_int()?),
            10 => q.response_processing_data = Some(decode_response_processing_data(r)?),
            11 => q.query_extended = decode_qr_extended(r)?,
            12 => q.response_extended = decode_qr_extended(r)?,
            _ => skip_unknown_key(r, key, "Query")?,
        }
        Ok(())
    })?;

    // Only time_offset_usec gets the tick normalization pass; delay_useconds
    // is left exactly as read off the wire (original_source/lib/cdns.cpp,
    // cdns_query::parse — the post-cbor_map_parse step touches one field).
    q.time_offset_usec = ctx.ticks_to_microseconds(time_offset_raw);
    q.delay_usec = Some(delay_raw);
    Ok(q)
}

/// draft-04 keys every time field as a whole-microsecond field followed by
/// an optional higher-precision picosecond field: when the picosecond field
/// is present it *replaces* the microsecond value (divided down to
/// microseconds) rather than adding to it, and neither field goes through
/// `ticks_per_second` normalization — draft-04 writers already wrote these
/// in microseconds (see `original_source/lib/cdns.cpp`'s
/// `parse_map_item_old`, and contrast with `cdns_query::parse`'s `if
/// (!is_old_version())` guard around the RFC-only normalization step).
fn decode_old(r: &mut Reader<'_>, _ctx: &DecodeContext) -> Result<Query, CdnsError> {
    let mut q = Query::default();
    let mut time_offset_usec = 0i64;
    let mut time_offset_psec = None;
    let mut delay_usec = 0i64;
    let mut delay_psec = None;

    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => time_offset_usec = r.parse_int64()?,
            1 => time_offset_psec = Some(r.parse_int64()?),
            2 => q.client_address_index = TableIndex::from_wire(r.parse_int()?),
            3 => q.client_port = Some(r.parse_int()?),
            4 => q.transaction_id = Some(r.parse_int()?),
            5 => q.query_signature_index = TableIndex::from_wire(r.parse_int()?),
            6 => q.client_hoplimit = Some(r.parse_int()?),
            7 => delay_usec = r.parse_int64()?,
            8 => delay_psec = Some(r.parse_int64()?),
            9 => q.query_name_index = TableIndex::from_wire(r.parse_int()?),
            10 => q.query_size = Some(r.parse_int()?),
            11 => q.response_size = Some(r.parse_int()?),
            12 => q.query_extended = decode_qr_extended(r)?,
            13 => q.response_extended = decode_qr_extended(r)?,
            _ => skip_unknown_key(r, key, "Query")?,
        }
        Ok(())
    })?;

    q.time_offset_usec = time_offset_psec.map_or(time_offset_usec, |t| t / 1_000_000);
    q.delay_usec = Some(delay_psec.map_or(delay_usec, |t| t / 1_000_000));
    Ok(q)
}

fn decode_qr_extended(r: &mut Reader<'_>) -> Result<QrExtended, CdnsError> {
    let mut e = QrExtended::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => e.question_index = TableIndex::from_wire(r.parse_int()?),
            1 => e.answer_index = TableIndex::from_wire(r.parse_int()?),
            2 => e.authority_index = TableIndex::from_wire(r.parse_int()?),
            3 => e.additional_index = TableIndex::from_wire(r.parse_int()?),
            _ => skip_unknown_key(r, key, "QRExtended")?,
        }
        Ok(())
    })?;
    Ok(e)
}

fn decode_response_processing_data(r: &mut Reader<'_>) -> Result<ResponseProcessingData, CdnsError> {
    let mut d = ResponseProcessingData::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => d.bailiwick_index = TableIndex::from_wire(r.parse_int()?),
            1 => d.processing_flags = Some(r.parse_int()?),
            _ => skip_unknown_key(r, key, "ResponseProcessingData")?,
        }
        Ok(())
    })?;
    d.is_present = true;
    Ok(d)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn rfc_query_normalizes_time_offset() {
        // {0: 2} at 2 ticks/second -> 1_000_000 microseconds.
        let buf = [0xa1, 0x00, 0x02];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Rfc8618, 2);
        let q = decode_query(&mut r, &ctx).unwrap();
        assert_eq!(q.time_offset_usec, 1_000_000);
    }

    #[test]
    fn old_query_key_remap() {
        // {2: 9} -> client_address_index raw 9 (1-based -> Some(8)).
        let buf = [0xa1, 0x02, 0x09];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Draft04, 1_000_000);
        let q = decode_query(&mut r, &ctx).unwrap();
        assert_eq!(q.client_address_index.get(), Some(8));
    }

    #[test]
    fn rfc_query_leaves_delay_unnormalized() {
        // {6: 9} at 2 ticks/second: delay_useconds passes through untouched,
        // unlike time_offset_usec above.
        let buf = [0xa1, 0x06, 0x09];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Rfc8618, 2);
        let q = decode_query(&mut r, &ctx).unwrap();
        assert_eq!(q.delay_usec, Some(9));
    }

    #[test]
    fn old_query_time_offset_ignores_ticks_per_second() {
        // {0: 9} with a non-1e6 ticks_per_second in the context: draft-04's
        // whole-microsecond field is never tick-scaled.
        let buf = [0xa1, 0x00, 0x09];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Draft04, 2);
        let q = decode_query(&mut r, &ctx).unwrap();
        assert_eq!(q.time_offset_usec, 9);
    }

    #[test]
    fn old_query_psec_field_replaces_usec_field() {
        // {0: 9, 1: 2_000_000}: the psec field (divided by 1e6) overrides
        // the usec field rather than adding to it.
        let buf = [0xa2, 0x00, 0x09, 0x01, 0x1a, 0x00, 0x1e, 0x84, 0x80];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Draft04, 1_000_000);
        let q = decode_query(&mut r, &ctx).unwrap();
        assert_eq!(q.time_offset_usec, 2);
    }
}
