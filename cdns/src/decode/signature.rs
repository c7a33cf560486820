//! `QuerySignature` decoding: the one entity whose wire key layout shifts
//! wholesale between schema versions, because draft-04 never had a
//! `qr_type` key and everything after it shifts down by one.

use crate::cbor::Reader;
use crate::error::CdnsError;
use crate::schema::{DecodeContext, Schema, TableIndex};
use crate::types::QuerySignature;

use super::skip_unknown_key;

pub(crate) fn decode_query_signature(
    r: &mut Reader<'_>,
    ctx: &DecodeContext,
) -> Result<QuerySignature, CdnsError> {
    match ctx.schema {
        Schema::Rfc8618 => decode_rfc(r),
        Schema::Draft04 => decode_old(r),
    }
}

/// RFC 8618 layout: keys `0..=16`, `qr_type` present at key 3. Note the
/// count fields are all query-side (`qd`/`an`/`ns`/`ar`); the format does
/// not carry separate response counts in the signature.
fn decode_rfc(r: &mut Reader<'_>) -> Result<QuerySignature, CdnsError> {
    let mut s = QuerySignature::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => s.server_address_index = TableIndex::from_wire(r.parse_int()?),
            1 => s.server_port = Some(r.parse_int()?),
            2 => s.qr_transport_flags = r.parse_int()?,
            3 => s.qr_type = Some(r.parse_int()?),
            4 => s.qr_sig_flags = r.parse_int()?,
            5 => s.query_opcode = Some(r.parse_int()?),
            6 => s.qr_dns_flags = r.parse_int()?,
            7 => s.query_rcode = Some(r.parse_int()?),
            8 => s.query_classtype_index = TableIndex::from_wire(r.parse_int()?),
            9 => s.query_qdcount = Some(r.parse_int()?),
            10 => s.query_ancount = Some(r.parse_int()?),
            11 => s.query_nscount = Some(r.parse_int()?),
            12 => s.query_arcount = Some(r.parse_int()?),
            13 => s.edns_version = Some(r.parse_int()?),
            14 => s.udp_buf_size = Some(r.parse_int()?),
            15 => s.opt_rdata_index = TableIndex::from_wire(r.parse_int()?),
            16 => s.response_rcode = Some(r.parse_int()?),
            _ => skip_unknown_key(r, key, "QuerySignature")?,
        }
        Ok(())
    })?;
    Ok(s)
}

/// draft-04 layout: keys `0..=15`, no `qr_type`; every field from
/// `qr_sig_flags` on is shifted down by one relative to the RFC map. Also
/// note the count fields swap order relative to the RFC map (`ar` before
/// `ns` rather than after) — preserved as written by the original reader.
fn decode_old(r: &mut Reader<'_>) -> Result<QuerySignature, CdnsError> {
    let mut s = QuerySignature::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => s.server_address_index = TableIndex::from_wire(r.parse_int()?),
            1 => s.server_port = Some(r.parse_int()?),
            2 => s.qr_transport_flags = r.parse_int()?,
            3 => s.qr_sig_flags = r.parse_int()?,
            4 => s.query_opcode = Some(r.parse_int()?),
            5 => s.qr_dns_flags = r.parse_int()?,
            6 => s.query_rcode = Some(r.parse_int()?),
            7 => s.query_classtype_index = TableIndex::from_wire(r.parse_int()?),
            8 => s.query_qdcount = Some(r.parse_int()?),
            9 => s.query_ancount = Some(r.parse_int()?),
            10 => s.query_arcount = Some(r.parse_int()?),
            11 => s.query_nscount = Some(r.parse_int()?),
            12 => s.edns_version = Some(r.parse_int()?),
            13 => s.udp_buf_size = Some(r.parse_int()?),
            14 => s.opt_rdata_index = TableIndex::from_wire(r.parse_int()?),
            15 => s.response_rcode = Some(r.parse_int()?),
            _ => skip_unknown_key(r, key, "QuerySignature")?,
        }
        Ok(())
    })?;
    s.qr_type = None;
    Ok(s)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rfc_signature_has_qr_type() {
        // {3: 7} — qr_type = 7 at RFC key 3.
        let buf = [0xa1, 0x03, 0x07];
        let mut r = Reader::new(&buf);
        let sig = decode_rfc(&mut r).unwrap();
        assert_eq!(sig.qr_type, Some(7));
    }

    #[test]
    fn old_signature_shifts_sig_flags_to_key_3() {
        // {3: 5} — qr_sig_flags = 5 at draft-04 key 3 (RFC key 4).
        let buf = [0xa1, 0x03, 0x05];
        let mut r = Reader::new(&buf);
        let sig = decode_old(&mut r).unwrap();
        assert_eq!(sig.qr_sig_flags, 5);
        assert_eq!(sig.qr_type, None);
    }
}
