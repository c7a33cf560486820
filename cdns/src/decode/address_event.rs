//! `AddressEventCount` decoding: RFC adds a transport-flags key absent from
//! draft-04, with everything after it shifted down by one.

use crate::cbor::Reader;
use crate::error::CdnsError;
use crate::schema::{DecodeContext, Schema, TableIndex};
use crate::types::AddressEventCount;

use super::skip_unknown_key;

pub(crate) fn decode_address_event_count(
    r: &mut Reader<'_>,
    ctx: &DecodeContext,
) -> Result<AddressEventCount, CdnsError> {
    match ctx.schema {
        Schema::Rfc8618 => decode_rfc(r),
        Schema::Draft04 => decode_old(r),
    }
}

fn decode_rfc(r: &mut Reader<'_>) -> Result<AddressEventCount, CdnsError> {
    let mut a = AddressEventCount::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => a.ae_type = Some(r.parse_int()?),
            1 => a.ae_code = Some(r.parse_int()?),
            2 => a.ae_transport_flags = Some(r.parse_int()?),
            3 => a.ae_address_index = TableIndex::from_wire(r.parse_int()?),
            4 => a.ae_count = Some(r.parse_int()?),
            _ => skip_unknown_key(r, key, "AddressEventCount")?,
        }
        Ok(())
    })?;
    Ok(a)
}

fn decode_old(r: &mut Reader<'_>) -> Result<AddressEventCount, CdnsError> {
    let mut a = AddressEventCount::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => a.ae_type = Some(r.parse_int()?),
            1 => a.ae_code = Some(r.parse_int()?),
            2 => a.ae_address_index = TableIndex::from_wire(r.parse_int()?),
            3 => a.ae_count = Some(r.parse_int()?),
            _ => skip_unknown_key(r, key, "AddressEventCount")?,
        }
        Ok(())
    })?;
    a.ae_transport_flags = None;
    Ok(a)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn old_has_no_transport_flags() {
        // {2: 5} -> draft-04 key 2 is ae_address_index, raw 5 => Some(4).
        let buf = [0xa1, 0x02, 0x05];
        let mut r = Reader::new(&buf);
        let a = decode_old(&mut r).unwrap();
        assert_eq!(a.ae_address_index.get(), Some(4));
        assert_eq!(a.ae_transport_flags, None);
    }
}
