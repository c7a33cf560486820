//! Preamble and block-parameter decoding: version detection and the
//! storage/collection parameter sets that drive tick normalization and
//! schema dispatch for everything that follows.

use log::debug;

use crate::cbor::Reader;
use crate::error::CdnsError;
use crate::types::{
    BlockParameter, BlockParameterOld, BlockParameters, CollectionParameters, Preamble,
    StorageHints, StorageParameter,
};

use super::skip_unknown_key;

/// Wire keys 0-5 of the outer Preamble map. Key 3's shape (array vs single
/// map) depends on `version_major`, already decoded by the time key 3 is
/// reached — guaranteed by ascending wire key order.
pub(crate) fn decode_preamble(r: &mut Reader<'_>) -> Result<Preamble, CdnsError> {
    let mut version_major = 0i64;
    let mut version_minor = 0i64;
    let mut version_private = 0i64;
    let mut block_parameters = None;
    let mut legacy_generator_id = None;
    let mut legacy_host_id = None;

    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => version_major = r.parse_int()?,
            1 => version_minor = r.parse_int()?,
            2 => version_private = r.parse_int()?,
            3 => {
                block_parameters = Some(if version_major == 0 {
                    BlockParameters::Old(decode_block_parameter_old(r)?)
                } else {
                    BlockParameters::Rfc(r.array_parse(decode_block_parameter)?)
                });
            }
            4 => legacy_generator_id = Some(r.read_text()?.into_owned()),
            5 => legacy_host_id = Some(r.read_text()?.into_owned()),
            _ => skip_unknown_key(r, key, "Preamble")?,
        }
        Ok(())
    })?;

    debug!("preamble: version {version_major}.{version_minor}.{version_private}");

    // Testable property 9: block_parameters absent still parses, with the
    // default ticks_per_second (1e6) kicking in downstream.
    let block_parameters = block_parameters.unwrap_or(BlockParameters::Rfc(Vec::new()));

    Ok(Preamble {
        version_major,
        version_minor,
        version_private,
        block_parameters,
        legacy_generator_id,
        legacy_host_id,
    })
}

fn decode_block_parameter(r: &mut Reader<'_>) -> Result<BlockParameter, CdnsError> {
    let mut storage = None;
    let mut collection = None;
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => storage = Some(decode_storage_parameter(r)?),
            1 => collection = Some(decode_collection_parameters(r)?),
            _ => skip_unknown_key(r, key, "BlockParameter")?,
        }
        Ok(())
    })?;
    Ok(BlockParameter {
        storage: storage.unwrap_or_default(),
        collection: collection.unwrap_or_default(),
    })
}

fn decode_storage_parameter(r: &mut Reader<'_>) -> Result<StorageParameter, CdnsError> {
    let mut p = StorageParameter::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => p.ticks_per_second = r.parse_int64()?,
            1 => p.max_block_items = Some(r.parse_int64()?),
            2 => p.storage_hints = decode_storage_hints(r)?,
            3 => p.opcodes = r.array_parse(Reader::parse_int)?,
            4 => p.rr_types = r.array_parse(Reader::parse_int)?,
            5 => p.storage_flags = Some(r.parse_int()?),
            6 => p.client_address_prefix_ipv4 = Some(r.parse_int()?),
            7 => p.client_address_prefix_ipv6 = Some(r.parse_int()?),
            8 => p.server_address_prefix_ipv4 = Some(r.parse_int()?),
            9 => p.server_address_prefix_ipv6 = Some(r.parse_int()?),
            10 => p.sampling_method = Some(r.read_bytes()?.into_owned()),
            11 => p.anonymization_method = Some(r.read_bytes()?.into_owned()),
            _ => skip_unknown_key(r, key, "StorageParameter")?,
        }
        Ok(())
    })?;
    if p.ticks_per_second <= 0 {
        p.ticks_per_second = 1_000_000;
    }
    Ok(p)
}

fn decode_storage_hints(r: &mut Reader<'_>) -> Result<StorageHints, CdnsError> {
    let mut h = StorageHints::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => h.query_response_hints = r.parse_int()?,
            1 => h.query_response_signature_hints = r.parse_int()?,
            2 => h.rr_hints = r.parse_int()?,
            3 => h.other_data_hints = r.parse_int()?,
            _ => skip_unknown_key(r, key, "StorageHints")?,
        }
        Ok(())
    })?;
    Ok(h)
}

/// `query_options`/`response_options` are kept as fields on
/// [`CollectionParameters`] (the format documents them), but no wire key
/// ever populates them: the original reader's key table jumps straight
/// from `filter` (7) to `generator_id`/`host_id` (8/9), leaving those two
/// fields permanently at their default. Preserved rather than "corrected",
/// per DESIGN.md — this reader follows what bytes actually land where, not
/// what the format's field list implies should.
fn decode_collection_parameters(r: &mut Reader<'_>) -> Result<CollectionParameters, CdnsError> {
    let mut c = CollectionParameters::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => c.query_timeout = Some(r.parse_int()?),
            1 => c.skew_timeout = Some(r.parse_int()?),
            2 => c.snaplen = Some(r.parse_int()?),
            3 => c.promisc = Some(r.parse_boolean()?),
            4 => c.interfaces = r.array_parse(|r| Ok(r.read_bytes()?.into_owned()))?,
            5 => c.server_addresses = r.array_parse(|r| Ok(r.read_bytes()?.into_owned()))?,
            6 => c.vlan_id = r.array_parse(|r| Ok(r.read_bytes()?.into_owned()))?,
            7 => c.filter = Some(r.read_bytes()?.into_owned()),
            8 => c.generator_id = Some(r.read_text()?.into_owned()),
            9 => c.host_id = Some(r.read_text()?.into_owned()),
            _ => skip_unknown_key(r, key, "CollectionParameters")?,
        }
        Ok(())
    })?;
    Ok(c)
}

/// The draft-04 flat map. Key 11 (`vlan_id` in RFC language) is
/// deliberately absent here: draft-04 writers never encoded it (DESIGN.md).
fn decode_block_parameter_old(r: &mut Reader<'_>) -> Result<BlockParameterOld, CdnsError> {
    let mut p = BlockParameterOld::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => p.query_timeout = Some(r.parse_int()?),
            1 => p.skew_timeout = Some(r.parse_int()?),
            2 => p.snaplen = Some(r.parse_int()?),
            // An integer on the wire (cdns.h's cdnsBlockParameterOld::promisc
            // is int64_t, parsed via cbor_parse_int64), not a CBOR boolean.
            3 => p.promisc = Some(r.parse_int64()?),
            4 => p.interfaces = r.array_parse(|r| Ok(r.read_bytes()?.into_owned()))?,
            5 => p.server_addresses = r.array_parse(|r| Ok(r.read_bytes()?.into_owned()))?,
            6 => p.filter = Some(r.read_bytes()?.into_owned()),
            7 => p.query_options = Some(r.parse_int()?),
            8 => p.response_options = Some(r.parse_int()?),
            // Unlike the RFC form's `rr_types` (an int array), draft-04
            // writers encoded these as text (`cbor_text` in the original).
            9 => p.accept_rr_types = r.array_parse(|r| Ok(r.read_text()?.into_owned()))?,
            10 => p.ignore_rr_types = r.array_parse(|r| Ok(r.read_text()?.into_owned()))?,
            12 => p.max_block_qr_items = Some(r.parse_int()?),
            // Also an integer on the wire (cdns.h's collect_malformed is
            // int64_t, parsed via cbor_parse_int64), not a CBOR boolean.
            13 => p.collect_malformed = Some(r.parse_int64()?),
            _ => skip_unknown_key(r, key, "BlockParameterOld")?,
        }
        Ok(())
    })?;
    Ok(p)
}

#[cfg(test)]
mod test {
    use super::*;

    /// `[0xa1, 0x00, 0x00]`: a one-entry map `{0: 0}` — `version_major = 0`
    /// with no block_parameters key, draft-04 schema, nothing else set.
    #[test]
    fn preamble_minimal_draft04() {
        let buf = [0xa1, 0x00, 0x00];
        let mut r = Reader::new(&buf);
        let preamble = decode_preamble(&mut r).unwrap();
        assert_eq!(preamble.version_major, 0);
        assert!(matches!(preamble.block_parameters, BlockParameters::Rfc(ref v) if v.is_empty()));
    }

    #[test]
    fn storage_parameter_defaults_ticks() {
        // {} empty map: ticks_per_second should fall back to 1_000_000.
        let buf = [0xa0];
        let mut r = Reader::new(&buf);
        let p = decode_storage_parameter(&mut r).unwrap();
        assert_eq!(p.ticks_per_second, 1_000_000);
    }
}
