//! `BlockTables`: the eight dedup arrays a block's queries reference by
//! 1-based index.

use log::debug;

use crate::cbor::Reader;
use crate::error::{CborError, CdnsError};
use crate::schema::{DecodeContext, TableIndex};
use crate::types::{BlockTables, ClassId, QuestionRR, ResourceRecord};

use super::signature::decode_query_signature;
use super::skip_unknown_key;

pub(crate) fn decode_block_tables<'a>(
    r: &mut Reader<'a>,
    ctx: &DecodeContext,
) -> Result<BlockTables<'a>, CdnsError> {
    let mut t = BlockTables::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => t.addresses = r.array_parse(Reader::read_bytes)?,
            1 => t.class_ids = r.array_parse(decode_class_id)?,
            2 => t.name_rdata = r.array_parse(Reader::read_bytes)?,
            3 => t.q_sigs = r.ctx_array_parse(ctx, decode_query_signature)?,
            4 => t.question_list = r.array_parse(decode_index_list)?,
            5 => t.qrr = r.array_parse(decode_question_rr)?,
            6 => t.rr_list = r.array_parse(decode_index_list)?,
            7 => t.rrs = r.array_parse(decode_resource_record)?,
            _ => skip_unknown_key(r, key, "BlockTables")?,
        }
        Ok(())
    })?;
    debug!(
        "tables: {} addresses, {} class_ids, {} q_sigs, {} qrr, {} rrs",
        t.addresses.len(),
        t.class_ids.len(),
        t.q_sigs.len(),
        t.qrr.len(),
        t.rrs.len()
    );
    Ok(t)
}

/// `class_ids` is the one table with a strict key rule: any key outside
/// `{0, 1}` is `IllegalValue`, not a skip (DESIGN.md).
fn decode_class_id(r: &mut Reader<'_>) -> Result<ClassId, CdnsError> {
    let mut c = ClassId::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => c.rr_type = r.parse_int()?,
            1 => c.rr_class = r.parse_int()?,
            _ => return Err(CborError::IllegalValue.into()),
        }
        Ok(())
    })?;
    Ok(c)
}

fn decode_question_rr(r: &mut Reader<'_>) -> Result<QuestionRR, CdnsError> {
    let mut q = QuestionRR::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => q.name_index = TableIndex::from_wire(r.parse_int()?),
            1 => q.classtype_index = TableIndex::from_wire(r.parse_int()?),
            _ => skip_unknown_key(r, key, "Question")?,
        }
        Ok(())
    })?;
    Ok(q)
}

fn decode_resource_record(r: &mut Reader<'_>) -> Result<ResourceRecord, CdnsError> {
    let mut rr = ResourceRecord::default();
    r.map_parse(|r, key| -> Result<(), CdnsError> {
        match key {
            0 => rr.name_index = TableIndex::from_wire(r.parse_int()?),
            1 => rr.classtype_index = TableIndex::from_wire(r.parse_int()?),
            2 => rr.ttl = Some(r.parse_int()?),
            3 => rr.rdata_index = TableIndex::from_wire(r.parse_int()?),
            _ => skip_unknown_key(r, key, "RR")?,
        }
        Ok(())
    })?;
    Ok(rr)
}

/// `question_list`/`rr_list` entries: a plain array of integer indices into
/// `qrr`/`rr_list` respectively.
fn decode_index_list(r: &mut Reader<'_>) -> Result<Vec<i64>, CdnsError> {
    r.array_parse(Reader::parse_int)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn class_id_rejects_unknown_key() {
        // {0: 1, 2: 3} — key 2 is outside {0,1}.
        let buf = [0xa2, 0x00, 0x01, 0x02, 0x03];
        let mut r = Reader::new(&buf);
        let err = decode_class_id(&mut r).unwrap_err();
        assert_eq!(err, CdnsError::Cbor(CborError::IllegalValue));
    }

    #[test]
    fn empty_tables() {
        let buf = [0xa0];
        let mut r = Reader::new(&buf);
        let ctx = DecodeContext::new(Schema::Rfc8618, 1_000_000);
        let t = decode_block_tables(&mut r, &ctx).unwrap();
        assert!(t.addresses.is_empty());
        assert!(t.q_sigs.is_empty());
    }
}
