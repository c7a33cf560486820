//! L2 schema entities: one decode function per C-DNS map/array entity,
//! dispatching wire key codes to struct fields via `cbor::Reader::{map_parse,
//! array_parse, ctx_array_parse}`.

mod address_event;
mod block;
mod params;
mod query;
mod signature;
mod tables;

pub(crate) use block::decode_block;
pub(crate) use params::decode_preamble;

use log::{trace, warn};

use crate::cbor::Reader;
use crate::error::CdnsError;

/// Item 1 of the outer array: a text atom naming the file type
/// (`"C-DNS"`). Validated loosely — logged and discarded — since nothing
/// downstream keys off its exact spelling.
pub(crate) fn skip_file_type(r: &mut Reader) -> Result<(), CdnsError> {
    let file_type = r.read_text()?;
    trace!("file type atom: {file_type:?}");
    Ok(())
}

/// Shared helper for "unknown key at this map scope": every L2 decoder
/// tolerates unrecognized keys by skipping the value and logging once.
pub(crate) fn skip_unknown_key(r: &mut Reader, key: i64, entity: &str) -> Result<(), CdnsError> {
    warn!("unknown key {key} while decoding {entity}, skipping value");
    r.skip()?;
    Ok(())
}
