//! `File`: the L3 driver. Opens a C-DNS file, parses its preamble once,
//! and hands back one `Block` at a time.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use log::{debug, info};

use crate::cbor::{Reader, END_MARK};
use crate::decode::{decode_block, decode_preamble};
use crate::dump;
use crate::error::CdnsError;
use crate::flags;
use crate::schema::Schema;
use crate::types::{Block, Preamble};

/// How many items the outer `[FileType, Preamble, BlockList]` array holds,
/// and whether the block list itself is definite- or indefinite-length.
enum BlockListLength {
    Definite(usize),
    Indefinite,
}

pub struct File {
    buf: Vec<u8>,
    preamble: Preamble,
    schema: Schema,
    block_list_len: BlockListLength,
    /// Position in `buf` the next `open_block` call should resume from.
    pos: usize,
    nb_blocks_read: usize,
    first_block_start_us: Option<u64>,
    finished: bool,
}

impl File {
    /// Reads the whole file into memory (growing an initial 128 KiB buffer
    /// by quadrupling, same as a naive dynamic-array read), then parses
    /// the outer array header, the FileType atom, and the Preamble map.
    /// Parsing stops there — blocks are decoded lazily by `open_block`.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let buf = read_whole_file(path.as_ref())?;
        Self::parse(buf)
    }

    /// Same contract as [`File::open`], but over bytes already in memory —
    /// the entry point the fuzz target and some tests use to skip the
    /// temp-file round trip, mirroring `dns::Response::from_bytes` taking a
    /// byte slice rather than a path.
    pub fn parse(buf: Vec<u8>) -> io::Result<Self> {
        let (preamble, block_list_len, pos) = {
            let mut r = Reader::new(&buf);
            let header = r.header().map_err(CdnsError::from)?;
            if !matches!(header.major, crate::cbor::Major::Array) {
                return Err(CdnsError::from(crate::error::CborError::Malformed).into());
            }

            crate::decode::skip_file_type(&mut r).map_err(io::Error::from)?;
            let preamble = decode_preamble(&mut r).map_err(io::Error::from)?;

            let list_header = r.header().map_err(CdnsError::from)?;
            if !matches!(list_header.major, crate::cbor::Major::Array) {
                return Err(CdnsError::from(crate::error::CborError::Malformed).into());
            }
            let block_list_len = if list_header.value == crate::cbor::END_OF_ARRAY {
                BlockListLength::Indefinite
            } else {
                BlockListLength::Definite(list_header.value as usize)
            };

            (preamble, block_list_len, r.position())
        };

        let schema = Schema::from_version_major(preamble.version_major);
        info!(
            "opened C-DNS file: version_major={}, schema={:?}",
            preamble.version_major, schema
        );

        Ok(Self {
            buf,
            preamble,
            schema,
            block_list_len,
            pos,
            nb_blocks_read: 0,
            first_block_start_us: None,
            finished: false,
        })
    }

    /// Decodes the next block, or returns `Ok(None)` once the block list is
    /// exhausted. A malformed block is terminal: the driver does not
    /// attempt to resynchronize past it (matching the original reader's
    /// "rewind no further" tolerance policy).
    pub fn open_block(&mut self) -> Result<Option<Block<'_>>, CdnsError> {
        if self.finished || self.at_block_list_end() {
            self.finished = true;
            return Ok(None);
        }

        let mut r = Reader::new(&self.buf);
        r.set_position(self.pos);

        let block = match decode_block(&mut r, &self.preamble) {
            Ok(block) => block,
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };

        self.pos = r.position();
        self.nb_blocks_read += 1;
        if self.first_block_start_us.is_none() {
            self.first_block_start_us = Some(block.block_start_us);
        }
        debug!("open_block: block #{} decoded", self.nb_blocks_read);
        Ok(Some(block))
    }

    fn at_block_list_end(&self) -> bool {
        match self.block_list_len {
            BlockListLength::Definite(n) => self.nb_blocks_read >= n,
            BlockListLength::Indefinite => self.buf.get(self.pos) == Some(&END_MARK),
        }
    }

    pub fn is_first_block(&self) -> bool {
        self.nb_blocks_read <= 1
    }

    pub fn is_last_block(&self) -> bool {
        self.at_block_list_end()
    }

    pub fn is_old_version(&self) -> bool {
        self.schema.is_old()
    }

    pub fn index_offset(&self) -> i64 {
        1
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    /// Latched once, the first block's `block_start_us`, exposed alongside
    /// `File` for callers that want a trace-wide time origin without
    /// holding onto the first `Block` value itself.
    pub fn first_block_start_us(&self) -> Option<u64> {
        self.first_block_start_us
    }

    pub fn get_ticks_per_second(&self, block_parameter_index: Option<usize>) -> i64 {
        self.preamble.block_parameters.ticks_per_second(block_parameter_index)
    }

    pub fn ticks_to_microseconds(&self, ticks: i64, block_parameter_index: Option<usize>) -> i64 {
        let ticks_per_second = self.get_ticks_per_second(block_parameter_index);
        crate::schema::DecodeContext::new(self.schema, ticks_per_second).ticks_to_microseconds(ticks)
    }

    pub fn get_dns_flags(&self, q_dns_flags: u16, is_response: bool) -> u16 {
        flags::get_dns_flags(q_dns_flags, is_response)
    }

    pub fn get_edns_flags(&self, q_dns_flags: u16) -> u16 {
        flags::get_edns_flags(q_dns_flags)
    }

    /// Second, independent pass over the same buffer producing an
    /// annotated textual dump (see `dump`), written to `out`.
    pub fn dump_to_writer<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        dump::dump(&self.buf, out)
    }

    pub fn dump<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut out = fs::File::create(path)?;
        self.dump_to_writer(&mut out)
    }
}

fn read_whole_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut f = fs::File::open(path)?;
    let mut buf = Vec::with_capacity(128 * 1024);
    let mut chunk = vec![0u8; 128 * 1024];
    loop {
        let n = f.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if n == chunk.len() {
            chunk.resize(chunk.len() * 4, 0);
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write as _;

    fn write_temp(bytes: &[u8]) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("cdns-test-{}.cdns", std::process::id()));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn open_empty_block_list() {
        // [ "C-DNS", {0: 1}, [] ]
        let buf: Vec<u8> = vec![
            0x83, // array, 3 items
            0x65, b'C', b'-', b'D', b'N', b'S', // text "C-DNS"
            0xa1, 0x00, 0x01, // {0: 1} -- version_major = 1
            0x80, // empty array
        ];
        let path = write_temp(&buf);
        let mut file = File::open(&path).unwrap();
        assert!(!file.is_old_version());
        assert!(file.open_block().unwrap().is_none());
        let _ = fs::remove_file(&path);
    }
}
