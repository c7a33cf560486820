//! Error types for the CBOR primitive layer and the schema-aware decoder
//! built on top of it.

use std::fmt;

/// Something that went wrong while walking the raw CBOR byte stream.
///
/// This mirrors the three outcomes a CBOR primitive step can have: it
/// advanced the cursor, it hit the end of an indefinite-length container,
/// or the bytes didn't match what was expected at that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CborError {
    /// The wire structure did not match what was expected at this position:
    /// wrong major type, mixed definite/indefinite markers, an impossible
    /// length, or a nested value that itself failed to decode.
    Malformed,

    /// A field whose schema forbids unknown values held one anyway. Used at
    /// exactly one site: a `ClassId` map key outside `{0, 1}`.
    IllegalValue,

    /// Not really an error: an indefinite-length container ended, or the
    /// block list has been fully consumed.
    EndOfArray,

    /// The buffer ran out of bytes mid-value.
    Io,
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed CBOR value"),
            Self::IllegalValue => write!(f, "illegal value for this field"),
            Self::EndOfArray => write!(f, "end of array"),
            Self::Io => write!(f, "buffer ended before the value did"),
        }
    }
}

impl std::error::Error for CborError {}

/// Something that went wrong decoding a C-DNS file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CdnsError {
    /// A CBOR-level decode failure, optionally naming which field of which
    /// entity it happened in (filled in as the error bubbles up through the
    /// enclosing map/array drivers).
    Cbor(CborError),

    /// The outer array, the block list, or a block ended before the parser
    /// expected it to.
    Truncated,

    /// `version_major` named a schema this reader doesn't know how to read.
    UnsupportedVersion(i64),
}

impl From<CborError> for CdnsError {
    fn from(inner: CborError) -> Self {
        Self::Cbor(inner)
    }
}

impl fmt::Display for CdnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cbor(inner) => write!(f, "{inner}"),
            Self::Truncated => write!(f, "file ended before the expected container did"),
            Self::UnsupportedVersion(major) => write!(f, "unsupported C-DNS version_major {major}"),
        }
    }
}

impl std::error::Error for CdnsError {}

/// Lets `File::open`'s preamble parse report through the same `io::Result`
/// its file-read step already uses, instead of forcing callers to match on
/// two different error types for what is, from the outside, one "couldn't
/// open this file" failure.
impl From<CdnsError> for std::io::Error {
    fn from(err: CdnsError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err.to_string())
    }
}
