//! Schema-version dispatch and the decode context threaded through L2.
//!
//! C-DNS files come in two incompatible wire shapes keyed off
//! `version_major` in the preamble: draft-04 (`version_major == 0`) and
//! RFC 8618 proper (`version_major >= 1`). Rather than giving every decoded
//! value a pointer back to its enclosing `File`/`Block` (the original
//! reader's approach), each decode function takes a `&DecodeContext` by
//! value describing the handful of facts that vary by schema and that
//! downstream fields need to interpret their own bytes correctly.

/// Which wire shape a file's `BlockTables`/`Query`/`QuerySignature`/...
/// entities were written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `version_major == 0`: draft-04, sometimes called "the old version"
    /// in the original reader.
    Draft04,
    /// `version_major >= 1`: RFC 8618.
    Rfc8618,
}

impl Schema {
    pub fn from_version_major(version_major: i64) -> Self {
        if version_major == 0 {
            Self::Draft04
        } else {
            Self::Rfc8618
        }
    }

    pub fn is_old(self) -> bool {
        matches!(self, Self::Draft04)
    }
}

/// The per-file facts a decode function needs beyond the bytes in front of
/// it: which field-key table to use, whether table indices are 1-based,
/// and how to turn a raw tick count into microseconds.
///
/// Threaded by value (it's three small fields) instead of by reference to
/// an enclosing `File`/`Block`, which is what makes the decode layer free
/// of the original reader's parent back-pointers: see the design notes in
/// DESIGN.md.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    pub schema: Schema,
    /// `storage_parameters.ticks_per_second`, defaulting to 1_000_000 if the
    /// preamble never set it (draft-04 files commonly leave it implicit).
    pub ticks_per_second: i64,
}

impl DecodeContext {
    pub fn new(schema: Schema, ticks_per_second: i64) -> Self {
        Self { schema, ticks_per_second }
    }

    /// `index_offset`: table references are 1-based with 0 meaning "absent"
    /// in both schema versions, so this is constant today, but kept as a
    /// method (rather than a bare constant) because the original reader
    /// ties it to the schema and a future schema could change it.
    pub fn index_offset(self) -> i64 {
        1
    }

    /// Converts a raw tick count to microseconds using this file's
    /// `ticks_per_second`. Division by zero can't happen: `ticks_per_second`
    /// is validated to be positive when `StorageParameters` is decoded (see
    /// `decode::params`).
    pub fn ticks_to_microseconds(self, ticks: i64) -> i64 {
        if self.ticks_per_second == 1_000_000 {
            ticks
        } else {
            ticks * 1_000_000 / self.ticks_per_second
        }
    }
}

/// A 1-based table index, 0 meaning "absent" on the wire. Construction does
/// the `index_offset` subtraction once, so every consumer works with a
/// plain `Option<usize>` instead of re-deriving the offset at each use
/// site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableIndex(Option<usize>);

impl TableIndex {
    /// `raw` is the value read directly off the wire: 0 means absent,
    /// anything else is `1 + <the 0-based index>`.
    pub fn from_wire(raw: i64) -> Self {
        if raw <= 0 {
            Self(None)
        } else {
            Self(Some((raw - 1) as usize))
        }
    }

    pub fn get(self) -> Option<usize> {
        self.0
    }

    pub fn is_present(self) -> bool {
        self.0.is_some()
    }
}
