#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::wildcard_imports)]

#![deny(clippy::cast_possible_wrap)]
#![deny(unsafe_code)]


//! The `cdns` crate is the reader half of this workspace: it decodes
//! C-DNS (RFC 8618, and its predecessor draft-04) capture files into
//! typed, cross-referenced in-memory blocks, and can render a file back
//! out as annotated text for debugging.


mod cbor;

mod error;
pub use self::error::{CborError, CdnsError};

pub mod flags;

mod schema;
pub use self::schema::{DecodeContext, Schema, TableIndex};

pub mod types;

mod keys;

mod decode;

mod file;
pub use self::file::File;

mod dump;
