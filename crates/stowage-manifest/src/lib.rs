//! Pinned-dependency manifest handling.
//!
//! The manifest (`vendor.conf`) is a line-oriented file: one dependency per
//! line as `<importPath> <revision> [<repoURL>]`, with `#` comments and
//! blank lines ignored. Parsing preserves file order so validation can keep
//! "first occurrence wins" semantics; consumers take [`Manifest::sorted`]
//! entries.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod parse;
pub mod types;
pub mod validate;

pub use error::{ManifestError, Result};
pub use parse::{Manifest, parse, parse_file, write_file};
pub use types::{Dependency, is_versioned};
pub use validate::validate;
