//! Vendor-tree pruning.
//!
//! Given the set of packages a project actually needs, walk the vendor
//! directory and delete everything else: unused packages, tests, hidden
//! entries, `testdata`, and non-source files — while preserving licenses,
//! C/protobuf interop directories, nested vendor configuration files, and
//! anything the whitelist names. A second pass collapses directories whose
//! only remaining contents are non-source residue.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod clean;
pub mod error;
pub mod rules;

pub use clean::{KeepSet, Whitelist, clean_vendor, unused_entries};
pub use error::{PruneError, Result};
pub use rules::{is_interesting_dir, is_license_file, is_source_file};
