//! Build-context-aware Go package loading.
//!
//! This is a deliberately small reimplementation of the parts of Go's
//! package loader that a vendoring tool needs: enumerate every import a
//! directory of `.go` files can reach — including test imports and files
//! behind build tags — and resolve imports with vendor-directory search
//! semantics. It does not type-check, it does not build, and it treats the
//! standard library as an opaque "skip this" set.
//!
//! Build constraints (`//go:build`, `// +build`) and `_GOOS`/`_GOARCH`
//! filename gating are evaluated only to populate
//! [`Package::ignored_go_files`]; with [`BuildContext::use_all_files`] set
//! (the default here) every parseable file still contributes imports, which
//! is what makes the computed closure conservative.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod constraint;
pub mod context;
pub mod error;
pub mod load;
mod parser;
pub mod package;
pub mod walk;

pub use context::BuildContext;
pub use error::{LoadError, Result, recover_multiple};
pub use package::Package;
pub use walk::{MissingFetcher, collect_project, resolve_closure};
