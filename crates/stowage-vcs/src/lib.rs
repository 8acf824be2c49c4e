//! Version-control drivers for stowage.
//!
//! Each supported system (git, hg, svn, bzr) is driven through its
//! command-line binary. The per-system knowledge lives in small command
//! template tables with `{dir}`, `{repo}`, `{rev}` and `{scheme}`
//! placeholders; a substitution helper expands them after argument
//! splitting, so repository URLs and paths never go through a shell.
//!
//! ```no_run
//! use stowage_vcs::{Driver, VcsKind};
//! use std::path::Path;
//!
//! # fn main() -> stowage_vcs::Result<()> {
//! let git = Driver::new(VcsKind::Git);
//! git.create_at_revision(
//!     Path::new("/tmp/vendor/example.org/x/net"),
//!     "https://example.org/x/net",
//!     "0a57c2a40b2e",
//! )?;
//! let rev = git.current_revision(Path::new("/tmp/vendor/example.org/x/net"))?;
//! println!("checked out {rev}");
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod driver;
pub mod error;
pub mod remote;
pub mod types;

pub use driver::{Driver, expand};
pub use error::{Result, VcsError};
pub use types::{VcsKind, is_secure_scheme};
