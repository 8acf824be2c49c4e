//! File and directory classification rules.

use std::path::Path;

/// Extensions a retained source file may have.
pub const SOURCE_EXTENSIONS: [&str; 5] = ["go", "c", "h", "s", "proto"];

/// Nested vendor configuration files that are always kept.
pub const VENDOR_CONFIG_FILES: [&str; 2] = ["go.mod", "vendor.conf"];

const LICENSE_MARKERS: [&str; 5] = ["license", "copying", "patents", "notice", "readme"];

fn extension(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

/// Whether `name` has a source extension.
#[must_use]
pub fn is_source_file(name: &str) -> bool {
    extension(name).is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Whether `name` looks like licensing or documentation that must survive
/// pruning: it mentions LICENSE, COPYING, PATENTS, NOTICE or README
/// (case-insensitive, anywhere in the name) and is not itself a source
/// file.
#[must_use]
pub fn is_license_file(name: &str) -> bool {
    if is_source_file(name) {
        return false;
    }
    let lower = name.to_lowercase();
    LICENSE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// A directory of C sources: at least one `.h` or `.c` file and no `.cc`,
/// `.cpp` or `.py` file. The heuristic is deliberately narrow; a directory
/// mixing headers with Python fails it.
fn is_c_dir(names: &[(String, bool)]) -> bool {
    let mut c_found = false;
    for (name, _) in names {
        match extension(name) {
            Some("cc" | "cpp" | "py") => return false,
            Some("h" | "c") => c_found = true,
            _ => {}
        }
    }
    c_found
}

/// A directory holding nothing but `.proto` files (at least one).
fn is_pb_dir(names: &[(String, bool)]) -> bool {
    let mut pb_found = false;
    for (name, is_dir) in names {
        if *is_dir {
            continue;
        }
        if extension(name) != Some("proto") {
            return false;
        }
        pb_found = true;
    }
    pb_found
}

/// Whether a directory should be retained for C or protobuf interop.
#[must_use]
pub fn is_interesting_dir(path: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(path) else {
        return false;
    };
    let names: Vec<(String, bool)> = entries
        .flatten()
        .map(|entry| {
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            (entry.file_name().to_string_lossy().into_owned(), is_dir)
        })
        .collect();
    is_c_dir(&names) || is_pb_dir(&names)
}
