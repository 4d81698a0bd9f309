//! In-process listing of `.jar` and `.zip` archives.

use crate::error::{ClasspathError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use zip::ZipArchive;

/// Whether `path` has an archive extension this crate lists.
pub fn is_archive(path: &Path) -> bool {
    path.extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip")
    })
}

/// File entries of the archive at `path`, sorted. Directory entries are omitted.
///
/// Only the central directory is read; entry contents are never decompressed.
pub fn list_entries(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let archive =
        ZipArchive::new(BufReader::new(file)).map_err(|source| ClasspathError::Archive {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    entries.sort();
    tracing::debug!("{} lists {} entries", path.display(), entries.len());
    Ok(entries)
}
