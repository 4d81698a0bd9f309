//! Classpath assembly and class/resource search for lithium.
//!
//! [`Classpath`] turns root specifiers (directories, files, globs, classpath
//! files) into an ordered, duplicate-free path list. [`SearchCache`] finds
//! entries under those roots, scanning directories and `.jar`/`.zip`
//! archives, and keeps results on disk between runs.

pub mod archive;
pub mod builder;
pub mod error;
pub mod search;

pub use archive::{is_archive, list_entries};
pub use builder::{Classpath, SEPARATOR};
pub use error::{ClasspathError, Result};
pub use search::{
    CacheCorruption, RUNTIME_ROOT, RootKind, RootRecord, RuntimeLookup, ScanStrategy, SearchCache, SearchKey,
    SearchMatch, class_entry, covers_classpath, directory_matches_present, is_valid,
    root_on_classpath,
};
