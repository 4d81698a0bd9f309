//! Pattern search over classpath roots with a persisted result cache.
//!
//! Results are cached per [`SearchKey`] as one [`RootRecord`] per scanned
//! root. A cached result is reused only while every validity predicate holds
//! for the current classpath; otherwise the whole key is rescanned. Records
//! from the runtime lookup are never validated and are refreshed on every
//! query.
//!
//! The cache file is read once on [`SearchCache::load`] and rewritten in full
//! after every query with a plain write. It is not locked: concurrent
//! invocations against one project may lose or corrupt each other's writes,
//! and a corrupt file is treated as an empty cache on the next load.

use crate::archive::{is_archive, list_entries};
use crate::builder::Classpath;
use crate::error::{ClasspathError, Result};
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Root recorded for results of the runtime lookup.
pub const RUNTIME_ROOT: &str = "<runtime>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Plain file or resource pattern.
    Glob,
    /// Class file lookup, augmented by the runtime lookup.
    Class,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SearchKey {
    pub pattern: String,
    pub strategy: ScanStrategy,
}

impl SearchKey {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            strategy: ScanStrategy::Glob,
        }
    }

    /// Key for a class name, dotted or as a `.class` path.
    pub fn class(name: &str) -> Self {
        Self {
            pattern: class_entry(name),
            strategy: ScanStrategy::Class,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Directory,
    Archive,
    Runtime,
}

/// Matches found under one root. Recorded even when `matches` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRecord {
    pub root: PathBuf,
    pub kind: RootKind,
    /// `/`-separated paths relative to `root`, or archive entry names.
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub root: PathBuf,
    pub kind: RootKind,
    pub entry: String,
}

/// Source of class entries outside the classpath, such as a JDK runtime image.
pub trait RuntimeLookup {
    /// Entries matching `target`, e.g. `java/lang/String.class`.
    fn lookup(&self, target: &str) -> Vec<String>;
}

/// Why a persisted cache was discarded on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheCorruption {
    pub path: PathBuf,
    pub reason: String,
}

impl std::fmt::Display for CacheCorruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "search cache {} discarded: {}", self.path.display(), self.reason)
    }
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: SearchKey,
    records: Vec<RootRecord>,
}

pub struct SearchCache {
    path: Option<PathBuf>,
    entries: BTreeMap<SearchKey, Vec<RootRecord>>,
    runtime: Option<Box<dyn RuntimeLookup>>,
    corruption: Option<CacheCorruption>,
}

impl SearchCache {
    /// Cache that is never persisted.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            runtime: None,
            corruption: None,
        }
    }

    /// Loads the cache persisted at `path`.
    ///
    /// A missing file is an empty cache. An unreadable or malformed one is
    /// logged, treated as empty and reported by [`SearchCache::corruption`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let loaded = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<CacheFile>(&content)
                .map(|file| {
                    file.entries
                        .into_iter()
                        .map(|entry| (entry.key, entry.records))
                        .collect()
                })
                .map_err(|e| format!("corrupt: {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(format!("unreadable: {e}")),
        };

        let (entries, corruption) = match loaded {
            Ok(entries) => (entries, None),
            Err(reason) => {
                let corruption = CacheCorruption {
                    path: path.clone(),
                    reason,
                };
                tracing::warn!("{}, starting cold", corruption);
                (BTreeMap::new(), Some(corruption))
            }
        };

        tracing::debug!("loaded {} cached searches from {}", entries.len(), path.display());
        Self {
            path: Some(path),
            entries,
            runtime: None,
            corruption,
        }
    }

    /// Set when [`SearchCache::load`] discarded the persisted file.
    pub fn corruption(&self) -> Option<&CacheCorruption> {
        self.corruption.as_ref()
    }

    pub fn with_runtime(mut self, lookup: impl RuntimeLookup + 'static) -> Self {
        self.runtime = Some(Box::new(lookup));
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records(&self, key: &SearchKey) -> Option<&[RootRecord]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole cache as pretty JSON. A no-op for in-memory caches.
    pub fn save(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let file = CacheFile {
            entries: self
                .entries
                .iter()
                .map(|(key, records)| CacheEntry {
                    key: key.clone(),
                    records: records.clone(),
                })
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Finds entries matching the glob `pattern` under every classpath root.
    ///
    /// A pattern starting with `/` is anchored at the root; any other pattern
    /// may match at any depth.
    pub fn find(&mut self, classpath: &Classpath, pattern: &str) -> Result<Vec<SearchMatch>> {
        self.query(classpath, SearchKey::glob(pattern))
    }

    /// Finds the class file for `name` (`com.acme.Widget` or
    /// `com/acme/Widget.class`), including runtime lookup results.
    pub fn find_class(&mut self, classpath: &Classpath, name: &str) -> Result<Vec<SearchMatch>> {
        self.query(classpath, SearchKey::class(name))
    }

    pub fn query(&mut self, classpath: &Classpath, key: SearchKey) -> Result<Vec<SearchMatch>> {
        let matcher = EntryMatcher::new(&key.pattern)?;

        let cached = self
            .entries
            .get(&key)
            .filter(|records| is_valid(records, classpath))
            .map(|records| in_classpath_order(records, classpath));

        let mut records = match cached {
            Some(records) => {
                tracing::info!("search cache hit for '{}'", key.pattern);
                records
            }
            None => {
                tracing::info!(
                    "scanning {} classpath roots for '{}'",
                    classpath.len(),
                    key.pattern
                );
                scan(classpath, &matcher)
            }
        };

        if key.strategy == ScanStrategy::Class
            && let Some(ref runtime) = self.runtime
        {
            records.push(RootRecord {
                root: PathBuf::from(RUNTIME_ROOT),
                kind: RootKind::Runtime,
                matches: runtime.lookup(&key.pattern),
            });
        }

        let found = records
            .iter()
            .flat_map(|record| {
                record.matches.iter().map(|entry| SearchMatch {
                    root: record.root.clone(),
                    kind: record.kind,
                    entry: entry.clone(),
                })
            })
            .collect::<Vec<_>>();
        tracing::debug!("'{}' matched {} entries", key.pattern, found.len());

        self.entries.insert(key, records);
        if let Err(e) = self.save() {
            tracing::warn!("failed to persist search cache: {}", e);
        }
        Ok(found)
    }
}

/// `com.acme.Widget` or `com.acme.Widget.class` to `com/acme/Widget.class`.
pub fn class_entry(name: &str) -> String {
    let name = name.trim();
    let stem = name.strip_suffix(".class").unwrap_or(name);
    format!("{}.class", stem.replace('.', "/"))
}

/// Every root that can be scanned has a record.
pub fn covers_classpath(records: &[RootRecord], classpath: &Classpath) -> bool {
    classpath
        .iter()
        .filter(|root| is_scannable(root))
        .all(|root| {
            records
                .iter()
                .any(|r| r.kind != RootKind::Runtime && &r.root == root)
        })
}

/// Every match recorded under a directory root still exists.
pub fn directory_matches_present(record: &RootRecord) -> bool {
    record.kind != RootKind::Directory
        || record
            .matches
            .iter()
            .all(|entry| record.root.join(entry).exists())
}

/// The recorded root is still part of the classpath.
pub fn root_on_classpath(record: &RootRecord, classpath: &Classpath) -> bool {
    record.kind == RootKind::Runtime || classpath.contains(&record.root)
}

pub fn is_valid(records: &[RootRecord], classpath: &Classpath) -> bool {
    covers_classpath(records, classpath)
        && records
            .iter()
            .filter(|r| r.kind != RootKind::Runtime)
            .all(|r| root_on_classpath(r, classpath) && directory_matches_present(r))
}

fn is_scannable(root: &Path) -> bool {
    root.is_dir() || (is_archive(root) && root.is_file())
}

fn in_classpath_order(records: &[RootRecord], classpath: &Classpath) -> Vec<RootRecord> {
    classpath
        .iter()
        .filter_map(|root| {
            records
                .iter()
                .find(|r| r.kind != RootKind::Runtime && &r.root == root)
                .cloned()
        })
        .collect()
}

fn scan(classpath: &Classpath, matcher: &EntryMatcher) -> Vec<RootRecord> {
    let mut records = Vec::new();
    for root in classpath {
        if root.is_dir() {
            records.push(RootRecord {
                root: root.clone(),
                kind: RootKind::Directory,
                matches: scan_directory(root, matcher),
            });
        } else if is_archive(root) && root.is_file() {
            match list_entries(root) {
                Ok(entries) => records.push(RootRecord {
                    root: root.clone(),
                    kind: RootKind::Archive,
                    matches: entries
                        .into_iter()
                        .filter(|entry| matcher.matches(entry))
                        .collect(),
                }),
                Err(e) => tracing::warn!("skipping {}: {}", root.display(), e),
            }
        } else if !root.exists() {
            tracing::warn!("classpath root {} does not exist", root.display());
        } else {
            tracing::debug!("skipping non-archive file {}", root.display());
        }
    }
    records
}

fn scan_directory(root: &Path, matcher: &EntryMatcher) -> Vec<String> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("skipping unreadable entry under {}: {}", root.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            matcher.matches(&relative).then_some(relative)
        })
        .collect()
}

/// Glob matched against `/`-separated entry paths.
struct EntryMatcher {
    pattern: Pattern,
}

impl EntryMatcher {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    fn new(target: &str) -> Result<Self> {
        let source = match target.strip_prefix('/') {
            Some(anchored) => anchored.to_string(),
            None => format!("**/{target}"),
        };
        let pattern = Pattern::new(&source).map_err(|source| ClasspathError::InvalidPattern {
            pattern: target.to_string(),
            source,
        })?;
        Ok(Self { pattern })
    }

    fn matches(&self, entry: &str) -> bool {
        self.pattern.matches_with(entry, Self::OPTIONS)
    }
}
