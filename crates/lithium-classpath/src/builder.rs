//! Classpath assembly from root specifiers.
//!
//! A specifier names a directory, a file, or a glob. Directories contribute
//! themselves followed by the `*.jar` files directly inside them, globs their
//! sorted matches. The result keeps specifier order and drops repeated paths,
//! keeping the first occurrence.

use crate::error::{ClasspathError, Result};
use glob::Pattern;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Platform path-list separator used by `java -classpath`.
#[cfg(windows)]
pub const SEPARATOR: char = ';';
#[cfg(not(windows))]
pub const SEPARATOR: char = ':';

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Ordered, duplicate-free list of classpath roots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    paths: Vec<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands `specifiers`, resolving relative ones against `base`.
    ///
    /// # Errors
    ///
    /// [`ClasspathError::InvalidPattern`] for a malformed glob,
    /// [`ClasspathError::Io`] when a directory cannot be listed.
    pub fn build<I, S>(specifiers: I, base: &Path) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classpath = Self::new();
        for specifier in specifiers {
            classpath.expand(specifier.as_ref(), base)?;
        }
        tracing::debug!("built classpath with {} entries", classpath.len());
        Ok(classpath)
    }

    /// Splits a separator-joined classpath string. Empty segments are skipped.
    pub fn parse(joined: &str) -> Self {
        joined
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    /// Reads a classpath file: one specifier per line, blank lines and lines
    /// starting with `#` ignored. Specifiers are expanded as in [`Self::build`].
    pub fn read_file(path: &Path, base: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let specifiers = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));
        Self::build(specifiers, base)
    }

    /// Writes one path per line, creating parent directories as needed.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut content = String::new();
        for entry in &self.paths {
            content.push_str(&entry.to_string_lossy());
            content.push('\n');
        }
        std::fs::write(path, content)?;
        tracing::debug!("wrote {} classpath entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Conventional project roots under `home`: `classes` and `lib/*.jar`,
    /// each only when it exists.
    pub fn default_roots(home: &Path) -> Result<Self> {
        let mut specifiers = Vec::new();
        if home.join("classes").exists() {
            specifiers.push("classes");
        }
        if home.join("lib").exists() {
            specifiers.push("lib/*.jar");
        }
        Self::build(specifiers, home)
    }

    /// Appends `path` unless it is already present.
    pub fn push(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn extend_from(&mut self, other: &Self) {
        for path in &other.paths {
            self.push(path.clone());
        }
    }

    /// Removes every path equal to, or glob-matching, one of `patterns`.
    /// Returns the number of removed paths.
    pub fn exclude<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<usize> {
        let compiled = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(p)
                    .map(|pattern| (PathBuf::from(p), pattern))
                    .map_err(|source| ClasspathError::InvalidPattern {
                        pattern: p.to_string(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let before = self.paths.len();
        self.paths.retain(|path| {
            !compiled
                .iter()
                .any(|(literal, pattern)| path == literal || pattern.matches_path(path))
        });
        Ok(before - self.paths.len())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths joined with [`SEPARATOR`].
    pub fn join(&self) -> String {
        self.paths
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string())
    }

    fn expand(&mut self, specifier: &str, base: &Path) -> Result<()> {
        let path = base.join(specifier);
        if !specifier.contains(GLOB_CHARS) {
            return self.expand_path(path);
        }

        let pattern = if Path::new(specifier).is_absolute() {
            specifier.to_string()
        } else {
            Path::new(&Pattern::escape(&base.to_string_lossy()))
                .join(specifier)
                .to_string_lossy()
                .into_owned()
        };
        let entries = glob::glob(&pattern).map_err(|source| ClasspathError::InvalidPattern {
            pattern: specifier.to_string(),
            source,
        })?;

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("skipping unreadable {}: {}", e.path().display(), e.error());
                    None
                }
            })
            .collect();
        matches.sort();
        if matches.is_empty() {
            tracing::debug!("'{}' matched nothing", specifier);
        }
        for path in matches {
            self.expand_path(path)?;
        }
        Ok(())
    }

    fn expand_path(&mut self, path: PathBuf) -> Result<()> {
        if !path.is_dir() {
            self.push(path);
            return Ok(());
        }

        self.push(path.clone());
        for entry in WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if is_jar(entry.path()) && entry.path().is_file() {
                self.push(entry.into_path());
            }
        }
        Ok(())
    }
}

fn is_jar(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar"))
}

impl FromIterator<PathBuf> for Classpath {
    fn from_iter<T: IntoIterator<Item = PathBuf>>(iter: T) -> Self {
        let mut classpath = Self::new();
        for path in iter {
            classpath.push(path);
        }
        classpath
    }
}

impl<'a> IntoIterator for &'a Classpath {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl fmt::Display for Classpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}
