//! Domain types for Maven coordinates and dependency declarations.

use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of an artifact independent of its version: `groupId:artifactId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl ArtifactKey {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Fully resolved `groupId:artifactId:version` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl Coordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.group_id.clone(), self.artifact_id.clone())
    }

    /// Repository-relative location: `org/example/lib/1.0/lib-1.0.<extension>`.
    pub fn repository_path(&self, extension: &str) -> String {
        format!(
            "{}/{}/{}/{}-{}.{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.artifact_id,
            self.version,
            extension
        )
    }

    /// [`Self::repository_path`] joined onto a local repository root.
    pub fn local_path(&self, repository: &Path, extension: &str) -> PathBuf {
        let mut path = repository.to_path_buf();
        path.extend(self.group_id.split('.'));
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(format!(
            "{}-{}.{}",
            self.artifact_id, self.version, extension
        ));
        path
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = crate::error::MavenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *artifact, *version))
            }
            _ => Err(crate::error::MavenError::InvalidCoordinates {
                coordinates: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MavenScope {
    #[default]
    Compile,
    Test,
    Runtime,
    Provided,
    System,
    Import,
}

impl MavenScope {
    /// Strict lookup; `None` for anything that is not a Maven scope name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "compile" => Some(Self::Compile),
            "test" => Some(Self::Test),
            "runtime" => Some(Self::Runtime),
            "provided" => Some(Self::Provided),
            "system" => Some(Self::System),
            "import" => Some(Self::Import),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Test => "test",
            Self::Runtime => "runtime",
            Self::Provided => "provided",
            Self::System => "system",
            Self::Import => "import",
        }
    }
}

impl std::str::FromStr for MavenScope {
    type Err = std::convert::Infallible;

    /// Lenient: unknown scope names fall back to `compile`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s).unwrap_or_default())
    }
}

impl fmt::Display for MavenScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a declaration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// `<dependencies>` of the descriptor being resolved.
    Direct,
    /// `<dependencyManagement>`, or any dependency inherited from a parent.
    Management,
}

/// Version field of a declaration after property substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Resolved(String),
    /// Still contains a `${...}` reference nothing could satisfy.
    Unresolved(String),
}

impl VersionSpec {
    pub fn resolved(&self) -> Option<&str> {
        match self {
            Self::Resolved(v) => Some(v),
            Self::Unresolved(_) => None,
        }
    }
}

/// One `<dependency>` element after property substitution.
///
/// Fields a descriptor leaves out stay `None` so that a direct declaration
/// can inherit them from a management entry for the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub key: ArtifactKey,
    pub version: Option<VersionSpec>,
    pub scope: Option<MavenScope>,
    pub optional: Option<bool>,
    pub origin: Origin,
    /// Descriptor the declaration was read from.
    pub source: PathBuf,
}

impl Declaration {
    pub fn scope(&self) -> MavenScope {
        self.scope.unwrap_or_default()
    }

    pub fn is_optional(&self) -> bool {
        self.optional.unwrap_or(false)
    }

    /// Resolved coordinate, or `None` while the version is missing or unresolved.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let version = self.version.as_ref()?.resolved()?;
        Some(Coordinate::new(
            self.key.group_id.clone(),
            self.key.artifact_id.clone(),
            version,
        ))
    }
}

/// Recoverable conditions met while resolving.
///
/// Each one is logged when it happens and collected so that callers can
/// report them after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// A `${name}` reference had no value; the owning field was dropped.
    UnresolvedVariable { name: String, source: PathBuf },
    /// The parent descriptor could not be found; the descriptor was treated as a root.
    MissingParent { path: PathBuf, parent: PathBuf },
    /// A dependency ended mediation without a usable version.
    UnresolvedVersion { key: ArtifactKey, source: PathBuf },
    /// An artifact descriptor could not be read, so its dependencies are unknown.
    PomUnavailable { coordinate: Coordinate, reason: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedVariable { name, source } => {
                write!(f, "unresolved variable '${{{name}}}' in {}", source.display())
            }
            Self::MissingParent { path, parent } => write!(
                f,
                "parent '{}' of {} not found, treating it as a root",
                parent.display(),
                path.display()
            ),
            Self::UnresolvedVersion { key, source } => write!(
                f,
                "dependency {key} declared in {} has no resolvable version",
                source.display()
            ),
            Self::PomUnavailable { coordinate, reason } => {
                write!(f, "descriptor of {coordinate} unavailable: {reason}")
            }
        }
    }
}

/// A mediated dependency located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub coordinate: Coordinate,
    pub scope: MavenScope,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(version: Option<VersionSpec>) -> Declaration {
        Declaration {
            key: ArtifactKey::new("org.slf4j", "slf4j-api"),
            version,
            scope: None,
            optional: None,
            origin: Origin::Direct,
            source: PathBuf::from("/p/pom.xml"),
        }
    }

    #[test]
    fn test_key_display() {
        let key = ArtifactKey::new("org.apache.commons", "commons-lang3");
        assert_eq!(key.to_string(), "org.apache.commons:commons-lang3");
    }

    #[test]
    fn test_repository_path() {
        let coord = Coordinate::new("org.apache.commons", "commons-lang3", "3.14.0");
        assert_eq!(
            coord.repository_path("jar"),
            "org/apache/commons/commons-lang3/3.14.0/commons-lang3-3.14.0.jar"
        );
        assert_eq!(
            coord.local_path(Path::new("/home/u/.m2/repository"), "pom"),
            PathBuf::from(
                "/home/u/.m2/repository/org/apache/commons/commons-lang3/3.14.0/commons-lang3-3.14.0.pom"
            )
        );
    }

    #[test]
    fn test_coordinate_from_str() {
        let coord: Coordinate = "junit:junit:4.13.2".parse().unwrap();
        assert_eq!(coord, Coordinate::new("junit", "junit", "4.13.2"));
        assert_eq!(coord.key(), ArtifactKey::new("junit", "junit"));

        assert!("junit:junit".parse::<Coordinate>().is_err());
        assert!("a::1".parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_scope_variants() {
        assert_eq!("test".parse::<MavenScope>().unwrap(), MavenScope::Test);
        assert_eq!("Runtime".parse::<MavenScope>().unwrap(), MavenScope::Runtime);
        assert_eq!("provided".parse::<MavenScope>().unwrap(), MavenScope::Provided);
        assert_eq!("system".parse::<MavenScope>().unwrap(), MavenScope::System);
        assert_eq!("import".parse::<MavenScope>().unwrap(), MavenScope::Import);
        assert_eq!("unknown".parse::<MavenScope>().unwrap(), MavenScope::Compile);
        assert_eq!(MavenScope::from_name("unknown"), None);
        assert_eq!(MavenScope::default(), MavenScope::Compile);
        assert_eq!(MavenScope::Test.to_string(), "test");
    }

    #[test]
    fn test_declaration_defaults() {
        let d = decl(Some(VersionSpec::Resolved("2.0.9".into())));
        assert_eq!(d.scope(), MavenScope::Compile);
        assert!(!d.is_optional());
        assert_eq!(
            d.coordinate(),
            Some(Coordinate::new("org.slf4j", "slf4j-api", "2.0.9"))
        );
    }

    #[test]
    fn test_declaration_without_usable_version() {
        assert!(decl(None).coordinate().is_none());
        assert!(
            decl(Some(VersionSpec::Unresolved("${slf4j.version}".into())))
                .coordinate()
                .is_none()
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = ResolutionWarning::UnresolvedVariable {
            name: "foo".into(),
            source: PathBuf::from("/p/pom.xml"),
        };
        assert_eq!(warning.to_string(), "unresolved variable '${foo}' in /p/pom.xml");
    }
}
