//! Descriptor loading along the parent chain.
//!
//! Each descriptor is loaded after its parent, and the result of a load is an
//! owned [`DescriptorNode`]: the parent's merged properties and graph are
//! handed to the child by value and extended there. Parents are always loaded
//! in management context, so anything they declare only supplies defaults.

use crate::error::{MavenError, Result};
use crate::graph::DependencyGraph;
use crate::parser::{PomDocument, RawDependency, read_pom};
use crate::property::{PropertyTable, Substitution, leftover_placeholder, substitute};
use crate::types::{ArtifactKey, Coordinate, Declaration, Origin, ResolutionWarning, VersionSpec};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A descriptor merged with all of its ancestors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorNode {
    pub path: PathBuf,
    pub properties: PropertyTable,
    /// Parent descriptor actually used, if any.
    pub parent: Option<PathBuf>,
    pub graph: DependencyGraph,
}

/// Loads descriptors, parsing each absolute path at most once.
///
/// One loader serves one resolution run; it is not meant to outlive it.
#[derive(Debug, Default)]
pub struct PomLoader {
    local_repository: Option<PathBuf>,
    documents: HashMap<PathBuf, Rc<PomDocument>>,
    warnings: Vec<ResolutionWarning>,
}

impl PomLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables parent lookup in a local repository when the relative path
    /// does not lead to the parent.
    pub fn with_local_repository(mut self, repository: impl Into<PathBuf>) -> Self {
        self.local_repository = Some(repository.into());
        self
    }

    /// Loads the descriptor at `path` as the resolution root.
    ///
    /// # Errors
    ///
    /// [`MavenError::ParseError`] when this descriptor or any ancestor is
    /// malformed, [`MavenError::ParentCycle`] when the parent chain loops.
    pub fn load(&mut self, path: &Path) -> Result<DescriptorNode> {
        let mut chain = Vec::new();
        self.load_node(path, false, &mut chain)
    }

    /// Warnings collected so far, leaving the loader's list empty.
    pub fn take_warnings(&mut self) -> Vec<ResolutionWarning> {
        std::mem::take(&mut self.warnings)
    }

    /// Number of distinct descriptors parsed by this loader.
    pub fn parsed_count(&self) -> usize {
        self.documents.len()
    }

    fn load_node(
        &mut self,
        path: &Path,
        management: bool,
        chain: &mut Vec<PathBuf>,
    ) -> Result<DescriptorNode> {
        let path = absolute(path)?;
        if chain.contains(&path) {
            return Err(MavenError::ParentCycle { path });
        }

        let doc = self.document(&path)?;
        tracing::debug!(
            "loading {} ({} context)",
            path.display(),
            if management { "management" } else { "direct" }
        );

        let parent = self.parent_path(&doc);
        let base = match parent {
            Some(ref parent_path) => {
                chain.push(path.clone());
                let node = self.load_node(parent_path, true, chain);
                chain.pop();
                node?
            }
            None => DescriptorNode::default(),
        };

        let properties = base
            .properties
            .merged(builtin_properties(&doc).into_iter().chain(doc.properties.iter().cloned()));

        let mut graph = base.graph;
        for raw in &doc.managed_dependencies {
            if let Some(decl) =
                declaration(raw, Origin::Management, &properties, &path, &mut self.warnings)
            {
                graph.insert(decl);
            }
        }

        let origin = if management {
            Origin::Management
        } else {
            Origin::Direct
        };
        for raw in &doc.dependencies {
            if let Some(decl) = declaration(raw, origin, &properties, &path, &mut self.warnings) {
                graph.insert(decl);
            }
        }

        Ok(DescriptorNode {
            path,
            properties,
            parent,
            graph,
        })
    }

    fn document(&mut self, path: &Path) -> Result<Rc<PomDocument>> {
        if let Some(doc) = self.documents.get(path) {
            return Ok(Rc::clone(doc));
        }
        let doc = Rc::new(read_pom(path)?);
        self.documents.insert(path.to_path_buf(), Rc::clone(&doc));
        Ok(doc)
    }

    /// Locates the parent descriptor of `doc`.
    ///
    /// Tries the explicit relative path (or the implicit `../pom.xml`), then
    /// the parent coordinate in the local repository. Failing both, the
    /// descriptor is treated as a root and a warning is recorded.
    fn parent_path(&mut self, doc: &PomDocument) -> Option<PathBuf> {
        let parent = doc.parent.as_ref()?;
        let dir = doc.path.parent().unwrap_or_else(|| Path::new("."));

        let (candidate, implicit) = match parent.relative_path.as_deref() {
            Some("") => (None, false),
            Some(relative) => (Some(dir.join(relative)), false),
            None => (Some(dir.join("..").join("pom.xml")), true),
        };
        let candidate = candidate.map(|p| if p.is_dir() { p.join("pom.xml") } else { p });

        if let Some(ref path) = candidate
            && path.is_file()
            && (!implicit || self.is_expected_parent(path, parent.artifact_id.as_deref()))
        {
            return Some(path.clone());
        }

        let in_repository = self.repository_parent(parent);
        if let Some(ref path) = in_repository
            && path.is_file()
        {
            tracing::debug!("parent of {} found in local repository", doc.path.display());
            return Some(path.clone());
        }

        let missing = candidate
            .or(in_repository)
            .unwrap_or_else(|| dir.join("pom.xml"));
        tracing::warn!(
            "parent '{}' of {} not found, treating it as a root",
            missing.display(),
            doc.path.display()
        );
        self.warnings.push(ResolutionWarning::MissingParent {
            path: doc.path.clone(),
            parent: missing,
        });
        None
    }

    /// The implicit `../pom.xml` only counts when it declares the expected artifactId.
    fn is_expected_parent(&mut self, path: &Path, artifact_id: Option<&str>) -> bool {
        let Some(expected) = artifact_id else {
            return true;
        };
        let Ok(canonical) = absolute(path) else {
            return false;
        };
        match self.document(&canonical) {
            Ok(doc) => doc.artifact_id.as_deref().is_none_or(|found| found == expected),
            // Surface the parse error when the parent is actually loaded.
            Err(_) => true,
        }
    }

    fn repository_parent(&self, parent: &crate::parser::ParentRef) -> Option<PathBuf> {
        let repository = self.local_repository.as_ref()?;
        let coordinate = Coordinate::new(
            parent.group_id.clone()?,
            parent.artifact_id.clone()?,
            parent.version.clone()?,
        );
        Some(coordinate.local_path(repository, "pom"))
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).map_err(|e| MavenError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// `project.*` properties derived from the descriptor's own coordinates.
pub(crate) fn builtin_properties(doc: &PomDocument) -> Vec<(String, String)> {
    let mut builtins = Vec::new();
    if let Some(group_id) = doc.effective_group_id() {
        builtins.push(("project.groupId".to_string(), group_id.to_string()));
    }
    if let Some(ref artifact_id) = doc.artifact_id {
        builtins.push(("project.artifactId".to_string(), artifact_id.clone()));
    }
    if let Some(version) = doc.effective_version() {
        builtins.push(("project.version".to_string(), version.to_string()));
    }
    if let Some(version) = doc.parent.as_ref().and_then(|p| p.version.as_ref()) {
        builtins.push(("project.parent.version".to_string(), version.clone()));
    }
    builtins
}

/// Substitutes every field of `raw`.
///
/// An unresolvable groupId or artifactId drops the declaration; an
/// unresolvable version is kept as [`VersionSpec::Unresolved`] for the
/// mediator to report; an unresolvable scope or optional flag falls back to
/// its default. A value that still holds a placeholder after substitution
/// counts as unresolved. Every unresolved reference is recorded in `warnings`.
pub(crate) fn declaration(
    raw: &RawDependency,
    origin: Origin,
    properties: &PropertyTable,
    source: &Path,
    warnings: &mut Vec<ResolutionWarning>,
) -> Option<Declaration> {
    let mut resolve = |text: &str| match substitute(text, properties) {
        Substitution::Resolved(value) => match leftover_placeholder(&value) {
            None => Some(value),
            Some(name) => {
                tracing::warn!("'{}' still references '${{{}}}' after substitution", text, name);
                warnings.push(ResolutionWarning::UnresolvedVariable {
                    name: name.to_string(),
                    source: source.to_path_buf(),
                });
                None
            }
        },
        Substitution::Unresolved { name } => {
            warnings.push(ResolutionWarning::UnresolvedVariable {
                name,
                source: source.to_path_buf(),
            });
            None
        }
    };

    let group_id = resolve(raw.group_id.as_str())?;
    let artifact_id = resolve(raw.artifact_id.as_str())?;
    let version = raw.version.as_deref().map(|text| match resolve(text) {
        Some(value) => VersionSpec::Resolved(value),
        None => VersionSpec::Unresolved(text.to_string()),
    });
    let scope = raw
        .scope
        .as_deref()
        .and_then(&mut resolve)
        .map(|s| s.parse().unwrap_or_default());
    let optional = raw
        .optional
        .as_deref()
        .and_then(&mut resolve)
        .map(|s| s.trim().eq_ignore_ascii_case("true"));

    Some(Declaration {
        key: ArtifactKey::new(group_id, artifact_id),
        version,
        scope,
        optional,
        origin,
        source: source.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MavenScope;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) -> PathBuf {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn key(group: &str, artifact: &str) -> ArtifactKey {
        ArtifactKey::new(group, artifact)
    }

    #[test]
    fn test_property_round_trip() {
        let dir = TempDir::new().unwrap();
        let pom = write(
            dir.path(),
            "pom.xml",
            r"<project>
  <properties><foo>1.2.3</foo></properties>
  <dependencies>
    <dependency>
      <groupId>g</groupId>
      <artifactId>a</artifactId>
      <version>${foo}</version>
    </dependency>
  </dependencies>
</project>",
        );

        let node = PomLoader::new().load(&pom).unwrap();
        let decl = node.graph.get(&key("g", "a")).unwrap();
        assert_eq!(decl.version, Some(VersionSpec::Resolved("1.2.3".into())));
        assert_eq!(decl.origin, Origin::Direct);
    }

    #[test]
    fn test_parent_dependencies_become_management() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pom.xml",
            r"<project>
  <artifactId>parent</artifactId>
  <properties><lib.version>2.0</lib.version></properties>
  <dependencies>
    <dependency>
      <groupId>g</groupId>
      <artifactId>from-parent</artifactId>
      <version>1.0</version>
    </dependency>
  </dependencies>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>g</groupId>
        <artifactId>lib</artifactId>
        <version>${lib.version}</version>
        <scope>runtime</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
</project>",
        );
        let child = write(
            dir.path(),
            "child/pom.xml",
            r"<project>
  <parent><artifactId>parent</artifactId></parent>
  <artifactId>child</artifactId>
  <dependencies>
    <dependency>
      <groupId>g</groupId>
      <artifactId>lib</artifactId>
    </dependency>
  </dependencies>
</project>",
        );

        let mut loader = PomLoader::new();
        let node = loader.load(&child).unwrap();
        assert!(node.parent.is_some());
        assert!(loader.take_warnings().is_empty());

        let inherited = node.graph.get(&key("g", "from-parent")).unwrap();
        assert_eq!(inherited.origin, Origin::Management);

        let lib = node.graph.get(&key("g", "lib")).unwrap();
        assert_eq!(lib.origin, Origin::Direct);
        assert_eq!(lib.version, Some(VersionSpec::Resolved("2.0".into())));
        assert_eq!(lib.scope(), MavenScope::Runtime);
    }

    #[test]
    fn test_child_properties_shadow_parent() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "parent/pom.xml",
            r"<project>
  <properties><v>1.0</v></properties>
</project>",
        );
        let child = write(
            dir.path(),
            "child/pom.xml",
            r"<project>
  <parent><relativePath>../parent</relativePath></parent>
  <properties><v>2.0</v></properties>
  <dependencies>
    <dependency><groupId>g</groupId><artifactId>a</artifactId><version>${v}</version></dependency>
  </dependencies>
</project>",
        );

        let node = PomLoader::new().load(&child).unwrap();
        assert_eq!(node.properties.get("v"), Some("2.0"));
        assert_eq!(
            node.graph.get(&key("g", "a")).unwrap().version,
            Some(VersionSpec::Resolved("2.0".into()))
        );
    }

    #[test]
    fn test_missing_parent_is_warning() {
        let dir = TempDir::new().unwrap();
        let pom = write(
            dir.path(),
            "app/pom.xml",
            r"<project>
  <parent>
    <groupId>g</groupId><artifactId>p</artifactId><version>1</version>
    <relativePath>../nowhere/pom.xml</relativePath>
  </parent>
</project>",
        );

        let mut loader = PomLoader::new();
        let node = loader.load(&pom).unwrap();
        assert!(node.parent.is_none());
        let warnings = loader.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0], ResolutionWarning::MissingParent { .. }));
    }

    #[test]
    fn test_implicit_parent_must_match_artifact_id() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "pom.xml",
            "<project><artifactId>aggregator</artifactId></project>",
        );
        let child = write(
            dir.path(),
            "module/pom.xml",
            r"<project>
  <parent><groupId>g</groupId><artifactId>real-parent</artifactId><version>1</version></parent>
</project>",
        );

        let mut loader = PomLoader::new();
        let node = loader.load(&child).unwrap();
        assert!(node.parent.is_none());
        assert_eq!(loader.take_warnings().len(), 1);
    }

    #[test]
    fn test_parent_from_local_repository() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("repo");
        write(
            &repo,
            "org/acme/acme-parent/3/acme-parent-3.pom",
            r"<project>
  <dependencyManagement>
    <dependencies>
      <dependency><groupId>org.acme</groupId><artifactId>core</artifactId><version>3.1</version></dependency>
    </dependencies>
  </dependencyManagement>
</project>",
        );
        let pom = write(
            dir.path(),
            "app/pom.xml",
            r"<project>
  <parent>
    <groupId>org.acme</groupId><artifactId>acme-parent</artifactId><version>3</version>
    <relativePath/>
  </parent>
  <dependencies>
    <dependency><groupId>org.acme</groupId><artifactId>core</artifactId></dependency>
  </dependencies>
</project>",
        );

        let mut loader = PomLoader::new().with_local_repository(&repo);
        let node = loader.load(&pom).unwrap();
        assert!(loader.take_warnings().is_empty());
        assert_eq!(
            node.graph.get(&key("org.acme", "core")).unwrap().version,
            Some(VersionSpec::Resolved("3.1".into()))
        );
    }

    #[test]
    fn test_parent_cycle_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a/pom.xml",
            "<project><parent><relativePath>../b/pom.xml</relativePath></parent></project>",
        );
        write(
            dir.path(),
            "b/pom.xml",
            "<project><parent><relativePath>../a/pom.xml</relativePath></parent></project>",
        );

        let err = PomLoader::new()
            .load(&dir.path().join("a/pom.xml"))
            .unwrap_err();
        assert!(matches!(err, MavenError::ParentCycle { .. }));
    }

    #[test]
    fn test_parent_parse_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", "<project><dependencies></project>");
        let child = write(
            dir.path(),
            "child/pom.xml",
            "<project><parent><artifactId>x</artifactId><relativePath>../pom.xml</relativePath></parent></project>",
        );

        assert!(matches!(
            PomLoader::new().load(&child),
            Err(MavenError::ParseError { .. })
        ));
    }

    #[test]
    fn test_unresolved_version_is_kept_and_reported() {
        let dir = TempDir::new().unwrap();
        let pom = write(
            dir.path(),
            "pom.xml",
            r"<project>
  <dependencies>
    <dependency><groupId>g</groupId><artifactId>a</artifactId><version>${missing}</version></dependency>
    <dependency><groupId>${nobody}</groupId><artifactId>b</artifactId><version>1</version></dependency>
  </dependencies>
</project>",
        );

        let mut loader = PomLoader::new();
        let node = loader.load(&pom).unwrap();
        assert_eq!(
            node.graph.get(&key("g", "a")).unwrap().version,
            Some(VersionSpec::Unresolved("${missing}".into()))
        );
        assert_eq!(node.graph.len(), 1);
        assert_eq!(loader.take_warnings().len(), 2);
    }

    #[test]
    fn test_leftover_placeholder_is_unresolved() {
        let dir = TempDir::new().unwrap();
        let pom = write(
            dir.path(),
            "pom.xml",
            r"<project>
  <properties><a>${b}</a><b>2</b><grp>${b}</grp></properties>
  <dependencies>
    <dependency><groupId>g</groupId><artifactId>chained</artifactId><version>${a}</version></dependency>
    <dependency><groupId>g</groupId><artifactId>double</artifactId><version>${b}.${zzz}</version></dependency>
    <dependency><groupId>${grp}</groupId><artifactId>dropped</artifactId><version>1</version></dependency>
    <dependency><groupId>g</groupId><artifactId>plain</artifactId><version>${b}</version></dependency>
  </dependencies>
</project>",
        );

        let mut loader = PomLoader::new();
        let node = loader.load(&pom).unwrap();
        assert_eq!(
            node.graph.get(&key("g", "chained")).unwrap().version,
            Some(VersionSpec::Unresolved("${a}".into()))
        );
        assert_eq!(
            node.graph.get(&key("g", "double")).unwrap().version,
            Some(VersionSpec::Unresolved("${b}.${zzz}".into()))
        );
        assert!(!node.graph.contains(&key("${b}", "dropped")));
        assert_eq!(
            node.graph.get(&key("g", "plain")).unwrap().version,
            Some(VersionSpec::Resolved("2".into()))
        );
        assert_eq!(node.graph.len(), 3);

        let names: Vec<String> = loader
            .take_warnings()
            .into_iter()
            .filter_map(|w| match w {
                ResolutionWarning::UnresolvedVariable { name, .. } => Some(name),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["b", "zzz", "b"]);

        let mediation = crate::mediator::mediate(
            &node.graph,
            &crate::mediator::MediationOptions::default(),
        );
        let kept: Vec<&str> = mediation
            .dependencies
            .iter()
            .map(|a| a.coordinate.artifact_id.as_str())
            .collect();
        assert_eq!(kept, ["plain"]);
        assert_eq!(
            mediation
                .warnings
                .iter()
                .filter(|w| matches!(w, ResolutionWarning::UnresolvedVersion { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_project_builtin_properties() {
        let dir = TempDir::new().unwrap();
        let pom = write(
            dir.path(),
            "pom.xml",
            r"<project>
  <groupId>org.acme</groupId>
  <artifactId>app</artifactId>
  <version>5.0</version>
  <dependencies>
    <dependency><groupId>${project.groupId}</groupId><artifactId>app-api</artifactId><version>${project.version}</version></dependency>
  </dependencies>
</project>",
        );

        let node = PomLoader::new().load(&pom).unwrap();
        let decl = node.graph.get(&key("org.acme", "app-api")).unwrap();
        assert_eq!(decl.version, Some(VersionSpec::Resolved("5.0".into())));
    }

    #[test]
    fn test_shared_ancestor_parsed_once() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "pom.xml", "<project><artifactId>root</artifactId></project>");
        let child = write(
            dir.path(),
            "child/pom.xml",
            "<project><parent><artifactId>root</artifactId></parent></project>",
        );

        let mut loader = PomLoader::new();
        loader.load(&child).unwrap();
        loader.load(&child).unwrap();
        assert_eq!(loader.parsed_count(), 2);
    }

    #[test]
    fn test_missing_root_is_parse_error() {
        let err = PomLoader::new()
            .load(Path::new("/nonexistent/pom.xml"))
            .unwrap_err();
        assert!(matches!(err, MavenError::ParseError { .. }));
    }
}
