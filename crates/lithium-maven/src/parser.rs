//! pom.xml parser.
//!
//! Uses the quick-xml SAX reader and tracks the element path from the
//! document root, so that `<dependencies>` nested under `<build>` or
//! `<profiles>` and `<groupId>` nested under `<exclusions>` are never
//! mistaken for the elements they shadow. Text is kept raw: `${...}`
//! references are substituted later by the loader.

use crate::error::{MavenError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::{Path, PathBuf};

/// `<parent>` element of a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    /// `Some("")` for an explicit `<relativePath/>`.
    pub relative_path: Option<String>,
}

/// One `<dependency>` element, text as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub optional: Option<String>,
}

/// The subset of a pom.xml the resolver reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDocument {
    pub path: PathBuf,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub parent: Option<ParentRef>,
    /// `/project/properties/*` in document order.
    pub properties: Vec<(String, String)>,
    /// `/project/dependencies/dependency`
    pub dependencies: Vec<RawDependency>,
    /// `/project/dependencyManagement/dependencies/dependency`
    pub managed_dependencies: Vec<RawDependency>,
}

impl PomDocument {
    /// groupId, inherited from `<parent>` when the project omits it.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref()?.group_id.as_deref())
    }

    /// version, inherited from `<parent>` when the project omits it.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref()?.version.as_deref())
    }
}

/// Accumulator for a single dependency being parsed.
#[derive(Default)]
struct DepAccum {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
    optional: Option<String>,
}

impl DepAccum {
    fn set(&mut self, field: &str, text: String) {
        match field {
            "groupId" => self.group_id = Some(text),
            "artifactId" => self.artifact_id = Some(text),
            "version" => self.version = Some(text),
            "scope" => self.scope = Some(text),
            "optional" => self.optional = Some(text),
            _ => {}
        }
    }

    fn finish(self, path: &Path, index: usize) -> Result<RawDependency> {
        let missing = |field: &str| MavenError::ParseError {
            path: path.to_path_buf(),
            message: format!("dependency #{index} has no <{field}>"),
        };
        let group_id = non_empty(self.group_id).ok_or_else(|| missing("groupId"))?;
        let artifact_id = non_empty(self.artifact_id).ok_or_else(|| missing("artifactId"))?;
        Ok(RawDependency {
            group_id,
            artifact_id,
            version: non_empty(self.version),
            scope: non_empty(self.scope),
            optional: non_empty(self.optional),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

const DEPENDENCY: &[&str] = &["project", "dependencies", "dependency"];
const MANAGED_DEPENDENCY: &[&str] = &[
    "project",
    "dependencyManagement",
    "dependencies",
    "dependency",
];

/// Reads and parses the descriptor at `path`.
pub fn read_pom(path: &Path) -> Result<PomDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| MavenError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_pom(&content, path)
}

/// Parses descriptor `content`; `path` is used for error reporting and
/// recorded on the result.
///
/// # Errors
///
/// [`MavenError::ParseError`] for malformed XML, a root element other than
/// `<project>`, or a dependency without `groupId`/`artifactId`.
pub fn parse_pom(content: &str, path: &Path) -> Result<PomDocument> {
    let parse_error = |message: String| MavenError::ParseError {
        path: path.to_path_buf(),
        message,
    };

    let mut doc = PomDocument {
        path: path.to_path_buf(),
        ..PomDocument::default()
    };

    let mut reader = Reader::from_str(content);
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut current_dep: Option<DepAccum> = None;
    let mut saw_project = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| parse_error(e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if stack.is_empty() {
                    if tag != "project" {
                        return Err(parse_error(format!(
                            "root element is <{tag}>, expected <project>"
                        )));
                    }
                    saw_project = true;
                }
                stack.push(tag);
                text.clear();

                if is_dependency(&stack) {
                    current_dep = Some(DepAccum::default());
                } else if stack.len() == 2 && stack[1] == "parent" {
                    doc.parent.get_or_insert_with(ParentRef::default);
                }
            }
            Event::Empty(ref e) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if stack.is_empty() {
                    saw_project |= tag == "project";
                    continue;
                }
                stack.push(tag);
                text.clear();
                if is_dependency(&stack) {
                    return Err(parse_error("empty <dependency> element".into()));
                }
                apply_text(&mut doc, &stack, &mut current_dep, String::new());
                stack.pop();
            }
            Event::Text(ref e) => {
                let chunk = e
                    .decode()
                    .map_err(|err| parse_error(err.to_string()))?;
                text.push_str(&chunk);
            }
            Event::CData(ref e) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::GeneralRef(ref e) => {
                let name = e.decode().map_err(|err| parse_error(err.to_string()))?;
                text.push_str(&resolve_entity(&name).ok_or_else(|| {
                    parse_error(format!("unknown entity '&{name};'"))
                })?);
            }
            Event::End(_) => {
                let value = std::mem::take(&mut text).trim().to_string();

                if is_dependency(&stack) {
                    let finished = current_dep.take().unwrap_or_default();
                    let managed = stack.len() == MANAGED_DEPENDENCY.len();
                    let target = if managed {
                        &mut doc.managed_dependencies
                    } else {
                        &mut doc.dependencies
                    };
                    let index = target.len() + 1;
                    target.push(finished.finish(path, index)?);
                } else {
                    apply_text(&mut doc, &stack, &mut current_dep, value);
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_project {
        return Err(parse_error("missing <project> root element".into()));
    }

    tracing::debug!(
        "parsed {}: {} dependencies, {} managed, {} properties",
        path.display(),
        doc.dependencies.len(),
        doc.managed_dependencies.len(),
        doc.properties.len()
    );

    Ok(doc)
}

fn is_dependency(stack: &[String]) -> bool {
    path_is(stack, DEPENDENCY) || path_is(stack, MANAGED_DEPENDENCY)
}

fn path_is(stack: &[String], expected: &[&str]) -> bool {
    stack.len() == expected.len() && stack.iter().zip(expected).all(|(a, b)| a == b)
}

/// Stores the text of the leaf element at the top of `stack`.
fn apply_text(
    doc: &mut PomDocument,
    stack: &[String],
    current_dep: &mut Option<DepAccum>,
    value: String,
) {
    let Some((leaf, parents)) = stack.split_last() else {
        return;
    };

    if let Some(dep) = current_dep.as_mut() {
        if is_dependency(parents) {
            dep.set(leaf, value);
        }
        return;
    }

    let parents: Vec<&str> = parents.iter().map(String::as_str).collect();
    match parents.as_slice() {
        ["project"] => match leaf.as_str() {
            "groupId" => doc.group_id = non_empty(Some(value)),
            "artifactId" => doc.artifact_id = non_empty(Some(value)),
            "version" => doc.version = non_empty(Some(value)),
            _ => {}
        },
        ["project", "properties"] => doc.properties.push((leaf.clone(), value)),
        ["project", "parent"] => {
            let parent = doc.parent.get_or_insert_with(ParentRef::default);
            match leaf.as_str() {
                "groupId" => parent.group_id = non_empty(Some(value)),
                "artifactId" => parent.artifact_id = non_empty(Some(value)),
                "version" => parent.version = non_empty(Some(value)),
                "relativePath" => parent.relative_path = Some(value),
                _ => {}
            }
        }
        _ => {}
    }
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        _ => return None,
    };
    Some(resolved.to_string())
}
