//! Resolution driver: descriptor to located jars.
//!
//! Loads the project descriptor, mediates its graph, then locates every
//! surviving coordinate one after another. With transitive discovery enabled,
//! each located artifact's own descriptor is read and its compile/runtime
//! dependencies are queued behind everything already known.

use crate::error::{MavenError, Result};
use crate::graph::DependencyGraph;
use crate::loader::{PomLoader, builtin_properties, declaration};
use crate::locator::ArtifactLocator;
use crate::mediator::{MediatedDependency, MediationOptions, mediate};
use crate::parser::read_pom;
use crate::property::PropertyTable;
use crate::types::{
    ArtifactKey, Coordinate, Declaration, MavenScope, Origin, ResolutionWarning, ResolvedArtifact,
};
use lithium_core::LithiumConfig;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    pub mediation: MediationOptions,
    /// Follow the descriptors of located artifacts.
    pub transitive: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            mediation: MediationOptions::default(),
            transitive: true,
        }
    }
}

impl ResolveOptions {
    pub fn from_config(config: &LithiumConfig) -> Self {
        let excluded_scopes = config
            .excluded_scopes
            .iter()
            .filter_map(|name| {
                let scope = MavenScope::from_name(name);
                if scope.is_none() {
                    tracing::warn!("ignoring unknown scope '{}' in excluded_scopes", name);
                }
                scope
            })
            .collect();

        Self {
            mediation: MediationOptions {
                excluded_scopes,
                ignore_optional: config.ignore_optional,
            },
            transitive: config.transitive,
        }
    }
}

/// An artifact that is neither local nor fetchable because remote resolution is off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArtifact {
    pub coordinate: Coordinate,
    /// Where the jar was expected in the local repository.
    pub expected: PathBuf,
}

/// Outcome of one resolution run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Located artifacts in resolution order.
    pub artifacts: Vec<ResolvedArtifact>,
    pub missing: Vec<MissingArtifact>,
    pub warnings: Vec<ResolutionWarning>,
}

impl Resolution {
    pub fn jar_paths(&self) -> Vec<PathBuf> {
        self.artifacts.iter().map(|a| a.path.clone()).collect()
    }

    /// True when every mediated artifact was located.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub struct Resolver {
    locator: ArtifactLocator,
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(locator: ArtifactLocator, options: ResolveOptions) -> Self {
        Self { locator, options }
    }

    pub fn locator(&self) -> &ArtifactLocator {
        &self.locator
    }

    /// Resolves the descriptor at `pom` into located jars.
    ///
    /// # Errors
    ///
    /// Fails on a malformed descriptor in the parent chain, a parent cycle,
    /// or a jar the mirror could not deliver. Jars missing while offline are
    /// collected in [`Resolution::missing`] instead.
    pub async fn resolve(&self, pom: &Path) -> Result<Resolution> {
        let (root, mut warnings) = {
            let mut loader = PomLoader::new().with_local_repository(self.locator.repository());
            let node = loader.load(pom)?;
            tracing::debug!("loaded {} descriptor(s)", loader.parsed_count());
            (node, loader.take_warnings())
        };

        let mediation = mediate(&root.graph, &self.options.mediation);
        warnings.extend(mediation.warnings);

        // Keys the project itself declares are never overridden by what an
        // artifact declares, even when mediation dropped them.
        let mut seen: HashSet<ArtifactKey> = root
            .graph
            .iter()
            .filter(|decl| decl.origin == Origin::Direct)
            .map(|decl| decl.key.clone())
            .collect();
        let mut queue: VecDeque<MediatedDependency> = mediation.dependencies.into();

        let mut resolution = Resolution::default();
        while let Some(dependency) = queue.pop_front() {
            match self.locator.locate(&dependency.coordinate).await {
                Ok(path) => {
                    resolution.artifacts.push(ResolvedArtifact {
                        coordinate: dependency.coordinate.clone(),
                        scope: dependency.scope,
                        path,
                    });
                }
                Err(MavenError::ArtifactNotFound { coordinate, path }) => {
                    tracing::warn!("artifact {} not found at {}", coordinate, path.display());
                    resolution.missing.push(MissingArtifact {
                        coordinate,
                        expected: path,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            }

            if !self.options.transitive {
                continue;
            }
            for found in self
                .dependencies_of(&dependency, &root.graph, &mut warnings)
                .await
            {
                if seen.insert(found.coordinate.key()) {
                    queue.push_back(found);
                }
            }
        }

        tracing::info!(
            "resolved {} artifact(s), {} missing, {} warning(s)",
            resolution.artifacts.len(),
            resolution.missing.len(),
            warnings.len()
        );
        resolution.warnings = warnings;
        Ok(resolution)
    }

    /// Dependencies an artifact's own descriptor contributes.
    ///
    /// Only compile and runtime, non-optional entries count. Versions come
    /// from the descriptor itself, falling back to the project's graph.
    async fn dependencies_of(
        &self,
        dependency: &MediatedDependency,
        project: &DependencyGraph,
        warnings: &mut Vec<ResolutionWarning>,
    ) -> Vec<MediatedDependency> {
        let coordinate = &dependency.coordinate;
        let doc = match self.locator.fetch_pom(coordinate).await {
            Ok(path) => read_pom(&path),
            Err(e) => Err(e),
        };
        let doc = match doc {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("descriptor of {} unavailable: {}", coordinate, e);
                warnings.push(ResolutionWarning::PomUnavailable {
                    coordinate: coordinate.clone(),
                    reason: e.to_string(),
                });
                return Vec::new();
            }
        };

        let properties: PropertyTable = builtin_properties(&doc)
            .into_iter()
            .chain(doc.properties.iter().cloned())
            .collect();

        let mut found = Vec::new();
        for raw in &doc.dependencies {
            let Some(decl) = declaration(raw, Origin::Direct, &properties, &doc.path, warnings)
            else {
                continue;
            };
            let scope = decl.scope();
            if !matches!(scope, MavenScope::Compile | MavenScope::Runtime) || decl.is_optional() {
                continue;
            }

            let Some(child) = decl
                .coordinate()
                .or_else(|| project.get(&decl.key).and_then(Declaration::coordinate))
            else {
                tracing::warn!(
                    "dependency {} of {} has no resolvable version",
                    decl.key,
                    coordinate
                );
                warnings.push(ResolutionWarning::UnresolvedVersion {
                    key: decl.key,
                    source: doc.path.clone(),
                });
                continue;
            };

            // runtime-only parents keep their children at runtime
            let scope = if dependency.scope == MavenScope::Compile {
                scope
            } else {
                dependency.scope
            };
            if !self.options.mediation.admits(scope, false) {
                continue;
            }

            found.push(MediatedDependency {
                coordinate: child,
                scope,
                optional: false,
                source: doc.path.clone(),
            });
        }

        tracing::debug!("{} contributes {} dependencies", coordinate, found.len());
        found
    }
}
