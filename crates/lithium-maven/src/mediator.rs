//! Collapses a dependency graph into the concrete dependency list.

use crate::graph::DependencyGraph;
use crate::types::{Coordinate, MavenScope, Origin, ResolutionWarning};
use std::path::PathBuf;

/// Which declarations survive mediation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediationOptions {
    pub excluded_scopes: Vec<MavenScope>,
    pub ignore_optional: bool,
}

impl MediationOptions {
    /// Whether a dependency with this scope and optional flag is kept.
    pub fn admits(&self, scope: MavenScope, optional: bool) -> bool {
        !self.excluded_scopes.contains(&scope) && !(optional && self.ignore_optional)
    }
}

/// A declaration that made it through mediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediatedDependency {
    pub coordinate: Coordinate,
    pub scope: MavenScope,
    pub optional: bool,
    pub source: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct Mediation {
    pub dependencies: Vec<MediatedDependency>,
    pub warnings: Vec<ResolutionWarning>,
}

/// Filters `graph` down to the dependencies to materialize.
///
/// Drops management-only entries, excluded scopes, optional entries when
/// `ignore_optional` is set, and entries without a resolved version (those
/// are reported). Graph order is preserved and keys stay unique.
pub fn mediate(graph: &DependencyGraph, options: &MediationOptions) -> Mediation {
    let mut mediation = Mediation::default();

    for decl in graph.iter() {
        if decl.origin == Origin::Management {
            continue;
        }
        if !options.admits(decl.scope(), decl.is_optional()) {
            tracing::debug!("skipping {} ({} scope)", decl.key, decl.scope());
            continue;
        }

        let Some(coordinate) = decl.coordinate() else {
            tracing::warn!(
                "dependency {} in {} has no resolvable version",
                decl.key,
                decl.source.display()
            );
            mediation.warnings.push(ResolutionWarning::UnresolvedVersion {
                key: decl.key.clone(),
                source: decl.source.clone(),
            });
            continue;
        };

        mediation.dependencies.push(MediatedDependency {
            coordinate,
            scope: decl.scope(),
            optional: decl.is_optional(),
            source: decl.source.clone(),
        });
    }

    tracing::debug!(
        "mediated {} of {} graph entries",
        mediation.dependencies.len(),
        graph.len()
    );
    mediation
}
