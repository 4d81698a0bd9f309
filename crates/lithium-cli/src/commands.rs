//! Subcommand implementations.

use crate::cli::{ClasspathArgs, ClasspathSource};
use lithium_classpath::{Classpath, SearchCache, SearchMatch};
use lithium_core::{LithiumConfig, Result};
use lithium_maven::{ArtifactLocator, ResolveOptions, Resolver};
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

/// Resolves the project descriptor, writes the classpath file and prints the
/// joined classpath. Fails with a non-zero exit when any artifact is missing.
pub async fn classpath(
    project: &Path,
    config: &LithiumConfig,
    args: &ClasspathArgs,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let pom = match args.pom {
        Some(ref pom) => config.resolve_path(project, pom),
        None => project.join("pom.xml"),
    };

    let resolver = Resolver::new(
        ArtifactLocator::from_config(config)?,
        ResolveOptions::from_config(config),
    );
    let resolution = resolver.resolve(&pom).await?;

    if !resolution.is_complete() {
        for missing in &resolution.missing {
            tracing::error!(
                "missing artifact {} (expected at {})",
                missing.coordinate,
                missing.expected.display()
            );
        }
        return Ok(ExitCode::FAILURE);
    }

    let classpath: Classpath = resolution.jar_paths().into_iter().collect();
    let output = match args.output {
        Some(ref output) => config.resolve_path(project, output),
        None => config.resolve_path(project, &config.classpath_file),
    };
    classpath.write_file(&output)?;
    tracing::info!("classpath written to {}", output.display());

    writeln!(out, "{}", classpath.join())?;
    Ok(ExitCode::SUCCESS)
}

pub fn find(
    project: &Path,
    config: &LithiumConfig,
    source: &ClasspathSource,
    pattern: &str,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let classpath = search_classpath(project, config, source)?;
    let mut cache = SearchCache::load(config.resolve_path(project, &config.search_cache));
    let found = cache.find(&classpath, pattern)?;
    report(&found, pattern, out)
}

pub fn find_class(
    project: &Path,
    config: &LithiumConfig,
    source: &ClasspathSource,
    name: &str,
    out: &mut impl Write,
) -> Result<ExitCode> {
    let classpath = search_classpath(project, config, source)?;
    let mut cache = SearchCache::load(config.resolve_path(project, &config.search_cache));
    let found = cache.find_class(&classpath, name)?;
    report(&found, name, out)
}

/// The explicit `--classpath`, or the project's default roots followed by
/// the entries of its classpath file.
fn search_classpath(
    project: &Path,
    config: &LithiumConfig,
    source: &ClasspathSource,
) -> Result<Classpath> {
    if let Some(ref joined) = source.classpath {
        return Ok(Classpath::parse(joined));
    }

    let mut classpath = Classpath::default_roots(project)?;
    let file = config.resolve_path(project, &config.classpath_file);
    if file.is_file() {
        classpath.extend_from(&Classpath::read_file(&file, project)?);
    }
    if classpath.is_empty() {
        tracing::warn!("classpath of {} is empty", project.display());
    }
    Ok(classpath)
}

fn report(found: &[SearchMatch], target: &str, out: &mut impl Write) -> Result<ExitCode> {
    if found.is_empty() {
        tracing::warn!("no entry for '{}' found", target);
    }
    for m in found {
        writeln!(out, "{} => {}", m.root.display(), m.entry)?;
    }
    Ok(ExitCode::SUCCESS)
}
