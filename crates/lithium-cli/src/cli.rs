//! Command-line arguments.

use crate::commands;
use clap::{Args, Parser, Subcommand};
use lithium_core::{LithiumConfig, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "lithium",
    about = "Resolve Maven classpaths and search them for classes and resources",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory; defaults to the current directory.
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    /// Log debug output to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve pom.xml into a classpath, print it and write the classpath file.
    Classpath(ClasspathArgs),

    /// Find files or archive entries matching a glob pattern.
    Find {
        pattern: String,
        #[command(flatten)]
        source: ClasspathSource,
    },

    /// Find the class file of a class (`com.acme.Widget`).
    FindClass {
        name: String,
        #[command(flatten)]
        source: ClasspathSource,
    },
}

#[derive(Args, Debug, Default)]
pub struct ClasspathArgs {
    /// Project descriptor; defaults to `pom.xml` in the project directory.
    #[arg(long, value_name = "FILE")]
    pub pom: Option<PathBuf>,

    /// Scope to leave out; may be repeated.
    #[arg(long = "exclude-scope", value_name = "SCOPE")]
    pub exclude_scopes: Vec<String>,

    #[arg(long)]
    pub ignore_optional: bool,

    /// Never contact the mirror.
    #[arg(long)]
    pub offline: bool,

    /// Do not follow the descriptors of resolved artifacts.
    #[arg(long)]
    pub no_transitive: bool,

    /// Where to write the classpath file.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ClasspathArgs {
    /// Flags override the configuration file; they never switch a setting back.
    pub fn apply(&self, config: &mut LithiumConfig) {
        for scope in &self.exclude_scopes {
            if !config.excluded_scopes.contains(scope) {
                config.excluded_scopes.push(scope.clone());
            }
        }
        config.ignore_optional |= self.ignore_optional;
        config.offline |= self.offline;
        config.transitive &= !self.no_transitive;
    }
}

#[derive(Args, Debug, Default)]
pub struct ClasspathSource {
    /// Classpath to search, joined with the platform separator. Defaults to
    /// the project's `classes`, `lib/*.jar` and classpath file.
    #[arg(long, value_name = "CP")]
    pub classpath: Option<String>,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub const fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// Runs the command, printing its result to `out`.
    pub async fn execute(self, out: &mut impl Write) -> Result<ExitCode> {
        let project = match self.project {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let mut config = LithiumConfig::load(&project)?;
        if let Some(repo) = config.local_repository.take() {
            config.local_repository = Some(config.resolve_path(&project, &repo));
        }

        match self.command {
            Commands::Classpath(args) => {
                args.apply(&mut config);
                commands::classpath(&project, &config, &args, out).await
            }
            Commands::Find { pattern, source } => {
                commands::find(&project, &config, &source, &pattern, out)
            }
            Commands::FindClass { name, source } => {
                commands::find_class(&project, &config, &source, &name, out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classpath_flags() {
        let cli = Cli::try_parse_from([
            "lithium",
            "classpath",
            "--pom",
            "app/pom.xml",
            "--exclude-scope",
            "test",
            "--exclude-scope",
            "provided",
            "--offline",
            "--no-transitive",
        ])
        .unwrap();

        let Commands::Classpath(args) = cli.command else {
            panic!("expected classpath command");
        };
        assert_eq!(args.pom, Some(PathBuf::from("app/pom.xml")));
        assert_eq!(args.exclude_scopes, vec!["test", "provided"]);
        assert!(args.offline);
        assert!(args.no_transitive);
        assert!(!args.ignore_optional);
    }

    #[test]
    fn test_parse_find_class() {
        let cli = Cli::try_parse_from([
            "lithium",
            "-C",
            "/work",
            "find-class",
            "com.acme.Widget",
            "--classpath",
            "/lib/a.jar",
        ])
        .unwrap();

        assert_eq!(cli.project, Some(PathBuf::from("/work")));
        let Commands::FindClass { name, source } = cli.command else {
            panic!("expected find-class command");
        };
        assert_eq!(name, "com.acme.Widget");
        assert_eq!(source.classpath.as_deref(), Some("/lib/a.jar"));
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["lithium"]).is_err());
    }

    #[test]
    fn test_log_level() {
        let quiet = Cli::try_parse_from(["lithium", "find", "*.xml"]).unwrap();
        assert_eq!(quiet.log_level(), "info");
        let verbose = Cli::try_parse_from(["lithium", "find", "*.xml", "-v"]).unwrap();
        assert_eq!(verbose.log_level(), "debug");
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = LithiumConfig {
            excluded_scopes: vec!["test".into()],
            ..LithiumConfig::default()
        };
        let args = ClasspathArgs {
            exclude_scopes: vec!["test".into(), "provided".into()],
            offline: true,
            no_transitive: true,
            ..ClasspathArgs::default()
        };
        args.apply(&mut config);

        assert_eq!(config.excluded_scopes, vec!["test", "provided"]);
        assert!(config.offline);
        assert!(!config.transitive);
        assert!(!config.ignore_optional);
    }
}
