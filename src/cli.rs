// src/cli.rs

//! CLI definitions for planex
//!
//! Two flows share one binary:
//! - `clone` - fetch the VCS repositories referenced by spec templates
//! - `configure` - stage specs and sources into the build root, pinning
//!   template sources and optionally building SRPMs
//!
//! The command implementations are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "planex")]
#[command(author = "Planex Contributors")]
#[command(version)]
#[command(about = "Prepare source packages from RPM spec files and templates", long_about = None)]
pub struct Cli {
    /// Only print errors
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the repositories referenced by spec templates
    Clone(CloneArgs),
    /// Stage specs and sources into the build root
    Configure(ConfigureArgs),
}

#[derive(Args)]
pub struct CloneArgs {
    /// Configuration directory
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Path (relative to config_dir) to the SPECS directory containing
    /// spec templates
    #[arg(long, default_value = "SPECS")]
    pub specs_path: String,

    /// Local path under which the repositories are checked out
    #[arg(long, default_value = "repos")]
    pub repos_path: PathBuf,

    /// Local repository mirror directory. For a git url
    /// "git://host.com/some/path.git" the mirror should contain
    /// <repos_mirror_path>/host.com/some/path.git
    #[arg(long, default_value = "")]
    pub repos_mirror_path: String,

    /// Only print sources, do not clone them
    #[arg(long)]
    pub print_only: bool,

    /// Do not execute commands, just print them
    #[arg(long)]
    pub dry_run: bool,

    /// Exit non-zero if any clone command fails
    #[arg(long)]
    pub strict: bool,

    /// Don't check that package names match spec file names
    #[arg(long)]
    pub no_package_name_check: bool,
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Configuration directory
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Path (relative to config_dir) to the SPECS directory containing
    /// spec files to be preprocessed as well as those simply to be built
    #[arg(long, default_value = "SPECS")]
    pub specs_path: String,

    /// Path (relative to config_dir) to the SOURCES directory containing
    /// patches and extra sources
    #[arg(long, default_value = "SOURCES")]
    pub sources_path: String,

    /// Local path to the repositories
    #[arg(long, default_value = "repos")]
    pub repos_path: PathBuf,

    /// Local repository mirror directory, consulted before the network
    #[arg(long, default_value = "")]
    pub repos_mirror_path: String,

    /// Rewrite archive URLs to point to this destination
    #[arg(long, default_value = "")]
    pub mirror_path: String,

    /// Root of the staging tree (SPECS, SOURCES, SRPMS, RPMS)
    #[arg(long, default_value = ".")]
    pub build_root: PathBuf,

    /// Hash algorithm for SRPM reconciliation
    #[arg(long = "hash", default_value = "md5")]
    pub hash_algorithm: String,

    /// Build SRPMs after staging
    #[arg(long)]
    pub build_srpms: bool,

    /// Do not execute commands, just print them
    #[arg(long)]
    pub dry_run: bool,

    /// Don't check that package names match spec file names
    #[arg(long)]
    pub no_package_name_check: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_defaults() {
        let cli = Cli::try_parse_from(["planex", "clone"]).unwrap();
        let Commands::Clone(args) = cli.command else {
            panic!("expected clone");
        };
        assert_eq!(args.config_dir, PathBuf::from("."));
        assert_eq!(args.specs_path, "SPECS");
        assert_eq!(args.repos_path, PathBuf::from("repos"));
        assert!(!args.print_only);
        assert!(!args.dry_run);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_clone_flags() {
        let cli = Cli::try_parse_from([
            "planex",
            "clone",
            "--dry-run",
            "--print-only",
            "--quiet",
            "--repos-path",
            "/foo",
        ])
        .unwrap();
        let Commands::Clone(args) = cli.command else {
            panic!("expected clone");
        };
        assert!(args.dry_run);
        assert!(args.print_only);
        assert!(cli.quiet);
        assert_eq!(args.repos_path, PathBuf::from("/foo"));
    }

    #[test]
    fn test_configure_defaults() {
        let cli = Cli::try_parse_from(["planex", "configure"]).unwrap();
        let Commands::Configure(args) = cli.command else {
            panic!("expected configure");
        };
        assert_eq!(args.sources_path, "SOURCES");
        assert_eq!(args.hash_algorithm, "md5");
        assert!(!args.build_srpms);
        assert!(!args.no_package_name_check);
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["planex"]).is_err());
    }
}
