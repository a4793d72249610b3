// src/commands/configure.rs
//! `planex configure`: stage specs and sources into the build root
//!
//! The flow walks the SPECS directory once. Concrete `.spec` files are
//! copied into the build root verbatim; `.spec.in` templates have their
//! version-control sources pinned against the local checkouts and are
//! rewritten into concrete specs. With `--build-srpms` the staged specs
//! are then turned into source packages, reusing any existing SRPM whose
//! embedded file hashes still match the staged tree.

use crate::cli::ConfigureArgs;
use crate::config::{BuildRoot, Config};
use crate::error::{Error, Result};
use crate::executor::{shell_join, Executor, PrintExecutor, RealExecutor};
use crate::hash::hash_dir_files;
use crate::manifest::Manifest;
use crate::sources::{rewrite_url, Source};
use crate::spec::{Spec, SpecOptions};
use crate::srpm::build_srpm;
use crate::template;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Sentinel first line of a Makefile planex owns and may overwrite
const MAKEFILE_GUARD: &str = "# Autogenerated by planex. Do not edit!";

const MAKEFILE_COMMON: &str = include_str!("../../resources/Makefile.common");

pub fn run(args: &ConfigureArgs) -> Result<Manifest> {
    let config = Config {
        config_dir: args.config_dir.clone(),
        specs_path: args.specs_path.clone(),
        sources_path: args.sources_path.clone(),
        repos_path: args.repos_path.clone(),
        repos_mirror_path: args.repos_mirror_path.clone(),
        mirror_path: args.mirror_path.clone(),
        check_package_name: !args.no_package_name_check,
        hash_algorithm: args.hash_algorithm.parse()?,
    };
    let build_root = BuildRoot::new(args.build_root.clone());
    let executor: Box<dyn Executor> = if args.dry_run {
        Box::new(PrintExecutor)
    } else {
        Box::new(RealExecutor)
    };

    stage_makefile(build_root.root())?;
    prepare_build_root(&build_root, executor.as_ref())?;
    copy_patches(&config, &build_root)?;
    let manifest = stage_specs(&config, &build_root)?;

    if args.build_srpms {
        build_srpms(&config, &build_root, executor.as_ref())?;
    }

    println!("---------------------------------------");
    println!("MANIFEST");
    print!("{}", manifest);
    Ok(manifest)
}

/// Write the driver Makefile unless the user supplied their own.
///
/// Ownership is decided by the guard comment on the first line; a
/// Makefile without it is never touched.
fn stage_makefile(root: &Path) -> Result<()> {
    let path = root.join("Makefile");
    if let Ok(existing) = fs::read_to_string(&path) {
        if !existing.starts_with(MAKEFILE_GUARD) {
            info!("{}: not overwriting user Makefile", path.display());
            return Ok(());
        }
    }

    let mut contents = String::new();
    contents.push_str(MAKEFILE_GUARD);
    contents.push('\n');
    contents.push_str("DIST := .el6\n");
    contents.push_str("all : rpms\n");
    contents.push_str(MAKEFILE_COMMON);
    fs::write(&path, contents)?;
    Ok(())
}

/// Reset SPECS and make sure the rest of the staging tree exists.
///
/// SPECS is recreated from scratch each run so stale specs from removed
/// templates cannot linger. RPMS gets repository metadata so the build
/// can resolve packages produced by earlier runs; a missing createrepo
/// only degrades that, so it is not fatal.
fn prepare_build_root(build_root: &BuildRoot, executor: &dyn Executor) -> Result<()> {
    let specs = build_root.specs_dir();
    if specs.is_dir() {
        fs::remove_dir_all(&specs)?;
    }
    fs::create_dir_all(&specs)?;
    for dir in [
        build_root.sources_dir(),
        build_root.srpms_dir(),
        build_root.rpms_dir(),
    ] {
        fs::create_dir_all(dir)?;
    }

    let command = vec![
        "createrepo".to_string(),
        build_root.rpms_dir().display().to_string(),
    ];
    let result = executor.run(&command);
    if !result.success() {
        warn!(
            "'{}' failed: {}",
            shell_join(&command),
            result.stderr.trim_end()
        );
    }
    Ok(())
}

/// Copy patches and extra sources into the build root's SOURCES directory
fn copy_patches(config: &Config, build_root: &BuildRoot) -> Result<()> {
    let sources_dir = config.sources_dir();
    if !sources_dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(&sources_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        fs::copy(entry.path(), build_root.sources_dir().join(entry.file_name()))?;
    }
    Ok(())
}

/// Stage every spec and template from the SPECS directory.
///
/// Returns the manifest of repository pins made while rewriting the
/// templates. A spec that fails validation is reported and skipped;
/// a missing repository aborts the run since every template after it
/// would fail the same way.
fn stage_specs(config: &Config, build_root: &BuildRoot) -> Result<Manifest> {
    let out_dir = build_root.specs_dir();

    for path in sorted_glob(&config.specs_dir().join("*.spec"))? {
        let basename = file_name(&path)?;
        info!("Fetching sources for '{}'", basename);
        fs::copy(&path, out_dir.join(&basename))?;
    }

    let mut manifest = Manifest::new();
    for path in sorted_glob(&config.specs_dir().join("*.spec.in"))? {
        let basename = file_name(&path)?;
        info!("Configuring and fetching sources for '{}'", basename);
        match stage_template(&path, config, build_root, &mut manifest) {
            Ok(()) => {}
            Err(err @ Error::MissingRepository(_)) => return Err(err),
            Err(err) => error!("{}: {}", basename, err),
        }
    }
    Ok(manifest)
}

/// Pin a single template's version-control sources and rewrite it
fn stage_template(
    path: &Path,
    config: &Config,
    build_root: &BuildRoot,
    manifest: &mut Manifest,
) -> Result<()> {
    let options = SpecOptions::new().check_package_name(config.check_package_name);
    let spec = Spec::load(path, options)?;

    let mut pinned = Vec::new();
    let mut mapping = HashMap::new();
    for url in spec.source_urls() {
        let source = Source::classify(url, config)?;
        if let Some(pin) = source.pin()? {
            info!("  {} -> {}", pin.orig_url, pin.extended_url);
            manifest.insert(pin.repo_name.clone(), pin.scm_hash.clone());
            mapping.insert(pin.orig_url.clone(), pin.extended_url.clone());
            pinned.push(pin);
        }
    }

    template::rewrite(path, &build_root.specs_dir(), &pinned, &mapping)?;
    Ok(())
}

/// Fetch sources and build SRPMs for every staged spec
fn build_srpms(config: &Config, build_root: &BuildRoot, executor: &dyn Executor) -> Result<()> {
    info!("Building/checking SRPMS for all files in the SPECS directory");
    let hashes = hash_dir_files(
        config.hash_algorithm,
        &[build_root.specs_dir(), build_root.sources_dir()],
    )?;

    let specs = sorted_glob(&build_root.specs_dir().join("*.spec"))?;
    let total = specs.len();
    let mut rebuilt = 0usize;
    for spec_path in &specs {
        fetch_sources(spec_path, config, build_root, executor)?;
        if build_srpm(&hashes, spec_path, build_root, executor)? {
            rebuilt += 1;
        }
    }
    info!("Rebuilt {} out of {} SRPMS", rebuilt, total);
    Ok(())
}

/// Make sure every source of a staged spec is present in SOURCES
fn fetch_sources(
    spec_path: &Path,
    config: &Config,
    build_root: &BuildRoot,
    executor: &dyn Executor,
) -> Result<()> {
    let options = SpecOptions::new().check_package_name(config.check_package_name);
    let spec = Spec::load(spec_path, options)?;
    if spec.source_urls().is_empty() {
        return Err(Error::SpecValidation(format!(
            "no sources defined in {}",
            spec_path.display()
        )));
    }
    for url in spec.source_urls() {
        let rewritten = rewrite_url(url, &config.mirror_path);
        let source = Source::classify(&rewritten, config)?;
        source.archive(executor, &build_root.sources_dir())?;
    }
    Ok(())
}

fn sorted_glob(pattern: &Path) -> Result<Vec<PathBuf>> {
    let pattern = pattern.display().to_string();
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| Error::SpecValidation(e.to_string()))?
        .flatten()
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::SpecValidation(format!("bad path {}", path.display())))
}
