// src/srpm.rs

//! SRPM building and hash reconciliation
//!
//! Before rebuilding a source package the staged spec and source files are
//! hashed and compared against the digests embedded in any existing SRPM
//! for the same package. An exact match keeps the artifact and skips the
//! build; any mismatch removes the stale SRPM and forces a rebuild. This
//! is the only caching the pipeline does and it is deliberately exact.

use crate::config::BuildRoot;
use crate::error::{Error, Result};
use crate::executor::{shell_join, Executor};
use crate::spec::name_from_spec;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Check existing SRPMs for `spec_path` against the current file hashes.
///
/// Stale SRPMs (wrong hash for any embedded file) are deleted. Returns
/// true when at least one existing SRPM matches exactly.
pub fn existing_srpm_ok(
    hashes: &BTreeMap<String, String>,
    spec_path: &Path,
    srpms_dir: &Path,
    executor: &dyn Executor,
) -> Result<bool> {
    let package_name = name_from_spec(spec_path)?;
    let pattern = srpms_dir
        .join(format!("{}-*.src.rpm", package_name))
        .display()
        .to_string();

    let mut one_correct = false;
    for srpm in (glob::glob(&pattern).map_err(|e| Error::SpecValidation(e.to_string()))?).flatten()
    {
        let srpm_str = srpm.display().to_string();

        // The glob may catch SRPMs of packages sharing a name prefix;
        // confirm with rpm before judging hashes.
        let query = vec![
            "rpm".to_string(),
            "-qp".to_string(),
            srpm_str.clone(),
            "--qf".to_string(),
            "%{name}".to_string(),
        ];
        let result = executor.run(&query);
        if !result.success() || result.stdout.trim() != package_name {
            continue;
        }

        if srpm_matches_hashes(&srpm_str, hashes, executor) {
            one_correct = true;
        } else {
            warn!("removing SRPM '{}' (hash mismatch with desired)", srpm_str);
            std::fs::remove_file(&srpm)?;
        }
    }
    Ok(one_correct)
}

/// Compare every file embedded in an SRPM against the current hashes
fn srpm_matches_hashes(
    srpm: &str,
    hashes: &BTreeMap<String, String>,
    executor: &dyn Executor,
) -> bool {
    let dump = vec![
        "rpm".to_string(),
        "--dump".to_string(),
        "-qp".to_string(),
        srpm.to_string(),
    ];
    let result = executor.run(&dump);
    if !result.success() {
        return false;
    }

    // rpm --dump: path size mtime digest ... per line
    for line in result.stdout.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let (Some(path), Some(digest)) = (fields.first(), fields.get(3)) else {
            continue;
        };
        let basename = path.rsplit('/').next().unwrap_or(path);
        if hashes.get(basename).map(|h| h.as_str()) != Some(*digest) {
            debug!("{}: {} differs from staged copy", srpm, basename);
            return false;
        }
    }
    true
}

/// Build the SRPM for `spec_path` unless a matching one already exists.
///
/// Returns true when a build was run (the "rebuilt" count), false when the
/// existing artifact was kept.
pub fn build_srpm(
    hashes: &BTreeMap<String, String>,
    spec_path: &Path,
    build_root: &BuildRoot,
    executor: &dyn Executor,
) -> Result<bool> {
    if existing_srpm_ok(hashes, spec_path, &build_root.srpms_dir(), executor)? {
        debug!("{}: existing SRPM is up to date", spec_path.display());
        return Ok(false);
    }

    let command = vec![
        "rpmbuild".to_string(),
        "-bs".to_string(),
        spec_path.display().to_string(),
        "--nodeps".to_string(),
        "--define".to_string(),
        format!("_topdir {}", build_root.root().display()),
    ];
    let result = executor.run(&command);
    if !result.success() {
        return Err(Error::CommandFailed {
            command: shell_join(&command),
            stdout: result.stdout,
            stderr: result.stderr,
        });
    }
    Ok(true)
}
