// src/pin.rs

//! Version pinning for git and mercurial working copies
//!
//! A pin is a deterministic (version, hash) pair derived from repository
//! state. The version comes from tag history: exactly at a tag it is the
//! tag itself, otherwise `<tag>+<distance>+g<short-hash>`. Re-running on an
//! unchanged repository always produces the same pin; any new commit
//! changes it.

use crate::error::{Error, Result};
use crate::executor::{shell_join, ExecutionResult, Executor, RealExecutor};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// git describe renders distance and short hash as "<tag>-<n>-g<hash>"
static GIT_DESCRIBE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)-(\d+)-g([0-9a-f]+)$").expect("static regex"));

/// Run a VCS command, turning a non-zero exit into `VcsCommandFailed`
fn run_vcs(command: &[String]) -> Result<ExecutionResult> {
    let result = RealExecutor.run(command);
    if result.success() {
        Ok(result)
    } else {
        Err(Error::VcsCommandFailed {
            command: shell_join(command),
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}

fn git(repo: &Path, args: &[&str]) -> Vec<String> {
    let mut command = vec![
        "git".to_string(),
        "-C".to_string(),
        repo.display().to_string(),
    ];
    command.extend(args.iter().map(|s| s.to_string()));
    command
}

fn hg(repo: &Path, args: &[&str]) -> Vec<String> {
    let mut command = vec![
        "hg".to_string(),
        "-R".to_string(),
        repo.display().to_string(),
    ];
    command.extend(args.iter().map(|s| s.to_string()));
    command
}

/// Tag the current git commit.
///
/// Atomic from the caller's perspective: afterwards the tag either exists
/// at the tip or an error was raised. Re-tagging the same commit with the
/// same name is accepted; a tag that already exists elsewhere is an error.
pub fn git_tag(repo: &Path, tagname: &str) -> Result<()> {
    match run_vcs(&git(repo, &["tag", tagname])) {
        Ok(_) => Ok(()),
        Err(err) => {
            let existing = run_vcs(&git(repo, &["rev-parse", &format!("refs/tags/{}", tagname)]));
            let head = run_vcs(&git(repo, &["rev-parse", "HEAD"]));
            match (existing, head) {
                (Ok(tag_rev), Ok(head_rev)) if tag_rev.stdout == head_rev.stdout => Ok(()),
                _ => Err(err),
            }
        }
    }
}

/// Derive a version string from git tag history.
///
/// Returns `<tag>` when the working copy is exactly at a tag, otherwise
/// `<tag>+<distance>+g<short-hash>`.
pub fn git_describe(repo: &Path) -> Result<String> {
    let result = run_vcs(&git(repo, &["describe", "--tags"]))?;
    let described = result.stdout.trim();
    match GIT_DESCRIBE_RE.captures(described) {
        Some(caps) => Ok(format!("{}+{}+g{}", &caps[1], &caps[2], &caps[3])),
        None => Ok(described.to_string()),
    }
}

/// Full commit hash of the git working copy tip
pub fn git_rev_hash(repo: &Path) -> Result<String> {
    let result = run_vcs(&git(repo, &["rev-parse", "HEAD"]))?;
    Ok(result.stdout.trim().to_string())
}

/// Tag the working copy parent of a mercurial repository.
///
/// Unlike git, mercurial records the tag as a new changeset on top of
/// the tagged one, so [`hg_describe`] right after tagging reports
/// distance 1 from the tag rather than the tag itself.
pub fn hg_tag(repo: &Path, tagname: &str) -> Result<()> {
    run_vcs(&hg(repo, &["tag", "-r", ".", tagname]))?;
    Ok(())
}

/// Derive a version string from mercurial tag history, in the same
/// `<tag>` / `<tag>+<distance>+g<short-hash>` shape as [`git_describe`]
pub fn hg_describe(repo: &Path) -> Result<String> {
    let result = run_vcs(&hg(repo, &[
        "log",
        "-r",
        ".",
        "--template",
        "{latesttag} {latesttagdistance} {node|short}",
    ]))?;
    let output = result.stdout.trim().to_string();
    let fields: Vec<&str> = output.split_whitespace().collect();
    let [tag, distance, short] = fields.as_slice() else {
        return Err(Error::VcsCommandFailed {
            command: format!("hg log -r . (in {})", repo.display()),
            stdout: output,
            stderr: "unexpected describe output".to_string(),
        });
    };
    if *distance == "0" {
        Ok((*tag).to_string())
    } else {
        Ok(format!("{}+{}+g{}", tag, distance, short))
    }
}

/// Full changeset hash of the mercurial working copy parent
pub fn hg_rev_hash(repo: &Path) -> Result<String> {
    let result = run_vcs(&hg(repo, &["log", "-r", ".", "--template", "{node}"]))?;
    Ok(result.stdout.trim().to_string())
}
