// tests/pin.rs

//! Pinning against real git repositories.
//!
//! These tests drive the actual git binary; they skip themselves on hosts
//! where git is not installed.

use planex::pin::{git_describe, git_rev_hash, git_tag, hg_describe, hg_rev_hash, hg_tag};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn git_in(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// One-commit repository with identity configured locally
fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = dir.path();
    std::fs::write(repo.join("dummy"), "Hello, world!").unwrap();
    git_in(repo, &["init"]);
    git_in(repo, &["config", "user.email", "you@example.com"]);
    git_in(repo, &["config", "user.name", "Your Name"]);
    git_in(repo, &["add", "dummy"]);
    git_in(repo, &["commit", "-m", "Initial commit"]);
    dir
}

#[test]
fn test_tag_creates_tag() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = init_repo();
    git_tag(dir.path(), "my-tag").unwrap();
    let tags = git_in(dir.path(), &["tag"]);
    assert_eq!(tags.split_whitespace().collect::<Vec<_>>(), ["my-tag"]);
}

#[test]
fn test_tag_same_commit_twice_is_ok() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = init_repo();
    git_tag(dir.path(), "my-tag").unwrap();
    git_tag(dir.path(), "my-tag").unwrap();
}

#[test]
fn test_tag_elsewhere_is_an_error() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = init_repo();
    git_tag(dir.path(), "my-tag").unwrap();
    git_in(
        dir.path(),
        &["commit", "--allow-empty", "-m", "Extra commit"],
    );
    assert!(git_tag(dir.path(), "my-tag").is_err());
}

#[test]
fn test_describe_walks_tag_history() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = init_repo();
    let repo = dir.path();

    for tag in ["0.0", "0.1", "0.2"] {
        git_tag(repo, tag).unwrap();
        assert_eq!(git_describe(repo).unwrap(), tag);
        for distance in 1..3 {
            git_in(repo, &["commit", "--allow-empty", "-m", "Extra commit"]);
            let sha = git_in(repo, &["rev-parse", "HEAD"]);
            let short = &sha.trim()[..7];
            assert_eq!(
                git_describe(repo).unwrap(),
                format!("{}+{}+g{}", tag, distance, short)
            );
        }
    }
}

fn hg_available() -> bool {
    Command::new("hg")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn hg_in(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("hg")
        .arg("-R")
        .arg(repo)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "hg {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// One-commit mercurial repository with identity configured locally
fn init_hg_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = dir.path();
    let status = Command::new("hg").arg("init").arg(repo).status().unwrap();
    assert!(status.success());
    std::fs::write(
        repo.join(".hg/hgrc"),
        "[ui]\nusername = Your Name <you@example.com>\n",
    )
    .unwrap();
    std::fs::write(repo.join("dummy"), "Hello, world!").unwrap();
    hg_in(repo, &["add", "dummy"]);
    hg_in(repo, &["commit", "-m", "Initial commit"]);
    dir
}

#[test]
fn test_hg_tag_commits_a_tag_changeset() {
    if !hg_available() {
        eprintln!("hg not available, skipping");
        return;
    }
    let dir = init_hg_repo();
    let repo = dir.path();

    hg_tag(repo, "0.1").unwrap();

    // The tag lands as its own changeset, so the working copy parent is
    // one commit past the tagged one
    let short = hg_in(repo, &["log", "-r", ".", "--template", "{node|short}"]);
    assert_eq!(
        hg_describe(repo).unwrap(),
        format!("0.1+1+g{}", short.trim())
    );
}

#[test]
fn test_hg_rev_hash_matches_hg() {
    if !hg_available() {
        eprintln!("hg not available, skipping");
        return;
    }
    let dir = init_hg_repo();
    let expected = hg_in(dir.path(), &["log", "-r", ".", "--template", "{node}"]);
    assert_eq!(hg_rev_hash(dir.path()).unwrap(), expected.trim());
}

#[test]
fn test_rev_hash_matches_git() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = init_repo();
    let expected = git_in(dir.path(), &["rev-parse", "HEAD"]);
    assert_eq!(git_rev_hash(dir.path()).unwrap(), expected.trim());
}
