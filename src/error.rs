// src/error.rs

//! Error types for source package preparation

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing source packages
#[derive(Error, Debug)]
pub enum Error {
    /// Spec file name does not match the package it declares
    #[error("spec file name '{spec_path}' does not match package name '{package_name}'")]
    SpecNameMismatch {
        spec_path: String,
        package_name: String,
    },

    /// Spec file is missing a required field or is otherwise malformed
    #[error("invalid spec: {0}")]
    SpecValidation(String),

    /// Source line could not be turned into a typed source
    #[error("cannot resolve source: {0}")]
    SourceResolution(String),

    /// A git or mercurial invocation exited non-zero
    #[error("VCS command failed: {command}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    VcsCommandFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// Download or copy of a source failed
    #[error("fetch failed: {command}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    FetchFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// An external build command exited non-zero
    #[error("command failed: {command}\nstdout:\n{stdout}\nstderr:\n{stderr}")]
    CommandFailed {
        command: String,
        stdout: String,
        stderr: String,
    },

    /// A pin was requested before the repository was cloned.
    ///
    /// Distinct from a fetch failure: it means the clone step was skipped,
    /// not that the network or remote is at fault.
    #[error("no repository at {0}: has the clone step been run?")]
    MissingRepository(PathBuf),

    /// Template rewriting hit a placeholder with no known substitution
    #[error("template error: {0}")]
    Template(String),

    /// Unrecognized hash algorithm name
    #[error("unknown hash algorithm: {0} (supported: md5, sha256)")]
    UnknownHashAlgorithm(String),

    /// One or more commands in a batch run failed
    #[error("{failed} of {total} commands failed")]
    BatchFailures { failed: usize, total: usize },

    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
