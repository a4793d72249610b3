// src/lib.rs

//! Planex source preparation pipeline
//!
//! Turns a directory of RPM spec files and `.spec.in` templates into a
//! buildable source tree:
//!
//! - `clone` checks out the git and mercurial repositories the templates
//!   reference, preferring a local mirror when one is configured
//! - `configure` pins each template's repositories to concrete versions,
//!   rewrites the templates into real specs, fetches archive sources and
//!   optionally builds SRPMs, reusing existing ones whose embedded file
//!   hashes still match
//!
//! Library modules are usable on their own; the binary in `main.rs` only
//! wires them to the CLI.

pub mod cli;
pub mod commands;
pub mod config;
mod error;
pub mod executor;
pub mod hash;
pub mod manifest;
pub mod pin;
pub mod sources;
pub mod spec;
pub mod srpm;
pub mod template;

pub use config::{BuildRoot, Config};
pub use error::{Error, Result};
pub use executor::{ExecutionResult, Executor, PrintExecutor, RealExecutor};
pub use hash::HashAlgorithm;
pub use manifest::Manifest;
pub use sources::{PinnedSource, Source};
pub use spec::{Spec, SpecOptions};
