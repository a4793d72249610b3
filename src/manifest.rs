// src/manifest.rs

//! Run manifest: which repository state went into this configure pass
//!
//! The manifest is an explicit accumulator owned by the configure flow,
//! built up while templates are pinned and printed once at the end. It is
//! not persisted; the staged artifacts themselves are the durable record.

use std::collections::BTreeMap;
use std::fmt;

/// Repository name to pinned SCM hash, ordered by name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repo_name: impl Into<String>, scm_hash: impl Into<String>) {
        self.entries.insert(repo_name.into(), scm_hash.into());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, repo_name: &str) -> Option<&str> {
        self.entries.get(repo_name).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, hash) in &self.entries {
            writeln!(f, "{:>40} {}", name, hash)?;
        }
        Ok(())
    }
}
