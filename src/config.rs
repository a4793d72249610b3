// src/config.rs

//! Run configuration and build-root layout
//!
//! All paths used by the clone and configure flows come from here; nothing
//! downstream hardcodes a directory name.

use crate::hash::HashAlgorithm;
use std::path::{Path, PathBuf};

/// Layout of the staging tree the configure flow populates.
///
/// Everything hangs off one root: spec files in SPECS, source archives and
/// patches in SOURCES, built source packages in SRPMS, binary packages in
/// RPMS.
#[derive(Debug, Clone)]
pub struct BuildRoot {
    root: PathBuf,
}

impl BuildRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.root.join("SPECS")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.root.join("SOURCES")
    }

    pub fn srpms_dir(&self) -> PathBuf {
        self.root.join("SRPMS")
    }

    pub fn rpms_dir(&self) -> PathBuf {
        self.root.join("RPMS")
    }
}

impl Default for BuildRoot {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Configuration shared by the clone and configure flows
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the SPECS/SOURCES configuration tree
    pub config_dir: PathBuf,

    /// Name of the specs directory, relative to `config_dir`
    pub specs_path: String,

    /// Name of the patches/extra-sources directory, relative to `config_dir`
    pub sources_path: String,

    /// Local directory under which VCS repositories are checked out
    pub repos_path: PathBuf,

    /// Local mirror of remote VCS hosts, consulted before the network.
    /// For `git://host.com/some/path.git` the mirror entry is
    /// `<repos_mirror_path>/host.com/some/path.git`. Empty disables it.
    pub repos_mirror_path: String,

    /// Destination prefix for archive URL rewriting. Empty disables it.
    pub mirror_path: String,

    /// Validate that a spec's Name matches its file name
    pub check_package_name: bool,

    /// Algorithm for SRPM hash reconciliation
    pub hash_algorithm: HashAlgorithm,
}

impl Config {
    /// Directory containing the spec files and templates
    pub fn specs_dir(&self) -> PathBuf {
        self.config_dir.join(&self.specs_path)
    }

    /// Directory containing patches and extra sources
    pub fn sources_dir(&self) -> PathBuf {
        self.config_dir.join(&self.sources_path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            specs_path: "SPECS".to_string(),
            sources_path: "SOURCES".to_string(),
            repos_path: PathBuf::from("repos"),
            repos_mirror_path: String::new(),
            mirror_path: String::new(),
            check_package_name: true,
            hash_algorithm: HashAlgorithm::Md5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_root_layout() {
        let root = BuildRoot::new(".");
        assert_eq!(root.specs_dir(), PathBuf::from("./SPECS"));
        assert_eq!(root.sources_dir(), PathBuf::from("./SOURCES"));
        assert_eq!(root.srpms_dir(), PathBuf::from("./SRPMS"));
        assert_eq!(root.rpms_dir(), PathBuf::from("./RPMS"));
    }

    #[test]
    fn test_config_dirs_relative_to_config_dir() {
        let config = Config {
            config_dir: PathBuf::from("/etc/planex"),
            ..Config::default()
        };
        assert_eq!(config.specs_dir(), PathBuf::from("/etc/planex/SPECS"));
        assert_eq!(config.sources_dir(), PathBuf::from("/etc/planex/SOURCES"));
    }
}
