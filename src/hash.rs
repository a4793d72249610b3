// src/hash.rs

//! Configurable content hashing for SRPM reconciliation
//!
//! Hashes of staged spec and source files are compared against the digests
//! embedded in previously built SRPMs to decide whether a rebuild is
//! needed. MD5 matches the file digests reported by `rpm --dump` on older
//! distributions; SHA-256 matches newer ones.

use crate::error::{Error, Result};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            _ => Err(Error::UnknownHashAlgorithm(s.to_string())),
        }
    }
}

/// Hash one file, returning the lowercase hex digest
pub fn hash_file(algorithm: HashAlgorithm, path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    match algorithm {
        HashAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            io::copy(&mut file, &mut hasher)?;
            Ok(hex::encode(hasher.finalize()))
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            io::copy(&mut file, &mut hasher)?;
            Ok(hex::encode(hasher.finalize()))
        }
    }
}

/// Hash every regular file directly under the given directories.
///
/// Returns a map keyed by file basename, matching how `rpm --dump` names
/// the files inside an SRPM. Later directories win on basename collisions.
pub fn hash_dir_files(
    algorithm: HashAlgorithm,
    dirs: &[PathBuf],
) -> Result<BTreeMap<String, String>> {
    let mut hashes = BTreeMap::new();
    for dir in dirs {
        if !dir.is_dir() {
            continue;
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        entries.sort();
        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            hashes.insert(name.to_string(), hash_file(algorithm, &path)?);
        }
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("md5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!(
            "SHA256".parse::<HashAlgorithm>().unwrap(),
            HashAlgorithm::Sha256
        );
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_hash_file_known_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"hello\n").unwrap();

        // Reference digests from md5sum / sha256sum
        assert_eq!(
            hash_file(HashAlgorithm::Md5, &path).unwrap(),
            "b1946ac92492d2347c6235b4d2611184"
        );
        assert_eq!(
            hash_file(HashAlgorithm::Sha256, &path).unwrap(),
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn test_hash_dir_files_keys_by_basename() {
        let dir = tempfile::tempdir().unwrap();
        let specs = dir.path().join("SPECS");
        let sources = dir.path().join("SOURCES");
        std::fs::create_dir_all(&specs).unwrap();
        std::fs::create_dir_all(&sources).unwrap();
        std::fs::write(specs.join("foo.spec"), b"Name: foo\n").unwrap();
        std::fs::write(sources.join("foo-1.0.tar.gz"), b"not a real tarball").unwrap();

        let hashes = hash_dir_files(HashAlgorithm::Md5, &[specs, sources]).unwrap();
        assert_eq!(hashes.len(), 2);
        assert!(hashes.contains_key("foo.spec"));
        assert!(hashes.contains_key("foo-1.0.tar.gz"));
    }

    #[test]
    fn test_hash_dir_files_missing_dir_is_empty() {
        let hashes =
            hash_dir_files(HashAlgorithm::Md5, &[PathBuf::from("/no/such/dir")]).unwrap();
        assert!(hashes.is_empty());
    }
}
