// src/sources.rs

//! Typed source descriptors and fetch logic
//!
//! Each `Source<N>:` value from a spec becomes one [`Source`] variant:
//! a plain archive to download, a git or mercurial repository to clone and
//! snapshot, or a local file. Dispatch is by exhaustive match so a new
//! scheme is a compile-time-checked addition.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{shell_join, Executor};
use crate::pin;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// One source reference, classified by URL scheme
#[derive(Debug, Clone)]
pub enum Source {
    /// Plain archive fetched over HTTP(S)/FTP
    Archive(ArchiveSource),
    /// Git repository, pinned to a tag/describe version
    Git(VcsSource),
    /// Mercurial repository, pinned to a tag/describe version
    Hg(VcsSource),
    /// Local file, either `file://` (copied in) or a bare name expected to
    /// be staged already
    Local(LocalSource),
}

/// Archive source: the URL is fetched as-is to its canonical local name
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    url: String,
}

/// Version-control source shared by the git and mercurial variants
#[derive(Debug, Clone)]
pub struct VcsSource {
    url: String,
    repo_name: String,
    local_path: PathBuf,
    mirror_entry: String,
}

/// Local source: `file://` URI or a bare file name
#[derive(Debug, Clone)]
pub struct LocalSource {
    url: String,
    /// Filesystem path for `file://` sources; `None` for bare names that
    /// are expected to be pre-staged in the sources directory
    path: Option<PathBuf>,
}

/// The resolved pin of one version-control source.
///
/// `extended_url` is a pure function of (original URL, version, hash):
/// recomputing it from the same inputs is byte-identical, which is what
/// makes repeated configure runs converge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedSource {
    pub orig_url: String,
    pub repo_name: String,
    pub version: String,
    pub scm_hash: String,
    pub extended_url: String,
}

impl PinnedSource {
    pub fn new(orig_url: String, repo_name: String, version: String, scm_hash: String) -> Self {
        // The fragment names the archive the pinned source will produce.
        // When the checkout is not exactly at a tag the describe-derived
        // version already embeds distance and short hash; the full hash
        // travels separately through the source<N>_hash substitution.
        let (base, _) = split_fragment(&orig_url);
        let extended_url = format!("{}#{}-{}.tar.gz", base, repo_name, version);
        Self {
            orig_url,
            repo_name,
            version,
            scm_hash,
            extended_url,
        }
    }
}

impl Source {
    /// Classify a source URL from a spec into a typed source.
    ///
    /// Unknown schemes are an error; a value with no scheme at all is a
    /// bare local file name (patches and init scripts are declared that
    /// way).
    pub fn classify(url: &str, config: &Config) -> Result<Self> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            // No scheme: a bare file name living in SOURCES
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Ok(Self::Local(LocalSource {
                    url: url.to_string(),
                    path: None,
                }));
            }
            Err(e) => return Err(Error::SourceResolution(format!("{}: {}", url, e))),
        };

        match parsed.scheme() {
            "http" | "https" | "ftp" => Ok(Self::Archive(ArchiveSource {
                url: url.to_string(),
            })),
            "git" => Ok(Self::Git(VcsSource::new(url, &parsed, ".git", config))),
            "hg" => Ok(Self::Hg(VcsSource::new(url, &parsed, ".hg", config))),
            "file" => Ok(Self::Local(LocalSource {
                url: url.to_string(),
                path: Some(PathBuf::from(parsed.path())),
            })),
            scheme => Err(Error::SourceResolution(format!(
                "{}: unsupported URL scheme '{}'",
                url, scheme
            ))),
        }
    }

    /// The source reference exactly as declared in the spec
    pub fn url(&self) -> &str {
        match self {
            Self::Archive(s) => &s.url,
            Self::Git(s) | Self::Hg(s) => &s.url,
            Self::Local(s) => &s.url,
        }
    }

    /// Name of the file this source materializes under SOURCES
    pub fn archive_name(&self) -> String {
        archive_basename(self.url())
    }

    pub fn is_scm(&self) -> bool {
        matches!(self, Self::Git(_) | Self::Hg(_))
    }

    /// Commands needed to obtain this source into the local working area.
    ///
    /// Empty for archives and local files, and for repositories that are
    /// already checked out (repeated runs do no redundant network work).
    pub fn clone_commands(&self) -> Vec<Vec<String>> {
        match self {
            Self::Archive(_) | Self::Local(_) => Vec::new(),
            Self::Git(s) => s.clone_commands("git"),
            Self::Hg(s) => s.clone_commands("hg"),
        }
    }

    /// Pin a version-control source to its current (version, hash) state.
    ///
    /// Returns `None` for non-VCS sources. Fails with `MissingRepository`
    /// when the local checkout does not exist yet.
    pub fn pin(&self) -> Result<Option<PinnedSource>> {
        match self {
            Self::Archive(_) | Self::Local(_) => Ok(None),
            Self::Git(s) => {
                s.require_checkout()?;
                let version = pin::git_describe(&s.local_path)?;
                let scm_hash = pin::git_rev_hash(&s.local_path)?;
                Ok(Some(PinnedSource::new(
                    s.url.clone(),
                    s.repo_name.clone(),
                    version,
                    scm_hash,
                )))
            }
            Self::Hg(s) => {
                s.require_checkout()?;
                let version = pin::hg_describe(&s.local_path)?;
                let scm_hash = pin::hg_rev_hash(&s.local_path)?;
                Ok(Some(PinnedSource::new(
                    s.url.clone(),
                    s.repo_name.clone(),
                    version,
                    scm_hash,
                )))
            }
        }
    }

    /// Materialize this source as a single file under `sources_dir`.
    ///
    /// VCS sources produce a deterministic snapshot of the pinned state;
    /// archives are downloaded; `file://` sources are copied. A bare local
    /// name is only checked for presence, the configure flow stages those
    /// beforehand.
    pub fn archive(&self, executor: &dyn Executor, sources_dir: &Path) -> Result<()> {
        match self {
            Self::Archive(s) => {
                let dest = sources_dir.join(archive_basename(&s.url));
                let (base, _) = split_fragment(&s.url);
                let command = vec![
                    "curl".to_string(),
                    "-fsSL".to_string(),
                    "-o".to_string(),
                    dest.display().to_string(),
                    base.to_string(),
                ];
                run_fetch(executor, &command)
            }
            Self::Git(s) => {
                s.require_checkout()?;
                let name = s.snapshot_name(|| pin::git_describe(&s.local_path))?;
                let prefix = name.trim_end_matches(".tar.gz");
                let command = vec![
                    "git".to_string(),
                    "-C".to_string(),
                    s.local_path.display().to_string(),
                    "archive".to_string(),
                    "--format=tar.gz".to_string(),
                    format!("--prefix={}/", prefix),
                    "-o".to_string(),
                    sources_dir.join(&name).display().to_string(),
                    "HEAD".to_string(),
                ];
                run_fetch(executor, &command)
            }
            Self::Hg(s) => {
                s.require_checkout()?;
                let name = s.snapshot_name(|| pin::hg_describe(&s.local_path))?;
                let prefix = name.trim_end_matches(".tar.gz");
                let command = vec![
                    "hg".to_string(),
                    "-R".to_string(),
                    s.local_path.display().to_string(),
                    "archive".to_string(),
                    "-t".to_string(),
                    "tgz".to_string(),
                    "-p".to_string(),
                    format!("{}/", prefix),
                    sources_dir.join(&name).display().to_string(),
                ];
                run_fetch(executor, &command)
            }
            Self::Local(s) => match &s.path {
                Some(path) => {
                    let dest = sources_dir.join(archive_basename(&s.url));
                    let command = vec![
                        "cp".to_string(),
                        path.display().to_string(),
                        dest.display().to_string(),
                    ];
                    run_fetch(executor, &command)
                }
                None => {
                    let staged = sources_dir.join(&s.url);
                    if staged.is_file() {
                        Ok(())
                    } else {
                        Err(Error::FetchFailed {
                            command: format!("test -f {}", staged.display()),
                            stdout: String::new(),
                            stderr: format!("local source '{}' is not staged", s.url),
                        })
                    }
                }
            },
        }
    }
}

impl VcsSource {
    fn new(url: &str, parsed: &Url, suffix: &str, config: &Config) -> Self {
        let (base, _) = split_fragment(url);
        let repo_name = url_basename(base)
            .trim_end_matches(suffix)
            .to_string();
        Self {
            url: url.to_string(),
            local_path: config.repos_path.join(&repo_name),
            repo_name,
            mirror_entry: mirror_candidate(parsed, &config.repos_mirror_path),
        }
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    fn require_checkout(&self) -> Result<()> {
        if self.local_path.is_dir() {
            Ok(())
        } else {
            Err(Error::MissingRepository(self.local_path.clone()))
        }
    }

    /// Where to clone from: the local mirror entry when it exists,
    /// the remote otherwise. `hg://` is a marker scheme, the actual
    /// transport is https.
    fn clone_source(&self, tool: &str) -> String {
        if !self.mirror_entry.is_empty() && Path::new(&self.mirror_entry).exists() {
            return self.mirror_entry.clone();
        }
        let (base, _) = split_fragment(&self.url);
        if tool == "hg" {
            base.replacen("hg://", "https://", 1)
        } else {
            base.to_string()
        }
    }

    fn clone_commands(&self, tool: &str) -> Vec<Vec<String>> {
        if self.local_path.exists() {
            debug!(
                "{} already cloned at {}, nothing to do",
                self.repo_name,
                self.local_path.display()
            );
            return Vec::new();
        }
        vec![vec![
            tool.to_string(),
            "clone".to_string(),
            self.clone_source(tool),
            self.local_path.display().to_string(),
        ]]
    }

    /// Name of the snapshot tarball: the URL fragment when the spec was
    /// already rewritten with an extended URL, a fresh describe otherwise
    fn snapshot_name(&self, describe: impl FnOnce() -> Result<String>) -> Result<String> {
        let (_, fragment) = split_fragment(&self.url);
        match fragment {
            Some(fragment) => Ok(fragment.to_string()),
            None => Ok(format!("{}-{}.tar.gz", self.repo_name, describe()?)),
        }
    }
}

fn run_fetch(executor: &dyn Executor, command: &[String]) -> Result<()> {
    let result = executor.run(command);
    if result.success() {
        Ok(())
    } else {
        Err(Error::FetchFailed {
            command: shell_join(command),
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }
}

/// Mirror entry for a VCS URL: `<mirror_root>/<host>/<path>`.
/// Empty when no mirror root is configured.
fn mirror_candidate(parsed: &Url, mirror_root: &str) -> String {
    if mirror_root.is_empty() {
        return String::new();
    }
    let host = parsed.host_str().unwrap_or("");
    Path::new(mirror_root)
        .join(host)
        .join(parsed.path().trim_start_matches('/'))
        .display()
        .to_string()
}

fn split_fragment(url: &str) -> (&str, Option<&str>) {
    match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    }
}

fn url_basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// The local file name a source URL resolves to: the URL fragment when one
/// is present, the path basename otherwise
pub fn archive_basename(url: &str) -> String {
    let (base, fragment) = split_fragment(url);
    match fragment {
        Some(fragment) => fragment.to_string(),
        None => url_basename(base).to_string(),
    }
}

/// Rewrite an archive URL to point at a mirror/proxy destination.
///
/// The scheme, host and directory prefix are replaced by `destination`;
/// the basename and any fragment are kept. Only VCS URLs pass through
/// unchanged, they go through the repository mirror instead. Bare file
/// names are rewritten like any other source, so a configured mirror
/// serves them too.
pub fn rewrite_url(url: &str, destination: &str) -> String {
    if destination.is_empty() {
        return url.to_string();
    }
    if let Ok(parsed) = Url::parse(url) {
        if matches!(parsed.scheme(), "git" | "hg") {
            return url.to_string();
        }
    }
    let (base, fragment) = split_fragment(url);
    let basename = url_basename(base);
    match fragment {
        Some(fragment) => format!("{}{}#{}", destination, basename, fragment),
        None => format!("{}{}", destination, basename),
    }
}
