// src/spec.rs

//! RPM spec file parsing
//!
//! Extracts the package name, version, declared sources, build
//! dependencies and produced package names from a spec file or template,
//! with enough macro expansion to resolve source URLs and paths to
//! concrete strings. The same grammar backs two packaging-format views:
//! the native RPM one, and a translated Debian one driven by an injected
//! [`NameMapper`].

use crate::config::BuildRoot;
use crate::error::{Error, Result};
use crate::sources::archive_basename;
use regex::{Captures, Regex};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DEFINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%(?:define|global)\s+(\S+)\s+(.+?)\s*$").expect("static regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([a-z][a-z0-9]*)\s*:\s*(.+?)\s*$").expect("static regex"));
static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^source(\d*)\s*:\s*(.+?)\s*$").expect("static regex"));
static PACKAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%package\s+(?:-n\s+(\S+)|(\S+))").expect("static regex"));
// %{name}, %{?name}, %{?name:body} and bare %name
static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%\{(\??)([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}|%([A-Za-z_][A-Za-z0-9_]*)")
        .expect("static regex")
});

/// Which packaging format the derived names and paths follow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageTarget {
    #[default]
    Rpm,
    Deb,
}

/// Maps a native package name to the name(s) it has in the target format.
///
/// One native package may map to several target packages, which is why the
/// result is a list.
pub trait NameMapper {
    fn map(&self, name: &str) -> Vec<String>;
}

/// Keeps names unchanged (the native view)
pub struct IdentityMapper;

impl NameMapper for IdentityMapper {
    fn map(&self, name: &str) -> Vec<String> {
        vec![name.to_string()]
    }
}

/// Translates names through a fixed lookup table; unmapped names pass
/// through unchanged
pub struct TableMapper {
    table: HashMap<String, Vec<String>>,
}

impl TableMapper {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        Self { table }
    }
}

impl NameMapper for TableMapper {
    fn map(&self, name: &str) -> Vec<String> {
        match self.table.get(name) {
            Some(mapped) => mapped.clone(),
            None => vec![name.to_string()],
        }
    }
}

/// Options controlling how a spec is parsed and which format view the
/// derived names and paths use
pub struct SpecOptions {
    pub target: PackageTarget,
    pub dist: String,
    pub check_package_name: bool,
    pub build_root: BuildRoot,
    mapper: Box<dyn NameMapper>,
}

impl Default for SpecOptions {
    fn default() -> Self {
        Self {
            target: PackageTarget::Rpm,
            dist: String::new(),
            check_package_name: true,
            build_root: BuildRoot::default(),
            mapper: Box::new(IdentityMapper),
        }
    }
}

impl SpecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: PackageTarget) -> Self {
        self.target = target;
        self
    }

    pub fn dist(mut self, dist: &str) -> Self {
        self.dist = dist.to_string();
        self
    }

    pub fn check_package_name(mut self, check: bool) -> Self {
        self.check_package_name = check;
        self
    }

    pub fn build_root(mut self, build_root: BuildRoot) -> Self {
        self.build_root = build_root;
        self
    }

    pub fn mapper(mut self, mapper: Box<dyn NameMapper>) -> Self {
        self.mapper = mapper;
        self
    }
}

/// A parsed spec file or template
pub struct Spec {
    path: PathBuf,
    name: String,
    version: String,
    release: String,
    sources: Vec<String>,
    buildrequires: Vec<String>,
    packages: Vec<String>,
    options: SpecOptions,
}

impl Spec {
    /// Parse a spec file.
    ///
    /// Fails with `SpecNameMismatch` when the declared `Name:` does not
    /// match the file name minus its `.spec`/`.spec.in` suffix, unless
    /// name checking is disabled in the options.
    pub fn load(path: impl AsRef<Path>, options: SpecOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let mut macros: HashMap<String, String> = HashMap::new();
        if !options.dist.is_empty() {
            macros.insert("dist".to_string(), options.dist.clone());
        }

        // First pass: macro definitions and the primary tags, so that
        // %{name} and %{version} resolve wherever they appear.
        for line in text.lines() {
            if let Some(caps) = DEFINE_RE.captures(line) {
                macros.insert(caps[1].to_string(), caps[2].to_string());
                continue;
            }
            if let Some(caps) = TAG_RE.captures(line) {
                let tag = caps[1].to_lowercase();
                if matches!(tag.as_str(), "name" | "version" | "release") {
                    // Only the first occurrence counts; subpackages may
                    // redeclare these.
                    macros.entry(tag).or_insert_with(|| caps[2].to_string());
                }
            }
        }

        let name = expand(
            macros
                .get("name")
                .ok_or_else(|| Error::SpecValidation(format!("{}: missing Name", path.display())))?,
            &macros,
        );
        let version = expand(
            macros.get("version").ok_or_else(|| {
                Error::SpecValidation(format!("{}: missing Version", path.display()))
            })?,
            &macros,
        );
        let release = macros
            .get("release")
            .map(|value| expand(value, &macros))
            .unwrap_or_else(|| "1".to_string());

        if options.check_package_name && spec_stem(path) != name {
            return Err(Error::SpecNameMismatch {
                spec_path: path.display().to_string(),
                package_name: name,
            });
        }

        // Second pass: sources (declaration order is significant), build
        // dependencies and produced package names.
        let mut sources = Vec::new();
        let mut buildrequires = Vec::new();
        let mut packages = vec![name.clone()];
        for line in text.lines() {
            if let Some(caps) = SOURCE_RE.captures(line) {
                sources.push(expand(&caps[2], &macros));
                continue;
            }
            if let Some(caps) = TAG_RE.captures(line) {
                if caps[1].to_lowercase() == "buildrequires" {
                    buildrequires.extend(dependency_names(&expand(&caps[2], &macros)));
                    continue;
                }
            }
            if let Some(caps) = PACKAGE_RE.captures(line) {
                let package = match caps.get(1) {
                    Some(full) => full.as_str().to_string(),
                    None => format!("{}-{}", name, &caps[2]),
                };
                packages.push(package);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            name,
            version,
            release,
            sources,
            buildrequires,
            packages,
            options,
        })
    }

    /// The native package name (never mapped)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Macro-expanded base version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Macro-expanded release, `1` when the spec declares none
    pub fn release(&self) -> &str {
        &self.release
    }

    /// The file this spec was parsed from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the concrete spec lives in the build root
    pub fn specpath(&self) -> String {
        self.options
            .build_root
            .specs_dir()
            .join(format!("{}.spec", self.name))
            .display()
            .to_string()
    }

    /// Source references in declaration order, macros expanded
    pub fn source_urls(&self) -> &[String] {
        &self.sources
    }

    /// Local path of each source under SOURCES, in declaration order
    pub fn source_paths(&self) -> Vec<String> {
        let sources_dir = self.options.build_root.sources_dir();
        self.sources
            .iter()
            .map(|url| sources_dir.join(archive_basename(url)).display().to_string())
            .collect()
    }

    /// Names of the packages this spec produces, in the target format
    pub fn provides(&self) -> HashSet<String> {
        self.packages
            .iter()
            .flat_map(|name| self.options.mapper.map(name))
            .collect()
    }

    /// Build-time dependencies, in the target format
    pub fn buildrequires(&self) -> HashSet<String> {
        self.buildrequires
            .iter()
            .flat_map(|name| self.options.mapper.map(name))
            .collect()
    }

    /// Path of the source package this spec builds into
    pub fn source_package_path(&self) -> String {
        let srpms_dir = self.options.build_root.srpms_dir();
        match self.options.target {
            PackageTarget::Rpm => srpms_dir
                .join(format!(
                    "{}-{}-{}.src.rpm",
                    self.name, self.version, self.release
                ))
                .display()
                .to_string(),
            PackageTarget::Deb => {
                let mapped = self
                    .options
                    .mapper
                    .map(&self.name)
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| self.name.clone());
                srpms_dir
                    .join(format!("{}_{}-1.dsc", mapped, self.version))
                    .display()
                    .to_string()
            }
        }
    }

    /// Paths of the binary packages this spec builds into, one per
    /// produced package name
    pub fn binary_package_paths(&self) -> Vec<String> {
        let rpms_dir = self.options.build_root.rpms_dir();
        match self.options.target {
            PackageTarget::Rpm => {
                let machine = rpm_machine();
                self.packages
                    .iter()
                    .flat_map(|name| self.options.mapper.map(name))
                    .map(|package| {
                        rpms_dir
                            .join(machine)
                            .join(format!(
                                "{}-{}-{}.{}.rpm",
                                package, self.version, self.release, machine
                            ))
                            .display()
                            .to_string()
                    })
                    .collect()
            }
            PackageTarget::Deb => {
                let machine = deb_machine();
                self.packages
                    .iter()
                    .flat_map(|name| self.options.mapper.map(name))
                    .map(|package| {
                        rpms_dir
                            .join(format!("{}_{}-1_{}.deb", package, self.version, machine))
                            .display()
                            .to_string()
                    })
                    .collect()
            }
        }
    }

    /// Whether this spec was loaded from a `.spec.in` template
    pub fn is_template(&self) -> bool {
        self.path
            .to_str()
            .is_some_and(|p| p.ends_with(".spec.in"))
    }
}

/// RPM architecture label of the host
pub fn rpm_machine() -> &'static str {
    if std::env::consts::ARCH == "x86_64" {
        "x86_64"
    } else {
        "i386"
    }
}

/// Debian architecture label of the host
pub fn deb_machine() -> &'static str {
    if std::env::consts::ARCH == "x86_64" {
        "amd64"
    } else {
        "i386"
    }
}

/// Read just the `Name:` field of a spec file, without full parsing.
///
/// Used when inspecting staged specs whose sources are already resolved.
pub fn name_from_spec(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)?;
    for line in text.lines() {
        if let Some(caps) = TAG_RE.captures(line) {
            if caps[1].to_lowercase() == "name" {
                return Ok(caps[2].to_string());
            }
        }
    }
    Err(Error::SpecValidation(format!(
        "{}: missing Name",
        path.display()
    )))
}

/// File name minus its `.spec` or `.spec.in` suffix
fn spec_stem(path: &Path) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.trim_end_matches(".in")
        .trim_end_matches(".spec")
        .to_string()
}

/// Expand `%{name}`, `%{?name}`, `%{?name:body}` and bare `%name` against
/// a macro table. Undefined conditionals expand to nothing; undefined
/// plain macros are left as written, matching rpm. Expansion iterates so
/// macros may reference other macros, with a depth cap against cycles.
fn expand(input: &str, macros: &HashMap<String, String>) -> String {
    let mut current = input.to_string();
    for _ in 0..10 {
        let next = MACRO_RE
            .replace_all(&current, |caps: &Captures| {
                if let Some(bare) = caps.get(4) {
                    return match macros.get(bare.as_str()) {
                        Some(value) => value.clone(),
                        None => caps[0].to_string(),
                    };
                }
                let optional = &caps[1] == "?";
                let name = &caps[2];
                match macros.get(name) {
                    Some(value) => match caps.get(3) {
                        Some(body) => body.as_str().to_string(),
                        None => value.clone(),
                    },
                    None if optional => String::new(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Package names from a dependency tag value, version constraints dropped
fn dependency_names(value: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut skip_next = false;
    for token in value.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if matches!(token, ">" | ">=" | "<" | "<=" | "=" | "==") {
            skip_next = true;
            continue;
        }
        names.push(token.to_string());
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macros(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_simple() {
        let table = macros(&[("name", "foo"), ("version", "1.2")]);
        assert_eq!(expand("%{name}-%{version}.tar.gz", &table), "foo-1.2.tar.gz");
    }

    #[test]
    fn test_expand_nested() {
        let table = macros(&[("base", "1.2"), ("version", "%{base}.3")]);
        assert_eq!(expand("%{version}", &table), "1.2.3");
    }

    #[test]
    fn test_expand_conditional() {
        let with_dist = macros(&[("dist", ".el6")]);
        assert_eq!(expand("1%{?dist}", &with_dist), "1.el6");
        assert_eq!(expand("1%{?dist}", &macros(&[])), "1");
        assert_eq!(
            expand("%{?dist:distro}", &with_dist),
            "distro"
        );
    }

    #[test]
    fn test_expand_undefined_left_alone() {
        assert_eq!(expand("%{mystery}", &macros(&[])), "%{mystery}");
    }

    #[test]
    fn test_expand_bare_macro() {
        let table = macros(&[("name", "foo")]);
        assert_eq!(expand("%name", &table), "foo");
        assert_eq!(expand("%undefined", &table), "%undefined");
    }

    #[test]
    fn test_expand_cycle_terminates() {
        let table = macros(&[("a", "%{b}"), ("b", "%{a}")]);
        // A macro cycle must not hang; the result is unspecified but finite.
        let _ = expand("%{a}", &table);
    }

    #[test]
    fn test_dependency_names_strip_constraints() {
        assert_eq!(
            dependency_names("ocaml >= 4.02, ocaml-findlib openssl-devel"),
            vec!["ocaml", "ocaml-findlib", "openssl-devel"]
        );
    }

    #[test]
    fn test_spec_stem() {
        assert_eq!(spec_stem(Path::new("SPECS/foo.spec")), "foo");
        assert_eq!(spec_stem(Path::new("SPECS/foo.spec.in")), "foo");
    }

    #[test]
    fn test_table_mapper_fallback() {
        let mapper = TableMapper::new(HashMap::new());
        assert_eq!(mapper.map("unmapped"), vec!["unmapped"]);
    }
}
