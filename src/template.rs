// src/template.rs

//! Spec template rewriting
//!
//! A `.spec.in` template carries placeholders for values that only exist
//! once the version-control sources are pinned. Rewriting is a
//! line-oriented transform: `Source<N>:` lines whose value is a known
//! original URL get the pinned extended URL, `%define planex_<key>` lines
//! get the computed value for `<key>`, and everything else passes through
//! byte-for-byte. The transform is deterministic, so rewriting twice with
//! the same pins produces identical output.

use crate::error::{Error, Result};
use crate::sources::PinnedSource;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static SOURCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([Ss]ource\d*:\s+)(.+)$").expect("static regex"));
static DEFINE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(%define planex_)(\S+)(.*)$").expect("static regex"));

/// Substitution table for the `%define planex_<key>` placeholders.
///
/// Keys are positional over the pinned sources in declaration order:
/// `source<N>_version` and `source<N>_hash` per source, plus the combined
/// `version` (all pinned versions joined with `+`) and the conventional
/// `release`. The combined version is as documented even when it mixes
/// unrelated version strings; downstream tooling depends on the shape.
pub fn substitutions(pinned: &[PinnedSource]) -> BTreeMap<String, String> {
    let mut subs = BTreeMap::new();
    for (index, source) in pinned.iter().enumerate() {
        subs.insert(format!("source{}_version", index), source.version.clone());
        subs.insert(format!("source{}_hash", index), source.scm_hash.clone());
    }
    let versions: Vec<&str> = pinned.iter().map(|s| s.version.as_str()).collect();
    subs.insert("version".to_string(), versions.join("+"));
    subs.insert("release".to_string(), "1%{?extrarelease}".to_string());
    subs
}

/// Apply the rewrite to a template's lines.
///
/// Pure: no filesystem access, output depends only on the inputs. A
/// `planex_` placeholder with no entry in `subs` is an error rather than
/// a silent pass-through.
pub fn substitute_lines(
    lines: &[&str],
    url_mapping: &HashMap<String, String>,
    subs: &BTreeMap<String, String>,
) -> Result<Vec<String>> {
    let mut output = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(caps) = SOURCE_LINE_RE.captures(line) {
            if let Some(mapped) = url_mapping.get(&caps[2]) {
                output.push(format!("{}{}", &caps[1], mapped));
                continue;
            }
        }
        if let Some(caps) = DEFINE_LINE_RE.captures(line) {
            let key = &caps[2];
            let value = subs.get(key).ok_or_else(|| {
                Error::Template(format!("no substitution for planex_{}", key))
            })?;
            output.push(format!("{}{} {}", &caps[1], key, value));
            continue;
        }
        output.push((*line).to_string());
    }
    Ok(output)
}

/// Rewrite a `.spec.in` template into a concrete spec.
///
/// The output file is the template's basename minus `.in`, written under
/// `output_dir`. Returns the written path.
pub fn rewrite(
    template_path: &Path,
    output_dir: &Path,
    pinned: &[PinnedSource],
    url_mapping: &HashMap<String, String>,
) -> Result<PathBuf> {
    let basename = template_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            Error::Template(format!("bad template path {}", template_path.display()))
        })?;
    let Some(output_name) = basename.strip_suffix(".in") else {
        return Err(Error::Template(format!(
            "{} is not a .in template",
            template_path.display()
        )));
    };

    let text = std::fs::read_to_string(template_path)?;
    let lines: Vec<&str> = text.lines().collect();
    let subs = substitutions(pinned);
    let output = substitute_lines(&lines, url_mapping, &subs)?;

    let output_path = output_dir.join(output_name);
    let mut contents = output.join("\n");
    contents.push('\n');
    std::fs::write(&output_path, contents)?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(url: &str, repo: &str, version: &str, hash: &str) -> PinnedSource {
        PinnedSource::new(
            url.to_string(),
            repo.to_string(),
            version.to_string(),
            hash.to_string(),
        )
    }

    #[test]
    fn test_substitutions_positional() {
        let pins = vec![
            pin("git://h/a.git", "a", "1.0", "aaaa"),
            pin("git://h/b.git", "b", "2.0+4+gbcd1234", "bbbb"),
        ];
        let subs = substitutions(&pins);
        assert_eq!(subs["source0_version"], "1.0");
        assert_eq!(subs["source1_version"], "2.0+4+gbcd1234");
        assert_eq!(subs["source0_hash"], "aaaa");
        assert_eq!(subs["version"], "1.0+2.0+4+gbcd1234");
        assert_eq!(subs["release"], "1%{?extrarelease}");
    }

    #[test]
    fn test_source_line_mapping() {
        let mut mapping = HashMap::new();
        mapping.insert(
            "git://h/a.git".to_string(),
            "git://h/a.git#a-1.0.tar.gz".to_string(),
        );
        let subs = substitutions(&[]);
        let lines = vec![
            "Source0: git://h/a.git",
            "Source1: https://elsewhere/b.tar.gz",
        ];
        let output = substitute_lines(&lines, &mapping, &subs).unwrap();
        assert_eq!(output[0], "Source0: git://h/a.git#a-1.0.tar.gz");
        // Unmapped source lines pass through untouched
        assert_eq!(output[1], "Source1: https://elsewhere/b.tar.gz");
    }

    #[test]
    fn test_define_line_substitution() {
        let pins = vec![pin("git://h/a.git", "a", "1.0", "deadbeef")];
        let subs = substitutions(&pins);
        let lines = vec![
            "%define planex_source0_version %%PLACEHOLDER",
            "%define planex_source0_hash %%PLACEHOLDER",
            "%define planex_version %%PLACEHOLDER",
            "%define planex_release %%PLACEHOLDER",
        ];
        let output = substitute_lines(&lines, &HashMap::new(), &subs).unwrap();
        assert_eq!(output[0], "%define planex_source0_version 1.0");
        assert_eq!(output[1], "%define planex_source0_hash deadbeef");
        assert_eq!(output[2], "%define planex_version 1.0");
        assert_eq!(output[3], "%define planex_release 1%{?extrarelease}");
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let subs = substitutions(&[]);
        let lines = vec!["%define planex_source7_version x"];
        assert!(substitute_lines(&lines, &HashMap::new(), &subs).is_err());
    }

    #[test]
    fn test_other_lines_unchanged() {
        let subs = substitutions(&[]);
        let lines = vec![
            "Name: foo",
            "",
            "%description",
            "Indented   and   spaced   text stays put.",
        ];
        let output = substitute_lines(&lines, &HashMap::new(), &subs).unwrap();
        let expected: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_substitute_lines_idempotent_inputs() {
        let pins = vec![pin("git://h/a.git", "a", "1.0", "deadbeef")];
        let subs = substitutions(&pins);
        let mut mapping = HashMap::new();
        mapping.insert("git://h/a.git".to_string(), pins[0].extended_url.clone());
        let lines = vec!["Source0: git://h/a.git", "%define planex_version 0"];
        let first = substitute_lines(&lines, &mapping, &subs).unwrap();
        let first_refs: Vec<&str> = first.iter().map(|s| s.as_str()).collect();
        let second = substitute_lines(&first_refs, &mapping, &subs).unwrap();
        assert_eq!(first, second);
    }
}
