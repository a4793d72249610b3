// tests/template.rs

//! Template rewriting through the filesystem: placeholder substitution,
//! source line mapping and byte-identical repeated runs.

use planex::template::rewrite;
use planex::PinnedSource;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

const TEMPLATE: &str = "\
%define planex_source0_version @SOURCE0_VERSION@
%define planex_source0_hash @SOURCE0_HASH@
%define planex_version @VERSION@
%define planex_release @RELEASE@

Name:           xcp-networkd
Version:        %{planex_version}
Release:        %{planex_release}%{?dist}
Summary:        Network daemon
License:        LGPL
Source0:        git://github.com/xapi-project/xcp-networkd.git

%description
Network management daemon.
";

fn pinned() -> Vec<PinnedSource> {
    vec![PinnedSource::new(
        "git://github.com/xapi-project/xcp-networkd.git".to_string(),
        "xcp-networkd".to_string(),
        "0.9.0+3+gabc1234".to_string(),
        "abc1234def5678".to_string(),
    )]
}

fn mapping(pins: &[PinnedSource]) -> HashMap<String, String> {
    pins.iter()
        .map(|pin| (pin.orig_url.clone(), pin.extended_url.clone()))
        .collect()
}

#[test]
fn test_rewrite_substitutes_and_strips_suffix() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("xcp-networkd.spec.in");
    fs::write(&template, TEMPLATE).unwrap();

    let pins = pinned();
    let output = rewrite(&template, dir.path(), &pins, &mapping(&pins)).unwrap();

    assert_eq!(output, dir.path().join("xcp-networkd.spec"));
    let contents = fs::read_to_string(&output).unwrap();
    assert!(contents.contains("%define planex_source0_version 0.9.0+3+gabc1234"));
    assert!(contents.contains("%define planex_source0_hash abc1234def5678"));
    assert!(contents.contains("%define planex_version 0.9.0+3+gabc1234"));
    assert!(contents.contains("%define planex_release 1%{?extrarelease}"));
    assert!(contents.contains(
        "Source0:        git://github.com/xapi-project/xcp-networkd.git\
#xcp-networkd-0.9.0+3+gabc1234.tar.gz"
    ));
    // Untouched lines survive byte-for-byte
    assert!(contents.contains("Summary:        Network daemon"));
}

#[test]
fn test_rewrite_twice_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("xcp-networkd.spec.in");
    fs::write(&template, TEMPLATE).unwrap();

    let pins = pinned();
    let first = rewrite(&template, dir.path(), &pins, &mapping(&pins)).unwrap();
    let first_contents = fs::read(&first).unwrap();
    let second = rewrite(&template, dir.path(), &pins, &mapping(&pins)).unwrap();
    let second_contents = fs::read(&second).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_contents, second_contents);
}

#[test]
fn test_rewrite_rejects_non_template_path() {
    let dir = TempDir::new().unwrap();
    let concrete = dir.path().join("xcp-networkd.spec");
    fs::write(&concrete, "Name: xcp-networkd\n").unwrap();

    assert!(rewrite(&concrete, dir.path(), &[], &HashMap::new()).is_err());
}
