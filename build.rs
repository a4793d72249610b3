// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn config_dir_arg() -> Arg {
    Arg::new("config_dir")
        .long("config-dir")
        .default_value(".")
        .help("Configuration directory")
}

fn specs_path_arg() -> Arg {
    Arg::new("specs_path")
        .long("specs-path")
        .default_value("SPECS")
        .help("Path to the SPECS directory, relative to config-dir")
}

fn repos_path_arg() -> Arg {
    Arg::new("repos_path")
        .long("repos-path")
        .default_value("repos")
        .help("Local path under which repositories are checked out")
}

fn repos_mirror_arg() -> Arg {
    Arg::new("repos_mirror_path")
        .long("repos-mirror-path")
        .default_value("")
        .help("Local repository mirror directory, consulted before the network")
}

fn flag(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).action(ArgAction::SetTrue).help(help)
}

fn build_cli() -> Command {
    Command::new("planex")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Planex Contributors")
        .about("Prepare source packages from RPM spec files and templates")
        .subcommand_required(true)
        .arg(flag("quiet", "quiet", "Only print errors").global(true))
        .subcommand(
            Command::new("clone")
                .about("Download the repositories referenced by spec templates")
                .arg(config_dir_arg())
                .arg(specs_path_arg())
                .arg(repos_path_arg())
                .arg(repos_mirror_arg())
                .arg(flag("print_only", "print-only", "Only print sources, do not clone them"))
                .arg(flag("dry_run", "dry-run", "Do not execute commands, just print them"))
                .arg(flag("strict", "strict", "Exit non-zero if any clone command fails"))
                .arg(flag(
                    "no_package_name_check",
                    "no-package-name-check",
                    "Don't check that package names match spec file names",
                )),
        )
        .subcommand(
            Command::new("configure")
                .about("Stage specs and sources into the build root")
                .arg(config_dir_arg())
                .arg(specs_path_arg())
                .arg(
                    Arg::new("sources_path")
                        .long("sources-path")
                        .default_value("SOURCES")
                        .help("Path to the SOURCES directory, relative to config-dir"),
                )
                .arg(repos_path_arg())
                .arg(repos_mirror_arg())
                .arg(
                    Arg::new("mirror_path")
                        .long("mirror-path")
                        .default_value("")
                        .help("Rewrite archive URLs to point to this destination"),
                )
                .arg(
                    Arg::new("build_root")
                        .long("build-root")
                        .default_value(".")
                        .help("Root of the staging tree (SPECS, SOURCES, SRPMS, RPMS)"),
                )
                .arg(
                    Arg::new("hash_algorithm")
                        .long("hash")
                        .default_value("md5")
                        .value_parser(["md5", "sha256"])
                        .help("Hash algorithm for SRPM reconciliation"),
                )
                .arg(flag("build_srpms", "build-srpms", "Build SRPMs after staging"))
                .arg(flag("dry_run", "dry-run", "Do not execute commands, just print them"))
                .arg(flag(
                    "no_package_name_check",
                    "no-package-name-check",
                    "Don't check that package names match spec file names",
                )),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=resources/Makefile.common");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("planex.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
