// src/commands/clone.rs
//! `planex clone`: check out the repositories referenced by spec templates

use crate::cli::CloneArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::{shell_join, Executor, PrintExecutor, RealExecutor};
use crate::sources::Source;
use crate::spec::{Spec, SpecOptions};
use std::path::PathBuf;
use tracing::{error, info, warn};

pub fn run(args: &CloneArgs) -> Result<()> {
    let config = Config {
        config_dir: args.config_dir.clone(),
        specs_path: args.specs_path.clone(),
        repos_path: args.repos_path.clone(),
        repos_mirror_path: args.repos_mirror_path.clone(),
        check_package_name: !args.no_package_name_check,
        ..Config::default()
    };

    let templates = load_templates(&config)?;

    if args.print_only {
        for spec in &templates {
            for url in spec.source_urls() {
                println!("{}", url);
            }
        }
        return Ok(());
    }

    let executor: Box<dyn Executor> = if args.dry_run {
        Box::new(PrintExecutor)
    } else {
        Box::new(RealExecutor)
    };

    let mut total = 0usize;
    let mut failed = 0usize;
    for spec in &templates {
        for url in spec.source_urls() {
            let source = match Source::classify(url, &config) {
                Ok(source) => source,
                Err(err) => {
                    warn!("{}: {}", url, err);
                    total += 1;
                    failed += 1;
                    continue;
                }
            };
            for command in source.clone_commands() {
                total += 1;
                info!("running '{}'", shell_join(&command));
                let result = executor.run(&command);
                if !result.success() {
                    failed += 1;
                    warn!("FAILED: {}", shell_join(&command));
                    if !result.stdout.is_empty() {
                        warn!("STDOUT: {}", result.stdout.trim_end());
                    }
                    if !result.stderr.is_empty() {
                        warn!("STDERR: {}", result.stderr.trim_end());
                    }
                }
            }
        }
    }

    if failed > 0 {
        warn!("{} out of {} clone commands failed", failed, total);
        if args.strict {
            return Err(Error::BatchFailures { failed, total });
        }
    }
    Ok(())
}

/// Parse every `.spec.in` under the SPECS directory.
///
/// A template that fails to parse is reported and skipped; one broken
/// template should not stop the rest of the batch from being cloned.
fn load_templates(config: &Config) -> Result<Vec<Spec>> {
    let pattern = config.specs_dir().join("*.spec.in").display().to_string();
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| Error::SpecValidation(e.to_string()))?
        .flatten()
        .collect();
    paths.sort();

    let mut templates = Vec::new();
    for path in paths {
        let options = SpecOptions::new().check_package_name(config.check_package_name);
        match Spec::load(&path, options) {
            Ok(spec) => templates.push(spec),
            Err(err) => error!("{}: {}", path.display(), err),
        }
    }
    Ok(templates)
}
