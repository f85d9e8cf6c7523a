//! The `warden` binary.
//!
//! Consumes a typed-program snapshot produced by the source-loading
//! front-end and runs either the standalone return-type linter or the
//! annotation-driven contract enforcement over it. Diagnostics print one
//! per line as `FILE:LINE:COL: MESSAGE`, grouped and sorted by position.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use warden_contract::ContractProviders;
use warden_enforce::{CancelToken, Enforcer};
use warden_ir::{PkgId, Program};
use warden_retlint::{render, RetLint};

#[derive(Parser)]
#[command(name = "warden", about = "Static contract enforcement and return-type linting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the typed-program snapshot.
    #[arg(short, long)]
    program: PathBuf,

    /// The directory to operate in.
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Include test sources.
    #[arg(long)]
    tests: bool,

    /// Return a non-zero exit code if any diagnostics are reported.
    #[arg(long)]
    set_exit_status: bool,

    /// Package patterns to analyze (defaults to every loaded user package).
    #[arg(value_name = "PATTERN", default_value = ".")]
    patterns: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint functions returning the target interface against an allow-list.
    Retlint {
        #[command(flatten)]
        common: CommonArgs,

        /// An allowed concrete type, `PackagePath/Name` or a bare universe
        /// name (repeatable).
        #[arg(short, long = "allow", value_name = "TYPE")]
        allowed: Vec<String>,

        /// The name of the target interface.
        #[arg(short, long, default_value = "error")]
        target: String,
    },

    /// Run every contract annotation discovered in the program.
    Enforce {
        #[command(flatten)]
        common: CommonArgs,

        /// Named type whose declarations act as contract aliases; aliases
        /// are disabled when absent or unresolvable.
        #[arg(long, value_name = "TYPE")]
        contract_type: Option<String>,
    },

    /// List all defined contracts.
    Contracts,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            1
        }
    };
    process::exit(exit_code);
}

/// Providers for the contracts this binary ships with.
fn providers() -> ContractProviders {
    let mut contracts = ContractProviders::new();
    contracts.register::<RetLint>("RetLint");
    contracts
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Retlint {
            common,
            allowed,
            target,
        } => {
            let program = load_program(&common)?;
            let packages = select_packages(&program, &common.patterns)?;
            let linter = RetLint {
                allowed_names: allowed,
                target_name: target,
            };
            let analysis = linter.run(&program, &packages)?;
            print!("{}", render(&program, analysis.dirty()));
            Ok(exit_code(&common, !analysis.dirty().is_empty()))
        }

        Commands::Enforce {
            common,
            contract_type,
        } => {
            let program = Arc::new(load_program(&common)?);
            let mut enforcer = Enforcer::new(Arc::clone(&program), providers());
            enforcer.tests = common.tests;
            // Alias interpretation is silently disabled when the capability
            // type is absent from the program.
            if let Some(name) = contract_type {
                match program.resolve(&name) {
                    Ok(ty) => enforcer.contract_capability = Some(program.underlying(ty)),
                    Err(err) => debug!(%name, %err, "contract capability not found"),
                }
            }
            let results = enforcer.execute(&CancelToken::new())?;
            print!("{results}");
            Ok(exit_code(&common, !results.is_empty()))
        }

        Commands::Contracts => {
            for name in providers().names() {
                println!("{name}");
            }
            Ok(0)
        }
    }
}

fn load_program(common: &CommonArgs) -> Result<Program> {
    let path = common.dir.join(&common.program);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("could not read program snapshot {}", path.display()))?;
    let program = Program::from_snapshot(&json)?;
    debug!(
        packages = program.packages().count(),
        "loaded program snapshot"
    );
    Ok(program)
}

/// Maps package patterns onto the snapshot's user packages. `.` selects all
/// of them; otherwise a pattern matches an exact import path or, with a
/// `/...` suffix, any path below it.
fn select_packages(program: &Program, patterns: &[String]) -> Result<Vec<PkgId>> {
    let user = program.user_packages();
    if patterns.iter().any(|p| p == ".") {
        return Ok(user);
    }
    let selected: Vec<PkgId> = user
        .into_iter()
        .filter(|&pkg| {
            let path = &program.package(pkg).path;
            patterns.iter().any(|pattern| {
                if let Some(prefix) = pattern.strip_suffix("/...") {
                    path == prefix || path.starts_with(&format!("{prefix}/"))
                } else {
                    path == pattern
                }
            })
        })
        .collect();
    anyhow::ensure!(
        !selected.is_empty(),
        "no packages matched the given patterns"
    );
    Ok(selected)
}

fn exit_code(common: &CommonArgs, reported: bool) -> i32 {
    if common.set_exit_status && reported {
        1
    } else {
        0
    }
}
