//! Stevedore CLI - builds signed, documented module repositories

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

use stevedore::compile::{CommandCompiler, Diagnostic};
use stevedore::core::ModuleSource;
use stevedore::docs::{CommandEngine, DocEngine};
use stevedore::ops::{build_repository, BuildOptions, ReferenceInput};
use stevedore::sign::KeyFileSigner;

/// Exit code for argument errors (EX_USAGE).
const EXIT_USAGE: i32 = 64;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version go to stdout and exit cleanly; every
            // other parse failure is a usage error.
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                let _ = e.print();
                std::process::exit(0);
            }
            println!("{}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stevedore=debug")
    } else {
        EnvFilter::new("stevedore=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let compiler = CommandCompiler::new(&cli.compiler)?;
    let signer = KeyFileSigner::load(&cli.key)?;
    let engine: Option<CommandEngine> = if cli.skip_docs {
        None
    } else {
        Some(CommandEngine::new(&cli.doc_engine)?)
    };

    let opts = BuildOptions {
        root: cli.root,
        host_assembly: cli.host_assembly,
        install_root: cli.install_root,
    };

    let mut input = StdinReferenceInput;
    let report = build_repository(
        &compiler,
        &signer,
        engine.as_ref().map(|e| e as &dyn DocEngine),
        &mut input,
        &opts,
    )?;

    eprintln!("built {} module package(s)", report.packages.len());
    Ok(())
}

/// Interactive fallback when automatic reference resolution fails: prints
/// the compiler error and prompts for a comma-separated list of assembly
/// names to add.
struct StdinReferenceInput;

impl ReferenceInput for StdinReferenceInput {
    fn provide(&mut self, source: &ModuleSource, diagnostic: &Diagnostic) -> Result<Vec<String>> {
        eprintln!("compilation of {} failed:", source.file_name());
        eprintln!("{}", diagnostic);
        eprint!("assembly names to add as references (comma-separated): ");
        io::stderr().flush().ok();

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read assembly names from stdin")?;
        if read == 0 {
            bail!(
                "no input available to resolve references for {}",
                source.file_name()
            );
        }

        Ok(line
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }
}
