//! parsh CLI entry point.
//!
//! Usage:
//!   parsh                      # interactive session, serial mode
//!   parsh batch.txt            # run a script serially
//!   parsh -p batch.txt         # run a script in parallel mode

use anyhow::{Context, Result};
use argh::FromArgs;
use parsh::env::Environment;
use parsh::io_adapters::{InteractiveSource, ScriptSource};
use parsh::{Mode, Session};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// A tiny command interpreter that runs programs serially or in parallel.
struct Args {
    /// run the script's commands in parallel, reporting exit codes in
    /// launch order at end-of-input (script mode only)
    #[argh(switch, short = 'p')]
    parallel: bool,

    /// prompt shown before each interactive line
    #[argh(option, default = "String::from(\"> \")")]
    prompt: String,

    /// script to run non-interactively; interactive mode when omitted
    #[argh(positional)]
    script: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Diagnostics go to the logger (respects RUST_LOG); report lines for
    // executed commands go to stdout.
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args: Args = argh::from_env();
    let env = Environment::new();
    let mut stdout = std::io::stdout();

    match args.script {
        Some(path) => {
            let mode = if args.parallel {
                Mode::Parallel
            } else {
                Mode::Serial
            };
            let mut source = ScriptSource::open(&path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            Session::new(mode, "").run(&mut source, &mut stdout, &env)
        }
        None => {
            let mut source =
                InteractiveSource::new().context("cannot initialize the line editor")?;
            Session::new(Mode::Serial, args.prompt).run(&mut source, &mut stdout, &env)
        }
    }
}
