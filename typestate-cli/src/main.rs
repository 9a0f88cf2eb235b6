//! typestate-cli — offline companion to the `typestate!` macro.
//!
//! Reconstructs typestate graphs from source text, outside compilation, and
//! either verifies them or renders them.
//!
//! # Usage
//!
//! ```bash
//! # Re-run the validation the macros perform, plus the strict sweep
//! typestate-cli verify src/
//!
//! # GraphViz rendering, one unified graph with clusters
//! typestate-cli dot src/ > typestates.dot
//!
//! # One digraph per typestate, orthogonal edges
//! typestate-cli dot --separate --splines=ortho src/
//!
//! # Preview the artifacts the macro generates
//! typestate-cli codegen src/lib.rs
//! ```
//!
//! Exit code is 0 on success and 1 on any error. Diagnostics go to stdout
//! for `verify` (they are the output) and to stderr otherwise; set
//! `RUST_LOG=typestate_cli=debug` for tracing.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod dot;
mod parse;
mod render;
mod scan;
mod verify;

#[derive(Parser)]
#[command(name = "typestate-cli")]
#[command(version)]
#[command(about = "Verify and render typestate declarations found in Rust sources", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every declaration and transition function, and report
    /// strict-transitions violations
    Verify {
        /// Files or directories to scan for `.rs` sources
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Emit a GraphViz DOT rendering of the declared typestates
    Dot {
        /// Files or directories to scan for `.rs` sources
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// One digraph per typestate instead of a unified graph
        #[arg(long)]
        separate: bool,

        /// Drop all style decoration (shapes, dashes, labels)
        #[arg(long)]
        no_style: bool,

        /// Edge routing passed through to GraphViz
        #[arg(long, value_enum)]
        splines: Option<dot::Splines>,
    },

    /// Print the artifacts the macro would generate for each typestate
    Codegen {
        /// Files or directories to scan for `.rs` sources
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Verify { paths } => {
            let units = scan::load_units(&paths)?;
            let report = verify::verify(&units);
            print!("{report}");
            Ok(if report.errors() > 0 { 1 } else { 0 })
        }
        Commands::Dot {
            paths,
            separate,
            no_style,
            splines,
        } => {
            let units = scan::load_units(&paths)?;
            let registry = verify::collect_registry(&units)?;
            let options = dot::DotOptions {
                separate,
                styled: !no_style,
                splines,
            };
            print!("{}", dot::render(&registry, &options));
            Ok(0)
        }
        Commands::Codegen { paths } => {
            let units = scan::load_units(&paths)?;
            let registry = verify::collect_registry(&units)?;
            let rendered = render::render(&registry)?;
            print!("{rendered}");
            Ok(0)
        }
    }
}
