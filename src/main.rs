//! gotmpl command-line interface.
//!
//! Usage:
//!   gotmpl <TEMPLATE> <DEST> <BINDING>...
//!
//! Examples:
//!   # New package `records` from the template in ./list
//!   gotmpl ./list records Item=MyRecord@example.com/extpkg
//!
//!   # Prefixed files next to the sources of the current package
//!   GOPACKAGE=main gotmpl ./list .gen Item=int64

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gotmpl::{Environment, Generator, Options, StabilizeMode, TypeSubstitutionMap};

/// Instantiate a Go template package with concrete types.
#[derive(Parser, Debug)]
#[command(name = "gotmpl", version)]
#[command(about = "Instantiate a Go template package with concrete types")]
struct Args {
    /// Template package: a logical path under $GOPATH/src, or a path
    /// starting with `/`, `./` or `../`
    template: String,

    /// Destination package directory, or `.<prefix>` to write
    /// `<prefix>_<file>` next to the sources of $GOPACKAGE
    dest: String,

    /// Substitutions, each `Placeholder=Type` or `Placeholder=Type@import/path`
    #[arg(required = true)]
    bindings: Vec<String>,

    /// Print and reparse the rewritten files instead of re-resolving them
    #[arg(long)]
    reparse: bool,

    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let map = TypeSubstitutionMap::from_bindings(&args.bindings).context("invalid substitution")?;
    let stabilize = if args.reparse {
        StabilizeMode::Reparse
    } else {
        StabilizeMode::Resolve
    };
    let options = Options::from_current_dir()?.with_stabilize(stabilize);
    let generator = Generator::new(Environment::from_process(), options);

    let report = generator
        .run(&args.template, &args.dest, &map)
        .with_context(|| format!("failed to instantiate {} into {}", args.template, args.dest))?;
    for path in &report.written {
        tracing::info!(path = %path.display(), "wrote");
    }
    Ok(())
}
