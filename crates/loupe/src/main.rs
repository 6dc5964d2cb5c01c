//! Entry point: parses the CLI, initialises tracing and dispatches to the
//! listener (`run`) or the `snapshot` debug command.
//!
//! - `cli` defines the clap surface and maps it onto `MagnifierConfig`.
//! - `run` hosts the trigger listener and one-shot mode.
//! - `grab` keeps the passive trigger grab and overlay focus in step with
//!   the session.
//! - `xdisplay` wraps the Xlib connection and reads root window pixels.
//! - `snapshot` dumps a capture to PNG.

mod cli;
mod grab;
mod run;
mod snapshot;
mod xdisplay;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Snapshot(args)) => snapshot::run(args),
        None => run::run(cli.run),
    }
}
