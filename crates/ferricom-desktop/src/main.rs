//! ferricom: an NES emulator.
//!
//! Two threads: this (main) thread owns the window and the event pump;
//! the emulation thread owns the console and publishes frames through a
//! mutex/condvar slot. With `--debugger` the emulation thread runs the
//! command shell instead of the free-running loop.
//!
//! Exit codes: 0 on a clean exit, 1 for usage/front-end errors, 2 when
//! the cartridge fails to load.

mod config;
mod emulation;
mod input;
mod repl;
mod sync;
mod video;

use std::fs::{self, File};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferricom_core::{Console, Debugger};

use crate::config::Config;
use crate::input::KeyMap;
use crate::repl::Repl;
use crate::sync::Shared;

#[derive(Debug, Parser)]
#[command(name = "ferricom", version, about = "NES emulator")]
struct Args {
    /// ROM file (.nes)
    rom: PathBuf,

    /// Attach the command-line debugger
    #[arg(short, long)]
    debugger: bool,

    /// Configuration file (defaults to the platform config path)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the log to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Integer window scale, 1-8 (overrides the config)
    #[arg(long)]
    scale: Option<u32>,

    /// Do not couple emulation speed to frame presentation
    #[arg(long)]
    free_run: bool,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    if let Err(err) = init_logging(args.log_file.as_deref()) {
        eprintln!("could not open log file: {err}");
        return ExitCode::from(1);
    }

    let config = match &args.config {
        Some(path) => Config::load(path),
        None => Config::load_default_location(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };

    let rom_data = match fs::read(&args.rom) {
        Ok(data) => data,
        Err(err) => {
            eprintln!("could not read {}: {err}", args.rom.display());
            return ExitCode::from(2);
        }
    };
    let console = match Console::new(&rom_data) {
        Ok(console) => console,
        Err(err) => {
            eprintln!("could not load {}: {err}", args.rom.display());
            return ExitCode::from(2);
        }
    };

    let rom_name = args
        .rom
        .file_stem()
        .map_or_else(|| "rom".to_string(), |s| s.to_string_lossy().into_owned());
    let title = if args.debugger {
        format!("ferricom (debugger) - {rom_name}")
    } else {
        format!("ferricom - {rom_name}")
    };

    let shared = Arc::new(Shared::new(!args.free_run));
    let keymap = KeyMap::from_config(&config);
    let scale = args.scale.unwrap_or(config.scale);

    let emu_shared = Arc::clone(&shared);
    let with_debugger = args.debugger;
    let emu_thread = thread::spawn(move || {
        if with_debugger {
            Repl::new(Debugger::new(console), emu_shared).run();
        } else {
            emulation::run(console, &emu_shared);
        }
    });

    let result = video::run(Arc::clone(&shared), keymap, title, scale);

    // Whatever ended the event loop, make sure the emulation thread
    // drains before we leave.
    shared.stop();
    let _ = emu_thread.join();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("event loop failed: {err}");
            ExitCode::from(1)
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` selects the filter.
fn init_logging(log_file: Option<&std::path::Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}
