use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod app;
mod arguments;

use crate::arguments::Cmdline;

fn main() -> ExitCode {
    let cmdline = Cmdline::parse();

    let fmt_layer = fmt::layer().with_writer(std::io::stderr);

    // RUST_LOG wins over --debug.
    let filter_layer = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) if cmdline.debug => match EnvFilter::try_new("ldifcheck=debug") {
            Ok(f) => f,
            Err(e) => {
                eprintln!("ERROR! Unable to start tracing {:?}", e);
                return ExitCode::from(app::EXIT_FAILURE);
            }
        },
        Err(_) => EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse_lossy(""),
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    match app::run(&cmdline.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ldifcheck: {}", e);
            ExitCode::from(app::EXIT_FAILURE)
        }
    }
}
