//! Guidebot CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;

use guidebot::cli::args::GuidebotArgs;
use guidebot::cli::commands::execute_command;

fn main() {
    let args = GuidebotArgs::parse();

    Builder::new()
        .filter_level(args.log_level())
        .parse_env("GUIDEBOT_LOG")
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
