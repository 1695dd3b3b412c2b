//! `bb` — edit, lint, render and run block pages from a shell.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Command};
use std::io::Read;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity.log_level_filter());

    let result = match cli.command {
        Command::New { name } => Ok(commands::new_page(&name)),
        Command::Add {
            data,
            block_type,
            parent,
        } => read_data(&data).and_then(|d| {
            commands::add(&d, block_type, parent.as_deref()).map(|(encoded, id)| {
                eprintln!("added {id}");
                encoded
            })
        }),
        Command::Update { data, id, patch } => {
            read_data(&data).and_then(|d| commands::update(&d, &id, &patch))
        }
        Command::Delete { data, id } => read_data(&data).and_then(|d| commands::delete(&d, &id)),
        Command::Tree { data, select } => {
            read_data(&data).and_then(|d| commands::tree(&d, select.as_deref()))
        }
        Command::Lint { data } => read_data(&data).and_then(|d| commands::lint(&d)),
        Command::Render { data } => read_data(&data).and_then(|d| commands::render(&d)),
        Command::Click {
            data,
            ids,
            instruction_limit,
        } => read_data(&data).and_then(|d| commands::click(&d, &ids, instruction_limit)),
    };

    match result {
        Ok(out) => {
            if !out.is_empty() {
                println!("{}", out.trim_end_matches('\n'));
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG`, when set, refines the level chosen on the command line.
fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// `-` reads the encoded page from stdin.
fn read_data(arg: &str) -> Result<String, String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .map_err(|e| format!("failed to read stdin: {e}"))?;
    Ok(buf.trim().to_string())
}
