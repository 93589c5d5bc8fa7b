mod action;
mod attach;
mod browser;
mod cli;
mod commands;
mod complete;
mod config;
mod constants;
mod error;
mod git;
mod locator;
mod naming;
mod net;
mod process;
mod resolve;
mod runtime;
mod session;
mod shell;
mod ui;
mod vscode;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::CompleteEnv;
use cli::Cli;
use config::Config;

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    CompleteEnv::with_factory(Cli::command)
        .var(complete::COMPLETE_ENV_VAR)
        .complete();
    let cli = Cli::parse();
    ui::init_logging(cli.verbose);
    let config = Config::load()?;
    let action = commands::run(cli.command, config)?;
    action::perform(action)
}
