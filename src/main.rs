mod config;
mod manager;
mod process;
mod tui;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use config::Opts;
use manager::operations::NixSignaller;
use process::ProcfsSource;
use tui::app::Dashboard;
use tui::input::TerminalInput;
use tui::render::{restore_terminal, TerminalRenderer};

fn main() -> Result<()> {
    let opts = Opts::parse();
    config::init_logging(&opts)?;
    info!("Starting proctop: {:?}", opts);

    // Give the terminal back before a panic message is printed
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore_terminal();
        default_hook(panic_info);
    }));

    let res = run(&opts);
    restore_terminal();

    if let Err(e) = &res {
        error!("proctop error: {:#}", e);
    }
    res
}

fn run(opts: &Opts) -> Result<()> {
    let renderer = TerminalRenderer::stdout(usize::from(opts.name_width))?;
    let mut dashboard = Dashboard::new(ProcfsSource, renderer, NixSignaller, opts.intervals());
    dashboard.run(&mut TerminalInput);
    Ok(())
}
