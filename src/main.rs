//! # escp-tool
//!
//! Interpret an Epson ESC/P or ESC/P 2 printer stream and render it
//! as a PDF document with selectable text.

use color_eyre::eyre;
use log::debug;
use structopt::StructOpt;

mod cli;

use cli::opt::Options;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Options::from_args();
    let config = cli::config::load(opt.config.as_deref())?;
    pretty_env_logger::formatted_builder()
        .filter_level(config.log_level(opt.verbose))
        .init();
    debug!("escp-tool {}", env!("CARGO_PKG_VERSION"));
    cli::process(&opt, &config)
}
