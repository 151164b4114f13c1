//! Command line options

use std::path::PathBuf;

use structopt::StructOpt;

/// Render an Epson ESC/P or ESC/P 2 printer stream as a PDF document.
#[derive(Debug, StructOpt)]
pub struct Options {
    /// Raw printer stream; use `-` to read from stdin
    pub input: PathBuf,

    /// PDF output file; use `-` to write to stdout
    #[structopt(short = "o", long = "output", default_value = "output.pdf")]
    pub output: PathBuf,

    /// Configuration file (default: ./escp-tool.ron if present)
    #[structopt(short = "c", long = "config")]
    pub config: Option<PathBuf>,

    /// Number of needles of the print head (9, 24, 48); leave unset
    /// for modern ESC/P 2 printers
    #[structopt(long)]
    pub pins: Option<u8>,

    /// Force single-sheet paper handling
    #[structopt(long)]
    pub single_sheets: bool,

    /// Force continuous (fan-fold) paper handling
    #[structopt(long, conflicts_with = "single-sheets")]
    pub no_single_sheets: bool,

    /// Mapping file for user-defined character codes
    #[structopt(long = "db")]
    pub userdef_db: Option<PathBuf>,

    /// More log output (-v: debug, -vv: trace)
    #[structopt(short = "v", parse(from_occurrences))]
    pub verbose: u8,
}
