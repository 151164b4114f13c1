//! Wiring between the command line, the configuration and the
//! interpreter.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use color_eyre::eyre::{self, eyre, WrapErr};
use escp::chsets::userdef::CharStore;
use escp::interp::{Interpreter, Settings};
use escp::layout::Paper;
use escp_pdf::{Base14Fonts, PdfSurface};
use log::info;

pub mod config;
pub mod opt;
pub mod pagesize;
pub mod udc;

use config::Config;
use opt::Options;

/// Run one conversion: read the printer stream, interpret it, write
/// the PDF, persist the user-defined character database.
pub fn process(opt: &Options, config: &Config) -> eyre::Result<()> {
    let data = read_input(&opt.input)?;
    if data.is_empty() {
        return Err(eyre!("input `{}` is empty", opt.input.display()));
    }
    info!("loaded {} bytes from `{}`", data.len(), opt.input.display());

    let page_size = config.page_size()?;
    let pins = config.pins(opt.pins)?;
    let single_sheet = if opt.single_sheets {
        true
    } else if opt.no_single_sheets {
        false
    } else {
        config.misc.single_sheets
    };
    let margins_mm = config
        .misc
        .printable_area_margins_mm
        .unwrap_or_else(|| Paper::default_margins_mm(single_sheet));
    let paper = Paper::new(page_size, margins_mm, single_sheet);

    let registry = config.build_registry()?;
    config.report_missing_fonts();
    let fonts = Base14Fonts;

    let db_path = opt
        .userdef_db
        .clone()
        .unwrap_or_else(|| config.user_defined_characters.database_filepath.clone());
    let mut store = udc::JsonStore::open(db_path, config.user_defined_characters.images_path.clone());

    let out: Box<dyn Write> = if opt.output == Path::new("-") {
        Box::new(io::stdout())
    } else {
        let file = File::create(&opt.output)
            .wrap_err_with(|| format!("cannot write output `{}`", opt.output.display()))?;
        Box::new(BufWriter::new(file))
    };
    let mut surface = PdfSurface::new(out, (page_size.0 as f32, page_size.1 as f32));

    let settings = Settings {
        pins,
        paper,
        automatic_linefeed: config.misc.automatic_linefeed,
        renderer: config.renderer(),
    };

    let result = {
        let store: &mut dyn CharStore = &mut store;
        let mut interp = Interpreter::new(settings, &registry, &fonts, store);
        interp.run(&data[..], &mut surface)
    };
    store.save()?;
    result.wrap_err("fatal decode error")?;
    info!("wrote `{}`", opt.output.display());
    Ok(())
}

fn read_input(path: &Path) -> eyre::Result<Vec<u8>> {
    let mut data = Vec::new();
    if path == Path::new("-") {
        io::stdin()
            .lock()
            .read_to_end(&mut data)
            .wrap_err("failed to read stdin")?;
    } else {
        File::open(path)
            .wrap_err_with(|| format!("failed to open `{}`", path.display()))?
            .read_to_end(&mut data)
            .wrap_err_with(|| format!("failed to read `{}`", path.display()))?;
    }
    Ok(data)
}
