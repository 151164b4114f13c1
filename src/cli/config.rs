//! Configuration file
//!
//! A RON file with three sections: `misc` for printer behaviour,
//! `user_defined_characters` for the mapping database, and `fonts`
//! with one entry per Epson typeface name. Missing keys keep their
//! defaults, so an empty file (or none at all) is valid.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, eyre, WrapErr};
use escp::chsets::{mapping::p_mapping_file, Registry};
use escp::graphics::Renderer;
use escp::interp::Pins;
use log::{info, LevelFilter};
use serde::Deserialize;

use super::pagesize;

/// Default configuration path probed when `-c` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "escp-tool.ron";

/// The whole configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Printer behaviour
    pub misc: Misc,
    /// User-defined character handling
    pub user_defined_characters: UserDefinedCharacters,
    /// Typeface sections, keyed by Epson typeface name
    pub fonts: BTreeMap<String, FontEntry>,
    /// Extra encodings loaded from mapping files at startup
    pub extra_encodings: Vec<ExtraEncoding>,
}

/// The `misc` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Misc {
    /// Log level: none, error, warning, info, debug
    pub loglevel: String,
    /// Where font files are searched
    pub default_font_path: PathBuf,
    /// Print head needles; None selects the ESC/P 2 nozzle head
    pub pins: Option<u8>,
    /// Printable-area margins in mm: (top, bottom, left, right)
    pub printable_area_margins_mm: Option<(f64, f64, f64, f64)>,
    /// Page size alias or "width,height" in points
    pub page_size: String,
    /// Single sheets or continuous paper
    pub single_sheets: bool,
    /// CR implies LF
    pub automatic_linefeed: bool,
    /// Ink dot rendering: "dots" or "rectangles"
    pub renderer: String,
    /// "yes" scales the regular face instead of using a condensed
    /// variant; "auto" prefers the variant when one exists
    pub condensed_fallback: String,
}

impl Default for Misc {
    fn default() -> Self {
        Misc {
            loglevel: "info".to_string(),
            default_font_path: PathBuf::from("/usr/share/fonts/truetype"),
            pins: None,
            printable_area_margins_mm: None,
            page_size: "A4".to_string(),
            single_sheets: true,
            automatic_linefeed: false,
            renderer: "dots".to_string(),
            condensed_fallback: "auto".to_string(),
        }
    }
}

/// The `user_defined_characters` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UserDefinedCharacters {
    /// JSON mapping database
    pub database_filepath: PathBuf,
    /// Directory for PNG dumps of received glyphs; empty disables them
    pub images_path: Option<PathBuf>,
}

impl Default for UserDefinedCharacters {
    fn default() -> Self {
        UserDefinedCharacters {
            database_filepath: PathBuf::from("user_defined_mapping.json"),
            images_path: None,
        }
    }
}

/// One typeface section: font file names for both spacing variants.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FontEntry {
    /// Search path override
    pub path: Option<PathBuf>,
    /// Fixed-spacing font file name
    pub fixed: Option<String>,
    /// Proportional font file name
    pub proportional: Option<String>,
}

/// An additional character table loaded from a mapping file.
#[derive(Debug, Deserialize)]
pub struct ExtraEncoding {
    /// Registry name of the table
    pub name: String,
    /// Mapping file with `0xNN 0xNNNN` lines
    pub path: PathBuf,
}

/// Load the configuration: the explicit `-c` path must exist, the
/// probed default may be absent.
pub fn load(path: Option<&Path>) -> eyre::Result<Config> {
    let path = match path {
        Some(path) => {
            if !path.exists() {
                return Err(eyre!("configuration file `{}` not found", path.display()));
            }
            path.to_path_buf()
        }
        None => {
            let probed = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !probed.exists() {
                return Ok(Config::default());
            }
            probed
        }
    };
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read `{}`", path.display()))?;
    let config: Config = ron::from_str(&text)
        .wrap_err_with(|| format!("failed to parse `{}`", path.display()))?;
    Ok(config)
}

impl Config {
    /// Log level from the `loglevel` key; `-v` occurrences raise it.
    pub fn log_level(&self, verbose: u8) -> LevelFilter {
        match verbose {
            1 => return LevelFilter::Debug,
            v if v >= 2 => return LevelFilter::Trace,
            _ => {}
        }
        match self.misc.loglevel.to_ascii_lowercase().as_str() {
            "none" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warning" | "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    /// Page size in points.
    pub fn page_size(&self) -> eyre::Result<(f64, f64)> {
        pagesize::parse(&self.misc.page_size)
            .ok_or_else(|| eyre!("page_size: unknown alias or size `{}`", self.misc.page_size))
    }

    /// Print head from config, overridable by the command line.
    pub fn pins(&self, override_pins: Option<u8>) -> eyre::Result<Pins> {
        match override_pins.or(self.misc.pins) {
            None => Ok(Pins::Nozzle),
            Some(9) => Ok(Pins::P9),
            Some(24) => Ok(Pins::P24),
            Some(48) => Ok(Pins::P48),
            Some(other) => Err(eyre!("pins: {} is not one of 9, 24, 48", other)),
        }
    }

    /// Dot renderer selection.
    pub fn renderer(&self) -> Renderer {
        if self.misc.renderer.eq_ignore_ascii_case("rectangles") {
            Renderer::Rectangles
        } else {
            Renderer::Dots
        }
    }

    /// Build the encoding registry, including the extra mapping files.
    /// A file that cannot be read or parsed is fatal: the run would
    /// silently decode with the wrong tables otherwise.
    pub fn build_registry(&self) -> eyre::Result<Registry> {
        let mut registry = Registry::with_builtin();
        for extra in &self.extra_encodings {
            let text = std::fs::read_to_string(&extra.path).wrap_err_with(|| {
                format!(
                    "encoding `{}`: failed to read `{}`",
                    extra.name,
                    extra.path.display()
                )
            })?;
            let table = p_mapping_file(&text)
                .map_err(|e| eyre!("encoding `{}`: {}", extra.name, e))?;
            registry.register(&extra.name, table);
            info!("registered encoding `{}`", extra.name);
        }
        Ok(registry)
    }

    /// Note configured typefaces whose font files are absent; the
    /// surface substitutes Courier or Times for them.
    pub fn report_missing_fonts(&self) {
        for (name, entry) in &self.fonts {
            let dir = entry
                .path
                .as_deref()
                .unwrap_or(&self.misc.default_font_path);
            for file in [entry.fixed.as_deref(), entry.proportional.as_deref()]
                .into_iter()
                .flatten()
            {
                if matches!(file, "Courier" | "Times") {
                    continue; // built-in fallbacks
                }
                if !dir.join(file).exists() && !Path::new(file).exists() {
                    info!(
                        "typeface `{}`: font `{}` not found, substituting a built-in face",
                        name, file
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_has_defaults() {
        let config: Config = ron::from_str("()").unwrap();
        assert_eq!(config.misc.page_size, "A4");
        assert!(config.misc.single_sheets);
        assert_eq!(config.pins(None).unwrap(), Pins::Nozzle);
    }

    #[test]
    fn misc_section_round_trip() {
        let config: Config = ron::from_str(
            r#"(
                misc: (
                    loglevel: "debug",
                    pins: Some(9),
                    page_size: "L-LETTER",
                    single_sheets: false,
                    renderer: "rectangles",
                ),
            )"#,
        )
        .unwrap();
        assert_eq!(config.pins(None).unwrap(), Pins::P9);
        assert_eq!(config.pins(Some(24)).unwrap(), Pins::P24);
        assert_eq!(config.page_size().unwrap(), (792.0, 612.0));
        assert_eq!(config.renderer(), Renderer::Rectangles);
    }

    #[test]
    fn invalid_pins_is_an_error() {
        let config = Config::default();
        assert!(config.pins(Some(12)).is_err());
    }
}
