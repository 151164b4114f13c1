//! User-defined character persistence
//!
//! Every glyph a job downloads with `ESC &` gets an entry in a JSON
//! database, keyed by `"<fingerprint>_<mode>"`. Fresh entries map to
//! U+FFFD; the operator edits the file to assign real characters,
//! which later runs pick up. With `images_path` configured, each
//! received bitmap is additionally dumped as a PNG so the operator can
//! see what to map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{self, WrapErr};
use escp::chsets::userdef::{CharStore, GlyphBitmap, UdcSettings};
use escp::typography::Script;
use image::GrayImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// One database entry: the typography traits at definition time plus
/// the code-to-string mappings, flattened into the same JSON object.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    mode: u8,
    proportional_spacing: bool,
    scripting: Option<Script>,
    #[serde(flatten)]
    codes: BTreeMap<String, String>,
}

/// JSON-backed [`CharStore`].
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    images_path: Option<PathBuf>,
    database: BTreeMap<String, Entry>,
    dirty: bool,
}

impl JsonStore {
    /// Open (or create in memory) the database at `path`.
    pub fn open(path: PathBuf, images_path: Option<PathBuf>) -> Self {
        let database = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(database) => database,
                Err(e) => {
                    warn!("`{}` is not a valid mapping database: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        JsonStore {
            path,
            images_path,
            database,
            dirty: false,
        }
    }

    /// Write the database back if anything changed.
    pub fn save(&mut self) -> eyre::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.database)?;
        std::fs::write(&self.path, text)
            .wrap_err_with(|| format!("failed to write `{}`", self.path.display()))?;
        self.dirty = false;
        Ok(())
    }

    fn dump_png(&self, dir: &Path, key: &str, code: u8, glyph: &GlyphBitmap) {
        let height = (glyph.bytes_per_column * 8) as u32;
        let width = glyph.width.max(1) as u32;
        let mut img = GrayImage::from_pixel(width, height, image::Luma([0xff]));
        for (column, bytes) in glyph.data.chunks(glyph.bytes_per_column).enumerate() {
            for (row_byte, &byte) in bytes.iter().enumerate() {
                for bit in 0..8u32 {
                    if byte & (0x80 >> bit) != 0 {
                        let y = row_byte as u32 * 8 + bit;
                        img.put_pixel(column as u32, y, image::Luma([0x00]));
                    }
                }
            }
        }
        let file = dir.join(format!("char_{}_{:02x}.png", key, code));
        if let Err(e) = img.save(&file) {
            warn!("failed to save glyph image `{}`: {}", file.display(), e);
        }
    }
}

impl CharStore for JsonStore {
    fn lookup(&self, fingerprint: &str, code: u8) -> Option<char> {
        let prefix = format!("{}_", fingerprint);
        let entry = self
            .database
            .iter()
            .find(|(key, _)| key.starts_with(&prefix))
            .map(|(_, entry)| entry)?;
        let mapped = entry.codes.get(&code.to_string())?;
        let chr = mapped.chars().next()?;
        if chr == char::REPLACEMENT_CHARACTER {
            None
        } else {
            Some(chr)
        }
    }

    fn record(&mut self, fingerprint: &str, settings: &UdcSettings, code: u8, glyph: &GlyphBitmap) {
        let key = format!("{}_{}", fingerprint, settings.mode);
        let entry = self.database.entry(key.clone()).or_insert_with(|| Entry {
            mode: settings.mode,
            proportional_spacing: settings.proportional_spacing,
            scripting: settings.scripting,
            codes: BTreeMap::new(),
        });
        entry
            .codes
            .entry(code.to_string())
            .or_insert_with(|| char::REPLACEMENT_CHARACTER.to_string());
        self.dirty = true;
        debug!("recorded user-defined character {:#04x} under `{}`", code, key);
        if let Some(dir) = self.images_path.clone() {
            if std::fs::create_dir_all(&dir).is_ok() {
                self.dump_png(&dir, &key, code, glyph);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph() -> GlyphBitmap {
        GlyphBitmap {
            space_left: 0,
            width: 2,
            space_right: 0,
            bytes_per_column: 3,
            data: vec![0xff; 6],
        }
    }

    fn settings() -> UdcSettings {
        UdcSettings {
            mode: 1,
            proportional_spacing: false,
            scripting: None,
        }
    }

    #[test]
    fn fresh_definition_maps_to_nothing() {
        let mut store = JsonStore::open(PathBuf::from("/nonexistent.json"), None);
        store.record("abc1234", &settings(), 0x41, &glyph());
        assert_eq!(store.lookup("abc1234", 0x41), None);
    }

    #[test]
    fn operator_mapping_is_returned() {
        let mut store = JsonStore::open(PathBuf::from("/nonexistent.json"), None);
        store.record("abc1234", &settings(), 0x41, &glyph());
        store
            .database
            .get_mut("abc1234_1")
            .unwrap()
            .codes
            .insert("65".to_string(), "Æ".to_string());
        assert_eq!(store.lookup("abc1234", 0x41), Some('Æ'));
    }

    #[test]
    fn database_json_shape() {
        let mut store = JsonStore::open(PathBuf::from("/nonexistent.json"), None);
        store.record("abc1234", &settings(), 1, &glyph());
        let text = serde_json::to_string(&store.database).unwrap();
        assert!(text.contains("\"abc1234_1\""));
        assert!(text.contains("\"mode\":1"));
        assert!(text.contains("\"proportional_spacing\":false"));
        assert!(text.contains("\"1\":\"\u{fffd}\""));
    }
}
