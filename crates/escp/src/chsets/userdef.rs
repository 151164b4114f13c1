//! # User-defined (RAM) characters
//!
//! `ESC &` downloads glyph bitmaps into printer RAM, `ESC :` seeds RAM
//! from the active ROM table, `ESC %` switches the RAM set in and out.
//! A vector renderer cannot print the downloaded bitmaps as such;
//! instead every definition is reported to a [`CharStore`] keyed by a
//! stable fingerprint, so an operator can assign Unicode mappings that
//! are picked up on the next run. RAM definitions made under different
//! typography settings erase each other, exactly like the hardware.

use serde::{Deserialize, Serialize};

use super::tables::Table;
use crate::typography::{Quality, Script};

/// The traits that identify one generation of RAM characters.
///
/// Defining characters under different settings clears the previous
/// set; the settings also become part of the on-disk database entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdcSettings {
    /// Print quality at definition time (0 = draft, 1 = LQ)
    pub mode: u8,
    /// Proportional spacing at definition time
    pub proportional_spacing: bool,
    /// Super/subscript at definition time
    pub scripting: Option<Script>,
}

impl UdcSettings {
    /// Capture the current typography traits.
    pub fn capture(quality: Quality, proportional: bool, script: Option<Script>) -> Self {
        UdcSettings {
            mode: match quality {
                Quality::Draft => 0,
                Quality::Letter => 1,
            },
            proportional_spacing: proportional,
            scripting: script,
        }
    }
}

/// One downloaded glyph: column-major bitmap plus side bearings, as
/// carried by `ESC &`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// Blank columns left of the glyph (a0)
    pub space_left: u8,
    /// Printed columns (a1)
    pub width: u8,
    /// Blank columns right of the glyph (a2)
    pub space_right: u8,
    /// Bytes per printed column
    pub bytes_per_column: usize,
    /// Column-major dot data, `width * bytes_per_column` bytes
    pub data: Vec<u8>,
}

/// Persistent mapping store for user-defined characters.
///
/// The production implementation keeps a JSON database on disk
/// (and optionally dumps glyph bitmaps as PNG files); tests use
/// [`NullStore`].
pub trait CharStore {
    /// The operator-assigned Unicode scalar for a code, if any.
    fn lookup(&self, fingerprint: &str, code: u8) -> Option<char>;

    /// Report a freshly defined glyph so the store can create a
    /// placeholder entry and persist the bitmap.
    fn record(&mut self, fingerprint: &str, settings: &UdcSettings, code: u8, glyph: &GlyphBitmap);
}

/// A store that remembers nothing.
#[derive(Debug, Default)]
pub struct NullStore;

impl CharStore for NullStore {
    fn lookup(&self, _fingerprint: &str, _code: u8) -> Option<char> {
        None
    }

    fn record(
        &mut self,
        _fingerprint: &str,
        _settings: &UdcSettings,
        _code: u8,
        _glyph: &GlyphBitmap,
    ) {
    }
}

/// Deterministic fingerprint over the font identity of a RAM set.
///
/// FNV-1a 64 over (typeface id, proportional flag, definition mode),
/// truncated to seven hex digits. The algorithm is part of the on-disk
/// database format and must not change.
pub fn fingerprint(typeface: u8, proportional: bool, mode: u8) -> String {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for byte in [typeface, proportional as u8, mode] {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    format!("{:07x}", hash & 0x0fff_ffff)
}

/// The RAM character set and its decoding overlay.
#[derive(Debug, Default)]
pub struct RamCharacters {
    settings: Option<UdcSettings>,
    mapping: std::collections::BTreeMap<u8, char>,
    rom: Option<Table>,
}

impl RamCharacters {
    /// Empty RAM.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sync the typography traits; a change erases all RAM characters.
    pub fn sync_settings(&mut self, settings: UdcSettings) {
        if self.settings != Some(settings) {
            log::debug!("RAM character traits changed, dropping {} chars", self.mapping.len());
            self.mapping.clear();
            self.rom = None;
        }
        self.settings = Some(settings);
    }

    /// Explicit erase (`ESC ( G` clears all user-defined characters).
    pub fn clear(&mut self) {
        self.settings = None;
        self.mapping.clear();
        self.rom = None;
    }

    /// Store one decoded character.
    pub fn define(&mut self, code: u8, chr: char) {
        self.mapping.insert(code, chr);
    }

    /// `ESC :` — copy the ROM table into RAM. ESC/P 2 copies codes
    /// 0–127; 9-pin hardware copies the full 256.
    pub fn copy_from_rom(&mut self, table: &Table, codes: u16) {
        self.mapping.clear();
        for code in 0..codes {
            self.mapping.insert(code as u8, table.decode(code as u8));
        }
        self.rom = Some(table.clone());
    }

    /// `ESC t 2` on non-ESC/P 2 hardware — move the RAM set to the
    /// upper half and refill the lower half from ROM.
    pub fn shift_upper(&mut self) {
        let shifted: std::collections::BTreeMap<u8, char> = self
            .mapping
            .iter()
            .filter(|(&code, _)| code < 0x80)
            .map(|(&code, &chr)| (code + 0x80, chr))
            .collect();
        self.mapping = shifted;
        for code in 0..0x80u8 {
            let chr = match &self.rom {
                Some(table) => table.decode(code),
                None => char::REPLACEMENT_CHARACTER,
            };
            self.mapping.insert(code, chr);
        }
    }

    /// Decode through the RAM overlay.
    pub fn decode(&self, code: u8) -> Option<char> {
        self.mapping.get(&code).copied()
    }

    /// Whether any characters are defined.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chsets::tables::{Table, CP437_UPPER};

    fn lq_settings() -> UdcSettings {
        UdcSettings {
            mode: 1,
            proportional_spacing: false,
            scripting: None,
        }
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = fingerprint(0, false, 1);
        let b = fingerprint(0, false, 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        assert_ne!(a, fingerprint(1, false, 1));
        assert_ne!(a, fingerprint(0, true, 1));
    }

    #[test]
    fn settings_change_erases_ram() {
        let mut ram = RamCharacters::new();
        ram.sync_settings(lq_settings());
        ram.define(0x41, '¾');
        assert_eq!(ram.decode(0x41), Some('¾'));

        // same settings keep the set
        ram.sync_settings(lq_settings());
        assert_eq!(ram.decode(0x41), Some('¾'));

        let mut sub = lq_settings();
        sub.scripting = Some(Script::Sub);
        ram.sync_settings(sub);
        assert_eq!(ram.decode(0x41), None);
    }

    #[test]
    fn rom_copy_and_shift() {
        let table = Table::dos(&CP437_UPPER);
        let mut ram = RamCharacters::new();
        ram.sync_settings(lq_settings());
        ram.copy_from_rom(&table, 128);
        assert_eq!(ram.decode(b'A'), Some('A'));
        assert_eq!(ram.decode(0x80), None);

        ram.shift_upper();
        assert_eq!(ram.decode(0x80 + b'A'), Some('A'));
        assert_eq!(ram.decode(b'A'), Some('A'));
    }
}
