//! # Mapping printer codepoints to Unicode
//!
//! Incoming bytes pass through several layers of indirection before a
//! glyph is known: the four character-table slots (`ESC ( t`, `ESC t`),
//! the international overlay (`ESC R`), the control-code printability
//! filter (`ESC 6`/`ESC 7`/`ESC I`/`ESC m`) and the user-defined RAM
//! set (`ESC &`, `ESC :`, `ESC %`). Lookup order: user-defined overlay,
//! then international overlay, then the active table, then U+FFFD.

use std::char::REPLACEMENT_CHARACTER as RCH;
use std::collections::BTreeMap;

use crate::interp::Pins;

pub mod intl;
pub mod mapping;
pub mod tables;
pub mod userdef;

use tables::Table;
use userdef::RamCharacters;

pub use userdef::CharStore;

/// The registry of installed encodings, immutable after startup.
#[derive(Debug)]
pub struct Registry {
    tables: BTreeMap<String, Table>,
}

impl Registry {
    /// Registry with all built-in tables installed.
    pub fn with_builtin() -> Self {
        let mut tables = BTreeMap::new();
        let mut put = |name: &str, table: Table| {
            tables.insert(name.to_string(), table);
        };
        put("italic", Table::italic());
        put("cp437", Table::dos(&tables::CP437_UPPER));
        put("cp850", Table::dos(&tables::CP850_UPPER));
        put("cp852", Table::dos(&tables::CP852_UPPER));
        put("cp860", Table::dos(&tables::CP860_UPPER));
        put("cp861", Table::dos(&tables::CP861_UPPER));
        put("cp863", Table::dos(&tables::CP863_UPPER));
        put("cp865", Table::dos(&tables::CP865_UPPER));
        put("cp866", Table::dos(&tables::CP866_UPPER));
        put("iso8859_1", tables::latin1());
        put("iso8859_7", Table::iso(&tables::ISO8859_7_UPPER));
        put("iso8859_9", tables::latin5());
        Registry { tables }
    }

    /// Install an additional table under a name.
    pub fn register(&mut self, name: &str, table: Table) {
        self.tables.insert(name.to_string(), table);
    }

    /// Look up an installed table.
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Whether `name` is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Encoding selected by the `ESC ( t` table id pair `(d2, d3)`, for the
/// ids whose code page is installed.
pub fn table_for_id(d2: u8, d3: u8) -> Option<&'static str> {
    match (d2, d3) {
        (0, 0) => Some("italic"),
        (1, 0) => Some("cp437"),
        (3, 0) => Some("cp850"),
        (7, 0) => Some("cp860"),
        (8, 0) => Some("cp863"),
        (9, 0) => Some("cp865"),
        (10, 0) => Some("cp852"),
        (14, 0) => Some("cp866"),
        (24, 0) => Some("cp861"),
        (29, 7) | (127, 7) => Some("iso8859_7"),
        (29, 16) | (127, 1) => Some("iso8859_1"),
        (31, 0) => Some("iso8859_9"),
        _ => None,
    }
}

/// The set of byte values currently treated as control codes (and
/// therefore swallowed instead of printed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFilter {
    low: u128,
    upper: u32,
}

impl CodeFilter {
    /// Nothing filtered: every code prints (ESC/P 2 default).
    pub const EMPTY: CodeFilter = CodeFilter { low: 0, upper: 0 };

    const SELECTED_LOW: u128 = {
        let mut bits: u128 = 0;
        let mut code = 0;
        while code <= 6 {
            bits |= 1 << code;
            code += 1;
        }
        bits |= (1 << 16) | (1 << 17) | (1 << 21) | (1 << 22) | (1 << 23);
        bits |= (1 << 25) | (1 << 26);
        let mut c = 28;
        while c <= 31 {
            bits |= 1 << c;
            c += 1;
        }
        bits
    };

    /// Codes 0x80–0x9F filtered (`ESC 7` state).
    pub const UPPER: CodeFilter = CodeFilter {
        low: 0,
        upper: u32::MAX,
    };

    /// Everything the hardware can filter: 0–6, 16, 17, 21–23, 25, 26,
    /// 28–31 and 0x80–0x9F (9-pin power-on state).
    pub const SELECTED: CodeFilter = CodeFilter {
        low: Self::SELECTED_LOW,
        upper: u32::MAX,
    };

    /// Power-on filter for a pin configuration.
    pub fn default_for(pins: Pins) -> CodeFilter {
        if pins == Pins::P9 {
            CodeFilter::SELECTED
        } else {
            CodeFilter::EMPTY
        }
    }

    /// Whether `byte` is currently swallowed as a control code.
    pub fn contains(self, byte: u8) -> bool {
        if byte < 0x80 {
            self.low & (1 << byte) != 0
        } else if byte < 0xa0 {
            self.upper & (1 << (byte - 0x80)) != 0
        } else {
            false
        }
    }

    /// Add the codes of `other` to the filter.
    pub fn insert(&mut self, other: CodeFilter) {
        self.low |= other.low;
        self.upper |= other.upper;
    }

    /// Remove the codes of `other` from the filter.
    pub fn remove(&mut self, other: CodeFilter) {
        self.low &= !other.low;
        self.upper &= !other.upper;
    }
}

/// The four character-table slots and everything layered on top.
#[derive(Debug)]
pub struct CharTables {
    /// Slot assignments; `None` marks a slot reserved for user-defined
    /// characters (slot 2 at power-on)
    pub slots: [Option<String>; 4],
    /// Index of the active slot
    pub active: usize,
    /// International character set country (`ESC R`)
    pub intl: u8,
    /// Control-code printability
    pub filter: CodeFilter,
    /// The RAM character set
    pub ram: RamCharacters,
    /// Whether `ESC % 1` routed printing through RAM
    pub ram_selected: bool,
}

impl CharTables {
    /// Power-on state for a pin configuration.
    pub fn new(pins: Pins) -> Self {
        let mut tables = CharTables {
            slots: Default::default(),
            active: 1,
            intl: 0,
            filter: CodeFilter::EMPTY,
            ram: RamCharacters::new(),
            ram_selected: false,
        };
        tables.reset(pins);
        tables
    }

    /// `ESC @` — restore the power-on slots, overlay and filter. The
    /// RAM character set survives, as on hardware.
    pub fn reset(&mut self, pins: Pins) {
        self.slots = [
            Some("italic".to_string()),
            Some("cp437".to_string()),
            None,
            Some("cp437".to_string()),
        ];
        self.active = 1;
        self.intl = 0;
        self.filter = CodeFilter::default_for(pins);
        self.ram_selected = false;
    }

    /// Name of the encoding in the active slot. A slot holding `None`
    /// (user-defined) reads as PC437, like the hardware's fallback.
    pub fn active_name(&self) -> &str {
        match &self.slots[self.active] {
            Some(name) => name.as_str(),
            None => "cp437",
        }
    }

    /// The active table, including the guaranteed PC437 fallback.
    pub fn active_table<'r>(&self, registry: &'r Registry) -> &'r Table {
        registry
            .get(self.active_name())
            .or_else(|| registry.get("cp437"))
            .expect("registry always installs cp437")
    }

    /// The active table with the international overlay applied, used
    /// when seeding RAM from ROM (`ESC :`).
    pub fn effective_table(&self, registry: &Registry) -> Table {
        let mut table = self.active_table(registry).clone();
        if self.intl != 0 {
            for &pos in &intl::OVERLAY_POSITIONS {
                if let Some(chr) = intl::substitute(self.intl, pos) {
                    table.chars[pos as usize] = chr;
                }
            }
        }
        table
    }

    /// Resolve a data byte to a renderable scalar.
    ///
    /// `None` means the byte is swallowed by the control-code filter.
    /// The italic table bypasses the filter: its upper half is entirely
    /// printable and no control codes are defined for it.
    pub fn resolve(&self, byte: u8, registry: &Registry) -> Option<char> {
        let italic = self.active_name() == "italic";
        if !italic && self.filter.contains(byte) {
            return None;
        }
        if self.ram_selected {
            if let Some(chr) = self.ram.decode(byte) {
                return Some(chr);
            }
        }
        if let Some(chr) = intl::substitute(self.intl, byte) {
            return Some(chr);
        }
        let chr = self.active_table(registry).decode(byte);
        Some(chr)
    }
}

#[cfg(test)]
mod chset_tests {
    use super::*;

    #[test]
    fn slot_assignment_and_selection() {
        let registry = Registry::with_builtin();
        let mut tables = CharTables::new(Pins::Nozzle);
        assert_eq!(tables.active_name(), "cp437");

        tables.slots[1] = Some("cp850".to_string());
        assert_eq!(tables.resolve(0x80, &registry), Some('Ç'));
        assert_eq!(tables.resolve(0xd0, &registry), Some('ð'));
    }

    #[test]
    fn intl_overlay_wins_over_table() {
        let registry = Registry::with_builtin();
        let mut tables = CharTables::new(Pins::Nozzle);
        tables.intl = 1; // France
        assert_eq!(tables.resolve(123, &registry), Some('é'));
        assert_eq!(tables.resolve(b'A', &registry), Some('A'));
    }

    #[test]
    fn ram_overlay_wins_over_everything() {
        let registry = Registry::with_builtin();
        let mut tables = CharTables::new(Pins::Nozzle);
        tables.ram.define(b'#', '✓');
        tables.intl = 3; // UK would print £ for 0x23
        tables.ram_selected = true;
        assert_eq!(tables.resolve(b'#', &registry), Some('✓'));
        tables.ram_selected = false;
        assert_eq!(tables.resolve(b'#', &registry), Some('£'));
    }

    #[test]
    fn filter_swallows_upper_controls() {
        let registry = Registry::with_builtin();
        let mut tables = CharTables::new(Pins::Nozzle);
        assert_eq!(tables.resolve(0x81, &registry), Some('ü'));
        tables.filter.insert(CodeFilter::UPPER);
        assert_eq!(tables.resolve(0x81, &registry), None);
        tables.filter.remove(CodeFilter::UPPER);
        assert_eq!(tables.resolve(0x81, &registry), Some('ü'));
    }

    #[test]
    fn nine_pin_default_filters_low_codes() {
        let registry = Registry::with_builtin();
        let tables = CharTables::new(Pins::P9);
        assert_eq!(tables.resolve(0x01, &registry), None);
        // 0x07 (BEL) is not in the switchable set
        assert_eq!(tables.resolve(0x07, &registry), Some('•'));
    }
}
