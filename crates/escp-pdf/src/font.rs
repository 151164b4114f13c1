//! Base-14 font resolution
//!
//! The interpreter's typefaces map onto the standard PDF fonts:
//! fixed-pitch requests use the Courier family, proportional requests
//! Times or Helvetica depending on the Epson typeface id. Faces that
//! do not exist (condensed, exotic typefaces) substitute the closest
//! standard font and leave the simulation to the interpreter.

use escp::surface::{FontId, FontRequest, FontResolver, FontSelection};

/// The base-14 fonts used by the surface, indexed by [`FontId`].
pub const BASE14: [&str; 12] = [
    "Courier",
    "Courier-Bold",
    "Courier-Oblique",
    "Courier-BoldOblique",
    "Times-Roman",
    "Times-Bold",
    "Times-Italic",
    "Times-BoldItalic",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-Oblique",
    "Helvetica-BoldOblique",
];

const FAMILY_COURIER: u16 = 0;
const FAMILY_TIMES: u16 = 4;
const FAMILY_HELVETICA: u16 = 8;

/// Resolver over the base-14 fonts.
///
/// Typeface availability comes from the configuration file: a
/// typeface listed there resolves to its configured family, everything
/// else substitutes Courier (fixed) or Times (proportional).
#[derive(Debug, Default)]
pub struct Base14Fonts;

impl Base14Fonts {
    fn family(req: &FontRequest) -> u16 {
        if !req.proportional {
            return FAMILY_COURIER;
        }
        match req.typeface {
            // Sans serif and Sans serif H
            1 | 11 => FAMILY_HELVETICA,
            _ => FAMILY_TIMES,
        }
    }
}

impl FontResolver for Base14Fonts {
    fn select(&self, req: &FontRequest) -> FontSelection {
        let mut index = Self::family(req);
        if req.bold {
            index += 1;
        }
        if req.italic {
            index += 2;
        }
        FontSelection {
            font: FontId(index),
            bold: req.bold,
            italic: req.italic,
            condensed: false,
        }
    }

    fn advance(&self, font: FontId, ch: char) -> f32 {
        let widths: &[u16; 95] = match font.0 {
            FAMILY_TIMES..=7 => &TIMES_WIDTHS,
            FAMILY_HELVETICA..=11 => &HELVETICA_WIDTHS,
            _ => return 0.6,
        };
        let code = ch as u32;
        if (0x20..0x7f).contains(&code) {
            widths[(code - 0x20) as usize] as f32 / 1000.0
        } else {
            0.5
        }
    }
}

/// Times-Roman AFM advance widths for ASCII 0x20–0x7E, in 1/1000 em.
#[rustfmt::skip]
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

/// Helvetica AFM advance widths for ASCII 0x20–0x7E, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Encode a Unicode scalar as a WinAnsi (CP1252) byte, if the glyph
/// exists there.
pub fn winansi(ch: char) -> Option<u8> {
    let code = ch as u32;
    match code {
        0x20..=0x7e => Some(code as u8),
        0xa0..=0xff => Some(code as u8),
        0x20ac => Some(0x80),
        0x201a => Some(0x82),
        0x0192 => Some(0x83),
        0x201e => Some(0x84),
        0x2026 => Some(0x85),
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02c6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8a),
        0x2039 => Some(0x8b),
        0x0152 => Some(0x8c),
        0x017d => Some(0x8e),
        0x2018 => Some(0x91),
        0x2019 => Some(0x92),
        0x201c => Some(0x93),
        0x201d => Some(0x94),
        0x2022 => Some(0x95),
        0x2013 => Some(0x96),
        0x2014 => Some(0x97),
        0x02dc => Some(0x98),
        0x2122 => Some(0x99),
        0x0161 => Some(0x9a),
        0x203a => Some(0x9b),
        0x0153 => Some(0x9c),
        0x017e => Some(0x9e),
        0x0178 => Some(0x9f),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_pitch_is_courier() {
        let fonts = Base14Fonts;
        let sel = fonts.select(&FontRequest {
            typeface: 0,
            proportional: false,
            bold: false,
            italic: false,
            condensed: false,
        });
        assert_eq!(BASE14[sel.font.0 as usize], "Courier");
    }

    #[test]
    fn proportional_sans_bold_italic() {
        let fonts = Base14Fonts;
        let sel = fonts.select(&FontRequest {
            typeface: 1,
            proportional: true,
            bold: true,
            italic: true,
            condensed: false,
        });
        assert_eq!(BASE14[sel.font.0 as usize], "Helvetica-BoldOblique");
        assert!(sel.bold);
        assert!(sel.italic);
    }

    #[test]
    fn courier_advance_is_monospaced() {
        let fonts = Base14Fonts;
        assert_eq!(fonts.advance(FontId(0), 'i'), 0.6);
        assert_eq!(fonts.advance(FontId(0), 'W'), 0.6);
        assert_ne!(fonts.advance(FontId(8), 'i'), fonts.advance(FontId(8), 'W'));
    }

    #[test]
    fn winansi_covers_latin1_and_quotes() {
        assert_eq!(winansi('A'), Some(0x41));
        assert_eq!(winansi('é'), Some(0xe9));
        assert_eq!(winansi('€'), Some(0x80));
        assert_eq!(winansi('☺'), None);
    }
}
