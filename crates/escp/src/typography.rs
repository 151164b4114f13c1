//! # Typography state
//!
//! Every text attribute a command can touch lives here: typeface,
//! pitch, point size, the style flags, intercharacter space and the
//! scoring selectors. At draw time the state resolves into a font
//! request plus the scales and shifts the surface needs. Pitch values
//! are kept as grid units per character; the classic condensed pitches
//! (17.14 and 20 cpi) are exact in the grid (210 and 180 subunits).

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::interp::Pins;
use crate::surface::{FontRequest, FontSelection, TextStyle};
use crate::units::{self, Unit};

/// Print quality (`ESC x`). NLQ on 9-pin hardware counts as LQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// Draft quality
    Draft,
    /// Letter quality
    #[default]
    Letter,
}

/// Super/subscript printing (`ESC S`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    /// Upper two thirds of the character space
    Super,
    /// Lower two thirds of the character space
    Sub,
}

/// One line-score selector of `ESC ( -`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreStyle {
    /// Scoring off
    #[default]
    Off,
    /// Single continuous line
    Single,
    /// Double continuous line
    Double,
    /// Single broken line
    BrokenSingle,
    /// Double broken line
    BrokenDouble,
}

impl ScoreStyle {
    /// Decode the d2 parameter of `ESC ( -`.
    pub fn from_param(d2: u8) -> Option<ScoreStyle> {
        match d2 {
            0 => Some(ScoreStyle::Off),
            1 => Some(ScoreStyle::Single),
            2 => Some(ScoreStyle::Double),
            5 => Some(ScoreStyle::BrokenSingle),
            6 => Some(ScoreStyle::BrokenDouble),
            _ => None,
        }
    }
}

bitflags! {
    /// The `ESC !` master-select bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MasterSelect: u8 {
        /// 12 cpi instead of 10 cpi
        const ELITE = 0x01;
        /// Proportional spacing
        const PROPORTIONAL = 0x02;
        /// Condensed printing
        const CONDENSED = 0x04;
        /// Bold
        const BOLD = 0x08;
        /// Double-strike
        const DOUBLE_STRIKE = 0x10;
        /// Double-width (multi-line)
        const DOUBLE_WIDTH = 0x20;
        /// Italic
        const ITALIC = 0x40;
        /// Underline
        const UNDERLINE = 0x80;
    }
}

/// Pitch of 10 cpi in grid units per character.
const PITCH_10: Unit = 360;
/// Pitch of 12 cpi.
const PITCH_12: Unit = 300;
/// Pitch of 15 cpi.
const PITCH_15: Unit = 240;
/// Condensed pitch reached from 10 cpi (17.14 cpi).
const PITCH_10_CONDENSED: Unit = 210;
/// Condensed pitch reached from 12 cpi (20 cpi).
const PITCH_12_CONDENSED: Unit = 180;

/// The complete typography state.
#[derive(Debug, Clone, PartialEq)]
pub struct Typography {
    /// Epson typeface id (`ESC k`)
    pub typeface: u8,
    /// Proportional spacing selected
    pub proportional: bool,
    /// Fixed pitch in grid units per character, before condensed and
    /// double-width factors
    pub base_pitch: Unit,
    /// Horizontal motion index (`ESC c`), overriding the pitch
    pub hmi: Option<Unit>,
    /// Nominal point size, before double-height and scripting
    pub point_size: f32,
    /// Multipoint (scalable font) mode entered with `ESC X`
    pub multipoint: bool,
    /// Print quality
    pub quality: Quality,
    quality_before_proportional: Quality,
    /// Bold (`ESC E`)
    pub bold: bool,
    /// Italic (`ESC 4`)
    pub italic: bool,
    /// Underline (`ESC -`)
    pub underline: bool,
    /// Double-strike (`ESC G`), rendered as synthetic bold
    pub double_strike: bool,
    /// Condensed (SI)
    pub condensed: bool,
    condensed_before_double_height: bool,
    /// One-line double width (SO), cleared by CR/LF/VT/DC4
    pub double_width: bool,
    /// Multi-line double width (`ESC W`)
    pub double_width_line: bool,
    /// Double height (`ESC w`)
    pub double_height: bool,
    /// Super/subscript
    pub script: Option<Script>,
    script_before_double_height: Option<Script>,
    /// Extra space after every character, in grid units
    pub intercharacter_space: Unit,
    /// Scores by kind: 0 underline, 1 strikethrough, 2 overscore
    pub scores: [ScoreStyle; 3],
}

impl Default for Typography {
    fn default() -> Self {
        Typography {
            typeface: 0,
            proportional: false,
            base_pitch: PITCH_10,
            hmi: None,
            point_size: 10.5,
            multipoint: false,
            quality: Quality::Letter,
            quality_before_proportional: Quality::Letter,
            bold: false,
            italic: false,
            underline: false,
            double_strike: false,
            condensed: false,
            condensed_before_double_height: false,
            double_width: false,
            double_width_line: false,
            double_height: false,
            script: None,
            script_before_double_height: None,
            intercharacter_space: 0,
            scores: [ScoreStyle::Off; 3],
        }
    }
}

impl Typography {
    /// `ESC P` / `ESC M` / `ESC g` — select 10.5-point printing at a
    /// fixed pitch; cancels multipoint mode and the HMI.
    pub fn select_cpi(&mut self, cpi: u8) {
        self.base_pitch = match cpi {
            12 => PITCH_12,
            15 => PITCH_15,
            _ => PITCH_10,
        };
        self.cancel_multipoint();
    }

    /// `ESC X` — enter multipoint mode, selecting pitch and point size.
    pub fn select_pitch_and_point(&mut self, m: u8, point_halves: u16) {
        self.multipoint = true;
        if m == 1 {
            self.proportional = true;
        } else if m >= 5 {
            self.base_pitch = units::from_360ths(m as i32);
            self.proportional = false;
        }
        let point = point_halves as f32 / 2.0;
        if point > 0.0 {
            self.point_size = point;
        }
        self.hmi = None;
    }

    /// Leave multipoint mode and return to 10.5-point (21 while
    /// double-height stays on).
    pub fn cancel_multipoint(&mut self) {
        self.multipoint = false;
        self.hmi = None;
        self.point_size = if self.double_height { 21.0 } else { 10.5 };
    }

    /// `ESC p` — proportional on/off. Outside multipoint mode,
    /// proportional printing forces LQ; switching it off restores the
    /// previous quality.
    pub fn set_proportional(&mut self, on: bool, pins: Pins) {
        self.proportional = on;
        if self.multipoint || pins == Pins::P9 {
            return;
        }
        if on {
            self.quality_before_proportional = self.quality;
            self.quality = Quality::Letter;
        } else {
            self.quality = self.quality_before_proportional;
        }
    }

    /// `ESC x` — draft or LQ.
    pub fn set_quality(&mut self, quality: Quality) {
        self.quality = quality;
        self.quality_before_proportional = quality;
    }

    /// `ESC c` — horizontal motion index in 1/360 inch, 0 < HMI ≤ 3 in.
    pub fn set_hmi(&mut self, value: u16) -> bool {
        let hmi = units::from_360ths(value as i32);
        if hmi <= 0 || hmi > 3 * units::INCH {
            return false;
        }
        self.hmi = Some(hmi);
        self.intercharacter_space = 0;
        true
    }

    /// `ESC SP` — extra intercharacter space; n/180 inch in LQ,
    /// n/120 in draft and on 9-pin hardware. Cancels the HMI.
    pub fn set_intercharacter_space(&mut self, n: u8, pins: Pins) {
        if self.multipoint {
            return;
        }
        self.intercharacter_space = if self.quality == Quality::Letter && pins != Pins::P9 {
            units::from_180ths(n as i32)
        } else {
            units::from_120ths(n as i32)
        };
        self.hmi = None;
    }

    /// SI — condensed on. Ignored in multipoint mode, at 15 cpi on
    /// ESC/P 2 hardware, and during proportional printing on 9-pin
    /// hardware. Suspended while 9-pin double-height is active.
    pub fn set_condensed(&mut self, on: bool, pins: Pins) {
        if self.multipoint {
            return;
        }
        if self.base_pitch == PITCH_15 && pins != Pins::P9 {
            return;
        }
        if pins == Pins::P9 && self.proportional {
            return;
        }
        self.hmi = None;
        if pins == Pins::P9 && self.double_height {
            self.condensed_before_double_height = on;
            return;
        }
        self.condensed = on;
    }

    /// SO — one-line double width.
    pub fn set_double_width(&mut self, on: bool) {
        if self.multipoint {
            return;
        }
        self.double_width = on;
        self.hmi = None;
    }

    /// `ESC W` — multi-line double width.
    pub fn set_double_width_line(&mut self, on: bool) {
        if self.multipoint {
            return;
        }
        self.double_width_line = on;
        self.hmi = None;
    }

    /// `ESC w` — double height. On 9-pin hardware double height
    /// suspends scripting and condensed until it is switched off.
    pub fn set_double_height(&mut self, on: bool, pins: Pins) {
        if self.multipoint {
            return;
        }
        if on != self.double_height {
            self.point_size *= if on { 2.0 } else { 0.5 };
        }
        if pins == Pins::P9 {
            if on {
                self.script_before_double_height = self.script;
                self.script = None;
                self.condensed_before_double_height = self.condensed;
                self.condensed = false;
            } else {
                self.script = self.script_before_double_height;
                self.condensed = self.condensed_before_double_height;
            }
        }
        self.double_height = on;
        self.hmi = None;
    }

    /// `ESC S` — super/subscript. Postponed while 9-pin double-height
    /// is active.
    pub fn set_script(&mut self, script: Script, pins: Pins) {
        if pins == Pins::P9 && self.double_height {
            self.script_before_double_height = Some(script);
            return;
        }
        self.script = Some(script);
    }

    /// `ESC T` — cancel super/subscript.
    pub fn clear_script(&mut self) {
        self.script = None;
        self.script_before_double_height = None;
    }

    /// `ESC ! n` — set seven attributes at once.
    pub fn master_select(&mut self, n: u8, pins: Pins) {
        let mask = MasterSelect::from_bits_retain(n);
        self.cancel_multipoint();
        self.base_pitch = if mask.contains(MasterSelect::ELITE) {
            PITCH_12
        } else {
            PITCH_10
        };
        self.set_proportional(mask.contains(MasterSelect::PROPORTIONAL), pins);
        self.set_condensed(mask.contains(MasterSelect::CONDENSED), pins);
        self.bold = mask.contains(MasterSelect::BOLD);
        self.double_strike = mask.contains(MasterSelect::DOUBLE_STRIKE);
        self.set_double_width_line(mask.contains(MasterSelect::DOUBLE_WIDTH));
        self.italic = mask.contains(MasterSelect::ITALIC);
        self.underline = mask.contains(MasterSelect::UNDERLINE);
    }

    /// `ESC ( -` — select a line score. Returns false for parameters
    /// outside the table.
    pub fn select_score(&mut self, d1: u8, d2: u8) -> bool {
        let style = match ScoreStyle::from_param(d2) {
            Some(style) => style,
            None => return false,
        };
        match d1 {
            1..=3 => {
                self.scores[d1 as usize - 1] = style;
                true
            }
            _ => false,
        }
    }

    /// Whether any double-width mode is active.
    pub fn is_double_width(&self) -> bool {
        self.double_width || self.double_width_line
    }

    /// The fixed-pitch advance per character (HMI, condensed and
    /// double-width folded in), without intercharacter space.
    pub fn effective_pitch(&self) -> Unit {
        if let Some(hmi) = self.hmi {
            return hmi;
        }
        let mut pitch = self.base_pitch;
        if self.condensed {
            pitch = match pitch {
                PITCH_10 => PITCH_10_CONDENSED,
                PITCH_12 => PITCH_12_CONDENSED,
                other => other,
            };
        }
        if self.is_double_width() {
            pitch *= 2;
        }
        pitch
    }

    /// The point size characters are actually drawn at: double-height
    /// is folded into `point_size` already; scripting shrinks sizes
    /// above 8 points to two thirds.
    pub fn effective_point_size(&self) -> f32 {
        let mut size = self.point_size;
        // ESC X quirk: 15 cpi with 10.5 or 21-point ROM characters
        // prints them at two thirds height
        let quirk_point = (10.0..=10.5).contains(&self.point_size)
            || (20.0..=21.0).contains(&self.point_size);
        if self.multipoint
            && self.hmi.is_none()
            && !self.proportional
            && self.base_pitch == PITCH_15
            && quirk_point
        {
            size *= 2.0 / 3.0;
        }
        if self.script.is_some() && size > 8.0 {
            size = (size * 2.0 / 3.0).round();
        }
        size
    }

    /// The font the current state asks for.
    pub fn font_request(&self) -> FontRequest {
        FontRequest {
            typeface: self.typeface,
            proportional: self.proportional,
            bold: self.bold || self.double_strike,
            italic: self.italic,
            condensed: self.condensed,
        }
    }

    /// Resolve the state against a concrete font selection.
    pub fn text_style(&self, sel: &FontSelection, color: Color) -> TextStyle {
        let size = self.effective_point_size();
        let rise = match self.script {
            Some(Script::Super) => self.point_size / 3.0,
            Some(Script::Sub) => -self.point_size / 3.0,
            None => 0.0,
        };
        TextStyle {
            size,
            h_scale: self.h_scale(sel),
            rise,
            char_space: units::to_points(self.char_space()),
            color,
            synth_bold: (self.bold || self.double_strike) && !sel.bold,
            shear: if self.italic && !sel.italic { 12.0 } else { 0.0 },
        }
    }

    /// Horizontal stretch applied when drawing.
    fn h_scale(&self, sel: &FontSelection) -> f32 {
        if self.multipoint && self.proportional {
            return 1.0;
        }
        let dh = if self.double_height { 0.5 } else { 1.0 };
        if self.proportional {
            let dw = if self.is_double_width() { 2.0 } else { 1.0 };
            let cond = if self.condensed && !sel.condensed {
                0.5
            } else {
                1.0
            };
            return dw * cond * dh;
        }
        // A condensed face needs no squeeze; the pitch change alone
        // would halve it a second time.
        let pitch = if self.condensed && sel.condensed {
            let dw = if self.is_double_width() { 2 } else { 1 };
            self.base_pitch * dw
        } else {
            self.effective_pitch()
        };
        pitch as f32 / PITCH_10 as f32 * dh
    }

    /// Intercharacter space, doubled in double-width mode.
    pub fn char_space(&self) -> Unit {
        if self.is_double_width() {
            self.intercharacter_space * 2
        } else {
            self.intercharacter_space
        }
    }

    /// Advance for one character in grid units. `em` is the glyph's
    /// proportional advance as a fraction of the em square, `None` for
    /// fixed pitch.
    pub fn advance(&self, em: Option<f32>) -> Unit {
        match em {
            None => self.effective_pitch() + self.char_space(),
            Some(em) => {
                let dh = if self.double_height { 0.5 } else { 1.0 };
                let dw = if self.is_double_width() { 2.0 } else { 1.0 };
                let cond = if self.condensed { 0.5 } else { 1.0 };
                let scale = if self.multipoint { 1.0 } else { dw * cond * dh };
                let width = em * self.effective_point_size() * units::POINT as f32 * scale;
                width.round() as Unit + self.char_space()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condensed_changes_pitch() {
        let mut t = Typography::default();
        assert_eq!(t.effective_pitch(), PITCH_10);
        t.set_condensed(true, Pins::Nozzle);
        assert_eq!(t.effective_pitch(), PITCH_10_CONDENSED);
        t.select_cpi(12);
        t.set_condensed(true, Pins::Nozzle);
        assert_eq!(t.effective_pitch(), PITCH_12_CONDENSED);
    }

    #[test]
    fn condensed_ignored_at_15_cpi() {
        let mut t = Typography::default();
        t.select_cpi(15);
        t.set_condensed(true, Pins::Nozzle);
        assert!(!t.condensed);
    }

    #[test]
    fn double_width_doubles_pitch_and_space() {
        let mut t = Typography::default();
        t.set_intercharacter_space(9, Pins::Nozzle);
        t.set_double_width(true);
        assert_eq!(t.effective_pitch(), 2 * PITCH_10);
        assert_eq!(t.char_space(), 2 * units::from_180ths(9));
    }

    #[test]
    fn master_select_sets_seven_flags() {
        let mut t = Typography::default();
        t.master_select(0x01 | 0x08 | 0x80, Pins::Nozzle);
        assert_eq!(t.base_pitch, PITCH_12);
        assert!(t.bold);
        assert!(t.underline);
        assert!(!t.italic);
        // a second call clears what it does not name
        t.master_select(0x40, Pins::Nozzle);
        assert!(!t.bold);
        assert!(!t.underline);
        assert!(t.italic);
    }

    #[test]
    fn double_height_doubles_point_size() {
        let mut t = Typography::default();
        t.set_double_height(true, Pins::Nozzle);
        assert_eq!(t.point_size, 21.0);
        t.set_double_height(false, Pins::Nozzle);
        assert_eq!(t.point_size, 10.5);
    }

    #[test]
    fn nine_pin_double_height_suspends_script() {
        let mut t = Typography::default();
        t.set_script(Script::Super, Pins::P9);
        t.set_double_height(true, Pins::P9);
        assert_eq!(t.script, None);
        t.set_double_height(false, Pins::P9);
        assert_eq!(t.script, Some(Script::Super));
    }

    #[test]
    fn script_shrinks_size_and_shifts_baseline() {
        let mut t = Typography::default();
        t.set_script(Script::Sub, Pins::Nozzle);
        assert_eq!(t.effective_point_size(), 7.0);
        let style = t.text_style(
            &FontSelection {
                font: crate::surface::FontId(0),
                bold: false,
                italic: false,
                condensed: false,
            },
            Color {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 1.0,
            },
        );
        assert!(style.rise < 0.0);
    }

    #[test]
    fn hmi_overrides_pitch() {
        let mut t = Typography::default();
        assert!(t.set_hmi(180)); // 1/2 inch
        assert_eq!(t.effective_pitch(), units::INCH / 2);
        assert!(!t.set_hmi(0));
        t.set_intercharacter_space(1, Pins::Nozzle);
        assert_eq!(t.hmi, None);
    }
}
