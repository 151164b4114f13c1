//! # The command dispatcher
//!
//! One loop pulls bytes from the source and classifies each as a
//! printable codepoint, a control code, or the start of an ESC
//! sequence. Parameters are parsed inline with exact lengths, so the
//! dispatcher carries no state between bytes beyond [`Printer`] itself.
//! Unknown selectors are skipped; a parameter block cut short by the
//! end of the stream aborts the run after flushing the page.

use std::char::REPLACEMENT_CHARACTER as RCH;
use std::io::Read;

use log::{debug, warn};

use crate::chsets::userdef::{fingerprint, GlyphBitmap, UdcSettings};
use crate::chsets::{table_for_id, CharStore, CharTables, CodeFilter, Registry};
use crate::color::{ColorId, COLOR_NAMES, PALETTE};
use crate::error::{Error, Step};
use crate::graphics::{self, Density, Renderer};
use crate::layout::{Layout, Paper, VMove};
use crate::surface::{FontResolver, Surface, TextStyle};
use crate::typography::{Quality, ScoreStyle, Script, Typography};
use crate::units::{self, Unit};

mod source;

pub use source::ByteSource;

/// Print-head configuration. It selects graphics density tables,
/// line-spacing denominators and several behavioural quirks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pins {
    /// 9-needle dot matrix
    P9,
    /// 24-needle dot matrix
    P24,
    /// 48-needle dot matrix
    P48,
    /// Modern ESC/P 2 inkjet head
    #[default]
    Nozzle,
}

/// Configured defaults a [`Printer`] starts from and returns to on
/// `ESC @`.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    /// Print head
    pub pins: Pins,
    /// The sheet
    pub paper: Paper,
    /// CR implies LF
    pub automatic_linefeed: bool,
    /// Dot rendering style
    pub renderer: Renderer,
}

/// The printer state machine driven by the dispatcher.
#[derive(Debug)]
pub struct Printer {
    /// Geometry and print position
    pub layout: Layout,
    /// Text attributes
    pub typography: Typography,
    /// Character tables and overlays
    pub tables: CharTables,
    /// Global colour (`ESC r`)
    pub color: ColorId,
    /// Raster graphics mode entered with `ESC ( G`
    pub graphics_mode: bool,
    /// MicroWeave accepted but without visual effect
    pub microweave: bool,
    /// Densities the `ESC K/L/Y/Z` shortcuts map to (`ESC ?`)
    pub klyz: [u8; 4],
}

impl Printer {
    fn new(settings: &Settings) -> Self {
        Printer {
            layout: Layout::new(settings.paper, settings.automatic_linefeed),
            typography: Typography::default(),
            tables: CharTables::new(settings.pins),
            color: ColorId::BLACK,
            graphics_mode: false,
            microweave: false,
            klyz: [0, 1, 2, 3],
        }
    }

    /// `ESC @` — back to the configured defaults. The open page, the
    /// print position and the RAM characters survive.
    fn reset(&mut self, settings: &Settings) {
        self.layout.reset(units::INCH / 10);
        self.typography = Typography::default();
        self.tables.reset(settings.pins);
        self.color = ColorId::BLACK;
        self.graphics_mode = false;
        self.microweave = false;
        self.klyz = [0, 1, 2, 3];
    }
}

/// The interpreter: printer state plus its external collaborators.
pub struct Interpreter<'a> {
    settings: Settings,
    registry: &'a Registry,
    fonts: &'a dyn FontResolver,
    store: &'a mut dyn CharStore,
    /// The document state
    pub printer: Printer,
    movx_unit: Unit,
}

impl<'a> Interpreter<'a> {
    /// Build an interpreter over its collaborators.
    pub fn new(
        settings: Settings,
        registry: &'a Registry,
        fonts: &'a dyn FontResolver,
        store: &'a mut dyn CharStore,
    ) -> Self {
        let printer = Printer::new(&settings);
        Interpreter {
            settings,
            registry,
            fonts,
            store,
            printer,
            movx_unit: units::from_360ths(1),
        }
    }

    /// Interpret a whole stream. The surface is finalised on every
    /// exit path; only stream truncation and I/O failures are
    /// reported as errors.
    pub fn run<R: Read>(&mut self, reader: R, surface: &mut dyn Surface) -> Result<(), Error> {
        let mut src = ByteSource::new(reader);
        let result = self.run_inner(&mut src, surface);
        let finalized = surface.finalize();
        match result {
            Ok(()) => finalized.map_err(Error::Io),
            Err(e) => {
                warn!("run aborted at offset {}: {}", src.position(), e);
                Err(e)
            }
        }
    }

    fn run_inner<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<(), Error> {
        while let Some(byte) = src.next_byte()? {
            match byte {
                0x1b => {
                    self.escape(src, surface)?;
                }
                0x00 => {} // stray NUL bytes carry no meaning
                0x07 => {} // BEL
                0x08 => self.backspace(),
                0x09 => {
                    self.printer.layout.h_tab();
                }
                0x0a => self.line_feed(surface),
                0x0b => self.v_tab(surface),
                0x0c => self.form_feed(surface),
                0x0d => self.carriage_return(surface),
                0x0e => self.printer.typography.set_double_width(true),
                0x0f => self
                    .printer
                    .typography
                    .set_condensed(true, self.settings.pins),
                0x11 => self.print_byte(0x11, surface), // DC1 may be printable
                0x12 => self
                    .printer
                    .typography
                    .set_condensed(false, self.settings.pins),
                0x13 => {} // DC3, deselect printer
                0x14 => self.printer.typography.set_double_width(false),
                0x18 => {} // CAN, no line buffer to cancel
                0x7f => {} // DEL
                data => self.print_byte(data, surface),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // control codes

    fn line_feed(&mut self, surface: &mut dyn Surface) {
        self.printer.typography.set_double_width(false);
        if self.printer.layout.line_feed(self.settings.pins) == VMove::PageBreak {
            surface.new_page();
        }
    }

    fn carriage_return(&mut self, surface: &mut dyn Surface) {
        if self.settings.pins == Pins::P9 {
            self.printer.typography.set_double_width(false);
        }
        self.printer.layout.carriage_return();
        if self.printer.layout.automatic_linefeed {
            self.line_feed(surface);
        }
    }

    fn form_feed(&mut self, surface: &mut dyn Surface) {
        self.printer.typography.set_double_width(false);
        self.printer.layout.form_feed();
        surface.new_page();
    }

    fn v_tab(&mut self, surface: &mut dyn Surface) {
        self.printer.typography.set_double_width(false);
        if self.printer.layout.v_tab(self.settings.pins) == VMove::PageBreak {
            surface.new_page();
        }
    }

    fn backspace(&mut self) {
        let advance = self.char_advance(' ');
        self.printer.layout.backspace(advance);
    }

    // ------------------------------------------------------------------
    // text

    fn color(&self) -> crate::color::Color {
        self.printer.color.color().unwrap_or(PALETTE[0])
    }

    fn baseline_offset(&self) -> Unit {
        // characters print 20/180 inch below the vertical position
        // (7/72 inch on 9-pin heads); graphics print at the position
        if self.settings.pins == Pins::P9 {
            units::from_72nds(7)
        } else {
            units::from_180ths(20)
        }
    }

    fn char_advance(&self, ch: char) -> Unit {
        let t9y = &self.printer.typography;
        let em = if t9y.proportional {
            let sel = self.fonts.select(&t9y.font_request());
            Some(self.fonts.advance(sel.font, ch))
        } else {
            None
        };
        t9y.advance(em)
    }

    fn print_byte(&mut self, byte: u8, surface: &mut dyn Surface) {
        if let Some(ch) = self.printer.tables.resolve(byte, self.registry) {
            self.print_char(ch, surface);
        }
    }

    fn print_char(&mut self, ch: char, surface: &mut dyn Surface) {
        let advance = self.char_advance(ch);
        if self.printer.layout.x + advance > self.printer.layout.margins.right {
            // horizontal overflow wraps to a fresh line
            self.printer.layout.carriage_return();
            if self.printer.layout.line_feed(self.settings.pins) == VMove::PageBreak {
                surface.new_page();
            }
        }
        let sel = self.fonts.select(&self.printer.typography.font_request());
        let style = self.printer.typography.text_style(&sel, self.color());
        let x = self.printer.layout.x;
        let baseline = self.printer.layout.y + self.baseline_offset();
        surface.draw_text(
            ch,
            sel.font,
            units::to_points(x),
            units::to_points(baseline),
            &style,
        );
        self.draw_scores(surface, x, baseline, advance, &style);
        self.printer.layout.x += advance;
    }

    /// Underline, strikethrough and overscore as rectangles across the
    /// advance width of the glyph just drawn.
    fn draw_scores(
        &mut self,
        surface: &mut dyn Surface,
        x: Unit,
        baseline: Unit,
        advance: Unit,
        style: &TextStyle,
    ) {
        let t9y = &self.printer.typography;
        let scores = [
            (
                0,
                if t9y.underline && t9y.scores[0] == ScoreStyle::Off {
                    ScoreStyle::Single
                } else {
                    t9y.scores[0]
                },
            ),
            (1, t9y.scores[1]),
            (2, t9y.scores[2]),
        ];
        let size = style.size;
        let thickness = (size * 0.05).max(0.3);
        let x_pt = units::to_points(x);
        let base_pt = units::to_points(baseline);
        let full = units::to_points(advance);
        for (kind, score) in scores {
            if score == ScoreStyle::Off {
                continue;
            }
            let y = match kind {
                0 => base_pt + size / 3.0,
                1 => base_pt - size / 4.0,
                _ => base_pt - size * 0.75,
            };
            let (width, double) = match score {
                ScoreStyle::Single => (full, false),
                ScoreStyle::Double => (full, true),
                ScoreStyle::BrokenSingle => (full * 0.6, false),
                ScoreStyle::BrokenDouble => (full * 0.6, true),
                ScoreStyle::Off => unreachable!(),
            };
            surface.draw_rect(x_pt, y, width, thickness, style.color);
            if double {
                surface.draw_rect(x_pt, y + 2.0 * thickness, width, thickness, style.color);
            }
        }
    }

    // ------------------------------------------------------------------
    // escape sequences

    fn escape<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let pins = self.settings.pins;
        let cmd = src.expect("ESC")?;
        match cmd {
            b'@' => self.printer.reset(&self.settings),

            // line spacing
            b'0' => self.printer.layout.line_spacing = units::INCH / 8,
            b'1' => self.printer.layout.line_spacing = units::from_72nds(7),
            b'2' => self.printer.layout.line_spacing = units::INCH / 6,
            b'3' => {
                let n = src.expect("ESC 3")?;
                let spacing = if pins == Pins::P9 {
                    units::from_216ths(n as i32)
                } else {
                    units::from_180ths(n as i32)
                };
                if spacing > 0 {
                    self.printer.layout.line_spacing = spacing;
                }
            }
            b'+' => {
                let n = src.expect("ESC +")?;
                let spacing = units::from_360ths(n as i32);
                if spacing > 0 {
                    self.printer.layout.line_spacing = spacing;
                }
            }
            b'A' => {
                let n = src.expect("ESC A")?;
                let spacing = if pins == Pins::P9 {
                    units::from_72nds(n as i32)
                } else {
                    units::from_60ths(n as i32)
                };
                if spacing > 0 {
                    self.printer.layout.line_spacing = spacing;
                }
            }

            // position
            b'$' => {
                let n = src.expect_u16_le("ESC $")?;
                self.printer.layout.absolute_x(n, pins);
            }
            b'\\' => {
                let n = src.expect_u16_le("ESC \\")? as i16;
                let unit = if pins == Pins::P9 {
                    units::from_120ths(1)
                } else {
                    self.printer.layout.unit_or(
                        if self.printer.typography.quality == Quality::Letter {
                            units::from_180ths(1)
                        } else {
                            units::from_120ths(1)
                        },
                    )
                };
                self.printer.layout.relative_x(n, unit);
            }
            b'J' => {
                let n = src.expect("ESC J")?;
                if self.printer.layout.advance_y(n, pins) == VMove::PageBreak {
                    surface.new_page();
                }
            }
            b'f' => {
                let m = src.expect("ESC f")?;
                let n = src.expect("ESC f")?;
                match m {
                    0 => {
                        for _ in 0..n {
                            self.print_byte(b' ', surface);
                        }
                    }
                    1 => {
                        for _ in 0..n {
                            self.line_feed(surface);
                        }
                        self.printer.layout.carriage_return();
                        self.printer.typography.set_double_width(false);
                    }
                    _ => warn!("ESC f with m={} ignored", m),
                }
            }

            // tabs
            b'D' => {
                let columns = src.expect_until_nul("ESC D")?;
                let pitch = self.tab_pitch();
                self.printer.layout.set_h_tabs(&columns, pitch);
            }
            b'B' => {
                let lines = src.expect_until_nul("ESC B")?;
                self.printer.layout.set_v_tabs(&lines);
            }
            b'b' => {
                // VFU channels are not emulated
                let _channel = src.expect("ESC b")?;
                let _ = src.expect_until_nul("ESC b")?;
            }
            b'/' => {
                let _ = src.expect("ESC /")?;
            }
            b'e' => {
                let _m = src.expect("ESC e")?;
                let _n = src.expect("ESC e")?;
            }
            b'a' => {
                let _ = src.expect("ESC a")?;
            }

            // page format
            b'C' => {
                let n = src.expect("ESC C")?;
                if n == 0 {
                    let inches = src.expect("ESC C NUL")?;
                    self.printer
                        .layout
                        .set_page_length(inches as Unit * units::INCH);
                } else {
                    self.printer
                        .layout
                        .set_page_length(n as Unit * self.printer.layout.line_spacing);
                }
            }
            b'N' => {
                let n = src.expect("ESC N")?;
                self.printer.layout.set_bottom_margin(n);
            }
            b'O' => self.printer.layout.cancel_top_bottom_margins(),
            b'l' => {
                let n = src.expect("ESC l")?;
                let pitch = self.tab_pitch();
                self.printer.layout.set_left_margin(n, pitch);
            }
            b'Q' => {
                let n = src.expect("ESC Q")?;
                let pitch = self.tab_pitch();
                self.printer.layout.set_right_margin(n, pitch);
            }

            // typography
            b'P' => self.printer.typography.select_cpi(10),
            b'M' => self.printer.typography.select_cpi(12),
            b'g' => self.printer.typography.select_cpi(15),
            b'X' => {
                let m = src.expect("ESC X")?;
                let point = src.expect_u16_le("ESC X")?;
                self.printer.typography.select_pitch_and_point(m, point);
            }
            b'p' => {
                let n = src.expect("ESC p")?;
                self.printer.typography.cancel_multipoint();
                self.printer
                    .typography
                    .set_proportional(matches!(n, 1 | b'1'), pins);
            }
            b'x' => {
                let n = src.expect("ESC x")?;
                let quality = if matches!(n, 1 | b'1') {
                    Quality::Letter
                } else {
                    Quality::Draft
                };
                self.printer.typography.set_quality(quality);
            }
            b'c' => {
                let n = src.expect_u16_le("ESC c")?;
                if !self.printer.typography.set_hmi(n) {
                    warn!("ESC c HMI out of range, ignored");
                }
            }
            b' ' => {
                let n = src.expect("ESC SP")?;
                self.printer.typography.set_intercharacter_space(n, pins);
            }
            b'!' => {
                let n = src.expect("ESC !")?;
                self.printer.typography.master_select(n, pins);
            }
            b'4' => self.printer.typography.italic = true,
            b'5' => self.printer.typography.italic = false,
            b'E' => self.printer.typography.bold = true,
            b'F' => self.printer.typography.bold = false,
            b'G' => self.printer.typography.double_strike = true,
            b'H' => self.printer.typography.double_strike = false,
            b'-' => {
                let n = src.expect("ESC -")?;
                self.printer.typography.underline = matches!(n, 1 | b'1');
            }
            b'S' => {
                let n = src.expect("ESC S")?;
                let script = if matches!(n, 1 | b'1') {
                    Script::Sub
                } else {
                    Script::Super
                };
                self.printer.typography.set_script(script, pins);
            }
            b'T' => self.printer.typography.clear_script(),
            b'q' => {
                // outline/shadow styles have no vector counterpart here
                let n = src.expect("ESC q")?;
                debug!("ESC q style {} accepted without effect", n);
            }
            b'W' => {
                let n = src.expect("ESC W")?;
                self.printer
                    .typography
                    .set_double_width_line(matches!(n, 1 | b'1'));
            }
            b'w' => {
                let n = src.expect("ESC w")?;
                self.printer
                    .typography
                    .set_double_height(matches!(n, 1 | b'1'), pins);
            }
            b'k' => {
                let n = src.expect("ESC k")?;
                if !self.printer.tables.ram_selected {
                    self.printer.typography.typeface = n;
                }
            }

            // character tables
            b't' => {
                let n = src.expect("ESC t")?;
                self.select_character_table(n);
            }
            b'R' => {
                let n = src.expect("ESC R")?;
                if crate::chsets::intl::overlay(n).is_some() {
                    self.printer.tables.intl = n;
                    debug!(
                        "international charset {} ({})",
                        n,
                        crate::chsets::intl::country_name(n)
                    );
                } else {
                    warn!("ESC R unknown country {}, ignored", n);
                }
            }
            b'6' => self.printer.tables.filter.remove(CodeFilter::UPPER),
            b'7' => self.printer.tables.filter.insert(CodeFilter::UPPER),
            b'I' => {
                let n = src.expect("ESC I")?;
                if n & 1 != 0 {
                    self.printer.tables.filter.remove(CodeFilter::SELECTED);
                } else {
                    self.printer.tables.filter.insert(CodeFilter::SELECTED);
                }
            }
            b'm' => {
                let n = src.expect("ESC m")?;
                match n {
                    0 => self.printer.tables.filter.remove(CodeFilter::UPPER),
                    4 => self.printer.tables.filter.insert(CodeFilter::UPPER),
                    _ => warn!("ESC m with {} ignored", n),
                }
            }
            b'%' => {
                let n = src.expect("ESC %")?;
                self.printer.tables.ram_selected = matches!(n, 1 | b'1');
            }
            b'&' => return self.define_user_chars(src),
            b':' => {
                let _nul = src.expect("ESC :")?;
                let _typeface = src.expect("ESC :")?;
                let _nul2 = src.expect("ESC :")?;
                self.copy_rom_to_ram();
            }

            // graphics
            b'*' => return self.bit_image(src, surface),
            b'^' => return self.bit_image_9pin(src, surface),
            b'?' => {
                let letter = src.expect("ESC ?")?;
                let density = src.expect("ESC ?")?;
                match letter {
                    b'K' => self.printer.klyz[0] = density,
                    b'L' => self.printer.klyz[1] = density,
                    b'Y' => self.printer.klyz[2] = density,
                    b'Z' => self.printer.klyz[3] = density,
                    _ => {
                        warn!("ESC ? with unknown command letter {:#04x}", letter);
                        return Ok(Step::Skipped);
                    }
                }
            }
            b'K' | b'L' | b'Y' | b'Z' => return self.klyz_graphics(cmd, src, surface),
            b'.' => return self.raster(src, surface),
            b'r' => {
                let n = src.expect("ESC r")?;
                self.set_color(n);
            }

            // parameterised extended commands
            b'(' => return self.escape_paren(src, surface),

            // paper handling
            0x19 => {
                let n = src.expect("ESC EM")?;
                if n == b'R' && self.settings.paper.single_sheet {
                    self.form_feed(surface);
                }
            }

            // accepted, no effect in a virtual printer
            b'U' | b's' => {
                let _ = src.expect("ESC U")?;
            }
            b'<' | b'8' | b'9' | b'#' | b'=' | b'>' => {}
            b'i' => {
                let _ = src.expect("ESC i")?;
            }
            b'j' => {
                let _ = src.expect("ESC j")?;
            }
            0x0e => self.printer.typography.set_double_width(true),
            0x0f => self
                .printer
                .typography
                .set_condensed(true, self.settings.pins),

            unknown => {
                warn!(
                    "unknown command ESC {:#04x} ({:?}) skipped",
                    unknown, unknown as char
                );
                return Ok(Step::Skipped);
            }
        }
        Ok(Step::Ok)
    }

    /// Pitch for tab stops and margin columns: 10 cpi during
    /// proportional printing, the effective pitch otherwise.
    fn tab_pitch(&self) -> Unit {
        if self.printer.typography.proportional {
            units::INCH / 10
        } else {
            self.printer.typography.effective_pitch()
        }
    }

    fn set_color(&mut self, id: u8) {
        if id as usize >= PALETTE.len() {
            warn!("color id {} is unknown, ignored", id);
            return;
        }
        if self.printer.graphics_mode
            && self.settings.pins != Pins::P9
            && !matches!(id, 0 | 1 | 2 | 4)
        {
            warn!("color id {} not allowed in raster graphics mode", id);
            return;
        }
        self.printer.color = ColorId(id);
        debug!("color {} ({})", id, COLOR_NAMES[id as usize]);
    }

    fn select_character_table(&mut self, value: u8) {
        let pins = self.settings.pins;
        let slot = match value {
            0 | b'0' => 0,
            1 | b'1' => 1,
            2 | b'2' => {
                let shiftable = matches!(pins, Pins::P24 | Pins::P48)
                    || (pins == Pins::Nozzle && self.printer.tables.slots[2].is_none());
                if shiftable {
                    debug!("shifting user-defined characters to the upper half");
                    self.printer.tables.ram.shift_upper();
                    return;
                }
                if pins == Pins::P9 {
                    warn!("ESC t 2 is not available on 9-pin hardware");
                    return;
                }
                2
            }
            3 | b'3' => 3,
            _ => {
                warn!("ESC t with table {} ignored", value);
                return;
            }
        };
        self.printer.tables.active = slot;
        debug!(
            "character table {} ({})",
            slot,
            self.printer.tables.active_name()
        );
    }

    fn copy_rom_to_ram(&mut self) {
        if self.printer.typography.multipoint {
            warn!("ESC : is ignored during multipoint mode");
            return;
        }
        let t9y = &self.printer.typography;
        let settings = UdcSettings::capture(t9y.quality, t9y.proportional, t9y.script);
        self.printer.tables.ram.sync_settings(settings);
        let table = self.printer.tables.effective_table(self.registry);
        let codes = if self.settings.pins == Pins::P9 { 256 } else { 128 };
        self.printer.tables.ram.copy_from_rom(&table, codes);
    }

    fn define_user_chars<R: Read>(&mut self, src: &mut ByteSource<R>) -> Result<Step, Error> {
        let nul = src.expect("ESC &")?;
        if nul != 0 {
            warn!("ESC & with nonzero first byte, skipped");
            return Ok(Step::Skipped);
        }
        let first = src.expect("ESC &")?;
        let last = src.expect("ESC &")?;
        if last < first || first > 0x7f {
            warn!("ESC & with inverted code range, skipped");
            return Ok(Step::Skipped);
        }
        let t9y = &self.printer.typography;
        let settings = UdcSettings::capture(t9y.quality, t9y.proportional, t9y.script);
        self.printer.tables.ram.sync_settings(settings);
        let fp = fingerprint(t9y.typeface, t9y.proportional, settings.mode);
        let bytes_per_column = match self.settings.pins {
            Pins::P9 => {
                if self.printer.typography.quality == Quality::Letter {
                    3
                } else {
                    1
                }
            }
            _ => {
                if settings.scripting.is_some() {
                    2
                } else {
                    3
                }
            }
        };
        for code in first..=last {
            let space_left = src.expect("ESC &")?;
            let width = src.expect("ESC &")?;
            let space_right = src.expect("ESC &")?;
            let data = src.expect_vec(bytes_per_column * width as usize, "ESC &")?;
            let glyph = GlyphBitmap {
                space_left,
                width,
                space_right,
                bytes_per_column,
                data,
            };
            self.store.record(&fp, &settings, code, &glyph);
            let mapped = self.store.lookup(&fp, code).unwrap_or(RCH);
            self.printer.tables.ram.define(code, mapped);
            debug!("user-defined character {:#04x} received", code);
        }
        Ok(Step::Ok)
    }

    // ------------------------------------------------------------------
    // graphics commands

    fn bit_image<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let m = src.expect("ESC *")?;
        let columns = src.expect_u16_le("ESC *")? as usize;
        let density = match graphics::bit_image_density(m, self.settings.pins) {
            Some(density) => density,
            None => {
                warn!("ESC * with undefined density {}, skipped", m);
                return Ok(Step::Skipped);
            }
        };
        let data = src.expect_vec(density.bytes_per_column * columns, "ESC *")?;
        self.draw_columns(surface, &density, &data, false);
        Ok(Step::Ok)
    }

    fn bit_image_9pin<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let m = src.expect("ESC ^")?;
        let columns = src.expect_u16_le("ESC ^")? as usize;
        let h_advance = match m {
            0 => units::INCH / 60,
            1 => units::INCH / 120,
            _ => {
                warn!("ESC ^ with density {}, skipped", m);
                return Ok(Step::Skipped);
            }
        };
        let density = Density {
            h_advance,
            v_advance: units::INCH / 72,
            bytes_per_column: 2,
            adjacent: true,
        };
        let data = src.expect_vec(2 * columns, "ESC ^")?;
        self.draw_columns(surface, &density, &data, true);
        Ok(Step::Ok)
    }

    fn klyz_graphics<R: Read>(
        &mut self,
        cmd: u8,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let index = match cmd {
            b'K' => 0,
            b'L' => 1,
            b'Y' => 2,
            _ => 3,
        };
        let columns = src.expect_u16_le("ESC K/L/Y/Z")? as usize;
        let data = src.expect_vec(columns, "ESC K/L/Y/Z")?;
        let m = self.printer.klyz[index];
        let density = match graphics::bit_image_density(m, self.settings.pins) {
            Some(density) => density,
            None => {
                warn!("ESC ? assigned undefined density {}", m);
                return Ok(Step::Skipped);
            }
        };
        self.draw_columns(surface, &density, &data, false);
        Ok(Step::Ok)
    }

    fn draw_columns(
        &mut self,
        surface: &mut dyn Surface,
        density: &Density,
        data: &[u8],
        nine_pin: bool,
    ) {
        let color = self.color();
        self.printer.layout.x = graphics::draw_bit_image(
            surface,
            self.settings.renderer,
            color,
            density,
            self.printer.layout.x,
            self.printer.layout.y,
            data,
            nine_pin,
        );
    }

    fn raster<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let mode = src.expect("ESC .")?;
        let v = src.expect("ESC .")? as Unit;
        let h = src.expect("ESC .")? as Unit;
        let rows = src.expect("ESC .")?;
        let columns = src.expect_u16_le("ESC .")? as usize;
        let v = if v > 0 { v } else { units::from_360ths(1) };
        let h = if h > 0 { h } else { units::from_360ths(1) };
        match mode {
            0 | 1 => {
                if !matches!(rows, 1 | 8 | 24) {
                    warn!("ESC . band height {} is not 1, 8 or 24", rows);
                }
                let expected = rows as usize * columns.div_ceil(8);
                let data = if mode == 0 {
                    src.expect_vec(expected, "ESC . 0")?
                } else {
                    read_rle_stream(src, expected)?
                };
                let color = self.color();
                self.printer.layout.x = graphics::draw_raster_band(
                    surface,
                    self.settings.renderer,
                    color,
                    h,
                    v,
                    columns,
                    self.printer.layout.x,
                    self.printer.layout.y,
                    &data,
                );
                Ok(Step::Ok)
            }
            2 => self.tiff_mode(src, surface, v, h),
            _ => {
                warn!("ESC . with graphics mode {}, skipped", mode);
                Ok(Step::Skipped)
            }
        }
    }

    /// The TIFF-compressed sub-mode of `ESC . 2`: one-byte opcodes
    /// until `<EXIT>`, a reserved opcode, or end-of-stream.
    fn tiff_mode<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
        v: Unit,
        h: Unit,
    ) -> Result<Step, Error> {
        self.movx_unit = self.printer.layout.unit_or(units::from_360ths(1));
        loop {
            let op = match src.next_byte()? {
                Some(op) => op,
                None => break,
            };
            match op {
                0xe1 => {
                    let n = src.expect_u16_le("<MOVX>")? as i16;
                    let x = self.printer.layout.x + n as Unit * self.movx_unit;
                    if x >= self.printer.layout.margins.left && x <= self.printer.layout.margins.right
                    {
                        self.printer.layout.x = x;
                    }
                }
                0xe2 => {
                    let n = src.expect_u16_le("<MOVY>")?;
                    self.printer.layout.y += n as Unit * v;
                    self.printer.layout.carriage_return();
                    if self.printer.layout.y > self.printer.layout.margins.bottom {
                        self.printer.layout.form_feed();
                        surface.new_page();
                    }
                }
                0xe3 => {
                    let n = src.expect("<COLR>")?;
                    self.set_color(n & 0x0f);
                    self.printer.layout.carriage_return();
                }
                0xe4 => self.printer.layout.carriage_return(),
                0xe5 | 0x80 => {
                    // 0x80 is reserved and treated as <EXIT>
                    self.printer.layout.carriage_return();
                    break;
                }
                0xe6 => {
                    let unit = self.printer.layout.unit_or(units::from_360ths(1));
                    self.movx_unit = 8 * unit;
                    self.printer.layout.carriage_return();
                }
                0xe7 => {
                    let unit = self.printer.layout.unit_or(units::from_360ths(1));
                    self.movx_unit = unit;
                    self.printer.layout.carriage_return();
                }
                n @ 0x00..=0x7f => {
                    let data = src.expect_vec(n as usize + 1, "<XFER>")?;
                    self.transfer_row(surface, v, h, &data);
                }
                n => {
                    // run-length transfer
                    let byte = src.expect("<XFER>")?;
                    let data = vec![byte; 257 - n as usize];
                    self.transfer_row(surface, v, h, &data);
                }
            }
        }
        self.printer.graphics_mode = false;
        Ok(Step::Ok)
    }

    fn transfer_row(&mut self, surface: &mut dyn Surface, v: Unit, h: Unit, data: &[u8]) {
        let color = self.color();
        self.printer.layout.x = graphics::draw_raster_band(
            surface,
            self.settings.renderer,
            color,
            h,
            v,
            data.len() * 8,
            self.printer.layout.x,
            self.printer.layout.y,
            data,
        );
    }

    // ------------------------------------------------------------------
    // ESC ( commands

    fn escape_paren<R: Read>(
        &mut self,
        src: &mut ByteSource<R>,
        surface: &mut dyn Surface,
    ) -> Result<Step, Error> {
        let sub = src.expect("ESC (")?;
        let len = src.expect_u16_le("ESC (")? as usize;
        let payload = src.expect_vec(len, "ESC (")?;
        match (sub, payload.as_slice()) {
            (b'U', [m, ..]) => {
                if matches!(*m, 5 | 10 | 20 | 30 | 40 | 50 | 60) {
                    // m/3600 inch is m grid units
                    self.printer.layout.defined_unit = Some(*m as Unit);
                } else {
                    warn!("ESC ( U with unit {} ignored", m);
                }
            }
            (b'C', [lo, hi, ..]) => {
                let value = u16::from_le_bytes([*lo, *hi]) as Unit;
                let unit = self.printer.layout.unit_or(units::from_360ths(1));
                self.printer.layout.set_page_length(value * unit);
            }
            (b'c', [tl, th, bl, bh, ..]) => {
                let top = u16::from_le_bytes([*tl, *th]);
                let bottom = u16::from_le_bytes([*bl, *bh]);
                self.printer.layout.set_page_format(top, bottom);
            }
            (b'V', [lo, hi, ..]) => {
                let m = u16::from_le_bytes([*lo, *hi]);
                if self.printer.layout.absolute_y(m) == VMove::PageBreak {
                    surface.new_page();
                }
            }
            (b'v', [lo, hi, ..]) => {
                let m = u16::from_le_bytes([*lo, *hi]) as i16;
                if self.printer.layout.relative_y(m) == VMove::PageBreak {
                    surface.new_page();
                }
            }
            (b't', [d1, d2, d3, ..]) => self.assign_character_table(*d1, *d2, *d3),
            (b'-', [_, d1, d2, ..]) => {
                if !self.printer.typography.select_score(*d1, *d2) {
                    warn!("ESC ( - with parameters {} {} ignored", d1, d2);
                }
            }
            (b'^', data) => {
                for &byte in data {
                    self.print_byte(byte, surface);
                }
            }
            (b'G', [m, ..]) => {
                if matches!(*m, 1 | b'1') {
                    self.enter_graphics_mode();
                }
            }
            (b'i', [m, ..]) => {
                self.printer.microweave = matches!(*m, 1 | b'1');
            }
            (b'B', _) => {
                warn!("ESC ( B bar code skipped ({} parameter bytes)", len);
            }
            (sub, _) => {
                warn!(
                    "unknown command ESC ( {:?}, {} parameter bytes skipped",
                    sub as char, len
                );
                return Ok(Step::Skipped);
            }
        }
        Ok(Step::Ok)
    }

    fn assign_character_table(&mut self, d1: u8, d2: u8, d3: u8) {
        let slot = if d1 >= 0x30 { d1 - 0x30 } else { d1 };
        if slot > 3 {
            warn!("ESC ( t with slot {} ignored", slot);
            return;
        }
        if slot > 1 && matches!(self.settings.pins, Pins::P9 | Pins::P24 | Pins::P48) {
            warn!("ESC ( t slot {} is not available on this hardware", slot);
            return;
        }
        match table_for_id(d2, d3) {
            Some(name) => {
                debug!("table ({}, {}) = {} assigned to slot {}", d2, d3, name, slot);
                self.printer.tables.slots[slot as usize] = Some(name.to_string());
            }
            None => {
                warn!(
                    "character table ({}, {}) is not installed, slot {} falls back to cp437",
                    d2, d3, slot
                );
                self.printer.tables.slots[slot as usize] = Some("cp437".to_string());
            }
        }
    }

    fn enter_graphics_mode(&mut self) {
        self.printer.graphics_mode = true;
        self.printer.microweave = false;
        self.printer.layout.h_tabs.clear();
        self.printer.layout.v_tabs = Some(Vec::new());
        self.printer.tables.ram.clear();
    }
}

/// Read TIFF run-length data from the stream until `expected` bytes
/// have been produced.
fn read_rle_stream<R: Read>(
    src: &mut ByteSource<R>,
    expected: usize,
) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(expected);
    while out.len() < expected {
        let counter = src.expect("raster RLE")?;
        if counter & 0x80 != 0 {
            let byte = src.expect("raster RLE")?;
            out.extend(std::iter::repeat(byte).take(257 - counter as usize));
        } else {
            let block = src.expect_vec(counter as usize + 1, "raster RLE")?;
            out.extend_from_slice(&block);
        }
    }
    // a run crossing the band boundary must not bleed into a phantom row
    out.truncate(expected);
    Ok(out)
}
