//! # Page geometry and the print position
//!
//! Everything is measured in grid units with the origin at the top-left
//! corner of the page, y growing downwards. The printable area is the
//! mechanical limit; the page margins live inside it and can be moved
//! by commands. The print position always stays inside the margins:
//! horizontal overflow is refused or wrapped by the caller, vertical
//! overflow triggers an implicit form feed.

use crate::interp::Pins;
use crate::units::{self, Unit};

/// Absolute edge coordinates of a rectangle on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edges {
    /// Top edge, distance from the page top
    pub top: Unit,
    /// Bottom edge, distance from the page top
    pub bottom: Unit,
    /// Left edge, distance from the page left
    pub left: Unit,
    /// Right edge, distance from the page left
    pub right: Unit,
}

impl Edges {
    /// Width of the area.
    pub fn width(&self) -> Unit {
        self.right - self.left
    }
}

/// The sheet the document is printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paper {
    /// Page width in grid units
    pub width: Unit,
    /// Page height in grid units
    pub height: Unit,
    /// Single sheets or continuous (fan-fold) paper
    pub single_sheet: bool,
    /// The mechanically printable area
    pub printable: Edges,
}

impl Paper {
    /// Build a sheet from a size in points and printable-area margins
    /// in millimetres `(top, bottom, left, right)`.
    pub fn new(size_pt: (f64, f64), margins_mm: (f64, f64, f64, f64), single_sheet: bool) -> Paper {
        let width = units::from_points(size_pt.0);
        let height = units::from_points(size_pt.1);
        let printable = Edges {
            top: units::from_mm(margins_mm.0),
            bottom: height - units::from_mm(margins_mm.1),
            left: units::from_mm(margins_mm.2),
            right: width - units::from_mm(margins_mm.3),
        };
        Paper {
            width,
            height,
            single_sheet,
            printable,
        }
    }

    /// The default printable-area margins in millimetres: narrow on
    /// single sheets, tractor-feed clearance on continuous paper.
    pub fn default_margins_mm(single_sheet: bool) -> (f64, f64, f64, f64) {
        if single_sheet {
            (6.35, 6.35, 6.35, 6.35)
        } else {
            (9.0, 9.0, 3.0, 3.0)
        }
    }
}

/// Outcome of a vertical movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMove {
    /// Still on the current page
    Stayed,
    /// The move crossed the bottom margin; a new page was started
    PageBreak,
}

/// The layout engine: geometry, position, tabs and spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// The sheet
    pub paper: Paper,
    /// Current page margins (inside the printable area)
    pub margins: Edges,
    /// Print position, absolute page coordinates
    pub x: Unit,
    /// Print position, absolute page coordinates
    pub y: Unit,
    /// Vertical advance of one line feed
    pub line_spacing: Unit,
    /// `ESC ( U` unit for absolute positioning, `None` until set
    pub defined_unit: Option<Unit>,
    /// Logical page length (top-of-form distance)
    pub page_length: Unit,
    /// Horizontal tab stops, offsets from the left margin, ascending
    pub h_tabs: Vec<Unit>,
    /// Vertical tab stops, offsets from the top margin; `None` until
    /// `ESC B` ran for the first time
    pub v_tabs: Option<Vec<Unit>>,
    /// CR implies LF (DIP-switch / panel setting)
    pub automatic_linefeed: bool,
}

/// Default line spacing: 1/6 inch.
pub const DEFAULT_LINE_SPACING: Unit = units::INCH / 6;

impl Layout {
    /// Power-on layout for a sheet.
    pub fn new(paper: Paper, automatic_linefeed: bool) -> Layout {
        let mut layout = Layout {
            paper,
            margins: paper.printable,
            x: paper.printable.left,
            y: paper.printable.top,
            line_spacing: DEFAULT_LINE_SPACING,
            defined_unit: None,
            page_length: paper.printable.bottom - paper.printable.top,
            h_tabs: Vec::new(),
            v_tabs: None,
            automatic_linefeed,
        };
        layout.reset_h_tabs(units::INCH / 10);
        if !paper.single_sheet {
            layout.page_length = paper.height;
        }
        layout
    }

    /// `ESC @` — restore margins, tabs, spacing and units; the print
    /// position stays where it is, clamped into the restored margins.
    pub fn reset(&mut self, default_pitch: Unit) {
        let keep = (self.x, self.y);
        *self = Layout::new(self.paper, self.automatic_linefeed);
        self.x = keep.0.clamp(self.margins.left, self.margins.right);
        self.y = keep.1.clamp(self.margins.top, self.margins.bottom);
        self.reset_h_tabs(default_pitch);
    }

    /// The default stops: one every eight characters.
    pub fn reset_h_tabs(&mut self, pitch: Unit) {
        self.h_tabs = (1..=32).map(|i| 8 * i * pitch).collect();
    }

    /// The unit for absolute positioning commands, with a per-command
    /// default denominator.
    pub fn unit_or(&self, default: Unit) -> Unit {
        self.defined_unit.unwrap_or(default)
    }

    /// CR — back to the left margin. The caller handles
    /// `automatic_linefeed`.
    pub fn carriage_return(&mut self) {
        self.x = self.margins.left;
    }

    /// LF — advance one line. `x` is retained; crossing the bottom
    /// margin starts a new page.
    pub fn line_feed(&mut self, pins: Pins) -> VMove {
        self.y += self.line_spacing;
        self.handle_bottom(pins)
    }

    /// `ESC J` — advance by n/180 inch (n/216 on 9-pin hardware)
    /// without a carriage return.
    pub fn advance_y(&mut self, n: u8, pins: Pins) -> VMove {
        self.y += if pins == Pins::P9 {
            units::from_216ths(n as i32)
        } else {
            units::from_180ths(n as i32)
        };
        self.handle_bottom(pins)
    }

    fn handle_bottom(&mut self, pins: Pins) -> VMove {
        // 9-pin single sheets eject at the printable edge, everything
        // else at the bottom margin
        let limit = if pins == Pins::P9 && self.paper.single_sheet {
            self.paper.printable.bottom
        } else {
            self.margins.bottom
        };
        if self.y > limit {
            self.top_of_next_page();
            VMove::PageBreak
        } else {
            VMove::Stayed
        }
    }

    /// FF — implicit CR, then the top of the next page.
    pub fn form_feed(&mut self) {
        self.carriage_return();
        self.top_of_next_page();
    }

    fn top_of_next_page(&mut self) {
        self.y = self.margins.top;
    }

    /// HT — smallest stop strictly right of the position; out-of-range
    /// stops and an empty table leave the position alone.
    pub fn h_tab(&mut self) -> bool {
        let next = self
            .h_tabs
            .iter()
            .map(|&offset| self.margins.left + offset)
            .find(|&stop| stop > self.x);
        match next {
            Some(stop) if stop <= self.margins.right => {
                self.x = stop;
                true
            }
            _ => false,
        }
    }

    /// VT — smallest stop strictly below the position. With no usable
    /// stop the command degrades to a line feed.
    pub fn v_tab(&mut self, pins: Pins) -> VMove {
        let stops = match &self.v_tabs {
            Some(stops) if !stops.is_empty() => stops,
            _ => return self.line_feed(pins),
        };
        let next = stops
            .iter()
            .map(|&offset| self.margins.top + offset)
            .find(|&stop| stop > self.y && stop <= self.margins.bottom);
        match next {
            Some(stop) => {
                self.y = stop;
                VMove::Stayed
            }
            None => self.line_feed(pins),
        }
    }

    /// BS — one advance to the left, refused at the left margin.
    pub fn backspace(&mut self, advance: Unit) {
        let x = self.x - advance;
        if x >= self.margins.left {
            self.x = x;
        }
    }

    /// `ESC D` — horizontal stops in the current pitch, ascending; a
    /// descending value ends the list. An empty list clears all stops.
    pub fn set_h_tabs(&mut self, columns: &[u8], pitch: Unit) {
        self.h_tabs.clear();
        let mut prev = 0u8;
        for &column in columns.iter().take(32) {
            if column < prev {
                break;
            }
            self.h_tabs.push(column as Unit * pitch);
            prev = column;
        }
    }

    /// `ESC B` — vertical stops in the current line spacing.
    pub fn set_v_tabs(&mut self, lines: &[u8]) {
        let mut stops = Vec::new();
        let mut prev = 0u8;
        for &line in lines.iter().take(16) {
            if line < prev {
                break;
            }
            stops.push(line as Unit * self.line_spacing);
            prev = line;
        }
        self.v_tabs = Some(stops);
    }

    /// `ESC $` — absolute horizontal position in defined units
    /// (default 1/60 inch, always 1/60 on 9-pin hardware). Ignored
    /// right of the right margin.
    pub fn absolute_x(&mut self, n: u16, pins: Pins) {
        let unit = if pins == Pins::P9 {
            units::from_60ths(1)
        } else {
            self.unit_or(units::from_60ths(1))
        };
        let x = self.margins.left + n as Unit * unit;
        if x > self.margins.right {
            log::warn!("ESC $ past the right margin, ignored");
            return;
        }
        self.x = x;
    }

    /// `ESC \` — signed relative horizontal move. Ignored when the
    /// target leaves the printing area.
    pub fn relative_x(&mut self, n: i16, unit: Unit) {
        let x = self.x + n as Unit * unit;
        if x < self.margins.left || x >= self.margins.right {
            log::warn!("ESC \\ outside the margins, ignored");
            return;
        }
        self.x = x;
    }

    /// Maximum upward movement of the vertical position commands:
    /// 179/360 inch.
    const MAX_REVERSE: Unit = units::from_360ths(179);

    /// `ESC ( V` — absolute vertical position from the top margin.
    /// Below the bottom margin the paper advances to the next page.
    pub fn absolute_y(&mut self, m: u16) -> VMove {
        let unit = self.unit_or(units::from_360ths(1));
        let y = self.margins.top + m as Unit * unit;
        if y > self.margins.bottom {
            self.form_feed();
            return VMove::PageBreak;
        }
        if self.y - y > Self::MAX_REVERSE {
            log::warn!("ESC ( V reverse move too large, ignored");
            return VMove::Stayed;
        }
        self.y = y;
        VMove::Stayed
    }

    /// `ESC ( v` — signed relative vertical move.
    pub fn relative_y(&mut self, m: i16) -> VMove {
        let unit = self.unit_or(units::from_360ths(1));
        let delta = m as Unit * unit;
        if -delta > Self::MAX_REVERSE {
            log::warn!("ESC ( v reverse move too large, ignored");
            return VMove::Stayed;
        }
        let y = self.y + delta;
        if y < self.margins.top {
            log::warn!("ESC ( v above the top margin, ignored");
            return VMove::Stayed;
        }
        if y > self.margins.bottom {
            self.form_feed();
            return VMove::PageBreak;
        }
        self.y = y;
        VMove::Stayed
    }

    /// `ESC ( c` — top and bottom margins, measured from the top edge
    /// of the page in defined units. Values outside the printable area
    /// clamp to it; an empty or inverted range restores the printable
    /// area.
    pub fn set_page_format(&mut self, top: u16, bottom: u16) {
        let unit = self.unit_or(units::from_360ths(1));
        let printable = self.paper.printable;
        let mut top = (top as Unit * unit).clamp(printable.top, printable.bottom);
        let mut bottom = (bottom as Unit * unit).clamp(printable.top, printable.bottom);
        if top >= bottom {
            log::warn!("ESC ( c top margin not above bottom margin, using printable area");
            top = printable.top;
            bottom = printable.bottom;
        }
        if bottom - top > 22 * units::INCH {
            bottom = top + 22 * units::INCH;
        }
        self.margins.top = top;
        self.margins.bottom = bottom;
        self.page_length = bottom - top;
        self.top_of_next_page();
    }

    /// `ESC ( C` / `ESC C` / `ESC C NUL` — page length; cancels the
    /// top and bottom margins.
    pub fn set_page_length(&mut self, length: Unit) {
        let length = if length <= 0 || length > 22 * units::INCH {
            log::warn!("page length outside (0, 22] inches, clamped");
            22 * units::INCH
        } else {
            length
        };
        self.page_length = length;
        self.cancel_top_bottom_margins();
    }

    /// `ESC O` — margins back to the printable area.
    pub fn cancel_top_bottom_margins(&mut self) {
        self.margins.top = self.paper.printable.top;
        self.margins.bottom = self
            .paper
            .printable
            .bottom
            .min(self.margins.top + self.page_length);
    }

    /// `ESC N` — bottom margin above the next top-of-form, continuous
    /// paper only.
    pub fn set_bottom_margin(&mut self, lines: u8) {
        if self.paper.single_sheet {
            return;
        }
        self.cancel_top_bottom_margins();
        let height = lines as Unit * self.line_spacing;
        if height >= self.page_length {
            log::warn!("ESC N bottom margin exceeds the page length, ignored");
            return;
        }
        self.margins.bottom = (self.page_length - height).min(self.paper.printable.bottom);
    }

    /// `ESC Q` — right margin in columns of the current pitch. Must
    /// leave at least a tenth of an inch of printing width.
    pub fn set_right_margin(&mut self, columns: u8, pitch: Unit) {
        let right = self.paper.printable.left + columns as Unit * pitch;
        let min = self.margins.left + units::INCH / 10;
        if right < min || right > self.paper.printable.right {
            log::warn!("ESC Q right margin rejected");
            return;
        }
        self.margins.right = right;
        self.carriage_return();
    }

    /// `ESC l` — left margin in columns of the current pitch.
    pub fn set_left_margin(&mut self, columns: u8, pitch: Unit) {
        let left = self.paper.printable.left + columns as Unit * pitch;
        if left < 0 || left > self.margins.right - units::INCH / 10 {
            log::warn!("ESC l left margin rejected");
            return;
        }
        self.margins.left = left;
        self.carriage_return();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a4() -> Paper {
        Paper::new(
            (595.0, 842.0),
            Paper::default_margins_mm(true),
            true,
        )
    }

    fn layout() -> Layout {
        Layout::new(a4(), false)
    }

    #[test]
    fn line_feed_keeps_x() {
        let mut l = layout();
        l.x = l.margins.left + 720;
        let before = l.x;
        assert_eq!(l.line_feed(Pins::Nozzle), VMove::Stayed);
        assert_eq!(l.x, before);
        assert_eq!(l.y, l.margins.top + DEFAULT_LINE_SPACING);
    }

    #[test]
    fn line_feed_overflow_breaks_page() {
        let mut l = layout();
        l.y = l.margins.bottom;
        assert_eq!(l.line_feed(Pins::Nozzle), VMove::PageBreak);
        assert_eq!(l.y, l.margins.top);
    }

    #[test]
    fn h_tab_picks_next_stop() {
        let mut l = layout();
        l.set_h_tabs(&[4, 8, 12], units::INCH / 10);
        l.x = l.margins.left + 4 * 360;
        assert!(l.h_tab());
        assert_eq!(l.x, l.margins.left + 8 * 360);
    }

    #[test]
    fn h_tab_without_stop_is_noop() {
        let mut l = layout();
        l.set_h_tabs(&[2], units::INCH / 10);
        l.x = l.margins.left + 720;
        let before = l.x;
        assert!(!l.h_tab());
        assert_eq!(l.x, before);
    }

    #[test]
    fn descending_tab_value_ends_the_list() {
        let mut l = layout();
        l.set_h_tabs(&[10, 20, 15, 30], units::INCH / 10);
        assert_eq!(l.h_tabs.len(), 2);
    }

    #[test]
    fn empty_tab_list_clears_stops() {
        let mut l = layout();
        l.set_h_tabs(&[], units::INCH / 10);
        assert!(l.h_tabs.is_empty());
        assert!(!l.h_tab());
    }

    #[test]
    fn v_tab_without_stops_is_line_feed() {
        let mut l = layout();
        let y = l.y;
        assert_eq!(l.v_tab(Pins::Nozzle), VMove::Stayed);
        assert_eq!(l.y, y + l.line_spacing);
    }

    #[test]
    fn absolute_x_beyond_right_margin_is_ignored() {
        let mut l = layout();
        l.absolute_x(10, Pins::Nozzle);
        assert_eq!(l.x, l.margins.left + 600);
        l.absolute_x(u16::MAX, Pins::Nozzle);
        assert_eq!(l.x, l.margins.left + 600);
    }

    #[test]
    fn defined_unit_changes_absolute_commands() {
        let mut l = layout();
        l.defined_unit = Some(units::from_360ths(1));
        l.absolute_x(60, Pins::Nozzle);
        assert_eq!(l.x, l.margins.left + 600);
        // 9-pin hardware pins ESC $ to 1/60
        l.absolute_x(10, Pins::P9);
        assert_eq!(l.x, l.margins.left + 600);
    }

    #[test]
    fn right_margin_rejected_when_not_past_left() {
        let mut l = layout();
        let before = l.margins;
        l.set_left_margin(20, units::INCH / 10);
        l.set_right_margin(10, units::INCH / 10);
        assert_eq!(l.margins.right, before.right);
        assert_ne!(l.margins.left, before.left);
    }

    #[test]
    fn page_format_clamps_to_printable_area() {
        let mut l = layout();
        // request margins far beyond the sheet
        l.defined_unit = Some(units::from_360ths(1));
        l.set_page_format(0, u16::MAX);
        assert_eq!(l.margins.top, l.paper.printable.top);
        assert_eq!(l.margins.bottom, l.paper.printable.bottom);
    }

    #[test]
    fn relative_y_reverse_limit() {
        let mut l = layout();
        l.y = l.margins.top + 2 * units::INCH;
        let y = l.y;
        l.relative_y(-180); // half an inch up, allowed? 180 * 10 = 1800 > 1790
        assert_eq!(l.y, y);
        l.relative_y(-100); // 1000 subunits up
        assert_eq!(l.y, y - 1000);
    }
}
