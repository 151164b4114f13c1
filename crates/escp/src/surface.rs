//! # The drawing surface and font resolver boundaries
//!
//! The interpreter never writes a document format itself. It drives a
//! [`Surface`] with page-space primitives (points, origin at the top-left
//! corner of the page, y growing downwards) and asks a [`FontResolver`]
//! for concrete font handles and advance widths. The `escp-pdf` crate
//! provides the production implementations; tests use [`trace::TraceSurface`].

use std::io;

use crate::color::Color;

/// Opaque font handle issued by a [`FontResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u16);

/// The attributes a glyph is drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font size in points (double-height is already folded in)
    pub size: f32,
    /// Horizontal stretch, 1.0 = natural width
    pub h_scale: f32,
    /// Baseline shift in points, positive = upwards (superscript)
    pub rise: f32,
    /// Extra space after the glyph in points
    pub char_space: f32,
    /// Ink colour
    pub color: Color,
    /// Draw a second pass offset by a dot (bold on fonts without a bold face)
    pub synth_bold: bool,
    /// Shear angle in degrees (italic on fonts without an italic face)
    pub shear: f32,
}

/// A vector drawing surface producing one document per run.
///
/// A surface starts with a single open page; [`Surface::new_page`] closes
/// it and opens the next one, so a finished document has one more page
/// than `new_page` calls.
pub trait Surface {
    /// Draw a single glyph with its baseline origin at `(x, y)`.
    fn draw_text(&mut self, glyph: char, font: FontId, x: f32, y: f32, style: &TextStyle);

    /// Draw one ink dot centred at `(x, y)`.
    fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Color);

    /// Draw a filled axis-aligned rectangle with its top-left at `(x, y)`.
    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);

    /// Finish the current page and start a new one.
    fn new_page(&mut self);

    /// Flush the document.
    fn finalize(&mut self) -> io::Result<()>;
}

/// What the interpreter asks the resolver for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontRequest {
    /// Epson typeface id (`ESC k`)
    pub typeface: u8,
    /// Proportional or fixed spacing
    pub proportional: bool,
    /// Bold weight requested
    pub bold: bool,
    /// Italic slant requested
    pub italic: bool,
    /// Condensed variant requested
    pub condensed: bool,
}

/// The resolver's answer: a handle plus which of the requested
/// attributes the concrete font actually covers. Attributes the font
/// does not cover are simulated by the interpreter (double-pass bold,
/// sheared italic, horizontally scaled condensed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontSelection {
    /// Handle to pass back into [`Surface::draw_text`]
    pub font: FontId,
    /// The face itself is bold
    pub bold: bool,
    /// The face itself is italic
    pub italic: bool,
    /// The face itself is condensed
    pub condensed: bool,
}

/// Maps typeface and style requests to concrete fonts.
pub trait FontResolver {
    /// Pick the closest installed font for a request. Must always
    /// return something; missing faces substitute a default.
    fn select(&self, req: &FontRequest) -> FontSelection;

    /// Advance width of `ch` as a fraction of the em square.
    fn advance(&self, font: FontId, ch: char) -> f32;
}

pub mod trace {
    //! A surface that records draw calls, for tests and debugging.

    use std::io;

    use super::{FontId, Surface, TextStyle};
    use crate::color::Color;

    /// One recorded primitive.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DrawOp {
        /// A glyph at (x, y)
        Text {
            /// The decoded character
            glyph: char,
            /// Resolved font handle
            font: FontId,
            /// Baseline x in points
            x: f32,
            /// Baseline y in points
            y: f32,
            /// Full style record
            style: TextStyle,
        },
        /// A dot at (x, y)
        Dot {
            /// Centre x in points
            x: f32,
            /// Centre y in points
            y: f32,
            /// Diameter in points
            diameter: f32,
            /// Ink colour
            color: Color,
        },
        /// A filled rectangle
        Rect {
            /// Left edge in points
            x: f32,
            /// Top edge in points
            y: f32,
            /// Width in points
            w: f32,
            /// Height in points
            h: f32,
            /// Ink colour
            color: Color,
        },
        /// A page break
        NewPage,
    }

    /// Records every call for later inspection.
    #[derive(Debug, Default)]
    pub struct TraceSurface {
        /// The recorded calls, in order
        pub ops: Vec<DrawOp>,
        /// Whether `finalize` ran
        pub finalized: bool,
    }

    impl TraceSurface {
        /// New empty recorder.
        pub fn new() -> Self {
            Self::default()
        }

        /// Recorded glyphs, in order.
        pub fn glyphs(&self) -> String {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Text { glyph, .. } => Some(*glyph),
                    _ => None,
                })
                .collect()
        }

        /// Number of page breaks.
        pub fn page_breaks(&self) -> usize {
            self.ops
                .iter()
                .filter(|op| matches!(op, DrawOp::NewPage))
                .count()
        }

        /// Recorded dots as `(x, y)` pairs.
        pub fn dots(&self) -> Vec<(f32, f32)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    DrawOp::Dot { x, y, .. } => Some((*x, *y)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for TraceSurface {
        fn draw_text(&mut self, glyph: char, font: FontId, x: f32, y: f32, style: &TextStyle) {
            self.ops.push(DrawOp::Text {
                glyph,
                font,
                x,
                y,
                style: style.clone(),
            });
        }

        fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Color) {
            self.ops.push(DrawOp::Dot {
                x,
                y,
                diameter,
                color,
            });
        }

        fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
            self.ops.push(DrawOp::Rect { x, y, w, h, color });
        }

        fn new_page(&mut self) {
            self.ops.push(DrawOp::NewPage);
        }

        fn finalize(&mut self) -> io::Result<()> {
            self.finalized = true;
            Ok(())
        }
    }

    /// A resolver with a single fixed-pitch font, for tests.
    #[derive(Debug, Default)]
    pub struct MonoResolver;

    impl super::FontResolver for MonoResolver {
        fn select(&self, _req: &super::FontRequest) -> super::FontSelection {
            super::FontSelection {
                font: FontId(0),
                bold: false,
                italic: false,
                condensed: false,
            }
        }

        fn advance(&self, _font: FontId, _ch: char) -> f32 {
            0.6
        }
    }
}
