//! # The Epson eight-colour palette
//!
//! Colour ribbons and ink cartridges expose the same eight slots on every
//! model; `ESC r` selects one globally and `<COLR>` selects one inside
//! TIFF-compressed raster mode.

/// Index into the printer palette, as carried by `ESC r n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorId(pub u8);

impl ColorId {
    /// Black, the power-on default.
    pub const BLACK: ColorId = ColorId(0);

    /// The palette slot, or `None` for out-of-range ids.
    pub fn color(self) -> Option<Color> {
        PALETTE.get(self.0 as usize).copied()
    }
}

impl Default for ColorId {
    fn default() -> Self {
        ColorId::BLACK
    }
}

/// A CMYK colour, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Cyan component
    pub c: f32,
    /// Magenta component
    pub m: f32,
    /// Yellow component
    pub y: f32,
    /// Key (black) component
    pub k: f32,
}

impl Color {
    const fn cmyk(c: f32, m: f32, y: f32, k: f32) -> Self {
        Color { c, m, y, k }
    }
}

/// The palette in `ESC r` order.
pub const PALETTE: [Color; 7] = [
    Color::cmyk(0.0, 0.0, 0.0, 1.0),  // Black
    Color::cmyk(0.0, 1.0, 0.0, 0.0),  // Magenta
    Color::cmyk(1.0, 0.0, 0.0, 0.0),  // Cyan
    Color::cmyk(0.44, 1.0, 0.0, 0.0), // Violet
    Color::cmyk(0.0, 0.0, 1.0, 0.0),  // Yellow
    Color::cmyk(0.0, 1.0, 1.0, 0.0),  // Red
    Color::cmyk(1.0, 0.0, 1.0, 0.0),  // Green
];

/// Names for log output, in palette order.
pub const COLOR_NAMES: [&str; 7] = [
    "Black", "Magenta", "Cyan", "Violet", "Yellow", "Red", "Green",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_id_has_no_color() {
        assert!(ColorId(7).color().is_none());
        assert_eq!(ColorId(0).color(), Some(PALETTE[0]));
    }
}
