//! # Dot graphics
//!
//! Three binary sub-grammars share this decoder: column-oriented
//! bit-image data (`ESC *`, `ESC K/L/Y/Z`, `ESC ^`), row-oriented
//! raster bands (`ESC . 0` and the RLE-compressed `ESC . 1`), and the
//! TIFF-compressed opcode stream entered with `ESC . 2`. Decoded dots
//! land on the drawing surface as circles or small rectangles.

use crate::color::Color;
use crate::interp::Pins;
use crate::surface::Surface;
use crate::units::{self, Unit};

/// How decoded dots are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Renderer {
    /// Circles with a slight overlap
    #[default]
    Dots,
    /// Axis-aligned rectangles of the nominal dot size
    Rectangles,
}

/// One bit-image density mode of `ESC *`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Density {
    /// Horizontal advance per column
    pub h_advance: Unit,
    /// Vertical advance per dot row
    pub v_advance: Unit,
    /// Bytes in one column of data
    pub bytes_per_column: usize,
    /// Whether adjacent horizontal dots may print; when false the
    /// second of two consecutive dots is dropped (double-speed modes)
    pub adjacent: bool,
}

/// Decode the `m` parameter of `ESC *` (shared by `ESC ?`).
///
/// Returns `None` for undefined density values.
pub fn bit_image_density(m: u8, pins: Pins) -> Option<Density> {
    let h_advance = match m {
        0 | 32 | 64 => units::INCH / 60,
        1 | 2 | 33 | 65 => units::INCH / 120,
        3 => units::INCH / 240,
        4 => units::INCH / 80,
        5 => units::INCH / 72,
        6 | 38 | 70 => units::INCH / 90,
        7 => units::INCH / 144,
        39 | 71 => units::INCH / 180,
        40 | 72 | 73 => units::INCH / 360,
        _ => return None,
    };
    let (v_advance, bytes_per_column) = if m < 32 {
        let v = if pins == Pins::P9 {
            units::INCH / 72
        } else {
            units::INCH / 60
        };
        (v, 1)
    } else if m < 64 {
        (units::INCH / 180, 3)
    } else {
        (units::INCH / 360, 6)
    };
    Some(Density {
        h_advance,
        v_advance,
        bytes_per_column,
        adjacent: !matches!(m, 2 | 3 | 40 | 72),
    })
}

/// Emit one dot at grid position `(x, y)`.
pub fn emit_dot(
    surface: &mut dyn Surface,
    renderer: Renderer,
    color: Color,
    h_advance: Unit,
    v_advance: Unit,
    x: Unit,
    y: Unit,
) {
    match renderer {
        Renderer::Dots => {
            // Inscribed circles leave white between dots; stretching
            // the diameter a little keeps filled areas solid.
            let diameter = units::to_points(h_advance.max(v_advance)) * 1.05;
            surface.draw_dot(units::to_points(x), units::to_points(y), diameter, color);
        }
        Renderer::Rectangles => {
            surface.draw_rect(
                units::to_points(x),
                units::to_points(y),
                units::to_points(h_advance),
                units::to_points(v_advance),
                color,
            );
        }
    }
}

/// Draw column-oriented bit-image data starting at `(x, y)`.
///
/// Each column is `density.bytes_per_column` bytes, most significant
/// bit on top. With `nine_pin` set, two bytes form a column and only
/// the top bit of the second byte is used (the ninth needle).
///
/// Returns the new x position: the start plus one advance per column.
pub fn draw_bit_image(
    surface: &mut dyn Surface,
    renderer: Renderer,
    color: Color,
    density: &Density,
    x: Unit,
    y: Unit,
    data: &[u8],
    nine_pin: bool,
) -> Unit {
    let bpc = if nine_pin {
        2
    } else {
        density.bytes_per_column
    };
    let bits = bpc * 8;
    let mut column_x = x;
    let mut prev: u64 = 0;
    for column in data.chunks_exact(bpc) {
        let mut value: u64 = 0;
        for &byte in column {
            value = (value << 8) | byte as u64;
        }
        if nine_pin {
            // needles 1-9: first byte plus the MSB of the second
            value &= 0xff80;
        }
        if !density.adjacent {
            // the second of two consecutive dots is suppressed, so the
            // comparison uses what was actually printed
            value &= !prev;
            prev = value;
        }
        for bit in 0..bits {
            if value & (1 << (bits - 1 - bit)) != 0 {
                emit_dot(
                    surface,
                    renderer,
                    color,
                    density.h_advance,
                    density.v_advance,
                    column_x,
                    y + bit as Unit * density.v_advance,
                );
            }
        }
        column_x += density.h_advance;
    }
    x + (data.len() / bpc) as Unit * density.h_advance
}

/// Draw a row-oriented raster band (`ESC .`): `rows` scanlines of
/// `columns` dots, MSB first, each row `ceil(columns / 8)` bytes.
///
/// Returns the new x position, one horizontal advance past the last
/// column of the band.
#[allow(clippy::too_many_arguments)]
pub fn draw_raster_band(
    surface: &mut dyn Surface,
    renderer: Renderer,
    color: Color,
    h_advance: Unit,
    v_advance: Unit,
    columns: usize,
    x: Unit,
    y: Unit,
    data: &[u8],
) -> Unit {
    let bytes_per_row = columns.div_ceil(8);
    if bytes_per_row == 0 {
        return x;
    }
    for (row, line) in data.chunks(bytes_per_row).enumerate() {
        let row_y = y + row as Unit * v_advance;
        for (index, &byte) in line.iter().enumerate() {
            let mut value = byte;
            let mut bit = 0usize;
            while value != 0 {
                if value & 0x80 != 0 {
                    let column = index * 8 + bit;
                    if column < columns {
                        emit_dot(
                            surface,
                            renderer,
                            color,
                            h_advance,
                            v_advance,
                            x + column as Unit * h_advance,
                            row_y,
                        );
                    }
                }
                value <<= 1;
                bit += 1;
            }
        }
    }
    x + columns as Unit * h_advance
}

/// Decompress TIFF run-length data from a slice until `expected`
/// bytes are produced. Returns the decompressed data and the number
/// of input bytes consumed.
pub fn decompress_rle(input: &[u8], expected: usize) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(expected);
    let mut pos = 0usize;
    while out.len() < expected && pos < input.len() {
        let counter = input[pos];
        pos += 1;
        if counter & 0x80 != 0 {
            // repeat counter, two's complement
            let repeat = 257 - counter as usize;
            if pos >= input.len() {
                break;
            }
            out.extend(std::iter::repeat(input[pos]).take(repeat));
            pos += 1;
        } else {
            let length = counter as usize + 1;
            let end = (pos + length).min(input.len());
            out.extend_from_slice(&input[pos..end]);
            pos = end;
        }
    }
    out.truncate(expected);
    (out, pos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::trace::TraceSurface;

    const BLACK: Color = crate::color::PALETTE[0];

    #[test]
    fn density_table_spot_checks() {
        let d = bit_image_density(0, Pins::Nozzle).unwrap();
        assert_eq!(d.h_advance, 60);
        assert_eq!(d.bytes_per_column, 1);
        assert!(d.adjacent);

        let d = bit_image_density(39, Pins::Nozzle).unwrap();
        assert_eq!(d.h_advance, 20);
        assert_eq!(d.bytes_per_column, 3);

        let d = bit_image_density(72, Pins::Nozzle).unwrap();
        assert_eq!(d.bytes_per_column, 6);
        assert!(!d.adjacent);

        assert!(bit_image_density(8, Pins::Nozzle).is_none());
    }

    #[test]
    fn nine_pin_vertical_resolution() {
        assert_eq!(
            bit_image_density(0, Pins::P9).unwrap().v_advance,
            units::INCH / 72
        );
        assert_eq!(
            bit_image_density(0, Pins::Nozzle).unwrap().v_advance,
            units::INCH / 60
        );
    }

    #[test]
    fn full_column_draws_eight_dots() {
        let mut surface = TraceSurface::new();
        let density = bit_image_density(1, Pins::Nozzle).unwrap();
        let end = draw_bit_image(
            &mut surface,
            Renderer::Dots,
            BLACK,
            &density,
            0,
            0,
            &[0xff, 0xff, 0xff],
            false,
        );
        assert_eq!(surface.dots().len(), 24);
        // 3 columns at 1/120 inch
        assert_eq!(end, 3 * 30);
    }

    #[test]
    fn double_speed_drops_adjacent_dots() {
        let mut surface = TraceSurface::new();
        let density = bit_image_density(2, Pins::Nozzle).unwrap();
        draw_bit_image(
            &mut surface,
            Renderer::Dots,
            BLACK,
            &density,
            0,
            0,
            &[0x80, 0x80, 0x80],
            false,
        );
        // only the first of three adjacent dots survives
        assert_eq!(surface.dots().len(), 2);
    }

    #[test]
    fn ninth_needle_uses_second_byte_msb() {
        let mut surface = TraceSurface::new();
        let density = bit_image_density(0, Pins::P9).unwrap();
        draw_bit_image(
            &mut surface,
            Renderer::Dots,
            BLACK,
            &density,
            0,
            0,
            &[0x00, 0x80, 0x00, 0x7f],
            true,
        );
        // second column's low 7 bits are masked off
        assert_eq!(surface.dots().len(), 1);
        let (x, y) = surface.dots()[0];
        assert_eq!(x, 0.0);
        // dot 9 sits 8 rows below the top at 1/72 inch
        assert_eq!(y, units::to_points(8 * units::INCH / 72));
    }

    #[test]
    fn raster_band_rows_and_columns() {
        let mut surface = TraceSurface::new();
        // 2 rows, 10 columns at 1/360: bytes per row = 2
        let end = draw_raster_band(
            &mut surface,
            Renderer::Rectangles,
            BLACK,
            10,
            10,
            10,
            0,
            0,
            &[0xff, 0xc0, 0x00, 0x40],
        );
        // row 0: 8 + 2 dots, row 1: one dot at column 9
        assert_eq!(surface.ops.len(), 11);
        assert_eq!(end, 100);
    }

    #[test]
    fn raster_ignores_padding_bits() {
        let mut surface = TraceSurface::new();
        // 2 columns declared, full byte sent
        draw_raster_band(
            &mut surface,
            Renderer::Dots,
            BLACK,
            10,
            10,
            2,
            0,
            0,
            &[0xff],
        );
        assert_eq!(surface.dots().len(), 2);
    }

    #[test]
    fn rle_literal_and_run() {
        // literal of 2 bytes, then a run of 3
        let (data, used) = decompress_rle(&[0x01, 0xaa, 0xbb, 0xfe, 0xcc], 5);
        assert_eq!(data, vec![0xaa, 0xbb, 0xcc, 0xcc, 0xcc]);
        assert_eq!(used, 5);
    }

    #[test]
    fn rle_stops_at_expected_length() {
        let (data, used) = decompress_rle(&[0x00, 0x11, 0x00, 0x22, 0x00, 0x33], 2);
        assert_eq!(data, vec![0x11, 0x22]);
        assert_eq!(used, 4);
    }
}
