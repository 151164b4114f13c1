//! End-to-end dispatcher tests: byte streams in, draw calls out.

use escp::chsets::userdef::NullStore;
use escp::chsets::Registry;
use escp::error::Error;
use escp::graphics::Renderer;
use escp::interp::{Interpreter, Pins, Settings};
use escp::layout::Paper;
use escp::surface::trace::{DrawOp, MonoResolver, TraceSurface};

const A4_PT: (f64, f64) = (595.0, 842.0);

fn settings(pins: Pins) -> Settings {
    Settings {
        pins,
        paper: Paper::new(A4_PT, Paper::default_margins_mm(true), true),
        automatic_linefeed: false,
        renderer: Renderer::Dots,
    }
}

fn run(stream: &[u8]) -> TraceSurface {
    run_with(stream, Pins::Nozzle).unwrap()
}

fn run_with(stream: &[u8], pins: Pins) -> Result<TraceSurface, Error> {
    let registry = Registry::with_builtin();
    let fonts = MonoResolver;
    let mut store = NullStore;
    let mut surface = TraceSurface::new();
    let mut interp = Interpreter::new(settings(pins), &registry, &fonts, &mut store);
    interp.run(stream, &mut surface)?;
    Ok(surface)
}

/// Left printable edge: 6.35 mm in points.
const LEFT: f32 = 18.0;
/// Baseline offset below the vertical position: 20/180 inch.
const BASELINE: f32 = 8.0;

fn text_positions(surface: &TraceSurface) -> Vec<(f32, f32)> {
    surface
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { x, y, .. } => Some((*x, *y)),
            _ => None,
        })
        .collect()
}

#[test]
fn hello_draws_five_glyphs_at_advancing_x() {
    let surface = run(b"Hello\r\n");
    assert_eq!(surface.glyphs(), "Hello");
    let positions = text_positions(&surface);
    assert_eq!(positions.len(), 5);
    for (i, (x, y)) in positions.iter().enumerate() {
        // 10 cpi is 7.2 pt per character
        assert_eq!(*x, LEFT + 7.2 * i as f32);
        assert_eq!(*y, LEFT + BASELINE);
    }
    assert_eq!(surface.page_breaks(), 0);
    assert!(surface.finalized);
}

#[test]
fn line_feed_advances_y_and_cr_resets_x() {
    let surface = run(b"A\r\nB");
    let positions = text_positions(&surface);
    assert_eq!(positions[0], (LEFT, LEFT + BASELINE));
    // default line spacing is 1/6 inch = 12 pt
    assert_eq!(positions[1], (LEFT, LEFT + BASELINE + 12.0));
}

#[test]
fn line_feed_alone_retains_x() {
    let surface = run(b"AB\nC");
    let positions = text_positions(&surface);
    // C starts where the line feed left the position, two advances in
    assert_eq!(positions[2].0, LEFT + 14.4);
    assert_eq!(positions[2].1, LEFT + BASELINE + 12.0);
}

#[test]
fn national_overlay_survives_reset_order() {
    // reset, select France, print "A" and "{" (becomes e-acute)
    let surface = run(b"\x1b@\x1bR\x01A\x7b\r\n");
    assert_eq!(surface.glyphs(), "Aé");
}

#[test]
fn bit_image_mode_one_three_columns() {
    let surface = run(b"\x1b*\x01\x03\x00\xFF\xFF\xFF");
    let dots = surface.dots();
    assert_eq!(dots.len(), 24);
    // columns advance 1/120 inch = 0.6 pt
    let xs: Vec<f32> = dots.iter().map(|(x, _)| *x).collect();
    assert!(xs.iter().filter(|&&x| x == LEFT).count() == 8);
    assert!(xs.iter().filter(|&&x| x == LEFT + 0.6).count() == 8);
    assert!(xs.iter().filter(|&&x| x == LEFT + 1.2).count() == 8);
    // graphics print at the position itself, without baseline offset
    assert_eq!(dots[0].1, LEFT);
}

#[test]
fn zero_columns_is_pure_advance() {
    let surface = run(b"\x1b*\x01\x00\x00A");
    assert_eq!(surface.dots().len(), 0);
    let positions = text_positions(&surface);
    assert_eq!(positions[0].0, LEFT);
}

#[test]
fn compressed_raster_literal_and_exit() {
    // enter TIFF mode at 1/180 inch spacing, one literal byte 0xAA,
    // exit, then print normally
    let surface = run(b"\x1b.\x02\x14\x14\x01\x02\x00\x00\xAA\xE5A");
    let dots = surface.dots();
    // 0xAA has four bits set, at even columns of 20/3600 inch
    assert_eq!(dots.len(), 4);
    for (i, (x, _)) in dots.iter().enumerate() {
        assert_eq!(*x, LEFT + 0.8 * i as f32);
    }
    // the mode exited cleanly: the glyph draws as text at the left margin
    assert_eq!(surface.glyphs(), "A");
    assert_eq!(text_positions(&surface)[0].0, LEFT);
}

#[test]
fn compressed_raster_reserved_opcode_exits() {
    // 0x80 is reserved and must behave like <EXIT>
    let surface = run(b"\x1b.\x02\x14\x14\x01\x00\x00\x80A");
    assert_eq!(surface.glyphs(), "A");
}

#[test]
fn compressed_raster_run_length_transfer() {
    // 0xFF repeats the next byte 257 - 255 = 2 times
    let surface = run(b"\x1b.\x02\x14\x14\x01\x00\x00\xFF\x80\xE5");
    assert_eq!(surface.dots().len(), 2);
}

#[test]
fn bold_applies_to_four_glyphs_only() {
    let surface = run(b"\x1bEbold\x1bFplain");
    let flags: Vec<bool> = surface
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { style, .. } => Some(style.synth_bold),
            _ => None,
        })
        .collect();
    assert_eq!(
        flags,
        vec![true, true, true, true, false, false, false, false, false]
    );
}

#[test]
fn character_table_slot_assignment() {
    // assign PC850 to slot 1, select slot 1, print 0x80
    let surface = run(b"\x1b(t\x03\x00\x01\x03\x00\x1bt\x01\x80");
    assert_eq!(surface.glyphs(), "Ç");
}

#[test]
fn new_page_count_matches_form_feeds() {
    let surface = run(b"one\x0ctwo\x0cthree");
    assert_eq!(surface.page_breaks(), 2);
}

#[test]
fn form_feed_resets_position_to_top_left() {
    let surface = run(b"AA\x0cB");
    let positions = text_positions(&surface);
    assert_eq!(positions[2], (LEFT, LEFT + BASELINE));
}

#[test]
fn horizontal_tab_moves_to_next_stop() {
    // default stops sit every 8 characters (0.8 inch)
    let surface = run(b"A\tB");
    let positions = text_positions(&surface);
    assert_eq!(positions[1].0, LEFT + 57.6);
}

#[test]
fn cleared_tabs_make_ht_a_noop() {
    let surface = run(b"\x1bD\x00A\tB");
    let positions = text_positions(&surface);
    assert_eq!(positions[1].0, positions[0].0 + 7.2);
}

#[test]
fn vertical_tab_without_stops_is_line_feed() {
    let surface = run(b"A\x0bB");
    let positions = text_positions(&surface);
    assert_eq!(positions[1].1, positions[0].1 + 12.0);
}

#[test]
fn line_spacing_commands_change_the_advance() {
    // ESC 0 selects 1/8 inch = 9 pt
    let surface = run(b"A\x1b0\nB");
    let positions = text_positions(&surface);
    assert_eq!(positions[1].1 - positions[0].1, 9.0);
}

#[test]
fn esc_three_zero_is_rejected() {
    let surface = run(b"A\x1b3\x00\nB");
    let positions = text_positions(&surface);
    // spacing unchanged: still the default 12 pt
    assert_eq!(positions[1].1 - positions[0].1, 12.0);
}

#[test]
fn absolute_position_uses_default_sixtieths() {
    let surface = run(b"\x1b$\x3c\x00A");
    let positions = text_positions(&surface);
    // 60/60 inch right of the left margin
    assert_eq!(positions[0].0, LEFT + 72.0);
}

#[test]
fn defined_unit_rescales_absolute_position() {
    // ESC ( U selects 10/3600 inch, ESC $ 360 is then one inch
    let surface = run(b"\x1b(U\x01\x00\x0a\x1b$\x68\x01A");
    let positions = text_positions(&surface);
    assert_eq!(positions[0].0, LEFT + 72.0);
}

#[test]
fn unknown_escape_is_skipped() {
    let surface = run(b"A\x1b\x01B");
    assert_eq!(surface.glyphs(), "AB");
}

#[test]
fn unknown_paren_command_skips_payload() {
    // the two declared payload bytes must not print
    let surface = run(b"A\x1b(z\x02\x00XYB");
    assert_eq!(surface.glyphs(), "AB");
}

#[test]
fn truncated_parameter_block_is_fatal() {
    let err = run_with(b"\x1b*\x01\x10\x00\xff", Pins::Nozzle).unwrap_err();
    assert!(matches!(err, Error::Truncated(_)));
}

#[test]
fn truncation_still_finalizes_the_surface() {
    let registry = Registry::with_builtin();
    let fonts = MonoResolver;
    let mut store = NullStore;
    let mut surface = TraceSurface::new();
    let mut interp = Interpreter::new(settings(Pins::Nozzle), &registry, &fonts, &mut store);
    let result = interp.run(&b"A\x1b*\x01\x10\x00"[..], &mut surface);
    assert!(result.is_err());
    assert!(surface.finalized);
    assert_eq!(surface.glyphs(), "A");
}

#[test]
fn reset_restores_defaults() {
    // condensed 12 cpi, then reset: back to 10 cpi advances
    let surface = run(b"\x1bM\x0fA\x1b@AB");
    let positions = text_positions(&surface);
    let after_reset = positions[2].0 - positions[1].0;
    assert_eq!(after_reset, 7.2);
}

#[test]
fn master_select_is_atomic() {
    // 12 cpi + underline, then cleared by a second master select
    let surface = run(b"\x1b!\x81A\x1b!\x00B");
    let positions = text_positions(&surface);
    assert_eq!(positions[1].0 - positions[0].0, 6.0);
    let underline_rects = surface
        .ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Rect { .. }))
        .count();
    // only the underlined glyph produced a score rectangle
    assert_eq!(underline_rects, 1);
}

#[test]
fn double_width_one_line_clears_on_line_feed() {
    let surface = run(b"\x0eA\nB");
    let positions = text_positions(&surface);
    // double width advance is 14.4 pt; after LF the B is back to 7.2
    assert_eq!(positions[1].0 - positions[0].0, 14.4);
}

#[test]
fn nine_pin_bit_image_uses_ninth_needle() {
    let surface = run_with(b"\x1b^\x00\x01\x00\x80\x80", Pins::P9).unwrap();
    let dots = surface.dots();
    assert_eq!(dots.len(), 2);
    // first needle at the position, ninth needle 8/72 inch below
    assert_eq!(dots[0].1, LEFT);
    assert_eq!(dots[1].1, LEFT + 8.0);
}

#[test]
fn klyz_shortcut_uses_reassigned_density() {
    // reassign ESC K to 1/120 inch, then print one column
    let surface = run(b"\x1b?K\x01\x1bK\x02\x00\x80\x80");
    let dots = surface.dots();
    assert_eq!(dots.len(), 2);
    assert_eq!(dots[1].0 - dots[0].0, 0.6);
}

#[test]
fn raster_band_draws_rows() {
    // ESC . 0, 1/180 inch spacing, 8 rows, 8 columns
    let mut stream = b"\x1b.\x00\x14\x14\x08\x08\x00".to_vec();
    stream.extend_from_slice(&[0x80; 8]);
    let surface = run(&stream);
    let dots = surface.dots();
    assert_eq!(dots.len(), 8);
    // one dot per row in the first column
    assert_eq!(dots[1].1 - dots[0].1, 0.4);
    assert_eq!(dots[0].0, LEFT);
}

#[test]
fn rle_raster_band_decompresses() {
    // ESC . 1, one row of 16 columns: run of 2 bytes 0xFF
    let surface = run(b"\x1b.\x01\x14\x14\x01\x10\x00\xfe\xff");
    assert_eq!(surface.dots().len(), 16);
}

#[test]
fn print_data_as_characters_bypasses_commands() {
    // ESC ( ^ prints the LF byte as a glyph instead of feeding
    let surface = run(b"\x1b(^\x01\x00\x0aA");
    let positions = text_positions(&surface);
    assert_eq!(positions.len(), 2);
    // both glyphs share the baseline: no line feed happened
    assert_eq!(positions[0].1, positions[1].1);
}

#[test]
fn right_margin_wraps_text() {
    // right margin at 2 columns from the printable edge
    let surface = run(b"\x1bQ\x02ABC");
    let positions = text_positions(&surface);
    assert_eq!(positions[0].1, positions[1].1);
    // the third glyph wrapped to the next line at the left margin
    assert_eq!(positions[2].0, LEFT);
    assert_eq!(positions[2].1, positions[0].1 + 12.0);
}

#[test]
fn upper_control_codes_toggle() {
    // ESC 7 filters 0x80..0x9F, ESC 6 restores them
    let surface = run(b"\x1b7\x80\x1b6\x80");
    assert_eq!(surface.glyphs(), "Ç");
}

#[test]
fn vertical_overflow_triggers_implicit_form_feed() {
    // drive y past the bottom margin with 1-inch line feeds
    let mut stream = b"\x1bA\x3c".to_vec(); // 60/60 inch spacing
    stream.extend_from_slice(&[b'\n'; 12]);
    stream.push(b'A');
    let surface = run(&stream);
    assert_eq!(surface.page_breaks(), 1);
    let positions = text_positions(&surface);
    // the glyph landed on the second page near the top margin
    assert!(positions[0].1 < 60.0);
}
