#![warn(missing_docs)]
//! # Vector PDF drawing surface for `escp`
//!
//! A deliberately small PDF writer: base-14 fonts, WinAnsi text, one
//! uncompressed content stream per page, a hand-built xref table. It
//! exists so the interpreter has a production [`Surface`]; everything
//! clever about ESC/P stays on the other side of that trait.

use std::io::{self, Write};

use escp::color::Color;
use escp::surface::{FontId, Surface, TextStyle};
use log::debug;

mod font;

pub use font::{winansi, Base14Fonts, BASE14};

/// A PDF document under construction.
///
/// Coordinates arrive in points with the origin at the top-left corner
/// of the page (the interpreter's frame); the y axis is flipped here.
pub struct PdfSurface<W: Write> {
    out: Option<W>,
    /// Page width and height in points
    page_size: (f32, f32),
    pages: Vec<Vec<u8>>,
    content: Vec<u8>,
    fonts_used: [bool; BASE14.len()],
    producer: String,
}

impl<W: Write> PdfSurface<W> {
    /// New document writing to `out` with all pages of `page_size`
    /// points.
    pub fn new(out: W, page_size: (f32, f32)) -> Self {
        PdfSurface {
            out: Some(out),
            page_size,
            pages: Vec::new(),
            content: Vec::new(),
            fonts_used: [false; BASE14.len()],
            producer: format!("escp-tool {}", env!("CARGO_PKG_VERSION")),
        }
    }

    fn flip(&self, y: f32) -> f32 {
        self.page_size.1 - y
    }

    fn fill_color(&mut self, color: Color) {
        let _ = writeln!(
            self.content,
            "{} {} {} {} k",
            fmt(color.c),
            fmt(color.m),
            fmt(color.y),
            fmt(color.k)
        );
    }

    fn stroke_color(&mut self, color: Color) {
        let _ = writeln!(
            self.content,
            "{} {} {} {} K",
            fmt(color.c),
            fmt(color.m),
            fmt(color.y),
            fmt(color.k)
        );
    }
}

/// Trim a coordinate to two decimals without a trailing zero tail.
fn fmt(value: f32) -> String {
    let mut s = format!("{:.2}", value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// Escape a WinAnsi byte for a PDF string literal.
fn escape_into(buf: &mut Vec<u8>, byte: u8) {
    match byte {
        b'(' | b')' | b'\\' => {
            buf.push(b'\\');
            buf.push(byte);
        }
        0x20..=0x7e => buf.push(byte),
        _ => buf.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
    }
}

impl<W: Write> Surface for PdfSurface<W> {
    fn draw_text(&mut self, glyph: char, font: FontId, x: f32, y: f32, style: &TextStyle) {
        let index = (font.0 as usize).min(BASE14.len() - 1);
        self.fonts_used[index] = true;
        let byte = match winansi(glyph) {
            Some(byte) => byte,
            None => {
                debug!("glyph {:?} is outside WinAnsi, replaced", glyph);
                b'?'
            }
        };
        let y = self.flip(y);
        self.content.extend_from_slice(b"q\n");
        self.fill_color(style.color);
        let _ = writeln!(self.content, "BT\n/F{} {} Tf", index, fmt(style.size));
        if (style.h_scale - 1.0).abs() > 0.001 {
            let _ = writeln!(self.content, "{} Tz", fmt(style.h_scale * 100.0));
        }
        if style.rise != 0.0 {
            let _ = writeln!(self.content, "{} Ts", fmt(style.rise));
        }
        if style.synth_bold {
            // fill and stroke fakes the missing bold face
            self.stroke_color(style.color);
            let _ = writeln!(self.content, "2 Tr {} w", fmt(style.size * 0.02));
        }
        if style.shear != 0.0 {
            let shear = style.shear.to_radians().tan();
            let _ = writeln!(
                self.content,
                "1 0 {} 1 {} {} Tm",
                fmt(shear),
                fmt(x),
                fmt(y)
            );
        } else {
            let _ = writeln!(self.content, "{} {} Td", fmt(x), fmt(y));
        }
        let mut literal = Vec::new();
        escape_into(&mut literal, byte);
        self.content.extend_from_slice(b"(");
        self.content.extend_from_slice(&literal);
        self.content.extend_from_slice(b") Tj\nET\nQ\n");
    }

    fn draw_dot(&mut self, x: f32, y: f32, diameter: f32, color: Color) {
        // a zero-length stroke with round caps is a filled circle and
        // far cheaper than four Bézier segments per dot
        let y = self.flip(y);
        self.content.extend_from_slice(b"q\n");
        self.stroke_color(color);
        let _ = writeln!(self.content, "1 J {} w", fmt(diameter));
        let _ = writeln!(self.content, "{} {} m {} {} l S", fmt(x), fmt(y), fmt(x), fmt(y));
        self.content.extend_from_slice(b"Q\n");
    }

    fn draw_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let y = self.flip(y + h);
        self.content.extend_from_slice(b"q\n");
        self.fill_color(color);
        let _ = writeln!(self.content, "{} {} {} {} re f", fmt(x), fmt(y), fmt(w), fmt(h));
        self.content.extend_from_slice(b"Q\n");
    }

    fn new_page(&mut self) {
        let content = std::mem::take(&mut self.content);
        self.pages.push(content);
    }

    fn finalize(&mut self) -> io::Result<()> {
        let out = match self.out.take() {
            Some(out) => out,
            None => return Ok(()), // already finalised
        };
        self.new_page();
        let pages = std::mem::take(&mut self.pages);
        let mut writer = DocWriter::new(out);
        writer.write_document(self.page_size, &pages, &self.fonts_used, &self.producer)
    }
}

/// Offset-tracking writer assembling the object structure.
struct DocWriter<W: Write> {
    out: W,
    offset: usize,
    xref: Vec<usize>,
}

impl<W: Write> DocWriter<W> {
    fn new(out: W) -> Self {
        DocWriter {
            out,
            offset: 0,
            xref: Vec::new(),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)?;
        self.offset += bytes.len();
        Ok(())
    }

    fn begin_obj(&mut self, id: usize) -> io::Result<()> {
        while self.xref.len() < id {
            self.xref.push(0);
        }
        self.xref[id - 1] = self.offset;
        self.write(format!("{} 0 obj\n", id).as_bytes())
    }

    /// Object layout: 1 catalog, 2 page tree, 3 info, then one font
    /// object per used base-14 font, then page and content pairs.
    fn write_document(
        &mut self,
        page_size: (f32, f32),
        pages: &[Vec<u8>],
        fonts_used: &[bool; BASE14.len()],
        producer: &str,
    ) -> io::Result<()> {
        self.write(b"%PDF-1.4\n%\xb5\xb6\n")?;

        let used: Vec<usize> = (0..BASE14.len()).filter(|&i| fonts_used[i]).collect();
        let font_obj_base = 4;
        let page_obj_base = font_obj_base + used.len();

        // catalog
        self.begin_obj(1)?;
        self.write(b"<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

        // page tree
        self.begin_obj(2)?;
        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", page_obj_base + 2 * i))
            .collect();
        self.write(
            format!(
                "<< /Type /Pages /Count {} /Kids [ {} ] >>\nendobj\n",
                pages.len(),
                kids.join(" ")
            )
            .as_bytes(),
        )?;

        // info
        self.begin_obj(3)?;
        let date = chrono::Local::now().format("D:%Y%m%d%H%M%S");
        self.write(
            format!(
                "<< /Producer ({}) /CreationDate ({}) >>\nendobj\n",
                producer, date
            )
            .as_bytes(),
        )?;

        // fonts
        for (slot, &index) in used.iter().enumerate() {
            self.begin_obj(font_obj_base + slot)?;
            self.write(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
                    BASE14[index]
                )
                .as_bytes(),
            )?;
        }
        let font_refs: Vec<String> = used
            .iter()
            .enumerate()
            .map(|(slot, &index)| format!("/F{} {} 0 R", index, font_obj_base + slot))
            .collect();
        let resources = format!("<< /Font << {} >> >>", font_refs.join(" "));

        // pages and their content streams
        for (i, content) in pages.iter().enumerate() {
            let page_id = page_obj_base + 2 * i;
            self.begin_obj(page_id)?;
            self.write(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources {} /Contents {} 0 R >>\nendobj\n",
                    fmt(page_size.0),
                    fmt(page_size.1),
                    resources,
                    page_id + 1
                )
                .as_bytes(),
            )?;
            self.begin_obj(page_id + 1)?;
            self.write(format!("<< /Length {} >>\nstream\n", content.len()).as_bytes())?;
            self.write(content)?;
            self.write(b"endstream\nendobj\n")?;
        }

        // xref and trailer
        let start_xref = self.offset;
        let size = self.xref.len() + 1;
        self.write(format!("xref\n0 {}\n", size).as_bytes())?;
        self.write(b"0000000000 65535 f \n")?;
        let offsets = std::mem::take(&mut self.xref);
        for offset in offsets {
            self.write(format!("{:010} 00000 n \n", offset).as_bytes())?;
        }
        self.write(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{}\n%%EOF\n",
                size, start_xref
            )
            .as_bytes(),
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escp::color::PALETTE;

    fn style() -> TextStyle {
        TextStyle {
            size: 10.5,
            h_scale: 1.0,
            rise: 0.0,
            char_space: 0.0,
            color: PALETTE[0],
            synth_bold: false,
            shear: 0.0,
        }
    }

    #[test]
    fn writes_a_wellformed_document() {
        let mut buf = Vec::new();
        {
            let mut surface = PdfSurface::new(&mut buf, (595.0, 842.0));
            surface.draw_text('A', FontId(0), 72.0, 72.0, &style());
            surface.finalize().unwrap();
        }
        let text = String::from_utf8_lossy(&buf);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("/BaseFont /Courier"));
        assert!(text.contains("(A) Tj"));
        assert!(text.contains("startxref"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn page_count_matches_new_page_calls() {
        let mut buf = Vec::new();
        {
            let mut surface = PdfSurface::new(&mut buf, (595.0, 842.0));
            surface.draw_text('A', FontId(0), 72.0, 72.0, &style());
            surface.new_page();
            surface.draw_text('B', FontId(0), 72.0, 72.0, &style());
            surface.finalize().unwrap();
        }
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("/Count 2"));
    }

    #[test]
    fn y_axis_is_flipped() {
        let mut buf = Vec::new();
        {
            let mut surface = PdfSurface::new(&mut buf, (595.0, 842.0));
            surface.draw_text('A', FontId(0), 0.0, 42.0, &style());
            surface.finalize().unwrap();
        }
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("0 800 Td"));
    }

    #[test]
    fn unmappable_glyphs_degrade_to_question_mark() {
        let mut buf = Vec::new();
        {
            let mut surface = PdfSurface::new(&mut buf, (595.0, 842.0));
            surface.draw_text('☺', FontId(0), 0.0, 0.0, &style());
            surface.finalize().unwrap();
        }
        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("(?) Tj"));
    }

    #[test]
    fn double_finalize_is_harmless() {
        let mut buf = Vec::new();
        let mut surface = PdfSurface::new(&mut buf, (100.0, 100.0));
        surface.finalize().unwrap();
        surface.finalize().unwrap();
    }
}
