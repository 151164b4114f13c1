#![warn(missing_docs)]
//! # Epson ESC/P and ESC/P 2 interpreter
//!
//! This crate interprets the byte stream a DOS-era application would
//! have sent to an Epson dot-matrix or inkjet printer and replays it
//! as vector draw calls, so legacy print jobs can be preserved as
//! documents with selectable text.
//!
//! The interpreter itself never touches an output format. It drives a
//! [`surface::Surface`] (glyphs, dots, rectangles, page breaks),
//! resolves fonts through a [`surface::FontResolver`] and reports
//! user-defined character definitions to a [`chsets::CharStore`]. The
//! companion `escp-pdf` crate provides the PDF implementations of
//! those traits.
//!
//! ```no_run
//! use escp::interp::{Interpreter, Pins, Settings};
//! use escp::chsets::{userdef::NullStore, Registry};
//! use escp::graphics::Renderer;
//! use escp::layout::Paper;
//! use escp::surface::trace::{MonoResolver, TraceSurface};
//!
//! let registry = Registry::with_builtin();
//! let fonts = MonoResolver;
//! let mut store = NullStore;
//! let settings = Settings {
//!     pins: Pins::Nozzle,
//!     paper: Paper::new((595.0, 842.0), Paper::default_margins_mm(true), true),
//!     automatic_linefeed: false,
//!     renderer: Renderer::Dots,
//! };
//! let mut surface = TraceSurface::new();
//! let mut interp = Interpreter::new(settings, &registry, &fonts, &mut store);
//! interp.run(&b"Hello\r\n"[..], &mut surface).unwrap();
//! ```

pub mod chsets;
pub mod color;
pub mod error;
pub mod graphics;
pub mod interp;
pub mod layout;
pub mod surface;
pub mod typography;
pub mod units;

pub use error::Error;
