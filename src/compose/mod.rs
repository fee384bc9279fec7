//! Composition records and the compositors that consume them.
//!
//! Every compositor takes its input frames by reference and returns a new frame; inputs are never
//! modified.

pub(crate) mod blend;
/// Base and overlay placement onto one canvas.
pub mod overlay;
/// SVG-backed drawables and text rasterization.
pub mod svg;
/// Text records and the glyph compositor.
pub mod text;

pub use overlay::{OverlayData, PixelFormat, Rect, compose_overlay};
pub use svg::{SvgDrawable, text_glyphs};
pub use text::{
    DrawRegion, Drawable, FontDescriptor, FontStyle, GlyphSource, TextDrawData, compose_text,
};
