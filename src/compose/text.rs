use std::fmt;
use std::sync::Arc;

use image::RgbaImage;

use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::ImageFrame;

/// Weight and slant of a font face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FontStyle {
    /// Upright, normal weight.
    #[default]
    Regular,
    /// Upright, bold weight.
    Bold,
    /// Slanted, normal weight.
    Italic,
    /// Slanted, bold weight.
    BoldItalic,
}

impl FontStyle {
    /// Bold or bold italic.
    pub fn is_bold(self) -> bool {
        matches!(self, Self::Bold | Self::BoldItalic)
    }

    /// Italic or bold italic.
    pub fn is_italic(self) -> bool {
        matches!(self, Self::Italic | Self::BoldItalic)
    }
}

/// Font requested for a text block.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FontDescriptor {
    /// Family name, e.g. `sans-serif`.
    pub family: String,
    /// Em size in pixels. Must be finite and positive.
    pub size_px: f32,
    /// Face within the family.
    pub style: FontStyle,
}

impl FontDescriptor {
    /// Regular face of `family` at `size_px`.
    pub fn new(family: impl Into<String>, size_px: f32) -> Self {
        Self {
            family: family.into(),
            size_px,
            style: FontStyle::Regular,
        }
    }

    /// Change the face.
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub(crate) fn validate(&self) -> MediaResult<()> {
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(MediaError::validation(format!(
                "font size must be finite and > 0, got {}",
                self.size_px
            )));
        }
        Ok(())
    }
}

/// Where a drawable lands on the canvas. May extend past the canvas edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawRegion {
    /// Left edge, possibly negative.
    pub x: i64,
    /// Top edge, possibly negative.
    pub y: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Something that can paint itself into a canvas region.
///
/// Implementations clip to the canvas; a region partly or fully outside it is not an error.
pub trait Drawable {
    /// Natural size in pixels.
    fn size(&self) -> (u32, u32);

    /// Paint into `region` of `canvas`.
    fn draw(&self, canvas: &mut RgbaImage, region: DrawRegion) -> MediaResult<()>;
}

type GlyphFn = dyn Fn() -> MediaResult<Vec<Box<dyn Drawable>>> + Send + Sync;

/// Lazily evaluated producer of the drawables for a text block.
///
/// Layout code builds it; the producer only runs when the text is actually drawn. Cloning shares
/// the producer.
#[derive(Clone)]
pub struct GlyphSource(Arc<GlyphFn>);

impl GlyphSource {
    /// Wrap `produce`. It is not called here.
    pub fn new(
        produce: impl Fn() -> MediaResult<Vec<Box<dyn Drawable>>> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(produce))
    }

    /// Run the producer.
    pub fn produce(&self) -> MediaResult<Vec<Box<dyn Drawable>>> {
        (self.0)()
    }
}

impl fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GlyphSource(..)")
    }
}

/// A text block placed on a frame. `(x, y)` is the top-left of the first glyph, in the pixel
/// space of the frame it is drawn onto.
#[derive(Clone, Debug)]
pub struct TextDrawData {
    /// Drawables for the text, produced at draw time.
    pub glyphs: GlyphSource,
    /// Left edge of the first glyph.
    pub x: i32,
    /// Top edge of the glyph row.
    pub y: i32,
    /// Font the glyphs were shaped with.
    pub font: FontDescriptor,
}

/// Draw `text` onto a copy of `frame`.
pub fn compose_text(frame: &ImageFrame, text: &TextDrawData) -> MediaResult<ImageFrame> {
    let mut canvas = frame.image().clone();
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));

    let mut pen_x = i64::from(text.x);
    let y = i64::from(text.y);
    for glyph in text.glyphs.produce()? {
        let (width, height) = glyph.size();
        let region = DrawRegion {
            x: pen_x,
            y,
            width,
            height,
        };
        pen_x += i64::from(width);

        let visible = region.x < cw
            && region.y < ch
            && region.x + i64::from(width) > 0
            && region.y + i64::from(height) > 0;
        if visible {
            glyph.draw(&mut canvas, region)?;
        }
    }

    frame.with_image(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/text.rs"]
mod tests;
