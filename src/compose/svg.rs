use std::sync::{Arc, OnceLock};

use image::RgbaImage;

use crate::compose::blend::blend_image_at;
use crate::compose::text::{DrawRegion, Drawable, FontDescriptor, GlyphSource};
use crate::foundation::error::{MediaError, MediaResult};
use crate::foundation::math::unpremultiply;

/// Rasters larger than this on either side are refused.
const MAX_DIM: u32 = 16_384;

fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.faces().count(), "loaded system fonts");
        Arc::new(db)
    })
    .clone()
}

fn svg_options() -> usvg::Options<'static> {
    usvg::Options {
        fontdb: system_fontdb(),
        ..Default::default()
    }
}

/// A parsed SVG document drawn at its own pixel size.
pub struct SvgDrawable {
    tree: usvg::Tree,
    width: u32,
    height: u32,
}

impl SvgDrawable {
    /// Parse an SVG document.
    pub fn from_data(bytes: &[u8]) -> MediaResult<Self> {
        let tree = usvg::Tree::from_data(bytes, &svg_options())
            .map_err(|e| MediaError::decode(format!("parse svg tree: {e}")))?;
        let size = tree.size();
        let width = to_px(size.width())?;
        let height = to_px(size.height())?;
        Ok(Self {
            tree,
            width,
            height,
        })
    }

    /// A single run of text rendered with system fonts. The width is trimmed to the laid out
    /// glyphs; the height is one line box.
    pub fn text(text: &str, font: &FontDescriptor, rgba: [u8; 4]) -> MediaResult<Self> {
        font.validate()?;
        let size = font.size_px;
        let line_h = (size * 1.4).ceil().max(1.0);
        let guess_w = (text.chars().count() as f32 * size + size).ceil().max(1.0);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{guess_w}" height="{line_h}"><text x="0" y="{baseline}" font-family="'{family}', sans-serif" font-size="{size}" font-weight="{weight}" font-style="{style}" fill="rgb({r},{g},{b})" fill-opacity="{opacity}" xml:space="preserve">{body}</text></svg>"#,
            baseline = size,
            family = escape_xml(&font.family),
            weight = if font.style.is_bold() { "bold" } else { "normal" },
            style = if font.style.is_italic() { "italic" } else { "normal" },
            r = rgba[0],
            g = rgba[1],
            b = rgba[2],
            opacity = f32::from(rgba[3]) / 255.0,
            body = escape_xml(text),
        );

        let mut drawable = Self::from_data(svg.as_bytes())?;
        let ink_right = drawable.tree.root().abs_bounding_box().right();
        if ink_right.is_finite() && ink_right > 0.0 {
            drawable.width = (ink_right.ceil() as u32).clamp(1, drawable.width);
        } else {
            drawable.width = 1;
        }
        Ok(drawable)
    }

    fn rasterize(&self, width: u32, height: u32) -> MediaResult<RgbaImage> {
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| MediaError::validation("failed to allocate svg pixmap"))?;
        let sx = width as f32 / self.width as f32;
        let sy = height as f32 / self.height as f32;
        resvg::render(
            &self.tree,
            resvg::tiny_skia::Transform::from_scale(sx, sy),
            &mut pixmap.as_mut(),
        );

        let straight: Vec<u8> = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|px| unpremultiply([px[0], px[1], px[2], px[3]]))
            .collect();
        RgbaImage::from_raw(width, height, straight)
            .ok_or_else(|| MediaError::validation("svg pixmap size mismatch"))
    }
}

impl Drawable for SvgDrawable {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn draw(&self, canvas: &mut RgbaImage, region: DrawRegion) -> MediaResult<()> {
        if region.width == 0 || region.height == 0 {
            return Ok(());
        }
        if region.width > MAX_DIM || region.height > MAX_DIM {
            return Err(MediaError::validation(format!(
                "svg raster size too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
                region.width, region.height
            )));
        }
        let raster = self.rasterize(region.width, region.height)?;
        blend_image_at(canvas, &raster, region.x, region.y, 255);
        Ok(())
    }
}

/// Glyph source that renders `text` when drawn.
pub fn text_glyphs(text: impl Into<String>, font: FontDescriptor, rgba: [u8; 4]) -> GlyphSource {
    let text = text.into();
    GlyphSource::new(move || {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let run = SvgDrawable::text(&text, &font, rgba)?;
        Ok(vec![Box::new(run) as Box<dyn Drawable>])
    })
}

fn to_px(v: f32) -> MediaResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(MediaError::validation("svg has invalid width/height"));
    }
    let px = (v.ceil() as u32).max(1);
    if px > MAX_DIM {
        return Err(MediaError::validation(format!(
            "svg size {px} exceeds {MAX_DIM}"
        )));
    }
    Ok(px)
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/compose/svg.rs"]
mod tests;
