use image::RgbaImage;

use crate::compose::blend::{blend_image_at, flatten_to_opaque_rgba8};
use crate::foundation::error::{MediaError, MediaResult};
use crate::frame::ImageFrame;

/// Pixel layout of a composed canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Keep transparency.
    #[default]
    Rgba8,
    /// Opaque output; transparent areas are flattened onto black.
    Rgb8,
}

/// How a base image and an overlay image are placed onto one output canvas.
///
/// Placements are top-left corners in canvas pixels. Both images must fit entirely inside the
/// canvas; [`OverlayData::placement`] rejects anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct OverlayData {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Left edge of the base image.
    pub base_x: i32,
    /// Top edge of the base image.
    pub base_y: i32,
    /// Left edge of the overlay image.
    pub overlay_x: i32,
    /// Top edge of the overlay image.
    pub overlay_y: i32,
    /// Output pixel layout.
    pub format: PixelFormat,
}

/// Destination rectangle on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl OverlayData {
    /// Canvas of the given size with both images at the origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            base_x: 0,
            base_y: 0,
            overlay_x: 0,
            overlay_y: 0,
            format: PixelFormat::Rgba8,
        }
    }

    /// Move the base image.
    pub fn with_base_at(mut self, x: i32, y: i32) -> Self {
        self.base_x = x;
        self.base_y = y;
        self
    }

    /// Move the overlay image.
    pub fn with_overlay_at(mut self, x: i32, y: i32) -> Self {
        self.overlay_x = x;
        self.overlay_y = y;
        self
    }

    /// Change the output pixel layout.
    pub fn with_format(mut self, format: PixelFormat) -> Self {
        self.format = format;
        self
    }

    /// Canvas as large as the bigger image, both images centered.
    pub fn centered(base: (u32, u32), overlay: (u32, u32)) -> Self {
        let width = base.0.max(overlay.0);
        let height = base.1.max(overlay.1);
        let center = |outer: u32, inner: u32| ((outer - inner) / 2) as i32;
        Self::new(width, height)
            .with_base_at(center(width, base.0), center(height, base.1))
            .with_overlay_at(center(width, overlay.0), center(height, overlay.1))
    }

    /// Base on top, overlay underneath, each horizontally centered.
    ///
    /// `Validation` when the top image is taller than `i32::MAX` or the summed height overflows.
    pub fn stacked_vertical(top: (u32, u32), bottom: (u32, u32)) -> MediaResult<Self> {
        let too_tall = || {
            MediaError::validation(format!(
                "cannot stack {}x{} above {}x{}: canvas too tall",
                top.0, top.1, bottom.0, bottom.1
            ))
        };
        let width = top.0.max(bottom.0);
        let height = top.1.checked_add(bottom.1).ok_or_else(too_tall)?;
        let overlay_y = i32::try_from(top.1).map_err(|_| too_tall())?;
        let center = |inner: u32| ((width - inner) / 2) as i32;
        Ok(Self::new(width, height)
            .with_base_at(center(top.0), 0)
            .with_overlay_at(center(bottom.0), overlay_y))
    }

    /// Destination rectangles for base and overlay of the given sizes.
    pub fn placement(&self, base: (u32, u32), overlay: (u32, u32)) -> MediaResult<(Rect, Rect)> {
        if self.width == 0 || self.height == 0 {
            return Err(MediaError::validation(format!(
                "overlay canvas must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        let base_rect = self.place("base", self.base_x, self.base_y, base)?;
        let overlay_rect = self.place("overlay", self.overlay_x, self.overlay_y, overlay)?;
        Ok((base_rect, overlay_rect))
    }

    fn place(&self, what: &str, x: i32, y: i32, (w, h): (u32, u32)) -> MediaResult<Rect> {
        let fits = |origin: i32, len: u32, canvas: u32| {
            origin >= 0 && u64::from(origin as u32) + u64::from(len) <= u64::from(canvas)
        };
        if !fits(x, w, self.width) || !fits(y, h, self.height) {
            return Err(MediaError::validation(format!(
                "{what} {w}x{h} at ({x}, {y}) does not fit the {}x{} canvas",
                self.width, self.height
            )));
        }
        Ok(Rect {
            x: x as u32,
            y: y as u32,
            width: w,
            height: h,
        })
    }
}

/// Composite `overlay` over `base` onto a new canvas described by `data`.
///
/// The result keeps the timing of `base`. Neither input is modified.
pub fn compose_overlay(
    base: &ImageFrame,
    overlay: &ImageFrame,
    data: &OverlayData,
) -> MediaResult<ImageFrame> {
    let (base_rect, overlay_rect) = data.placement(
        (base.width(), base.height()),
        (overlay.width(), overlay.height()),
    )?;

    let mut canvas = RgbaImage::new(data.width, data.height);
    blend_image_at(
        &mut canvas,
        base.image(),
        i64::from(base_rect.x),
        i64::from(base_rect.y),
        255,
    );
    blend_image_at(
        &mut canvas,
        overlay.image(),
        i64::from(overlay_rect.x),
        i64::from(overlay_rect.y),
        255,
    );

    if data.format == PixelFormat::Rgb8 {
        let src = canvas.as_raw().clone();
        let mut flat = vec![0u8; src.len()];
        flatten_to_opaque_rgba8(&mut flat, &src, [0, 0, 0, 255])?;
        canvas = RgbaImage::from_raw(data.width, data.height, flat)
            .ok_or_else(|| MediaError::validation("flattened canvas does not match dimensions"))?;
    }

    base.with_image(canvas)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/overlay.rs"]
mod tests;
