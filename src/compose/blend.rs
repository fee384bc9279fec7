use image::{RgbImage, RgbaImage};

use crate::foundation::error::{MediaError, MediaResult};
use crate::foundation::math::{mul_div255_u8, mul_div255_u16, premultiply, unpremultiply};

/// Source-over for straight-alpha RGBA8, scaled by `opacity` (0..=255).
pub(crate) fn over(dst: [u8; 4], src: [u8; 4], opacity: u8) -> [u8; 4] {
    if opacity == 0 || src[3] == 0 {
        return dst;
    }
    let sa = mul_div255_u8(u16::from(src[3]), u16::from(opacity));
    if sa == 255 {
        return src;
    }

    let s = premultiply([src[0], src[1], src[2], sa]);
    let d = premultiply(dst);
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = s[i].saturating_add(mul_div255_u8(u16::from(d[i]), inv));
    }
    unpremultiply(out)
}

/// Composite `src` onto `dst` with its top-left corner at `(x, y)`. Parts outside `dst` are
/// clipped.
pub(crate) fn blend_image_at(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, opacity: u8) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width())).min(dw);
    let y1 = (y + i64::from(src.height())).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }
    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = src.get_pixel((dx - x) as u32, (dy - y) as u32).0;
            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            d.0 = over(d.0, s, opacity);
        }
    }
}

/// Flatten straight-alpha RGBA8 onto an opaque background, writing opaque RGBA8 into `dst`.
pub(crate) fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> MediaResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(MediaError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - a;
        for i in 0..3 {
            let c = mul_div255_u16(u16::from(s[i]), a) + mul_div255_u16(u16::from(bg_rgba[i]), inv);
            d[i] = c.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Drop the alpha channel after flattening onto `bg_rgba`.
pub(crate) fn flatten_to_rgb(img: &RgbaImage, bg_rgba: [u8; 4]) -> MediaResult<RgbImage> {
    let mut opaque = vec![0u8; img.as_raw().len()];
    flatten_to_opaque_rgba8(&mut opaque, img.as_raw(), bg_rgba)?;
    let rgb: Vec<u8> = opaque
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    RgbImage::from_raw(img.width(), img.height(), rgb)
        .ok_or_else(|| MediaError::validation("flattened buffer does not match image dimensions"))
}

#[cfg(test)]
#[path = "../../tests/unit/compose/blend.rs"]
mod tests;
