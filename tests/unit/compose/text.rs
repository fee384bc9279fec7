use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

struct Block {
    w: u32,
    h: u32,
    px: [u8; 4],
}

impl Drawable for Block {
    fn size(&self) -> (u32, u32) {
        (self.w, self.h)
    }

    fn draw(&self, canvas: &mut RgbaImage, region: DrawRegion) -> MediaResult<()> {
        for y in 0..region.height {
            for x in 0..region.width {
                let (cx, cy) = (region.x + i64::from(x), region.y + i64::from(y));
                if cx >= 0
                    && cy >= 0
                    && cx < i64::from(canvas.width())
                    && cy < i64::from(canvas.height())
                {
                    canvas.put_pixel(cx as u32, cy as u32, image::Rgba(self.px));
                }
            }
        }
        Ok(())
    }
}

fn blocks(colors: &'static [[u8; 4]]) -> GlyphSource {
    GlyphSource::new(move || {
        Ok(colors
            .iter()
            .map(|c| Box::new(Block { w: 2, h: 1, px: *c }) as Box<dyn Drawable>)
            .collect())
    })
}

#[test]
fn glyphs_advance_left_to_right_from_origin() {
    let frame = ImageFrame::still(RgbaImage::new(8, 3)).unwrap();
    let text = TextDrawData {
        glyphs: blocks(&[[255, 0, 0, 255], [0, 255, 0, 255]]),
        x: 1,
        y: 1,
        font: FontDescriptor::new("sans-serif", 12.0),
    };
    let out = compose_text(&frame, &text).unwrap();
    let img = out.image();
    assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(2, 1).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(3, 1).0, [0, 255, 0, 255]);
    assert_eq!(img.get_pixel(5, 1).0, [0, 0, 0, 0]);
    assert!(frame.image().pixels().all(|p| p.0 == [0, 0, 0, 0]));
}

#[test]
fn glyphs_are_produced_only_when_drawn() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let glyphs = GlyphSource::new(|| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    });
    let text = TextDrawData {
        glyphs: glyphs.clone(),
        x: 0,
        y: 0,
        font: FontDescriptor::new("serif", 10.0).with_style(FontStyle::BoldItalic),
    };
    assert_eq!(CALLS.load(Ordering::SeqCst), 0);

    let frame = ImageFrame::still(RgbaImage::new(2, 2)).unwrap();
    compose_text(&frame, &text).unwrap();
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn off_canvas_glyphs_are_skipped() {
    let frame = ImageFrame::still(RgbaImage::new(4, 4)).unwrap();
    let text = TextDrawData {
        glyphs: blocks(&[[1, 2, 3, 255]]),
        x: -10,
        y: 0,
        font: FontDescriptor::new("sans-serif", 12.0),
    };
    let out = compose_text(&frame, &text).unwrap();
    assert_eq!(out.image(), frame.image());
}

#[test]
fn producer_errors_propagate() {
    let frame = ImageFrame::still(RgbaImage::new(1, 1)).unwrap();
    let text = TextDrawData {
        glyphs: GlyphSource::new(|| Err(MediaError::validation("no font"))),
        x: 0,
        y: 0,
        font: FontDescriptor::new("x", 1.0),
    };
    assert!(matches!(
        compose_text(&frame, &text),
        Err(MediaError::Validation(_))
    ));
}

#[test]
fn style_flags() {
    assert!(FontStyle::BoldItalic.is_bold() && FontStyle::BoldItalic.is_italic());
    assert!(!FontStyle::Regular.is_bold());
    assert!(FontDescriptor::new("x", 0.0).validate().is_err());
}
