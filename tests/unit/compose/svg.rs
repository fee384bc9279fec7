use super::*;

#[test]
fn svg_rect_draws_into_region() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"><rect width="4" height="4" fill="#ff0000"/></svg>"##;
    let d = SvgDrawable::from_data(svg).unwrap();
    assert_eq!(d.size(), (4, 4));

    let mut canvas = RgbaImage::new(6, 6);
    d.draw(
        &mut canvas,
        DrawRegion {
            x: 1,
            y: 1,
            width: 4,
            height: 4,
        },
    )
    .unwrap();
    assert_eq!(canvas.get_pixel(2, 2).0, [255, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(canvas.get_pixel(5, 5).0, [0, 0, 0, 0]);
}

#[test]
fn invalid_svg_is_decode_error() {
    let err = SvgDrawable::from_data(b"<not-svg").err().unwrap();
    assert!(matches!(err, MediaError::Decode(_)));
}

#[test]
fn text_run_has_line_height() {
    let font = FontDescriptor::new("sans-serif", 20.0);
    let d = SvgDrawable::text("a < b & c", &font, [255, 255, 255, 255]).unwrap();
    let (w, h) = d.size();
    assert!(w >= 1);
    assert_eq!(h, 28);
}

#[test]
fn empty_text_produces_no_glyphs() {
    let glyphs = text_glyphs("", FontDescriptor::new("sans-serif", 12.0), [0, 0, 0, 255]);
    assert!(glyphs.produce().unwrap().is_empty());
}

#[test]
fn escapes_markup() {
    assert_eq!(escape_xml(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&apos;&amp;&apos;&lt;/a&gt;");
}
