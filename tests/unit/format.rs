use super::*;

#[test]
fn parse_accepts_aliases_case_and_dots() {
    assert_eq!(MediaFormat::parse("GIF").unwrap(), MediaFormat::Gif);
    assert_eq!(MediaFormat::parse(".jpg").unwrap(), MediaFormat::Jpeg);
    assert_eq!(MediaFormat::parse("tif").unwrap(), MediaFormat::Tiff);
    assert_eq!(MediaFormat::parse("m4a").unwrap(), MediaFormat::Aac);
    assert_eq!("pcm".parse::<MediaFormat>().unwrap(), MediaFormat::F32le);
}

#[test]
fn unknown_identifier_is_unsupported_format() {
    let err = MediaFormat::parse("unknown-format").unwrap_err();
    assert!(matches!(err, MediaError::UnsupportedFormat(_)));
}

#[test]
fn names_round_trip_through_parse() {
    for fmt in MediaFormat::ALL {
        assert_eq!(MediaFormat::parse(fmt.name()).unwrap(), fmt);
    }
}

#[test]
fn capabilities_match_format_families() {
    assert!(MediaFormat::Png.is_static());
    assert!(!MediaFormat::Gif.is_static());
    assert!(!MediaFormat::Gif.has_audio_track());
    assert!(MediaFormat::Mp4.has_image_track() && MediaFormat::Mp4.has_audio_track());
    assert!(!MediaFormat::Wav.has_image_track());
    assert!(!MediaFormat::F32le.is_writable());
    assert!(MediaFormat::Webp.is_writable());
    assert_eq!(MediaFormat::Mkv.ffmpeg_muxer(), Some("matroska"));
}

#[test]
fn built_in_backends_are_always_available() {
    assert!(ensure_available(MediaFormat::Png).is_ok());
    assert!(ensure_available(MediaFormat::Gif).is_ok());
    assert!(ensure_available(MediaFormat::F32le).is_ok());
    assert_eq!(
        ensure_available(MediaFormat::Mp4).is_ok(),
        cfg!(feature = "media-ffmpeg")
    );
}
