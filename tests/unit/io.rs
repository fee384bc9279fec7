use super::*;

#[test]
fn bytes_source_reads_back() {
    let src = MediaSource::bytes(vec![1u8, 2, 3]);
    assert!(src.as_path().is_none());
    assert!(src.try_clone().is_none());
    assert_eq!(src.read_all().unwrap(), vec![1, 2, 3]);
}

#[test]
fn missing_path_is_io_error_naming_the_file() {
    let err = MediaSource::path("/definitely/not/here.png")
        .open()
        .err()
        .unwrap();
    assert!(matches!(err, MediaError::Io(_)));
    assert!(err.to_string().contains("here.png"));
}

#[test]
fn path_sink_creates_parent_and_respects_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("out.bin");

    let mut sink = MediaSink::path(&out);
    sink.prepare(false).unwrap();
    sink.deliver(b"abc").unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"abc");

    assert!(MediaSink::path(&out).prepare(false).is_err());
    assert!(MediaSink::path(&out).prepare(true).is_ok());
}

#[test]
fn stream_sink_receives_bytes() {
    #[derive(Clone, Default)]
    struct Shared(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);
    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    let shared = Shared::default();
    let mut sink = MediaSink::stream(shared.clone());
    sink.deliver(b"xyz").unwrap();
    assert_eq!(shared.0.lock().unwrap().as_slice(), b"xyz");
}
