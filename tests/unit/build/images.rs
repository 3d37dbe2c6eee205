use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "psd2scene_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn sanitize_replaces_reserved_characters_and_whitespace_runs() {
    assert_eq!(sanitize_file_name("a/b:c*d"), "a_b_c_d");
    assert_eq!(sanitize_file_name("Hero   image\tv2"), "Hero_image_v2");
    assert_eq!(sanitize_file_name("<\"|?>"), "_____");
    assert_eq!(sanitize_file_name("로고"), "로고");
}

#[test]
fn memory_mode_names_by_role_and_counter() {
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();
    let raster = RasterRef::Inline(vec![1, 2, 3]);

    let a = sink.export("Hero image", ImageRole::Layer, &raster).unwrap();
    let b = sink.export("Hero image", ImageRole::Mask, &raster).unwrap();
    let c = sink.export("Dots", ImageRole::Pattern, &raster).unwrap();

    assert_eq!(a.file_name, "Hero_image_0.png");
    assert_eq!(b.file_name, "Hero_image_mask_1.png");
    assert_eq!(c.file_name, "Dots_pattern_2.png");
    assert!(a.data.is_none());

    let files = sink.into_files();
    assert_eq!(files.len(), 3);
    assert_eq!(files["Hero_image_0.png"], vec![1, 2, 3]);
}

#[test]
fn inline_mode_embeds_base64() {
    let mut sink = ImageSink::new(ImageExport::Inline).unwrap();
    let r = sink
        .export("x", ImageRole::Layer, &RasterRef::Inline(vec![1, 2, 3]))
        .unwrap();
    assert_eq!(r.data.as_deref(), Some("AQID"));
}

#[test]
fn streamed_payloads_keep_their_name() {
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();
    let r = sink
        .export("x", ImageRole::Layer, &RasterRef::Streamed("parsed_7.png".into()))
        .unwrap();
    assert_eq!(r.file_name, "parsed_7.png");
    assert!(sink.into_files().is_empty());
}

#[test]
fn stream_mode_writes_immediately_and_keeps_nothing() {
    let dir = temp_dir("image_sink_stream");
    let mut sink = ImageSink::new(ImageExport::Stream { dir: dir.clone() }).unwrap();
    let r = sink
        .export("Layer 1", ImageRole::Layer, &RasterRef::Inline(vec![9, 9]))
        .unwrap();
    assert_eq!(std::fs::read(dir.join(&r.file_name)).unwrap(), vec![9, 9]);
    assert_eq!(sink.streamed_count(), 1);
    assert!(sink.into_files().is_empty());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn empty_payload_is_rejected() {
    let mut sink = ImageSink::new(ImageExport::Memory).unwrap();
    assert!(
        sink.export("x", ImageRole::Layer, &RasterRef::Inline(vec![]))
            .is_err()
    );
}
