//! End-to-end pipeline tests through the public API.
//!
//! Sources are built in memory or written to a temp directory, stitched with
//! the real `image`-backed raster backend, sliced, and the encoded bytes are
//! decoded again to check what a user would actually receive.
//!
//! Run with: cargo test --test pipeline

use chrono::NaiveDate;
use image::{ImageEncoder, Rgba, RgbaImage};
use slicestream::config::{self, SliceConfig};
use slicestream::imaging::{CropSpec, OutputFormat, Quality, RasterBackend, RustBackend};
use slicestream::partition::{SliceMode, SliceModeKind};
use slicestream::scan;
use slicestream::session::{Outcome, Session};
use slicestream::slice::{SliceError, SliceSettings, slice_composite};
use slicestream::source::SourceImage;
use slicestream::stitch::{StitchError, stitch};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 4).unwrap()
}

fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbaImage {
    let [r, g, b] = color;
    RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]))
}

fn png(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    buf
}

fn settings(kind: SliceModeKind, value: u32, format: OutputFormat, prefix: &str) -> SliceSettings {
    SliceSettings {
        mode: SliceMode::new(kind, value).unwrap(),
        format,
        quality: Quality::default(),
        prefix: prefix.to_string(),
    }
}

fn three_screens() -> Vec<SourceImage> {
    vec![
        SourceImage::new("1", "top", solid(100, 50, [255, 0, 0])),
        SourceImage::new("2", "middle", solid(200, 80, [0, 255, 0])),
        SourceImage::new("3", "bottom", solid(150, 60, [0, 0, 255])),
    ]
}

#[test]
fn stitch_then_equal_parts_png() {
    let backend = RustBackend::new();
    let composite = stitch(&backend, &three_screens(), None).unwrap();
    assert_eq!((composite.width, composite.height), (200, 260));

    let s = settings(SliceModeKind::EqualParts, 3, OutputFormat::Png, "page-<NO>");
    let slices = slice_composite(&backend, &composite, &s, date()).unwrap();

    let names: Vec<&str> = slices.iter().map(|s| s.filename.as_str()).collect();
    assert_eq!(names, vec!["page-1.png", "page-2.png", "page-3.png"]);

    let dims: Vec<(u32, u32)> = slices
        .iter()
        .map(|s| backend.decode(&s.bytes).unwrap().dimensions())
        .collect();
    assert_eq!(dims, vec![(200, 86), (200, 86), (200, 88)]);

    // Slices tile the composite exactly.
    let mut rebuilt = RgbaImage::new(200, 260);
    for s in &slices {
        let band = backend.decode(&s.bytes).unwrap();
        image::imageops::replace(&mut rebuilt, &band, 0, s.offset_y as i64);
    }
    assert_eq!(rebuilt, composite.pixels);
}

#[test]
fn stitch_then_fixed_height_jpeg() {
    let backend = RustBackend::new();
    let composite = stitch(&backend, &three_screens(), Some(100)).unwrap();
    // 50 + 40 + 40
    assert_eq!((composite.width, composite.height), (100, 130));

    let s = settings(
        SliceModeKind::FixedHeight,
        60,
        OutputFormat::Jpeg,
        "chat-<YYMMDD>-<NO>",
    );
    let slices = slice_composite(&backend, &composite, &s, date()).unwrap();

    let summary: Vec<(&str, u32, u32)> = slices
        .iter()
        .map(|s| (s.filename.as_str(), s.offset_y, s.height))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("chat-251204-1.jpg", 0, 60),
            ("chat-251204-2.jpg", 60, 60),
            ("chat-251204-3.jpg", 120, 10),
        ]
    );
    for s in &slices {
        assert_eq!(&s.bytes[..2], &[0xFF, 0xD8], "{} is not a JPEG", s.filename);
        let decoded = backend.decode(&s.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, s.height));
    }
}

#[test]
fn padding_is_white_and_crop_removes_rows() {
    let backend = RustBackend::new();
    let images = vec![
        SourceImage::new("a", "a", solid(40, 40, [0, 0, 0])).with_crop(CropSpec::new(10, 10, 0, 0)),
        SourceImage::new("b", "b", solid(40, 20, [0, 0, 0])).with_crop(CropSpec::pad(5)),
    ];
    let composite = stitch(&backend, &images, None).unwrap();
    // a: 40x20, b: 50x30 → common width 50; a scales to 50x25.
    assert_eq!(composite.width, 50);
    assert_eq!(composite.height, 25 + 30);
    // Padding border of b.
    assert_eq!(*composite.pixels.get_pixel(0, 25), WHITE);
    assert_eq!(*composite.pixels.get_pixel(49, 54), WHITE);
    assert_eq!(*composite.pixels.get_pixel(25, 40), Rgba([0, 0, 0, 255]));
}

#[test]
fn invalid_crop_names_the_image() {
    let images = vec![
        SourceImage::new("1", "fine", solid(10, 10, [1, 2, 3])),
        SourceImage::new("2", "overcropped", solid(10, 10, [1, 2, 3]))
            .with_crop(CropSpec::new(6, 6, 0, 0)),
    ];
    let err = stitch(&RustBackend::new(), &images, None).unwrap_err();
    assert!(matches!(err, StitchError::InvalidCrop { ref name, .. } if name == "overcropped"));
    assert!(err.to_string().contains("overcropped"));
}

#[test]
fn more_parts_than_rows_is_rejected() {
    let backend = RustBackend::new();
    let composite = stitch(
        &backend,
        &[SourceImage::new("1", "tiny", solid(8, 2, [9, 9, 9]))],
        None,
    )
    .unwrap();
    let s = settings(SliceModeKind::EqualParts, 4, OutputFormat::Png, "x");
    let err = slice_composite(&backend, &composite, &s, date()).unwrap_err();
    assert!(matches!(err, SliceError::TooManyParts { parts: 4, height: 2 }));
}

#[test]
fn session_drops_superseded_requests() {
    let session = Session::new(RustBackend::new());
    let images = three_screens();

    let stale = session.begin();
    let fresh = session.begin();
    assert!(matches!(
        session.stitch(stale, &images, None).unwrap(),
        Outcome::Superseded
    ));

    let composite = session
        .stitch(fresh, &images, None)
        .unwrap()
        .ready()
        .flatten()
        .unwrap();
    assert_eq!(composite.height, 260);
}

// =========================================================================
// Files and config
// =========================================================================

fn write_inputs(dir: &Path) {
    fs::write(dir.join("01-top.png"), png(&solid(60, 30, [200, 0, 0]))).unwrap();
    fs::write(dir.join("02-bottom.png"), png(&solid(60, 45, [0, 0, 200]))).unwrap();
}

#[test]
fn directory_to_slices_on_disk() {
    let tmp = TempDir::new().unwrap();
    let inputs = tmp.path().join("shots");
    fs::create_dir(&inputs).unwrap();
    write_inputs(&inputs);

    let backend = RustBackend::new();
    let files = scan::scan(&[inputs]).unwrap();
    let sources = scan::load_sources(&backend, &files).unwrap();
    let composite = stitch(&backend, &sources, None).unwrap();
    assert_eq!(composite.height, 75);
    assert_eq!(*composite.pixels.get_pixel(0, 0), Rgba([200, 0, 0, 255]));
    assert_eq!(*composite.pixels.get_pixel(0, 74), Rgba([0, 0, 200, 255]));

    let s = settings(SliceModeKind::FixedHeight, 50, OutputFormat::Png, "slice");
    let slices = slice_composite(&backend, &composite, &s, date()).unwrap();
    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    for s in &slices {
        fs::write(out.join(&s.filename), &s.bytes).unwrap();
    }

    let mut written: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, vec!["slice_01.png", "slice_02.png"]);
    let last = backend
        .decode(&fs::read(out.join("slice_02.png")).unwrap())
        .unwrap();
    assert_eq!(last.dimensions(), (60, 25));
}

#[test]
fn preset_from_config_drives_slicing() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(config::CONFIG_FILENAME),
        r#"
[stitch]
target_width = 30

[presets.halves]
mode = "equal-parts"
value = 2
format = "png"
prefix = "half-<NO>"
"#,
    )
    .unwrap();
    write_inputs(tmp.path());

    let config = config::load_config(tmp.path()).unwrap();
    let preset: &SliceConfig = config.slice_config(Some("halves")).unwrap();
    let settings = preset.to_settings().unwrap();

    let backend = RustBackend::with_max_pixels(config.stitch.max_pixels);
    let files = scan::scan(&[tmp.path().to_path_buf()]).unwrap();
    let sources = scan::load_sources(&backend, &files).unwrap();
    let composite = stitch(&backend, &sources, config.stitch.target_width).unwrap();
    // 60x30 → 30x15, 60x45 → 30x23 (22.5 rounds up)
    assert_eq!((composite.width, composite.height), (30, 38));

    let slices = slice_composite(&backend, &composite, &settings, date()).unwrap();
    let summary: Vec<(&str, u32)> = slices
        .iter()
        .map(|s| (s.filename.as_str(), s.height))
        .collect();
    assert_eq!(summary, vec![("half-1.png", 19), ("half-2.png", 19)]);
}
