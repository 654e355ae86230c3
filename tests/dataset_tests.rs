
use dereflect_rust::config::TransformConfig;
use dereflect_rust::image_io::PngImageIo;
use dereflect_rust::training::{list_images, PairedImageFolder};
use dereflect_rust::transform::ImageTransform;
use dereflect_rust::ReflectionError;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

fn open(reflected: &std::path::Path, clear: &std::path::Path, size: u32) -> dereflect_rust::Result<PairedImageFolder> {
    let transform = ImageTransform::new(TransformConfig::with_size(size)).unwrap();
    PairedImageFolder::new(reflected, clear, transform, Arc::new(PngImageIo))
}

#[test]
fn test_mismatched_counts_fail_at_construction() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 10, 11, 4);

    match open(&reflected, &clear, 4) {
        Err(ReflectionError::Configuration(msg)) => {
            assert!(msg.contains("10"));
            assert!(msg.contains("11"));
        }
        Err(other) => panic!("Expected Configuration error, got {:?}", other),
        Ok(_) => panic!("Mismatched directories were accepted"),
    }
}

#[test]
fn test_length_and_range() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 3, 3, 8);
    let dataset = assert_ok(open(&reflected, &clear, 8), "opening dataset");

    assert_eq!(dataset.length(), 3);
    for i in 0..dataset.length() {
        assert_ok(dataset.get(i), "reading pair");
    }

    match dataset.get(3) {
        Err(ReflectionError::IndexOutOfRange { index, length }) => {
            assert_eq!(index, 3);
            assert_eq!(length, 3);
        }
        other => panic!("Expected IndexOutOfRange, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_samples_are_resized_and_normalized() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 1, 1, 20);
    let dataset = open(&reflected, &clear, 256).unwrap();

    let sample = dataset.get(0).unwrap();
    assert_eq!(sample.reflected.dim(), (3, 256, 256));
    assert_eq!(sample.clear.dim(), (3, 256, 256));
    assert!(sample.reflected.iter().all(|v| *v >= -1.0 && *v <= 1.0));

    // 128 / 255 * 2 - 1
    let expected = 128.0 / 255.0 * 2.0 - 1.0;
    assert!(sample.clear.iter().all(|v| (v - expected).abs() < 1e-2));
}

#[test]
fn test_pairs_follow_sorted_names() {
    let dir = TempDir::new().unwrap();
    let reflected = dir.path().join("reflected");
    let clear = dir.path().join("clear");
    fs::create_dir_all(&reflected).unwrap();
    fs::create_dir_all(&clear).unwrap();

    write_solid_png(&reflected.join("b.png"), 4, 4, [200, 0, 0]);
    write_solid_png(&reflected.join("a.png"), 4, 4, [100, 0, 0]);
    write_solid_png(&clear.join("z.png"), 4, 4, [0, 200, 0]);
    write_solid_png(&clear.join("y.png"), 4, 4, [0, 100, 0]);

    let dataset = open(&reflected, &clear, 4).unwrap();
    let (first_reflected, first_clear) = dataset.paths(0).unwrap();
    assert_eq!(first_reflected.file_name().unwrap(), "a.png");
    assert_eq!(first_clear.file_name().unwrap(), "y.png");
}

#[test]
fn test_hidden_files_and_subdirectories_are_skipped() {
    let dir = TempDir::new().unwrap();
    let (reflected, _) = paired_dirs(dir.path(), 2, 0, 4);
    fs::write(reflected.join(".DS_Store"), b"junk").unwrap();
    fs::create_dir_all(reflected.join("nested")).unwrap();

    assert_eq!(list_images(&reflected).unwrap().len(), 2);
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let (reflected, _) = paired_dirs(dir.path(), 1, 0, 4);
    match open(&reflected, &dir.path().join("absent"), 4) {
        Err(ReflectionError::FileNotFound(_)) => {}
        other => panic!("Expected FileNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_undecodable_image_reports_path() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 1, 1, 4);
    let broken = reflected.join("000.png");
    fs::write(&broken, b"not a png").unwrap();

    let dataset = open(&reflected, &clear, 4).unwrap();
    match dataset.get(0) {
        Err(ReflectionError::Decode { path, .. }) => assert_eq!(path, broken),
        other => panic!("Expected Decode error, got {:?}", other.map(|_| ())),
    }
}
