//! Shared fixtures for integration tests.

use filehunt::core::address::{Address, AddressRange};
use filehunt::core::image::MemoryImage;
use filehunt::core::segment::{Perms, Segment};
use filehunt::refset::ReferenceSet;
use std::path::PathBuf;
use tempfile::TempDir;

/// Build an image from `(start, bytes)` pairs.
pub fn image_with(segments: &[(u64, &[u8])]) -> MemoryImage {
    let mut image = MemoryImage::new("fixture.bin".to_string());
    for (i, (start, bytes)) in segments.iter().enumerate() {
        image
            .add_segment(
                Segment::new(
                    format!("seg{}", i),
                    None,
                    AddressRange::new(Address(*start), bytes.len() as u64).unwrap(),
                    Perms::R,
                    bytes.to_vec(),
                )
                .unwrap(),
            )
            .unwrap();
    }
    image
}

/// Write reference files into a temp dir and collect them.
pub fn ref_fixture(files: &[(&str, &[u8])]) -> (TempDir, ReferenceSet) {
    let dir = tempfile::tempdir().unwrap();
    let mut paths: Vec<PathBuf> = Vec::new();
    for (name, bytes) in files {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        paths.push(path);
    }
    let refs = ReferenceSet::collect(&paths).unwrap();
    (dir, refs)
}
