//! Annotation behavior against a pre-populated program database.

mod common;

use common::{image_with, ref_fixture};
use filehunt::annotate::db::{ProgramDb, SourceType};
use filehunt::annotate::{AnnotateConfig, Annotator};
use filehunt::core::address::{Address, AddressRange};
use filehunt::scan::{ScanLimits, Scanner};

fn range(start: u64, size: u64) -> AddressRange {
    AddressRange::new(Address(start), size).unwrap()
}

#[test]
fn clears_prior_disassembly_over_matches() {
    let image = image_with(&[(0x1000, b"..CODE..")]);
    let (_dir, refs) = ref_fixture(&[("c.bin", b"CODE")]);

    let mut db = ProgramDb::new();
    // Prior analysis disassembled instructions over the matched bytes.
    db.add_code_unit(range(0x1002, 2));
    db.add_code_unit(range(0x1004, 2));
    db.add_code_unit(range(0x1008, 2)); // outside the match range 0x1002..0x1006

    let scanner = Scanner::new(&refs, ScanLimits::default()).unwrap();
    let records = scanner.scan(&image).unwrap();
    assert_eq!(records.len(), 1);

    let annotator = Annotator::new(AnnotateConfig::default(), image.address_width());
    let outcomes = annotator.apply_all(&mut db, &records).unwrap();

    assert_eq!(outcomes[0].cleared_units, 2);
    assert_eq!(db.code_units().len(), 1);
    assert_eq!(db.code_units()[0].range.start, Address(0x1008));
    assert!(outcomes[0].data_defined);
}

#[test]
fn stale_labels_replaced_by_match_label() {
    let image = image_with(&[(0x1000, b"HIT.....")]);
    let (_dir, refs) = ref_fixture(&[("h.bin", b"HIT")]);

    let mut db = ProgramDb::new();
    db.create_label(Address(0x1000), "DAT_00001000", true, SourceType::Analysis)
        .unwrap();
    db.create_label(Address(0x1000), "old_name", false, SourceType::Imported)
        .unwrap();

    let scanner = Scanner::new(&refs, ScanLimits::default()).unwrap();
    let records = scanner.scan(&image).unwrap();
    let annotator = Annotator::new(AnnotateConfig::default(), image.address_width());
    let outcomes = annotator.apply_all(&mut db, &records).unwrap();

    assert_eq!(
        outcomes[0].deleted_labels,
        vec!["DAT_00001000".to_string(), "old_name".to_string()]
    );
    let labels = db.labels_at(Address(0x1000));
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "file_h.bin0_00001000");
    assert!(labels[0].primary);
    assert_eq!(labels[0].source, SourceType::UserDefined);
}

#[test]
fn custom_templates_apply() {
    let image = image_with(&[(0x2000, b"xPATx")]);
    let (_dir, refs) = ref_fixture(&[("p.bin", b"PAT")]);

    let config = AnnotateConfig {
        label_format: "match_{1}_{2}".to_string(),
        bookmark_note_format: "found {1} at {0}".to_string(),
        bookmark_category: "MyCategory".to_string(),
        ..AnnotateConfig::default()
    };

    let scanner = Scanner::new(&refs, ScanLimits::default()).unwrap();
    let records = scanner.scan(&image).unwrap();
    let mut db = ProgramDb::new();
    let annotator = Annotator::new(config, image.address_width());
    annotator.apply_all(&mut db, &records).unwrap();

    assert_eq!(db.labels()[0].name, "match_p.bin_0");
    assert_eq!(db.bookmarks()[0].note, "found p.bin at 00002001");
    assert_eq!(db.bookmarks()[0].category, "MyCategory");
}

#[test]
fn no_clear_leaves_listing_and_skips_conflicting_data() {
    let image = image_with(&[(0x1000, b"..DATA..")]);
    let (_dir, refs) = ref_fixture(&[("d.bin", b"DATA")]);

    let config = AnnotateConfig {
        clear_range: false,
        ..AnnotateConfig::default()
    };

    let mut db = ProgramDb::new();
    db.add_code_unit(range(0x1003, 2));

    let scanner = Scanner::new(&refs, ScanLimits::default()).unwrap();
    let records = scanner.scan(&image).unwrap();
    let annotator = Annotator::new(config, image.address_width());
    let outcomes = annotator.apply_all(&mut db, &records).unwrap();

    // Code unit untouched, data definition refused, label still created.
    assert_eq!(db.code_units().len(), 1);
    assert!(!outcomes[0].data_defined);
    assert!(db.data_units().is_empty());
    assert_eq!(db.labels().len(), 1);
}
