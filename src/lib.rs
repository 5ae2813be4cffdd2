//! filehunt: search a program's loaded memory image for the contents of
//! reference files, then label and bookmark every match.
//!
//! The pipeline: load a binary into a [`core::MemoryImage`], collect
//! reference files into a [`refset::ReferenceSet`], scan with
//! [`scan::Scanner`], apply [`annotate::Annotator`] to an in-memory
//! [`annotate::db::ProgramDb`], and summarize with [`report::ScanReport`].

pub mod annotate;
pub mod core;
pub mod error;
pub mod loader;
pub mod logging;
pub mod refset;
pub mod report;
pub mod scan;

pub use error::{FilehuntError, Result};

use crate::annotate::db::ProgramDb;
use crate::annotate::{AnnotateConfig, Annotator};
use crate::core::MemoryImage;
use crate::refset::ReferenceSet;
use crate::report::ScanReport;
use crate::scan::{ScanLimits, Scanner};

/// Run the whole pipeline against an already-loaded image.
///
/// Returns the annotated program database and the report.
pub fn hunt(
    image: &MemoryImage,
    refs: &ReferenceSet,
    limits: ScanLimits,
    config: AnnotateConfig,
) -> Result<(ProgramDb, ScanReport)> {
    let scanner = Scanner::new(refs, limits)?;
    let records = scanner.scan(image)?;

    let mut db = ProgramDb::new();
    let annotator = Annotator::new(config, image.address_width());
    let outcomes = annotator.apply_all(&mut db, &records)?;

    let report = ScanReport::build(&image.name, refs, &records, &outcomes);
    Ok((db, report))
}
