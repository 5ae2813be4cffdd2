//! Applying match annotations to the program database.
//!
//! For each match, in order: clear conflicting listing units, delete stale
//! labels, create the label, the bookmark, and the byte-array data unit.
//! Each step is individually switchable and template-driven.

pub mod db;
pub mod template;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::annotate::db::{DataKind, ProgramDb, SourceType};
use crate::annotate::template::{format_template, sanitize_label};
use crate::error::Result;
use crate::scan::MatchRecord;

/// Per-match annotation behavior. Defaults mirror the tool's classic option
/// block: everything on, `FindFileContents` bookmarks, `file_*` labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Clear code/data units overlapping a match before annotating
    pub clear_range: bool,
    /// Delete labels already present at the match address
    pub clear_preexisting_labels: bool,
    /// Create a label at the match address
    pub create_label: bool,
    /// Make the created label the primary symbol at its address
    pub make_label_primary: bool,
    /// Label template; {0}=address, {1}=file name, {2}=instance count
    pub label_format: String,
    /// Create a bookmark at the match address
    pub create_bookmark: bool,
    /// Bookmark category
    pub bookmark_category: String,
    /// Bookmark note template; {0}=address, {1}=file name, {2}=instance count
    pub bookmark_note_format: String,
    /// Define a byte-array data unit over the match
    pub create_data: bool,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            clear_range: true,
            clear_preexisting_labels: true,
            create_label: true,
            make_label_primary: true,
            label_format: "file_{1}{2}_{0}".to_string(),
            create_bookmark: true,
            bookmark_category: "FindFileContents".to_string(),
            bookmark_note_format: "{1} #{2}".to_string(),
            create_data: true,
        }
    }
}

/// What one match produced, for the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationOutcome {
    pub cleared_units: usize,
    pub deleted_labels: Vec<String>,
    pub label: Option<String>,
    pub bookmark_note: Option<String>,
    pub data_defined: bool,
}

/// Applies the configured annotations to a program database.
pub struct Annotator {
    config: AnnotateConfig,
    /// Hex digits for {0}, from the image's address width
    addr_width: usize,
}

impl Annotator {
    pub fn new(config: AnnotateConfig, addr_width: usize) -> Self {
        Annotator { config, addr_width }
    }

    pub fn config(&self) -> &AnnotateConfig {
        &self.config
    }

    /// Annotate a single match.
    pub fn apply(&self, db: &mut ProgramDb, record: &MatchRecord) -> Result<AnnotationOutcome> {
        let mut outcome = AnnotationOutcome::default();
        let addr = record.addr();
        let addr_text = addr.to_padded_hex(self.addr_width);

        if self.config.clear_range {
            let had_units = db.has_units_in(&record.range);
            outcome.cleared_units = db.clear_range(&record.range);
            if had_units {
                info!(
                    file = %record.name,
                    range = %record.range,
                    cleared = outcome.cleared_units,
                    "cleared listing over match"
                );
            }
        }

        if self.config.clear_preexisting_labels {
            outcome.deleted_labels = db.delete_labels_at(addr);
            for name in &outcome.deleted_labels {
                info!(file = %record.name, label = %name, "deleted pre-existing label");
            }
        }

        if self.config.create_label {
            let name = sanitize_label(&format_template(
                &self.config.label_format,
                &addr_text,
                &record.name,
                record.instance,
            ));
            db.create_label(addr, &name, self.config.make_label_primary, SourceType::UserDefined)?;
            info!(file = %record.name, label = %name, "added label");
            outcome.label = Some(name);
        }

        if self.config.create_bookmark {
            let note = format_template(
                &self.config.bookmark_note_format,
                &addr_text,
                &record.name,
                record.instance,
            );
            db.create_bookmark(addr, &self.config.bookmark_category, &note);
            outcome.bookmark_note = Some(note);
        }

        if self.config.create_data {
            match db.define_data(record.range, DataKind::ByteArray {
                len: record.range.size,
            }) {
                Ok(()) => outcome.data_defined = true,
                // A conflict here is survivable; the host tool logs the
                // failed createData and moves on.
                Err(e) => warn!(file = %record.name, addr = %addr, error = %e, "could not define data"),
            }
        }

        Ok(outcome)
    }

    /// Annotate every match, in scan order.
    pub fn apply_all(
        &self,
        db: &mut ProgramDb,
        records: &[MatchRecord],
    ) -> Result<Vec<AnnotationOutcome>> {
        records.iter().map(|r| self.apply(db, r)).collect()
    }
}
