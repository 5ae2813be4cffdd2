//! In-memory program database: the listing, symbol table, and bookmarks.
//!
//! Stands in for the host application's program database. Annotations the
//! scan produces land here; pre-existing code units model a listing that was
//! already disassembled over the matched bytes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::address::{Address, AddressRange};
use crate::error::{FilehuntError, Result};

/// Where a symbol came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    UserDefined,
    Analysis,
    Imported,
}

/// A named symbol at an address. Many labels may share an address; at most
/// one of them is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub addr: Address,
    pub name: String,
    pub primary: bool,
    pub source: SourceType,
}

/// An annotation marking an address of interest, distinct from a label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub addr: Address,
    pub category: String,
    pub note: String,
}

/// What a defined data unit holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    /// `byte[len]`, the shape this tool defines over matches
    ByteArray { len: u64 },
}

/// A defined data unit in the listing. Units may not overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUnit {
    pub range: AddressRange,
    pub kind: DataKind,
}

/// A code unit in the listing (an instruction range from prior analysis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeUnit {
    pub range: AddressRange,
}

/// The mutable program database annotations are applied to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramDb {
    labels: Vec<Label>,
    bookmarks: Vec<Bookmark>,
    data_units: Vec<DataUnit>,
    code_units: Vec<CodeUnit>,
}

impl ProgramDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn data_units(&self) -> &[DataUnit] {
        &self.data_units
    }

    pub fn code_units(&self) -> &[CodeUnit] {
        &self.code_units
    }

    /// Record a pre-existing code unit (prior disassembly over the bytes).
    pub fn add_code_unit(&mut self, range: AddressRange) {
        self.code_units.push(CodeUnit { range });
    }

    /// Whether any code or data unit overlaps `range`.
    pub fn has_units_in(&self, range: &AddressRange) -> bool {
        self.code_units.iter().any(|u| u.range.overlaps(range))
            || self.data_units.iter().any(|u| u.range.overlaps(range))
    }

    /// Remove every code and data unit overlapping `range`. Returns the
    /// number of units removed.
    pub fn clear_range(&mut self, range: &AddressRange) -> usize {
        let before = self.code_units.len() + self.data_units.len();
        self.code_units.retain(|u| !u.range.overlaps(range));
        self.data_units.retain(|u| !u.range.overlaps(range));
        let removed = before - (self.code_units.len() + self.data_units.len());
        if removed > 0 {
            debug!(range = %range, removed, "cleared listing units");
        }
        removed
    }

    pub fn labels_at(&self, addr: Address) -> Vec<&Label> {
        self.labels.iter().filter(|l| l.addr == addr).collect()
    }

    /// Delete all labels at `addr`, returning their names.
    pub fn delete_labels_at(&mut self, addr: Address) -> Vec<String> {
        let mut deleted = Vec::new();
        self.labels.retain(|l| {
            if l.addr == addr {
                deleted.push(l.name.clone());
                false
            } else {
                true
            }
        });
        deleted
    }

    /// Create a label. A new primary label demotes any existing primary at
    /// the same address. Duplicate names at one address are rejected.
    pub fn create_label(
        &mut self,
        addr: Address,
        name: &str,
        primary: bool,
        source: SourceType,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(FilehuntError::AnnotationError(
                "label name is empty".to_string(),
            ));
        }
        if self.labels.iter().any(|l| l.addr == addr && l.name == name) {
            return Err(FilehuntError::AnnotationError(format!(
                "label {} already exists at {}",
                name, addr
            )));
        }
        if primary {
            for l in self.labels.iter_mut().filter(|l| l.addr == addr) {
                l.primary = false;
            }
        }
        self.labels.push(Label {
            addr,
            name: name.to_string(),
            primary,
            source,
        });
        Ok(())
    }

    pub fn create_bookmark(&mut self, addr: Address, category: &str, note: &str) {
        self.bookmarks.push(Bookmark {
            addr,
            category: category.to_string(),
            note: note.to_string(),
        });
    }

    /// Define a data unit. Conflicting with any existing unit is an error;
    /// callers decide whether to clear first.
    pub fn define_data(&mut self, range: AddressRange, kind: DataKind) -> Result<()> {
        if self.has_units_in(&range) {
            return Err(FilehuntError::AnnotationError(format!(
                "conflicting unit in range {}",
                range
            )));
        }
        self.data_units.push(DataUnit { range, kind });
        Ok(())
    }
}
