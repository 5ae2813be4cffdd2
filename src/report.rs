//! Scan results: a serializable report plus the classic two-column text
//! rendering (`{name:<48.44}{status:>16}` with address suffixes).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotate::AnnotationOutcome;
use crate::core::address::AddressRange;
use crate::error::Result;
use crate::refset::ReferenceSet;
use crate::scan::MatchRecord;

/// One annotated occurrence in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    pub instance: usize,
    pub range: AddressRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark_note: Option<String>,
    pub cleared_units: usize,
    pub deleted_labels: Vec<String>,
    pub data_defined: bool,
}

/// Everything found for one reference file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternReport {
    pub name: String,
    pub path: String,
    pub sha256: String,
    pub size: usize,
    pub matches: Vec<MatchEntry>,
}

/// The whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub image: String,
    pub generated_at: DateTime<Utc>,
    pub total_matches: usize,
    pub patterns: Vec<PatternReport>,
}

impl ScanReport {
    /// Assemble the report. `outcomes` parallels `records` (one per match,
    /// in scan order).
    pub fn build(
        image: &str,
        refs: &ReferenceSet,
        records: &[MatchRecord],
        outcomes: &[AnnotationOutcome],
    ) -> Self {
        let mut patterns: Vec<PatternReport> = refs
            .patterns()
            .iter()
            .map(|p| PatternReport {
                name: p.name.clone(),
                path: p.path.display().to_string(),
                sha256: p.sha256.clone(),
                size: p.len(),
                matches: Vec::new(),
            })
            .collect();

        for (record, outcome) in records.iter().zip(outcomes) {
            patterns[record.pattern].matches.push(MatchEntry {
                instance: record.instance,
                range: record.range,
                label: outcome.label.clone(),
                bookmark_note: outcome.bookmark_note.clone(),
                cleared_units: outcome.cleared_units,
                deleted_labels: outcome.deleted_labels.clone(),
                data_defined: outcome.data_defined,
            });
        }

        ScanReport {
            image: image.to_string(),
            generated_at: Utc::now(),
            total_matches: records.len(),
            patterns,
        }
    }

    /// Two-column progress text, one block per reference file.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for pattern in &self.patterns {
            out.push_str(&two_col(&pattern.name, "Searching"));
            out.push('\n');
            for entry in &pattern.matches {
                out.push_str(&two_col(
                    &pattern.name,
                    &format!("Found #{}", entry.instance),
                ));
                out.push_str(&format!("\t@ {}", entry.range));
                out.push('\n');
                if entry.cleared_units > 0 {
                    out.push_str(&two_col(&pattern.name, "Clearing Code"));
                    out.push_str(&format!("\t@ {}", entry.range));
                    out.push('\n');
                }
                for deleted in &entry.deleted_labels {
                    out.push_str(&two_col(&pattern.name, "Deleting Label"));
                    out.push_str(&format!("\t\"{}\"", deleted));
                    out.push('\n');
                }
                if let Some(label) = &entry.label {
                    out.push_str(&two_col(&pattern.name, "Added Label"));
                    out.push_str(&format!("\t\"{}\"", label));
                    out.push('\n');
                }
            }
        }
        out.push_str(&format!("Total matches: {}\n", self.total_matches));
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn two_col(name: &str, status: &str) -> String {
    format!("{:<48.44}{:>16}", name, status)
}
