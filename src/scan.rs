//! Multi-pattern search over the memory image.
//!
//! All reference files are compiled into one Aho-Corasick automaton and every
//! segment's initialized bytes are scanned in a single pass. Overlapping
//! occurrences are reported, so two copies of a file that share bytes, or a
//! self-overlapping file, each produce their own match.

use aho_corasick::AhoCorasick;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::address::{Address, AddressRange};
use crate::core::image::MemoryImage;
use crate::error::{FilehuntError, Result};
use crate::refset::ReferenceSet;

/// One occurrence of a reference file in the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Index of the pattern in the reference set
    pub pattern: usize,
    /// File name of the pattern
    pub name: String,
    /// Address range the file contents occupy
    pub range: AddressRange,
    /// 0-based ordinal of this occurrence among the pattern's matches,
    /// in ascending address order
    pub instance: usize,
}

impl MatchRecord {
    pub fn addr(&self) -> Address {
        self.range.start
    }
}

/// Caps on result volume, so a degenerate pattern cannot blow up the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanLimits {
    pub max_matches_per_pattern: usize,
    pub max_matches_total: usize,
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_matches_per_pattern: 10_000,
            max_matches_total: 100_000,
        }
    }
}

/// Compiled search over one reference set.
pub struct Scanner {
    automaton: AhoCorasick,
    names: Vec<String>,
    limits: ScanLimits,
}

impl Scanner {
    pub fn new(refs: &ReferenceSet, limits: ScanLimits) -> Result<Self> {
        let automaton = AhoCorasick::new(refs.byte_sequences())
            .map_err(|e| FilehuntError::PatternError(e.to_string()))?;
        let names = refs.patterns().iter().map(|p| p.name.clone()).collect();
        Ok(Scanner {
            automaton,
            names,
            limits,
        })
    }

    /// Scan every segment, returning matches grouped by pattern and ordered
    /// by ascending address within each pattern.
    pub fn scan(&self, image: &MemoryImage) -> Result<Vec<MatchRecord>> {
        let mut per_pattern: Vec<Vec<AddressRange>> = vec![Vec::new(); self.names.len()];
        let mut limit_reported = vec![false; self.names.len()];
        let mut total = 0usize;

        'segments: for segment in image.segments() {
            let haystack = segment.initialized_bytes();
            if haystack.is_empty() {
                continue;
            }
            debug!(segment = %segment.id, bytes = haystack.len(), "scanning segment");

            for m in self.automaton.find_overlapping_iter(haystack) {
                let idx = m.pattern().as_usize();
                let hits = &mut per_pattern[idx];
                if hits.len() >= self.limits.max_matches_per_pattern {
                    if !limit_reported[idx] {
                        limit_reported[idx] = true;
                        warn!(
                            pattern = %self.names[idx],
                            limit = self.limits.max_matches_per_pattern,
                            "per-pattern match limit reached, dropping further hits"
                        );
                    }
                    continue;
                }
                let start = segment.start().checked_add(m.start() as u64)?;
                hits.push(AddressRange::new(start, (m.end() - m.start()) as u64)?);
                total += 1;
                if total >= self.limits.max_matches_total {
                    warn!(
                        limit = self.limits.max_matches_total,
                        "total match limit reached, stopping scan"
                    );
                    break 'segments;
                }
            }
        }

        let mut records = Vec::with_capacity(total);
        for (idx, mut hits) in per_pattern.into_iter().enumerate() {
            hits.sort_by_key(|r| r.start);
            for (instance, range) in hits.into_iter().enumerate() {
                records.push(MatchRecord {
                    pattern: idx,
                    name: self.names[idx].clone(),
                    range,
                    instance,
                });
            }
        }

        info!(matches = records.len(), "scan complete");
        Ok(records)
    }
}
