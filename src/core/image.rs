//! The target memory image: an ordered collection of loaded segments.

use memchr::memmem;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::address::{Address, AddressRange};
use crate::core::segment::Segment;
use crate::error::{FilehuntError, Result};

/// A program's loaded address space, reconstructed from a binary on disk.
///
/// Segments are kept sorted by start address and may not overlap. Matches
/// never span two segments: segments are discontiguous mapping units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryImage {
    /// Name of the image (file name of the binary it was loaded from)
    pub name: String,
    segments: Vec<Segment>,
}

impl MemoryImage {
    pub fn new(name: String) -> Self {
        MemoryImage {
            name,
            segments: Vec::new(),
        }
    }

    /// Add a segment, keeping the collection sorted. Overlapping an existing
    /// segment is an error.
    pub fn add_segment(&mut self, segment: Segment) -> Result<()> {
        if segment.range.is_empty() {
            return Err(FilehuntError::AddressError(format!(
                "segment {} is empty",
                segment.id
            )));
        }
        for existing in &self.segments {
            if existing.range.overlaps(&segment.range) {
                return Err(FilehuntError::AddressError(format!(
                    "segment {} at {} overlaps segment {} at {}",
                    segment.id, segment.range, existing.id, existing.range
                )));
            }
        }
        debug!(segment = %segment, "mapped segment");
        let pos = self
            .segments
            .partition_point(|s| s.range.start < segment.range.start);
        self.segments.insert(pos, segment);
        Ok(())
    }

    /// Segments in ascending VA order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lowest mapped address, if anything is mapped.
    pub fn min_address(&self) -> Option<Address> {
        self.segments.first().map(|s| s.start())
    }

    /// Highest mapped address (exclusive end of the last segment).
    pub fn max_address(&self) -> Option<Address> {
        self.segments.last().map(|s| s.end())
    }

    /// Hex digits needed to print any address in this image.
    pub fn address_width(&self) -> usize {
        // max_address is exclusive; the highest printable address is one
        // below it. Segments are non-empty, so the end is at least 1.
        match self.max_address() {
            Some(end) if end.value() - 1 > u64::from(u32::MAX) => 16,
            _ => 8,
        }
    }

    /// The segment containing `addr`, if any.
    pub fn segment_containing(&self, addr: Address) -> Option<&Segment> {
        let idx = self.segments.partition_point(|s| s.end() <= addr);
        self.segments
            .get(idx)
            .filter(|s| s.contains(addr))
    }

    /// Read `len` bytes at `addr`. Fails if any byte of the span is unmapped.
    pub fn read(&self, addr: Address, len: usize) -> Result<Vec<u8>> {
        let segment = self
            .segment_containing(addr)
            .ok_or_else(|| FilehuntError::MemoryAccess {
                addr: addr.value(),
                message: "address is not mapped".to_string(),
            })?;
        segment.read(addr, len)
    }

    /// First occurrence of `needle` at or after `min_addr`, searching the
    /// initialized bytes of each segment.
    pub fn find_bytes(&self, needle: &[u8], min_addr: Option<Address>) -> Option<Address> {
        if needle.is_empty() {
            return None;
        }
        let finder = memmem::Finder::new(needle);
        let floor = min_addr.unwrap_or(Address(0));
        for segment in &self.segments {
            if segment.end() <= floor {
                continue;
            }
            let haystack = segment.initialized_bytes();
            let skip = if segment.start() < floor {
                (floor.value() - segment.start().value()) as usize
            } else {
                0
            };
            if skip >= haystack.len() {
                continue;
            }
            if let Some(pos) = finder.find(&haystack[skip..]) {
                return Some(Address(segment.start().value() + (skip + pos) as u64));
            }
        }
        None
    }

    /// The range of a whole match of `len` bytes at `addr`, validated to lie
    /// inside one segment.
    pub fn range_at(&self, addr: Address, len: u64) -> Result<AddressRange> {
        let range = AddressRange::new(addr, len)?;
        match self.segment_containing(addr) {
            Some(s) if s.range.contains_range(&range) => Ok(range),
            _ => Err(FilehuntError::MemoryAccess {
                addr: addr.value(),
                message: format!("range of {} bytes is not fully mapped", len),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segment::Perms;

    fn image_with(segments: &[(u64, &[u8])]) -> MemoryImage {
        let mut image = MemoryImage::new("test".to_string());
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

    #[test]
    fn test_overlapping_segments_rejected() {
        let mut image = image_with(&[(0x1000, b"aaaa")]);
        let overlap = Segment::new(
            "x".to_string(),
            None,
            AddressRange::new(Address(0x1002), 4).unwrap(),
            Perms::R,
            vec![0; 4],
        )
        .unwrap();
        assert!(image.add_segment(overlap).is_err());
    }

    #[test]
    fn test_segments_sorted() {
        let image = image_with(&[(0x2000, b"bb"), (0x1000, b"aa")]);
        let starts: Vec<u64> = image.segments().iter().map(|s| s.start().value()).collect();
        assert_eq!(starts, vec![0x1000, 0x2000]);
    }

    #[test]
    fn test_segment_containing() {
        let image = image_with(&[(0x1000, b"aaaa"), (0x2000, b"bbbb")]);
        assert_eq!(image.segment_containing(Address(0x2001)).unwrap().id, "seg1");
        assert!(image.segment_containing(Address(0x1004)).is_none());
    }

    #[test]
    fn test_read_unmapped_fails() {
        let image = image_with(&[(0x1000, b"aaaa")]);
        assert!(image.read(Address(0x3000), 1).is_err());
        assert!(image.read(Address(0x1002), 8).is_err());
    }

    #[test]
    fn test_find_bytes_across_segments() {
        let image = image_with(&[(0x1000, b"xxneedle"), (0x2000, b"needle")]);
        assert_eq!(image.find_bytes(b"needle", None), Some(Address(0x1002)));
        assert_eq!(
            image.find_bytes(b"needle", Some(Address(0x1003))),
            Some(Address(0x2000))
        );
        assert_eq!(image.find_bytes(b"absent", None), None);
        assert_eq!(image.find_bytes(b"", None), None);
    }

    #[test]
    fn test_address_width() {
        let small = image_with(&[(0x1000, b"aa")]);
        assert_eq!(small.address_width(), 8);
        let large = image_with(&[(0x7fff_1234_0000, b"aa")]);
        assert_eq!(large.address_width(), 16);
    }

    #[test]
    fn test_address_width_at_four_gib_boundary() {
        // Last byte exactly 0xffffffff still fits in 8 digits.
        let edge = image_with(&[(0xffff_fffe, b"ab")]);
        assert_eq!(edge.max_address(), Some(Address(0x1_0000_0000)));
        assert_eq!(edge.address_width(), 8);
        // One byte higher and 16 digits are needed.
        let over = image_with(&[(0xffff_ffff, b"ab")]);
        assert_eq!(over.address_width(), 16);
    }

    #[test]
    fn test_range_at() {
        let image = image_with(&[(0x1000, b"abcdef")]);
        assert!(image.range_at(Address(0x1002), 4).is_ok());
        assert!(image.range_at(Address(0x1004), 4).is_err());
    }
}
