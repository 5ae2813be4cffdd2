//! Address and range types.
//!
//! The memory image is already mapped, so a single virtual-address kind is
//! enough: an `Address` is a `u64` VA, and an `AddressRange` is a half-open
//! `[start, start + size)` region with checked arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FilehuntError, Result};

/// A virtual address in the target memory image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    pub fn new(value: u64) -> Self {
        Address(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Add an offset, failing on wraparound instead of silently wrapping.
    pub fn checked_add(&self, offset: u64) -> Result<Address> {
        self.0
            .checked_add(offset)
            .map(Address)
            .ok_or_else(|| {
                FilehuntError::AddressError(format!(
                    "address {:#x} + {:#x} overflows",
                    self.0, offset
                ))
            })
    }

    /// Distance to a higher address.
    pub fn offset_to(&self, other: &Address) -> Result<u64> {
        other.0.checked_sub(self.0).ok_or_else(|| {
            FilehuntError::AddressError(format!(
                "address {:#x} is below {:#x}",
                other.0, self.0
            ))
        })
    }

    /// Zero-padded lowercase hex, the way the listing prints addresses.
    pub fn to_padded_hex(&self, width: usize) -> String {
        format!("{:0width$x}", self.0, width = width)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address(value)
    }
}

/// A half-open contiguous region `[start, start + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    /// Starting address (inclusive)
    pub start: Address,
    /// Size in bytes
    pub size: u64,
}

impl AddressRange {
    /// Create a range, rejecting sizes that would wrap past the top of the
    /// address space.
    pub fn new(start: Address, size: u64) -> Result<Self> {
        start.checked_add(size)?;
        Ok(AddressRange { start, size })
    }

    /// End address (exclusive).
    pub fn end(&self) -> Address {
        // Cannot wrap: construction checked start + size.
        Address(self.start.0 + self.size)
    }

    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end()
    }

    pub fn contains_range(&self, other: &AddressRange) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    pub fn overlaps(&self, other: &AddressRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end() && other.start < self.end()
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end())
    }
}
