//! Segment type for loaded memory regions.
//!
//! A segment is a contiguous mapping unit of the target image: a VA range,
//! permissions, and the bytes the loader placed there. The initialized bytes
//! may be shorter than the range (BSS-style zero-filled tails).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::address::{Address, AddressRange};
use crate::error::{FilehuntError, Result};

/// Permission flags for memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Perms {
    /// Raw permission bits: read=1, write=2, execute=4
    pub bits: u8,
}

impl Perms {
    pub const R: Perms = Perms { bits: 1 };
    pub const RW: Perms = Perms { bits: 3 };
    pub const RX: Perms = Perms { bits: 5 };

    pub fn new(read: bool, write: bool, execute: bool) -> Self {
        let mut bits = 0u8;
        if read {
            bits |= 1;
        }
        if write {
            bits |= 2;
        }
        if execute {
            bits |= 4;
        }
        Self { bits }
    }

    pub fn has_read(&self) -> bool {
        (self.bits & 1) != 0
    }

    pub fn has_write(&self) -> bool {
        (self.bits & 2) != 0
    }

    pub fn has_execute(&self) -> bool {
        (self.bits & 4) != 0
    }

    /// Readable and executable but not writable (code segment).
    pub fn is_code(&self) -> bool {
        self.has_read() && self.has_execute() && !self.has_write()
    }

    /// Readable and writable but not executable (data segment).
    pub fn is_data(&self) -> bool {
        self.has_read() && self.has_write() && !self.has_execute()
    }
}

impl fmt::Display for Perms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut perms = String::new();
        perms.push(if self.has_read() { 'r' } else { '-' });
        perms.push(if self.has_write() { 'w' } else { '-' });
        perms.push(if self.has_execute() { 'x' } else { '-' });
        write!(f, "{}", perms)
    }
}

/// A loaded memory mapping unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique identifier for the segment
    pub id: String,
    /// Optional human-readable name (section/segment name from the loader)
    pub name: Option<String>,
    /// Virtual address range the segment occupies
    pub range: AddressRange,
    /// Memory permissions
    pub perms: Perms,
    /// Initialized bytes; the tail up to `range.size` reads as zeroes
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Segment {
    /// Create a segment. The initialized bytes may not exceed the range size.
    pub fn new(
        id: String,
        name: Option<String>,
        range: AddressRange,
        perms: Perms,
        bytes: Vec<u8>,
    ) -> Result<Self> {
        if bytes.len() as u64 > range.size {
            return Err(FilehuntError::AddressError(format!(
                "segment {}: {} initialized bytes exceed range size {}",
                id,
                bytes.len(),
                range.size
            )));
        }
        Ok(Segment {
            id,
            name,
            range,
            perms,
            bytes,
        })
    }

    pub fn start(&self) -> Address {
        self.range.start
    }

    pub fn end(&self) -> Address {
        self.range.end()
    }

    pub fn size(&self) -> u64 {
        self.range.size
    }

    /// Length of the initialized (searchable) prefix.
    pub fn initialized_len(&self) -> usize {
        self.bytes.len()
    }

    /// The initialized bytes, the domain of the scanner.
    pub fn initialized_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn contains(&self, addr: Address) -> bool {
        self.range.contains(addr)
    }

    /// Read `len` bytes at `addr`; the uninitialized tail reads as zeroes.
    pub fn read(&self, addr: Address, len: usize) -> Result<Vec<u8>> {
        let offset = self.range.start.offset_to(&addr)? as usize;
        let end = offset
            .checked_add(len)
            .ok_or_else(|| FilehuntError::AddressError("read length overflows".to_string()))?;
        if end as u64 > self.range.size {
            return Err(FilehuntError::MemoryAccess {
                addr: addr.value(),
                message: format!("read of {} bytes runs past segment {}", len, self.id),
            });
        }
        let mut out = vec![0u8; len];
        if offset < self.bytes.len() {
            let avail = (self.bytes.len() - offset).min(len);
            out[..avail].copy_from_slice(&self.bytes[offset..offset + avail]);
        }
        Ok(out)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} ({} bytes)",
            self.id,
            self.perms,
            self.range,
            self.range.size
        )
    }
}
