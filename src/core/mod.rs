//! Core data types: addresses, segments, and the memory image.

pub mod address;
pub mod image;
pub mod segment;

pub use address::{Address, AddressRange};
pub use image::MemoryImage;
pub use segment::{Perms, Segment};
