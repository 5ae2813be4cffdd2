//! Loaders that reconstruct a [`MemoryImage`] from a binary on disk.
//!
//! `load_object` maps the loadable segments of an ELF/PE/Mach-O executable at
//! their virtual addresses; `load_raw` maps an opaque blob at a caller-chosen
//! base address.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use object::{Object, ObjectSection, ObjectSegment, SectionKind, SegmentFlags};
use tracing::{info, warn};

use crate::core::address::{Address, AddressRange};
use crate::core::image::MemoryImage;
use crate::core::segment::{Perms, Segment};
use crate::error::{FilehuntError, Result};

const ELF_PF_X: u32 = 1;
const ELF_PF_W: u32 = 2;
const ELF_PF_R: u32 = 4;

const MACHO_PROT_R: u32 = 1;
const MACHO_PROT_W: u32 = 2;
const MACHO_PROT_X: u32 = 4;

const COFF_SCN_MEM_EXECUTE: u32 = 0x2000_0000;
const COFF_SCN_MEM_READ: u32 = 0x4000_0000;
const COFF_SCN_MEM_WRITE: u32 = 0x8000_0000;

fn perms_from_flags(flags: SegmentFlags) -> Perms {
    match flags {
        SegmentFlags::Elf { p_flags } => Perms::new(
            p_flags & ELF_PF_R != 0,
            p_flags & ELF_PF_W != 0,
            p_flags & ELF_PF_X != 0,
        ),
        SegmentFlags::MachO { initprot, .. } => Perms::new(
            initprot & MACHO_PROT_R != 0,
            initprot & MACHO_PROT_W != 0,
            initprot & MACHO_PROT_X != 0,
        ),
        SegmentFlags::Coff { characteristics } => Perms::new(
            characteristics & COFF_SCN_MEM_READ != 0,
            characteristics & COFF_SCN_MEM_WRITE != 0,
            characteristics & COFF_SCN_MEM_EXECUTE != 0,
        ),
        _ => Perms::R,
    }
}

fn perms_from_section_kind(kind: SectionKind) -> Perms {
    match kind {
        SectionKind::Text => Perms::RX,
        SectionKind::Data | SectionKind::UninitializedData => Perms::RW,
        _ => Perms::R,
    }
}

fn image_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Err(FilehuntError::InvalidFormat(format!(
            "{} is empty",
            path.display()
        )));
    }
    // Safety: the mapping is read-only and lives only for the load.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

/// Parse an executable and map its loadable segments at their VAs.
pub fn load_object(path: &Path) -> Result<MemoryImage> {
    let mmap = map_file(path)?;
    let parsed = object::File::parse(&*mmap)
        .map_err(|e| FilehuntError::InvalidFormat(format!("{}: {}", path.display(), e)))?;

    let mut image = MemoryImage::new(image_name(path));

    for (index, segment) in parsed.segments().enumerate() {
        let size = segment.size();
        if size == 0 {
            continue;
        }
        let bytes = segment
            .data()
            .map_err(|e| FilehuntError::InvalidFormat(format!("segment data: {}", e)))?
            .to_vec();
        let name = segment.name().ok().flatten().map(str::to_string);
        let range = AddressRange::new(Address(segment.address()), size)?;
        let seg = Segment::new(
            format!("seg{:02}", index),
            name,
            range,
            perms_from_flags(segment.flags()),
            bytes,
        )?;
        image.add_segment(seg)?;
    }

    // Object files and some PE images expose no program segments; fall back
    // to allocated sections.
    if image.is_empty() {
        for (index, section) in parsed.sections().enumerate() {
            let size = section.size();
            if size == 0 || section.address() == 0 {
                continue;
            }
            if !matches!(
                section.kind(),
                SectionKind::Text
                    | SectionKind::Data
                    | SectionKind::ReadOnlyData
                    | SectionKind::ReadOnlyString
                    | SectionKind::UninitializedData
            ) {
                continue;
            }
            let bytes = section
                .data()
                .map_err(|e| FilehuntError::InvalidFormat(format!("section data: {}", e)))?
                .to_vec();
            let name = section.name().ok().map(str::to_string);
            let range = AddressRange::new(Address(section.address()), size)?;
            let seg = Segment::new(
                format!("sec{:02}", index),
                name,
                range,
                perms_from_section_kind(section.kind()),
                bytes,
            )?;
            if let Err(e) = image.add_segment(seg) {
                // Overlapping sections happen in malformed images; keep going
                // with what mapped cleanly.
                warn!(section = index, error = %e, "skipping section");
            }
        }
    }

    if image.is_empty() {
        return Err(FilehuntError::InvalidFormat(format!(
            "{}: no loadable segments",
            path.display()
        )));
    }

    info!(
        image = %image.name,
        segments = image.segments().len(),
        "loaded image"
    );
    Ok(image)
}

/// Map an opaque blob as a single read-only segment at `base`.
pub fn load_raw(path: &Path, base: Address) -> Result<MemoryImage> {
    let mmap = map_file(path)?;
    let bytes = mmap.to_vec();

    let mut image = MemoryImage::new(image_name(path));
    let range = AddressRange::new(base, bytes.len() as u64)?;
    image.add_segment(Segment::new(
        "raw".to_string(),
        Some(image_name(path)),
        range,
        Perms::R,
        bytes,
    )?)?;

    info!(image = %image.name, base = %base, "loaded raw image");
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_perms_from_elf_flags() {
        let p = perms_from_flags(SegmentFlags::Elf {
            p_flags: ELF_PF_R | ELF_PF_X,
        });
        assert!(p.is_code());
        let p = perms_from_flags(SegmentFlags::Elf {
            p_flags: ELF_PF_R | ELF_PF_W,
        });
        assert!(p.is_data());
    }

    #[test]
    fn test_load_raw() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"raw blob contents").unwrap();
        let image = load_raw(f.path(), Address(0x8000)).unwrap();
        assert_eq!(image.segments().len(), 1);
        assert_eq!(image.min_address(), Some(Address(0x8000)));
        assert_eq!(image.read(Address(0x8004), 4).unwrap(), b"blob");
    }

    #[test]
    fn test_empty_file_rejected() {
        let f = tempfile::NamedTempFile::new().unwrap();
        assert!(load_raw(f.path(), Address(0)).is_err());
        assert!(load_object(f.path()).is_err());
    }

    #[test]
    fn test_garbage_is_not_an_object() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"definitely not an executable").unwrap();
        assert!(matches!(
            load_object(f.path()),
            Err(FilehuntError::InvalidFormat(_))
        ));
    }
}
