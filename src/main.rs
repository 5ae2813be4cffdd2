//! Command-line front end for filehunt.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::warn;

use filehunt::annotate::AnnotateConfig;
use filehunt::core::address::Address;
use filehunt::scan::ScanLimits;
use filehunt::{loader, logging, refset::ReferenceSet};

/// Search a binary's loaded memory image for the contents of reference
/// files; label, bookmark, and define data over every match.
#[derive(Debug, Parser)]
#[command(name = "filehunt", version)]
struct Args {
    /// Target binary (ELF/PE/Mach-O, or a raw blob with --raw)
    image: PathBuf,

    /// Reference files and/or directories (directories are walked
    /// recursively)
    #[arg(required = true)]
    refs: Vec<PathBuf>,

    /// Treat the image as a raw blob instead of parsing it
    #[arg(long)]
    raw: bool,

    /// Base address for --raw, hex accepted (e.g. 0x8000)
    #[arg(long, default_value = "0", value_parser = parse_address)]
    base: u64,

    /// Do not clear code/data units overlapping matches
    #[arg(long)]
    no_clear: bool,

    /// Do not create labels
    #[arg(long)]
    no_label: bool,

    /// Do not create bookmarks
    #[arg(long)]
    no_bookmark: bool,

    /// Do not define byte-array data over matches
    #[arg(long)]
    no_data: bool,

    /// Keep labels already present at match addresses
    #[arg(long)]
    keep_existing_labels: bool,

    /// Create labels as secondary symbols instead of primary
    #[arg(long)]
    secondary_label: bool,

    /// Label template; {0}=address, {1}=file name, {2}=instance count
    #[arg(long)]
    label_format: Option<String>,

    /// Bookmark note template, same placeholders
    #[arg(long)]
    bookmark_note: Option<String>,

    /// Bookmark category
    #[arg(long)]
    bookmark_category: Option<String>,

    /// Cap on matches per reference file
    #[arg(long, default_value_t = ScanLimits::default().max_matches_per_pattern)]
    max_matches_per_file: usize,

    /// Write the JSON report to a file, or to stdout with `-`
    #[arg(long)]
    json: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {:?}: {}", s, e))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.log_json {
        logging::init_tracing_json();
    } else {
        logging::init_tracing();
    }

    if args.base != 0 && !args.raw {
        warn!("--base has no effect without --raw");
    }

    let image = if args.raw {
        loader::load_raw(&args.image, Address(args.base))
    } else {
        loader::load_object(&args.image)
    }
    .with_context(|| format!("loading {}", args.image.display()))?;

    let refs = ReferenceSet::collect(&args.refs).context("collecting reference files")?;

    let config = AnnotateConfig {
        clear_range: !args.no_clear,
        clear_preexisting_labels: !args.keep_existing_labels,
        create_label: !args.no_label,
        make_label_primary: !args.secondary_label,
        create_bookmark: !args.no_bookmark,
        create_data: !args.no_data,
        ..AnnotateConfig::default()
    };
    let config = AnnotateConfig {
        label_format: args.label_format.unwrap_or(config.label_format),
        bookmark_note_format: args.bookmark_note.unwrap_or(config.bookmark_note_format),
        bookmark_category: args.bookmark_category.unwrap_or(config.bookmark_category),
        ..config
    };

    let limits = ScanLimits {
        max_matches_per_pattern: args.max_matches_per_file,
        ..ScanLimits::default()
    };

    let (_db, report) = filehunt::hunt(&image, &refs, limits, config)?;

    print!("{}", report.render_text());

    if let Some(path) = args.json {
        let json = report.to_json()?;
        if path.as_os_str() == "-" {
            println!("{}", json);
        } else {
            fs::write(&path, json)
                .with_context(|| format!("writing report to {}", path.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x8000").unwrap(), 0x8000);
        assert_eq!(parse_address("4096").unwrap(), 4096);
        assert!(parse_address("0xzz").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let args = Args::parse_from([
            "filehunt",
            "target.bin",
            "refs/",
            "--raw",
            "--base",
            "0x400000",
            "--no-data",
        ]);
        assert!(args.raw);
        assert_eq!(args.base, 0x400000);
        assert!(args.no_data);
        assert!(!args.no_label);
    }
}
