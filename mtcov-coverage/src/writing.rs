use std::fmt::{self, Display};
use std::fs::{File, create_dir_all};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use mtcov_core::models::{Strand, StrandKey};

use crate::sweep::DepthProfile;

///
/// One output row: `name, start, end, has_coverage, depth, strand`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageRow<'a> {
    pub name: &'a str,
    pub start: u64,
    pub end: u64,
    pub depth: u32,
    pub strand: Strand,
}

impl CoverageRow<'_> {
    pub fn has_coverage(&self) -> bool {
        self.depth > 0
    }
}

impl Display for CoverageRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}",
            self.name,
            self.start,
            self.end,
            if self.has_coverage() { "True" } else { "False" },
            self.depth,
            self.strand
        )
    }
}

///
/// Rows for one profile in ascending start order: one per run for compact profiles,
/// one per base for dense ones. Zero-depth rows are dropped when `covered_only` is set.
///
pub fn profile_rows<'a>(
    key: &'a StrandKey,
    profile: &'a DepthProfile,
    covered_only: bool,
) -> Box<dyn Iterator<Item = CoverageRow<'a>> + 'a> {
    let rows: Box<dyn Iterator<Item = CoverageRow<'a>> + 'a> = match profile {
        DepthProfile::Compact(runs) => Box::new(runs.iter().map(move |run| CoverageRow {
            name: key.name.as_str(),
            start: run.start,
            end: run.end,
            depth: run.depth,
            strand: key.strand,
        })),
        DepthProfile::Dense(depths) => {
            Box::new(depths.iter().enumerate().map(move |(i, &depth)| CoverageRow {
                name: key.name.as_str(),
                start: i as u64,
                end: i as u64 + 1,
                depth,
                strand: key.strand,
            }))
        }
    };

    if covered_only {
        Box::new(rows.filter(|row| row.has_coverage()))
    } else {
        rows
    }
}

/// Write the rows of one profile, returning how many were written.
pub fn write_profile<W: Write>(
    writer: &mut W,
    key: &StrandKey,
    profile: &DepthProfile,
    covered_only: bool,
) -> io::Result<u64> {
    let mut written = 0;
    for row in profile_rows(key, profile, covered_only) {
        writeln!(writer, "{}", row)?;
        written += 1;
    }
    Ok(written)
}

///
/// Buffered writer to a file, creating parent directories, or to stdout when no path
/// is given.
///
pub fn create_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {:?}", parent)
                    })?;
                }
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}
