//! Per-record inclusion decisions.
//!
//! Each alignment record is either dropped or turned into a single [`Fragment`]: the
//! interval spanned by the whole read pair, on the strand of the DNA fragment the pair
//! was sequenced from. Input is assumed to be paired and properly oriented; unpaired
//! reads carry a zero template length and never produce a fragment.

use std::fmt::{self, Display};

use mtcov_core::Result;
use mtcov_core::models::{Fragment, ReferenceCatalog, Strand};
use noodles::sam::alignment::record::Flags;

pub const DEFAULT_MAX_INSERT_SIZE: u64 = 1000;

// 0-based SAM columns that are read, the rest are ignored
const FLAG_FIELD: usize = 1;
const REFERENCE_FIELD: usize = 2;
const POSITION_FIELD: usize = 3;
const TEMPLATE_LENGTH_FIELD: usize = 8;
const MIN_FIELDS: usize = TEMPLATE_LENGTH_FIELD + 1;

///
/// The handful of alignment fields coverage needs. Position is 1-based as written by
/// the aligner (0 when unavailable). Both numbers are bounded the way SAM and BAM bound
/// them: position in `0..=i32::MAX`, template length within `i32`.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub flags: Flags,
    pub reference_name: String,
    pub position: u32,
    pub template_length: i32,
}

/// One line of a SAM text stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SamLine {
    Header,
    Malformed(String),
    Record(AlignmentRecord),
}

///
/// Parse one line of SAM text. Lines with too few fields, unparseable numeric
/// columns or numbers outside the SAM ranges come back as [`SamLine::Malformed`] rather than an error so a damaged
/// line never aborts a run.
///
pub fn parse_sam_line(line: &str) -> SamLine {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.starts_with('@') {
        return SamLine::Header;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return SamLine::Malformed(format!(
            "expected at least {} fields, found {}",
            MIN_FIELDS,
            fields.len()
        ));
    }

    let flags = match fields[FLAG_FIELD].parse::<u16>() {
        Ok(n) => Flags::from(n),
        Err(_) => return SamLine::Malformed(format!("bad flag '{}'", fields[FLAG_FIELD])),
    };
    let position = match fields[POSITION_FIELD]
        .parse::<i32>()
        .ok()
        .and_then(|n| u32::try_from(n).ok())
    {
        Some(n) => n,
        None => {
            return SamLine::Malformed(format!("bad position '{}'", fields[POSITION_FIELD]));
        }
    };
    let template_length = match fields[TEMPLATE_LENGTH_FIELD].parse::<i32>() {
        Ok(n) => n,
        Err(_) => {
            return SamLine::Malformed(format!(
                "bad template length '{}'",
                fields[TEMPLATE_LENGTH_FIELD]
            ));
        }
    };

    SamLine::Record(AlignmentRecord {
        flags,
        reference_name: fields[REFERENCE_FIELD].to_string(),
        position,
        template_length,
    })
}

///
/// Strand of the sequenced DNA fragment, not of the individual read.
///
/// The first read of a pair takes its strand from the mate's orientation; any other
/// read takes it from its own orientation. Both reads of a properly oriented pair
/// therefore agree.
///
pub fn infer_strand(flags: Flags) -> Strand {
    let reverse = if flags.is_first_segment() {
        flags.is_mate_reverse_complemented()
    } else {
        flags.is_reverse_complemented()
    };

    if reverse {
        Strand::Reverse
    } else {
        Strand::Forward
    }
}

/// What happened to a record that made it past parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOutcome {
    Accepted(Fragment),
    /// Non-positive template length: the mate that ends the pair, or an unpaired read.
    DownstreamMate,
    InsertTooLarge { reference_name: String, reduced: u64 },
}

#[derive(Debug, Clone, Copy)]
pub struct FragmentFilter {
    max_insert_size: u64,
}

impl Default for FragmentFilter {
    fn default() -> Self {
        FragmentFilter::new(DEFAULT_MAX_INSERT_SIZE)
    }
}

impl FragmentFilter {
    pub fn new(max_insert_size: u64) -> Self {
        FragmentFilter { max_insert_size }
    }

    ///
    /// Decide whether a record contributes a fragment.
    ///
    /// Only the record with a positive template length is counted, so each pair is
    /// seen once. The template length is reduced modulo the sequence length, since a
    /// pair crossing the origin of a circular sequence is reported with a span longer
    /// than the sequence itself.
    ///
    /// # Errors
    /// [`mtcov_core::CoverageError::UnknownReference`] when the record cites a sequence
    /// missing from the catalog.
    pub fn classify(
        &self,
        record: &AlignmentRecord,
        catalog: &ReferenceCatalog,
    ) -> Result<FilterOutcome> {
        if record.template_length <= 0 {
            return Ok(FilterOutcome::DownstreamMate);
        }

        let length = catalog.length(&record.reference_name)?;
        let reduced = u64::from(record.template_length.unsigned_abs()) % length;
        if reduced > self.max_insert_size {
            return Ok(FilterOutcome::InsertTooLarge {
                reference_name: record.reference_name.clone(),
                reduced,
            });
        }

        // reduced never exceeds the template length, so the end stays well inside i64
        let start = i64::from(record.position) - 1;
        Ok(FilterOutcome::Accepted(Fragment::new(
            record.reference_name.clone(),
            infer_strand(record.flags),
            start,
            start + reduced as i64,
        )))
    }
}

/// Counts of what the input pass did with every line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub header_lines: u64,
    pub malformed: u64,
    pub records: u64,
    pub downstream_mates: u64,
    pub oversized_inserts: u64,
    pub accepted: u64,
}

impl FilterStats {
    pub fn tally(&mut self, outcome: &FilterOutcome) {
        self.records += 1;
        match outcome {
            FilterOutcome::Accepted(_) => self.accepted += 1,
            FilterOutcome::DownstreamMate => self.downstream_mates += 1,
            FilterOutcome::InsertTooLarge { .. } => self.oversized_inserts += 1,
        }
    }
}

impl Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} fragments accepted, {} mates skipped, {} inserts too large, {} malformed lines, {} header lines",
            self.records,
            self.accepted,
            self.downstream_mates,
            self.oversized_inserts,
            self.malformed,
            self.header_lines
        )
    }
}
