//! # Strand-specific coverage over circular reference sequences.
//!
//! Paired-end alignments go in, one depth profile per (sequence, strand) comes out.
//! The pipeline is a single pass over the alignments:
//!
//! 1. [`filter`]: each record is parsed and either dropped or turned into a fragment
//!    interval on its inferred strand.
//! 2. [`counting`]: fragments become `+1`/`-1` events, one independent map per strand key.
//! 3. [`sweep`]: each map is swept around the circle into runs of constant depth,
//!    in parallel across strand keys.
//! 4. [`writing`]: profiles are written as per-base or run-length rows.
//!
pub mod counting;
pub mod filter;
pub mod reading;
pub mod sweep;
pub mod writing;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, bail};
use fxhash::FxHashSet;
use indicatif::ProgressBar;
use log::{debug, info};
use rayon::prelude::*;

use mtcov_core::models::{ReferenceCatalog, Strand, StrandKey};
use mtcov_core::utils::read_reference_index;
use mtcov_core::{CoverageError, Result};

use self::counting::EventAccumulator;
use self::filter::{DEFAULT_MAX_INSERT_SIZE, FilterOutcome, FilterStats, FragmentFilter, SamLine};
use self::reading::AlignmentReader;
use self::sweep::{CircularSweep, DepthProfile};
use self::writing::{create_output, write_profile};

///
/// Options recognised by the coverage pipeline.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageOptions {
    /// Leave zero-depth rows out of the output.
    pub covered_only: bool,
    /// Write runs of constant depth instead of one row per base.
    pub compact: bool,
    /// Largest fragment span kept after reducing modulo the sequence length.
    pub max_insert_size: u64,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        CoverageOptions {
            covered_only: false,
            compact: false,
            max_insert_size: DEFAULT_MAX_INSERT_SIZE,
        }
    }
}

impl CoverageOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_insert_size == 0 {
            return Err(CoverageError::InvalidConfig(
                "max insert size must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

/// What a run did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub filter: FilterStats,
    pub profiles: usize,
    pub rows_written: u64,
}

///
/// The input pass: filter every line and accumulate events for accepted fragments.
///
/// Both strands of every sequence cited by a record that passed mate deduplication
/// get an event map, even an empty one, so each of them is reported in full.
///
/// # Errors
/// Fails on the first record citing a sequence missing from `catalog`, or on a read
/// error from the underlying stream. Malformed lines are counted and skipped.
pub fn accumulate_events<I>(
    lines: I,
    catalog: &ReferenceCatalog,
    filter: &FragmentFilter,
) -> Result<(EventAccumulator, FilterStats)>
where
    I: IntoIterator<Item = Result<SamLine>>,
{
    let mut accumulator = EventAccumulator::new();
    let mut stats = FilterStats::default();
    let mut referenced: FxHashSet<String> = FxHashSet::default();

    for (i, line) in lines.into_iter().enumerate() {
        match line? {
            SamLine::Header => stats.header_lines += 1,
            SamLine::Malformed(reason) => {
                stats.malformed += 1;
                debug!("Skipping malformed line {}: {}", i + 1, reason);
            }
            SamLine::Record(record) => {
                let outcome = filter.classify(&record, catalog)?;
                stats.tally(&outcome);
                match outcome {
                    FilterOutcome::Accepted(fragment) => {
                        accumulator.add(&fragment);
                        referenced.insert(fragment.key.name.clone());
                    }
                    FilterOutcome::InsertTooLarge { reference_name, .. } => {
                        referenced.insert(reference_name);
                    }
                    FilterOutcome::DownstreamMate => {}
                }
            }
        }
    }

    for name in referenced {
        for strand in Strand::BOTH {
            accumulator.touch(StrandKey::new(name.clone(), strand));
        }
    }

    Ok((accumulator, stats))
}

///
/// Sweep every strand key independently and return the profiles in catalog order,
/// forward strand first.
///
/// Runs on the current rayon pool; wrap in `ThreadPool::install` to bound threads.
pub fn reconstruct_profiles(
    accumulator: EventAccumulator,
    catalog: &ReferenceCatalog,
    compact: bool,
) -> Result<Vec<(StrandKey, DepthProfile)>> {
    let event_maps = accumulator.into_event_maps();
    let bar = ProgressBar::new(event_maps.len() as u64);

    let mut profiles = event_maps
        .into_par_iter()
        .map(|(key, events)| -> Result<(StrandKey, DepthProfile)> {
            let length = catalog.length(&key.name)?;
            let profile = CircularSweep::new(&key, length).reconstruct(&events, compact)?;
            bar.inc(1);
            Ok((key, profile))
        })
        .collect::<Result<Vec<_>>>()?;
    bar.finish_and_clear();

    profiles.sort_by_key(|(key, _)| (catalog.position(&key.name), key.strand));
    Ok(profiles)
}

///
/// Filter, accumulate and reconstruct in one call, without touching the filesystem.
///
pub fn compute_coverage<I>(
    lines: I,
    catalog: &ReferenceCatalog,
    options: &CoverageOptions,
) -> Result<(Vec<(StrandKey, DepthProfile)>, FilterStats)>
where
    I: IntoIterator<Item = Result<SamLine>>,
{
    options.validate()?;
    let filter = FragmentFilter::new(options.max_insert_size);
    let (accumulator, stats) = accumulate_events(lines, catalog, &filter)?;
    let profiles = reconstruct_profiles(accumulator, catalog, options.compact)?;
    Ok((profiles, stats))
}

/// Write all profiles in order, returning the number of rows written.
pub fn write_profiles<W: Write>(
    writer: &mut W,
    profiles: &[(StrandKey, DepthProfile)],
    covered_only: bool,
) -> std::io::Result<u64> {
    let mut written = 0;
    for (key, profile) in profiles {
        written += write_profile(writer, key, profile, covered_only)?;
    }
    Ok(written)
}

///
/// Main function
///
/// # Arguments
/// - alignments: SAM, SAM.gz or BAM path, or `-` for SAM on stdin
/// - reference_index: `.fai` or sizes file; optional for BAM, whose header is used instead
/// - output: destination file, stdout when `None`
/// - options: filtering and output options
/// - num_threads: size of the pool used for reconstruction (0 lets rayon decide)
pub fn coverage_main(
    alignments: &str,
    reference_index: Option<&Path>,
    output: Option<&Path>,
    options: &CoverageOptions,
    num_threads: usize,
) -> anyhow::Result<CoverageSummary> {
    // configuration errors surface before any input is read
    options.validate()?;

    let mut reader = AlignmentReader::open(alignments)?;
    let catalog = match (reference_index, reader.take_header_catalog()) {
        (Some(path), _) => read_reference_index(path)?,
        (None, Some(catalog)) if !catalog.is_empty() => catalog,
        _ => bail!(
            "A reference index is required for {} (no sequence dictionary available)",
            alignments
        ),
    };
    info!("Loaded {} reference sequences", catalog.len());

    let mut out = create_output(output)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .context("Failed to build thread pool")?;

    let filter = FragmentFilter::new(options.max_insert_size);
    let (accumulator, stats) = accumulate_events(reader, &catalog, &filter)
        .with_context(|| format!("Failed to process alignments from {}", alignments))?;
    info!("{}", stats);

    let profiles = pool.install(|| reconstruct_profiles(accumulator, &catalog, options.compact))?;

    let rows_written = write_profiles(&mut out, &profiles, options.covered_only)
        .context("Failed to write coverage rows")?;
    out.flush().context("Failed to flush coverage output")?;

    info!(
        "Done! Wrote {} rows for {} strand profiles",
        rows_written,
        profiles.len()
    );

    Ok(CoverageSummary {
        filter: stats,
        profiles: profiles.len(),
        rows_written,
    })
}
