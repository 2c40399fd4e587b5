//! Circular reconstruction of depth from event maps.
//!
//! Events sit at linear coordinates, and a fragment crossing the origin ends past
//! `length`. Every event position `k` is split into the number of whole turns
//! `k div length` and its offset `k mod length`. Deltas are replayed at their offsets,
//! starting from the depth carried across the origin, which is `-sum(delta * turns)`.
//! The depth at `p` is then the number of fragments whose interval contains `p` modulo
//! the length.

use std::collections::BTreeMap;

use mtcov_core::models::StrandKey;
use mtcov_core::{CoverageError, Result};

use crate::counting::EventMap;

///
/// Constant depth over `[start, end)`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthRun {
    pub start: u64,
    pub end: u64,
    pub depth: u32,
}

impl DepthRun {
    pub fn new(start: u64, end: u64, depth: u32) -> Self {
        DepthRun { start, end, depth }
    }
}

/// Reconstructed depth for one [`StrandKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepthProfile {
    /// Depth at every position `0..length`.
    Dense(Vec<u32>),
    /// Runs partitioning `[0, length)`, no two neighbours with equal depth.
    Compact(Vec<DepthRun>),
}

impl DepthProfile {
    pub fn len(&self) -> u64 {
        match self {
            DepthProfile::Dense(depths) => depths.len() as u64,
            DepthProfile::Compact(runs) => runs.last().map_or(0, |r| r.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth_at(&self, position: u64) -> Option<u32> {
        match self {
            DepthProfile::Dense(depths) => depths.get(position as usize).copied(),
            DepthProfile::Compact(runs) => {
                let i = runs.partition_point(|r| r.end <= position);
                runs.get(i).map(|r| r.depth)
            }
        }
    }
}

///
/// Sweeps one strand of one circular sequence.
///
pub struct CircularSweep<'a> {
    key: &'a StrandKey,
    length: u64,
}

impl<'a> CircularSweep<'a> {
    pub fn new(key: &'a StrandKey, length: u64) -> Self {
        CircularSweep { key, length }
    }

    ///
    /// Build the profile in the requested representation. The dense form is an
    /// expansion of the compact runs, so both always agree.
    ///
    pub fn reconstruct(&self, events: &EventMap, compact: bool) -> Result<DepthProfile> {
        let runs = self.runs(events)?;
        if compact {
            Ok(DepthProfile::Compact(runs))
        } else {
            Ok(DepthProfile::Dense(expand_runs(&runs, self.length)))
        }
    }

    ///
    /// Runs of constant depth covering `[0, length)`, merged so neighbouring runs
    /// always differ.
    ///
    /// # Errors
    /// [`CoverageError::NegativeDepth`] if the running depth ever drops below zero,
    /// which only happens when the events do not come from whole fragments.
    pub fn runs(&self, events: &EventMap) -> Result<Vec<DepthRun>> {
        let length = self.length as i64;

        let mut folded: BTreeMap<i64, i64> = BTreeMap::new();
        let mut running_depth: i64 = 0;
        for (&position, &delta) in events.iter() {
            running_depth -= delta * position.div_euclid(length);
            *folded.entry(position.rem_euclid(length)).or_insert(0) += delta;
        }

        let mut runs: Vec<DepthRun> = Vec::new();
        let mut current_position: i64 = 0;
        for (&offset, &delta) in folded.iter() {
            self.push_run(&mut runs, current_position, offset, running_depth)?;
            current_position = offset;
            running_depth += delta;
        }
        self.push_run(&mut runs, current_position, length, running_depth)?;

        Ok(runs)
    }

    fn push_run(&self, runs: &mut Vec<DepthRun>, start: i64, end: i64, depth: i64) -> Result<()> {
        if end <= start {
            return Ok(());
        }
        let depth = u32::try_from(depth).map_err(|_| CoverageError::NegativeDepth {
            name: self.key.name.clone(),
            strand: self.key.strand,
            position: start as u64,
        })?;
        push_merged(runs, DepthRun::new(start as u64, end as u64, depth));
        Ok(())
    }
}

fn push_merged(runs: &mut Vec<DepthRun>, run: DepthRun) {
    if run.end <= run.start {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.depth == run.depth && last.end == run.start => last.end = run.end,
        _ => runs.push(run),
    }
}

///
/// Merge neighbouring runs of equal depth and drop empty ones. Applying this to its
/// own output changes nothing.
///
pub fn merge_runs(runs: &[DepthRun]) -> Vec<DepthRun> {
    let mut merged = Vec::with_capacity(runs.len());
    for run in runs {
        push_merged(&mut merged, *run);
    }
    merged
}

/// Expand runs into one depth per position over `0..length`.
pub fn expand_runs(runs: &[DepthRun], length: u64) -> Vec<u32> {
    let mut depths = vec![0u32; length as usize];
    for run in runs {
        let end = run.end.min(length) as usize;
        let start = (run.start as usize).min(end);
        depths[start..end].fill(run.depth);
    }
    depths
}
