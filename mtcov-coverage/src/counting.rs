use std::collections::BTreeMap;
use std::collections::btree_map;

use fxhash::FxHashMap;
use mtcov_core::models::{Fragment, StrandKey};

///
/// Sparse coverage deltas for one strand of one sequence: `+1` where a fragment
/// starts, `-1` where it ends. Positions are linear and unbounded; they are folded
/// onto the circle by the sweep, not here.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMap {
    deltas: BTreeMap<i64, i64>,
}

impl EventMap {
    pub fn new() -> Self {
        EventMap::default()
    }

    pub fn add_fragment(&mut self, start: i64, end: i64) {
        self.add_delta(start, 1);
        self.add_delta(end, -1);
    }

    fn add_delta(&mut self, position: i64, delta: i64) {
        *self.deltas.entry(position).or_insert(0) += delta;
    }

    /// Fold another map into this one. Order of merging does not matter.
    pub fn merge(&mut self, other: EventMap) {
        for (position, delta) in other.deltas {
            self.add_delta(position, delta);
        }
    }

    /// Events in ascending position order.
    pub fn iter(&self) -> btree_map::Iter<'_, i64, i64> {
        self.deltas.iter()
    }

    pub fn get(&self, position: i64) -> i64 {
        self.deltas.get(&position).copied().unwrap_or(0)
    }

    /// Sum of all deltas, zero for any map built from whole fragments.
    pub fn net(&self) -> i64 {
        self.deltas.values().sum()
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

///
/// Collects accepted fragments into one independent [`EventMap`] per [`StrandKey`].
///
/// Accumulators built over separate shards of the input can be merged and give the
/// same maps as a single pass.
///
#[derive(Debug, Clone, Default)]
pub struct EventAccumulator {
    maps: FxHashMap<StrandKey, EventMap>,
}

impl EventAccumulator {
    pub fn new() -> Self {
        EventAccumulator::default()
    }

    pub fn add(&mut self, fragment: &Fragment) {
        self.event_map_mut(&fragment.key)
            .add_fragment(fragment.start, fragment.end);
    }

    /// Make sure a key has a (possibly empty) map so it is reconstructed and emitted.
    pub fn touch(&mut self, key: StrandKey) {
        self.maps.entry(key).or_default();
    }

    pub fn merge(&mut self, other: EventAccumulator) {
        for (key, map) in other.maps {
            self.maps.entry(key).or_default().merge(map);
        }
    }

    pub fn get(&self, key: &StrandKey) -> Option<&EventMap> {
        self.maps.get(key)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Hand out the per-key maps by value for independent reconstruction.
    pub fn into_event_maps(self) -> Vec<(StrandKey, EventMap)> {
        self.maps.into_iter().collect()
    }

    fn event_map_mut(&mut self, key: &StrandKey) -> &mut EventMap {
        self.maps.entry(key.clone()).or_default()
    }
}
