use super::strand::{Strand, StrandKey};

///
/// The half-open interval `[start, end)` spanned by one accepted read pair, on the
/// strand of the fragment it was sequenced from.
///
/// Coordinates are 0-based and linear: `end` may run past the sequence length when
/// the pair crosses the origin of a circular sequence. Folding back into range is
/// left to reconstruction.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Fragment {
    pub key: StrandKey,
    pub start: i64,
    pub end: i64,
}

impl Fragment {
    pub fn new(name: impl Into<String>, strand: Strand, start: i64, end: i64) -> Self {
        Fragment {
            key: StrandKey::new(name, strand),
            start,
            end,
        }
    }
}
