use std::fmt::{self, Display};

///
/// Strand of the original DNA fragment a read pair came from.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Both strands, forward first. This is the emission order within a sequence.
    pub const BOTH: [Strand; 2] = [Strand::Forward, Strand::Reverse];

    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

///
/// A reference sequence paired with a strand. Every depth profile is keyed by one of
/// these and no state is shared between two keys.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub struct StrandKey {
    pub name: String,
    pub strand: Strand,
}

impl StrandKey {
    pub fn new(name: impl Into<String>, strand: Strand) -> Self {
        StrandKey {
            name: name.into(),
            strand,
        }
    }
}

impl Display for StrandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.strand)
    }
}
