pub mod fragment;
pub mod reference;
pub mod strand;

// re-export for cleaner imports
pub use self::fragment::Fragment;
pub use self::reference::{ReferenceCatalog, ReferenceSequence};
pub use self::strand::{Strand, StrandKey};
