use std::io::BufRead;

use fxhash::FxHashMap;

use crate::errors::{CoverageError, Result};

///
/// A single (circular) reference sequence and its length in bases.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct ReferenceSequence {
    pub name: String,
    pub length: u64,
}

///
/// Lookup from reference sequence name to length. Built once per run from a FASTA
/// index (`.fai`), a chrom sizes file or an alignment header, read-only afterwards.
///
/// Sequences keep the order in which they were first seen, which is the order
/// profiles are written out in.
///
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    sequences: Vec<ReferenceSequence>,
    index: FxHashMap<String, usize>,
}

impl ReferenceCatalog {
    ///
    /// Build a catalog from `(name, length)` pairs. A repeated name replaces the
    /// earlier length but keeps its original position.
    ///
    /// # Arguments
    /// - pairs: sequence names and their lengths, every length must be positive
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut catalog = ReferenceCatalog::default();
        for (i, (name, length)) in pairs.into_iter().enumerate() {
            let name = name.into();
            if length == 0 {
                return Err(CoverageError::ReferenceIndexParse {
                    line: i + 1,
                    reason: format!("sequence {} has zero length", name),
                });
            }
            catalog.insert(name, length);
        }
        Ok(catalog)
    }

    ///
    /// Parse `name<TAB>length[<TAB>...]` rows. Columns past the second are ignored so
    /// a samtools `.fai` can be passed directly. Blank lines and `#` comments are skipped.
    ///
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut catalog = ReferenceCatalog::default();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = trimmed.split('\t');
            let name = fields.next().unwrap_or_default();
            let length = fields
                .next()
                .ok_or_else(|| CoverageError::ReferenceIndexParse {
                    line: i + 1,
                    reason: "expected at least two tab-separated columns".to_string(),
                })?;
            let length = length
                .trim()
                .parse::<u64>()
                .map_err(|e| CoverageError::ReferenceIndexParse {
                    line: i + 1,
                    reason: format!("can't parse length '{}': {}", length, e),
                })?;
            if length == 0 {
                return Err(CoverageError::ReferenceIndexParse {
                    line: i + 1,
                    reason: format!("sequence {} has zero length", name),
                });
            }

            catalog.insert(name.to_string(), length);
        }

        Ok(catalog)
    }

    fn insert(&mut self, name: String, length: u64) {
        match self.index.get(&name) {
            Some(&i) => self.sequences[i].length = length,
            None => {
                self.index.insert(name.clone(), self.sequences.len());
                self.sequences.push(ReferenceSequence { name, length });
            }
        }
    }

    /// Length of the named sequence, or [`CoverageError::UnknownReference`].
    pub fn length(&self, name: &str) -> Result<u64> {
        self.get(name)
            .map(|seq| seq.length)
            .ok_or_else(|| CoverageError::UnknownReference(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceSequence> {
        self.index.get(name).map(|&i| &self.sequences[i])
    }

    /// Position of the named sequence in catalog order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceSequence> {
        self.sequences.iter()
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[fixture]
    fn fai_content() -> &'static str {
        "chr1\t248956422\t112\t70\t71\nchrM\t16569\t3187630713\t70\t71\n"
    }

    #[rstest]
    fn test_catalog_from_fai(fai_content: &str) {
        let catalog = ReferenceCatalog::from_reader(Cursor::new(fai_content)).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.length("chrM").unwrap(), 16569);
        assert_eq!(catalog.length("chr1").unwrap(), 248956422);
        assert_eq!(catalog.position("chrM"), Some(1));
    }

    #[rstest]
    fn test_unknown_reference(fai_content: &str) {
        let catalog = ReferenceCatalog::from_reader(Cursor::new(fai_content)).unwrap();
        let err = catalog.length("chrX").unwrap_err();
        assert!(matches!(err, CoverageError::UnknownReference(ref name) if name == "chrX"));
        assert!(err.to_string().contains("chrX"));
    }

    #[rstest]
    fn test_comments_and_blank_lines_skipped() {
        let content = "# sizes\n\nchrM\t16569\n";
        let catalog = ReferenceCatalog::from_reader(Cursor::new(content)).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[rstest]
    #[case("chrM\n", 1)]
    #[case("chrM\tabc\n", 1)]
    #[case("chr1\t10\nchrM\t0\n", 2)]
    fn test_bad_index_rows(#[case] content: &str, #[case] bad_line: usize) {
        let err = ReferenceCatalog::from_reader(Cursor::new(content)).unwrap_err();
        match err {
            CoverageError::ReferenceIndexParse { line, .. } => assert_eq!(line, bad_line),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[rstest]
    fn test_from_pairs_keeps_order_on_repeat() {
        let catalog =
            ReferenceCatalog::from_pairs(vec![("chrM", 10), ("chr2", 20), ("chrM", 30)]).unwrap();
        let names: Vec<&str> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["chrM", "chr2"]);
        assert_eq!(catalog.length("chrM").unwrap(), 30);
    }

    #[rstest]
    fn test_from_pairs_rejects_zero_length() {
        assert!(ReferenceCatalog::from_pairs(vec![("chrM", 0)]).is_err());
    }
}
