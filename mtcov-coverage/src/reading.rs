use std::fs::File;
use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use log::debug;
use mtcov_core::models::ReferenceCatalog;
use mtcov_core::utils::{FileType, get_dynamic_reader_w_stdin, get_file_info};
use mtcov_core::{CoverageError, Result};
use noodles::bam;
use noodles::bgzf;
use noodles::sam;

use crate::filter::{AlignmentRecord, SamLine, parse_sam_line};

///
/// A stream of alignment lines from SAM text (plain, gzipped or stdin) or BAM.
///
/// BAM input also carries a reference catalog built from its header, which can stand
/// in for a separate reference index.
///
pub struct AlignmentReader {
    lines: Box<dyn Iterator<Item = Result<SamLine>>>,
    header_catalog: Option<ReferenceCatalog>,
}

impl AlignmentReader {
    pub fn from_sam<R: BufRead + 'static>(reader: R) -> Self {
        let lines = reader
            .lines()
            .map(|line| line.map(|l| parse_sam_line(&l)).map_err(CoverageError::from));
        AlignmentReader {
            lines: Box::new(lines),
            header_catalog: None,
        }
    }

    ///
    /// Open alignments by path. `-` reads SAM text from stdin; `.bam` is read as BAM;
    /// anything else is SAM text, gunzipped when it ends in `.gz`.
    ///
    pub fn open(path: &str) -> anyhow::Result<Self> {
        if path != "-" && get_file_info(Path::new(path)).file_type == FileType::BAM {
            debug!("Reading {} as BAM", path);
            return Self::open_bam(Path::new(path));
        }

        debug!("Reading {} as SAM text", path);
        let reader = get_dynamic_reader_w_stdin(path)?;
        Ok(Self::from_sam(reader))
    }

    fn open_bam(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open BAM file: {:?}", path))?;
        let mut reader = bam::io::reader::Builder::default().build_from_reader(file);
        let header = reader
            .read_header()
            .with_context(|| format!("Failed to read BAM header: {:?}", path))?;

        let header_catalog = catalog_from_header(&header)
            .with_context(|| format!("Invalid reference dictionary in {:?}", path))?;

        Ok(AlignmentReader {
            lines: Box::new(BamRecords {
                reader,
                header,
                record: bam::Record::default(),
            }),
            header_catalog: Some(header_catalog),
        })
    }

    pub fn header_catalog(&self) -> Option<&ReferenceCatalog> {
        self.header_catalog.as_ref()
    }

    pub fn take_header_catalog(&mut self) -> Option<ReferenceCatalog> {
        self.header_catalog.take()
    }
}

impl Iterator for AlignmentReader {
    type Item = Result<SamLine>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

/// Reference catalog from the `@SQ` lines of an alignment header.
pub fn catalog_from_header(header: &sam::Header) -> Result<ReferenceCatalog> {
    ReferenceCatalog::from_pairs(
        header
            .reference_sequences()
            .iter()
            .map(|(name, reference_sequence)| {
                (name.to_string(), reference_sequence.length().get() as u64)
            }),
    )
}

struct BamRecords {
    reader: bam::io::Reader<bgzf::Reader<File>>,
    header: sam::Header,
    record: bam::Record,
}

impl BamRecords {
    fn to_alignment_record(&self) -> Result<AlignmentRecord> {
        let reference_name = match self.record.reference_sequence_id() {
            Some(id) => {
                let id = id?;
                self.header
                    .reference_sequences()
                    .get_index(id)
                    .map(|(name, _)| name.to_string())
                    .ok_or_else(|| {
                        CoverageError::AlignmentRead(format!(
                            "reference sequence id {} is not in the header",
                            id
                        ))
                    })?
            }
            None => "*".to_string(),
        };

        let position = match self.record.alignment_start() {
            Some(start) => {
                let start = start?.get();
                u32::try_from(start).map_err(|_| {
                    CoverageError::AlignmentRead(format!("alignment start {} is out of range", start))
                })?
            }
            None => 0,
        };

        Ok(AlignmentRecord {
            flags: self.record.flags(),
            reference_name,
            position,
            template_length: self.record.template_length(),
        })
    }
}

impl Iterator for BamRecords {
    type Item = Result<SamLine>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(self.to_alignment_record().map(SamLine::Record)),
            Err(e) => Some(Err(e.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::{Cursor, Write};

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use noodles::core::Position;
    use noodles::sam::alignment::RecordBuf;
    use noodles::sam::alignment::io::Write as _;
    use noodles::sam::alignment::record::Flags;
    use noodles::sam::alignment::record::cigar::{Op, op::Kind};
    use noodles::sam::header::record::value::Map;
    use noodles::sam::header::record::value::map::ReferenceSequence;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    #[fixture]
    fn sam_text() -> &'static str {
        "@HD\tVN:1.6\n\
         @SQ\tSN:chrM\tLN:16569\n\
         r1\t99\tchrM\t1\t60\t4M\t=\t7\t10\tACGT\tIIII\n\
         broken line\n\
         r1\t147\tchrM\t7\t60\t4M\t=\t1\t-10\tACGT\tIIII\n"
    }

    fn classify(lines: Vec<SamLine>) -> (usize, usize, usize) {
        let headers = lines.iter().filter(|l| **l == SamLine::Header).count();
        let malformed = lines
            .iter()
            .filter(|l| matches!(l, SamLine::Malformed(_)))
            .count();
        let records = lines
            .iter()
            .filter(|l| matches!(l, SamLine::Record(_)))
            .count();
        (headers, malformed, records)
    }

    #[rstest]
    fn test_sam_text_lines(sam_text: &'static str) {
        let reader = AlignmentReader::from_sam(Cursor::new(sam_text));
        assert!(reader.header_catalog().is_none());
        let lines: Vec<SamLine> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(classify(lines), (2, 1, 2));
    }

    #[rstest]
    fn test_open_gzipped_sam(sam_text: &'static str) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("reads.sam.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(sam_text.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let reader = AlignmentReader::open(path.to_str().unwrap()).unwrap();
        let lines: Vec<SamLine> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(classify(lines), (2, 1, 2));
    }

    fn mapped(flags: u16, start: usize, template_length: i32) -> RecordBuf {
        RecordBuf::builder()
            .set_flags(Flags::from(flags))
            .set_reference_sequence_id(0)
            .set_alignment_start(Position::new(start).unwrap())
            .set_cigar(vec![Op::new(Kind::Match, 10)].into())
            .set_template_length(template_length)
            .build()
    }

    fn write_bam(dir: &Path) -> PathBuf {
        let header = sam::Header::builder()
            .add_reference_sequence(
                "mito",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(100).unwrap()),
            )
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(5000).unwrap()),
            )
            .build();

        let path = dir.join("reads.bam");
        let mut writer = bam::io::Writer::new(File::create(&path).unwrap());
        writer.write_header(&header).unwrap();
        let records = [
            mapped(99, 91, 20),
            mapped(147, 1, -20),
            RecordBuf::builder().set_flags(Flags::UNMAPPED).build(),
        ];
        for record in &records {
            writer.write_alignment_record(&header, record).unwrap();
        }
        // dropping the writer writes the final bgzf block
        drop(writer);
        path
    }

    #[rstest]
    fn test_open_bam() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = write_bam(tempdir.path());

        let mut reader = AlignmentReader::open(path.to_str().unwrap()).unwrap();
        let catalog = reader.take_header_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.length("mito").unwrap(), 100);
        assert_eq!(catalog.length("chr1").unwrap(), 5000);
        assert_eq!(catalog.position("chr1"), Some(1));

        let lines: Vec<SamLine> = reader.collect::<Result<_>>().unwrap();
        assert_eq!(
            lines,
            vec![
                SamLine::Record(AlignmentRecord {
                    flags: Flags::from(99),
                    reference_name: "mito".to_string(),
                    position: 91,
                    template_length: 20,
                }),
                SamLine::Record(AlignmentRecord {
                    flags: Flags::from(147),
                    reference_name: "mito".to_string(),
                    position: 1,
                    template_length: -20,
                }),
                SamLine::Record(AlignmentRecord {
                    flags: Flags::UNMAPPED,
                    reference_name: "*".to_string(),
                    position: 0,
                    template_length: 0,
                }),
            ]
        );
    }

    #[rstest]
    fn test_open_missing_file() {
        assert!(AlignmentReader::open("/definitely/not/here.sam").is_err());
        assert!(AlignmentReader::open("/definitely/not/here.bam").is_err());
    }
}
