use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use crate::models::ReferenceCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum FileType {
    SAM,
    BAM,
    UNKNOWN,
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sam" => Ok(FileType::SAM),
            "bam" => Ok(FileType::BAM),
            _ => Ok(FileType::UNKNOWN),
        }
    }
}

pub struct FileInfo {
    pub file_type: FileType,
    pub is_gzipped: bool,
}

///
/// Work out the file type from a path's extension, looking through a trailing `.gz`.
///
pub fn get_file_info(path: &Path) -> FileInfo {
    let mut file_type = FileType::UNKNOWN;
    let mut is_gzipped = false;

    if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
        let base_filename = match filename.strip_suffix(".gz") {
            Some(base) => {
                is_gzipped = true;
                base
            }
            None => filename,
        };
        if let Some(ext) = PathBuf::from(base_filename)
            .extension()
            .and_then(|e| e.to_str())
        {
            file_type = FileType::from_str(ext).unwrap_or(FileType::UNKNOWN);
        }
    }

    FileInfo {
        file_type,
        is_gzipped,
    }
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read>>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read> = match get_file_info(path).is_gzipped {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    Ok(BufReader::new(file))
}

/// Get a reader for either a gzipped, non-gzipped file, or stdin
///
/// # Arguments
///
/// - file_path: path to the file to read, or '-' for stdin
pub fn get_dynamic_reader_w_stdin(file_path_str: &str) -> Result<BufReader<Box<dyn Read>>> {
    if file_path_str == "-" {
        Ok(BufReader::new(Box::new(std::io::stdin()) as Box<dyn Read>))
    } else {
        get_dynamic_reader(Path::new(file_path_str))
    }
}

///
/// Read a reference index (`.fai` or chrom sizes, optionally gzipped) into a catalog.
///
pub fn read_reference_index<T: AsRef<Path>>(path: T) -> Result<ReferenceCatalog> {
    let path = path.as_ref();
    let reader = get_dynamic_reader(path)?;
    let catalog = ReferenceCatalog::from_reader(reader)
        .with_context(|| format!("Failed to parse reference index: {:?}", path))?;

    if catalog.is_empty() {
        return Err(crate::CoverageError::EmptyReferenceIndex(path.display().to_string()).into());
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    #[rstest]
    #[case("reads.sam", FileType::SAM, false)]
    #[case("reads.sam.gz", FileType::SAM, true)]
    #[case("reads.BAM", FileType::BAM, false)]
    #[case("reads.txt", FileType::UNKNOWN, false)]
    #[case("reads", FileType::UNKNOWN, false)]
    fn test_get_file_info(
        #[case] name: &str,
        #[case] file_type: FileType,
        #[case] is_gzipped: bool,
    ) {
        let info = get_file_info(Path::new(name));
        assert_eq!(info.file_type, file_type);
        assert_eq!(info.is_gzipped, is_gzipped);
    }

    #[rstest]
    fn test_read_reference_index_plain_and_gzipped() {
        let tempdir = tempfile::tempdir().unwrap();

        let plain = tempdir.path().join("ref.fa.fai");
        std::fs::write(&plain, "chrM\t16569\t6\t60\t61\n").unwrap();
        let catalog = read_reference_index(&plain).unwrap();
        assert_eq!(catalog.length("chrM").unwrap(), 16569);

        let gzipped = tempdir.path().join("ref.sizes.gz");
        let mut encoder = GzEncoder::new(File::create(&gzipped).unwrap(), Compression::default());
        writeln!(encoder, "chrM\t16569").unwrap();
        encoder.finish().unwrap();
        let catalog = read_reference_index(&gzipped).unwrap();
        assert_eq!(catalog.length("chrM").unwrap(), 16569);
    }

    #[rstest]
    fn test_read_reference_index_empty() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("empty.fai");
        std::fs::write(&path, "").unwrap();
        assert!(read_reference_index(&path).is_err());
    }

    #[rstest]
    fn test_read_reference_index_missing_file() {
        assert!(read_reference_index("/definitely/not/here.fai").is_err());
    }
}
