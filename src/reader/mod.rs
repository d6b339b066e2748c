use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

mod feature_table;
mod line_reader;
mod location;
mod origin;

use self::feature_table::{read_features, Completed};
use self::line_reader::LineReader;
use self::origin::read_origin;
use crate::seq::{AnnotationSet, Location, LocationError};

pub use crate::dna::Ambiguity;
pub use crate::errors::ExtractError;
pub use crate::seq::ComplementMode;

/// Longest `/translation` accepted by default
pub const DEFAULT_MAX_PEPTIDE_LEN: usize = 9_999;
/// Longest extracted feature sequence accepted by default
pub const DEFAULT_MAX_FEATURE_LEN: usize = 1_000_000;
/// Label of the whole origin record when the file has no ORGANISM line
pub const DEFAULT_ORGANISM: &str = "Chr1";

const READ_BUF_SIZE: usize = 64 * 1024;

/// Input file extensions accepted by `check_extension`
const EXTENSIONS: &[&str] = &["gb", "gbk"];

#[derive(Debug, PartialEq, Clone)]
pub struct ReaderOptions {
    max_peptide_len: usize,
    max_feature_len: usize,
    complement_mode: ComplementMode,
    ambiguity: Ambiguity,
    default_organism: String,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            max_peptide_len: DEFAULT_MAX_PEPTIDE_LEN,
            max_feature_len: DEFAULT_MAX_FEATURE_LEN,
            complement_mode: ComplementMode::default(),
            ambiguity: Ambiguity::default(),
            default_organism: DEFAULT_ORGANISM.into(),
        }
    }
}

impl ReaderOptions {
    /// A `/translation` longer than this aborts parsing with
    /// `ExtractError::SequenceTooLong`.
    pub fn max_peptide_len(&mut self, len: usize) -> &mut Self {
        self.max_peptide_len = len;
        self
    }

    /// Same as `max_peptide_len`, for the nucleotide sequence extracted for
    /// a feature.
    pub fn max_feature_len(&mut self, len: usize) -> &mut Self {
        self.max_feature_len = len;
        self
    }

    /// How `complement(join(...))` is extracted, see `ComplementMode`.
    pub fn complement_mode(&mut self, mode: ComplementMode) -> &mut Self {
        self.complement_mode = mode;
        self
    }

    /// How reverse complementing treats bases other than A/C/G/T.
    pub fn ambiguity(&mut self, ambiguity: Ambiguity) -> &mut Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn default_organism(&mut self, organism: &str) -> &mut Self {
        self.default_organism = organism.into();
        self
    }
}

/// Reads one Genbank file in two passes: the first collects the ORIGIN
/// sequence, the second rewinds and extracts the features from it.
#[derive(Debug)]
pub struct AnnotationReader<T: Read + Seek> {
    stream: T,
    options: ReaderOptions,
}

impl<T: Read + Seek> AnnotationReader<T> {
    pub fn new(stream: T) -> AnnotationReader<T> {
        AnnotationReader::with_options(stream, ReaderOptions::default())
    }

    pub fn with_options(stream: T, options: ReaderOptions) -> AnnotationReader<T> {
        AnnotationReader { stream, options }
    }

    pub fn options_mut(&mut self) -> &mut ReaderOptions {
        &mut self.options
    }

    pub fn read(mut self) -> Result<AnnotationSet, ExtractError> {
        let start = self.stream.stream_position()?;
        let origin = {
            let mut lines = LineReader::new(&mut self.stream, READ_BUF_SIZE);
            read_origin(&mut lines, &self.options.default_organism)?
        };
        debug!("Origin sequence: {} nt", origin.seq.len());

        self.stream.seek(SeekFrom::Start(start))?;
        let completed = {
            let mut lines = LineReader::new(&mut self.stream, READ_BUF_SIZE);
            read_features(&mut lines, &origin.seq, &self.options)?
        };

        let mut set = AnnotationSet::new(origin);
        for c in completed {
            match c {
                Completed::Cds(record, translation) => set.push_cds(record, translation),
                Completed::Rna(record) => set.push_rna(record),
            }
        }
        info!(
            "Extracted {} CDS, {} tRNA, {} rRNA",
            set.cds().len(),
            set.trna().len(),
            set.rrna().len()
        );
        Ok(set)
    }
}

/// Convenience method to parse an entire file at once.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<AnnotationSet, ExtractError> {
    let file = File::open(path)?;
    AnnotationReader::new(file).read()
}

/// Parse a Genbank file held in memory.
pub fn parse_slice(data: &[u8]) -> Result<AnnotationSet, ExtractError> {
    AnnotationReader::new(Cursor::new(data)).read()
}

/// used by `Location::from_gb_format`
pub fn parse_location(text: &str) -> Result<Location, LocationError> {
    location::parse(text)
}

/// Fails unless `path` ends in `.gb` or `.gbk`
pub fn check_extension<P: AsRef<Path>>(path: P) -> Result<(), ExtractError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if EXTENSIONS.contains(&ext) => Ok(()),
        _ => Err(ExtractError::BadExtension(path.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn extensions() {
        assert!(check_extension("data/NC_000932.gb").is_ok());
        assert!(check_extension("NC_000932.gbk").is_ok());
        for bad in &["NC_000932.fa", "NC_000932", "NC_000932.GB", "gb"] {
            match check_extension(bad) {
                Err(ExtractError::BadExtension(p)) => assert_eq!(p, Path::new(bad)),
                x => panic!("{:?}", x),
            }
        }
    }

    #[test]
    fn reads_from_current_position() {
        let text = b"junkORIGIN\n        1 acgt\n";
        let mut cursor = Cursor::new(&text[..]);
        cursor.seek(SeekFrom::Start(4)).unwrap();
        let set = AnnotationReader::new(cursor).read().unwrap();
        assert_eq!(set.origin().seq, b"ACGT");
    }

    #[test]
    fn options() {
        let mut options = ReaderOptions::default();
        options
            .max_peptide_len(5)
            .complement_mode(ComplementMode::Insdc)
            .ambiguity(Ambiguity::Complement)
            .default_organism("unknown");
        assert_eq!(options.max_peptide_len, 5);
        assert_eq!(options.max_feature_len, DEFAULT_MAX_FEATURE_LEN);
        assert_eq!(options.complement_mode, ComplementMode::Insdc);
        let set = AnnotationReader::with_options(Cursor::new(&b"ORIGIN\n 1 ac\n"[..]), options)
            .read()
            .unwrap();
        assert_eq!(set.origin().organism, "unknown");
    }
}
