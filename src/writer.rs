use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::errors::ExtractError;
use crate::seq::{AnnotationSet, FeatureRecord};

/// One output file per category, named `<prefix>.<extension>`
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Category {
    /// The whole origin sequence, labelled with the organism
    Faa,
    /// CDS translations
    Pep,
    /// CDS nucleotide sequences
    Cds,
    Trn,
    Rrn,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Faa,
        Category::Pep,
        Category::Cds,
        Category::Trn,
        Category::Rrn,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            Category::Faa => "faa",
            Category::Pep => "pep",
            Category::Cds => "cds",
            Category::Trn => "trn",
            Category::Rrn => "rrn",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Debug)]
pub struct FastaWriter<W: Write> {
    stream: W,
    line_width: Option<usize>,
}

impl<W: Write> FastaWriter<W> {
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            line_width: None,
        }
    }

    /// Wrap sequences after this many characters. `None` (the default)
    /// writes each sequence on a single line.
    pub fn line_width(&mut self, width: Option<usize>) -> &mut Self {
        self.line_width = width.filter(|&w| w > 0);
        self
    }

    pub fn write_record(&mut self, name: &str, seq: &[u8]) -> io::Result<()> {
        writeln!(&mut self.stream, ">{}", name)?;
        match self.line_width {
            Some(width) => {
                for line in seq.chunks(width) {
                    self.stream.write_all(line)?;
                    self.stream.write_all(b"\n")?;
                }
                if seq.is_empty() {
                    self.stream.write_all(b"\n")?;
                }
            }
            None => {
                self.stream.write_all(seq)?;
                self.stream.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    fn write_features(&mut self, records: &[FeatureRecord]) -> io::Result<usize> {
        for r in records {
            self.write_record(r.name(), &r.seq)?;
        }
        Ok(records.len())
    }

    /// Writes every record of `category`, in file order. Returns the number
    /// of records written.
    pub fn write_category(
        &mut self,
        set: &AnnotationSet,
        category: Category,
    ) -> io::Result<usize> {
        match category {
            Category::Faa => {
                let origin = set.origin();
                self.write_record(&origin.organism, &origin.seq)?;
                Ok(1)
            }
            Category::Pep => {
                for p in set.peptides() {
                    self.write_record(p.name(), p.translation.as_bytes())?;
                }
                Ok(set.peptides().len())
            }
            Category::Cds => self.write_features(set.cds()),
            Category::Trn => self.write_features(set.trna()),
            Category::Rrn => self.write_features(set.rrna()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }

    pub fn into_inner(self) -> W {
        self.stream
    }
}

pub fn output_path(dir: &Path, prefix: &str, category: Category) -> PathBuf {
    dir.join(format!("{}.{}", prefix, category.extension()))
}

/// Writes `dir/prefix.<ext>` for each category and returns the paths
/// written. `dir` has to exist.
pub fn write_annotations(
    dir: &Path,
    prefix: &str,
    categories: &[Category],
    set: &AnnotationSet,
    line_width: Option<usize>,
) -> Result<Vec<PathBuf>, ExtractError> {
    if !dir.is_dir() {
        return Err(ExtractError::MissingOutputDir(dir.to_owned()));
    }
    let mut written = Vec::with_capacity(categories.len());
    for &category in categories {
        let path = output_path(dir, prefix, category);
        let mut writer = FastaWriter::new(BufWriter::new(File::create(&path)?));
        writer.line_width(line_width);
        let n = writer.write_category(set, category)?;
        writer.flush()?;
        debug!("Wrote {} records to {}", n, path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::seq::{FeatureKind, OriginRecord};
    use std::str;

    fn set() -> AnnotationSet {
        let mut set = AnnotationSet::new(OriginRecord {
            organism: "Arabidopsis thaliana".into(),
            accession: None,
            seq: b"ATGAAACCCTAGGGTTTAA".to_vec(),
        });
        set.push_cds(
            FeatureRecord {
                kind: FeatureKind::Cds,
                gene: Some("orf1".into()),
                location: "1..12".into(),
                seq: b"ATGAAACCCTAG".to_vec(),
            },
            "MKP".into(),
        );
        set.push_cds(
            FeatureRecord {
                kind: FeatureKind::Cds,
                gene: None,
                location: "complement(1..6)".into(),
                seq: b"TTTCAT".to_vec(),
            },
            "MK".into(),
        );
        set.push_rna(FeatureRecord {
            kind: FeatureKind::Trna,
            gene: Some("trnG".into()),
            location: "13..19".into(),
            seq: b"GGTTTAA".to_vec(),
        });
        set
    }

    fn render(category: Category, width: Option<usize>) -> String {
        let mut w = FastaWriter::new(Vec::new());
        w.line_width(width);
        w.write_category(&set(), category).unwrap();
        String::from_utf8(w.into_inner()).unwrap()
    }

    #[test]
    fn categories() {
        assert_eq!(
            render(Category::Cds, None),
            ">orf1\nATGAAACCCTAG\n>complement(1..6)\nTTTCAT\n"
        );
        assert_eq!(render(Category::Pep, None), ">orf1\nMKP\n>complement(1..6)\nMK\n");
        assert_eq!(render(Category::Trn, None), ">trnG\nGGTTTAA\n");
        assert_eq!(render(Category::Rrn, None), "");
        assert_eq!(
            render(Category::Faa, None),
            ">Arabidopsis thaliana\nATGAAACCCTAGGGTTTAA\n"
        );
    }

    #[test]
    fn wrapping() {
        assert_eq!(
            render(Category::Faa, Some(8)),
            ">Arabidopsis thaliana\nATGAAACC\nCTAGGGTT\nTAA\n"
        );
        assert_eq!(render(Category::Trn, Some(7)), ">trnG\nGGTTTAA\n");
        // zero means no wrapping
        assert_eq!(render(Category::Trn, Some(0)), ">trnG\nGGTTTAA\n");
    }

    #[test]
    fn paths() {
        let dir = Path::new("/data/out");
        let names: Vec<_> = Category::ALL
            .iter()
            .map(|&c| output_path(dir, "NC_000932", c))
            .collect();
        assert_eq!(names[0], Path::new("/data/out/NC_000932.faa"));
        assert_eq!(names[4], Path::new("/data/out/NC_000932.rrn"));
        assert_eq!(Category::Pep.to_string(), "pep");
    }

    #[test]
    fn missing_dir() {
        let dir = Path::new("this/directory/does/not/exist");
        match write_annotations(dir, "x", &Category::ALL, &set(), None) {
            Err(ExtractError::MissingOutputDir(p)) => assert_eq!(p, dir),
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn write_files() {
        let dir = std::env::temp_dir().join(format!("gb-extract-writer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let written =
            write_annotations(&dir, "test", &[Category::Cds, Category::Trn], &set(), None).unwrap();
        assert_eq!(written, vec![dir.join("test.cds"), dir.join("test.trn")]);
        let trn = std::fs::read(dir.join("test.trn")).unwrap();
        assert_eq!(str::from_utf8(&trn).unwrap(), ">trnG\nGGTTTAA\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
