//! First pass: collects the ORIGIN block into one upper case sequence and
//! picks up the ORGANISM and ACCESSION header lines on the way.

use std::io::Read;

use crate::errors::ExtractError;
use crate::reader::line_reader::LineReader;
use crate::seq::OriginRecord;

/// Header values start at this column
const FIELD_COLUMN: usize = 12;

#[derive(Debug, PartialEq, Clone, Copy)]
enum State {
    BeforeOrigin,
    InOrigin,
    /// `//` seen, everything else is ignored
    Done,
}

#[derive(Debug)]
pub struct OriginAssembler {
    state: State,
    seq: Vec<u8>,
    organism: Option<String>,
    accession: Option<String>,
    ignored_lines: usize,
}

fn field_value(line: &str, key: &str) -> Option<String> {
    if !line.starts_with(key) {
        return None;
    }
    let value = line.get(FIELD_COLUMN..).unwrap_or("").trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

impl OriginAssembler {
    pub fn new() -> OriginAssembler {
        OriginAssembler {
            state: State::BeforeOrigin,
            seq: Vec::new(),
            organism: None,
            accession: None,
            ignored_lines: 0,
        }
    }

    pub fn push_line(&mut self, line: &str) -> Result<(), ExtractError> {
        match self.state {
            State::BeforeOrigin => {
                if line.starts_with("ORIGIN") {
                    self.state = State::InOrigin;
                } else if line.starts_with("//") {
                    self.state = State::Done;
                } else if self.organism.is_none() {
                    self.organism = field_value(line, "  ORGANISM");
                }
                if self.accession.is_none() {
                    self.accession = field_value(line, "ACCESSION");
                }
            }
            State::InOrigin => {
                if line.starts_with("//") {
                    self.state = State::Done;
                } else {
                    self.push_sequence_line(line)?;
                }
            }
            State::Done => {
                if !line.trim().is_empty() {
                    self.ignored_lines += 1;
                }
            }
        }
        Ok(())
    }

    /// Parses the raw sequence data, ignoring whitespace and line numbers
    fn push_sequence_line(&mut self, line: &str) -> Result<(), ExtractError> {
        for chunk in line.split_whitespace() {
            if chunk.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            for b in chunk.bytes() {
                if b.is_ascii_alphabetic() {
                    self.seq.push(b.to_ascii_uppercase());
                } else {
                    return Err(ExtractError::Syntax(format!(
                        "Unexpected char '{}' ({}) in sequence",
                        String::from_utf8_lossy(&[b]),
                        b
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn finish(self, default_organism: &str) -> Result<OriginRecord, ExtractError> {
        if self.ignored_lines > 0 {
            warn!(
                "Ignoring {} lines after the first record terminator",
                self.ignored_lines
            );
        }
        if self.seq.is_empty() {
            return Err(ExtractError::MissingOrigin);
        }
        let organism = self.organism.unwrap_or_else(|| {
            warn!("No ORGANISM line, using '{}'", default_organism);
            default_organism.to_owned()
        });
        info!("The organism is: {}", organism);
        if let Some(ref accession) = self.accession {
            info!("The accession is: {}", accession);
        }
        Ok(OriginRecord {
            organism,
            accession: self.accession,
            seq: self.seq,
        })
    }
}

pub fn read_origin<T: Read>(
    lines: &mut LineReader<T>,
    default_organism: &str,
) -> Result<OriginRecord, ExtractError> {
    let mut assembler = OriginAssembler::new();
    while let Some(line) = lines.next_line()? {
        assembler.push_line(&line)?;
    }
    assembler.finish(default_organism)
}

#[cfg(test)]
mod test {
    use super::*;

    fn assemble(text: &str) -> Result<OriginRecord, ExtractError> {
        let mut lines = LineReader::new(text.as_bytes(), 64);
        read_origin(&mut lines, "Chr1")
    }

    const HEADER: &str = "\
LOCUS       TEST                     70 bp    DNA     circular PLN 01-JAN-2024
ACCESSION   NC_000932
SOURCE      chloroplast Arabidopsis thaliana
  ORGANISM  Arabidopsis thaliana
            Eukaryota; Viridiplantae; Streptophyta.
FEATURES             Location/Qualifiers
";

    #[test]
    fn origin_with_header() {
        let text = format!(
            "{}ORIGIN      \n        1 atgggcgcaa ttaaacctgc atcggcgtaa tgcttgcaaa ccttgcaggc ttaaagatag\n       61 atcgaTCGAA\n//\n",
            HEADER
        );
        let o = assemble(&text).unwrap();
        assert_eq!(o.organism, "Arabidopsis thaliana");
        assert_eq!(o.accession.as_deref(), Some("NC_000932"));
        assert_eq!(o.seq.len(), 70);
        assert_eq!(&o.seq[..10], b"ATGGGCGCAA");
        assert_eq!(&o.seq[60..], b"ATCGATCGAA");
    }

    #[test]
    fn reads_until_eof() {
        let o = assemble("ORIGIN\n        1 acgt\n       5 tt\n").unwrap();
        assert_eq!(o.seq, b"ACGTTT");
        assert_eq!(o.organism, "Chr1");
        assert_eq!(o.accession, None);
    }

    #[test]
    fn first_record_only() {
        let text = "ORIGIN\n        1 acgt\n//\nLOCUS       NEXT\nORIGIN\n        1 gggg\n//\n";
        assert_eq!(assemble(text).unwrap().seq, b"ACGT");
    }

    #[test]
    fn missing_origin() {
        match assemble(HEADER) {
            Err(ExtractError::MissingOrigin) => {}
            x => panic!("{:?}", x),
        }
        match assemble("ORIGIN\n//\n") {
            Err(ExtractError::MissingOrigin) => {}
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn bad_char() {
        match assemble("ORIGIN\n        1 acg*t\n") {
            Err(ExtractError::Syntax(msg)) => assert!(msg.contains('*')),
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn invalid_byte_in_sequence() {
        let mut lines = LineReader::new(&b"ORIGIN\n        1 ac\xfcgt\n"[..], 64);
        match read_origin(&mut lines, "Chr1") {
            Err(ExtractError::Syntax(msg)) => assert!(msg.contains("Unexpected char")),
            x => panic!("{:?}", x),
        }
    }
}
