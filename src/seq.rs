use std::cmp;
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use crate::dna::{revcomp, slice, Ambiguity};
use crate::reader::parse_location;

/// One contiguous stretch of the origin sequence. `start` and `end` are
/// 1-based and inclusive, as written in the Genbank file. If `reverse` is
/// set the stretch is reverse complemented after extraction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub reverse: bool,
}

impl Segment {
    pub fn new(start: usize, end: usize) -> Segment {
        Segment {
            start,
            end,
            reverse: false,
        }
    }

    pub fn reversed(self) -> Segment {
        Segment {
            reverse: true,
            ..self
        }
    }

    /// Number of bases covered, 0 if `end < start`
    pub fn len(&self) -> usize {
        self.end.saturating_add(1).saturating_sub(self.start)
    }

    fn to_gb_format(self) -> String {
        if self.start == self.end {
            format!("{}", self.start)
        } else {
            format!("{}..{}", self.start, self.end)
        }
    }
}

/// How `complement(join(...))` is turned into a sequence
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ComplementMode {
    /// Reverse complement every segment on its own and concatenate them in
    /// the order they are written. This is what existing `.cds`/`.trn`/`.rrn`
    /// files were produced with.
    #[default]
    PerSegment,
    /// INSDC semantics: concatenate the segments, then reverse complement
    /// the result.
    Insdc,
}

/// A parsed location expression. The supported forms are `N..M`, `N`,
/// `join(...)` of ranges and complemented ranges, `complement(N..M)` and
/// `complement(join(...))`.
///
/// Segments are kept in the order they appear in the file, they are never
/// sorted. `complement` is set when the whole expression is wrapped in
/// `complement(...)`, in which case every segment is marked `reverse`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Location {
    pub segments: Vec<Segment>,
    pub complement: bool,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum LocationError {
    #[error("Failed parsing location specifier: {0}")]
    Syntax(String),
    #[error("Invalid location '{start}..{end}' for a sequence of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

impl Location {
    pub fn from_gb_format(s: &str) -> Result<Location, LocationError> {
        parse_location(s)
    }

    pub fn to_gb_format(&self) -> String {
        if self.complement {
            let inner = self.segments.iter().map(|s| s.to_gb_format()).join(",");
            if self.segments.len() == 1 {
                format!("complement({})", inner)
            } else {
                format!("complement(join({}))", inner)
            }
        } else {
            let inner = self
                .segments
                .iter()
                .map(|s| {
                    if s.reverse {
                        format!("complement({})", s.to_gb_format())
                    } else {
                        s.to_gb_format()
                    }
                })
                .join(",");
            if self.segments.len() == 1 && !self.segments[0].reverse {
                inner
            } else {
                format!("join({})", inner)
            }
        }
    }

    /// Total number of bases the location covers
    pub fn len(&self) -> usize {
        self.segments
            .iter()
            .fold(0, |acc: usize, s| acc.saturating_add(s.len()))
    }

    /// Extract the sequence specified by this location from `origin`.
    /// Fails if any segment lies outside of `origin`.
    pub fn extract(
        &self,
        origin: &[u8],
        mode: ComplementMode,
        ambiguity: Ambiguity,
    ) -> Result<Vec<u8>, LocationError> {
        let mut res = Vec::with_capacity(cmp::min(self.len(), origin.len()));
        if self.complement && mode == ComplementMode::Insdc {
            for s in &self.segments {
                res.extend_from_slice(slice(origin, s.start, s.end)?);
            }
            return Ok(revcomp(&res, ambiguity));
        }
        for s in &self.segments {
            let bases = slice(origin, s.start, s.end)?;
            if s.reverse {
                res.extend(revcomp(bases, ambiguity));
            } else {
                res.extend_from_slice(bases);
            }
        }
        Ok(res)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_gb_format())
    }
}

/// The feature types that are extracted
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FeatureKind {
    Cds,
    Trna,
    Rrna,
}

impl FeatureKind {
    /// Matches the feature key exactly as it appears in the feature table
    pub fn from_key(key: &str) -> Option<FeatureKind> {
        match key {
            "CDS" => Some(FeatureKind::Cds),
            "tRNA" => Some(FeatureKind::Trna),
            "rRNA" => Some(FeatureKind::Rrna),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            FeatureKind::Cds => "CDS",
            FeatureKind::Trna => "tRNA",
            FeatureKind::Rrna => "rRNA",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// A feature with its sequence extracted from the origin
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct FeatureRecord {
    pub kind: FeatureKind,
    /// Value of the `/gene` qualifier
    pub gene: Option<String>,
    /// Location as written in the file, with line breaks removed
    pub location: String,
    #[cfg_attr(all(feature = "serde", feature = "serde_bytes"), serde(with = "serde_bytes"))]
    pub seq: Vec<u8>,
}

impl FeatureRecord {
    /// Label used in FASTA headers. Falls back to the location text when
    /// the feature has no `/gene`.
    pub fn name(&self) -> &str {
        self.gene.as_deref().unwrap_or(&self.location)
    }
}

/// The `/translation` of a CDS, taken verbatim from the file
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct PeptideRecord {
    pub gene: Option<String>,
    pub location: String,
    pub translation: String,
}

impl PeptideRecord {
    pub fn name(&self) -> &str {
        self.gene.as_deref().unwrap_or(&self.location)
    }
}

/// The whole replicon
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct OriginRecord {
    pub organism: String,
    pub accession: Option<String>,
    /// Upper case, position 1 is `seq[0]`
    #[cfg_attr(all(feature = "serde", feature = "serde_bytes"), serde(with = "serde_bytes"))]
    pub seq: Vec<u8>,
}

/// Everything extracted from one Genbank file. Records of each type are in
/// the order they appear in the file, and `peptides()[i]` belongs to
/// `cds()[i]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct AnnotationSet {
    origin: OriginRecord,
    cds: Vec<FeatureRecord>,
    peptides: Vec<PeptideRecord>,
    trna: Vec<FeatureRecord>,
    rrna: Vec<FeatureRecord>,
}

impl AnnotationSet {
    pub(crate) fn new(origin: OriginRecord) -> AnnotationSet {
        AnnotationSet {
            origin,
            cds: Vec::new(),
            peptides: Vec::new(),
            trna: Vec::new(),
            rrna: Vec::new(),
        }
    }

    pub(crate) fn push_cds(&mut self, record: FeatureRecord, translation: String) {
        debug_assert_eq!(record.kind, FeatureKind::Cds);
        self.peptides.push(PeptideRecord {
            gene: record.gene.clone(),
            location: record.location.clone(),
            translation,
        });
        self.cds.push(record);
    }

    pub(crate) fn push_rna(&mut self, record: FeatureRecord) {
        match record.kind {
            FeatureKind::Trna => self.trna.push(record),
            FeatureKind::Rrna => self.rrna.push(record),
            FeatureKind::Cds => unreachable!("CDS records carry a translation"),
        }
    }

    pub fn origin(&self) -> &OriginRecord {
        &self.origin
    }

    pub fn cds(&self) -> &[FeatureRecord] {
        &self.cds
    }

    pub fn peptides(&self) -> &[PeptideRecord] {
        &self.peptides
    }

    pub fn trna(&self) -> &[FeatureRecord] {
        &self.trna
    }

    pub fn rrna(&self) -> &[FeatureRecord] {
        &self.rrna
    }

    /// Records of one feature type, in file order
    pub fn records(&self, kind: FeatureKind) -> &[FeatureRecord] {
        match kind {
            FeatureKind::Cds => &self.cds,
            FeatureKind::Trna => &self.trna,
            FeatureKind::Rrna => &self.rrna,
        }
    }

    /// Iterate over all feature records, CDS first, then tRNA, then rRNA
    pub fn features(&self) -> impl Iterator<Item = &FeatureRecord> {
        self.cds.iter().chain(&self.trna).chain(&self.rrna)
    }
}
