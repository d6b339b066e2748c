//! Second pass: walks the feature table, reassembles wrapped locations and
//! `/translation` values, and extracts each CDS, tRNA and rRNA from the
//! origin sequence.

use std::io::Read;
use std::mem;

use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{char, space1};
use nom::combinator::{opt, rest};
use nom::sequence::{preceded, separated_pair};
use nom::{IResult, Parser};

use crate::errors::ExtractError;
use crate::reader::line_reader::LineReader;
use crate::reader::ReaderOptions;
use crate::seq::{FeatureKind, FeatureRecord, Location};

/// Feature keys start at column 5, locations and qualifiers at column 21
const FEATURE_KEY_INDENT: &str = "     ";

/// A classified line of the feature table
#[derive(Debug, PartialEq)]
enum Line<'a> {
    /// Starts at column 0: `FEATURES`, `BASE COUNT`, `ORIGIN`, `//`...
    Section(&'a str),
    Feature { key: &'a str, location: &'a str },
    Qualifier { key: &'a str, value: Option<&'a str> },
    /// Anything else, trimmed
    Continuation(&'a str),
}

fn feature_header(input: &str) -> IResult<&str, (&str, &str)> {
    preceded(
        tag(FEATURE_KEY_INDENT),
        separated_pair(is_not(" "), space1, rest),
    )
    .parse(input)
}

fn qualifier(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    preceded(
        (space1, char('/')),
        (is_not("= "), opt(preceded(char('='), rest))),
    )
    .parse(input)
}

fn classify(line: &str) -> Line {
    if line.starts_with(|c: char| !c.is_whitespace()) {
        Line::Section(line)
    } else if let Ok((_, (key, location))) = feature_header(line) {
        Line::Feature { key, location }
    } else if let Ok((_, (key, value))) = qualifier(line) {
        Line::Qualifier { key, value }
    } else {
        Line::Continuation(line.trim())
    }
}

/// Returns the text of a qualifier value and whether it is complete. A
/// quoted value is complete once its closing quote is on the line.
fn value_start(value: &str) -> (&str, bool) {
    match value.strip_prefix('"') {
        Some(v) => match v.find('"') {
            Some(end) => (v[..end].trim(), true),
            None => (v.trim(), false),
        },
        None => (value.trim(), true),
    }
}

/// Same as `value_start`, for the following lines of a quoted value
fn value_continuation(line: &str) -> (&str, bool) {
    match line.find('"') {
        Some(end) => (line[..end].trim(), true),
        None => (line.trim(), false),
    }
}

#[derive(Debug)]
struct PendingFeature {
    kind: FeatureKind,
    gene: Option<String>,
    location: String,
    seq: Vec<u8>,
    translation: String,
}

impl PendingFeature {
    fn name(&self) -> &str {
        self.gene.as_deref().unwrap_or(&self.location)
    }

    fn into_record(self) -> FeatureRecord {
        FeatureRecord {
            kind: self.kind,
            gene: self.gene,
            location: self.location,
            seq: self.seq,
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    /// The location ended in `,` and continues on the next line
    InLocation(PendingFeature),
    /// Location done, waiting for `/gene` and (CDS only) `/translation`
    InQualifiers(PendingFeature),
    /// Inside a `/translation` value spanning several lines
    InTranslation(PendingFeature),
}

/// A finished record, in the order it was found
#[derive(Debug, PartialEq)]
pub enum Completed {
    Cds(FeatureRecord, String),
    Rna(FeatureRecord),
}

#[derive(Debug)]
pub struct FeatureTableParser<'a> {
    origin: &'a [u8],
    options: &'a ReaderOptions,
    state: State,
    completed: Vec<Completed>,
    finished: bool,
}

impl<'a> FeatureTableParser<'a> {
    pub fn new(origin: &'a [u8], options: &'a ReaderOptions) -> FeatureTableParser<'a> {
        FeatureTableParser {
            origin,
            options,
            state: State::Idle,
            completed: Vec::new(),
            finished: false,
        }
    }

    pub fn push_line(&mut self, line: &str) -> Result<(), ExtractError> {
        if self.finished {
            return Ok(());
        }
        let state = mem::replace(&mut self.state, State::Idle);
        self.state = match (state, classify(line)) {
            (state, Line::Section(text)) => {
                self.close(state)?;
                if text.starts_with("ORIGIN") || text.starts_with("//") {
                    self.finished = true;
                }
                State::Idle
            }
            (state, Line::Feature { key, location }) => {
                self.close(state)?;
                match FeatureKind::from_key(key) {
                    Some(kind) => self.open(kind, location)?,
                    None => State::Idle,
                }
            }
            (State::InLocation(pending), Line::Continuation(text)) => {
                self.extend_location(pending, text)?
            }
            (State::InLocation(pending), _) => {
                return Err(ExtractError::Syntax(format!(
                    "Unterminated {} location '{}' before line '{}'",
                    pending.kind, pending.location, line
                )));
            }
            (State::InTranslation(pending), _) => self.extend_translation(pending, line)?,
            (State::InQualifiers(pending), Line::Qualifier { key, value }) => {
                self.qualifier(pending, key, value.unwrap_or(""))?
            }
            (state @ State::InQualifiers(_), Line::Continuation(_)) => state,
            (State::Idle, _) => State::Idle,
        };
        Ok(())
    }

    /// Call at the end of input. Returns the records in file order.
    pub fn finish(mut self) -> Result<Vec<Completed>, ExtractError> {
        let state = mem::replace(&mut self.state, State::Idle);
        self.close(state)?;
        Ok(self.completed)
    }

    /// Ends whatever record is open because a new feature or section
    /// started.
    fn close(&mut self, state: State) -> Result<(), ExtractError> {
        match state {
            State::Idle => Ok(()),
            State::InLocation(pending) => Err(ExtractError::Syntax(format!(
                "Unterminated {} location '{}'",
                pending.kind, pending.location
            ))),
            State::InTranslation(pending) => Err(ExtractError::Syntax(format!(
                "Unterminated /translation of {} {}",
                pending.kind,
                pending.name()
            ))),
            State::InQualifiers(pending) => {
                let missing = match pending.kind {
                    FeatureKind::Cds => "/translation",
                    FeatureKind::Trna | FeatureKind::Rrna => "/gene",
                };
                warn!(
                    "Skipping {} {}: no {} qualifier",
                    pending.kind,
                    pending.name(),
                    missing
                );
                Ok(())
            }
        }
    }

    fn open(&mut self, kind: FeatureKind, text: &str) -> Result<State, ExtractError> {
        let fragment = text.split_whitespace().next().unwrap_or("");
        let pending = PendingFeature {
            kind,
            gene: None,
            location: fragment.to_owned(),
            seq: Vec::new(),
            translation: String::new(),
        };
        if fragment.ends_with(',') {
            Ok(State::InLocation(pending))
        } else {
            self.located(pending)
        }
    }

    fn extend_location(
        &mut self,
        mut pending: PendingFeature,
        text: &str,
    ) -> Result<State, ExtractError> {
        let fragment = text.split_whitespace().next().unwrap_or("");
        pending.location.push_str(fragment);
        if fragment.ends_with(',') {
            Ok(State::InLocation(pending))
        } else {
            self.located(pending)
        }
    }

    /// The location is complete, extract the sequence
    fn located(&mut self, mut pending: PendingFeature) -> Result<State, ExtractError> {
        let err = |source| ExtractError::Location {
            kind: pending.kind,
            location: pending.location.clone(),
            source,
        };
        let location = Location::from_gb_format(&pending.location).map_err(err)?;
        let seq = location
            .extract(
                self.origin,
                self.options.complement_mode,
                self.options.ambiguity,
            )
            .map_err(err)?;
        if seq.len() > self.options.max_feature_len {
            return Err(ExtractError::SequenceTooLong {
                what: pending.kind.key(),
                len: seq.len(),
                max: self.options.max_feature_len,
            });
        }
        pending.seq = seq;
        Ok(State::InQualifiers(pending))
    }

    fn qualifier(
        &mut self,
        mut pending: PendingFeature,
        key: &str,
        value: &str,
    ) -> Result<State, ExtractError> {
        match (key, pending.kind) {
            ("gene", kind) => {
                let (gene, _) = value_start(value);
                match pending.gene {
                    Some(ref first) => warn!(
                        "{} {} has a second /gene \"{}\", keeping the first",
                        kind, first, gene
                    ),
                    None => pending.gene = Some(gene.to_owned()),
                }
                match kind {
                    FeatureKind::Cds => Ok(State::InQualifiers(pending)),
                    FeatureKind::Trna | FeatureKind::Rrna => {
                        self.complete(pending);
                        Ok(State::Idle)
                    }
                }
            }
            ("translation", FeatureKind::Cds) => {
                let (text, closed) = value_start(value);
                self.translation_piece(pending, text, closed)
            }
            _ => Ok(State::InQualifiers(pending)),
        }
    }

    fn extend_translation(
        &mut self,
        pending: PendingFeature,
        line: &str,
    ) -> Result<State, ExtractError> {
        let (text, closed) = value_continuation(line);
        self.translation_piece(pending, text, closed)
    }

    fn translation_piece(
        &mut self,
        mut pending: PendingFeature,
        text: &str,
        closed: bool,
    ) -> Result<State, ExtractError> {
        pending.translation.push_str(text);
        if pending.translation.len() > self.options.max_peptide_len {
            return Err(ExtractError::SequenceTooLong {
                what: "Peptide",
                len: pending.translation.len(),
                max: self.options.max_peptide_len,
            });
        }
        if closed {
            self.complete(pending);
            Ok(State::Idle)
        } else {
            Ok(State::InTranslation(pending))
        }
    }

    fn complete(&mut self, mut pending: PendingFeature) {
        debug!(
            "{} {} at {}: {} nt",
            pending.kind,
            pending.name(),
            pending.location,
            pending.seq.len()
        );
        let completed = match pending.kind {
            FeatureKind::Cds => {
                let translation = mem::take(&mut pending.translation);
                Completed::Cds(pending.into_record(), translation)
            }
            FeatureKind::Trna | FeatureKind::Rrna => Completed::Rna(pending.into_record()),
        };
        self.completed.push(completed);
    }
}

pub fn read_features<T: Read>(
    lines: &mut LineReader<T>,
    origin: &[u8],
    options: &ReaderOptions,
) -> Result<Vec<Completed>, ExtractError> {
    let mut parser = FeatureTableParser::new(origin, options);
    while let Some(line) = lines.next_line()? {
        parser.push_line(&line)?;
    }
    parser.finish()
}
