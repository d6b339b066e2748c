//! Extracts the annotated CDS, tRNA and rRNA sequences, and the CDS
//! translations, from a "Genbank" flat file. The whole origin sequence is
//! read first, then every supported feature location is evaluated against
//! it. `writer` turns the result into one FASTA file per category.

#![allow(clippy::len_without_is_empty)]
extern crate circular;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate nom;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

mod errors;

pub mod dna;
pub mod reader;
pub mod seq;
pub mod writer;

pub use crate::errors::ExtractError;
