use crate::seq::LocationError;

/// How `revcomp` treats characters other than A/C/G/T
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Ambiguity {
    /// Silently drop them. Output is upper case.
    #[default]
    Drop,
    /// Complement IUPAC ambiguity codes, keep anything else unchanged.
    /// Case is preserved.
    Complement,
}

fn comp_strict(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(b'T'),
        b'T' | b't' => Some(b'A'),
        b'C' | b'c' => Some(b'G'),
        b'G' | b'g' => Some(b'C'),
        _ => None,
    }
}

// mapping based on https://github.com/rust-bio/rust-bio/blob/b6cb8699fb7f16e741a7840f5bcc2d850938a37a/src/alphabets/dna.rs
fn comp_iupac(base: u8) -> u8 {
    match base {
        // uppercase
        b'A' => b'T',
        b'G' => b'C',
        b'C' => b'G',
        b'T' => b'A',
        b'Y' => b'R',
        b'R' => b'Y',
        b'K' => b'M',
        b'M' => b'K',
        b'D' => b'H',
        b'V' => b'B',
        b'H' => b'D',
        b'B' => b'V',
        // lowercase
        b'a' => b't',
        b'g' => b'c',
        b'c' => b'g',
        b't' => b'a',
        b'y' => b'r',
        b'r' => b'y',
        b'k' => b'm',
        b'm' => b'k',
        b'd' => b'h',
        b'v' => b'b',
        b'h' => b'd',
        b'b' => b'v',
        // W, S, N and anything unknown map to themselves
        x => x,
    }
}

pub fn revcomp(seq: &[u8], ambiguity: Ambiguity) -> Vec<u8> {
    match ambiguity {
        Ambiguity::Drop => seq.iter().rev().filter_map(|&b| comp_strict(b)).collect(),
        Ambiguity::Complement => seq.iter().rev().map(|&b| comp_iupac(b)).collect(),
    }
}

/// Returns the bases from `start` to `end`, both 1-based and inclusive.
pub fn slice(seq: &[u8], start: usize, end: usize) -> Result<&[u8], LocationError> {
    if start == 0 || start > end || end > seq.len() {
        return Err(LocationError::OutOfBounds {
            start,
            end,
            len: seq.len(),
        });
    }
    Ok(&seq[start - 1..end])
}
