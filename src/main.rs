use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, ValueEnum};
use log::{error, info};

use gb_extract::reader::{
    check_extension, Ambiguity, AnnotationReader, ComplementMode, ReaderOptions,
    DEFAULT_MAX_PEPTIDE_LEN,
};
use gb_extract::writer::{write_annotations, Category};
use gb_extract::ExtractError;

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Args {
    /// Genbank file to read (.gb or .gbk)
    #[arg(short = 'g', long)]
    genbank: PathBuf,

    /// Prefix of the output files [default: the input file name without extension]
    #[arg(long)]
    prefix: Option<String>,

    /// Output directory, must exist [default: the directory of the input file]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write every category (the default when none is selected)
    #[arg(short = 'a', long, action = ArgAction::SetTrue)]
    all: bool,

    /// Write the whole origin sequence to <prefix>.faa
    #[arg(short = 'f', long, action = ArgAction::SetTrue)]
    faa: bool,

    /// Write CDS translations to <prefix>.pep
    #[arg(short = 'p', long, action = ArgAction::SetTrue)]
    pep: bool,

    /// Write CDS sequences to <prefix>.cds
    #[arg(short = 'c', long, action = ArgAction::SetTrue)]
    cds: bool,

    /// Write tRNA sequences to <prefix>.trn
    #[arg(short = 't', long, action = ArgAction::SetTrue)]
    trn: bool,

    /// Write rRNA sequences to <prefix>.rrn
    #[arg(short = 'r', long, action = ArgAction::SetTrue)]
    rrn: bool,

    /// Longest /translation accepted
    #[arg(long, default_value_t = DEFAULT_MAX_PEPTIDE_LEN)]
    max_peptide_len: usize,

    /// How complement(join(...)) locations are extracted
    #[arg(long, value_enum, default_value = "per-segment")]
    complement_mode: Mode,

    /// Complement IUPAC ambiguity codes instead of dropping them
    #[arg(long, action = ArgAction::SetTrue)]
    keep_ambiguous: bool,

    /// Wrap sequence lines after this many characters
    #[arg(long)]
    line_width: Option<usize>,

    /// Log progress
    #[arg(short = 'v', long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Each segment is reverse complemented in place
    PerSegment,
    /// The joined sequence is reverse complemented as a whole
    Insdc,
}

impl From<Mode> for ComplementMode {
    fn from(mode: Mode) -> ComplementMode {
        match mode {
            Mode::PerSegment => ComplementMode::PerSegment,
            Mode::Insdc => ComplementMode::Insdc,
        }
    }
}

impl Args {
    fn categories(&self) -> Vec<Category> {
        let selected: Vec<Category> = [
            (self.faa, Category::Faa),
            (self.pep, Category::Pep),
            (self.cds, Category::Cds),
            (self.trn, Category::Trn),
            (self.rrn, Category::Rrn),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|&(_, c)| c)
        .collect();
        if self.all || selected.is_empty() {
            Category::ALL.to_vec()
        } else {
            selected
        }
    }

    fn options(&self) -> ReaderOptions {
        let mut options = ReaderOptions::default();
        options
            .max_peptide_len(self.max_peptide_len)
            .complement_mode(self.complement_mode.into());
        if self.keep_ambiguous {
            options.ambiguity(Ambiguity::Complement);
        }
        options
    }
}

fn run(args: &Args) -> Result<(), ExtractError> {
    check_extension(&args.genbank)?;
    let prefix = match args.prefix {
        Some(ref p) => p.clone(),
        None => args
            .genbank
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let output = match args.output {
        Some(ref o) => o.clone(),
        None => match args.genbank.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_owned(),
            _ => Path::new(".").to_owned(),
        },
    };
    if !output.is_dir() {
        return Err(ExtractError::MissingOutputDir(output));
    }

    let file = File::open(&args.genbank).map_err(|e| {
        error!("Cannot open {}", args.genbank.display());
        e
    })?;
    let set = AnnotationReader::with_options(file, args.options()).read()?;
    for path in write_annotations(
        &output,
        &prefix,
        &args.categories(),
        &set,
        args.line_width,
    )? {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Fatal errors go to stderr whatever the log filter says
fn report<W: Write>(e: &ExtractError, out: &mut W) -> io::Result<()> {
    writeln!(out, "Error: {}", e)
}

fn main() {
    let args = Args::parse();
    let level = if args.verbose { "info" } else { "warn" };
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, level);
    env_logger::Builder::from_env(env).init();

    if let Err(e) = run(&args) {
        let _ = report(&e, &mut io::stderr());
        process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn category_selection() {
        let args = Args::parse_from(["gb-extract", "-g", "x.gb"]);
        assert_eq!(args.categories(), Category::ALL.to_vec());
        let args = Args::parse_from(["gb-extract", "-g", "x.gb", "-p", "-t"]);
        assert_eq!(args.categories(), vec![Category::Pep, Category::Trn]);
        let args = Args::parse_from(["gb-extract", "-g", "x.gb", "-p", "-a"]);
        assert_eq!(args.categories().len(), 5);
    }

    #[test]
    fn reader_options() {
        let args = Args::parse_from([
            "gb-extract",
            "--genbank",
            "x.gb",
            "--complement-mode",
            "insdc",
            "--keep-ambiguous",
        ]);
        assert_eq!(args.max_peptide_len, DEFAULT_MAX_PEPTIDE_LEN);
        let mut expected = ReaderOptions::default();
        expected
            .complement_mode(ComplementMode::Insdc)
            .ambiguity(Ambiguity::Complement);
        assert_eq!(args.options(), expected);
    }

    #[test]
    fn bad_extension() {
        let args = Args::parse_from(["gb-extract", "-g", "tests/data/synthetic.fasta"]);
        match run(&args) {
            Err(e @ ExtractError::BadExtension(_)) => {
                let mut out = Vec::new();
                report(&e, &mut out).unwrap();
                assert_eq!(
                    String::from_utf8(out).unwrap(),
                    "Error: Genbank file must have a .gb or .gbk extension: tests/data/synthetic.fasta\n"
                );
            }
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn missing_output_dir() {
        let args = Args::parse_from([
            "gb-extract",
            "-g",
            "tests/data/synthetic.gb",
            "-o",
            "tests/data/no_such_dir",
        ]);
        match run(&args) {
            Err(ExtractError::MissingOutputDir(p)) => {
                assert_eq!(p, Path::new("tests/data/no_such_dir"))
            }
            x => panic!("{:?}", x),
        }
    }
}
