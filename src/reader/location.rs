/// Parsers for location specifiers
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, u64};
use nom::combinator::{all_consuming, map, map_res};
use nom::multi::separated_list1;
use nom::sequence::{delimited, separated_pair};
use nom::{IResult, Parser};

use crate::seq::{Location, LocationError, Segment};

const COMPLEMENT: &str = "complement";
const JOIN: &str = "join";

type ParseError<'a> = nom::error::Error<&'a str>;

fn number(input: &str) -> IResult<&str, usize> {
    map_res(u64, usize::try_from).parse(input)
}

/// `N..M`, or a single position `N`
fn range(input: &str) -> IResult<&str, Segment> {
    alt((
        map(separated_pair(number, tag(".."), number), |(a, b)| {
            Segment::new(a, b)
        }),
        map(number, |a| Segment::new(a, a)),
    ))
    .parse(input)
}

/// `name(inner)`
fn directive<'a, F, O>(
    name: &'static str,
    inner: F,
) -> impl Parser<&'a str, Output = O, Error = ParseError<'a>>
where
    F: Parser<&'a str, Output = O, Error = ParseError<'a>>,
{
    delimited((tag(name), char('(')), inner, char(')'))
}

fn join_element(input: &str) -> IResult<&str, Segment> {
    alt((map(directive(COMPLEMENT, range), Segment::reversed), range)).parse(input)
}

fn location_join(input: &str) -> IResult<&str, Location> {
    map(
        directive(JOIN, separated_list1(char(','), join_element)),
        |segments| Location {
            segments,
            complement: false,
        },
    )
    .parse(input)
}

fn location_complement(input: &str) -> IResult<&str, Location> {
    let inner = alt((
        directive(JOIN, separated_list1(char(','), range)),
        map(range, |s| vec![s]),
    ));
    map(directive(COMPLEMENT, inner), |segments| Location {
        segments: segments.into_iter().map(Segment::reversed).collect(),
        complement: true,
    })
    .parse(input)
}

fn location_range(input: &str) -> IResult<&str, Location> {
    map(range, |s| Location {
        segments: vec![s],
        complement: false,
    })
    .parse(input)
}

pub fn location(input: &str) -> IResult<&str, Location> {
    alt((location_complement, location_join, location_range)).parse(input)
}

/// Drops `<` / `>` partial markers and any whitespace left over from
/// joining wrapped lines, then parses the whole string.
pub fn parse(text: &str) -> Result<Location, LocationError> {
    let cleaned: String = text
        .chars()
        .filter(|&c| c != '<' && c != '>' && !c.is_whitespace())
        .collect();
    let parsed = all_consuming(location).parse(cleaned.as_str());
    match parsed {
        Ok((_, l)) => Ok(l),
        Err(_) => Err(LocationError::Syntax(text.to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn segs(l: &Location) -> Vec<(usize, usize, bool)> {
        l.segments.iter().map(|s| (s.start, s.end, s.reverse)).collect()
    }

    #[test]
    fn test_range() {
        let l = parse("100..150").unwrap();
        assert!(!l.complement);
        assert_eq!(segs(&l), vec![(100, 150, false)]);
        let l = parse("<44..>579").unwrap();
        assert_eq!(segs(&l), vec![(44, 579, false)]);
    }

    #[test]
    fn test_single() {
        assert_eq!(segs(&parse("7").unwrap()), vec![(7, 7, false)]);
    }

    #[test]
    fn test_join() {
        let l = parse("join(14924750,14960684..14960875,15034749..15034885)").unwrap();
        assert_eq!(
            segs(&l),
            vec![
                (14924750, 14924750, false),
                (14960684, 14960875, false),
                (15034749, 15034885, false)
            ]
        );
    }

    #[test]
    fn test_join_not_sorted() {
        let l = parse("join(10..12,1..3)").unwrap();
        assert_eq!(segs(&l), vec![(10, 12, false), (1, 3, false)]);
    }

    #[test]
    fn test_complement() {
        let l = parse("complement(100..150)").unwrap();
        assert!(l.complement);
        assert_eq!(segs(&l), vec![(100, 150, true)]);
    }

    #[test]
    fn test_complement_join() {
        let l = parse("complement(join(<1..3,10..>12))").unwrap();
        assert!(l.complement);
        assert_eq!(segs(&l), vec![(1, 3, true), (10, 12, true)]);
    }

    #[test]
    fn test_join_complement() {
        let l = parse("join(complement(2..6),8..9)").unwrap();
        assert!(!l.complement);
        assert_eq!(segs(&l), vec![(2, 6, true), (8, 9, false)]);
    }

    #[test]
    fn test_wrapped_text() {
        let l = parse("join(1..3,\n                     10..12)").unwrap();
        assert_eq!(segs(&l), vec![(1, 3, false), (10, 12, false)]);
    }

    #[test]
    fn test_unsupported() {
        for s in &[
            "",
            "order(1..3,5..7)",
            "join(1..3,5..7",
            "join()",
            "complement(join(complement(1..2)))",
            "join(join(1..2),4..5)",
            "1^2",
            "J00194.1:100..202",
            "1..",
            "complement(1..3)x",
        ] {
            assert_eq!(
                parse(s),
                Err(LocationError::Syntax(s.to_string())),
                "accepted {:?}",
                s
            );
        }
    }
}
