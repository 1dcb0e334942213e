use winnow::ascii::digit1;
use winnow::combinator::opt;
use winnow::token::{literal, one_of, take_while};
use winnow::Parser;

use crate::Point;

/// One line of the serial control protocol.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Command {
    /// `l x1,y1 x2,y2 [stay_down]` - queue a straight segment.
    Line {
        from: Point,
        to: Point,
        stay_down: bool,
    },
    /// `x1,y1 x2,y2 x3,y3 x4,y4 [stay_down]` - queue a cubic Bezier;
    /// the outer points are the endpoints, the inner two the controls.
    Curve {
        from: Point,
        ctrl1: Point,
        ctrl2: Point,
        to: Point,
        stay_down: bool,
    },
    /// `go X,Y` - pen-up rapid to a point.
    Go(Point),
    /// `halt` - stop pacing at the current position.
    Halt,
    /// `pen N` - drive the pen servo to a raw angle.
    Pen(i32),
    /// `lock` - hold the motor drivers energized at rest.
    Lock,
    /// `unlock` - release the hold request.
    Unlock,
    /// `pause` - freeze the active move.
    Pause,
    /// `resume` - continue the active move.
    Resume,
    /// `cancel` - drop all motion, keep the origin.
    Cancel,
    /// `reset` - drop all motion and re-zero the origin here.
    Reset,
}

/// Why a line was rejected.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ParseError {
    /// A coordinate pair was missing its separating comma.
    ExpectedComma,
    /// The command was followed by unconsumed text. The input reference
    /// is left at the offending remainder so the caller can echo it.
    TrailingInput,
}

impl Command {
    /// Parses one `\n`-stripped command line.
    ///
    /// The grammar is total: every line yields either a command or one
    /// [ParseError]. Anything that does not start with a keyword is a
    /// move; a leading `l` selects the two-point linear form, otherwise
    /// four points describe a cubic Bezier. A trailing `\r` is tolerated
    /// everywhere whitespace is.
    pub fn parse(input: &mut &str) -> Result<Command, ParseError> {
        skip_ws(input);

        if eat(input, "cancel") {
            expect_end(input)?;
            return Ok(Command::Cancel);
        }
        if eat(input, "reset") {
            expect_end(input)?;
            return Ok(Command::Reset);
        }
        if eat(input, "lock") {
            expect_end(input)?;
            return Ok(Command::Lock);
        }
        if eat(input, "unlock") {
            expect_end(input)?;
            return Ok(Command::Unlock);
        }
        if eat(input, "pause") {
            expect_end(input)?;
            return Ok(Command::Pause);
        }
        if eat(input, "resume") {
            expect_end(input)?;
            return Ok(Command::Resume);
        }
        if eat(input, "pen") {
            let degrees = parse_long(input);
            expect_end(input)?;
            return Ok(Command::Pen(degrees));
        }
        if eat(input, "go") {
            let to = parse_point(input)?;
            expect_end(input)?;
            return Ok(Command::Go(to));
        }
        if eat(input, "halt") {
            expect_end(input)?;
            return Ok(Command::Halt);
        }

        let is_line = eat(input, "l");
        if is_line {
            let from = parse_point(input)?;
            let to = parse_point(input)?;
            let stay_down = parse_stay_down(input);
            expect_end(input)?;
            return Ok(Command::Line {
                from,
                to,
                stay_down,
            });
        }

        let from = parse_point(input)?;
        let ctrl1 = parse_point(input)?;
        let ctrl2 = parse_point(input)?;
        let to = parse_point(input)?;
        let stay_down = parse_stay_down(input);
        expect_end(input)?;
        Ok(Command::Curve {
            from,
            ctrl1,
            ctrl2,
            to,
            stay_down,
        })
    }
}

/// Parses `x,y`. Whitespace is allowed before the pair and after the
/// comma, but not between the first number and the comma.
fn parse_point(input: &mut &str) -> Result<Point, ParseError> {
    let x = parse_long(input);
    if !eat(input, ",") {
        return Err(ParseError::ExpectedComma);
    }
    let y = parse_long(input);
    Ok(Point::new(x, y))
}

/// Parses an optional `stay_down` suffix.
fn parse_stay_down(input: &mut &str) -> bool {
    skip_ws(input);
    eat(input, "stay_down")
}

/// Parses an optionally signed decimal integer, `strtol`-style: leading
/// whitespace is skipped, and when no digits are present nothing is
/// consumed and the value is zero. Out-of-range literals saturate.
fn parse_long(input: &mut &str) -> i32 {
    skip_ws(input);
    let matched: winnow::Result<Option<&str>> =
        opt((opt(one_of(['+', '-'])), digit1).take()).parse_next(input);
    match matched.ok().flatten() {
        None => 0,
        Some(digits) => match digits.parse::<i64>() {
            Ok(value) => value.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            Err(_) => {
                if digits.starts_with('-') {
                    i32::MIN
                } else {
                    i32::MAX
                }
            }
        },
    }
}

/// Consumes `token` if the input starts with it.
fn eat(input: &mut &str, token: &'static str) -> bool {
    let matched: winnow::Result<Option<&str>> = opt(literal(token)).parse_next(input);
    matches!(matched, Ok(Some(_)))
}

/// Skips any whitespace, including a stray `\r`.
fn skip_ws(input: &mut &str) {
    let _: winnow::Result<&str> =
        take_while(0.., char::is_whitespace).parse_next(input);
}

/// Requires the rest of the line to be blank; on failure the input is
/// left at the unconsumed remainder.
fn expect_end(input: &mut &str) -> Result<(), ParseError> {
    skip_ws(input);
    if input.is_empty() {
        Ok(())
    } else {
        Err(ParseError::TrailingInput)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        let mut input = line;
        Command::parse(&mut input)
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Ok(Command::Cancel), parse("cancel"));
        assert_eq!(Ok(Command::Reset), parse("reset"));
        assert_eq!(Ok(Command::Lock), parse("lock"));
        assert_eq!(Ok(Command::Unlock), parse("unlock"));
        assert_eq!(Ok(Command::Pause), parse("pause"));
        assert_eq!(Ok(Command::Resume), parse("resume"));
        assert_eq!(Ok(Command::Halt), parse("halt"));
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            Ok(Command::Line {
                from: Point::new(0, 0),
                to: Point::new(100, 0),
                stay_down: false,
            }),
            parse("l 0,0 100,0")
        );
        assert_eq!(
            Ok(Command::Line {
                from: Point::new(-5, 10),
                to: Point::new(7, -3),
                stay_down: true,
            }),
            parse("l -5,10 7,-3 stay_down")
        );
    }

    #[test]
    fn test_parse_curve() {
        assert_eq!(
            Ok(Command::Curve {
                from: Point::new(0, 0),
                ctrl1: Point::new(10000, 0),
                ctrl2: Point::new(10000, 10000),
                to: Point::new(0, 10000),
                stay_down: false,
            }),
            parse("0,0 10000,0 10000,10000 0,10000")
        );
    }

    #[test]
    fn test_parse_go_and_pen() {
        assert_eq!(Ok(Command::Go(Point::new(40000, 0))), parse("go 40000,0"));
        assert_eq!(Ok(Command::Pen(76)), parse("pen 76"));
        // No digits parse as zero, strtol-style.
        assert_eq!(Ok(Command::Pen(0)), parse("pen"));
    }

    #[test]
    fn test_tolerates_carriage_return() {
        assert_eq!(Ok(Command::Cancel), parse("cancel\r"));
        assert_eq!(
            Ok(Command::Line {
                from: Point::new(0, 0),
                to: Point::new(1, 1),
                stay_down: false,
            }),
            parse("l 0,0 1,1\r")
        );
    }

    #[test]
    fn test_missing_comma() {
        assert_eq!(Err(ParseError::ExpectedComma), parse("l 0 0 100,0"));
        assert_eq!(Err(ParseError::ExpectedComma), parse("go abc"));
        // A word that is no keyword falls through to the move grammar.
        assert_eq!(Err(ParseError::ExpectedComma), parse("bogus"));
        // A second point missing entirely also reads as a missing comma.
        assert_eq!(Err(ParseError::ExpectedComma), parse("l 0,0"));
    }

    #[test]
    fn test_trailing_input_points_at_remainder() {
        let mut input = "halt now";
        assert_eq!(Err(ParseError::TrailingInput), Command::parse(&mut input));
        assert_eq!("now", input);

        let mut input = "l 0,0 1,1 stay_downX";
        assert_eq!(Err(ParseError::TrailingInput), Command::parse(&mut input));
        assert_eq!("X", input);
    }

    #[test]
    fn test_saturating_numbers() {
        assert_eq!(Ok(Command::Pen(i32::MAX)), parse("pen 99999999999999"));
        assert_eq!(Ok(Command::Pen(i32::MIN)), parse("pen -99999999999999"));
    }

    #[test]
    fn test_whitespace_after_comma() {
        assert_eq!(
            Ok(Command::Go(Point::new(1, 2))),
            parse("go 1, 2")
        );
    }

    proptest! {
        #[test]
        fn test_line_round_trip(
            x1 in -40_000i32..40_000,
            y1 in -40_000i32..40_000,
            x2 in -40_000i32..40_000,
            y2 in -40_000i32..40_000,
            stay_down: bool,
        ) {
            let suffix = if stay_down { " stay_down" } else { "" };
            let line = format!("l {},{} {},{}{}", x1, y1, x2, y2, suffix);
            let expected = Command::Line {
                from: Point::new(x1, y1),
                to: Point::new(x2, y2),
                stay_down,
            };
            assert_eq!(Ok(expected), parse(&line));
        }
    }

    proptest! {
        /// The parser is total: anything either parses or produces
        /// exactly one diagnostic.
        #[test]
        fn test_parser_is_total(line in "[ -~]{0,40}") {
            let _ = parse(&line);
        }
    }
}
