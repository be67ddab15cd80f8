//! SVG path data parser
//!
//! Only the straight line subset of the [SVG Path Specification](https://www.w3.org/TR/SVG11/paths.html#PathData)
//! is supported: `M m L l H h V v Z z`. Arguments after a command letter are consumed
//! greedily, so `L 1 2 3 4` is the same as `L 1 2 L 3 4`.
use crate::{Path, Point, Scalar, SubPath};
use std::str::FromStr;
use thiserror::Error;

/// Error while parsing SVG path data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathDataError {
    #[error("path data has to start with moveto command, found `{cmd}` at offset {offset}")]
    MoveToExpected { cmd: char, offset: usize },
    #[error("unknown path command `{cmd}` at offset {offset}")]
    UnknownCommand { cmd: char, offset: usize },
    #[error("invalid number of arguments for {name} command `{cmd}` at offset {offset}: {count}")]
    InvalidArgumentCount {
        cmd: char,
        name: &'static str,
        count: usize,
        offset: usize,
    },
    #[error("failed to parse number at offset {offset}")]
    InvalidNumber { offset: usize },
    #[error("closepath command `{cmd}` at offset {offset} without open sub-path")]
    NothingToClose { cmd: char, offset: usize },
    #[error("coordinate of command `{cmd}` at offset {offset} is out of range")]
    CoordinateOverflow { cmd: char, offset: usize },
}

impl PathDataError {
    /// Byte offset in the path data where the error was detected
    pub fn offset(&self) -> usize {
        use PathDataError::*;
        match self {
            MoveToExpected { offset, .. }
            | UnknownCommand { offset, .. }
            | InvalidArgumentCount { offset, .. }
            | InvalidNumber { offset }
            | NothingToClose { offset, .. }
            | CoordinateOverflow { offset, .. } => *offset,
        }
    }
}

impl From<PathDataError> for std::io::Error {
    fn from(error: PathDataError) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, error)
    }
}

/// Parse path data into a list of sub-paths
pub fn parse(text: &str) -> Result<Path, PathDataError> {
    PathDataParser::new(text.as_bytes()).parse()
}

/// Single command letter with all of its arguments
#[derive(Debug)]
struct Command {
    op: u8,
    args: Vec<Scalar>,
    offset: usize,
}

impl Command {
    fn is_relative(&self) -> bool {
        self.op.is_ascii_lowercase()
    }

    fn is_move_to(&self) -> bool {
        matches!(self.op, b'M' | b'm')
    }

    fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.args
            .chunks_exact(2)
            .map(|pair| Point::new(pair[0], pair[1]))
    }

    /// Check that number of arguments matches the command
    fn validate(&self) -> Result<(), PathDataError> {
        let count = self.args.len();
        let (name, valid) = match self.op {
            b'M' | b'm' => ("moveto", count != 0 && count % 2 == 0),
            b'L' | b'l' => ("lineto", count != 0 && count % 2 == 0),
            b'H' | b'h' => ("horizontal lineto", count != 0),
            b'V' | b'v' => ("vertical lineto", count != 0),
            _ => ("closepath", count == 0),
        };
        if valid {
            Ok(())
        } else {
            Err(PathDataError::InvalidArgumentCount {
                cmd: self.op as char,
                name,
                count,
                offset: self.offset,
            })
        }
    }
}

/// Explicit state of the path data interpreter
///
/// Every command consumes the state and produces the next one.
#[derive(Debug)]
struct ParserState {
    // finished sub-paths
    done: Vec<SubPath>,
    // sub-path which is still being constructed
    current: Option<SubPath>,
    // current point, relative coordinates are resolved against it
    position: Point,
    // last point of the most recently closed sub-path
    last_closed: Option<Point>,
}

impl ParserState {
    fn new() -> Self {
        Self {
            done: Vec::new(),
            current: None,
            position: Point::new(0.0, 0.0),
            last_closed: None,
        }
    }

    fn apply(self, cmd: &Command) -> Result<Self, PathDataError> {
        let state = match cmd.op {
            b'M' | b'm' => self.move_to(cmd)?,
            b'L' | b'l' => cmd.points().try_fold(self, |state, point| {
                let point = state.resolve(cmd, point);
                point.map(|point| state.line_to(point))
            })?,
            b'H' | b'h' => cmd.args.iter().try_fold(self, |state, x| {
                let y = state.position.y();
                let point = state.resolve(cmd, Point::new(*x, 0.0));
                point.map(|point| state.line_to(Point::new(point.x(), y)))
            })?,
            b'V' | b'v' => cmd.args.iter().try_fold(self, |state, y| {
                let x = state.position.x();
                let point = state.resolve(cmd, Point::new(0.0, *y));
                point.map(|point| state.line_to(Point::new(x, point.y())))
            })?,
            _ => self.close(cmd)?,
        };
        Ok(state)
    }

    /// Resolve command argument against the current point, relative offsets
    /// may push a coordinate out of the finite range
    fn resolve(&self, cmd: &Command, point: Point) -> Result<Point, PathDataError> {
        let point = if cmd.is_relative() {
            self.position + point
        } else {
            point
        };
        if point.is_finite() {
            Ok(point)
        } else {
            Err(PathDataError::CoordinateOverflow {
                cmd: cmd.op as char,
                offset: cmd.offset,
            })
        }
    }

    fn flush(&mut self) {
        if let Some(subpath) = self.current.take() {
            self.done.push(subpath);
        }
    }

    /// First pair opens a new sub-path, all other pairs are implicit linetos
    fn move_to(mut self, cmd: &Command) -> Result<Self, PathDataError> {
        for (index, point) in cmd.points().enumerate() {
            let point = self.resolve(cmd, point)?;
            if index == 0 {
                self.flush();
                self.current = Some(SubPath::from_point(point));
                self.position = point;
            } else {
                self = self.line_to(point);
            }
        }
        Ok(self)
    }

    /// Append point to the current sub-path. Without an open sub-path the line
    /// continues from the end of the last closed sub-path, not from the current point.
    fn line_to(mut self, point: Point) -> Self {
        match self.current.as_mut() {
            Some(subpath) => subpath.push(point),
            None => {
                // `last_closed` is only `None` before the first moveto, which is rejected earlier
                let start = self.last_closed.unwrap_or(self.position);
                let mut subpath = SubPath::from_point(start);
                subpath.push(point);
                self.current = Some(subpath);
            }
        }
        self.position = point;
        self
    }

    /// Append sub-path start point and flush it, current point is left unchanged
    fn close(mut self, cmd: &Command) -> Result<Self, PathDataError> {
        let mut subpath = self
            .current
            .take()
            .ok_or(PathDataError::NothingToClose {
                cmd: cmd.op as char,
                offset: cmd.offset,
            })?;
        subpath.push(subpath.start());
        self.last_closed = Some(subpath.end());
        self.done.push(subpath);
        Ok(self)
    }

    fn finish(mut self) -> Path {
        self.flush();
        Path::new(self.done)
    }
}

/// Path data parser operating directly on bytes
#[derive(Debug)]
pub struct PathDataParser<'a> {
    // text containing unparsed path data
    text: &'a [u8],
    // current offset in the text
    offset: usize,
}

impl<'a> PathDataParser<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self { text, offset: 0 }
    }

    /// Byte under the cursor, `None` at the end of input
    fn current(&self) -> Option<u8> {
        self.text.get(self.offset).copied()
    }

    fn advance(&mut self, count: usize) {
        self.offset += count;
    }

    /// Consume insignificant separators
    fn parse_separators(&mut self) {
        while let Some(b' ' | b'\t' | b'\r' | b'\n' | b',') = self.current() {
            self.advance(1);
        }
    }

    /// Consume digits, returns `true` if at least one digit was found
    fn parse_digits(&mut self) -> bool {
        let start = self.offset;
        while let Some(b'0'..=b'9') = self.current() {
            self.advance(1);
        }
        self.offset > start
    }

    /// Consume `+|-` sign
    fn parse_sign(&mut self) {
        if let Some(b'-' | b'+') = self.current() {
            self.advance(1);
        }
    }

    /// Parse single number `[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?`
    fn parse_scalar(&mut self) -> Result<Scalar, PathDataError> {
        let start = self.offset;
        let error = PathDataError::InvalidNumber { offset: start };
        self.parse_sign();
        let whole = self.parse_digits();
        let fraction = match self.current() {
            Some(b'.') => {
                self.advance(1);
                self.parse_digits()
            }
            _ => false,
        };
        if !whole && !fraction {
            return Err(error);
        }
        if let Some(b'e' | b'E') = self.current() {
            self.advance(1);
            self.parse_sign();
            if !self.parse_digits() {
                return Err(error);
            }
        }
        let scalar = std::str::from_utf8(&self.text[start..self.offset])
            .ok()
            .and_then(|text| Scalar::from_str(text).ok())
            .filter(|scalar| scalar.is_finite())
            .ok_or(error)?;
        Ok(scalar)
    }

    /// Greedily parse all numbers following a command letter
    fn parse_args(&mut self) -> Result<Vec<Scalar>, PathDataError> {
        let mut args = Vec::new();
        loop {
            self.parse_separators();
            match self.current() {
                Some(b'0'..=b'9' | b'.' | b'-' | b'+') => args.push(self.parse_scalar()?),
                _ => return Ok(args),
            }
        }
    }

    /// Character starting at the current offset, used for error reporting
    fn current_char(&self) -> char {
        self.text
            .get(self.offset..)
            .and_then(|rest| rest.utf8_chunks().next())
            .and_then(|chunk| chunk.valid().chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// Parse command letter and its arguments, `None` at the end of input
    fn parse_cmd(&mut self) -> Result<Option<Command>, PathDataError> {
        self.parse_separators();
        let offset = self.offset;
        let op = match self.current() {
            None => return Ok(None),
            Some(op) => op,
        };
        if !matches!(
            op,
            b'M' | b'm' | b'L' | b'l' | b'H' | b'h' | b'V' | b'v' | b'Z' | b'z'
        ) {
            return Err(PathDataError::UnknownCommand {
                cmd: self.current_char(),
                offset,
            });
        }
        self.advance(1);
        let args = self.parse_args()?;
        Ok(Some(Command { op, args, offset }))
    }

    /// Parse the whole input into a path
    pub fn parse(mut self) -> Result<Path, PathDataError> {
        let mut state = ParserState::new();
        let mut first = true;
        while let Some(cmd) = self.parse_cmd()? {
            if first && !cmd.is_move_to() {
                return Err(PathDataError::MoveToExpected {
                    cmd: cmd.op as char,
                    offset: cmd.offset,
                });
            }
            first = false;
            cmd.validate()?;
            state = state.apply(&cmd)?;
        }
        Ok(state.finish())
    }
}
