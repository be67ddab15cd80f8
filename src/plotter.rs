//! Device command encoder
//!
//! Two dialects are supported, HP-GL and DPML. They only differ in vocabulary,
//! so both are produced from the same list of [`Move`]s.
use crate::{Path, Point, Scalar, utils::round_unsigned};
use std::{fmt, fmt::Write as _, str::FromStr};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Device units per millimetre
pub const UNITS_PER_MM: Scalar = 40.0;

/// Plotter command language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Dialect {
    Hpgl,
    Dpml,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Hpgl => "hpgl",
            Dialect::Dpml => "dpml",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown plotter language `{0}`, expected hpgl or dpml")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hpgl" => Ok(Dialect::Hpgl),
            "dpml" => Ok(Dialect::Dpml),
            _ => Err(UnknownDialect(name.to_owned())),
        }
    }
}

/// Position in device units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DevicePoint {
    pub x: u64,
    pub y: u64,
}

impl DevicePoint {
    /// Convert millimetres to device units, negative values are clamped to zero
    pub fn from_mm(point: Point) -> Self {
        Self {
            x: round_unsigned(point.x() * UNITS_PER_MM),
            y: round_unsigned(point.y() * UNITS_PER_MM),
        }
    }
}

/// Dialect independent device move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    PenUp(DevicePoint),
    PenDown(DevicePoint),
}

/// Convert placed geometry into device moves
///
/// Every sub-path starts with a pen-up move to its first point. The rest of the points
/// are pen-down moves if `pen_down` is set, and are skipped otherwise.
pub fn moves(path: &Path, pen_down: bool) -> Vec<Move> {
    let mut moves = Vec::with_capacity(path.points_count());
    for subpath in path {
        let Some((first, rest)) = subpath.points().split_first() else {
            continue;
        };
        moves.push(Move::PenUp(DevicePoint::from_mm(*first)));
        if pen_down {
            moves.extend(rest.iter().map(|point| Move::PenDown(DevicePoint::from_mm(*point))));
        }
    }
    moves
}

/// Tokens of a single dialect
struct Vocabulary {
    preamble: &'static str,
    pen_up: &'static str,
    pen_down: &'static str,
    separator: &'static str,
    trailer: &'static str,
}

static HPGL: Vocabulary = Vocabulary {
    preamble: "IN;SP1;",
    pen_up: "PU",
    pen_down: "PD",
    separator: ";",
    trailer: "IN;",
};

static DPML: Vocabulary = Vocabulary {
    preamble: " ;:H A L0 EC1",
    pen_up: " U",
    pen_down: " D",
    separator: "",
    trailer: " @ ",
};

impl Vocabulary {
    fn of(dialect: Dialect) -> &'static Vocabulary {
        match dialect {
            Dialect::Hpgl => &HPGL,
            Dialect::Dpml => &DPML,
        }
    }

    fn write_move(&self, out: &mut String, cmd: Move) -> fmt::Result {
        let (prefix, point) = match cmd {
            Move::PenUp(point) => (self.pen_up, point),
            Move::PenDown(point) => (self.pen_down, point),
        };
        write!(out, "{}{},{}{}", prefix, point.x, point.y, self.separator)
    }
}

/// Format device moves in the given dialect
///
/// The final pen-up move parks the pen at `park` before the device is reset.
pub fn format_moves(moves: &[Move], dialect: Dialect, park: DevicePoint) -> String {
    let vocab = Vocabulary::of(dialect);
    let mut out = String::with_capacity(moves.len() * 12 + 32);
    out.push_str(vocab.preamble);
    moves
        .iter()
        .chain(std::iter::once(&Move::PenUp(park)))
        .try_for_each(|cmd| vocab.write_move(&mut out, *cmd))
        .expect("failed in memory write");
    out.push_str(vocab.trailer);
    out
}

/// Encode placed geometry (in millimetres) as a device command string
///
/// Offsets are in millimetres and select the position where the pen is parked
/// after plotting.
pub fn encode(
    path: &Path,
    dialect: Dialect,
    pen_down: bool,
    offset_x: Scalar,
    offset_y: Scalar,
) -> String {
    let moves = moves(path, pen_down);
    let park = DevicePoint::from_mm(Point::new(offset_x, offset_y));
    tracing::debug!(
        "[encode] dialect={} moves={} pen_down={}",
        dialect,
        moves.len(),
        pen_down
    );
    format_moves(&moves, dialect, park)
}
