//! Small library that converts SVG line art into pen plotter and vinyl cutter commands.
//!
//! Main features:
//!  - SVG path data parsing (straight line commands only)
//!  - Unit conversion, left to right ordering and overcut of the paths
//!  - HP-GL and DPML command generation
//!
//! ```
//! use svgplot::{Dialect, Drawing, PlotConfig, encode};
//!
//! let geometry: svgplot::Path = "M0 0 L10 0 L10 10 Z".parse()?;
//! let drawing = Drawing::new(&geometry, 1.0, false)?;
//! let config = PlotConfig::default();
//! let placed = drawing.plot(&config)?;
//! let hpgl = encode(&placed, Dialect::Hpgl, true, config.offset_x, config.offset_y);
//! assert_eq!(hpgl, "IN;SP1;PU0,0;PD400,0;PD400,400;PD0,0;PU0,0;IN;");
//! # Ok::<(), svgplot::Error>(())
//! ```
#![deny(warnings)]

mod document;
mod geometry;
mod path;
pub mod pipeline;
pub mod plotter;
pub mod svg;
mod utils;

pub use document::{Document, DocumentError, PathData};
pub use geometry::{BBox, EPSILON, Point, Scalar, Transform, scalar_fmt};
pub use path::{Path, SubPath};
pub use pipeline::{ConfigError, Drawing, PlotConfig, Summary, transform_geometry};
pub use plotter::{Dialect, UnknownDialect, encode};
pub use svg::{PathDataError, PathDataParser};

use thiserror::Error;

/// Any error produced by this crate
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    PathData(#[from] PathDataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Dialect(#[from] UnknownDialect),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
