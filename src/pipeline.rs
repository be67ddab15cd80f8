//! Geometry pipeline turning document geometry into placed physical geometry
//!
//! Stages are applied in the following order:
//!  1. document units to millimetres (uniform scale around the origin)
//!  2. optional y-axis mirror
//!  3. left to right ordering of the sub-paths
//!  4. overcut (only when plotting)
//!  5. placement: move to the origin, apply offsets and user scale
//!
//! Stages 1-3 are computed once by [`Drawing::new`], stages 4-5 by [`Drawing::plot`].
use crate::{BBox, EPSILON, Path, Point, Scalar, SubPath, Transform};
use std::fmt;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Invalid plot configuration, reported before any transformation takes place
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scale has to be > 0.0, got {0}")]
    InvalidScale(Scalar),
    #[error("overcut has to be >= 0.0, got {0}")]
    InvalidOvercut(Scalar),
    #[error("offsets have to be finite, got x={x} y={y}")]
    InvalidOffset { x: Scalar, y: Scalar },
    #[error("invalid document size {width}x{height} for view box {viewbox_width}x{viewbox_height}")]
    InvalidUnitScale {
        width: Scalar,
        height: Scalar,
        viewbox_width: Scalar,
        viewbox_height: Scalar,
    },
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// User controlled plot settings
///
/// Offsets and overcut are in millimetres, `scale` is applied last so offsets
/// are scaled together with the drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PlotConfig {
    pub scale: Scalar,
    pub offset_x: Scalar,
    pub offset_y: Scalar,
    pub overcut: Scalar,
    pub mirror_y: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            overcut: 0.0,
            mirror_y: true,
        }
    }
}

impl PlotConfig {
    /// Check that configuration values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConfigError::InvalidScale(self.scale));
        }
        if !(self.overcut.is_finite() && self.overcut >= 0.0) {
            return Err(ConfigError::InvalidOvercut(self.overcut));
        }
        if !(self.offset_x.is_finite() && self.offset_y.is_finite()) {
            return Err(ConfigError::InvalidOffset {
                x: self.offset_x,
                y: self.offset_y,
            });
        }
        Ok(())
    }

    /// Load configuration from JSON, missing fields take default values
    #[cfg(feature = "serde")]
    pub fn from_json(input: impl std::io::Read) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_reader(input).map_err(|error| ConfigError::Load(Box::new(error)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Factor converting document (view box) units to millimetres
///
/// Larger physical dimension selects the view box dimension used as divisor. The
/// same factor is used for both axes, documents whose aspect ratio does not match
/// their view box come out distorted.
pub fn unit_scale(
    width: Scalar,
    height: Scalar,
    viewbox_width: Scalar,
    viewbox_height: Scalar,
) -> Result<Scalar, ConfigError> {
    let scale = if width > height {
        width / viewbox_width
    } else {
        height / viewbox_height
    };
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(ConfigError::InvalidUnitScale {
            width,
            height,
            viewbox_width,
            viewbox_height,
        })
    }
}

/// Stage 1: uniform scale around the origin
pub fn scale_to_physical(path: &Path, unit_scale: Scalar) -> Path {
    path.transform(Transform::identity().scale(unit_scale, unit_scale))
}

/// Stage 2: flip y axis, plotters have y growing in the opposite direction
pub fn mirror_y(path: &Path) -> Path {
    path.transform(Transform::identity().scale(1.0, -1.0))
}

/// Stage 3: order sub-paths left to right by their right edge
pub fn order_for_plot(path: &Path) -> Path {
    path.sorted_by_right_edge()
}

/// New position of `point` after extending segment `anchor -> point` by `overcut`
fn extend_segment(point: Point, anchor: Point, overcut: Scalar) -> Option<Point> {
    let length = point.dist(anchor);
    if length < EPSILON {
        return None;
    }
    let factor = (length + overcut) / length;
    Some(Transform::identity().scale_around(factor, anchor).apply(point))
}

/// Stage 4: extend first segment backwards and last segment forwards by `overcut`
///
/// Sub-paths with a single point and zero length end segments have no direction
/// to extend along and are left as is.
pub fn apply_overcut(path: &Path, overcut: Scalar) -> Path {
    if overcut == 0.0 {
        return path.clone();
    }
    path.subpaths()
        .iter()
        .map(|subpath| overcut_subpath(subpath, overcut))
        .collect()
}

fn overcut_subpath(subpath: &SubPath, overcut: Scalar) -> SubPath {
    let mut subpath = subpath.clone();
    if subpath.is_degenerate() {
        tracing::trace!("[overcut] skipping single point sub-path {:?}", subpath);
        return subpath;
    }
    let points = subpath.points_mut();
    let last = points.len() - 1;
    match extend_segment(points[0], points[1], overcut) {
        Some(start) => points[0] = start,
        None => tracing::trace!("[overcut] zero length first segment at {:?}", points[0]),
    }
    // sees already extended start if the sub-path has only two points
    match extend_segment(points[last], points[last - 1], overcut) {
        Some(end) => points[last] = end,
        None => tracing::trace!("[overcut] zero length last segment at {:?}", points[last]),
    }
    subpath
}

/// Stage 5: move `bounds` minimum to the origin, apply offsets, then user scale
pub fn place(path: &Path, bounds: BBox, config: &PlotConfig) -> Path {
    let min = bounds.min();
    let tr = Transform::identity()
        .scale(config.scale, config.scale)
        .translate(config.offset_x, config.offset_y)
        .translate(-min.x(), -min.y());
    path.transform(tr)
}

/// Run the whole pipeline on document geometry
pub fn transform_geometry(
    path: &Path,
    unit_scale: Scalar,
    config: &PlotConfig,
) -> Result<Path, ConfigError> {
    Drawing::new(path, unit_scale, config.mirror_y)?.plot(config)
}

/// Document geometry converted to millimetres and ordered for plotting
#[derive(Debug, Clone)]
pub struct Drawing {
    path: Path,
    bounds: Option<BBox>,
}

impl Drawing {
    /// Apply unit scale, mirror and ordering stages
    pub fn new(path: &Path, unit_scale: Scalar, mirror: bool) -> Result<Self, ConfigError> {
        if !(unit_scale.is_finite() && unit_scale > 0.0) {
            return Err(ConfigError::InvalidScale(unit_scale));
        }
        let _span = tracing::debug_span!("[drawing]", unit_scale, mirror).entered();
        let mut path = scale_to_physical(path, unit_scale);
        if mirror {
            path = mirror_y(&path);
        }
        let path = order_for_plot(&path);
        let bounds = path.bbox();
        tracing::debug!(
            "[drawing] subpaths={} points={} bounds={:?}",
            path.subpaths().len(),
            path.points_count(),
            bounds
        );
        Ok(Self { path, bounds })
    }

    /// Ordered geometry in millimetres
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bounds of the geometry before overcut, `None` if there is nothing to plot
    pub fn bounds(&self) -> Option<BBox> {
        self.bounds
    }

    pub fn width(&self) -> Scalar {
        self.bounds.map_or(0.0, |bbox| bbox.width())
    }

    pub fn height(&self) -> Scalar {
        self.bounds.map_or(0.0, |bbox| bbox.height())
    }

    /// Apply overcut and placement stages
    pub fn plot(&self, config: &PlotConfig) -> Result<Path, ConfigError> {
        config.validate()?;
        let _span = tracing::debug_span!("[plot]", overcut = config.overcut).entered();
        let bounds = match self.bounds {
            None => return Ok(Path::empty()),
            Some(bounds) => bounds,
        };
        let path = apply_overcut(&self.path, config.overcut);
        Ok(place(&path, bounds, config))
    }

    /// Corners of the area that [`Drawing::plot`] would occupy, without overcut
    ///
    /// Every corner is a separate single point sub-path, so the outline is traced
    /// with pen-up moves only.
    pub fn bounds_outline(&self, config: &PlotConfig) -> Result<Path, ConfigError> {
        config.validate()?;
        let (width, height) = (self.width(), self.height());
        let tr = Transform::identity()
            .scale(config.scale, config.scale)
            .translate(config.offset_x, config.offset_y);
        Ok([
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
            Point::new(0.0, 0.0),
        ]
        .into_iter()
        .map(|corner| SubPath::from_point(tr.apply(corner)))
        .collect())
    }

    /// Drawing size and plot extents for display
    pub fn summary(&self, config: &PlotConfig) -> Result<Summary, ConfigError> {
        config.validate()?;
        let min = Point::new(config.offset_x, config.offset_y);
        let max = min + Point::new(self.width(), self.height());
        Ok(Summary {
            width: self.width(),
            height: self.height(),
            extents: BBox::new(config.scale * min, config.scale * max),
            config: *config,
        })
    }
}

/// Human readable description of a drawing and where it will be plotted
#[derive(Debug, Clone, Copy)]
pub struct Summary {
    pub width: Scalar,
    pub height: Scalar,
    pub extents: BBox,
    pub config: PlotConfig,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min = self.extents.min();
        let max = self.extents.max();
        writeln!(
            f,
            "Path:      width: {:.2}mm  height: {:.2}mm",
            self.width, self.height
        )?;
        writeln!(
            f,
            "Settings:  scale: {:.3}  offset x: {:.2}mm  offset y: {:.2}mm  overcut: {:.2}mm",
            self.config.scale, self.config.offset_x, self.config.offset_y, self.config.overcut
        )?;
        write!(
            f,
            "Plot:      minx: {:.2}mm  miny: {:.2}mm  maxx: {:.2}mm  maxy: {:.2}mm",
            min.x(),
            min.y(),
            max.x(),
            max.y()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn path(text: &str) -> Path {
        text.parse().unwrap()
    }

    /// Placed points as `x,y` pairs, sub-paths separated by `|`
    fn points(path: &Path) -> String {
        path.subpaths()
            .iter()
            .map(|subpath| {
                subpath
                    .points()
                    .iter()
                    .map(|point| format!("{:?}", point))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    #[test]
    fn test_unit_scale() -> Result<(), ConfigError> {
        // width is larger, width / viewbox width
        assert_approx_eq!(unit_scale(200.0, 100.0, 400.0, 300.0)?, 0.5);
        // height is larger or equal, height / viewbox height
        assert_approx_eq!(unit_scale(100.0, 100.0, 400.0, 50.0)?, 2.0);
        assert!(unit_scale(100.0, 50.0, 0.0, 10.0).is_err());
        assert!(unit_scale(0.0, 0.0, 10.0, 10.0).is_err());
        Ok(())
    }

    #[test]
    fn test_config_validate() {
        assert!(PlotConfig::default().validate().is_ok());
        let config = PlotConfig {
            scale: 0.0,
            ..PlotConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidScale(_))));
        let config = PlotConfig {
            overcut: -0.5,
            ..PlotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOvercut(_))
        ));
        let config = PlotConfig {
            offset_y: Scalar::NAN,
            ..PlotConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOffset { .. })
        ));

        let drawing = Drawing::new(&path("M0 0 L1 1"), 1.0, true).unwrap();
        let config = PlotConfig {
            scale: -1.0,
            ..PlotConfig::default()
        };
        assert!(drawing.plot(&config).is_err());
        assert!(drawing.bounds_outline(&config).is_err());
        assert!(Drawing::new(&path("M0 0"), 0.0, true).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_json() -> Result<(), ConfigError> {
        let config = PlotConfig::from_json(r#"{"scale": 2.0, "overcut": 0.3}"#.as_bytes())?;
        assert_eq!(
            config,
            PlotConfig {
                scale: 2.0,
                overcut: 0.3,
                ..PlotConfig::default()
            }
        );
        assert!(PlotConfig::from_json(r#"{"scale": -2.0}"#.as_bytes()).is_err());
        assert!(matches!(
            PlotConfig::from_json("{".as_bytes()),
            Err(ConfigError::Load(_))
        ));
        Ok(())
    }

    #[test]
    fn test_overcut() {
        let result = apply_overcut(&path("M0 0 L10 0"), 1.0);
        let points = result.subpaths()[0].points();
        assert_approx_eq!(points[0].x(), -1.0, 1e-9);
        assert_approx_eq!(points[0].y(), 0.0);
        assert_approx_eq!(points[1].x(), 11.0, 1e-9);
        assert_approx_eq!(points[1].y(), 0.0);

        // interior points are untouched, diagonal end segment extended along its direction
        let result = apply_overcut(&path("M0 0 L0 10 L5 10 L8 14"), 0.5);
        let points = result.subpaths()[0].points();
        assert!(points[0].is_close_to(Point::new(0.0, -0.5), 1e-9));
        assert_eq!(points[1], Point::new(0.0, 10.0));
        assert_eq!(points[2], Point::new(5.0, 10.0));
        assert!(points[3].is_close_to(Point::new(8.3, 14.4), 1e-9));

        // closed sub-path is extended at both ends
        let result = apply_overcut(&path("M0 0 L4 0 L4 3 Z"), 1.0);
        let points = result.subpaths()[0].points();
        assert!(points[0].is_close_to(Point::new(-1.0, 0.0), 1e-9));
        assert_eq!(points.len(), 4);
        assert!(points[3].is_close_to(Point::new(-0.8, -0.6), 1e-9));
    }

    #[test]
    fn test_overcut_degenerate() {
        let source = path("M3 3 M1 1 L1 1 L2 1");
        let result = apply_overcut(&source, 2.0);
        assert_eq!(result.subpaths()[0], source.subpaths()[0]);
        let points = result.subpaths()[1].points();
        // zero length first segment is kept
        assert_eq!(points[0], Point::new(1.0, 1.0));
        assert!(points[2].is_close_to(Point::new(4.0, 1.0), 1e-9));

        let source = path("M0 0 L10 0");
        assert_eq!(apply_overcut(&source, 0.0), source);
    }

    #[test]
    fn test_drawing_order_and_mirror() {
        let source = path("M4 0 L5 1 M0 0 L1 2 M2 2 L3 -1");
        let drawing = Drawing::new(&source, 2.0, true).unwrap();
        let right: Vec<_> = drawing
            .path()
            .subpaths()
            .iter()
            .map(|subpath| subpath.bbox().max().x())
            .collect();
        assert_eq!(right, vec![2.0, 6.0, 10.0]);
        assert_eq!(drawing.path().subpaths()[0].end(), Point::new(2.0, -4.0));

        let bounds = drawing.bounds().unwrap();
        assert_eq!(bounds.min(), Point::new(0.0, -4.0));
        assert_eq!(bounds.max(), Point::new(10.0, 2.0));
        assert_approx_eq!(drawing.width(), 10.0);
        assert_approx_eq!(drawing.height(), 6.0);

        let drawing = Drawing::new(&source, 1.0, false).unwrap();
        assert_eq!(drawing.path().subpaths()[0].end(), Point::new(1.0, 2.0));
    }

    #[test]
    fn test_plot_placement() {
        let drawing = Drawing::new(&path("M10 10 L20 10 L20 15"), 1.0, false).unwrap();
        let config = PlotConfig {
            scale: 2.0,
            offset_x: 1.0,
            offset_y: 3.0,
            ..PlotConfig::default()
        };
        let placed = drawing.plot(&config).unwrap();
        assert_eq!(points(&placed), "2,6 22,6 22,16");

        // bounds of the drawing before overcut are used for placement
        let config = PlotConfig {
            overcut: 1.0,
            ..PlotConfig::default()
        };
        let placed = drawing.plot(&config).unwrap();
        let points = placed.subpaths()[0].points();
        assert!(points[0].is_close_to(Point::new(-1.0, 0.0), 1e-9));
        assert!(points[2].is_close_to(Point::new(10.0, 6.0), 1e-9));

        let empty = Drawing::new(&Path::empty(), 1.0, true).unwrap();
        assert!(empty.bounds().is_none());
        assert!(empty.plot(&PlotConfig::default()).unwrap().is_empty());
    }

    #[test]
    fn test_transform_geometry() -> Result<(), ConfigError> {
        let config = PlotConfig {
            offset_x: 5.0,
            ..PlotConfig::default()
        };
        let placed = transform_geometry(&path("M0 0 L2 4"), 0.5, &config)?;
        assert_eq!(points(&placed), "5,2 6,0");
        Ok(())
    }

    #[test]
    fn test_bounds_outline_and_summary() -> Result<(), ConfigError> {
        let drawing = Drawing::new(&path("M1 1 L4 1 L4 3"), 1.0, false)?;
        let config = PlotConfig {
            scale: 2.0,
            offset_x: 1.0,
            offset_y: 0.5,
            overcut: 0.25,
            mirror_y: false,
        };
        let outline = drawing.bounds_outline(&config)?;
        assert_eq!(points(&outline), "2,1|8,1|8,5|2,5|2,1");
        assert!(outline.subpaths().iter().all(SubPath::is_degenerate));

        let summary = drawing.summary(&config)?;
        assert_eq!(
            summary.to_string(),
            "Path:      width: 3.00mm  height: 2.00mm\n\
             Settings:  scale: 2.000  offset x: 1.00mm  offset y: 0.50mm  overcut: 0.25mm\n\
             Plot:      minx: 2.00mm  miny: 1.00mm  maxx: 8.00mm  maxy: 5.00mm"
        );
        Ok(())
    }
}
