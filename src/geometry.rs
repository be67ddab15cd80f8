use std::{
    fmt,
    ops::{Add, Mul, Sub},
};

pub type Scalar = f64;
pub const EPSILON: f64 = f64::EPSILON;

/// Format floats in a compact way, integral values are printed without fraction
pub fn scalar_fmt(f: &mut fmt::Formatter<'_>, value: Scalar) -> fmt::Result {
    let value_abs = value.abs();
    if value_abs.fract() < EPSILON {
        write!(f, "{}", value.trunc() as i64)
    } else if value_abs > 9999.0 || value_abs <= 0.0001 {
        write!(f, "{:.3e}", value)
    } else {
        let ten: Scalar = 10.0;
        let round = ten.powi(6 - (value_abs.trunc() + 1.0).log10().ceil() as i32);
        write!(f, "{}", (value * round).round() / round)
    }
}

/// 2D point, or a vector when used as a difference of two points.
#[derive(Clone, Copy, PartialEq)]
pub struct Point(pub [Scalar; 2]);

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Point([x, y]) = self;
        scalar_fmt(f, *x)?;
        write!(f, ",")?;
        scalar_fmt(f, *y)
    }
}

impl Point {
    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self([x, y])
    }

    #[inline]
    pub fn x(self) -> Scalar {
        self.0[0]
    }

    #[inline]
    pub fn y(self) -> Scalar {
        self.0[1]
    }

    /// Length of the vector
    pub fn length(self) -> Scalar {
        let Self([x, y]) = self;
        x.hypot(y)
    }

    /// Distance between two points
    pub fn dist(self, other: Self) -> Scalar {
        (self - other).length()
    }

    /// Both coordinates are neither infinite nor NaN
    pub fn is_finite(self) -> bool {
        self.x().is_finite() && self.y().is_finite()
    }

    /// Determine if self is close to the other within the margin of error `eps`
    #[cfg(test)]
    pub(crate) fn is_close_to(self, other: Point, eps: Scalar) -> bool {
        let Self([x0, y0]) = self;
        let Self([x1, y1]) = other;
        (x0 - x1).abs() < eps && (y0 - y1).abs() < eps
    }
}

impl From<(Scalar, Scalar)> for Point {
    #[inline]
    fn from(xy: (Scalar, Scalar)) -> Self {
        Self([xy.0, xy.1])
    }
}

impl Mul<Point> for Scalar {
    type Output = Point;

    #[inline]
    fn mul(self, other: Point) -> Self::Output {
        let Point([x, y]) = other;
        Point([self * x, self * y])
    }
}

impl Add for Point {
    type Output = Point;

    #[inline]
    fn add(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 + x1, y0 + y1])
    }
}

impl Sub for Point {
    type Output = Point;

    #[inline]
    fn sub(self, other: Point) -> Self::Output {
        let Point([x0, y0]) = self;
        let Point([x1, y1]) = other;
        Point([x0 - x1, y0 - y1])
    }
}

/// 2D affine transformation
///
/// Stored as an array [m00, m01, m02, m10, m11, m12] but semantically corresponds to
/// a matrix:
/// ┌             ┐
/// │ m00 m01 m02 │
/// │ m10 m11 m12 │
/// │   0   0   1 │
/// └             ┘
///
/// Builder methods (`translate`, `scale`) apply the new operation *before* self,
/// so `Transform::identity().scale(2.0, 2.0).translate(1.0, 0.0)` first translates
/// then scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform([Scalar; 6]);

impl Default for Transform {
    fn default() -> Self {
        Self([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self::default()
    }

    /// Apply this transformation to a point
    pub fn apply(&self, point: Point) -> Point {
        let Self([m00, m01, m02, m10, m11, m12]) = self;
        let Point([x, y]) = point;
        Point([x * m00 + y * m01 + m02, x * m10 + y * m11 + m12])
    }

    /// Apply translation by `[tx, ty]` before self
    pub fn translate(&self, tx: Scalar, ty: Scalar) -> Self {
        self.matmul(Self([1.0, 0.0, tx, 0.0, 1.0, ty]))
    }

    /// Apply scale transformation by `[sx, sy]` around the origin before self
    pub fn scale(&self, sx: Scalar, sy: Scalar) -> Self {
        self.matmul(Self([sx, 0.0, 0.0, 0.0, sy, 0.0]))
    }

    /// Apply uniform scale by `factor` around point `origin` before self
    pub fn scale_around(&self, factor: Scalar, origin: Point) -> Self {
        self.translate(origin.x(), origin.y())
            .scale(factor, factor)
            .translate(-origin.x(), -origin.y())
    }

    /// Multiply transformations in matrix form
    pub fn matmul(&self, other: Transform) -> Self {
        let Self([s00, s01, s02, s10, s11, s12]) = self;
        let Self([o00, o01, o02, o10, o11, o12]) = other;
        Self([
            s00 * o00 + s01 * o10,
            s00 * o01 + s01 * o11,
            s00 * o02 + s01 * o12 + s02,
            s10 * o00 + s11 * o10,
            s10 * o01 + s11 * o11,
            s10 * o02 + s11 * o12 + s12,
        ])
    }
}

/// Bounding box with sides directed along the axes
#[derive(Clone, Copy, PartialEq)]
pub struct BBox {
    min: Point,
    max: Point,
}

impl BBox {
    /// Construct bounding box which includes points `p0` and `p1`
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        let Point([x0, y0]) = p0.into();
        let Point([x1, y1]) = p1.into();
        Self {
            min: Point([x0.min(x1), y0.min(y1)]),
            max: Point([x0.max(x1), y0.max(y1)]),
        }
    }

    /// Smallest bounding box containing all `points`, `None` if there are none
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(BBox::new(first, first), |bbox, point| bbox.extend(point)))
    }

    /// Point with minimal values of x and y coordinates
    #[inline]
    pub fn min(&self) -> Point {
        self.min
    }

    /// Point with maximal values of x and y coordinates
    #[inline]
    pub fn max(&self) -> Point {
        self.max
    }

    #[inline]
    pub fn width(&self) -> Scalar {
        self.max.x() - self.min.x()
    }

    #[inline]
    pub fn height(&self) -> Scalar {
        self.max.y() - self.min.y()
    }

    /// Extend bounding box so it would contain provided point
    pub fn extend(&self, point: Point) -> Self {
        let Point([x, y]) = point;
        Self {
            min: Point([self.min.x().min(x), self.min.y().min(y)]),
            max: Point([self.max.x().max(x), self.max.y().max(y)]),
        }
    }

}

impl fmt::Debug for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox min={:?} max={:?}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_transform() {
        // translate first, then scale
        let tr = Transform::identity().scale(2.0, -1.0).translate(1.0, 3.0);
        let p = tr.apply(Point::new(1.0, 1.0));
        assert_approx_eq!(p.x(), 4.0);
        assert_approx_eq!(p.y(), -4.0);

        let tr = Transform::identity().scale_around(1.1, Point::new(10.0, 0.0));
        let p = tr.apply(Point::new(0.0, 0.0));
        assert_approx_eq!(p.x(), -1.0, 1e-9);
        assert_approx_eq!(p.y(), 0.0);

        let tr = Transform::identity()
            .translate(5.0, 0.0)
            .matmul(Transform::identity().scale(3.0, 3.0));
        assert!(tr.apply(Point::new(1.0, 1.0)).is_close_to(Point::new(8.0, 3.0), 1e-9));
    }

    #[test]
    fn test_bbox() {
        assert!(BBox::from_points(Vec::new()).is_none());

        let bbox = BBox::from_points(vec![
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
            Point::new(1.0, 1.0),
        ])
        .unwrap();
        assert_eq!(bbox.min(), Point::new(-2.0, -1.0));
        assert_eq!(bbox.max(), Point::new(3.0, 4.0));
        assert_approx_eq!(bbox.width(), 5.0);
        assert_approx_eq!(bbox.height(), 5.0);

        let bbox = bbox.extend(Point::new(10.0, 10.0));
        assert_eq!(bbox.min(), Point::new(-2.0, -1.0));
        assert_eq!(bbox.max(), Point::new(10.0, 10.0));
        assert_eq!(BBox::new((10.0, 10.0), (9.0, 0.0)).min(), Point::new(9.0, 0.0));
        assert_eq!(format!("{:?}", bbox), "BBox min=-2,-1 max=10,10");
    }
}
