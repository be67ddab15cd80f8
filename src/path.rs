use crate::{BBox, PathDataError, Point, Transform, svg::PathDataParser};
use std::{fmt, str::FromStr};

/// Continuous polyline: a pen-up move to the first point followed by
/// pen-down moves to every other point.
///
/// Always contains at least one point. A single point sub-path is valid but
/// degenerate, it only positions the pen.
#[derive(Clone, PartialEq)]
pub struct SubPath {
    points: Vec<Point>,
}

impl fmt::Debug for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, point) in self.points.iter().enumerate() {
            let cmd = if index == 0 { "M" } else { " L" };
            write!(f, "{}{:?}", cmd, point)?;
        }
        Ok(())
    }
}

impl SubPath {
    /// Create sub-path from points, `None` if `points` is empty
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Sub-path consisting of a single point
    pub fn from_point(point: Point) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`, sub-paths are never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Only a position without any pen-down stroke
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point)
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    /// Bounding box of all points
    pub fn bbox(&self) -> BBox {
        let start = self.start();
        self.points[1..]
            .iter()
            .fold(BBox::new(start, start), |bbox, point| bbox.extend(*point))
    }

    /// Create transformed copy of the sub-path
    pub fn transform(&self, tr: Transform) -> Self {
        Self {
            points: self.points.iter().map(|point| tr.apply(*point)).collect(),
        }
    }
}

/// Ordered collection of sub-paths
#[derive(Clone, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<SubPath>,
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, subpath) in self.subpaths.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            write!(f, "{:?}", subpath)?;
        }
        Ok(())
    }
}

impl Path {
    pub fn new(subpaths: Vec<SubPath>) -> Self {
        Self { subpaths }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn subpaths(&self) -> &[SubPath] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Total number of points in all sub-paths
    pub fn points_count(&self) -> usize {
        self.subpaths.iter().map(SubPath::len).sum()
    }

    /// Bounding box of all points of all sub-paths, `None` if the path is empty
    pub fn bbox(&self) -> Option<BBox> {
        BBox::from_points(
            self.subpaths
                .iter()
                .flat_map(|subpath| subpath.points().iter().copied()),
        )
    }

    /// Create transformed copy of the path
    pub fn transform(&self, tr: Transform) -> Self {
        Self {
            subpaths: self
                .subpaths
                .iter()
                .map(|subpath| subpath.transform(tr))
                .collect(),
        }
    }

    /// Create a copy with sub-paths ordered by the right edge of their
    /// bounding boxes. Sort is stable so sub-paths with equal right edge
    /// keep their relative order.
    pub fn sorted_by_right_edge(&self) -> Self {
        let mut subpaths = self.subpaths.clone();
        subpaths.sort_by(|a, b| a.bbox().max().x().total_cmp(&b.bbox().max().x()));
        Self { subpaths }
    }
}

impl IntoIterator for Path {
    type Item = SubPath;
    type IntoIter = <Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.into_iter()
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a SubPath;
    type IntoIter = <&'a Vec<SubPath> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.subpaths.iter()
    }
}

impl Extend<SubPath> for Path {
    fn extend<T: IntoIterator<Item = SubPath>>(&mut self, iter: T) {
        self.subpaths.extend(iter)
    }
}

impl FromIterator<SubPath> for Path {
    fn from_iter<T: IntoIterator<Item = SubPath>>(iter: T) -> Self {
        Self {
            subpaths: iter.into_iter().collect(),
        }
    }
}

impl FromStr for Path {
    type Err = PathDataError;

    fn from_str(text: &str) -> Result<Path, Self::Err> {
        PathDataParser::new(text.as_bytes()).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn subpath(points: &[(f64, f64)]) -> SubPath {
        SubPath::new(points.iter().copied().map(Point::from).collect()).unwrap()
    }

    #[test]
    fn test_subpath() {
        assert!(SubPath::new(Vec::new()).is_none());

        let single = SubPath::from_point(Point::new(1.0, 2.0));
        assert!(single.is_degenerate());
        assert_eq!(single.start(), single.end());

        let line = subpath(&[(0.0, 0.0), (3.0, 4.0), (3.0, 4.0)]);
        assert!(!line.is_degenerate());
        assert_eq!(line.len(), 3);
        assert_eq!(format!("{:?}", line), "M0,0 L3,4 L3,4");
    }

    #[test]
    fn test_bbox() {
        assert!(Path::empty().bbox().is_none());

        let path = Path::new(vec![
            subpath(&[(1.0, 1.0), (2.0, -3.0)]),
            subpath(&[(-1.0, 0.5)]),
        ]);
        let bbox = path.bbox().unwrap();
        assert_eq!(bbox.min(), Point::new(-1.0, -3.0));
        assert_eq!(bbox.max(), Point::new(2.0, 1.0));
        assert_approx_eq!(bbox.width(), 3.0);
        assert_eq!(path.points_count(), 3);
    }

    #[test]
    fn test_sorted_by_right_edge() {
        let path = Path::new(vec![
            subpath(&[(0.0, 0.0), (5.0, 0.0)]),
            subpath(&[(1.0, 0.0), (0.0, 1.0)]),
            subpath(&[(3.0, 3.0)]),
            subpath(&[(-2.0, 7.0), (1.0, 7.0)]),
        ]);
        let sorted = path.sorted_by_right_edge();
        let right: Vec<_> = sorted
            .subpaths()
            .iter()
            .map(|subpath| subpath.bbox().max().x())
            .collect();
        assert_eq!(right, vec![1.0, 1.0, 3.0, 5.0]);
        // ties keep their original order
        assert_eq!(sorted.subpaths()[0].start(), Point::new(1.0, 0.0));
        assert_eq!(sorted.subpaths()[1].start(), Point::new(-2.0, 7.0));
    }

    #[test]
    fn test_transform() {
        let path = Path::new(vec![subpath(&[(1.0, 2.0), (3.0, 4.0)])]);
        let moved = path.transform(Transform::identity().translate(1.0, -1.0));
        assert_eq!(format!("{:?}", moved), "M2,1 L4,3");
        // source is untouched
        assert_eq!(format!("{:?}", path), "M1,2 L3,4");
    }
}
