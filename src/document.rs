//! SVG document loading
//!
//! Extracts physical size, view box and path data of every `<path>` element
//! which is not a part of a `<clipPath>`.
use crate::{ConfigError, Drawing, Path, PathDataError, Scalar, pipeline::unit_scale, svg};
use roxmltree::Node;
use thiserror::Error;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("root element is `{0}`, expected `svg`")]
    NotSvg(String),
    #[error("missing `{0}` attribute on the root element")]
    MissingAttribute(&'static str),
    #[error("`{name}` has to be a length in millimetres, got `{value}`")]
    InvalidLength { name: &'static str, value: String },
    #[error("invalid `viewBox` attribute `{0}`")]
    InvalidViewBox(String),
    #[error("path #{index}{} is malformed: {source}", .id.as_ref().map(|id| format!(" (id={id})")).unwrap_or_default())]
    Path {
        index: usize,
        id: Option<String>,
        #[source]
        source: PathDataError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// `d` attribute of a single `<path>` element
#[derive(Debug, Clone, PartialEq)]
pub struct PathData {
    pub id: Option<String>,
    pub data: String,
}

/// Parts of an SVG document relevant for plotting
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Physical width in millimetres
    pub width: Scalar,
    /// Physical height in millimetres
    pub height: Scalar,
    /// `[min-x, min-y, width, height]`
    pub viewbox: [Scalar; 4],
    /// Path data in document order
    pub paths: Vec<PathData>,
}

fn is_svg_element(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), None | Some(SVG_NS))
}

/// Parse length with mandatory `mm` suffix, e.g. `210mm` or `12.5mm`
fn parse_mm(name: &'static str, value: &str) -> Result<Scalar, DocumentError> {
    let error = || DocumentError::InvalidLength {
        name,
        value: value.to_owned(),
    };
    let number = value.trim().strip_suffix("mm").ok_or_else(error)?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(error());
    }
    number.parse().map_err(|_| error())
}

fn parse_viewbox(value: &str) -> Result<[Scalar; 4], DocumentError> {
    let error = || DocumentError::InvalidViewBox(value.to_owned());
    let values = value
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<Scalar>().map_err(|_| error()))
        .collect::<Result<Vec<_>, _>>()?;
    values.try_into().map_err(|_| error())
}

impl Document {
    /// Parse SVG document text
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let doc = roxmltree::Document::parse(text)?;
        let root = doc.root_element();
        if !is_svg_element(root, "svg") {
            return Err(DocumentError::NotSvg(root.tag_name().name().to_owned()));
        }
        let attribute = |name: &'static str| {
            root.attribute(name)
                .ok_or(DocumentError::MissingAttribute(name))
        };
        let width = parse_mm("width", attribute("width")?)?;
        let height = parse_mm("height", attribute("height")?)?;
        let viewbox = parse_viewbox(attribute("viewBox")?)?;

        let mut paths = Vec::new();
        for node in root.descendants().filter(|node| is_svg_element(*node, "path")) {
            if node.ancestors().any(|node| is_svg_element(node, "clipPath")) {
                continue;
            }
            let id = node.attribute("id").map(str::to_owned);
            match node.attribute("d") {
                Some(data) => paths.push(PathData {
                    id,
                    data: data.to_owned(),
                }),
                None => tracing::debug!("[document] path without data: {:?}", id),
            }
        }
        tracing::debug!(
            "[document] size={}x{}mm viewbox={:?} paths={}",
            width,
            height,
            viewbox,
            paths.len()
        );

        Ok(Self {
            width,
            height,
            viewbox,
            paths,
        })
    }

    /// Factor converting view box units to millimetres
    pub fn unit_scale(&self) -> Result<Scalar, DocumentError> {
        let [_, _, viewbox_width, viewbox_height] = self.viewbox;
        Ok(unit_scale(
            self.width,
            self.height,
            viewbox_width,
            viewbox_height,
        )?)
    }

    /// Parse all path data into a single path, in document order
    pub fn geometry(&self) -> Result<Path, DocumentError> {
        let mut geometry = Path::empty();
        for (index, path) in self.paths.iter().enumerate() {
            let subpaths = svg::parse(&path.data).map_err(|source| DocumentError::Path {
                index,
                id: path.id.clone(),
                source,
            })?;
            geometry.extend(subpaths);
        }
        Ok(geometry)
    }

    /// Geometry of the whole document converted to millimetres and ordered for plotting
    pub fn drawing(&self, mirror: bool) -> Result<Drawing, DocumentError> {
        let geometry = self.geometry()?;
        Ok(Drawing::new(&geometry, self.unit_scale()?, mirror)?)
    }
}
