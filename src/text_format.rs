//! A compact text notation for geometry, convenient in tests and examples.
//!
//! Points are written `lat:lng` in degrees and separated by commas. An index
//! is described as `points # polylines # polygons`, where each section holds
//! `|`-separated items. Polygon loops are separated by `;`, and the words
//! `empty` and `full` denote the two polygons without loops.
//!
//! ```
//! let index = orbis::text_format::make_index("1:1 | 2:2 # 0:0, 0:5 # 0:0, 0:5, 5:5 | full").unwrap();
//! assert_eq!(index.num_shapes(), 4);
//! ```

use crate::error::ParseError;
use crate::geometry::shape::{Polygon, Shape};
use crate::index::ShapeIndex;
use crate::math::{from_lat_lng_degrees, Point};

/// Parses a single `lat:lng` pair.
///
/// # Errors
///
/// Returns [`ParseError::InvalidLatLng`] if `s` is not two numbers separated
/// by a colon.
pub fn parse_point(s: &str) -> Result<Point, ParseError> {
    let s = s.trim();
    let invalid = || ParseError::InvalidLatLng(s.to_string());
    let (lat, lng) = s.split_once(':').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Ok(from_lat_lng_degrees(lat, lng))
}

/// Parses a comma-separated list of points. A blank string yields no points.
///
/// # Errors
///
/// See [`parse_point`].
pub fn parse_points(s: &str) -> Result<Vec<Point>, ParseError> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(',').map(parse_point).collect()
}

/// Parses a polygon: `;`-separated loops, or `empty` / `full`.
///
/// # Errors
///
/// Returns an error if a point does not parse or a loop is invalid.
pub fn make_polygon(s: &str) -> Result<Polygon, ParseError> {
    match s.trim() {
        "empty" => Ok(Polygon::empty()),
        "full" => Ok(Polygon::full()),
        loops => {
            let loops = loops
                .split(';')
                .map(parse_points)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Polygon::new(loops)?)
        }
    }
}

/// Builds an index from `points # polylines # polygons`.
///
/// All points form a single shape with id 0 (when there are any); the
/// polylines and then the polygons follow, numbered in order of appearance.
///
/// # Errors
///
/// Returns [`ParseError::SectionCount`] unless there are exactly three
/// sections, or any error from parsing the geometry.
pub fn make_index(s: &str) -> Result<ShapeIndex, ParseError> {
    let sections: Vec<&str> = s.split('#').collect();
    let [points, polylines, polygons] = sections[..] else {
        return Err(ParseError::SectionCount(sections.len()));
    };
    let mut shapes = Vec::new();

    let mut all_points = Vec::new();
    for item in items(points) {
        all_points.extend(parse_points(item)?);
    }
    if !all_points.is_empty() {
        shapes.push(Shape::points(all_points)?);
    }
    for item in items(polylines) {
        shapes.push(Shape::polyline(parse_points(item)?)?);
    }
    for item in items(polygons) {
        shapes.push(Shape::Polygon(make_polygon(item)?));
    }
    Ok(ShapeIndex::new(shapes))
}

fn items(section: &str) -> impl Iterator<Item = &str> {
    section.split('|').map(str::trim).filter(|item| !item.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn points() {
        let p = parse_point(" 10:20 ").unwrap();
        assert_abs_diff_eq!(p, from_lat_lng_degrees(10.0, 20.0));
        assert_eq!(parse_points("0:0, 1:1,2:2").unwrap().len(), 3);
        assert!(parse_points("  ").unwrap().is_empty());
        assert!(matches!(parse_point("10"), Err(ParseError::InvalidLatLng(_))));
        assert!(parse_point("a:1").is_err());
    }

    #[test]
    fn polygons() {
        assert!(make_polygon("empty").unwrap().is_empty());
        assert!(make_polygon(" full ").unwrap().is_full());
        let polygon = make_polygon("0:0, 0:5, 5:5, 5:0; 1:1, 2:1, 2:2").unwrap();
        assert_eq!(polygon.loops().len(), 2);
        assert_eq!(polygon.num_edges(), 7);
        assert!(matches!(
            make_polygon("0:0, 0:5"),
            Err(ParseError::Geometry(_))
        ));
    }

    #[test]
    fn index_sections() {
        let index = make_index("1:1 | 1:2 | 1:3 # 0:0, 0:1 | 1:0, 1:1, 1:2 # empty").unwrap();
        assert_eq!(index.num_shapes(), 4);
        assert_eq!(index.shape(0).unwrap().num_edges(), 3);
        assert_eq!(index.shape(1).unwrap().dimension(), 1);
        assert_eq!(index.shape(2).unwrap().num_edges(), 2);
        assert!(!index.shape(3).unwrap().contains(&from_lat_lng_degrees(0.0, 0.0)));
        assert_eq!(make_index("# #").unwrap().num_shapes(), 0);
        assert!(matches!(make_index("1:1 # 2:2"), Err(ParseError::SectionCount(2))));
    }
}
