use geo::{Coord, Geometry, LineString};
use tracing::warn;

/// Convert Geometry to its LineString parts.
/// Multipart features yield one part per member, non-linear geometries yield nothing.
pub fn line_parts(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::LineString(linestring) => vec![linestring.clone()],
        Geometry::MultiLineString(multilinestring) => multilinestring.0.clone(),
        Geometry::Line(line) => vec![(*line).into()],
        Geometry::GeometryCollection(collection) => {
            collection.iter().flat_map(line_parts).collect()
        }
        _ => {
            warn!("Skipping non-linear geometry in line layer.");
            Vec::new()
        }
    }
}

/// Extract the (start, end) vertices of an open linestring.
///
/// Parts with fewer than two vertices and closed parts (first vertex exactly
/// equal to the last one) have no endpoints.
pub fn open_endpoints(linestring: &LineString<f64>) -> Option<(Coord<f64>, Coord<f64>)> {
    let (first, last) = (linestring.0.first()?, linestring.0.last()?);
    if linestring.0.len() < 2 || first == last {
        return None;
    }
    Some((*first, *last))
}
