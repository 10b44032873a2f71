use geo::{
    algorithm::buffer::{BufferStyle, LineJoin},
    Area, Buffer, Contains, HasDimensions, Point, Polygon, Validation,
};
use rstar::{RTree, RTreeObject};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, warn};

/// The region a point has to fall in to be strictly inside the boundary.
///
/// Built once per run. Normally the outer ring shrunk inward by the erosion
/// distance; when the erosion leaves nothing usable (sliver or tiny polygons)
/// it falls back to the outer ring itself.
#[derive(Debug)]
pub enum InteriorRegion {
    Eroded(RTree<Polygon<f64>>),
    Boundary(Polygon<f64>),
}

impl InteriorRegion {
    /// Shrinks the outer ring of `boundary` by `erosion`.
    ///
    /// Corners are approximated with one segment per quarter turn, so the
    /// region is slightly conservative near concave corners. Holes are ignored.
    pub fn erode(boundary: &Polygon<f64>, erosion: f64) -> Self {
        let outer = Polygon::new(boundary.exterior().clone(), vec![]);
        let style = BufferStyle::new(-erosion).line_join(LineJoin::Round(FRAC_PI_2));
        let eroded = outer.buffer_with_style(style);
        if eroded.is_empty() || eroded.unsigned_area() <= 0. || !eroded.is_valid() {
            warn!(
                erosion,
                "Erosion of the boundary is degenerate, testing against the un-eroded polygon."
            );
            return InteriorRegion::Boundary(outer);
        }
        debug!(parts = eroded.0.len(), area = eroded.unsigned_area(), "Eroded boundary.");
        InteriorRegion::Eroded(RTree::bulk_load(eroded.0))
    }

    /// Whether `point` lies in the interior of the region. Points on the region
    /// boundary are outside.
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self {
            InteriorRegion::Eroded(polygons) => polygons
                .locate_in_envelope_intersecting(&point.envelope())
                .any(|polygon| polygon.contains(point)),
            InteriorRegion::Boundary(polygon) => polygon.contains(point),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, InteriorRegion::Boundary(_))
    }
}
