use crate::{
    algorithm::EndpointGroups,
    rule::{FeatureIndex, InteriorRegion, MustBeSnapped, SnapFilter},
};
use geo::{HasDimensions, Polygon};
use itertools::Itertools;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info, info_span};

pub mod algorithm;
pub mod config;
pub mod error;
pub mod layer;
pub mod result;
pub mod rule;
pub mod util;

pub use config::{SnapConfig, Tolerance};
pub use error::{Result, SnapError};
pub use layer::{AttributeValue, FeatureId, LineFeature, LineLayer, PolygonFeature, PolygonLayer};
pub use result::{SnapLayer, SnapOutcome, SnapPoint};

/// Observes a run: progress ticks and cooperative cancellation.
///
/// `progress` is called after every line feature and once more when the
/// points are built, so `done` reaches `total`. `is_cancelled` is checked
/// after every line feature.
pub trait Monitor {
    fn progress(&mut self, _done: usize, _total: usize) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Monitor for () {}

/// Cancellation flag that can be shared with another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Monitor for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Inputs of one run.
#[derive(Debug, Clone, Copy)]
pub struct SnapRequest<'a> {
    pub lines: Option<&'a LineLayer>,
    pub boundary: Option<&'a Polygon<f64>>,
    pub field: Option<&'a str>,
    pub tolerance: Tolerance,
}

impl<'a> SnapRequest<'a> {
    pub fn new(lines: &'a LineLayer, boundary: &'a Polygon<f64>) -> Self {
        SnapRequest {
            lines: Some(lines),
            boundary: Some(boundary),
            field: None,
            tolerance: Tolerance::default(),
        }
    }

    pub fn field(mut self, field: Option<&'a str>) -> Self {
        self.field = field;
        self
    }

    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Finds the endpoints shared by exactly two lines strictly inside the boundary.
///
/// All inputs are validated before any line is read. The boundary erosion is
/// computed once, after the endpoint pass, and reused for every pair.
pub fn find_snap_candidates(
    request: &SnapRequest,
    monitor: &mut impl Monitor,
) -> Result<SnapOutcome> {
    let _span = info_span!("snap", field = request.field).entered();
    let lines = request
        .lines
        .ok_or_else(|| SnapError::InvalidInput("no line layer given".into()))?;
    let boundary = request
        .boundary
        .ok_or_else(|| SnapError::InvalidInput("no boundary polygon given".into()))?;
    request.tolerance.validate()?;
    if boundary.is_empty() {
        return Err(SnapError::EmptyGeometry);
    }
    if let Some(field) = request.field {
        lines.check_field(field)?;
    }
    if let Some(id) = lines.features.iter().map(|feature| feature.id).duplicates().next() {
        return Err(SnapError::InvalidInput(format!(
            "line feature id {id} is used more than once"
        )));
    }

    let precision = request.tolerance.rounding_precision;
    let total = lines.features.len() + 1;
    let mut features = FeatureIndex::new();
    let mut groups = EndpointGroups::new();
    for (done, feature) in lines.features.iter().enumerate() {
        if feature.has_geometry() {
            features.insert(feature.id, feature);
            groups.insert_feature(feature, precision);
        }
        monitor.progress(done + 1, total);
        if monitor.is_cancelled() {
            info!(done = done + 1, "Operation canceled by user.");
            return Ok(SnapOutcome::Cancelled);
        }
    }
    debug!(
        features = features.len(),
        endpoints = groups.len(),
        "Collected endpoints."
    );

    let candidates = if groups.is_empty() {
        debug!("No open line endpoints, skipping the boundary erosion.");
        Vec::new()
    } else {
        let region = InteriorRegion::erode(boundary, request.tolerance.erosion_distance);
        groups.must_be_snapped(&SnapFilter {
            features: &features,
            field: request.field,
            region: &region,
            precision,
        })
    };
    let layer = SnapLayer::build(candidates, precision, request.field, lines.crs.clone());
    monitor.progress(total, total);
    info!(candidates = layer.len(), "Finished.");
    Ok(SnapOutcome::from_layer(layer))
}


// Test for the README.md file.
#[cfg(doctest)]
mod test_readme {
    macro_rules! external_doc_test {
        ($x:expr) => {
            #[doc = $x]
            extern "C" {}
        };
    }

    external_doc_test!(include_str!("../README.md"));
}
