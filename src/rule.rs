mod must_be_inside;
mod must_be_snapped;

pub use must_be_inside::InteriorRegion;
pub use must_be_snapped::{Candidate, FeatureIndex, MustBeSnapped, SnapFilter};
