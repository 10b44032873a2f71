use crate::{
    algorithm::{EndpointGroups, EndpointKey},
    layer::{AttributeValue, FeatureId, LineFeature},
    rule::InteriorRegion,
};
use itertools::Itertools;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Line features by id, as seen during extraction.
pub type FeatureIndex<'a> = HashMap<FeatureId, &'a LineFeature>;

/// Two lines ending at the same key, inside the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: EndpointKey,
    /// Contributors in ascending id order.
    pub lines: (FeatureId, FeatureId),
    /// Raw field values of `lines.0` and `lines.1` when a field filter is active.
    pub values: Option<(AttributeValue, AttributeValue)>,
}

/// Everything the candidate sweep needs besides the groups.
pub struct SnapFilter<'a> {
    pub features: &'a FeatureIndex<'a>,
    pub field: Option<&'a str>,
    pub region: &'a InteriorRegion,
    pub precision: f64,
}

impl SnapFilter<'_> {
    /// Applies the pair rule, the field rule and containment to one group.
    pub fn check(&self, key: &EndpointKey, ids: impl IntoIterator<Item = FeatureId>) -> Option<Candidate> {
        // One contributor is a dead end, three or more a real junction.
        let (first, second) = ids.into_iter().collect_tuple()?;
        let (Some(feature1), Some(feature2)) =
            (self.features.get(&first), self.features.get(&second))
        else {
            warn!(first, second, "Skipping pair with a line that no longer exists.");
            return None;
        };
        let values = match self.field {
            Some(field) => {
                let (value1, value2) = (feature1.attribute(field), feature2.attribute(field));
                if value1 == value2 {
                    trace!(first, second, %value1, "Equal field values.");
                    return None;
                }
                Some((value1, value2))
            }
            None => None,
        };
        if !self.region.contains(&key.point(self.precision)) {
            trace!(first, second, ?key, "Pair outside the boundary interior.");
            return None;
        }
        Some(Candidate {
            key: *key,
            lines: (first, second),
            values,
        })
    }
}

pub trait MustBeSnapped {
    /// Endpoints where exactly two lines end without being merged.
    fn must_be_snapped(&self, filter: &SnapFilter) -> Vec<Candidate>;
}

impl MustBeSnapped for EndpointGroups {
    fn must_be_snapped(&self, filter: &SnapFilter) -> Vec<Candidate> {
        self.iter()
            .filter_map(|(key, ids)| filter.check(key, ids.iter().copied()))
            .collect()
    }
}
