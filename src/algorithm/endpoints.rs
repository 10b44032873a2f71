use crate::layer::{FeatureId, LineFeature};
use crate::util::{line_parts, open_endpoints};
use geo::{Coord, Point};
use std::collections::{btree_map, BTreeMap, BTreeSet};

/// Identity of an endpoint: the coordinate expressed in multiples of the
/// rounding precision, so that float noise below the precision collapses
/// onto the same key. Ordered by x, then y.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointKey {
    pub x: i64,
    pub y: i64,
}

impl EndpointKey {
    pub fn round(coord: Coord<f64>, precision: f64) -> Self {
        EndpointKey {
            x: (coord.x / precision).round() as i64,
            y: (coord.y / precision).round() as i64,
        }
    }

    /// Back to a coordinate. When the precision is the reciprocal of an
    /// integer (`1e-6`), dividing by that integer gives the double nearest to
    /// the rounded decimal, which `key * precision` does not.
    pub fn coord(&self, precision: f64) -> Coord<f64> {
        match scale(precision) {
            Some(scale) => Coord {
                x: self.x as f64 / scale,
                y: self.y as f64 / scale,
            },
            None => Coord {
                x: self.x as f64 * precision,
                y: self.y as f64 * precision,
            },
        }
    }

    pub fn point(&self, precision: f64) -> Point<f64> {
        self.coord(precision).into()
    }
}

fn scale(precision: f64) -> Option<f64> {
    let scale = (1. / precision).round();
    (scale >= 1. && (scale * precision - 1.).abs() < 1e-12).then_some(scale)
}

/// Rounded (start, end) keys of every open part of a line feature.
pub fn feature_endpoints(feature: &LineFeature, precision: f64) -> Vec<(EndpointKey, EndpointKey)> {
    let Some(geometry) = feature.geometry.as_ref() else {
        return Vec::new();
    };
    line_parts(geometry)
        .iter()
        .filter_map(open_endpoints)
        .map(|(start, end)| {
            (
                EndpointKey::round(start, precision),
                EndpointKey::round(end, precision),
            )
        })
        .collect()
}

/// Endpoint keys mapped to the set of lines terminating there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointGroups(BTreeMap<EndpointKey, BTreeSet<FeatureId>>);

impl EndpointGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that line `id` ends at `key`. Inserting the same pair twice is a no-op.
    pub fn insert(&mut self, key: EndpointKey, id: FeatureId) {
        self.0.entry(key).or_default().insert(id);
    }

    /// Adds both endpoints of every open part of `feature`.
    pub fn insert_feature(&mut self, feature: &LineFeature, precision: f64) {
        for (start, end) in feature_endpoints(feature, precision) {
            self.insert(start, feature.id);
            self.insert(end, feature.id);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, EndpointKey, BTreeSet<FeatureId>> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string, MultiLineString};

    const PRECISION: f64 = 1e-6;

    impl EndpointGroups {
        fn get(&self, key: &EndpointKey) -> Option<&BTreeSet<FeatureId>> {
            self.0.get(key)
        }
    }

    fn groups<'a>(features: impl IntoIterator<Item = &'a LineFeature>) -> EndpointGroups {
        let mut groups = EndpointGroups::new();
        for feature in features {
            groups.insert_feature(feature, PRECISION);
        }
        groups
    }

    #[test]
    fn rounding_collapses_noise() {
        let a = EndpointKey::round(coord! { x: 5.0000001, y: 4.9999999 }, PRECISION);
        let b = EndpointKey::round(coord! { x: 5., y: 5. }, PRECISION);
        assert_eq!(a, b);
        assert_eq!(b, EndpointKey { x: 5_000_000, y: 5_000_000 });
        let c = EndpointKey::round(coord! { x: 5.000002, y: 5. }, PRECISION);
        assert_ne!(a, c);
        assert_eq!(EndpointKey::round(coord! { x: -0.0000004, y: 0. }, PRECISION), EndpointKey { x: 0, y: 0 });
    }

    #[test]
    fn key_back_to_coord() {
        let key = EndpointKey::round(coord! { x: -5.25, y: 7.5 }, PRECISION);
        assert_eq!(key.coord(PRECISION), coord! { x: -5.25, y: 7.5 });
    }

    #[test]
    fn key_back_to_nearest_double() {
        // 100 * 1e-6 is 9.999999999999999e-5, not 0.0001.
        let key = EndpointKey::round(coord! { x: 0.0001, y: 0.000005 }, PRECISION);
        assert_eq!(key, EndpointKey { x: 100, y: 5 });
        assert_eq!(key.coord(PRECISION), coord! { x: 0.0001, y: 0.000005 });
        assert_eq!(
            EndpointKey { x: 1, y: 3 }.coord(0.25),
            coord! { x: 0.25, y: 0.75 }
        );
        let back = EndpointKey { x: 1, y: 3 }.coord(0.3);
        assert!((back.x - 0.3).abs() < 1e-12 && (back.y - 0.9).abs() < 1e-12);
    }

    #[test]
    fn keys_order_by_x_then_y() {
        let mut keys = vec![
            EndpointKey { x: 2, y: 0 },
            EndpointKey { x: 1, y: 5 },
            EndpointKey { x: 1, y: -3 },
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                EndpointKey { x: 1, y: -3 },
                EndpointKey { x: 1, y: 5 },
                EndpointKey { x: 2, y: 0 },
            ]
        );
    }

    #[test]
    fn multipart_endpoints_skip_rings() {
        let feature = LineFeature::new(
            7,
            MultiLineString(vec![
                line_string![(x: 0., y: 0.), (x: 1., y: 0.)],
                line_string![(x: 2., y: 2.), (x: 3., y: 2.), (x: 3., y: 3.), (x: 2., y: 2.)],
                line_string![(x: 4., y: 4.)],
            ]),
        );
        let endpoints = feature_endpoints(&feature, PRECISION);
        assert_eq!(
            endpoints,
            vec![(EndpointKey { x: 0, y: 0 }, EndpointKey { x: 1_000_000, y: 0 })]
        );
    }

    #[test]
    fn no_geometry_no_endpoints() {
        let mut feature = LineFeature::new(1, line_string![(x: 0., y: 0.), (x: 1., y: 0.)]);
        feature.geometry = None;
        assert!(feature_endpoints(&feature, PRECISION).is_empty());
    }

    #[test]
    fn insertion_is_idempotent() {
        let key = EndpointKey { x: 1, y: 1 };
        let mut groups = EndpointGroups::new();
        for id in [1, 1, 2] {
            groups.insert(key, id);
        }
        assert_eq!(groups.get(&key).unwrap().len(), 2);
    }

    #[test]
    fn line_ending_twice_at_same_key_counts_once() {
        // Open in exact coordinates, closed after rounding.
        let feature = LineFeature::new(
            3,
            line_string![(x: 0., y: 0.), (x: 1., y: 1.), (x: 0.0000001, y: 0.)],
        );
        let groups = groups([&feature]);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups.get(&EndpointKey { x: 0, y: 0 }).unwrap(),
            &BTreeSet::from([3])
        );
    }

    #[test]
    fn groups_are_independent_of_order() {
        let a = LineFeature::new(1, line_string![(x: -5., y: 5.), (x: 5., y: 5.)]);
        let b = LineFeature::new(2, line_string![(x: 5., y: 5.), (x: 15., y: 5.)]);
        let forward = groups([&a, &b]);
        let backward = groups([&b, &a]);
        assert_eq!(forward, backward);
        assert_eq!(
            forward.get(&EndpointKey { x: 5_000_000, y: 5_000_000 }).unwrap(),
            &BTreeSet::from([1, 2])
        );
    }
}
