use crate::{layer::FeatureId, rule::Candidate};
use colored::Colorize;
use geo::Point;

/// One reported snap location.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapPoint {
    /// Sequential, starting at 1, in coordinate order.
    pub id: usize,
    pub point: Point<f64>,
    pub lines: (FeatureId, FeatureId),
    pub field: Option<String>,
    /// The field values of both lines cast to text.
    pub values: Option<(String, String)>,
}

/// The output point collection with the CRS copied from the line source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapLayer {
    pub crs: Option<String>,
    pub field: Option<String>,
    pub points: Vec<SnapPoint>,
}

impl SnapLayer {
    /// Orders the candidates by coordinate and numbers them from 1.
    pub fn build(
        mut candidates: Vec<Candidate>,
        precision: f64,
        field: Option<&str>,
        crs: Option<String>,
    ) -> Self {
        candidates.sort_by_key(|candidate| candidate.key);
        let points = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| SnapPoint {
                id: index + 1,
                point: candidate.key.point(precision),
                lines: candidate.lines,
                field: field.map(str::to_owned),
                values: candidate
                    .values
                    .map(|(value1, value2)| (value1.to_string(), value2.to_string())),
            })
            .collect();
        SnapLayer {
            crs,
            field: field.map(str::to_owned),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapOutcome {
    Found(SnapLayer),
    /// Finished normally without candidates. The layer carries the CRS and
    /// field so the caller can still create an empty output.
    Empty(SnapLayer),
    Cancelled,
}

impl SnapOutcome {
    pub fn from_layer(layer: SnapLayer) -> Self {
        if layer.is_empty() {
            SnapOutcome::Empty(layer)
        } else {
            SnapOutcome::Found(layer)
        }
    }

    pub fn layer(&self) -> Option<&SnapLayer> {
        match self {
            Self::Found(layer) | Self::Empty(layer) => Some(layer),
            Self::Cancelled => None,
        }
    }

    pub fn unwrap_points(self) -> Vec<SnapPoint> {
        match self {
            Self::Found(layer) => layer.points,
            Self::Empty(_) => panic!("Called unwrap_points on an Empty variant."),
            Self::Cancelled => panic!("Called unwrap_points on a Cancelled variant."),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn message(&self) -> String {
        match self {
            Self::Found(layer) => {
                let mut message = format!("Exported {} candidate point(s)", layer.len());
                if let Some(field) = &layer.field {
                    message.push_str(&format!(" (with differing values in '{field}')"));
                }
                message
            }
            Self::Empty(layer) => {
                let mut message =
                    String::from("No candidate endpoints found inside the selected polygon.");
                if layer.field.is_some() {
                    message.push_str(" (with differing field values).");
                }
                message
            }
            Self::Cancelled => String::from("Operation canceled by user."),
        }
    }

    pub fn summary(&self) {
        let mut summary = String::new();
        summary.push_str(format!("{0: <25}", "Snap Integrator").as_str());
        let message = match self {
            Self::Found(_) => self.message().green(),
            Self::Empty(_) => self.message().normal(),
            Self::Cancelled => self.message().yellow(),
        };
        summary.push_str(format!("{0: >25}", message).as_str());
        println!("{summary}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::EndpointKey;
    use crate::layer::AttributeValue;
    use geo::{coord, point};

    const PRECISION: f64 = 1e-6;

    fn candidate(x: f64, y: f64, lines: (FeatureId, FeatureId)) -> Candidate {
        Candidate {
            key: EndpointKey::round(coord! { x: x, y: y }, PRECISION),
            lines,
            values: None,
        }
    }

    #[test]
    fn ids_follow_coordinates() {
        let candidates = vec![
            candidate(5., 5., (1, 2)),
            candidate(1., 9., (3, 4)),
            candidate(5., 1., (5, 6)),
        ];
        let layer = SnapLayer::build(candidates, PRECISION, None, Some("EPSG:4326".into()));
        let ids_and_lines: Vec<_> = layer.points.iter().map(|point| (point.id, point.lines)).collect();
        assert_eq!(ids_and_lines, vec![(1, (3, 4)), (2, (5, 6)), (3, (1, 2))]);
        assert_eq!(layer.crs.as_deref(), Some("EPSG:4326"));
        let first = layer.points[0].point;
        assert!((first.x() - 1.).abs() < 1e-9 && (first.y() - 9.).abs() < 1e-9);
    }

    #[test]
    fn values_as_text() {
        let mut with_values = candidate(5., 5., (1, 2));
        with_values.values = Some((AttributeValue::from(3_i64), AttributeValue::Null));
        let layer = SnapLayer::build(vec![with_values], PRECISION, Some("lanes"), None);
        let point = &layer.points[0];
        assert_eq!(point.field.as_deref(), Some("lanes"));
        assert_eq!(point.values, Some(("3".into(), "NULL".into())));
        assert_eq!(
            SnapOutcome::from_layer(layer).message(),
            "Exported 1 candidate point(s) (with differing values in 'lanes')"
        );
    }

    #[test]
    fn empty_is_not_found() {
        let layer = SnapLayer::build(vec![], PRECISION, Some("class"), None);
        let outcome = SnapOutcome::from_layer(layer);
        assert!(outcome.is_empty());
        assert_eq!(outcome.layer().unwrap().field.as_deref(), Some("class"));
        assert_eq!(
            outcome.message(),
            "No candidate endpoints found inside the selected polygon. (with differing field values)."
        );
    }

    #[test]
    fn found_points() {
        let layer = SnapLayer::build(vec![candidate(5., 5., (1, 2))], PRECISION, None, None);
        let outcome = SnapOutcome::from_layer(layer);
        assert!(outcome.is_found());
        assert_eq!(outcome.message(), "Exported 1 candidate point(s)");
        let points = outcome.unwrap_points();
        assert_eq!(points[0].id, 1);
        assert!((points[0].point.x() - point! {x: 5., y: 5.}.x()).abs() < 1e-9);
    }

    #[test]
    #[should_panic]
    fn cancelled_has_no_points() {
        SnapOutcome::Cancelled.unwrap_points();
    }
}
