use crate::error::{Result, SnapError};
use geo::{Geometry, HasDimensions, Polygon};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt::Display;

pub type FeatureId = u64;

/// A raw attribute value as found on a feature.
///
/// Equality is typed: two values are equal only if they are the same variant
/// with equal payloads. There is no coercion between numbers and text, and
/// `Integer(1)` differs from `Float(1.0)`.
///
/// `Null` is displayed as `NULL`, not `None`, so `val1`/`val2` of a missing
/// value read `NULL` in the output layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AttributeValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "NULL"),
            AttributeValue::Bool(value) => write!(f, "{value}"),
            AttributeValue::Integer(value) => write!(f, "{value}"),
            AttributeValue::Float(value) => write!(f, "{value}"),
            AttributeValue::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_owned())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry<f64>>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl LineFeature {
    pub fn new(id: FeatureId, geometry: impl Into<Geometry<f64>>) -> Self {
        LineFeature {
            id,
            geometry: Some(geometry.into()),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_owned(), value.into());
        self
    }

    /// Value of `field`, `Null` when the feature does not carry it.
    pub fn attribute(&self, field: &str) -> AttributeValue {
        self.attributes.get(field).cloned().unwrap_or_default()
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry
            .as_ref()
            .is_some_and(|geometry| !geometry.is_empty())
    }
}

/// A line source: features plus the schema the field filter is validated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineLayer {
    pub crs: Option<String>,
    pub fields: Vec<String>,
    pub features: Vec<LineFeature>,
}

impl LineLayer {
    /// Builds a layer whose schema is the union of the features' attribute names.
    pub fn new(crs: Option<String>, features: Vec<LineFeature>) -> Self {
        let fields = features
            .iter()
            .flat_map(|feature| feature.attributes.keys().cloned())
            .unique()
            .collect();
        LineLayer {
            crs,
            fields,
            features,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|name| name == field)
    }

    pub fn check_field(&self, field: &str) -> Result<()> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(SnapError::MissingField {
                field: field.to_owned(),
                available: self.fields.clone(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub id: FeatureId,
    pub geometry: Option<Geometry<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonLayer {
    pub crs: Option<String>,
    pub features: Vec<PolygonFeature>,
}

impl PolygonLayer {
    /// Returns the single selected boundary polygon.
    ///
    /// Exactly one id must be selected and it must resolve to a feature with a
    /// non-empty polygon geometry. A multipolygon with one part counts as that part.
    pub fn select(&self, selection: &[FeatureId]) -> Result<Polygon<f64>> {
        let id = match selection.iter().unique().collect_vec().as_slice() {
            [] => {
                return Err(SnapError::InvalidInput(
                    "no polygon feature selected in the boundary layer".into(),
                ))
            }
            [id] => **id,
            ids => {
                return Err(SnapError::InvalidInput(format!(
                    "please select exactly one polygon feature in the boundary layer ({} selected)",
                    ids.len()
                )))
            }
        };
        let feature = self
            .features
            .iter()
            .find(|feature| feature.id == id)
            .ok_or_else(|| {
                SnapError::InvalidInput(format!("polygon feature {id} does not exist"))
            })?;
        match &feature.geometry {
            None => Err(SnapError::EmptyGeometry),
            Some(geometry) if geometry.is_empty() => Err(SnapError::EmptyGeometry),
            Some(Geometry::Polygon(polygon)) => Ok(polygon.clone()),
            Some(Geometry::MultiPolygon(multipolygon)) if multipolygon.0.len() == 1 => {
                Ok(multipolygon.0[0].clone())
            }
            Some(_) => Err(SnapError::InvalidInput(format!(
                "feature {id} of the boundary layer is not a single polygon"
            ))),
        }
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.iter().map(|feature| feature.id).collect()
    }
}
