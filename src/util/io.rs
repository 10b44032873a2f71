use crate::{
    error::{Result, SnapError},
    layer::{AttributeValue, FeatureId, LineFeature, LineLayer, PolygonFeature, PolygonLayer},
    result::SnapLayer,
};
use geo::Geometry;
use geozero::{geojson::GeoJson, ToGeo, ToJson};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    crs: Option<NamedCrs>,
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct NamedCrs {
    properties: NamedCrsProperties,
}

#[derive(Deserialize)]
struct NamedCrsProperties {
    name: String,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

/// Ids of the features of one collection.
///
/// The integer `id` members are used when every feature has one and they are
/// distinct. Otherwise all features are numbered by their position, so ids
/// never collide.
fn feature_ids(features: &[Feature]) -> Vec<FeatureId> {
    let explicit: Option<Vec<FeatureId>> = features
        .iter()
        .map(|feature| feature.id.as_ref().and_then(Value::as_u64))
        .collect();
    match explicit {
        Some(ids) if ids.iter().all_unique() => ids,
        _ => {
            if features.iter().any(|feature| feature.id.is_some()) {
                warn!("Feature ids are missing, not integers or not unique, numbering features by position.");
            }
            (0..features.len() as FeatureId).collect()
        }
    }
}

impl Feature {
    fn geometry(&self) -> Result<Option<Geometry<f64>>> {
        match &self.geometry {
            None | Some(Value::Null) => Ok(None),
            Some(geometry) => Ok(Some(GeoJson(&geometry.to_string()).to_geo()?)),
        }
    }

    fn attributes(&self) -> BTreeMap<String, AttributeValue> {
        self.properties
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), attribute_value(value)))
            .collect()
    }
}

fn attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(value) => AttributeValue::Bool(*value),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => AttributeValue::Integer(integer),
            None => number
                .as_f64()
                .map_or(AttributeValue::Null, AttributeValue::Float),
        },
        Value::String(text) => AttributeValue::Text(text.clone()),
        other => AttributeValue::Text(other.to_string()),
    }
}

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    if !path.exists() {
        return Err(SnapError::InvalidInput(format!(
            "The provided path {path:?} does not exist"
        )));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn parse_line_layer(content: &str) -> Result<LineLayer> {
    line_layer(serde_json::from_str(content)?)
}

fn line_layer(collection: FeatureCollection) -> Result<LineLayer> {
    let ids = feature_ids(&collection.features);
    let features = collection
        .features
        .iter()
        .zip(ids)
        .map(|(feature, id)| {
            Ok(LineFeature {
                id,
                geometry: feature.geometry()?,
                attributes: feature.attributes(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let crs = collection.crs.map(|crs| crs.properties.name);
    Ok(LineLayer::new(crs, features))
}

pub fn parse_polygon_layer(content: &str) -> Result<PolygonLayer> {
    polygon_layer(serde_json::from_str(content)?)
}

fn polygon_layer(collection: FeatureCollection) -> Result<PolygonLayer> {
    let ids = feature_ids(&collection.features);
    let features = collection
        .features
        .iter()
        .zip(ids)
        .map(|(feature, id)| {
            Ok(PolygonFeature {
                id,
                geometry: feature.geometry()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(PolygonLayer {
        crs: collection.crs.map(|crs| crs.properties.name),
        features,
    })
}

/// Reads a GeoJSON FeatureCollection of (multi)linestrings.
pub fn read_line_layer(path: &Path) -> Result<LineLayer> {
    let layer = line_layer(read_collection(path)?)?;
    debug!(?path, features = layer.features.len(), fields = ?layer.fields, "Read line layer.");
    Ok(layer)
}

/// Reads a GeoJSON FeatureCollection of polygons.
pub fn read_polygon_layer(path: &Path) -> Result<PolygonLayer> {
    let layer = polygon_layer(read_collection(path)?)?;
    debug!(?path, features = layer.features.len(), "Read polygon layer.");
    Ok(layer)
}

pub fn snap_layer_to_geojson(layer: &SnapLayer) -> Result<Value> {
    let features = layer
        .points
        .iter()
        .map(|point| {
            let geometry: Value = serde_json::from_str(&Geometry::Point(point.point).to_json()?)?;
            let mut properties = Map::new();
            properties.insert("id".into(), json!(point.id));
            if let Some(field) = &point.field {
                properties.insert("field".into(), json!(field));
            }
            if let Some((value1, value2)) = &point.values {
                properties.insert("val1".into(), json!(value1));
                properties.insert("val2".into(), json!(value2));
            }
            Ok(json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>>>()?;
    let mut collection = json!({
        "type": "FeatureCollection",
        "name": "SnapIntegrator_Points",
        "features": features,
    });
    if let Some(crs) = &layer.crs {
        collection["crs"] = json!({ "type": "name", "properties": { "name": crs } });
    }
    Ok(collection)
}

/// Writes the candidate points as a GeoJSON FeatureCollection.
pub fn write_snap_layer(layer: &SnapLayer, out_path: &Path) -> Result<()> {
    let collection = snap_layer_to_geojson(layer)?;
    std::fs::write(out_path, serde_json::to_string_pretty(&collection)?)?;
    debug!(?out_path, points = layer.len(), "Wrote snap layer.");
    Ok(())
}
