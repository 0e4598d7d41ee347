//! GeoJSON to CSV.
//!
//! A FeatureCollection (or a single Feature) becomes a table with the
//! canonical columns `id, <properties…>, geojson, type, longitude,
//! latitude`. Only Point geometries populate the coordinate columns; every
//! geometry carries its raw JSON in the `geojson` column.

use serde_json::Value;
use tabcast_helpers::IndexSet;
use tabcast_lib_core::errors::{Result, TabError};

use super::json::scalar_text;
use crate::writer::write_row;

pub fn convert_geojson(bytes: &[u8]) -> Result<Vec<u8>> {
    let root: Value = serde_json::from_slice(bytes)
        .map_err(|e| TabError::Format(format!("invalid GeoJSON: {e}")))?;

    let features: Vec<Value> = match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => match root.get("features") {
            Some(Value::Array(features)) => features.clone(),
            _ => {
                return Err(TabError::Format(
                    "the FeatureCollection has no features array".into(),
                ))
            }
        },
        Some("Feature") => vec![root.clone()],
        _ => {
            return Err(TabError::Format(
                "expected a GeoJSON FeatureCollection or Feature".into(),
            ))
        }
    };

    let mut property_names: IndexSet<String> = IndexSet::default();
    for feature in &features {
        if let Some(Value::Object(props)) = feature.get("properties") {
            for name in props.keys() {
                property_names.insert(name.clone());
            }
        }
    }

    let mut header: Vec<String> = Vec::with_capacity(property_names.len() + 5);
    header.push("id".into());
    header.extend(property_names.iter().cloned());
    header.extend(["geojson", "type", "longitude", "latitude"].map(String::from));

    let mut out = Vec::new();
    write_row(&mut out, header.iter())?;

    for feature in &features {
        let mut fields: Vec<String> = Vec::with_capacity(header.len());
        fields.push(feature.get("id").map(scalar_text).unwrap_or_default());
        let props = feature.get("properties").and_then(Value::as_object);
        for name in &property_names {
            fields.push(
                props
                    .and_then(|p| p.get(name))
                    .map(scalar_text)
                    .unwrap_or_default(),
            );
        }

        match feature.get("geometry").filter(|g| !g.is_null()) {
            Some(geometry) => {
                fields.push(geometry.to_string());
                let geom_type = geometry
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                fields.push(geom_type.to_owned());
                let (lon, lat) = point_coordinates(geometry, geom_type);
                fields.push(lon);
                fields.push(lat);
            }
            None => fields.extend([String::new(), String::new(), String::new(), String::new()]),
        }
        write_row(&mut out, fields.iter())?;
    }
    Ok(out)
}

fn point_coordinates(geometry: &Value, geom_type: &str) -> (String, String) {
    if geom_type != "Point" {
        return (String::new(), String::new());
    }
    let Some(coords) = geometry.get("coordinates").and_then(Value::as_array) else {
        return (String::new(), String::new());
    };
    let render = |v: Option<&Value>| -> String {
        match v.and_then(Value::as_f64) {
            // integral coordinates keep a decimal so they stay doubles
            Some(f) if f.trunc() == f => format!("{f:.1}"),
            Some(f) => format!("{f}"),
            None => String::new(),
        }
    };
    (render(coords.first()), render(coords.get(1)))
}
