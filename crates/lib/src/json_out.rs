//! CSV to JSON / NDJSON / GeoJSON projection.

use std::io::Write;

use serde_json::map::Map;
use serde_json::Value;
use tabcast_lib_core::columns::match_column;
use tabcast_lib_core::context::ParseContext;
use tabcast_lib_core::datetime::{format_date, format_datetime_iso};
use tabcast_lib_core::errors::{Result, TabError};
use tabcast_lib_core::infer::{ColumnKind, ColumnSchema, TypedTable};
use tabcast_lib_core::value::TypedCell;

#[derive(Debug, Clone, Default)]
pub struct JsonOutOptions {
    /// Pretty-print with this indent width.
    pub indent: Option<usize>,
    /// Output an object keyed by this column instead of an array.
    pub key: Option<String>,
    /// Lat/lon column identifiers; both present selects GeoJSON output.
    pub lat: Option<String>,
    pub lon: Option<String>,
    /// Suppress the computed bounding box.
    pub no_bbox: bool,
    pub crs: Option<String>,
    /// One object per line instead of an array.
    pub ndjson: bool,
    pub zero: bool,
}

pub fn write_json<W: Write>(
    out: &mut W,
    typed: &TypedTable,
    schemas: &[ColumnSchema],
    ctx: &ParseContext,
    options: &JsonOutOptions,
) -> Result<()> {
    if options.lat.is_some() != options.lon.is_some() {
        return Err(TabError::Value(
            "--lat and --lon must be specified together".into(),
        ));
    }
    if options.lat.is_some() {
        return write_geojson(out, typed, schemas, ctx, options);
    }

    let objects: Vec<Map<String, Value>> = typed
        .rows
        .iter()
        .map(|row| row_object(&typed.header, row, schemas, ctx))
        .collect();

    if options.ndjson {
        for object in objects {
            serde_json::to_writer(&mut *out, &Value::Object(object))
                .map_err(|e| TabError::Value(e.to_string()))?;
            out.write_all(b"\n")?;
        }
        return Ok(());
    }

    let value = match &options.key {
        Some(key) => {
            let offset = if options.zero { 0 } else { 1 };
            let key_col = match_column(&typed.header, key, offset)?;
            let mut keyed = Map::new();
            for (object, row) in objects.into_iter().zip(&typed.rows) {
                let k = row[key_col].raw().to_owned();
                if keyed.contains_key(&k) {
                    return Err(TabError::Value(format!(
                        "Value {k} is not unique in the key column."
                    )));
                }
                keyed.insert(k, Value::Object(object));
            }
            Value::Object(keyed)
        }
        None => Value::Array(objects.into_iter().map(Value::Object).collect()),
    };

    render(out, &value, options.indent)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn row_object(
    header: &[String],
    row: &[TypedCell],
    schemas: &[ColumnSchema],
    ctx: &ParseContext,
) -> Map<String, Value> {
    header
        .iter()
        .zip(row)
        .zip(schemas)
        .map(|((name, cell), schema)| (name.clone(), typed_json(cell, schema, ctx)))
        .collect()
}

fn typed_json(cell: &TypedCell, schema: &ColumnSchema, ctx: &ParseContext) -> Value {
    if !ctx.blanks && cell.is_null(ctx) {
        return Value::Null;
    }
    if ctx.no_inference {
        return Value::String(cell.raw().to_owned());
    }
    match schema.kind {
        ColumnKind::Bool => cell
            .bool_value(ctx)
            .map_or_else(|| Value::String(cell.raw().to_owned()), Value::Bool),
        ColumnKind::Number => match cell.number(ctx) {
            Some(v) => number_value(v),
            None => Value::String(cell.raw().to_owned()),
        },
        ColumnKind::DateTime => cell.datetime(ctx).map_or_else(
            || Value::String(cell.raw().to_owned()),
            |e| Value::String(format_datetime_iso(e)),
        ),
        ColumnKind::Date => cell.date(ctx).map_or_else(
            || Value::String(cell.raw().to_owned()),
            |e| Value::String(format_date(e)),
        ),
        ColumnKind::Timedelta => cell.timedelta(ctx).map_or_else(
            || Value::String(cell.raw().to_owned()),
            |td| Value::String(td.canonical.clone()),
        ),
        ColumnKind::Text => Value::String(cell.raw().to_owned()),
    }
}

fn number_value(v: f64) -> Value {
    if !v.is_finite() {
        return Value::Null;
    }
    if v.trunc() == v && v.abs() < 9e15 {
        Value::Number((v as i64).into())
    } else {
        serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

fn write_geojson<W: Write>(
    out: &mut W,
    typed: &TypedTable,
    schemas: &[ColumnSchema],
    ctx: &ParseContext,
    options: &JsonOutOptions,
) -> Result<()> {
    let offset = if options.zero { 0 } else { 1 };
    let lat_col = match_column(&typed.header, options.lat.as_deref().unwrap(), offset)?;
    let lon_col = match_column(&typed.header, options.lon.as_deref().unwrap(), offset)?;
    let key_col = options
        .key
        .as_deref()
        .map(|k| match_column(&typed.header, k, offset))
        .transpose()?;

    let mut features: Vec<Value> = Vec::with_capacity(typed.rows.len());
    let mut bbox: Option<[f64; 4]> = None;

    for row in &typed.rows {
        let lon = row[lon_col].number(ctx);
        let lat = row[lat_col].number(ctx);
        let geometry = match (lon, lat) {
            (Some(lon), Some(lat)) => {
                let b = bbox.get_or_insert([lon, lat, lon, lat]);
                b[0] = b[0].min(lon);
                b[1] = b[1].min(lat);
                b[2] = b[2].max(lon);
                b[3] = b[3].max(lat);
                serde_json::json!({"type": "Point", "coordinates": [lon, lat]})
            }
            _ => Value::Null,
        };

        let mut properties = Map::new();
        for (c, (name, cell)) in typed.header.iter().zip(row).enumerate() {
            if c == lat_col || c == lon_col || Some(c) == key_col {
                continue;
            }
            properties.insert(name.clone(), typed_json(cell, &schemas[c], ctx));
        }

        let mut feature = Map::new();
        feature.insert("type".into(), "Feature".into());
        if let Some(key_col) = key_col {
            feature.insert("id".into(), Value::String(row[key_col].raw().to_owned()));
        }
        feature.insert("properties".into(), Value::Object(properties));
        feature.insert("geometry".into(), geometry);
        features.push(Value::Object(feature));
    }

    let mut collection = Map::new();
    collection.insert("type".into(), "FeatureCollection".into());
    if let Some(crs) = &options.crs {
        collection.insert(
            "crs".into(),
            serde_json::json!({"type": "name", "properties": {"name": crs}}),
        );
    }
    if let (Some(b), false) = (bbox, options.no_bbox) {
        collection.insert("bbox".into(), serde_json::json!([b[0], b[1], b[2], b[3]]));
    }
    collection.insert("features".into(), Value::Array(features));

    render(out, &Value::Object(collection), options.indent)?;
    out.write_all(b"\n")?;
    Ok(())
}

fn render<W: Write>(out: &mut W, value: &Value, indent: Option<usize>) -> Result<()> {
    match indent {
        Some(width) => {
            let pad = " ".repeat(width);
            let formatter = serde_json::ser::PrettyFormatter::with_indent(pad.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut *out, formatter);
            serde::Serialize::serialize(value, &mut ser)
                .map_err(|e| TabError::Value(e.to_string()))
        }
        None => serde_json::to_writer(out, value).map_err(|e| TabError::Value(e.to_string())),
    }
}
