use crate::conversions::{dimension_from_zm, geometry_type_from_str, geometry_type_of};
use crate::error::{GpkgError, Result};
use crate::ogc_sql::{
    SQL_LIST_FEATURE_CONTENTS, SQL_SELECT_GEOMETRY_COLUMN_META, sql_sample_geometry,
    sql_table_columns,
};
use crate::types::LayerDescriptor;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use wkb::reader::{Dimension, GeometryType};

use super::geometry::{GeometryDecoder, decode_blob};

const DEFAULT_GEOMETRY_COLUMN: &str = "geom";
const ROWID: &str = "rowid";

/// Read-only directory of the feature layers in a GeoPackage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerCatalog {
    layers: HashMap<String, LayerDescriptor>,
}

struct GeometryColumnMeta {
    column_name: String,
    geometry_type: Option<GeometryType>,
    dimension: Option<Dimension>,
    srs_id: i32,
}

impl LayerCatalog {
    /// Enumerate `gpkg_contents` and describe every feature layer.
    ///
    /// Only an unreadable `gpkg_contents` fails the build. Problems with a
    /// single layer's metadata or sample row are logged and leave the
    /// affected fields at their fallback values.
    pub fn build(conn: &Connection, decoder: &dyn GeometryDecoder) -> Result<Self> {
        let entries = list_feature_contents(conn).map_err(|err| {
            tracing::error!(error = %err, "Failed to read gpkg_contents");
            GpkgError::CatalogUnavailable(err)
        })?;

        let mut layers = HashMap::with_capacity(entries.len());
        for (table_name, contents_srs_id) in entries {
            let descriptor = describe_layer(conn, decoder, &table_name, contents_srs_id);
            tracing::debug!(layer = %descriptor, "Registered gpkg layer");
            layers.insert(table_name, descriptor);
        }

        tracing::info!(count = layers.len(), "Built gpkg layer catalog");
        Ok(Self { layers })
    }

    pub fn get(&self, layer_name: &str) -> Option<&LayerDescriptor> {
        self.layers.get(layer_name)
    }

    /// All layers, sorted by name.
    pub fn layers(&self) -> Vec<&LayerDescriptor> {
        let mut layers: Vec<&LayerDescriptor> = self.layers.values().collect();
        layers.sort_by(|a, b| a.layer_name.cmp(&b.layer_name));
        layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

fn list_feature_contents(conn: &Connection) -> rusqlite::Result<Vec<(String, Option<i32>)>> {
    let mut stmt = conn.prepare(SQL_LIST_FEATURE_CONTENTS)?;
    let entries = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

fn describe_layer(
    conn: &Connection,
    decoder: &dyn GeometryDecoder,
    table_name: &str,
    contents_srs_id: Option<i32>,
) -> LayerDescriptor {
    let meta = geometry_column_meta(conn, table_name).unwrap_or_else(|err| {
        tracing::warn!(layer = table_name, error = %err, "Unreadable gpkg_geometry_columns entry");
        None
    });
    let geometry_column = meta
        .as_ref()
        .map(|m| m.column_name.clone())
        .unwrap_or_else(|| DEFAULT_GEOMETRY_COLUMN.to_string());

    let id_column = integer_primary_key(conn, table_name)
        .unwrap_or_else(|err| {
            tracing::warn!(layer = table_name, error = %err, "Could not resolve primary key");
            None
        })
        .unwrap_or_else(|| ROWID.to_string());

    // gpkg_contents.srs_id is nullable; gpkg_geometry_columns.srs_id is not.
    let srs_id = contents_srs_id
        .or_else(|| meta.as_ref().map(|m| m.srs_id))
        .unwrap_or(0);

    let sampled_geometry_type =
        sample_geometry_type(conn, decoder, table_name, &geometry_column).unwrap_or_else(|err| {
            tracing::warn!(
                layer = table_name,
                error = %err,
                "Failed to decode sample geometry, geometry type left unresolved"
            );
            None
        });

    LayerDescriptor {
        layer_name: table_name.to_string(),
        table_name: table_name.to_string(),
        geometry_column,
        id_column,
        srs_id,
        sampled_geometry_type,
        declared_geometry_type: meta.as_ref().and_then(|m| m.geometry_type),
        geometry_dimension: meta.as_ref().and_then(|m| m.dimension),
    }
}

fn geometry_column_meta(conn: &Connection, table_name: &str) -> Result<Option<GeometryColumnMeta>> {
    let row = conn
        .query_row(SQL_SELECT_GEOMETRY_COLUMN_META, [table_name], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i8>(2)?,
                row.get::<_, i8>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })
        .optional()?;

    let Some((column_name, geometry_type_str, z, m, srs_id)) = row else {
        return Ok(None);
    };

    let geometry_type = geometry_type_from_str(&geometry_type_str).unwrap_or_else(|err| {
        tracing::debug!(layer = table_name, error = %err, "Unknown declared geometry type");
        None
    });

    Ok(Some(GeometryColumnMeta {
        column_name,
        geometry_type,
        dimension: dimension_from_zm(z, m),
        srs_id,
    }))
}

/// The single INTEGER primary key column, if the table has one.
fn integer_primary_key(conn: &Connection, table_name: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(&sql_table_columns(table_name))?;
    let primary_keys = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
            ))
        })?
        .filter(|column| !matches!(column, Ok((_, _, 0))))
        .collect::<rusqlite::Result<Vec<_>>>()?;

    match primary_keys.as_slice() {
        [(name, column_type, _)] if column_type.eq_ignore_ascii_case("INTEGER") => {
            Ok(Some(name.clone()))
        }
        _ => Ok(None),
    }
}

/// Type of the first stored geometry. An empty table or a `NULL` geometry
/// leaves the type unresolved.
fn sample_geometry_type(
    conn: &Connection,
    decoder: &dyn GeometryDecoder,
    table_name: &str,
    geometry_column: &str,
) -> Result<Option<GeometryType>> {
    let sql = sql_sample_geometry(table_name, geometry_column);
    let blob: Option<Option<Vec<u8>>> = conn.query_row(&sql, [], |row| row.get(0)).optional()?;

    let Some(Some(blob)) = blob else {
        tracing::debug!(layer = table_name, "No sample geometry");
        return Ok(None);
    };

    let (_, geometry) = decode_blob(decoder, &blob)?;
    Ok(geometry.as_ref().map(geometry_type_of))
}
