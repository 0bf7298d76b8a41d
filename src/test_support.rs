//! Fixtures for building small GeoPackages in memory.

use crate::Result;
use crate::gpkg::header::{ByteOrder, EnvelopeKind, MAGIC};
use crate::ogc_sql::{SQL_GPKG_CONTENTS, SQL_GPKG_GEOMETRY_COLUMNS, SQL_GPKG_SPATIAL_REF_SYS};
use geo_traits::GeometryTrait;
use rusqlite::{Connection, params};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn wkb_bytes<G: GeometryTrait<T = f64>>(geometry: &G) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    wkb::writer::write_geometry(&mut buf, geometry, &Default::default())?;
    Ok(buf)
}

pub(crate) fn encode_blob(
    payload: &[u8],
    srs_id: i32,
    byte_order: ByteOrder,
    envelope: EnvelopeKind,
) -> Vec<u8> {
    encode_blob_with_bounds(payload, srs_id, byte_order, envelope, [0.0; 4])
}

/// Prefix `payload` with a GeoPackage header. `bounds` is
/// `[minx, maxx, miny, maxy]`; z and m ranges are written as zero.
pub(crate) fn encode_blob_with_bounds(
    payload: &[u8],
    srs_id: i32,
    byte_order: ByteOrder,
    envelope: EnvelopeKind,
    bounds: [f64; 4],
) -> Vec<u8> {
    let order_bit = match byte_order {
        ByteOrder::BigEndian => 0,
        ByteOrder::LittleEndian => 1,
    };
    let mut blob = Vec::with_capacity(8 + envelope.byte_len() + payload.len());
    blob.extend_from_slice(&MAGIC);
    blob.push(0x00); // version
    blob.push(order_bit | (envelope.code() << 1));

    let mut doubles = bounds.to_vec();
    doubles.resize(envelope.doubles(), 0.0);

    match byte_order {
        ByteOrder::BigEndian => {
            blob.extend_from_slice(&srs_id.to_be_bytes());
            doubles
                .iter()
                .for_each(|v| blob.extend_from_slice(&v.to_be_bytes()));
        }
        ByteOrder::LittleEndian => {
            blob.extend_from_slice(&srs_id.to_le_bytes());
            doubles
                .iter()
                .for_each(|v| blob.extend_from_slice(&v.to_le_bytes()));
        }
    }

    blob.extend_from_slice(payload);
    blob
}

/// Little-endian blob without envelope, like most GeoPackage writers emit.
pub(crate) fn gpkg_blob<G: GeometryTrait<T = f64>>(geometry: &G, srs_id: i32) -> Result<Vec<u8>> {
    let payload = wkb_bytes(geometry)?;
    Ok(encode_blob(
        &payload,
        srs_id,
        ByteOrder::LittleEndian,
        EnvelopeKind::None,
    ))
}

/// Create the metadata tables of an empty GeoPackage.
pub(crate) fn init_metadata(conn: &Connection) -> Result<()> {
    conn.execute_batch(SQL_GPKG_SPATIAL_REF_SYS)?;
    conn.execute_batch(SQL_GPKG_CONTENTS)?;
    conn.execute_batch(SQL_GPKG_GEOMETRY_COLUMNS)?;
    for srs_id in [4326, 3857] {
        conn.execute(
            "INSERT INTO gpkg_spatial_ref_sys \
            (srs_name, srs_id, organization, organization_coordsys_id, definition) \
            VALUES (?1, ?2, 'EPSG', ?2, 'undefined')",
            params![format!("EPSG:{srs_id}"), srs_id],
        )?;
    }
    Ok(())
}

/// Create a feature table with `fid`, `geom` and `name` columns, register
/// it in the metadata tables and insert one row per blob.
pub(crate) fn create_feature_table(
    conn: &Connection,
    table_name: &str,
    srs_id: i32,
    rows: &[Option<Vec<u8>>],
) -> Result<()> {
    conn.execute_batch(&format!(
        r#"CREATE TABLE "{table_name}" (
            fid INTEGER PRIMARY KEY AUTOINCREMENT,
            geom BLOB,
            name TEXT
        )"#
    ))?;
    conn.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id) \
        VALUES (?1, 'features', ?1, ?2)",
        params![table_name, srs_id],
    )?;
    conn.execute(
        "INSERT INTO gpkg_geometry_columns \
        (table_name, column_name, geometry_type_name, srs_id, z, m) \
        VALUES (?1, 'geom', 'GEOMETRY', ?2, 0, 0)",
        params![table_name, srs_id],
    )?;

    let sql = format!(r#"INSERT INTO "{table_name}" (geom, name) VALUES (?1, ?2)"#);
    for (idx, blob) in rows.iter().enumerate() {
        conn.execute(&sql, params![blob, format!("row {idx}")])?;
    }
    Ok(())
}

/// An in-memory GeoPackage with a single feature layer.
pub(crate) fn single_layer(
    table_name: &str,
    srs_id: i32,
    rows: &[Option<Vec<u8>>],
) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_metadata(&conn)?;
    create_feature_table(&conn, table_name, srs_id, rows)?;
    Ok(conn)
}

/// A fresh path in the temp directory. The file is not created.
pub(crate) fn temp_gpkg_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    std::env::temp_dir().join(format!("gpkg_provider_{tag}_{nanos}.gpkg"))
}
