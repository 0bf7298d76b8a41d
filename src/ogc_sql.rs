// cf. https://www.geopackage.org/spec140/index.html#table_definition_sql

// Feature layers and their declared SRS. Tile pyramids are also listed in
// gpkg_contents but carry no geometry column.
pub(crate) const SQL_LIST_FEATURE_CONTENTS: &str = "
SELECT table_name, srs_id
FROM gpkg_contents
WHERE data_type = 'features'
";

pub(crate) const SQL_SELECT_GEOMETRY_COLUMN_META: &str = "
SELECT column_name, geometry_type_name, z, m, srs_id
FROM gpkg_geometry_columns
WHERE table_name = ?
";

/// Quote an identifier read from the metadata tables.
pub(crate) fn quote_ident(name: &str) -> String {
    format!(r#""{}""#, name.replace('"', r#""""#))
}

pub(crate) fn sql_table_columns(layer_name: &str) -> String {
    format!(
        "SELECT name, type, pk FROM pragma_table_info('{}')",
        layer_name.replace('\'', "''")
    )
}

pub(crate) fn sql_sample_geometry(layer_name: &str, geometry_column: &str) -> String {
    format!(
        "SELECT {} FROM {} LIMIT 1",
        quote_ident(geometry_column),
        quote_ident(layer_name)
    )
}

// No ORDER BY: rows come back in storage order.
pub(crate) fn sql_select_features(
    layer_name: &str,
    geometry_column: &str,
    id_column: &str,
) -> String {
    let geometry_column = quote_ident(geometry_column);
    format!(
        "SELECT {}, {geometry_column} FROM {} WHERE {geometry_column} IS NOT NULL",
        quote_ident(id_column),
        quote_ident(layer_name)
    )
}

pub(crate) fn sql_count_rows(layer_name: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", quote_ident(layer_name))
}

// gpkg_contents: lists all geospatial contents in the package with identifying
// and descriptive metadata for user display and access.
#[cfg(test)]
pub(crate) const SQL_GPKG_CONTENTS: &str = "
CREATE TABLE gpkg_contents (
  table_name TEXT NOT NULL PRIMARY KEY,
  data_type TEXT NOT NULL,
  identifier TEXT UNIQUE,
  description TEXT DEFAULT '',
  last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
  min_x DOUBLE,
  min_y DOUBLE,
  max_x DOUBLE,
  max_y DOUBLE,
  srs_id INTEGER,
  CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
";

// gpkg_geometry_columns: identifies geometry columns and geometry types for
// vector feature user data tables.
#[cfg(test)]
pub(crate) const SQL_GPKG_GEOMETRY_COLUMNS: &str = "
CREATE TABLE gpkg_geometry_columns (
  table_name TEXT NOT NULL,
  column_name TEXT NOT NULL,
  geometry_type_name TEXT NOT NULL,
  srs_id INTEGER NOT NULL,
  z TINYINT NOT NULL,
  m TINYINT NOT NULL,
  CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
  CONSTRAINT uk_gc_table_name UNIQUE (table_name),
  CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
  CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
);
";

// gpkg_spatial_ref_sys: the SRS catalog referenced by gpkg_contents and
// gpkg_geometry_columns to describe spatial reference systems.
#[cfg(test)]
pub(crate) const SQL_GPKG_SPATIAL_REF_SYS: &str = "
CREATE TABLE gpkg_spatial_ref_sys (
  srs_name TEXT NOT NULL,
  srs_id INTEGER PRIMARY KEY,
  organization TEXT NOT NULL,
  organization_coordsys_id INTEGER NOT NULL,
  definition  TEXT NOT NULL,
  description TEXT
);
";

#[cfg(test)]
mod tests {
    use super::{quote_ident, sql_select_features, sql_table_columns};

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("parks"), r#""parks""#);
        assert_eq!(quote_ident(r#"odd"name"#), r#""odd""name""#);
        assert_eq!(
            sql_table_columns("it's"),
            "SELECT name, type, pk FROM pragma_table_info('it''s')"
        );
    }

    #[test]
    fn feature_scan_skips_null_geometries() {
        assert_eq!(
            sql_select_features("parks", "geom", "fid"),
            r#"SELECT "fid", "geom" FROM "parks" WHERE "geom" IS NOT NULL"#
        );
    }
}
