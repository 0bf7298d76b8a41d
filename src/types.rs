use crate::conversions::geometry_type_to_str;
use geo_types::Geometry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wkb::reader::{Dimension, GeometryType};

/// Catalog entry for one feature layer. Immutable once the catalog is built.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDescriptor {
    pub layer_name: String,
    /// Table holding the features. Equal to `layer_name` for GeoPackages.
    pub table_name: String,
    pub geometry_column: String,
    /// Column used as the feature id; `rowid` when the table has no integer
    /// primary key.
    pub id_column: String,
    pub srs_id: i32,
    /// Type of the first stored geometry, `None` when it could not be resolved.
    pub sampled_geometry_type: Option<GeometryType>,
    /// Type declared in `gpkg_geometry_columns`, `None` for generic `GEOMETRY`.
    pub declared_geometry_type: Option<GeometryType>,
    pub geometry_dimension: Option<Dimension>,
}

impl LayerDescriptor {
    /// Sampled type when available, else the declared one.
    pub fn geometry_type(&self) -> Option<GeometryType> {
        self.sampled_geometry_type.or(self.declared_geometry_type)
    }
}

impl fmt::Display for LayerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let geometry_type = self
            .geometry_type()
            .map(geometry_type_to_str)
            .unwrap_or("unresolved");
        write!(
            f,
            "{} ({geometry_type}, srid {})",
            self.layer_name, self.srs_id
        )
    }
}

/// A single feature ready for the tile encoder.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub id: i64,
    /// Geometry expressed in the provider's target SRS.
    pub geometry: Geometry<f64>,
    pub tags: HashMap<String, String>,
}

/// Why a row was left out of a [`FeatureCollection`].
#[derive(Clone, Debug, PartialEq)]
pub struct RowDiagnostic {
    pub id: i64,
    pub reason: String,
}

/// Counters gathered while materializing one layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterializeReport {
    /// Every row in the table, including rows whose geometry is `NULL`.
    pub rows_in_table: usize,
    /// Rows with a non-null geometry returned by the scan.
    pub rows_scanned: usize,
    pub features_accepted: usize,
    /// Number of geometries handed to the reprojection engine.
    pub reprojected: usize,
    pub diagnostics: Vec<RowDiagnostic>,
}

impl MaterializeReport {
    /// Whether every scanned row is accounted for as a feature or a diagnostic.
    pub fn is_consistent(&self) -> bool {
        self.rows_scanned == self.features_accepted + self.diagnostics.len()
    }
}

/// Features of one layer, built fresh for every request.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    pub layer_name: String,
    pub features: Vec<FeatureRecord>,
    pub report: MaterializeReport,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl IntoIterator for FeatureCollection {
    type Item = FeatureRecord;
    type IntoIter = std::vec::IntoIter<FeatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a FeatureRecord;
    type IntoIter = std::slice::Iter<'a, FeatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Shared flag that aborts a running layer scan between rows.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::{CancelFlag, LayerDescriptor, MaterializeReport, RowDiagnostic};
    use wkb::reader::GeometryType;

    fn descriptor() -> LayerDescriptor {
        LayerDescriptor {
            layer_name: "parks".to_string(),
            table_name: "parks".to_string(),
            geometry_column: "geom".to_string(),
            id_column: "fid".to_string(),
            srs_id: 4326,
            sampled_geometry_type: None,
            declared_geometry_type: None,
            geometry_dimension: None,
        }
    }

    #[test]
    fn displays_unresolved_layers() {
        let mut layer = descriptor();
        assert_eq!(layer.to_string(), "parks (unresolved, srid 4326)");

        layer.declared_geometry_type = Some(GeometryType::Polygon);
        assert_eq!(layer.to_string(), "parks (POLYGON, srid 4326)");

        layer.sampled_geometry_type = Some(GeometryType::MultiPolygon);
        assert_eq!(layer.geometry_type(), Some(GeometryType::MultiPolygon));
    }

    #[test]
    fn report_consistency_counts_diagnostics() {
        let mut report = MaterializeReport {
            rows_in_table: 4,
            rows_scanned: 3,
            features_accepted: 2,
            ..Default::default()
        };
        assert!(!report.is_consistent());

        report.diagnostics.push(RowDiagnostic {
            id: 3,
            reason: "bad header".to_string(),
        });
        assert!(report.is_consistent());
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        assert!(!other.is_cancelled());
        flag.cancel();
        assert!(other.is_cancelled());
    }
}
