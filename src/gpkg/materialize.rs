use crate::error::{GpkgError, Result};
use crate::ogc_sql::{sql_count_rows, sql_select_features};
use crate::reproject::{ReprojectionAdapter, Reprojector};
use crate::types::{
    CancelFlag, FeatureCollection, FeatureRecord, LayerDescriptor, MaterializeReport,
    RowDiagnostic,
};
use geo_types::Geometry;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::collections::HashMap;

use super::geometry::{GeometryDecoder, decode_blob};

// The scan query always selects these columns in this order.
const ID_INDEX: usize = 0;
const GEOMETRY_INDEX: usize = 1;

// srs_id values GeoPackage reserves for undefined cartesian / geographic systems.
const UNDEFINED_SRS_IDS: [i32; 2] = [-1, 0];

/// Scans a layer and turns every stored geometry into a feature in the
/// target SRS.
pub struct FeatureMaterializer<'a> {
    decoder: &'a dyn GeometryDecoder,
    reprojector: &'a dyn Reprojector,
    target_srid: i32,
}

enum RowOutcome {
    Accepted(Geometry<f64>, i32),
    Skipped(String),
}

impl<'a> FeatureMaterializer<'a> {
    pub fn new(
        decoder: &'a dyn GeometryDecoder,
        reprojector: &'a dyn Reprojector,
        target_srid: i32,
    ) -> Self {
        Self {
            decoder,
            reprojector,
            target_srid,
        }
    }

    /// Build the feature collection for `layer`.
    ///
    /// Rows whose header or payload cannot be decoded are skipped and
    /// recorded in the report. A reprojection failure, a cancelled scan or a
    /// storage error aborts the call without a partial result.
    pub fn materialize(
        &self,
        conn: &Connection,
        layer: &LayerDescriptor,
        cancel: &CancelFlag,
    ) -> Result<FeatureCollection> {
        let layer_name = layer.layer_name.as_str();
        let query_failure = |source: rusqlite::Error| {
            tracing::error!(layer = layer_name, error = %source, "Failed to start layer scan");
            GpkgError::QueryFailure {
                layer_name: layer_name.to_string(),
                source,
            }
        };

        let rows_in_table: i64 = conn
            .query_row(&sql_count_rows(&layer.table_name), [], |row| row.get(0))
            .map_err(query_failure)?;

        let sql = sql_select_features(&layer.table_name, &layer.geometry_column, &layer.id_column);
        let mut stmt = conn.prepare(&sql).map_err(query_failure)?;
        let mut rows = stmt.query([]).map_err(query_failure)?;

        let mut adapter = ReprojectionAdapter::new(self.reprojector, self.target_srid);
        let mut features = Vec::new();
        let mut diagnostics = Vec::new();
        let mut rows_scanned = 0;

        while let Some(row) = rows.next()? {
            if cancel.is_cancelled() {
                tracing::debug!(layer = layer_name, rows_scanned, "Layer scan cancelled");
                return Err(GpkgError::Cancelled);
            }
            rows_scanned += 1;

            let id: i64 = row.get(ID_INDEX)?;
            let outcome = match row.get_ref(GEOMETRY_INDEX)? {
                ValueRef::Blob(blob) => self.decode_row(blob, layer)?,
                other => RowOutcome::Skipped(format!(
                    "geometry column holds {} instead of a blob",
                    other.data_type()
                )),
            };

            match outcome {
                RowOutcome::Accepted(geometry, srs_id) => {
                    let geometry = adapter.apply(geometry, srs_id).map_err(|err| {
                        tracing::error!(
                            layer = layer_name,
                            id,
                            from_srid = srs_id,
                            to_srid = self.target_srid,
                            error = %err,
                            "Reprojection failed, aborting layer"
                        );
                        err
                    })?;
                    features.push(FeatureRecord {
                        id,
                        geometry,
                        tags: HashMap::new(),
                    });
                }
                RowOutcome::Skipped(reason) => {
                    tracing::warn!(layer = layer_name, id, reason = %reason, "Skipping feature");
                    diagnostics.push(RowDiagnostic { id, reason });
                }
            }
        }

        let report = MaterializeReport {
            rows_in_table: usize::try_from(rows_in_table).unwrap_or_default(),
            rows_scanned,
            features_accepted: features.len(),
            reprojected: adapter.invocations(),
            diagnostics,
        };

        if report.rows_scanned != report.features_accepted {
            tracing::warn!(
                layer = layer_name,
                rows_scanned = report.rows_scanned,
                features_accepted = report.features_accepted,
                skipped = report.diagnostics.len(),
                "Feature count doesn't match scanned row count"
            );
        }
        if !report.is_consistent() {
            tracing::error!(layer = layer_name, ?report, "Unaccounted rows in layer scan");
        }
        tracing::debug!(
            layer = layer_name,
            rows_in_table = report.rows_in_table,
            features = report.features_accepted,
            reprojected = report.reprojected,
            "Materialized layer"
        );

        Ok(FeatureCollection {
            layer_name: layer.layer_name.clone(),
            features,
            report,
        })
    }

    fn decode_row(&self, blob: &[u8], layer: &LayerDescriptor) -> Result<RowOutcome> {
        match decode_blob(self.decoder, blob) {
            Ok((header, Some(geometry))) => {
                let srs_id = if UNDEFINED_SRS_IDS.contains(&header.srs_id()) {
                    layer.srs_id
                } else {
                    header.srs_id()
                };
                Ok(RowOutcome::Accepted(geometry, srs_id))
            }
            Ok((_, None)) => Ok(RowOutcome::Skipped(
                "geometry is empty after decoding".to_string(),
            )),
            Err(err) if err.is_row_recoverable() => Ok(RowOutcome::Skipped(err.to_string())),
            Err(err) => Err(err),
        }
    }
}
