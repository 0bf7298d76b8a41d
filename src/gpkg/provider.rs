use crate::config::ProviderConfig;
use crate::error::{GpkgError, Result};
use crate::pool::ConnectionPool;
use crate::reproject::{Reprojector, WebMercator};
use crate::types::{CancelFlag, FeatureCollection, LayerDescriptor};
use rusqlite::Connection;
use std::sync::Arc;

use super::catalog::LayerCatalog;
use super::geometry::{GeometryDecoder, WkbDecoder};
use super::materialize::FeatureMaterializer;

/// Serves the feature layers of one GeoPackage in a fixed target SRS.
///
/// The layer catalog is built once when the provider is created and never
/// changes afterwards, so a provider can be shared between threads and
/// materialize different layers at the same time.
pub struct GpkgProvider {
    pool: ConnectionPool,
    catalog: Arc<LayerCatalog>,
    target_srid: i32,
    decoder: Box<dyn GeometryDecoder>,
    reprojector: Box<dyn Reprojector>,
}

impl GpkgProvider {
    /// Open a GeoPackage file with the WKB decoder and the web mercator engine.
    ///
    /// Example:
    /// ```no_run
    /// use gpkg_provider::{GpkgProvider, ProviderConfig};
    ///
    /// let provider = GpkgProvider::open(&ProviderConfig::new("data/example.gpkg"))?;
    /// for layer in provider.layers() {
    ///     let collection = provider.features(&layer.layer_name)?;
    ///     println!("{layer}: {} features", collection.len());
    /// }
    /// # Ok::<(), gpkg_provider::GpkgError>(())
    /// ```
    pub fn open(config: &ProviderConfig) -> Result<Self> {
        Self::open_with(config, Box::new(WkbDecoder), Box::new(WebMercator))
    }

    /// Open a GeoPackage file with a custom decoder and reprojection engine.
    pub fn open_with(
        config: &ProviderConfig,
        decoder: Box<dyn GeometryDecoder>,
        reprojector: Box<dyn Reprojector>,
    ) -> Result<Self> {
        tracing::debug!(path = %config.path.display(), "Opening gpkg provider");
        let pool = ConnectionPool::open(&config.path, config.max_idle_connections).map_err(
            |err| match err {
                GpkgError::Sql(err) => {
                    tracing::error!(
                        path = %config.path.display(),
                        error = %err,
                        "Error opening gpkg file"
                    );
                    GpkgError::CatalogUnavailable(err)
                }
                other => other,
            },
        )?;
        Self::build(pool, config.target_srid, decoder, reprojector)
    }

    /// Serve an already opened connection, e.g. an in-memory GeoPackage.
    pub fn from_connection(conn: Connection, target_srid: i32) -> Result<Self> {
        Self::from_connection_with(
            conn,
            target_srid,
            Box::new(WkbDecoder),
            Box::new(WebMercator),
        )
    }

    pub fn from_connection_with(
        conn: Connection,
        target_srid: i32,
        decoder: Box<dyn GeometryDecoder>,
        reprojector: Box<dyn Reprojector>,
    ) -> Result<Self> {
        Self::build(
            ConnectionPool::from_connection(conn),
            target_srid,
            decoder,
            reprojector,
        )
    }

    fn build(
        pool: ConnectionPool,
        target_srid: i32,
        decoder: Box<dyn GeometryDecoder>,
        reprojector: Box<dyn Reprojector>,
    ) -> Result<Self> {
        let catalog = {
            let conn = pool.acquire()?;
            LayerCatalog::build(&conn, decoder.as_ref())?
        };

        Ok(Self {
            pool,
            catalog: Arc::new(catalog),
            target_srid,
            decoder,
            reprojector,
        })
    }

    pub fn target_srid(&self) -> i32 {
        self.target_srid
    }

    /// Shared handle to the layer catalog.
    pub fn catalog(&self) -> Arc<LayerCatalog> {
        Arc::clone(&self.catalog)
    }

    /// All feature layers, sorted by name.
    pub fn layers(&self) -> Vec<&LayerDescriptor> {
        self.catalog.layers()
    }

    pub fn layer(&self, layer_name: &str) -> Option<&LayerDescriptor> {
        self.catalog.get(layer_name)
    }

    /// Materialize every feature of a layer in the target SRS.
    pub fn features(&self, layer_name: &str) -> Result<FeatureCollection> {
        self.features_with_cancel(layer_name, &CancelFlag::new())
    }

    /// Like [`features`](Self::features), but checks `cancel` between rows.
    pub fn features_with_cancel(
        &self,
        layer_name: &str,
        cancel: &CancelFlag,
    ) -> Result<FeatureCollection> {
        tracing::debug!(layer = layer_name, "Materializing gpkg layer");
        let layer = self
            .catalog
            .get(layer_name)
            .ok_or_else(|| GpkgError::UnknownLayer(layer_name.to_string()))?;

        let conn = self.pool.acquire()?;
        FeatureMaterializer::new(
            self.decoder.as_ref(),
            self.reprojector.as_ref(),
            self.target_srid,
        )
        .materialize(&conn, layer, cancel)
    }
}
