//! GeoPackage feature provider built on top of rusqlite.
//!
//! ## Overview
//!
//! - `GpkgProvider` serves every feature layer of one GeoPackage in a fixed
//!   target coordinate system.
//! - `LayerCatalog` describes the feature layers (table, geometry column,
//!   SRID, geometry type). It is built once and never changes.
//! - `FeatureMaterializer` scans a single layer and produces a
//!   `FeatureCollection` of `FeatureRecord`s.
//! - `GeoPackageHeader` decodes the binary header in front of every stored
//!   geometry.
//!
//! Geometries come out as `geo_types::Geometry<f64>`, already reprojected to
//! the target SRID (EPSG:3857 unless configured otherwise).
//!
//! ## Short usage
//!
//! ```no_run
//! use gpkg_provider::{GpkgProvider, ProviderConfig};
//!
//! let provider = GpkgProvider::open(&ProviderConfig::new("data/example.gpkg"))?;
//! for layer in provider.layers() {
//!     println!("{layer}");
//! }
//!
//! let parks = provider.features("parks")?;
//! for feature in &parks {
//!     let _id = feature.id;
//!     let _geom = &feature.geometry;
//! }
//! # Ok::<(), gpkg_provider::GpkgError>(())
//! ```
//!
//! Rows that cannot be decoded are skipped rather than failing the whole
//! layer. What happened to them is recorded in the collection's report:
//!
//! ```no_run
//! # use gpkg_provider::{GpkgProvider, ProviderConfig};
//! # let provider = GpkgProvider::open(&ProviderConfig::new("data/example.gpkg"))?;
//! let parks = provider.features("parks")?;
//! for skipped in &parks.report.diagnostics {
//!     eprintln!("row {} skipped: {}", skipped.id, skipped.reason);
//! }
//! assert!(parks.report.is_consistent());
//! # Ok::<(), gpkg_provider::GpkgError>(())
//! ```
//!
//! ## Reprojection
//!
//! The built-in `WebMercator` engine only knows EPSG:4326 and EPSG:3857.
//! Anything else needs an engine implementing `Reprojector`:
//!
//! ```no_run
//! use geo_types::Geometry;
//! use gpkg_provider::{GpkgProvider, ProviderConfig, Reprojector, Result, WkbDecoder};
//!
//! struct Identity;
//!
//! impl Reprojector for Identity {
//!     fn reproject(&self, geometry: Geometry<f64>, _: i32, _: i32) -> Result<Geometry<f64>> {
//!         Ok(geometry)
//!     }
//! }
//!
//! let config = ProviderConfig::new("data/example.gpkg").with_target_srid(2056);
//! let provider = GpkgProvider::open_with(&config, Box::new(WkbDecoder), Box::new(Identity))?;
//! # Ok::<(), gpkg_provider::GpkgError>(())
//! ```
//!
//! ## Cancellation
//!
//! A long scan can be stopped from another thread between rows:
//!
//! ```no_run
//! # use gpkg_provider::{GpkgProvider, ProviderConfig};
//! use gpkg_provider::{CancelFlag, GpkgError};
//!
//! # let provider = GpkgProvider::open(&ProviderConfig::new("data/example.gpkg"))?;
//! let cancel = CancelFlag::new();
//! let handle = cancel.clone();
//! std::thread::spawn(move || handle.cancel());
//!
//! match provider.features_with_cancel("roads", &cancel) {
//!     Ok(roads) => println!("{} roads", roads.len()),
//!     Err(GpkgError::Cancelled) => println!("cancelled"),
//!     Err(err) => return Err(err),
//! }
//! # Ok::<(), gpkg_provider::GpkgError>(())
//! ```
mod config;
mod conversions;
mod error;
mod gpkg;
mod ogc_sql;
mod pool;
mod reproject;
mod types;

#[cfg(test)]
mod test_support;

pub use config::{DEFAULT_MAX_IDLE_CONNECTIONS, DEFAULT_TARGET_SRID, ProviderConfig};
pub use error::{GpkgError, Result};
pub use gpkg::{
    ByteOrder, Envelope, EnvelopeKind, FeatureMaterializer, GeoPackageHeader, GeometryDecoder,
    GpkgProvider, LayerCatalog, WkbDecoder,
};
pub use pool::{ConnectionPool, PooledConnection};
pub use reproject::{Reprojector, WEB_MERCATOR, WGS84, WebMercator};
pub use types::{
    CancelFlag, FeatureCollection, FeatureRecord, LayerDescriptor, MaterializeReport,
    RowDiagnostic,
};

pub use wkb::reader::{Dimension, GeometryType};
