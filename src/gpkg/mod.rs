//! Reading feature layers out of a GeoPackage.
//!
//! Blobs go through [`header`] first, the WKB payload behind it through a
//! [`GeometryDecoder`]. [`LayerCatalog`] describes the feature tables once,
//! [`FeatureMaterializer`] scans one of them per call and [`GpkgProvider`]
//! ties both to a connection pool.

mod catalog;
mod geometry;
pub(crate) mod header;
mod materialize;
mod provider;

pub use catalog::LayerCatalog;
pub use geometry::{GeometryDecoder, WkbDecoder};
pub use header::{ByteOrder, Envelope, EnvelopeKind, GeoPackageHeader};
pub use materialize::FeatureMaterializer;
pub use provider::GpkgProvider;
