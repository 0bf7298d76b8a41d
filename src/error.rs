use std::error::Error;
use std::fmt;

/// Crate error type for the GeoPackage feature provider.
#[derive(Debug)]
pub enum GpkgError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// The GeoPackage binary header is truncated, has a wrong magic, an
    /// unknown version, or reserved flag bits set.
    MalformedHeader(String),
    /// The envelope indicator code in the header flags is outside 0..=4.
    UnsupportedEnvelope(u8),
    /// The geometry payload following the header could not be decoded.
    /// Errors from the `wkb` crate are reported through this variant.
    DecodeFailure(String),
    /// The reprojection engine could not transform a geometry.
    ReprojectionFailure {
        from_srid: i32,
        to_srid: i32,
        reason: String,
    },
    /// The row scan for a layer could not be started.
    QueryFailure {
        layer_name: String,
        source: rusqlite::Error,
    },
    /// The `gpkg_contents` table could not be read while building the catalog.
    CatalogUnavailable(rusqlite::Error),
    /// Requested layer is not in the catalog.
    UnknownLayer(String),
    /// Materialization was aborted through a `CancelFlag`.
    Cancelled,
}

impl GpkgError {
    /// Whether this error only affects a single row during materialization.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader(_)
                | Self::UnsupportedEnvelope(_)
                | Self::DecodeFailure(_)
        )
    }
}

impl fmt::Display for GpkgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::MalformedHeader(reason) => {
                write!(f, "malformed gpkg geometry header: {reason}")
            }
            Self::UnsupportedEnvelope(code) => {
                write!(f, "unsupported gpkg envelope indicator code: {code}")
            }
            Self::DecodeFailure(reason) => write!(f, "failed to decode geometry: {reason}"),
            Self::ReprojectionFailure {
                from_srid,
                to_srid,
                reason,
            } => write!(
                f,
                "failed to reproject geometry from srid {from_srid} to {to_srid}: {reason}"
            ),
            Self::QueryFailure { layer_name, source } => {
                write!(f, "failed to query layer '{layer_name}': {source}")
            }
            Self::CatalogUnavailable(err) => {
                write!(f, "gpkg_contents is not readable: {err}")
            }
            Self::UnknownLayer(layer_name) => write!(f, "no such layer: {layer_name}"),
            Self::Cancelled => write!(f, "materialization cancelled"),
        }
    }
}

impl Error for GpkgError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::QueryFailure { source, .. } => Some(source),
            Self::CatalogUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for GpkgError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for GpkgError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::DecodeFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GpkgError>;
