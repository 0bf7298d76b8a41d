use crate::error::{GpkgError, Result};
use geo::CoordsIter;
use geo_traits::to_geo::ToGeoGeometry;
use geo_types::Geometry;
use wkb::reader::Wkb;

use super::header::GeoPackageHeader;

/// Decoder for the payload that follows a GeoPackage header.
///
/// `Ok(None)` means the payload decoded but holds no usable geometry.
pub trait GeometryDecoder: Send + Sync {
    fn decode(&self, blob: &[u8], header: &GeoPackageHeader) -> Result<Option<Geometry<f64>>>;
}

/// Default decoder reading standard WKB with the `wkb` crate.
///
/// Z and M ordinates are dropped. Geometries flagged empty in the header or
/// without any coordinate come back as `None`; a non-finite coordinate is a
/// [`GpkgError::DecodeFailure`].
#[derive(Clone, Copy, Debug, Default)]
pub struct WkbDecoder;

impl GeometryDecoder for WkbDecoder {
    fn decode(&self, blob: &[u8], header: &GeoPackageHeader) -> Result<Option<Geometry<f64>>> {
        if header.is_extended() {
            return Err(GpkgError::DecodeFailure(
                "extended geometry encodings are not supported".to_string(),
            ));
        }
        if header.is_empty_geometry() {
            return Ok(None);
        }

        let wkb = Wkb::try_new(header.payload(blob))?;
        // An empty point has no geo-types counterpart.
        let Some(geometry) = wkb.try_to_geometry() else {
            return Ok(None);
        };
        if geometry.coords_count() == 0 {
            return Ok(None);
        }
        if let Some(coord) = geometry
            .coords_iter()
            .find(|coord| !(coord.x.is_finite() && coord.y.is_finite()))
        {
            return Err(GpkgError::DecodeFailure(format!(
                "non-finite coordinate ({}, {})",
                coord.x, coord.y
            )));
        }
        Ok(Some(geometry))
    }
}

/// Decode a stored blob into its header and geometry.
pub(crate) fn decode_blob(
    decoder: &dyn GeometryDecoder,
    blob: &[u8],
) -> Result<(GeoPackageHeader, Option<Geometry<f64>>)> {
    let header = GeoPackageHeader::decode(blob)?;
    let geometry = decoder.decode(blob, &header)?;
    Ok((header, geometry))
}
