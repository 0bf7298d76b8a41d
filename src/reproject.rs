//! Coordinate transforms between the SRS stored in a layer and the SRS the
//! tiles are served in.

use crate::error::{GpkgError, Result};
use geo::MapCoords;
use geo_types::{Coord, Geometry};
use std::f64::consts::PI;

pub const WGS84: i32 = 4326;
pub const WEB_MERCATOR: i32 = 3857;

const EARTH_RADIUS: f64 = 6_378_137.0;
// Latitude at which the spherical mercator square ends.
const MAX_LATITUDE: f64 = 85.051_128_78;

/// Transform engine used when a layer's SRS differs from the target SRS.
pub trait Reprojector: Send + Sync {
    fn reproject(
        &self,
        geometry: Geometry<f64>,
        from_srid: i32,
        to_srid: i32,
    ) -> Result<Geometry<f64>>;
}

/// Spherical mercator engine handling EPSG:4326 <-> EPSG:3857.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebMercator;

impl Reprojector for WebMercator {
    fn reproject(
        &self,
        geometry: Geometry<f64>,
        from_srid: i32,
        to_srid: i32,
    ) -> Result<Geometry<f64>> {
        let failure = |reason: String| GpkgError::ReprojectionFailure {
            from_srid,
            to_srid,
            reason,
        };

        let f: fn(Coord<f64>) -> std::result::Result<Coord<f64>, String> =
            match (from_srid, to_srid) {
                (from, to) if from == to => return Ok(geometry),
                (WGS84, WEB_MERCATOR) => lon_lat_to_mercator,
                (WEB_MERCATOR, WGS84) => mercator_to_lon_lat,
                _ => return Err(failure("unsupported srid pair".to_string())),
            };

        geometry.try_map_coords(f).map_err(failure)
    }
}

fn lon_lat_to_mercator(coord: Coord<f64>) -> std::result::Result<Coord<f64>, String> {
    ensure_finite(coord)?;
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    Ok(Coord {
        x: coord.x.to_radians() * EARTH_RADIUS,
        y: (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS,
    })
}

fn mercator_to_lon_lat(coord: Coord<f64>) -> std::result::Result<Coord<f64>, String> {
    ensure_finite(coord)?;
    Ok(Coord {
        x: (coord.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees(),
    })
}

fn ensure_finite(coord: Coord<f64>) -> std::result::Result<(), String> {
    if coord.x.is_finite() && coord.y.is_finite() {
        Ok(())
    } else {
        Err(format!("non-finite coordinate ({}, {})", coord.x, coord.y))
    }
}

/// Decides per geometry whether the engine needs to run, and counts the
/// invocations of a single materialization call. Every engine error comes
/// out as [`GpkgError::ReprojectionFailure`].
pub(crate) struct ReprojectionAdapter<'a> {
    engine: &'a dyn Reprojector,
    target_srid: i32,
    invocations: usize,
}

impl<'a> ReprojectionAdapter<'a> {
    pub(crate) fn new(engine: &'a dyn Reprojector, target_srid: i32) -> Self {
        Self {
            engine,
            target_srid,
            invocations: 0,
        }
    }

    pub(crate) fn apply(
        &mut self,
        geometry: Geometry<f64>,
        srs_id: i32,
    ) -> Result<Geometry<f64>> {
        if srs_id == self.target_srid {
            return Ok(geometry);
        }
        self.invocations += 1;
        let to_srid = self.target_srid;
        self.engine
            .reproject(geometry, srs_id, to_srid)
            .map_err(|err| match err {
                GpkgError::ReprojectionFailure { .. } => err,
                other => GpkgError::ReprojectionFailure {
                    from_srid: srs_id,
                    to_srid,
                    reason: other.to_string(),
                },
            })
    }

    pub(crate) fn invocations(&self) -> usize {
        self.invocations
    }
}
