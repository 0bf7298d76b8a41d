use crate::error::{GpkgError, Result};
use geo_types::Geometry;
use wkb::reader::{Dimension, GeometryType};

#[inline]
pub(crate) fn geometry_type_to_str(geometry_type: GeometryType) -> &'static str {
    match geometry_type {
        GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        GeometryType::Point => "POINT",
        GeometryType::LineString => "LINESTRING",
        GeometryType::Polygon => "POLYGON",
        GeometryType::MultiPoint => "MULTIPOINT",
        GeometryType::MultiLineString => "MULTILINESTRING",
        GeometryType::MultiPolygon => "MULTIPOLYGON",
        _ => "GEOMETRY",
    }
}

/// Map `gpkg_geometry_columns.geometry_type_name` to a WKB geometry type.
///
/// The generic `GEOMETRY` name carries no concrete type and maps to `None`.
#[inline]
pub(crate) fn geometry_type_from_str(geometry_type_str: &str) -> Result<Option<GeometryType>> {
    let s = geometry_type_str;
    if s.eq_ignore_ascii_case("GEOMETRY") {
        Ok(None)
    } else if s.eq_ignore_ascii_case("GEOMETRYCOLLECTION") {
        Ok(Some(GeometryType::GeometryCollection))
    } else if s.eq_ignore_ascii_case("POINT") {
        Ok(Some(GeometryType::Point))
    } else if s.eq_ignore_ascii_case("LINESTRING") {
        Ok(Some(GeometryType::LineString))
    } else if s.eq_ignore_ascii_case("POLYGON") {
        Ok(Some(GeometryType::Polygon))
    } else if s.eq_ignore_ascii_case("MULTIPOINT") {
        Ok(Some(GeometryType::MultiPoint))
    } else if s.eq_ignore_ascii_case("MULTILINESTRING") {
        Ok(Some(GeometryType::MultiLineString))
    } else if s.eq_ignore_ascii_case("MULTIPOLYGON") {
        Ok(Some(GeometryType::MultiPolygon))
    } else {
        Err(GpkgError::DecodeFailure(format!(
            "unsupported geometry type name: {geometry_type_str}"
        )))
    }
}

#[inline]
pub(crate) fn dimension_from_zm(z: i8, m: i8) -> Option<Dimension> {
    // z and m are 0 (prohibited), 1 (mandatory) or 2 (optional); optional is
    // reported as present.
    if !(0..=2).contains(&z) || !(0..=2).contains(&m) {
        return None;
    }
    match (z != 0, m != 0) {
        (false, false) => Some(Dimension::Xy),
        (true, false) => Some(Dimension::Xyz),
        (false, true) => Some(Dimension::Xym),
        (true, true) => Some(Dimension::Xyzm),
    }
}

/// Type of an already decoded geometry, in WKB terms.
pub(crate) fn geometry_type_of(geometry: &Geometry<f64>) -> GeometryType {
    match geometry {
        Geometry::Point(_) => GeometryType::Point,
        Geometry::Line(_) | Geometry::LineString(_) => GeometryType::LineString,
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => GeometryType::Polygon,
        Geometry::MultiPoint(_) => GeometryType::MultiPoint,
        Geometry::MultiLineString(_) => GeometryType::MultiLineString,
        Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
    }
}

#[cfg(test)]
mod tests {
    use super::{dimension_from_zm, geometry_type_from_str, geometry_type_of};
    use crate::Result;
    use geo_types::{Geometry, LineString, Point};
    use wkb::reader::{Dimension, GeometryType};

    #[test]
    fn maps_declared_types_and_dimensions() -> Result<()> {
        assert_eq!(geometry_type_from_str("GEOMETRY")?, None);
        assert_eq!(geometry_type_from_str("point")?, Some(GeometryType::Point));
        assert!(geometry_type_from_str("CURVEPOLYGON").is_err());

        assert_eq!(dimension_from_zm(0, 0), Some(Dimension::Xy));
        assert_eq!(dimension_from_zm(2, 0), Some(Dimension::Xyz));
        assert_eq!(dimension_from_zm(1, 1), Some(Dimension::Xyzm));
        assert_eq!(dimension_from_zm(3, 0), None);
        Ok(())
    }

    #[test]
    fn reports_wkb_type_of_decoded_geometries() {
        assert_eq!(
            geometry_type_of(&Geometry::Point(Point::new(0.0, 0.0))),
            GeometryType::Point
        );
        assert_eq!(
            geometry_type_of(&Geometry::LineString(LineString::from(vec![
                (0.0, 0.0),
                (1.0, 1.0)
            ]))),
            GeometryType::LineString
        );
    }
}
