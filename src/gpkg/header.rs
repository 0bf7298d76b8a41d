use crate::error::{GpkgError, Result};

// cf. https://www.geopackage.org/spec140/index.html#gpb_format
pub(crate) const MAGIC: [u8; 2] = [0x47, 0x50]; // "GP"
const FIXED_HEADER_LEN: usize = 8;

const FLAG_BYTE_ORDER: u8 = 0b0000_0001;
const FLAG_ENVELOPE: u8 = 0b0000_1110;
const FLAG_EMPTY: u8 = 0b0001_0000;
const FLAG_EXTENDED: u8 = 0b0010_0000;
const FLAG_RESERVED: u8 = 0b1100_0000;

/// Byte order declared by bit 0 of the header flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

/// Envelope layout declared by bits 1-3 of the header flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeKind {
    None,
    Xy,
    Xyz,
    Xym,
    Xyzm,
}

impl EnvelopeKind {
    pub(crate) fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Xy),
            2 => Ok(Self::Xyz),
            3 => Ok(Self::Xym),
            4 => Ok(Self::Xyzm),
            _ => Err(GpkgError::UnsupportedEnvelope(code)),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Xy => 1,
            Self::Xyz => 2,
            Self::Xym => 3,
            Self::Xyzm => 4,
        }
    }

    /// Number of doubles stored for this envelope.
    pub fn doubles(self) -> usize {
        match self {
            Self::None => 0,
            Self::Xy => 4, // [minx, maxx, miny, maxy]
            Self::Xyz | Self::Xym => 6, // + [minz, maxz] or [minm, maxm]
            Self::Xyzm => 8, // + [minz, maxz, minm, maxm]
        }
    }

    pub fn byte_len(self) -> usize {
        self.doubles() * 8
    }
}

/// Bounding box stored in the header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub z: Option<(f64, f64)>,
    pub m: Option<(f64, f64)>,
}

/// Parsed GeoPackage binary header that precedes the WKB payload of every
/// stored geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoPackageHeader {
    version: u8,
    flags: u8,
    byte_order: ByteOrder,
    envelope_kind: EnvelopeKind,
    srs_id: i32,
    envelope: Option<Envelope>,
}

impl GeoPackageHeader {
    /// Parse the header at the start of `blob`.
    ///
    /// Only the header bytes are inspected; the payload is left untouched.
    pub fn decode(blob: &[u8]) -> Result<Self> {
        if blob.len() < MAGIC.len() || blob[..2] != MAGIC {
            return Err(GpkgError::MalformedHeader(format!(
                "missing magic bytes (got {:02x?})",
                &blob[..blob.len().min(2)]
            )));
        }
        if blob.len() < 4 {
            return Err(truncated(blob.len(), FIXED_HEADER_LEN));
        }

        let version = blob[2];
        if version != 0 {
            return Err(GpkgError::MalformedHeader(format!(
                "unsupported version {version}"
            )));
        }

        let flags = blob[3];
        if flags & FLAG_RESERVED != 0 {
            return Err(GpkgError::MalformedHeader(format!(
                "reserved flag bits set: {flags:#04x}"
            )));
        }
        let envelope_kind = EnvelopeKind::from_code((flags & FLAG_ENVELOPE) >> 1)?;
        let byte_order = if flags & FLAG_BYTE_ORDER == 0 {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        };

        let len = FIXED_HEADER_LEN + envelope_kind.byte_len();
        if blob.len() < len {
            return Err(truncated(blob.len(), len));
        }

        let srs_id = read_i32(&blob[4..8], byte_order);
        let envelope = read_envelope(&blob[FIXED_HEADER_LEN..len], envelope_kind, byte_order);

        Ok(Self {
            version,
            flags,
            byte_order,
            envelope_kind,
            srs_id,
            envelope,
        })
    }

    /// Total byte length of the header, which is also the payload offset.
    pub fn header_len(&self) -> usize {
        FIXED_HEADER_LEN + self.envelope_kind.byte_len()
    }

    /// Slice the geometry payload that follows this header.
    pub fn payload<'a>(&self, blob: &'a [u8]) -> &'a [u8] {
        &blob[self.header_len().min(blob.len())..]
    }

    pub fn srs_id(&self) -> i32 {
        self.srs_id
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn envelope_kind(&self) -> EnvelopeKind {
        self.envelope_kind
    }

    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Whether the empty-geometry flag (bit 4) is set.
    pub fn is_empty_geometry(&self) -> bool {
        self.flags & FLAG_EMPTY != 0
    }

    /// Whether the payload uses the GeoPackage extension geometry encoding (bit 5).
    pub fn is_extended(&self) -> bool {
        self.flags & FLAG_EXTENDED != 0
    }
}

fn truncated(len: usize, required: usize) -> GpkgError {
    GpkgError::MalformedHeader(format!(
        "truncated header: got {len} bytes, required {required}"
    ))
}

fn read_i32(b: &[u8], byte_order: ByteOrder) -> i32 {
    let bytes = [b[0], b[1], b[2], b[3]];
    match byte_order {
        ByteOrder::BigEndian => i32::from_be_bytes(bytes),
        ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
    }
}

fn read_f64s(b: &[u8], byte_order: ByteOrder) -> Vec<f64> {
    b.chunks_exact(8)
        .map(|chunk| {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            match byte_order {
                ByteOrder::BigEndian => f64::from_be_bytes(bytes),
                ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
            }
        })
        .collect()
}

fn read_envelope(b: &[u8], kind: EnvelopeKind, byte_order: ByteOrder) -> Option<Envelope> {
    if kind == EnvelopeKind::None {
        return None;
    }

    let v = read_f64s(b, byte_order);
    let (z, m) = match kind {
        EnvelopeKind::Xyz => (Some((v[4], v[5])), None),
        EnvelopeKind::Xym => (None, Some((v[4], v[5]))),
        EnvelopeKind::Xyzm => (Some((v[4], v[5])), Some((v[6], v[7]))),
        _ => (None, None),
    };

    Some(Envelope {
        min_x: v[0],
        max_x: v[1],
        min_y: v[2],
        max_y: v[3],
        z,
        m,
    })
}

#[cfg(test)]
mod tests {
    use super::{ByteOrder, EnvelopeKind, GeoPackageHeader};
    use crate::Result;
    use crate::error::GpkgError;
    use crate::test_support::{encode_blob, encode_blob_with_bounds, wkb_bytes};
    use geo_types::{LineString, Point};
    use wkb::reader::{GeometryType, Wkb};

    const ALL_ENVELOPES: [EnvelopeKind; 5] = [
        EnvelopeKind::None,
        EnvelopeKind::Xy,
        EnvelopeKind::Xyz,
        EnvelopeKind::Xym,
        EnvelopeKind::Xyzm,
    ];

    #[test]
    fn payload_offset_matches_header_len_for_every_layout() -> Result<()> {
        let line = LineString::from(vec![(0.0, 0.0), (1.5, 1.0), (2.0, 0.5)]);
        let payload = wkb_bytes(&line)?;

        for byte_order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            for kind in ALL_ENVELOPES {
                let blob = encode_blob(&payload, 4326, byte_order, kind);
                let header = GeoPackageHeader::decode(&blob)?;

                assert_eq!(header.header_len(), 8 + kind.byte_len());
                assert_eq!(header.envelope_kind(), kind);
                assert_eq!(header.byte_order(), byte_order);
                assert_eq!(header.srs_id(), 4326);

                let wkb = Wkb::try_new(header.payload(&blob))?;
                assert_eq!(wkb.geometry_type(), GeometryType::LineString);
                assert_eq!(wkb.buf(), payload.as_slice());
            }
        }
        Ok(())
    }

    #[test]
    fn reads_envelope_values_in_declared_byte_order() -> Result<()> {
        let payload = wkb_bytes(&Point::new(1.0, 2.0))?;
        let blob = encode_blob_with_bounds(
            &payload,
            3857,
            ByteOrder::BigEndian,
            EnvelopeKind::Xyzm,
            [1.0, 1.0, 2.0, 2.0],
        );
        let header = GeoPackageHeader::decode(&blob)?;

        let envelope = header.envelope().expect("envelope");
        assert_eq!(envelope.min_x, 1.0);
        assert_eq!(envelope.max_x, 1.0);
        assert_eq!(envelope.min_y, 2.0);
        assert_eq!(envelope.max_y, 2.0);
        assert!(envelope.z.is_some());
        assert!(envelope.m.is_some());
        assert_eq!(header.srs_id(), 3857);
        Ok(())
    }

    #[test]
    fn negative_srs_id_is_preserved() -> Result<()> {
        let payload = wkb_bytes(&Point::new(0.0, 0.0))?;
        let blob = encode_blob(&payload, -1, ByteOrder::LittleEndian, EnvelopeKind::None);
        assert_eq!(GeoPackageHeader::decode(&blob)?.srs_id(), -1);
        Ok(())
    }

    #[test]
    fn truncated_input_is_malformed() -> Result<()> {
        let payload = wkb_bytes(&Point::new(0.0, 0.0))?;
        for kind in ALL_ENVELOPES {
            let blob = encode_blob(&payload, 4326, ByteOrder::LittleEndian, kind);
            let header_len = 8 + kind.byte_len();
            for len in 0..header_len {
                let result = GeoPackageHeader::decode(&blob[..len]);
                assert!(
                    matches!(result, Err(GpkgError::MalformedHeader(_))),
                    "len {len} with {kind:?} gave {result:?}"
                );
            }
        }
        Ok(())
    }

    #[test]
    fn corrupted_magic_is_malformed() -> Result<()> {
        let payload = wkb_bytes(&Point::new(0.0, 0.0))?;
        let blob = encode_blob(&payload, 4326, ByteOrder::LittleEndian, EnvelopeKind::Xy);

        for idx in 0..2 {
            let mut corrupted = blob.clone();
            corrupted[idx] ^= 0xFF;
            for len in 0..=corrupted.len() {
                assert!(matches!(
                    GeoPackageHeader::decode(&corrupted[..len]),
                    Err(GpkgError::MalformedHeader(_))
                ));
            }
        }
        Ok(())
    }

    #[test]
    fn reserved_bits_and_version_are_rejected() {
        let mut blob = vec![0x47, 0x50, 0x00, 0x41, 0, 0, 0, 0];
        assert!(matches!(
            GeoPackageHeader::decode(&blob),
            Err(GpkgError::MalformedHeader(_))
        ));

        blob[3] = 0x01;
        blob[2] = 0x01;
        assert!(matches!(
            GeoPackageHeader::decode(&blob),
            Err(GpkgError::MalformedHeader(_))
        ));
    }

    #[test]
    fn envelope_codes_above_four_are_unsupported() {
        for code in 5u8..=7 {
            let mut blob = vec![0x47, 0x50, 0x00, 0x01 | (code << 1), 0, 0, 0, 0];
            blob.extend_from_slice(&[0; 64]);
            let result = GeoPackageHeader::decode(&blob);
            assert!(
                matches!(result, Err(GpkgError::UnsupportedEnvelope(c)) if c == code),
                "code {code} gave {result:?}"
            );
        }
    }

    #[test]
    fn exposes_empty_and_extended_flags() -> Result<()> {
        let blob = vec![0x47, 0x50, 0x00, 0x01 | 0x10 | 0x20, 0xE6, 0x10, 0, 0];
        let header = GeoPackageHeader::decode(&blob)?;
        assert!(header.is_empty_geometry());
        assert!(header.is_extended());
        assert_eq!(header.srs_id(), 4326);
        assert!(header.payload(&blob).is_empty());
        Ok(())
    }
}
