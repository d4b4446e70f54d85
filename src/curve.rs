//! Decoder for the curve tracer's binary curve transfer.
//!
//! A curve transfer starts with a 25-character ASCII identification string
//! (`CURVE CURVID:"INDEX 9",%`), followed by a two-byte count of the data
//! bytes to follow plus one, the point data itself, and a final checksum
//! byte. Each of the (typically 1024) points is four bytes: two for the
//! 10-bit X coordinate and two for the 10-bit Y coordinate, both unsigned
//! big-endian. The first point is the first sample of the sweep; the last
//! conventionally lands near the origin.

use crate::error::CurveError;
use crate::preamble::WaveformPreamble;

/// Length of the ASCII identification string at the head of a transfer.
pub const HEAD_LEN: usize = 25;
/// Length of the byte-count field which follows the head.
pub const LENGTH_FIELD_LEN: usize = 2;
/// Length of the trailing checksum.
pub const CHECKSUM_LEN: usize = 1;
/// Each sample is two big-endian bytes of X followed by two of Y.
pub const BYTES_PER_POINT: usize = 4;

/// One decoded curve: the raw transfer plus the derived coordinate lists.
/// Constructed once per fetch; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    preamble: WaveformPreamble,
    raw: Vec<u8>,
    coordinates: Vec<(i64, i64)>,
    points: Vec<(f64, f64)>,
}

impl Curve {
    /// Total transfer size for a curve of `sample_count` points.
    pub const fn expected_len(sample_count: usize) -> usize {
        HEAD_LEN + LENGTH_FIELD_LEN + sample_count * BYTES_PER_POINT + CHECKSUM_LEN
    }

    /// Decode a raw transfer using the scaling information in `preamble`.
    ///
    /// Point data is walked in strides of [`BYTES_PER_POINT`]; a trailing
    /// partial stride is ignored. The preamble offsets are removed from the
    /// raw integers and the result clamped at zero *before* the scale
    /// factors are applied.
    pub fn decode(preamble: WaveformPreamble, raw: Vec<u8>) -> Result<Self, CurveError> {
        let need = HEAD_LEN + LENGTH_FIELD_LEN + CHECKSUM_LEN;
        if raw.len() < need {
            return Err(CurveError::TooShort {
                got: raw.len(),
                need,
            });
        }
        let point_data = &raw[HEAD_LEN + LENGTH_FIELD_LEN..raw.len() - CHECKSUM_LEN];

        let mut coordinates = Vec::with_capacity(point_data.len() / BYTES_PER_POINT);
        let mut points = Vec::with_capacity(point_data.len() / BYTES_PER_POINT);
        let mut offset = 0;
        while offset + BYTES_PER_POINT <= point_data.len() {
            let raw_x = u16::from_be_bytes([point_data[offset], point_data[offset + 1]]) as i64;
            let raw_y =
                u16::from_be_bytes([point_data[offset + 2], point_data[offset + 3]]) as i64;
            let coord_x = (raw_x - preamble.horizontal_offset).max(0);
            let coord_y = (raw_y - preamble.vertical_offset).max(0);
            coordinates.push((coord_x, coord_y));
            points.push((
                coord_x as f64 * preamble.x_scale_factor,
                coord_y as f64 * preamble.y_scale_factor,
            ));
            offset += BYTES_PER_POINT;
        }

        Ok(Self {
            preamble,
            raw,
            coordinates,
            points,
        })
    }

    /// Offset-adjusted integer coordinates, in sweep order.
    pub fn coordinates(&self) -> &[(i64, i64)] {
        &self.coordinates
    }

    /// Calibrated (x, y) points in electrical units, in sweep order.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn preamble(&self) -> &WaveformPreamble {
        &self.preamble
    }

    /// The raw transfer, including head, length field and checksum byte.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Verify the trailing checksum byte: the length field, point data and
    /// checksum sum to a multiple of 256.
    ///
    /// Decoding deliberately does not require this to hold - transfers are
    /// normally trusted to the transport layer. Callers that want
    /// end-to-end verification can opt in.
    pub fn checksum_ok(&self) -> bool {
        self.raw[HEAD_LEN..]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preamble(x_scale: f64, y_scale: f64, h_offset: i64, v_offset: i64) -> WaveformPreamble {
        WaveformPreamble {
            sample_count: 1,
            x_scale_factor: x_scale,
            y_scale_factor: y_scale,
            horizontal_offset: h_offset,
            vertical_offset: v_offset,
            horizontal_units: "V".into(),
            vertical_units: "A".into(),
            horizontal_range: x_scale * 1024.0,
            vertical_range: y_scale * 1024.0,
            step_size: 5.0,
            step_offset: 0.0,
        }
    }

    /// Assemble a transfer around the given point data, with a checksum
    /// byte that makes the trailing sum come out to zero.
    fn transfer(point_data: &[u8]) -> Vec<u8> {
        let mut raw = vec![b'%'; HEAD_LEN];
        let length = (point_data.len() + 1) as u16;
        raw.extend_from_slice(&length.to_be_bytes());
        raw.extend_from_slice(point_data);
        let sum = raw[HEAD_LEN..]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_add(b));
        raw.push(0u8.wrapping_sub(sum));
        raw
    }

    #[test]
    fn identity_scale_single_point() {
        let curve = Curve::decode(
            preamble(1.0, 1.0, 0, 0),
            transfer(&[0, 10, 0, 20]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(10, 20)]);
        assert_eq!(curve.points(), &[(10.0, 20.0)]);
    }

    #[test]
    fn offsets_are_removed_before_scaling() {
        let curve = Curve::decode(
            preamble(0.5, 2.0, 4, 5),
            transfer(&[0, 10, 0, 20]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(6, 15)]);
        assert_eq!(curve.points(), &[(3.0, 30.0)]);
    }

    #[test]
    fn coordinates_clamp_at_zero() {
        // Raw values below the offsets decode to zero, never negative.
        let curve = Curve::decode(
            preamble(1.0, 1.0, 100, 100),
            transfer(&[0, 10, 0, 20]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(0, 0)]);
        assert_eq!(curve.points(), &[(0.0, 0.0)]);
    }

    #[test]
    fn points_keep_sweep_order() {
        let curve = Curve::decode(
            preamble(1.0, 1.0, 0, 0),
            transfer(&[0, 30, 0, 40, 0, 10, 0, 20, 0, 0, 0, 0]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(30, 40), (10, 20), (0, 0)]);
    }

    #[test]
    fn trailing_partial_stride_is_ignored() {
        let curve = Curve::decode(
            preamble(1.0, 1.0, 0, 0),
            transfer(&[0, 10, 0, 20, 0, 99]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(10, 20)]);
    }

    #[test]
    fn ten_bit_coordinates_use_full_range() {
        // 0x03FF is the largest 10-bit coordinate.
        let curve = Curve::decode(
            preamble(1.0, 1.0, 0, 0),
            transfer(&[0x03, 0xFF, 0x03, 0xFF]),
        )
        .unwrap();
        assert_eq!(curve.coordinates(), &[(1023, 1023)]);
    }

    #[test]
    fn expected_len_matches_layout() {
        assert_eq!(Curve::expected_len(1024), 25 + 2 + 4096 + 1);
        assert_eq!(
            transfer(&[0u8; 4096]).len(),
            Curve::expected_len(1024)
        );
    }

    #[test]
    fn checksum_verification_is_opt_in() {
        let good = Curve::decode(preamble(1.0, 1.0, 0, 0), transfer(&[0, 10, 0, 20])).unwrap();
        assert!(good.checksum_ok());

        let mut tampered_raw = transfer(&[0, 10, 0, 20]);
        tampered_raw[HEAD_LEN + LENGTH_FIELD_LEN] ^= 0x01;
        // Decoding still succeeds; only the explicit check reports it.
        let tampered = Curve::decode(preamble(1.0, 1.0, 0, 0), tampered_raw).unwrap();
        assert!(!tampered.checksum_ok());
    }

    #[test]
    fn short_transfer_is_an_error() {
        assert_eq!(
            Curve::decode(preamble(1.0, 1.0, 0, 0), vec![0u8; 10]),
            Err(CurveError::TooShort { got: 10, need: 28 })
        );
    }
}
