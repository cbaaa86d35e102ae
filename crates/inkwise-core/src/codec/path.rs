//! String encoding of freehand point lists.
//!
//! A path is stored as the JSON text of an array of `[x, y]` pairs, e.g.
//! `[[0.0,0.0],[10.5,3.25]]`. Numbers are written in shortest round-trip
//! form, so decoding recovers every coordinate bit for bit.

use super::{CodecError, CodecResult};
use kurbo::Point;

/// Encode points as a path string.
pub fn encode_points(points: &[Point]) -> String {
    let pairs: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
    // Arrays of finite or non-finite f64 always serialize (non-finite as null).
    serde_json::to_string(&pairs).unwrap_or_else(|_| "[]".to_string())
}

/// Decode a path string. Rejects anything that is not a list of finite pairs.
pub fn decode_points(encoded: &str) -> CodecResult<Vec<Point>> {
    let pairs: Vec<[f64; 2]> = serde_json::from_str(encoded)
        .map_err(|e| CodecError::MalformedPath(e.to_string()))?;

    pairs
        .into_iter()
        .map(|[x, y]| {
            if x.is_finite() && y.is_finite() {
                Ok(Point::new(x, y))
            } else {
                Err(CodecError::MalformedPath(format!("non-finite point ({x}, {y})")))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_format() {
        let encoded = encode_points(&[Point::new(0.0, 1.5), Point::new(-2.0, 3.0)]);
        assert_eq!(encoded, "[[0.0,1.5],[-2.0,3.0]]");
        assert_eq!(encode_points(&[]), "[]");
    }

    #[test]
    fn test_exact_recovery() {
        let points = vec![
            Point::new(0.1 + 0.2, 1.0 / 3.0),
            Point::new(123456.789012345, -0.000_000_1),
            Point::new(f64::MAX, f64::MIN_POSITIVE),
        ];
        let decoded = decode_points(&encode_points(&points)).unwrap();
        assert_eq!(decoded.len(), points.len());
        for (a, b) in decoded.iter().zip(&points) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "M 0 0 L 1 1", "[[1]]", "[[1,2,3]]", "[[\"a\",2]]", "{\"x\":1}", "[[1,2]"] {
            assert!(
                matches!(decode_points(bad), Err(CodecError::MalformedPath(_))),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_rejects_null_coordinates() {
        assert!(decode_points("[[null,1.0]]").is_err());
    }
}
