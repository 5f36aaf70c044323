//! Response body compression round-trip.
//!
//! The interceptor only rewrites bodies it can re-encode exactly as they
//! arrived: gzip, deflate, or no encoding at all. Anything else passes
//! through untouched.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};

/// Declared body encoding of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    /// No content-encoding header (or `identity`)
    Identity,
    Gzip,
    Deflate,
    /// Anything the round-trip cannot reproduce (br, zstd, ...)
    Other,
}

impl BodyEncoding {
    /// Parse a `content-encoding` header value.
    pub fn parse(header: Option<&str>) -> Self {
        let Some(header) = header else {
            return Self::Identity;
        };

        let mut tokens = header
            .split(',')
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty());

        match (tokens.next(), tokens.next()) {
            (None, _) => Self::Identity,
            // Stacked encodings are not round-trippable here
            (Some(_), Some(_)) => Self::Other,
            (Some(token), None) => match token.as_str() {
                "identity" => Self::Identity,
                "gzip" | "x-gzip" => Self::Gzip,
                "deflate" => Self::Deflate,
                _ => Self::Other,
            },
        }
    }

    /// Whether the interceptor can decode and re-encode this body.
    pub fn round_trippable(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Decompress `data` according to its encoding.
///
/// `Identity` copies, `Other` is a no-op returning the input bytes.
pub fn decompress(data: &[u8], encoding: BodyEncoding) -> std::io::Result<Vec<u8>> {
    match encoding {
        BodyEncoding::Identity | BodyEncoding::Other => Ok(data.to_vec()),
        BodyEncoding::Gzip => {
            let mut out = Vec::new();
            GzDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        BodyEncoding::Deflate => {
            let mut out = Vec::new();
            ZlibDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
    }
}

/// Re-apply the original encoding to `data`.
///
/// `Identity` and `Other` return the input bytes unchanged.
pub fn compress(data: &[u8], encoding: BodyEncoding) -> Vec<u8> {
    match encoding {
        BodyEncoding::Identity | BodyEncoding::Other => data.to_vec(),
        BodyEncoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            // Writing to a Vec cannot fail
            let _ = encoder.write_all(data);
            encoder.finish().unwrap_or_default()
        }
        BodyEncoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            let _ = encoder.write_all(data);
            encoder.finish().unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(BodyEncoding::parse(None), BodyEncoding::Identity);
        assert_eq!(BodyEncoding::parse(Some("gzip")), BodyEncoding::Gzip);
        assert_eq!(BodyEncoding::parse(Some("GZIP")), BodyEncoding::Gzip);
        assert_eq!(BodyEncoding::parse(Some("deflate")), BodyEncoding::Deflate);
        assert_eq!(BodyEncoding::parse(Some("identity")), BodyEncoding::Identity);
        assert_eq!(BodyEncoding::parse(Some("br")), BodyEncoding::Other);
        assert_eq!(BodyEncoding::parse(Some("zstd")), BodyEncoding::Other);
        assert_eq!(BodyEncoding::parse(Some("gzip, br")), BodyEncoding::Other);
    }

    #[test]
    fn test_gzip_round_trip() {
        let data = b"<html><body>round trip</body></html>";
        let packed = compress(data, BodyEncoding::Gzip);
        assert_ne!(packed, data);
        let unpacked = decompress(&packed, BodyEncoding::Gzip).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_deflate_round_trip() {
        let data = b"abcabcabcabc".repeat(100);
        let packed = compress(&data, BodyEncoding::Deflate);
        let unpacked = decompress(&packed, BodyEncoding::Deflate).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_unknown_encoding_is_noop() {
        let data = b"opaque bytes";
        assert_eq!(compress(data, BodyEncoding::Other), data);
        assert_eq!(decompress(data, BodyEncoding::Other).unwrap(), data);
    }

    #[test]
    fn test_identity_is_noop() {
        let data = b"plain";
        assert_eq!(compress(data, BodyEncoding::Identity), data);
        assert_eq!(decompress(data, BodyEncoding::Identity).unwrap(), data);
    }

    #[test]
    fn test_corrupt_gzip_errors() {
        assert!(decompress(b"not gzip at all", BodyEncoding::Gzip).is_err());
    }
}
