//! Compressors for the certificate and validation record carried in M2.

use crate::core::{CompressionError, Compressor};

/// Default zstd compression level (1-22, higher = smaller but slower)
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Default cap on decompressed blob size.
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 1024 * 1024;

/// Compressor that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompressor;

impl Compressor for PassthroughCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        Ok(data.to_vec())
    }
}

/// zstd compression configuration
#[cfg(feature = "compression")]
#[derive(Debug, Clone)]
pub struct ZstdConfig {
    /// Compression level (1-22)
    pub level: i32,
    /// Maximum decompressed size
    pub max_decompressed_size: usize,
}

#[cfg(feature = "compression")]
impl Default for ZstdConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            max_decompressed_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
        }
    }
}

/// zstd-backed [`Compressor`].
#[cfg(feature = "compression")]
#[derive(Debug, Clone, Default)]
pub struct ZstdCompressor {
    config: ZstdConfig,
}

#[cfg(feature = "compression")]
impl ZstdCompressor {
    /// Create a compressor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compressor with custom config
    pub fn with_config(mut config: ZstdConfig) -> Self {
        config.level = config.level.clamp(1, 22);
        Self { config }
    }
}

#[cfg(feature = "compression")]
impl Compressor for ZstdCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        zstd::encode_all(data, self.config.level)
            .map_err(|e| CompressionError::CompressionFailed(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let limit = self.config.max_decompressed_size;
        if let Ok(Some(size)) = zstd::zstd_safe::get_frame_content_size(data) {
            if size > limit as u64 {
                return Err(CompressionError::SizeExceeded {
                    size: size as usize,
                    limit,
                });
            }
        }
        zstd::bulk::decompress(data, limit)
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_is_identity() {
        let data = b"certificate".to_vec();
        let c = PassthroughCompressor;
        assert_eq!(c.decompress(&c.compress(&data).unwrap()).unwrap(), data);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_zstd_restores_blob() {
        let data: Vec<u8> = b"com.apple.idms.appleid.prd.".repeat(40);
        let c = ZstdCompressor::new();
        let compressed = c.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(c.decompress(&compressed).unwrap(), data);
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_zstd_enforces_limit() {
        let data = vec![0u8; 4096];
        let c = ZstdCompressor::with_config(ZstdConfig {
            level: 3,
            max_decompressed_size: 1024,
        });
        let compressed = c.compress(&data).unwrap();
        assert!(matches!(
            c.decompress(&compressed),
            Err(CompressionError::SizeExceeded { size: 4096, limit: 1024 })
        ));
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_zstd_rejects_garbage() {
        let c = ZstdCompressor::new();
        assert!(c.decompress(b"not zstd").is_err());
    }
}
