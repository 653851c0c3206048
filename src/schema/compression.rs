use std::collections::BTreeMap;

use crate::error::{MarshalError, SchemaError};

/// Option key naming the compression algorithm. An empty value disables compression.
pub const SSTABLE_COMPRESSION: &str = "sstable_compression";
/// Option key for the chunk length, in kilobytes.
pub const CHUNK_LENGTH_KB: &str = "chunk_length_kb";

/// Algorithm used when nothing else is configured.
pub const DEFAULT_COMPRESSOR: &str = "LZ4Compressor";
/// Chunk length used when the parameters do not set one (64KB).
pub const DEFAULT_CHUNK_LENGTH: u32 = 64 * 1024;

/// Compression settings of a column family.
///
/// The algorithm is an opaque identifier and the extra options are passed
/// through untouched: both adapters carry these parameters without
/// interpreting them. [`new`](Self::new) only accepts parameters the option
/// map can represent exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionParameters {
    /// `None` means compression is disabled.
    algorithm: Option<String>,
    /// Chunk length in bytes, `None` when left at the default.
    chunk_length: Option<u32>,
    other_options: BTreeMap<String, String>,
}

impl CompressionParameters {
    /// Creates enabled compression parameters.
    ///
    /// # Errors
    ///
    /// [`SchemaError::InvalidConfiguration`] if the algorithm is empty, an
    /// extra option uses a reserved key, or the chunk length is not a power
    /// of two of at least 1KB.
    pub fn new(
        algorithm: impl Into<String>,
        chunk_length: Option<u32>,
        other_options: BTreeMap<String, String>,
    ) -> Result<Self, SchemaError> {
        let algorithm = algorithm.into();
        if algorithm.is_empty() {
            return Err(SchemaError::InvalidConfiguration(
                "compression algorithm must not be empty; use disabled() instead".to_string(),
            ));
        }
        if let Some(key) = [SSTABLE_COMPRESSION, CHUNK_LENGTH_KB]
            .into_iter()
            .find(|key| other_options.contains_key(*key))
        {
            return Err(SchemaError::InvalidConfiguration(format!(
                "'{key}' is reserved and cannot be passed as an extra compression option"
            )));
        }

        let params = Self {
            algorithm: Some(algorithm),
            chunk_length,
            other_options,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn disabled() -> Self {
        Self {
            algorithm: None,
            chunk_length: None,
            other_options: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.algorithm.is_some()
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    /// Effective chunk length in bytes.
    pub fn chunk_length(&self) -> u32 {
        self.chunk_length.unwrap_or(DEFAULT_CHUNK_LENGTH)
    }

    pub fn other_options(&self) -> &BTreeMap<String, String> {
        &self.other_options
    }

    /// Checks that an explicit chunk length is a power of two of at least 1KB.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if let Some(length) = self.chunk_length {
            if length < 1024 || !length.is_power_of_two() {
                return Err(SchemaError::InvalidConfiguration(format!(
                    "{CHUNK_LENGTH_KB} must be a power of 2 of at least 1KB, got {length} bytes"
                )));
            }
        }
        Ok(())
    }

    /// Flattens the parameters into the option map used by RPC definitions and
    /// persisted rows.
    pub fn as_rpc_options(&self) -> BTreeMap<String, String> {
        let mut options = self.other_options.clone();
        options.insert(
            SSTABLE_COMPRESSION.to_string(),
            self.algorithm.clone().unwrap_or_default(),
        );
        if let Some(length) = self.chunk_length {
            options.insert(CHUNK_LENGTH_KB.to_string(), (length / 1024).to_string());
        }
        options
    }

    /// Rebuilds parameters from an option map.
    ///
    /// An empty map yields the defaults. Any other map must name the algorithm.
    pub fn from_rpc_options(options: &BTreeMap<String, String>) -> Result<Self, SchemaError> {
        if options.is_empty() {
            return Ok(Self::default());
        }

        let mut other_options = options.clone();
        let algorithm = other_options.remove(SSTABLE_COMPRESSION).ok_or_else(|| {
            SchemaError::InvalidConfiguration(format!(
                "missing sub-option '{SSTABLE_COMPRESSION}' for compression options"
            ))
        })?;

        let chunk_length = match other_options.remove(CHUNK_LENGTH_KB) {
            Some(kb) => {
                let kb: u32 = kb.trim().parse().map_err(|_| {
                    SchemaError::InvalidConfiguration(format!(
                        "invalid value '{kb}' for {CHUNK_LENGTH_KB}"
                    ))
                })?;
                let bytes = kb.checked_mul(1024).ok_or_else(|| {
                    SchemaError::InvalidConfiguration(format!(
                        "{CHUNK_LENGTH_KB} of {kb} is too large"
                    ))
                })?;
                Some(bytes)
            }
            None => None,
        };

        Ok(Self {
            algorithm: (!algorithm.is_empty()).then_some(algorithm),
            chunk_length,
            other_options,
        })
    }

    /// JSON form stored in persisted schema rows.
    pub fn to_json(&self) -> String {
        options_to_json(&self.as_rpc_options())
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        Self::from_rpc_options(&options_from_json(json)?)
    }
}

/// Encodes a string option map as a JSON object with sorted keys.
pub(crate) fn options_to_json(options: &BTreeMap<String, String>) -> String {
    let object: serde_json::Map<String, serde_json::Value> = options
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    serde_json::Value::Object(object).to_string()
}

pub(crate) fn options_from_json(json: &str) -> Result<BTreeMap<String, String>, SchemaError> {
    serde_json::from_str(json).map_err(|e| {
        SchemaError::MalformedValue(MarshalError::new(format!(
            "invalid option map '{json}': {e}"
        )))
    })
}

impl Default for CompressionParameters {
    fn default() -> Self {
        Self {
            algorithm: Some(DEFAULT_COMPRESSOR.to_string()),
            chunk_length: None,
            other_options: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_options_round_trip() {
        let params =
            CompressionParameters::new("SnappyCompressor", Some(32768), BTreeMap::new()).unwrap();
        let options = params.as_rpc_options();
        assert_eq!(options.get(SSTABLE_COMPRESSION).unwrap(), "SnappyCompressor");
        assert_eq!(options.get(CHUNK_LENGTH_KB).unwrap(), "32");
        assert_eq!(CompressionParameters::from_rpc_options(&options).unwrap(), params);
    }

    #[test]
    fn test_disabled_round_trip() {
        let params = CompressionParameters::disabled();
        let options = params.as_rpc_options();
        assert_eq!(options.get(SSTABLE_COMPRESSION).unwrap(), "");
        let back = CompressionParameters::from_rpc_options(&options).unwrap();
        assert!(!back.is_enabled());
        assert_eq!(back, params);
    }

    #[test]
    fn test_empty_options_mean_default() {
        let params = CompressionParameters::from_rpc_options(&BTreeMap::new()).unwrap();
        assert_eq!(params.algorithm(), Some(DEFAULT_COMPRESSOR));
        assert_eq!(params.chunk_length(), DEFAULT_CHUNK_LENGTH);
    }

    #[test]
    fn test_missing_algorithm_is_rejected() {
        let mut options = BTreeMap::new();
        options.insert(CHUNK_LENGTH_KB.to_string(), "64".to_string());
        assert!(matches!(
            CompressionParameters::from_rpc_options(&options),
            Err(SchemaError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_other_options_pass_through() {
        let mut extra = BTreeMap::new();
        extra.insert("crc_check_chance".to_string(), "0.5".to_string());
        let params = CompressionParameters::new("DeflateCompressor", None, extra.clone()).unwrap();
        let json = params.to_json();
        let back = CompressionParameters::from_json(&json).unwrap();
        assert_eq!(back.other_options(), &extra);
        assert_eq!(back, params);
    }

    #[test]
    fn test_json_is_sorted_and_rejects_garbage() {
        let params =
            CompressionParameters::new("SnappyCompressor", Some(32768), BTreeMap::new()).unwrap();
        assert_eq!(
            params.to_json(),
            r#"{"chunk_length_kb":"32","sstable_compression":"SnappyCompressor"}"#
        );
        assert!(matches!(
            CompressionParameters::from_json("{not json"),
            Err(SchemaError::MalformedValue(_))
        ));
    }

    #[test]
    fn test_new_rejects_inexact_chunk_length() {
        for length in [1500, 3 * 1024, 512] {
            assert!(matches!(
                CompressionParameters::new("SnappyCompressor", Some(length), BTreeMap::new()),
                Err(SchemaError::InvalidConfiguration(_))
            ));
        }
        assert!(CompressionParameters::default().validate().is_ok());
    }

    #[test]
    fn test_new_rejects_reserved_option_keys() {
        for key in [SSTABLE_COMPRESSION, CHUNK_LENGTH_KB] {
            let mut extra = BTreeMap::new();
            extra.insert(key.to_string(), "8".to_string());
            assert!(matches!(
                CompressionParameters::new("SnappyCompressor", None, extra),
                Err(SchemaError::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_new_rejects_empty_algorithm() {
        assert!(matches!(
            CompressionParameters::new("", None, BTreeMap::new()),
            Err(SchemaError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_accepted_parameters_survive_the_option_map() {
        let mut extra = BTreeMap::new();
        extra.insert("crc_check_chance".to_string(), "0.5".to_string());
        for (length, options) in [(Some(1024), BTreeMap::new()), (None, extra)] {
            let params = CompressionParameters::new("DeflateCompressor", length, options).unwrap();
            let back = CompressionParameters::from_rpc_options(&params.as_rpc_options()).unwrap();
            assert_eq!(back, params);
            assert_eq!(CompressionParameters::from_json(&params.to_json()).unwrap(), params);
        }
    }
}
