//! Model serialization strategies.
//!
//! A [`Store`](crate::Store) builds one [`SerdeCodec`] from its
//! [`CodecConfig`] and shares it by reference with every collection that does
//! not bring its own [`ModelCodec`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error produced by a codec. Collections attach their name before surfacing
/// it as a [`StoreError`](crate::StoreError).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Converts models to and from stored bytes.
pub trait ModelCodec<M>: Send + Sync {
    fn encode(&self, model: &M) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, data: &[u8]) -> Result<M, CodecError>;
}

/// Wire format used by [`SerdeCodec`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecFormat {
    /// Structured text. Human-readable and tolerant of added fields.
    #[default]
    Json,
    /// Compact binary encoding.
    Bincode,
}

/// Configuration for the store-wide codec.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub format: CodecFormat,
    /// Pretty-print JSON output. Ignored for binary formats.
    pub pretty: bool,
}

/// Serde-backed codec usable with any `Serialize + DeserializeOwned` model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerdeCodec {
    config: CodecConfig,
}

impl SerdeCodec {
    /// Build a codec from `config`.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The default JSON codec.
    pub fn json() -> Self {
        Self::default()
    }

    /// A compact binary codec.
    pub fn bincode() -> Self {
        Self::new(CodecConfig {
            format: CodecFormat::Bincode,
            pretty: false,
        })
    }

    /// Settings this codec was built from.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl<M> ModelCodec<M> for SerdeCodec
where
    M: Serialize + DeserializeOwned,
{
    fn encode(&self, model: &M) -> Result<Vec<u8>, CodecError> {
        let encoded = match self.config.format {
            CodecFormat::Json if self.config.pretty => {
                serde_json::to_vec_pretty(model).map_err(|e| e.to_string())
            }
            CodecFormat::Json => serde_json::to_vec(model).map_err(|e| e.to_string()),
            CodecFormat::Bincode => bincode::serialize(model).map_err(|e| e.to_string()),
        };
        encoded.map_err(CodecError)
    }

    fn decode(&self, data: &[u8]) -> Result<M, CodecError> {
        let decoded = match self.config.format {
            CodecFormat::Json => serde_json::from_slice(data).map_err(|e| e.to_string()),
            CodecFormat::Bincode => bincode::deserialize(data).map_err(|e| e.to_string()),
        };
        decoded.map_err(CodecError)
    }
}
