//! Validated face embedding vectors.
//!
//! Every `Embedding` in the system is guaranteed to be exactly
//! [`EMBEDDING_DIM`] finite f32 components. Legacy databases stored the
//! same vectors at two byte widths (f32 and f64); [`Embedding::from_blob`]
//! is the explicit decode step for both — anything else is malformed and
//! is rejected before it can ever be matched against.

use std::fmt;

use crate::constants::EMBEDDING_DIM;

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    WrongDimension { expected: usize, actual: usize },
    NonFinite,
    MalformedBlob { len: usize },
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::WrongDimension { expected, actual } => {
                write!(f, "expected {expected} components, got {actual}")
            }
            EmbeddingError::NonFinite => write!(f, "vector contains a non-finite component"),
            EmbeddingError::MalformedBlob { len } => {
                write!(f, "blob of {len} bytes is not a stored embedding")
            }
        }
    }
}

impl std::error::Error for EmbeddingError {}

/// A 128-dimensional face embedding, validated at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Validate a raw vector: exact dimension, all components finite.
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.len() != EMBEDDING_DIM {
            return Err(EmbeddingError::WrongDimension {
                expected: EMBEDDING_DIM,
                actual: values.len(),
            });
        }
        if !values.iter().all(|v| v.is_finite()) {
            return Err(EmbeddingError::NonFinite);
        }
        Ok(Self(values))
    }

    /// Decode a stored blob at either legacy byte width.
    ///
    /// 512 bytes = 128 × f32 LE, 1024 bytes = 128 × f64 LE narrowed to f32.
    /// Finiteness is re-checked after narrowing: an f64 outside f32 range
    /// becomes infinite and the entry is rejected.
    pub fn from_blob(blob: &[u8]) -> Result<Self, EmbeddingError> {
        let values: Vec<f32> = if blob.len() == EMBEDDING_DIM * 4 {
            blob.chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        } else if blob.len() == EMBEDDING_DIM * 8 {
            blob.chunks_exact(8)
                .map(|c| {
                    f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32
                })
                .collect()
        } else {
            return Err(EmbeddingError::MalformedBlob { len: blob.len() });
        };
        Self::new(values)
    }

    /// Canonical storage encoding: 128 × f32 LE.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(EMBEDDING_DIM * 4);
        for v in &self.0 {
            blob.extend_from_slice(&v.to_le_bytes());
        }
        blob
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean distance to another embedding.
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| {
                let d = a - b;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }
}
