//! Vector-set handles.

use crate::error::{Error, Result};

/// On-disk precision of vectors stored under a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantization {
    /// Full-precision 32-bit floats.
    #[default]
    F32,
    /// 8-bit quantized components.
    Q8,
    /// One bit per component.
    Binary,
}

impl Quantization {
    /// The wire token for this mode.
    pub fn as_token(&self) -> &'static str {
        match self {
            Quantization::F32 => "F32",
            Quantization::Q8 => "Q8",
            Quantization::Binary => "BIN",
        }
    }
}

/// A named vector collection with fixed dimensionality.
///
/// Every vector stored under (or queried against) the handle must match
/// its dimensionality; the handle checks this before any wire traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSetHandle {
    name: String,
    dim: usize,
    quantization: Quantization,
}

impl VectorSetHandle {
    /// Create a handle. The name must be non-empty and `dim` positive.
    pub fn new(name: impl Into<String>, dim: usize) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("collection name must not be empty".into()));
        }
        if dim == 0 {
            return Err(Error::Validation("dimensionality must be positive".into()));
        }
        Ok(Self {
            name,
            dim,
            quantization: Quantization::default(),
        })
    }

    /// Set the quantization mode used when inserting elements.
    pub fn with_quantization(mut self, quantization: Quantization) -> Self {
        self.quantization = quantization;
        self
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fixed dimensionality of vectors in this collection.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The quantization mode.
    pub fn quantization(&self) -> Quantization {
        self.quantization
    }

    /// Check a vector against the handle: right length, all entries finite.
    pub fn check_vector(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::Validation(format!(
                "vector has {} entries but collection '{}' expects {}",
                vector.len(),
                self.name,
                self.dim
            )));
        }
        if let Some(pos) = vector.iter().position(|v| !v.is_finite()) {
            return Err(Error::Validation(format!(
                "vector entry {} is not finite",
                pos
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name_and_zero_dim() {
        assert!(VectorSetHandle::new("", 4).is_err());
        assert!(VectorSetHandle::new("docs", 0).is_err());
    }

    #[test]
    fn checks_vector_shape() {
        let handle = VectorSetHandle::new("docs", 3).unwrap();
        assert!(handle.check_vector(&[0.1, 0.2, 0.3]).is_ok());
        assert!(handle.check_vector(&[0.1, 0.2]).is_err());
        assert!(handle.check_vector(&[0.1, f32::NAN, 0.3]).is_err());
    }

    #[test]
    fn quantization_tokens() {
        assert_eq!(Quantization::F32.as_token(), "F32");
        assert_eq!(Quantization::Q8.as_token(), "Q8");
        assert_eq!(Quantization::Binary.as_token(), "BIN");
    }
}
