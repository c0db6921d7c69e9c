// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Typed tensor buffers.

/// Element types a graph tensor can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TensorType {
    Float32,
    Float16,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt32,
    UInt64,
    Bool,
}

impl TensorType {
    /// Returns the size of a single element in bytes.
    pub fn size_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 | Self::Bool => 1,
            Self::Float16 | Self::Int16 => 2,
            Self::Float32 | Self::Int32 | Self::UInt32 => 4,
            Self::Float64 | Self::Int64 | Self::UInt64 => 8,
        }
    }

    /// Returns a human-readable label for this element type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float16 => "float16",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Bool => "bool",
        }
    }
}

impl std::fmt::Display for TensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owned element buffer, one variant per element type.
///
/// `Float16` is stored as raw bit patterns.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(Vec<f32>),
    Float16(Vec<u16>),
    Float64(Vec<f64>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Bool(Vec<bool>),
}

impl TensorData {
    /// Allocates a zero-filled buffer of `len` elements.
    pub fn zeros(dtype: TensorType, len: usize) -> Self {
        match dtype {
            TensorType::Float32 => Self::Float32(vec![0.0; len]),
            TensorType::Float16 => Self::Float16(vec![0; len]),
            TensorType::Float64 => Self::Float64(vec![0.0; len]),
            TensorType::Int8 => Self::Int8(vec![0; len]),
            TensorType::Int16 => Self::Int16(vec![0; len]),
            TensorType::Int32 => Self::Int32(vec![0; len]),
            TensorType::Int64 => Self::Int64(vec![0; len]),
            TensorType::UInt8 => Self::UInt8(vec![0; len]),
            TensorType::UInt32 => Self::UInt32(vec![0; len]),
            TensorType::UInt64 => Self::UInt64(vec![0; len]),
            TensorType::Bool => Self::Bool(vec![false; len]),
        }
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Float16(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Int8(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::UInt8(v) => v.len(),
            Self::UInt32(v) => v.len(),
            Self::UInt64(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// Returns `true` if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A graph tensor: declared name, element type and shape, plus a buffer
/// once the executor has allocated it.
#[derive(Debug, Clone)]
pub struct Tensor {
    /// Tensor name as declared in the graph.
    pub name: String,
    /// Declared element type.
    pub dtype: TensorType,
    /// Dimensions, outermost first.
    pub shape: Vec<usize>,
    data: Option<TensorData>,
}

impl Tensor {
    /// Declares a tensor without a backing buffer.
    pub fn new(name: impl Into<String>, dtype: TensorType, shape: Vec<usize>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
            data: None,
        }
    }

    /// Returns the number of elements implied by the shape.
    ///
    /// A rank-0 tensor has one element.
    pub fn num_elements(&self) -> usize {
        self.shape.iter().product()
    }

    /// Returns the buffer size in bytes implied by shape and type.
    pub fn size_bytes(&self) -> usize {
        self.num_elements() * self.dtype.size_bytes()
    }

    /// Allocates (or re-zeroes) the backing buffer.
    pub fn allocate(&mut self) {
        self.data = Some(TensorData::zeros(self.dtype, self.num_elements()));
    }

    /// Returns `true` once a buffer has been allocated.
    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Returns the backing buffer, if allocated.
    pub fn data(&self) -> Option<&TensorData> {
        self.data.as_ref()
    }

    /// Returns the backing buffer mutably, if allocated.
    pub fn data_mut(&mut self) -> Option<&mut TensorData> {
        self.data.as_mut()
    }

    /// Returns a shape string such as `[1 x 128 x 128 x 3]`.
    pub fn shape_string(&self) -> String {
        let dims: Vec<String> = self.shape.iter().map(|d| d.to_string()).collect();
        format!("[{}]", dims.join(" x "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes() {
        assert_eq!(TensorType::Float32.size_bytes(), 4);
        assert_eq!(TensorType::Float16.size_bytes(), 2);
        assert_eq!(TensorType::UInt8.size_bytes(), 1);
        assert_eq!(TensorType::Int64.size_bytes(), 8);
    }

    #[test]
    fn test_tensor_allocation() {
        let mut t = Tensor::new("input", TensorType::UInt8, vec![1, 4, 4, 3]);
        assert_eq!(t.num_elements(), 48);
        assert_eq!(t.size_bytes(), 48);
        assert!(!t.is_allocated());
        assert!(t.data().is_none());

        t.allocate();
        assert!(t.is_allocated());
        assert_eq!(t.data(), Some(&TensorData::UInt8(vec![0; 48])));
    }

    #[test]
    fn test_scalar_tensor() {
        let t = Tensor::new("scalar", TensorType::Float32, vec![]);
        assert_eq!(t.num_elements(), 1);
    }

    #[test]
    fn test_shape_string() {
        let t = Tensor::new("x", TensorType::Float32, vec![1, 128, 128, 3]);
        assert_eq!(t.shape_string(), "[1 x 128 x 128 x 3]");
    }

    #[test]
    fn test_zeros_len() {
        for dtype in [TensorType::Float64, TensorType::Bool, TensorType::Int16] {
            let data = TensorData::zeros(dtype, 7);
            assert_eq!(data.len(), 7);
            assert!(!data.is_empty());
        }
    }
}
