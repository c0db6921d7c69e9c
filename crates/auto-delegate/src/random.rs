// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Random input fabrication for smoke tests.
//!
//! Integer tensors store a raw sample from `0..=256`, wrapping on 8-bit
//! types. Floating-point tensors store `k / 256` for `k` in `0..256`, so
//! every value lies in `[0, 1)`. `float16` and `bool` inputs are
//! left untouched.

use crate::SelectionError;
use graph_ir::{GraphExecutor, TensorData};
use rand::Rng;

/// Fills the first graph input with random data from the thread RNG.
///
/// Returns the number of elements written.
pub fn fill_random_input_tensor<G: GraphExecutor + ?Sized>(graph: &mut G) -> Result<usize, SelectionError> {
    fill_random_input_tensor_with(graph, &mut rand::thread_rng())
}

/// Fills the first graph input with random data from `rng`.
pub fn fill_random_input_tensor_with<G, R>(graph: &mut G, rng: &mut R) -> Result<usize, SelectionError>
where
    G: GraphExecutor + ?Sized,
    R: Rng,
{
    let tensor = graph
        .input_tensor_mut(0)
        .ok_or(SelectionError::InputTensorUnavailable { input: 0 })?;
    let name = tensor.name.clone();
    let data = tensor
        .data_mut()
        .ok_or(SelectionError::InputTensorUnavailable { input: 0 })?;

    let written = match data {
        TensorData::Float32(v) => fill(v, || sample_unit(rng) as f32),
        TensorData::Float64(v) => fill(v, || sample_unit(rng)),
        TensorData::Int8(v) => fill(v, || sample(rng) as i8),
        TensorData::UInt8(v) => fill(v, || sample(rng) as u8),
        TensorData::Int16(v) => fill(v, || sample(rng) as i16),
        TensorData::Int32(v) => fill(v, || sample(rng)),
        TensorData::Int64(v) => fill(v, || i64::from(sample(rng))),
        TensorData::UInt32(v) => fill(v, || sample(rng) as u32),
        TensorData::UInt64(v) => fill(v, || sample(rng) as u64),
        TensorData::Float16(_) | TensorData::Bool(_) => {
            tracing::debug!("input '{}' has an unsupported element type; left as is", name);
            0
        }
    };
    tracing::debug!("filled {} elements of input '{}'", written, name);
    Ok(written)
}

fn sample<R: Rng>(rng: &mut R) -> i32 {
    rng.gen_range(0..=256)
}

/// A value in `[0, 1)` on a 1/256 grid.
fn sample_unit<R: Rng>(rng: &mut R) -> f64 {
    f64::from(rng.gen_range(0..256_u32)) / 256.0
}

fn fill<T>(values: &mut [T], mut next: impl FnMut() -> T) -> usize {
    for v in values.iter_mut() {
        *v = next();
    }
    values.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph_ir::{OpKind, ReferenceGraph, Tensor, TensorType};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn graph(dtype: TensorType) -> ReferenceGraph {
        ReferenceGraph::chain(
            "g",
            Tensor::new("input", dtype, vec![1, 16, 16, 3]),
            &[(OpKind::Conv2d, None)],
        )
    }

    fn input_data(g: &ReferenceGraph) -> &TensorData {
        g.tensor(0).and_then(|t| t.data()).unwrap()
    }

    #[test]
    fn test_unallocated_input_fails() {
        let mut g = graph(TensorType::Float32);
        let result = fill_random_input_tensor(&mut g);
        assert!(matches!(result, Err(SelectionError::InputTensorUnavailable { input: 0 })));
    }

    #[test]
    fn test_no_inputs_fails() {
        let mut g = ReferenceGraph::new("empty", vec![], vec![], vec![], vec![]);
        g.allocate_tensors().unwrap();
        assert!(fill_random_input_tensor(&mut g).is_err());
    }

    #[test]
    fn test_float_range() {
        let mut g = graph(TensorType::Float32);
        g.allocate_tensors().unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(fill_random_input_tensor_with(&mut g, &mut rng).unwrap(), 768);

        let TensorData::Float32(v) = input_data(&g) else {
            panic!("expected float32 data");
        };
        assert!(v.iter().all(|&x| (0.0..1.0).contains(&x)));
        assert!(v.iter().any(|&x| x > 0.0));
    }

    #[test]
    fn test_float_never_reaches_one() {
        let mut g = ReferenceGraph::chain(
            "wide",
            Tensor::new("input", TensorType::Float64, vec![1, 64, 64, 4]),
            &[(OpKind::Relu, None)],
        );
        g.allocate_tensors().unwrap();
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(fill_random_input_tensor_with(&mut g, &mut rng).unwrap(), 16384);
            let TensorData::Float64(v) = input_data(&g) else {
                panic!("expected float64 data");
            };
            assert!(v.iter().all(|&x| (0.0..1.0).contains(&x)));
            assert!(v.iter().all(|&x| (x * 256.0).fract() == 0.0));
        }
    }

    #[test]
    fn test_integer_range() {
        let mut g = graph(TensorType::Int32);
        g.allocate_tensors().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        fill_random_input_tensor_with(&mut g, &mut rng).unwrap();

        let TensorData::Int32(v) = input_data(&g) else {
            panic!("expected int32 data");
        };
        assert!(v.iter().all(|&x| (0..=256).contains(&x)));
    }

    #[test]
    fn test_uint8_fills_every_element() {
        let mut g = graph(TensorType::UInt8);
        g.allocate_tensors().unwrap();
        assert_eq!(fill_random_input_tensor(&mut g).unwrap(), 768);
    }

    #[test]
    fn test_unsupported_type_untouched() {
        let mut g = graph(TensorType::Bool);
        g.allocate_tensors().unwrap();
        assert_eq!(fill_random_input_tensor(&mut g).unwrap(), 0);
        assert_eq!(input_data(&g), &TensorData::Bool(vec![false; 768]));
    }
}
