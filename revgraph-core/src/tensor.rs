use crate::error::RevGraphError;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// A dense, row-major, multi-dimensional array of `f32`.
///
/// An empty shape denotes a scalar holding exactly one element. Tensors are
/// plain values: graph nodes own the tensors they cache and callers own the
/// tensors they feed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

/// Number of elements described by `shape` (1 for a scalar).
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Calculates the contiguous row-major strides for a given shape.
///
/// Example:
/// shape = [2, 3] -> strides = [3, 1]
/// shape = [2, 2, 2] -> strides = [4, 2, 1]
pub fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }
    let rank = shape.len();
    let mut strides = vec![1; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

impl Tensor {
    /// Creates a tensor from flat row-major data.
    ///
    /// # Errors
    /// `TensorCreationError` if `data.len()` differs from the element count of `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, RevGraphError> {
        if data.len() != numel(&shape) {
            return Err(RevGraphError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor { shape, data })
    }

    /// Kernel-side constructor; shapes are validated before any kernel runs.
    pub(crate) fn from_parts(data: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), numel(&shape));
        Tensor { shape, data }
    }

    pub fn scalar(value: f32) -> Self {
        Tensor {
            shape: vec![],
            data: vec![value],
        }
    }

    pub fn vector(data: Vec<f32>) -> Self {
        Tensor {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn full(shape: Vec<usize>, value: f32) -> Self {
        let data = vec![value; numel(&shape)];
        Tensor { shape, data }
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn ones(shape: Vec<usize>) -> Self {
        Self::full(shape, 1.0)
    }

    /// Samples every element from the standard normal distribution using `rng`.
    pub fn randn_with<R: Rng + ?Sized>(shape: Vec<usize>, rng: &mut R) -> Self {
        let data = (0..numel(&shape))
            .map(|_| StandardNormal.sample(rng))
            .collect();
        Tensor { shape, data }
    }

    /// Samples every element uniformly from `[low, high)` using `rng`.
    pub fn uniform_with<R: Rng + ?Sized>(shape: Vec<usize>, low: f32, high: f32, rng: &mut R) -> Self {
        let data = (0..numel(&shape)).map(|_| rng.gen_range(low..high)).collect();
        Tensor { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns the single value of a scalar (or one-element) tensor.
    pub fn item(&self) -> Result<f32, RevGraphError> {
        match self.data.as_slice() {
            [value] => Ok(*value),
            _ => Err(RevGraphError::invalid_shape(
                "item",
                &[&self.shape],
                "tensor must hold exactly one element",
            )),
        }
    }

    /// Element at a multi-dimensional index, or `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.shape.len() || index.iter().zip(&self.shape).any(|(i, d)| i >= d) {
            return None;
        }
        let offset = index
            .iter()
            .zip(calculate_strides(&self.shape))
            .map(|(i, s)| i * s)
            .sum::<usize>();
        self.data.get(offset).copied()
    }

    /// Same data under a new shape with the same element count.
    pub fn reshaped(self, shape: Vec<usize>) -> Result<Self, RevGraphError> {
        if numel(&shape) != self.data.len() {
            return Err(RevGraphError::shape_mismatch("reshaped", &self.shape, &shape));
        }
        Ok(Tensor { shape, data: self.data })
    }

    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Elementwise combination of two tensors. Callers guarantee equal shapes;
    /// the result takes the shape of `self`.
    pub(crate) fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &Tensor, f: F) -> Tensor {
        debug_assert_eq!(self.shape, other.shape);
        Tensor {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Largest absolute elementwise difference to `other`; `None` when shapes differ.
    pub fn max_abs_diff(&self, other: &Tensor) -> Option<f32> {
        if self.shape != other.shape {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f32::max),
        )
    }
}

impl From<f32> for Tensor {
    fn from(value: f32) -> Self {
        Tensor::scalar(value)
    }
}

#[cfg(test)]
#[path = "tensor_test.rs"]
mod tests;
