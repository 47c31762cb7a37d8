//! Scalar activation functions and their derivatives.
//!
//! Generic over [`num_traits::Float`] so the same formulas serve the `f32`
//! kernels and the `f64` references used when checking them.

use num_traits::Float;

/// `1 / (1 + e^-x)`, evaluated without overflowing for large `|x|`.
pub fn sigmoid<T: Float>(x: T) -> T {
    if x >= T::zero() {
        T::one() / (T::one() + (-x).exp())
    } else {
        let e = x.exp();
        e / (T::one() + e)
    }
}

/// `ln(1 + e^(beta·x)) / beta`
pub fn softplus<T: Float>(x: T, beta: T) -> T {
    let z = x * beta;
    // ln(1 + e^z) = max(z, 0) + ln(1 + e^-|z|)
    (z.max(T::zero()) + (-z.abs()).exp().ln_1p()) / beta
}

pub fn relu<T: Float>(x: T) -> T {
    x.max(T::zero())
}

/// 1 for positive inputs, 0 otherwise (including at 0).
pub fn relu_prime<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        T::zero()
    }
}

pub fn leaky_relu<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        x
    } else {
        alpha * x
    }
}

pub fn leaky_relu_prime<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        alpha
    }
}

pub fn elu<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        x
    } else {
        alpha * x.exp_m1()
    }
}

pub fn elu_prime<T: Float>(x: T, alpha: T) -> T {
    if x > T::zero() {
        T::one()
    } else {
        alpha * x.exp()
    }
}

/// -1, 0 or 1. Zero maps to zero, unlike `Float::signum`.
pub fn sign<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}
