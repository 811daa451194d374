//! Integration tests for MULACC contractions
//!
//! The evaluator lowers dot products, matrix products and scaled sums to
//! MULACC over operands it has already expanded to a common shape.

mod common;

use common::{assert_allclose_f32, assert_allclose_f64, exec};
use numr_interp::prelude::*;

fn mulacc(a: Tensor, b: Tensor, new_shape: &[usize]) -> Result<Tensor> {
    exec(TernaryOp::MulAcc, &[a, b], OpArg::Shape(new_shape.to_vec()))
}

fn expand(x: Tensor, shape: &[usize]) -> Tensor {
    exec(MovementOp::Expand, &[x], OpArg::Shape(shape.to_vec())).unwrap()
}

// ============================================================================
// Contractions
// ============================================================================

#[test]
fn test_dot_product() {
    let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
    let b = Tensor::from_slice(&[4.0f32, 5.0, 6.0], &[3]);
    let result = mulacc(a, b, &[1]).unwrap();

    assert_eq!(result.shape(), &[1]);
    let data: Vec<f32> = result.to_vec();
    assert_eq!(data, [32.0]);
}

#[test]
fn test_dot_product_to_scalar() {
    let a = Tensor::from_slice(&[1i32, -2, 3, 4], &[4]);
    let b = Tensor::from_slice(&[5i32, 6, 7, 8], &[4]);
    let result = mulacc(a, b, &[]).unwrap();

    assert!(result.is_scalar());
    assert_eq!(result.to_vec::<i32>(), [5 - 12 + 21 + 32]);
}

#[test]
fn test_matvec_with_expanded_vector() {
    // [[1, 2], [3, 4], [5, 6]] @ [10, 1]
    let m = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0], &[3, 2]);
    let v = expand(Tensor::from_slice(&[10.0f64, 1.0], &[1, 2]), &[3, 2]);
    let result = mulacc(m, v, &[3, 1]).unwrap();

    assert_eq!(result.shape(), &[3, 1]);
    assert_allclose_f64(&result.to_vec::<f64>(), &[12.0, 34.0, 56.0], 1e-12, 1e-12, "matvec");
}

#[test]
fn test_matmul_as_three_axis_contraction() {
    // A [2, 3] -> [2, 1, 3], B [3, 2] transposed -> [1, 2, 3]
    let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 1, 3]);
    let b_t = Tensor::from_slice(&[7.0f32, 9.0, 11.0, 8.0, 10.0, 12.0], &[1, 2, 3]);
    let a = expand(a, &[2, 2, 3]);
    let b_t = expand(b_t, &[2, 2, 3]);
    let result = mulacc(a, b_t, &[2, 2, 1]).unwrap();

    assert_eq!(result.shape(), &[2, 2, 1]);
    assert_allclose_f32(
        &result.to_vec::<f32>(),
        &[58.0, 64.0, 139.0, 154.0],
        1e-6,
        1e-6,
        "matmul",
    );
}

#[test]
fn test_scaled_sum_with_broadcast_scalar() {
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
    let two = exec(
        BufferOp::Const,
        &[],
        OpArg::Const {
            value: Scalar::Float(2.0),
            dtype: DType::F32,
        },
    )
    .unwrap();
    let two = exec(
        MovementOp::AsStrided,
        &[two],
        OpArg::Strided {
            shape: vec![2, 3],
            strides: vec![0, 0],
            offset: 0,
        },
    )
    .unwrap();

    let result = mulacc(x, two, &[2, 1]).unwrap();
    assert_eq!(result.shape(), &[2, 1]);
    assert_eq!(result.to_vec::<f32>(), [12.0, 30.0]);
}

#[test]
fn test_broadcast_in_both_operands_stays_a_view() {
    let a = expand(Tensor::from_slice(&[2i32], &[1, 1]), &[4, 5]);
    let b = expand(Tensor::from_slice(&[3i32], &[1, 1]), &[4, 5]);
    let result = mulacc(a, b, &[4, 5]).unwrap();

    assert_eq!(result.shape(), &[4, 5]);
    assert_eq!(result.strides(), &[0, 0]);
    assert_eq!(result.to_vec::<i32>(), vec![6; 20]);
}

#[test]
fn test_collapsed_axis_broadcast_in_both_matches_sum_of_product() {
    let a = expand(Tensor::from_slice(&[1i32, 2], &[2, 1]), &[2, 3]);
    let b = expand(Tensor::from_slice(&[10i32, 20], &[2, 1]), &[2, 3]);

    let product = exec(BinaryOp::Mul, &[a.clone(), b.clone()], OpArg::None).unwrap();
    let reference = exec(ReduceOp::Sum, &[product], OpArg::Shape(vec![2, 1])).unwrap();
    let result = mulacc(a, b, &[2, 1]).unwrap();

    assert_eq!(result.shape(), &[2, 1]);
    assert_eq!(result.to_vec::<i32>(), [30, 120]);
    assert_eq!(result.to_vec::<i32>(), reference.to_vec::<i32>());
}

#[test]
fn test_zero_length_broadcast_axis() {
    let a = expand(Tensor::from_slice(&[1.0f32], &[1]), &[0]);
    let b = expand(Tensor::from_slice(&[3.0f32], &[1]), &[0]);
    let result = mulacc(a, b, &[1]).unwrap();

    assert_eq!(result.shape(), &[1]);
    assert_eq!(result.to_vec::<f32>(), [0.0]);
}

#[test]
fn test_mulacc_promotes_operands() {
    let a = Tensor::from_slice(&[1u8, 2, 3], &[3]);
    let b = Tensor::from_slice(&[0.5f32, 0.5, 0.5], &[3]);
    let result = mulacc(a, b, &[1]).unwrap();

    assert_eq!(result.dtype(), DType::F32);
    assert_eq!(result.to_vec::<f32>(), [3.0]);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_mulacc_rejects_mismatched_operands() {
    let a = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
    let b = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
    let err = mulacc(a.clone(), b, &[1]).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));

    let err = mulacc(a.clone(), a.clone(), &[3]).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));

    let err = mulacc(a.clone(), a, &[1, 1]).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}
