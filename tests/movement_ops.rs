//! Integration tests for movement operations (EXPAND, PAD, AS_STRIDED)
//!
//! Note: EXPAND and AS_STRIDED return views; PAD always materializes.

mod common;

use common::exec;
use numr_interp::prelude::*;

// ============================================================================
// Expand
// ============================================================================

#[test]
fn test_expand_shares_storage() {
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[1, 3]);
    let result = exec(MovementOp::Expand, &[x.clone()], OpArg::Shape(vec![4, 3])).unwrap();

    assert_eq!(result.shape(), &[4, 3]);
    assert_eq!(result.strides(), &[0, 1]);
    assert!(result.storage().shares_bytes_with(x.storage()));

    let data: Vec<f32> = result.to_vec();
    assert_eq!(data, [1.0, 2.0, 3.0].repeat(4));
}

#[test]
fn test_expand_scalar_const() {
    let c = exec(
        BufferOp::Const,
        &[],
        OpArg::Const {
            value: Scalar::Int(7),
            dtype: DType::I64,
        },
    )
    .unwrap();
    let c = exec(MovementOp::Expand, &[c], OpArg::Shape(vec![])).unwrap();
    assert!(c.is_scalar());

    // Rank changes go through the evaluator's reshape, not EXPAND
    let err = exec(MovementOp::Expand, &[c], OpArg::Shape(vec![2])).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

#[test]
fn test_expand_rejects_non_unit_axis() {
    let x = Tensor::from_slice(&[1i32, 2], &[2]);
    let err = exec(MovementOp::Expand, &[x], OpArg::Shape(vec![4])).unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
}

// ============================================================================
// Pad
// ============================================================================

#[test]
fn test_pad_1d() {
    let x = Tensor::from_slice(&[5.0f32, 5.0, 5.0], &[3]);
    let result = exec(MovementOp::Pad, &[x.clone()], OpArg::Padding(vec![(1, 1)])).unwrap();

    assert_eq!(result.shape(), &[5]);
    assert!(!result.storage().shares_bytes_with(x.storage()));
    let data: Vec<f32> = result.to_vec();
    assert_eq!(data, [0.0, 5.0, 5.0, 5.0, 0.0]);
}

#[test]
fn test_pad_2d_asymmetric() {
    let x = Tensor::from_slice(&[1i16, 2, 3, 4], &[2, 2]);
    let result = exec(MovementOp::Pad, &[x], OpArg::Padding(vec![(0, 1), (2, 0)])).unwrap();

    assert_eq!(result.shape(), &[3, 4]);
    let data: Vec<i16> = result.to_vec();
    assert_eq!(data, [0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0]);
}

#[test]
fn test_pad_of_broadcast_view() {
    let x = Tensor::from_slice(&[9u8], &[1, 1]);
    let x = exec(MovementOp::Expand, &[x], OpArg::Shape(vec![2, 2])).unwrap();
    let result = exec(MovementOp::Pad, &[x], OpArg::Padding(vec![(1, 0), (0, 1)])).unwrap();

    let data: Vec<u8> = result.to_vec();
    assert_eq!(data, [0, 0, 0, 9, 9, 0, 9, 9, 0]);
}

#[test]
fn test_pad_wrong_rank() {
    let x = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
    let err = exec(MovementOp::Pad, &[x], OpArg::Padding(vec![(1, 1), (1, 1)])).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

// ============================================================================
// AsStrided
// ============================================================================

#[test]
fn test_as_strided_sliding_window() {
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0], &[5]);
    let result = exec(
        MovementOp::AsStrided,
        &[x],
        OpArg::Strided {
            shape: vec![3, 3],
            strides: vec![1, 1],
            offset: 0,
        },
    )
    .unwrap();

    let data: Vec<f32> = result.to_vec();
    assert_eq!(data, [1.0, 2.0, 3.0, 2.0, 3.0, 4.0, 3.0, 4.0, 5.0]);
}

#[test]
fn test_as_strided_addresses_logical_order() {
    // Transposed source: the view indexes its logical contents, not its storage
    let x = Tensor::from_slice(&[1i32, 2, 3, 4, 5, 6], &[2, 3]);
    let t = Tensor::from_parts(
        x.storage().clone(),
        Layout::new([3, 2].into_iter().collect(), [1, 3].into_iter().collect(), 0),
    );
    let result = exec(
        MovementOp::AsStrided,
        &[t],
        OpArg::Strided {
            shape: vec![2],
            strides: vec![1],
            offset: 1,
        },
    )
    .unwrap();

    let data: Vec<i32> = result.to_vec();
    assert_eq!(data, [4, 2]);
}

#[test]
fn test_as_strided_out_of_bounds() {
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[4]);
    let err = exec(
        MovementOp::AsStrided,
        &[x],
        OpArg::Strided {
            shape: vec![2, 2],
            strides: vec![2, 1],
            offset: 1,
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::BoundsViolation {
            min: 1,
            max: 4,
            len: 4
        }
    ));
}

#[test]
fn test_as_strided_overflowing_stride() {
    let x = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
    for stride in [isize::MAX, isize::MIN] {
        let err = exec(
            MovementOp::AsStrided,
            &[x.clone()],
            OpArg::Strided {
                shape: vec![3],
                strides: vec![stride],
                offset: 1,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::BoundsViolation { len: 3, .. }), "{stride}");
    }
}

// ============================================================================
// Unsupported movement
// ============================================================================

#[test]
fn test_unsupported_movement_ops() {
    let x = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
    for op in [
        MovementOp::Reshape,
        MovementOp::Permute,
        MovementOp::Shrink,
        MovementOp::Stride,
    ] {
        let err = exec(op, &[x.clone()], OpArg::Shape(vec![2])).unwrap_err();
        assert!(matches!(err, Error::UnsupportedOp { .. }), "{op}");
    }
}
