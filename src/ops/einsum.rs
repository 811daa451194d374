//! Einstein summation over labelled operands
//!
//! The core works on explicit per-axis labels so callers that derive labels at
//! runtime (the interpreter's contraction engine) never round-trip through a
//! string. [`einsum`] is the usual `"ij,jk->ik"` front end on top.

use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::tensor::{Layout, Tensor};
use std::collections::HashMap;

/// Contract labelled operands into the `output` labels
///
/// Every operand must carry one label per axis and all operands must share a
/// dtype. Labels repeated inside one operand take its diagonal. Labels absent
/// from `output` are summed over. Floating point products are accumulated in
/// f64, integers wrap.
pub fn einsum_labelled(operands: &[(&Tensor, &[char])], output: &[char]) -> Result<Tensor> {
    let dtype = common_dtype(operands)?;
    let sizes = label_sizes(operands)?;

    for (i, &c) in output.iter().enumerate() {
        if !sizes.contains_key(&c) {
            return Err(Error::invalid_argument(
                "output",
                format!("output label '{c}' does not appear in any operand"),
            ));
        }
        if output[..i].contains(&c) {
            return Err(Error::invalid_argument(
                "output",
                format!("output label '{c}' repeated"),
            ));
        }
    }

    // Output labels first, then the contracted ones in first-seen order, so a
    // row-major walk visits each output slot's terms consecutively.
    let mut order: Vec<char> = output.to_vec();
    for (_, labels) in operands {
        for &c in labels.iter() {
            if !order.contains(&c) {
                order.push(c);
            }
        }
    }
    let full_shape: Vec<usize> = order.iter().map(|c| sizes[c]).collect();
    let out_shape = &full_shape[..output.len()];
    let inner: usize = full_shape[output.len()..].iter().product();

    let walks: Vec<Layout> = operands
        .iter()
        .map(|(t, labels)| {
            let strides = order
                .iter()
                .map(|c| {
                    labels
                        .iter()
                        .zip(t.strides())
                        .filter(|&(l, _)| l == c)
                        .map(|(_, &s)| s)
                        .sum::<isize>()
                })
                .collect();
            Layout::new(full_shape.iter().copied().collect(), strides, t.layout().offset())
        })
        .collect();

    if dtype.is_float() {
        dispatch_dtype!(dtype, T => { contract::<T, f64>(operands, &walks, out_shape, inner) }, "einsum")
    } else {
        dispatch_dtype!(dtype, T => { contract::<T, T>(operands, &walks, out_shape, inner) }, "einsum")
    }
}

fn common_dtype(operands: &[(&Tensor, &[char])]) -> Result<DType> {
    let Some((first, _)) = operands.first() else {
        return Err(Error::invalid_argument("operands", "einsum needs at least one operand"));
    };
    for (t, _) in &operands[1..] {
        if t.dtype() != first.dtype() {
            return Err(Error::DTypeMismatch {
                lhs: first.dtype(),
                rhs: t.dtype(),
            });
        }
    }
    Ok(first.dtype())
}

fn label_sizes(operands: &[(&Tensor, &[char])]) -> Result<HashMap<char, usize>> {
    let mut sizes: HashMap<char, usize> = HashMap::new();
    for (i, (t, labels)) in operands.iter().enumerate() {
        if labels.len() != t.ndim() {
            return Err(Error::invalid_argument(
                "labels",
                format!(
                    "operand {i} has {} labels but {} dimensions",
                    labels.len(),
                    t.ndim()
                ),
            ));
        }
        for (&c, &size) in labels.iter().zip(t.shape()) {
            match sizes.get(&c) {
                Some(&existing) if existing != size => {
                    return Err(Error::invalid_argument(
                        "labels",
                        format!("dimension mismatch for label '{c}': {existing} vs {size}"),
                    ));
                }
                Some(_) => {}
                None => {
                    sizes.insert(c, size);
                }
            }
        }
    }
    Ok(sizes)
}

/// Walk every operand over the full label space, multiplying in `A`
fn contract<T: Element, A: Element>(
    operands: &[(&Tensor, &[char])],
    walks: &[Layout],
    out_shape: &[usize],
    inner: usize,
) -> Result<Tensor> {
    let values: Vec<Vec<T>> = operands.iter().map(|(t, _)| t.storage().to_vec::<T>()).collect();
    let mut cursors: Vec<_> = walks.iter().map(Layout::offsets).collect();
    let widen = |x: T| A::from_scalar(x.to_scalar());

    let out_len: usize = out_shape.iter().product();
    let mut out = Vec::with_capacity(out_len);
    for _ in 0..out_len {
        let mut acc = A::zero();
        for _ in 0..inner {
            let mut term = A::one();
            for (cursor, vals) in cursors.iter_mut().zip(&values) {
                if let Some(o) = cursor.next() {
                    term = term.mul_elem(widen(vals[o]));
                }
            }
            acc = acc.add_elem(term);
        }
        out.push(T::from_scalar(acc.to_scalar()));
    }

    Tensor::from_vec(out, out_shape)
}

/// Parsed subscripts of an einsum expression
#[derive(Debug, Clone, PartialEq)]
pub struct Subscripts {
    /// Labels for each input operand
    pub inputs: Vec<Vec<char>>,
    /// Labels of the output
    pub output: Vec<char>,
}

/// Parse einsum notation such as `"ij,jk->ik"`
///
/// Without `->` the output is the sorted list of labels appearing exactly
/// once across all inputs.
pub fn parse_subscripts(notation: &str, num_inputs: usize) -> Result<Subscripts> {
    let notation: String = notation.chars().filter(|c| !c.is_whitespace()).collect();

    let (inputs_str, output_str) = match notation.split_once("->") {
        Some((inputs, output)) => (inputs, Some(output)),
        None => (notation.as_str(), None),
    };

    let parts: Vec<&str> = inputs_str.split(',').collect();
    if parts.len() != num_inputs {
        return Err(Error::invalid_argument(
            "notation",
            format!(
                "einsum notation specifies {} inputs but {} were provided",
                parts.len(),
                num_inputs
            ),
        ));
    }

    let inputs = parts
        .iter()
        .map(|p| parse_labels(p))
        .collect::<Result<Vec<_>>>()?;

    let output = match output_str {
        Some(out) => parse_labels(out)?,
        None => {
            let mut counts: HashMap<char, usize> = HashMap::new();
            for c in inputs.iter().flatten() {
                *counts.entry(*c).or_insert(0) += 1;
            }
            let mut output: Vec<char> = counts
                .into_iter()
                .filter(|&(_, n)| n == 1)
                .map(|(c, _)| c)
                .collect();
            output.sort_unstable();
            output
        }
    };

    Ok(Subscripts { inputs, output })
}

fn parse_labels(part: &str) -> Result<Vec<char>> {
    part.chars()
        .map(|c| {
            if c.is_ascii_lowercase() {
                Ok(c)
            } else {
                Err(Error::invalid_argument(
                    "notation",
                    format!("einsum subscript must be a lowercase letter, got '{c}'"),
                ))
            }
        })
        .collect()
}

/// Einstein summation from string notation
pub fn einsum(notation: &str, inputs: &[&Tensor]) -> Result<Tensor> {
    let subs = parse_subscripts(notation, inputs.len())?;
    let operands: Vec<(&Tensor, &[char])> = inputs
        .iter()
        .zip(&subs.inputs)
        .map(|(&t, labels)| (t, labels.as_slice()))
        .collect();
    einsum_labelled(&operands, &subs.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul() {
        let a = Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let b = Tensor::from_slice(&[1.0f32, 0.0, 0.0, 1.0, 1.0, 1.0], &[3, 2]);
        let c = einsum("ij,jk->ik", &[&a, &b]).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec::<f32>(), vec![4.0, 5.0, 10.0, 11.0]);
    }

    #[test]
    fn test_implicit_output_and_trace() {
        let a = Tensor::from_slice(&[1i64, 2, 3, 4], &[2, 2]);
        let t = einsum("ii", &[&a]).unwrap();
        assert!(t.is_scalar());
        assert_eq!(t.to_vec::<i64>(), vec![5]);
        let tr = einsum("ij", &[&a]).unwrap();
        assert_eq!(tr.to_vec::<i64>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_outer_product() {
        let a = Tensor::from_slice(&[1u32, 2], &[2]);
        let b = Tensor::from_slice(&[3u32, 4, 5], &[3]);
        let c = einsum("i,j->ij", &[&a, &b]).unwrap();
        assert_eq!(c.to_vec::<u32>(), vec![3, 4, 5, 6, 8, 10]);
    }

    #[test]
    fn test_labelled_over_strided_view() {
        let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
        let at = a.as_strided(&[2, 2], &[1, 2], 0).unwrap();
        let r = einsum_labelled(&[(&at, &['j', 'i'][..])], &['i', 'j']).unwrap();
        assert_eq!(r.to_vec::<f64>(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_size_conflict() {
        let a = Tensor::from_slice(&[1.0f32, 2.0], &[2]);
        let b = Tensor::from_slice(&[1.0f32, 2.0, 3.0], &[3]);
        assert!(matches!(
            einsum("i,i->", &[&a, &b]),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_dtype_mismatch() {
        let a = Tensor::from_slice(&[1.0f32], &[1]);
        let b = Tensor::from_slice(&[1i32], &[1]);
        assert!(matches!(
            einsum("i,i->i", &[&a, &b]),
            Err(Error::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_uppercase() {
        assert!(parse_subscripts("iJ->i", 1).is_err());
        assert_eq!(
            parse_subscripts("ij, jk", 2).unwrap().output,
            vec!['i', 'k']
        );
    }
}
